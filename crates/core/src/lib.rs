//! # Obol Core
//!
//! Domain types shared by every layer of the token ledger.
//!
//! ## Model
//!
//! ```text
//! Tenant ──┬── Namespace (settings, name)
//!          │        └── Wallet (subject, balance >= 0)
//!          └── Transaction (append-only, id = logical clock)
//! ```
//!
//! Nothing in this crate touches storage. Balance arithmetic
//! ([`Mutation::apply`]) and page assembly ([`Page::assemble`]) are pure so
//! they can be checked without a database.

pub mod error;
pub mod namespace;
pub mod page;
pub mod transaction;
pub mod wallet;

pub use error::{CoreError, CoreResult};
pub use namespace::{Namespace, NamespaceSettings, SettingsPatch};
pub use page::{
    AuditFilter, Cursor, Direction, Page, PageRequest, Scan, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use transaction::{Mutation, Transaction, TxAction};
pub use wallet::{BalanceChange, SubjectBalance, Wallet, WalletKey};
