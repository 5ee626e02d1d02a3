//! # Obol Ledger
//!
//! Service layer over the SQLite store:
//!
//! - [`MutationService`]: grant / remove / set with paired audit rows
//! - [`AuditService`]: filtered keyset pagination over the ledger
//! - [`BalanceService`]: read-only balance lookups
//! - [`NamespaceService`]: namespace registry and typed settings
//!
//! All services borrow a [`ServiceContext`], which owns the pool.

pub mod audit;
pub mod balance;
pub mod error;
pub mod mutation;
pub mod namespace;
pub mod services;

pub use audit::AuditService;
pub use balance::{BalanceService, MAX_TOP_LIMIT};
pub use error::{LedgerError, LedgerResult};
pub use mutation::MutationService;
pub use namespace::NamespaceService;
pub use services::{LedgerConfig, ServiceContext, TransactionResult};
