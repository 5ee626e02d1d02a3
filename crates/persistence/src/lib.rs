//! # Obol Persistence
//!
//! SQLite store for namespaces, wallets and the append-only ledger.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Database                        │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────────┐  │
//! │  │ namespaces │  │  wallets   │  │  transactions  │  │
//! │  │            │◄─┤ (cascade)  │  │ (append-only)  │  │
//! │  └────────────┘  └────────────┘  └────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use obol_persistence::{Database, DatabaseConfig, WalletRepo};
//!
//! let db = Database::init(&DatabaseConfig::from_path("data/obol.db")).await?;
//! let balance = WalletRepo::get_balance(db.pool(), &key).await?;
//! ```

pub mod error;
pub mod sqlite;

pub use error::{PersistenceError, PersistenceResult};
pub use sqlite::schema::{
    NamespaceRow, NewTransaction, SubjectBalanceRow, TransactionRow, WalletRow,
};
pub use sqlite::{
    create_pool, init_database, run_migrations, NamespaceRepo, TransactionRepo, WalletRepo,
};

use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Connection settings for the SQLite store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// sqlx URL, e.g. `sqlite:data/obol.db`
    pub url: String,
    pub max_connections: u32,
    /// How long a connection waits on a locked database before `SQLITE_BUSY`
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            max_connections: 8,
            busy_timeout: Duration::from_secs(5),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self::new(&format!("sqlite:{}", path.as_ref().display()))
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n.max(1);
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

/// Database facade
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect without running migrations
    pub async fn connect(config: &DatabaseConfig) -> PersistenceResult<Self> {
        let pool = create_pool(config).await?;
        Ok(Self { pool })
    }

    /// Connect and bring the schema up to date
    pub async fn init(config: &DatabaseConfig) -> PersistenceResult<Self> {
        let pool = init_database(config).await?;
        Ok(Self { pool })
    }

    /// Get SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obol_core::{AuditFilter, Mutation, PageRequest, WalletKey};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let config = DatabaseConfig::from_path(dir.path().join("test.db"));
        let db = Database::init(&config).await.unwrap();
        (dir, db)
    }

    #[test]
    fn test_config_builder() {
        let config = DatabaseConfig::from_path("data/obol.db")
            .max_connections(0)
            .busy_timeout(Duration::from_millis(250));
        assert_eq!(config.url, "sqlite:data/obol.db");
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_namespace_unique_per_tenant() {
        let (_dir, db) = setup().await;
        NamespaceRepo::insert(db.pool(), "t1", "Chess", None, "{}")
            .await
            .unwrap();
        let err = NamespaceRepo::insert(db.pool(), "t1", "Chess", None, "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::AlreadyExists { .. }));

        // Same name under another tenant is fine
        NamespaceRepo::insert(db.pool(), "t2", "Chess", None, "{}")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_ensure_wallet_is_idempotent() {
        let (_dir, db) = setup().await;
        let ns = NamespaceRepo::insert(db.pool(), "t", "Go", None, "{}")
            .await
            .unwrap();
        let key = WalletKey::new("t", ns.id, "alice");

        assert_eq!(WalletRepo::get_balance(db.pool(), &key).await.unwrap(), 0);
        assert!(WalletRepo::get(db.pool(), &key).await.unwrap().is_none());

        let first = WalletRepo::ensure(db.pool(), &key).await.unwrap();
        let second = WalletRepo::ensure(db.pool(), &key).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.balance, 0);
        assert_eq!(WalletRepo::count(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let (_dir, db) = setup().await;
        let ns = NamespaceRepo::insert(db.pool(), "t", "Go", None, "{}")
            .await
            .unwrap();
        let wallet = WalletRepo::ensure(db.pool(), &WalletKey::new("t", ns.id, "bob"))
            .await
            .unwrap();

        assert!(WalletRepo::compare_and_swap(db.pool(), wallet.id, 0, 9).await.unwrap());
        assert!(!WalletRepo::compare_and_swap(db.pool(), wallet.id, 0, 1).await.unwrap());
        // CHECK (balance >= 0)
        assert!(WalletRepo::compare_and_swap(db.pool(), wallet.id, 9, -1).await.is_err());
    }

    #[tokio::test]
    async fn test_ledger_rows_are_append_only() {
        let (_dir, db) = setup().await;
        let key = WalletKey::new("t", 1, "alice");
        let mutation = Mutation::Grant(4);
        let tx = NewTransaction::new(&key, "mod", mutation, mutation.apply(0).unwrap(), None);
        let id = TransactionRepo::insert(db.pool(), &tx).await.unwrap();

        assert!(sqlx::query("UPDATE transactions SET amount = 1 WHERE id = ?")
            .bind(id)
            .execute(db.pool())
            .await
            .is_err());
        assert!(sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(db.pool())
            .await
            .is_err());
        assert_eq!(TransactionRepo::get_by_id(db.pool(), id).await.unwrap().amount, 4);
    }

    #[tokio::test]
    async fn test_delete_namespace_keeps_history() {
        let (_dir, db) = setup().await;
        let ns = NamespaceRepo::insert(db.pool(), "t", "Go", None, "{}")
            .await
            .unwrap();
        let key = WalletKey::new("t", ns.id, "alice");
        WalletRepo::ensure(db.pool(), &key).await.unwrap();
        let mutation = Mutation::Grant(1);
        let tx = NewTransaction::new(&key, "mod", mutation, mutation.apply(0).unwrap(), None);
        TransactionRepo::insert(db.pool(), &tx).await.unwrap();

        NamespaceRepo::delete(db.pool(), "t", ns.id).await.unwrap();

        assert_eq!(WalletRepo::count(db.pool()).await.unwrap(), 0);
        assert_eq!(TransactionRepo::count(db.pool()).await.unwrap(), 1);
        assert!(NamespaceRepo::delete(db.pool(), "t", ns.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_list_page_applies_filters() {
        let (_dir, db) = setup().await;
        for (subject, mutation) in [
            ("alice", Mutation::Grant(5)),
            ("bob", Mutation::Grant(2)),
            ("alice", Mutation::Set(1)),
        ] {
            let key = WalletKey::new("t", 1, subject);
            let tx = NewTransaction::new(&key, "mod", mutation, mutation.apply(0).unwrap(), None);
            TransactionRepo::insert(db.pool(), &tx).await.unwrap();
        }

        let filter = AuditFilter::tenant("t").target("alice");
        let rows = TransactionRepo::list_page(db.pool(), &filter, &PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].id > rows[1].id);

        let filter = AuditFilter::tenant("t").action(obol_core::TxAction::Set);
        let rows = TransactionRepo::list_page(db.pool(), &filter, &PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let rows = TransactionRepo::list_page(
            db.pool(),
            &AuditFilter::tenant("other"),
            &PageRequest::first(10),
        )
        .await
        .unwrap();
        assert!(rows.is_empty());
    }
}
