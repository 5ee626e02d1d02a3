//! Repository implementations for SQLite
//!
//! Every repo function is generic over the sqlx executor so it can run either
//! directly on the pool or inside a store transaction (`&mut *tx`).

use crate::error::{is_unique_violation, PersistenceError, PersistenceResult};
use crate::sqlite::schema::*;
use crate::DatabaseConfig;
use obol_core::{AuditFilter, PageRequest, Scan, WalletKey};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;

const TRANSACTION_COLUMNS: &str = "id, ts, tenant, namespace_id, actor_subject, target_subject, \
     action, amount, delta, before_balance, after_balance, reason";

// ============================================================================
// Namespace Repository
// ============================================================================

/// Repository for the namespaces table
pub struct NamespaceRepo;

impl NamespaceRepo {
    /// Insert a namespace; fails with `AlreadyExists` on a duplicate name
    pub async fn insert<'e, E>(
        executor: E,
        tenant: &str,
        name: &str,
        description: Option<&str>,
        settings_json: &str,
    ) -> PersistenceResult<NamespaceRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, NamespaceRow>(
            r#"
            INSERT INTO namespaces (tenant, name, description, settings_json, is_active)
            VALUES (?, ?, ?, ?, 1)
            RETURNING id, tenant, name, description, settings_json, is_active
            "#,
        )
        .bind(tenant)
        .bind(name)
        .bind(description)
        .bind(settings_json)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PersistenceError::already_exists("Namespace", &format!("{}/{}", tenant, name))
            } else {
                e.into()
            }
        })
    }

    pub async fn get_by_id<'e, E>(
        executor: E,
        tenant: &str,
        id: i64,
    ) -> PersistenceResult<Option<NamespaceRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, NamespaceRow>(
            "SELECT * FROM namespaces WHERE id = ? AND tenant = ?",
        )
        .bind(id)
        .bind(tenant)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn get_by_name<'e, E>(
        executor: E,
        tenant: &str,
        name: &str,
    ) -> PersistenceResult<Option<NamespaceRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, NamespaceRow>(
            "SELECT * FROM namespaces WHERE tenant = ? AND name = ?",
        )
        .bind(tenant)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Active namespaces of a tenant, ordered by name
    pub async fn list_active<'e, E>(executor: E, tenant: &str) -> PersistenceResult<Vec<NamespaceRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, NamespaceRow>(
            "SELECT * FROM namespaces WHERE tenant = ? AND is_active = 1 ORDER BY name",
        )
        .bind(tenant)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn update_settings<'e, E>(
        executor: E,
        tenant: &str,
        id: i64,
        settings_json: &str,
    ) -> PersistenceResult<NamespaceRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, NamespaceRow>(
            r#"
            UPDATE namespaces SET settings_json = ?
            WHERE id = ? AND tenant = ?
            RETURNING id, tenant, name, description, settings_json, is_active
            "#,
        )
        .bind(settings_json)
        .bind(id)
        .bind(tenant)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| PersistenceError::not_found("Namespace", &id.to_string()))
    }

    pub async fn set_active<'e, E>(
        executor: E,
        tenant: &str,
        id: i64,
        active: bool,
    ) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE namespaces SET is_active = ? WHERE id = ? AND tenant = ?")
            .bind(active)
            .bind(id)
            .bind(tenant)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Namespace", &id.to_string()));
        }
        Ok(())
    }

    /// Delete a namespace. Its wallets go with it (`ON DELETE CASCADE`);
    /// ledger rows are not touched.
    pub async fn delete<'e, E>(executor: E, tenant: &str, id: i64) -> PersistenceResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM namespaces WHERE id = ? AND tenant = ?")
            .bind(id)
            .bind(tenant)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::not_found("Namespace", &id.to_string()));
        }
        Ok(())
    }

    pub async fn count<'e, E>(executor: E) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM namespaces")
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Wallet Repository
// ============================================================================

/// Repository for the wallets table
pub struct WalletRepo;

impl WalletRepo {
    pub async fn get<'e, E>(executor: E, key: &WalletKey) -> PersistenceResult<Option<WalletRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, WalletRow>(
            "SELECT * FROM wallets WHERE tenant = ? AND namespace_id = ? AND subject = ?",
        )
        .bind(&key.tenant)
        .bind(key.namespace_id)
        .bind(&key.subject)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Stored balance, or 0 for a wallet that was never referenced
    pub async fn get_balance<'e, E>(executor: E, key: &WalletKey) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT balance FROM wallets WHERE tenant = ? AND namespace_id = ? AND subject = ?",
        )
        .bind(&key.tenant)
        .bind(key.namespace_id)
        .bind(&key.subject)
        .fetch_optional(executor)
        .await?;
        Ok(row.map(|r| r.0).unwrap_or(0))
    }

    /// Return the wallet, inserting it at balance 0 if absent.
    ///
    /// Always a write statement, so inside a store transaction it takes the
    /// database write lock before the balance is read.
    pub async fn ensure<'e, E>(executor: E, key: &WalletKey) -> PersistenceResult<WalletRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            INSERT INTO wallets (tenant, namespace_id, subject, balance)
            VALUES (?, ?, ?, 0)
            ON CONFLICT(tenant, namespace_id, subject) DO UPDATE SET balance = balance
            RETURNING id, tenant, namespace_id, subject, balance
            "#,
        )
        .bind(&key.tenant)
        .bind(key.namespace_id)
        .bind(&key.subject)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    /// Set `balance = new` only if it still equals `expected`.
    /// Returns false when another writer got there first.
    pub async fn compare_and_swap<'e, E>(
        executor: E,
        wallet_id: i64,
        expected: i64,
        new: i64,
    ) -> PersistenceResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE wallets SET balance = ? WHERE id = ? AND balance = ?")
            .bind(new)
            .bind(wallet_id)
            .bind(expected)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Highest balances first, ties by subject
    pub async fn top<'e, E>(
        executor: E,
        tenant: &str,
        namespace_id: i64,
        limit: u32,
    ) -> PersistenceResult<Vec<WalletRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, WalletRow>(
            r#"
            SELECT * FROM wallets
            WHERE tenant = ? AND namespace_id = ?
            ORDER BY balance DESC, subject ASC
            LIMIT ?
            "#,
        )
        .bind(tenant)
        .bind(namespace_id)
        .bind(i64::from(limit))
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Positive balances of one subject across active namespaces
    pub async fn list_for_subject<'e, E>(
        executor: E,
        tenant: &str,
        subject: &str,
    ) -> PersistenceResult<Vec<SubjectBalanceRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, SubjectBalanceRow>(
            r#"
            SELECT w.namespace_id AS namespace_id, n.name AS namespace_name, w.balance AS balance
            FROM wallets w
            JOIN namespaces n ON n.id = w.namespace_id
            WHERE w.tenant = ? AND w.subject = ? AND w.balance > 0 AND n.is_active = 1
            ORDER BY n.name
            "#,
        )
        .bind(tenant)
        .bind(subject)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn count<'e, E>(executor: E) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallets")
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Transaction Repository
// ============================================================================

/// Repository for the append-only transactions table
pub struct TransactionRepo;

impl TransactionRepo {
    /// Append a ledger row, returning its id
    pub async fn insert<'e, E>(executor: E, tx: &NewTransaction) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions
                (ts, tenant, namespace_id, actor_subject, target_subject, action,
                 amount, delta, before_balance, after_balance, reason)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tx.ts)
        .bind(&tx.tenant)
        .bind(tx.namespace_id)
        .bind(&tx.actor_subject)
        .bind(&tx.target_subject)
        .bind(tx.action.as_str())
        .bind(tx.amount)
        .bind(tx.delta)
        .bind(tx.before_balance)
        .bind(tx.after_balance)
        .bind(&tx.reason)
        .execute(executor)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_id<'e, E>(executor: E, id: i64) -> PersistenceResult<TransactionRow>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, TransactionRow>("SELECT * FROM transactions WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| PersistenceError::not_found("Transaction", &id.to_string()))
    }

    /// Full history of one wallet in insertion order
    pub async fn get_by_wallet<'e, E>(
        executor: E,
        key: &WalletKey,
    ) -> PersistenceResult<Vec<TransactionRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT * FROM transactions
            WHERE tenant = ? AND namespace_id = ? AND target_subject = ?
            ORDER BY id ASC
            "#,
        )
        .bind(&key.tenant)
        .bind(key.namespace_id)
        .bind(&key.subject)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// One keyset page in scan order, including the over-fetched row.
    pub async fn list_page<'e, E>(
        executor: E,
        filter: &AuditFilter,
        request: &PageRequest,
    ) -> PersistenceResult<Vec<TransactionRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(TRANSACTION_COLUMNS);
        qb.push(" FROM transactions WHERE tenant = ");
        qb.push_bind(filter.tenant.clone());

        if let Some(namespace_id) = filter.namespace_id {
            qb.push(" AND namespace_id = ").push_bind(namespace_id);
        }
        if let Some(subject) = &filter.target_subject {
            qb.push(" AND target_subject = ").push_bind(subject.clone());
        }
        if let Some(action) = filter.action {
            qb.push(" AND action = ").push_bind(action.as_str());
        }

        match request.scan() {
            Scan::Latest => {
                qb.push(" ORDER BY id DESC");
            }
            Scan::OlderThan(before_id) => {
                qb.push(" AND id < ").push_bind(before_id);
                qb.push(" ORDER BY id DESC");
            }
            Scan::NewerThan(after_id) => {
                qb.push(" AND id > ").push_bind(after_id);
                qb.push(" ORDER BY id ASC");
            }
        }
        qb.push(" LIMIT ").push_bind(i64::from(request.fetch_limit()));

        let rows = qb
            .build_query_as::<TransactionRow>()
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn count<'e, E>(executor: E) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }
}

// ============================================================================
// Database initialization
// ============================================================================

/// Create the connection pool (WAL, foreign keys on, busy timeout)
pub async fn create_pool(config: &DatabaseConfig) -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(config.busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Run migrations
pub async fn run_migrations(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Open (creating if needed) and migrate the database
pub async fn init_database(config: &DatabaseConfig) -> PersistenceResult<SqlitePool> {
    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;
    tracing::debug!(url = %config.url, "database ready");
    Ok(pool)
}
