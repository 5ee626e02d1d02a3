//! Database initialization and status

use anyhow::{bail, Context, Result};
use obol_persistence::{Database, DatabaseConfig, NamespaceRepo, TransactionRepo, WalletRepo};
use std::path::{Path, PathBuf};

/// Create (or migrate) the database
pub async fn init_database(db_path: &Path, force: bool) -> Result<()> {
    if force && db_path.exists() {
        for file in sqlite_files(db_path) {
            if file.exists() {
                std::fs::remove_file(&file)
                    .with_context(|| format!("Failed to remove {:?}", file))?;
            }
        }
        println!("🗑️  Removed existing database");
    }

    let db = Database::init(&DatabaseConfig::from_path(db_path))
        .await
        .context("Failed to initialize database")?;
    db.close().await;
    Ok(())
}

/// Show database status
pub async fn show_status(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        println!("❌ Database not found at {:?}", db_path);
        println!("   Run 'obol init' to create the database");
        return Ok(());
    }

    // Counts only; migrations are left to `init` and the other commands
    let db = Database::connect(&DatabaseConfig::from_path(db_path))
        .await
        .context("Failed to connect to database")?;
    let pool = db.pool();

    println!("📊 Database Status");
    println!("   Path: {:?}", db_path);
    println!();
    println!("   Namespaces:   {}", NamespaceRepo::count(pool).await?);
    println!("   Wallets:      {}", WalletRepo::count(pool).await?);
    println!("   Transactions: {}", TransactionRepo::count(pool).await?);

    db.close().await;
    Ok(())
}

/// Open an initialized database, applying any pending migrations
pub async fn connect(db_path: &Path) -> Result<Database> {
    if !db_path.exists() {
        bail!("Database not found at {:?}. Run 'obol init' first.", db_path);
    }
    Database::init(&DatabaseConfig::from_path(db_path))
        .await
        .context("Failed to connect to database")
}

fn sqlite_files(db_path: &Path) -> Vec<PathBuf> {
    let base = db_path.as_os_str().to_owned();
    let mut files = vec![db_path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut name = base.clone();
        name.push(suffix);
        files.push(PathBuf::from(name));
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_then_connect() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("obol.db");

        assert!(connect(&path).await.is_err());

        init_database(&path, false).await.unwrap();
        let db = connect(&path).await.unwrap();
        assert_eq!(NamespaceRepo::count(db.pool()).await.unwrap(), 0);
        db.close().await;

        show_status(&path).await.unwrap();

        init_database(&path, true).await.unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_sqlite_side_files() {
        let files = sqlite_files(Path::new("data/obol.db"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("data/obol.db"),
                PathBuf::from("data/obol.db-wal"),
                PathBuf::from("data/obol.db-shm"),
            ]
        );
    }
}
