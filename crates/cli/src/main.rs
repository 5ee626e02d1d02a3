//! Obol CLI - token wallets from the command line
//!
//! Usage:
//! ```bash
//! obol init
//! obol namespace create "Chess" --description "weekly ladder"
//! obol grant chess alice 10 --reason "won round 3"
//! obol remove chess alice 3
//! obol set chess alice 5
//! obol balance alice
//! obol top chess --limit 5
//! obol audit --namespace chess --browse
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use obol_core::{TxAction, DEFAULT_PAGE_LIMIT};
use std::path::PathBuf;

mod commands;
mod db;
mod logging;
mod pager;

use commands::{audit, namespace, wallet, Session};
use logging::LogFormat;

/// Obol - per-tenant token wallets with an append-only audit trail
#[derive(Parser)]
#[command(name = "obol")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file path
    #[arg(long, env = "OBOL_DATABASE", default_value = "data/obol.db", global = true)]
    pub db: PathBuf,

    /// Tenant every command operates in
    #[arg(long, env = "OBOL_TENANT", default_value = "default", global = true)]
    pub tenant: String,

    /// Subject recorded as the actor of mutations
    #[arg(long, env = "OBOL_ACTOR", default_value = "cli", global = true)]
    pub actor: String,

    /// Log output format
    #[arg(long, env = "OBOL_LOG_FORMAT", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database (runs migrations)
    Init {
        /// Delete the existing database first
        #[arg(long)]
        force: bool,
    },

    /// Show database status
    Status,

    /// Namespace management
    Namespace {
        #[command(subcommand)]
        action: NamespaceAction,
    },

    /// Add tokens to a subject's wallet
    Grant {
        /// Namespace id or name
        namespace: String,
        /// Target subject
        target: String,
        amount: i64,
        #[arg(long, short)]
        reason: Option<String>,
    },

    /// Take tokens from a subject's wallet
    Remove {
        /// Namespace id or name
        namespace: String,
        /// Target subject
        target: String,
        amount: i64,
        #[arg(long, short)]
        reason: Option<String>,
    },

    /// Overwrite a subject's balance
    Set {
        /// Namespace id or name
        namespace: String,
        /// Target subject
        target: String,
        /// New balance
        balance: i64,
        #[arg(long, short)]
        reason: Option<String>,
    },

    /// Show a subject's balance (all namespaces unless one is given)
    Balance {
        /// Subject
        subject: String,
        /// Namespace id or name
        #[arg(long, short)]
        namespace: Option<String>,
    },

    /// Leaderboard for a namespace
    Top {
        /// Namespace id or name
        namespace: String,
        /// Rows to show (max 50)
        #[arg(long, short, default_value_t = 10)]
        limit: u32,
    },

    /// Browse the transaction history, newest first
    Audit {
        /// Namespace id or name
        #[arg(long, short)]
        namespace: Option<String>,
        /// Only transactions targeting this subject
        #[arg(long, short)]
        target: Option<String>,
        /// Only grant, remove or set
        #[arg(long, short)]
        action: Option<TxAction>,
        /// Items per page (max 50)
        #[arg(long, short, default_value_t = DEFAULT_PAGE_LIMIT)]
        limit: u32,
        /// Rows older than this transaction id
        #[arg(long, conflicts_with = "after")]
        before: Option<i64>,
        /// Rows newer than this transaction id
        #[arg(long)]
        after: Option<i64>,
        /// Page interactively (n/p/r/q)
        #[arg(long)]
        browse: bool,
    },
}

#[derive(Subcommand)]
pub enum NamespaceAction {
    /// Create a namespace
    Create {
        name: String,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// List active namespaces
    List,
    /// Show namespace details and settings
    Show {
        /// Namespace id or name
        namespace: String,
    },
    /// Delete a namespace and its wallets (history is kept)
    Delete {
        /// Namespace id or name
        namespace: String,
    },
    /// Update settings: grantRoles=a,b managerRoles=c logChannel=d|null
    Config {
        /// Namespace id or name
        namespace: String,
        /// key=value pairs
        #[arg(required = true)]
        settings: Vec<String>,
    },
    /// Archive a namespace; it stops accepting mutations
    Archive {
        /// Namespace id or name
        namespace: String,
    },
    /// Restore an archived namespace
    Restore {
        /// Namespace id
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_format, "info");

    // Ensure data directory exists
    if let Some(parent) = cli.db.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    match cli.command {
        Commands::Init { force } => {
            db::init_database(&cli.db, force).await?;
            println!("✅ Database initialized at {:?}", cli.db);
        }

        Commands::Status => {
            db::show_status(&cli.db).await?;
        }

        Commands::Namespace { action } => {
            let session = Session::open(&cli.db, &cli.tenant, &cli.actor).await?;
            namespace::handle(&session, action).await?;
            session.close().await;
        }

        Commands::Grant {
            namespace,
            target,
            amount,
            reason,
        } => {
            let session = Session::open(&cli.db, &cli.tenant, &cli.actor).await?;
            wallet::grant(&session, &namespace, &target, amount, reason.as_deref()).await?;
            session.close().await;
        }

        Commands::Remove {
            namespace,
            target,
            amount,
            reason,
        } => {
            let session = Session::open(&cli.db, &cli.tenant, &cli.actor).await?;
            wallet::remove(&session, &namespace, &target, amount, reason.as_deref()).await?;
            session.close().await;
        }

        Commands::Set {
            namespace,
            target,
            balance,
            reason,
        } => {
            let session = Session::open(&cli.db, &cli.tenant, &cli.actor).await?;
            wallet::set(&session, &namespace, &target, balance, reason.as_deref()).await?;
            session.close().await;
        }

        Commands::Balance { subject, namespace } => {
            let session = Session::open(&cli.db, &cli.tenant, &cli.actor).await?;
            wallet::balance(&session, &subject, namespace.as_deref()).await?;
            session.close().await;
        }

        Commands::Top { namespace, limit } => {
            let session = Session::open(&cli.db, &cli.tenant, &cli.actor).await?;
            wallet::top(&session, &namespace, limit).await?;
            session.close().await;
        }

        Commands::Audit {
            namespace,
            target,
            action,
            limit,
            before,
            after,
            browse,
        } => {
            let session = Session::open(&cli.db, &cli.tenant, &cli.actor).await?;
            let query = audit::AuditQuery {
                namespace,
                target,
                action,
                limit,
                before,
                after,
            };
            if browse {
                audit::browse(&session, query).await?;
            } else {
                audit::show_page(&session, query).await?;
            }
            session.close().await;
        }
    }

    Ok(())
}
