//! # repo-chat CLI
//!
//! ```bash
//! repo-chat --config ./config/repo-chat.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `repo-chat init` | Create the SQLite database and schema |
//! | `repo-chat scan` | List eligible files with their identifiers |
//! | `repo-chat sync` | Bring the document store in line with the repository |
//! | `repo-chat status` | Show collections and document counts |
//! | `repo-chat get <id>...` | Print stored documents |

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use repo_chat::progress::ProgressMode;
use repo_chat::{config, db, get, migrate, status, sync};

/// Incrementally sync a source repository into a document store.
#[derive(Parser)]
#[command(name = "repo-chat", version)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/repo-chat.toml")]
    config: PathBuf,

    /// Repository root, overriding `[repository].root`.
    #[arg(long, global = true, env = "BASE_FOLDER")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema. Safe to run more than once.
    Init,

    /// List the files a sync would index, with their identifiers.
    Scan,

    /// Add new and changed files to the store and delete stale documents.
    Sync {
        /// Compute and print the changes without writing them.
        #[arg(long)]
        dry_run: bool,

        /// Also sync folder-level documents.
        #[arg(long)]
        folders: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,

        /// Progress output on stderr. Defaults to `human` on a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Show collections and their document counts.
    Status,

    /// Print stored documents by identifier.
    Get {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Read from the folder collection.
        #[arg(long)]
        folders: bool,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cfg = config::load_config_or_default(&cli.config)?;
    if let Some(root) = cli.root {
        cfg.repository.root = root;
    }

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Scan => {
            sync::run_scan(&cfg)?;
        }
        Commands::Sync {
            dry_run,
            folders,
            json,
            progress,
        } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            let reporter = mode.reporter();
            let ok = sync::run_sync_cmd(&cfg, dry_run, folders, json, reporter.as_ref()).await?;
            if !ok {
                bail!("sync finished with failed batches");
            }
        }
        Commands::Status => {
            status::run_status(&cfg).await?;
        }
        Commands::Get { ids, folders, json } => {
            get::run_get(&cfg, &ids, folders, json).await?;
        }
    }

    Ok(())
}
