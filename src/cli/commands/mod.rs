//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `pull`: incremental sync of playlists and/or listening history
//! - `auth`: one-time OAuth flow caching the user session
//! - `query`: read-only search and listening lookups
//!
//! Commands return a process exit code; user-facing failures (missing
//! credentials, unauthenticated pulls, schema downgrades) print a message
//! and exit non-zero instead of surfacing as errors.

mod auth;
mod pull;
mod query;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::runtime::Runtime;

pub use auth::cmd_auth;
pub use pull::cmd_pull;
pub use query::{cmd_listenings, cmd_search};

use crate::config;
use crate::store::{Store, StoreError};

/// Spinlog CLI
#[derive(Parser)]
#[command(author, version, about = "Mirror a Spotify library and play history into SQLite", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Pull remote state into the local database
    Pull {
        /// What to pull
        #[arg(value_enum, default_value_t = PullTarget::All)]
        what: PullTarget,
    },
    /// Authenticate the Spotify user and cache the session
    Auth,
    /// Search mirrored songs by name and artist names
    Search {
        /// Query words
        #[arg(required = true)]
        query: Vec<String>,
        /// Maximum number of results
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// List all recorded listenings of a song
    Listenings {
        /// Song identifier
        song_id: String,
    },
}

/// Which sync passes a `pull` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PullTarget {
    Playlists,
    Listenings,
    All,
}

impl PullTarget {
    pub fn includes_playlists(self) -> bool {
        matches!(self, Self::Playlists | Self::All)
    }

    pub fn includes_listenings(self) -> bool {
        matches!(self, Self::Listenings | Self::All)
    }
}

/// Run the specified CLI command and return the process exit code.
pub fn run_command(cli: &Cli) -> anyhow::Result<i32> {
    let rt = Runtime::new()?;

    match &cli.command {
        Commands::Pull { what } => cmd_pull(&rt, *what),
        Commands::Auth => cmd_auth(&rt),
        Commands::Search { query, limit } => cmd_search(&rt, &query.join(" "), *limit),
        Commands::Listenings { song_id } => cmd_listenings(&rt, song_id),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// The database path inside the data directory, creating the directory.
pub(crate) fn database_path() -> anyhow::Result<std::path::PathBuf> {
    let dir = config::data_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join(crate::store::DEFAULT_DB_NAME))
}

/// Open the default store. `None` (with a message printed) when the database
/// was written by a newer build - the one failure the user fixes by
/// upgrading, not by retrying.
pub(crate) async fn open_store() -> anyhow::Result<Option<Store>> {
    match Store::open(&database_path()?).await {
        Ok(store) => Ok(Some(store)),
        Err(StoreError::Downgrade { found, supported }) => {
            println!(
                "spinlog {} is running but the database is set up for schema \
                 v{found} (this build supports up to v{supported}). Downgrading \
                 the database is not supported, so you should install a newer \
                 spinlog.",
                env!("CARGO_PKG_VERSION"),
            );
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}
