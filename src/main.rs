//! spinlog - mirror a Spotify library and play history into SQLite.
//!
//! Two incremental sync passes (playlists and listening history) keep a
//! local relational store up to date with the remote state; read-only
//! search and lookup commands serve that store.

pub mod cli;
pub mod config;
pub mod model;
pub mod normalize;
pub mod query;
pub mod remote;
pub mod store;
pub mod sync;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("spinlog=info".parse().unwrap()))
        .init();

    let code = cli::run_command(&args)?;
    std::process::exit(code);
}
