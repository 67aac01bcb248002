//! Command-line interface for spinlog.
//!
//! This module provides the `pull`, `auth`, `search` and `listenings`
//! commands.

mod commands;

pub use commands::{Cli, Commands, PullTarget, run_command};
