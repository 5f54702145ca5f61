//! Client-side task cache and hierarchical ordering for a task backend.
//!
//! The core deduplicates and batches task fetches ([`fetch`]), derives parent
//! chains and indentation depth ([`hierarchy`]), orders a flat table so
//! children follow their parents ([`reorder`]), and turns drag gestures into
//! relation mutations ([`drag`]). [`view::TableSession`] wires these to one
//! table; the `tasktree` binary drives them from the command line.

pub mod adapters;
pub mod api;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod drag;
pub mod error;
pub mod fetch;
pub mod hierarchy;
pub mod model;
pub mod observer;
pub mod ports;
pub mod reorder;
pub mod store;
pub mod view;

pub use error::{Error, Result};

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// Loads `.env` before parsing so its variables can fill in flags.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    config::load_dotenv();
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli)
}
