//! CLI interface for quanta-watch
//!
//! Provides subcommands for:
//! - `add` / `remove` / `list`: Edit the configured user's watchlist
//! - `quote`: One-off batch quote fetch
//! - `watch`: Follow refresh cycles for the configured user
//! - `config`: Show the effective configuration

mod quote;
mod watch;
mod watchlist;

pub use quote::QuoteArgs;
pub use watch::WatchArgs;
pub use watchlist::{AddArgs, ListArgs, RemoveArgs};

use crate::quote::Quote;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "quanta-watch")]
#[command(about = "Watchlist quote synchronization for the Quanta dashboard")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a symbol to the watchlist
    Add(AddArgs),
    /// Remove a symbol from the watchlist
    Remove(RemoveArgs),
    /// Show the watchlist
    List(ListArgs),
    /// Fetch quotes once
    Quote(QuoteArgs),
    /// Refresh the watchlist on the configured interval
    Watch(WatchArgs),
    /// Show configuration
    Config,
}

pub(crate) fn format_quote(quote: &Quote) -> String {
    format!(
        "{:<6} {:>10.2} {:>+9.2} ({:>+6.2}%)  {}",
        quote.symbol, quote.price, quote.absolute_change, quote.percent_change, quote.display_name
    )
}
