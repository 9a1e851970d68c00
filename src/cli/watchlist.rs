//! Watchlist editing commands

use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::session::UserId;
use clap::Args;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Ticker symbol, e.g. AAPL
    pub symbol: String,
}

impl AddArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let dashboard = Dashboard::from_config(config)?;
        let watchlist = dashboard
            .load_watchlist(UserId::new(config.session.user_id.clone()))
            .await?;

        let symbol = watchlist.add(&self.symbol).await?;
        println!("Added {} ({} / {})", symbol, watchlist.len(), limit_label(watchlist.tier().watchlist_limit()));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Ticker symbol to remove
    pub symbol: String,
}

impl RemoveArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let dashboard = Dashboard::from_config(config)?;
        let watchlist = dashboard
            .load_watchlist(UserId::new(config.session.user_id.clone()))
            .await?;

        let symbol = watchlist.remove(&self.symbol).await?;
        println!("Removed {}", symbol);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Also fetch current quotes
    #[arg(short, long)]
    pub quotes: bool,
}

impl ListArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let dashboard = Dashboard::from_config(config)?;
        let watchlist = dashboard
            .load_watchlist(UserId::new(config.session.user_id.clone()))
            .await?;

        println!(
            "Watchlist for {} ({} tier, {} / {})",
            watchlist.user_id(),
            watchlist.tier(),
            watchlist.len(),
            limit_label(watchlist.tier().watchlist_limit())
        );

        if watchlist.is_empty() {
            println!("  (empty)");
            return Ok(());
        }

        if !self.quotes {
            for symbol in watchlist.symbols() {
                println!("  {}", symbol);
            }
            return Ok(());
        }

        let outcome = dashboard.fetcher().fetch_all(&watchlist.symbols()).await;
        for (symbol, result) in outcome.iter() {
            match result {
                Ok(quote) => println!("  {}", super::format_quote(quote)),
                Err(e) => println!("  {:<6} unavailable: {}", symbol, e),
            }
        }
        Ok(())
    }
}

fn limit_label(limit: Option<usize>) -> String {
    limit.map_or_else(|| "unlimited".to_string(), |n| n.to_string())
}
