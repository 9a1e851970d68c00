//! One-off quote command

use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::symbol::{validate, Symbol};
use clap::Args;

#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// Ticker symbols to fetch
    #[arg(required = true)]
    pub symbols: Vec<String>,
}

impl QuoteArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let symbols = self
            .symbols
            .iter()
            .map(|raw| validate(raw))
            .collect::<Result<Vec<Symbol>, _>>()?;

        let dashboard = Dashboard::from_config(config)?;
        let outcome = dashboard.fetcher().fetch_all(&symbols).await;

        for quote in outcome.successes() {
            println!("{}", super::format_quote(quote));
        }
        for (symbol, error) in outcome.failures() {
            println!("{:<6} failed: {}", symbol, error);
        }

        if outcome.is_total_failure() {
            anyhow::bail!("no quotes could be fetched");
        }
        Ok(())
    }
}
