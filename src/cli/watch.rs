//! Watch command: follow refresh cycles until interrupted

use crate::config::Config;
use crate::dashboard::{Dashboard, ViewEvent};
use crate::refresh::RefreshSnapshot;
use crate::session::{StaticSession, UserId};
use clap::Args;
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Stop after this many cycles
    #[arg(short = 'n', long)]
    pub cycles: Option<u64>,
}

impl WatchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let dashboard = Dashboard::from_config(config)?;
        let session = StaticSession::signed_in(UserId::new(config.session.user_id.clone()));
        let shutdown = CancellationToken::new();

        let ctrl_c = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, shutting down");
            }
            ctrl_c.cancel();
        });

        let mut faults = dashboard.scheduler().faults();
        let fault_shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Ok(fault) = faults.recv().await {
                eprintln!(
                    "Quote provider rejected the API key ({} symbols affected); check provider.api_key",
                    fault.symbols.len()
                );
                fault_shutdown.cancel();
            }
        });

        println!(
            "Watching {} every {}s (Ctrl-C to stop)",
            config.session.user_id,
            config.refresh.interval().as_secs()
        );

        let limit = self.cycles;
        let stop = shutdown.clone();
        dashboard
            .follow_session(&session, shutdown, |user, event| match event {
                ViewEvent::Snapshot(snapshot) => {
                    print_snapshot(snapshot);
                    if limit.is_some_and(|n| snapshot.cycle >= n) {
                        stop.cancel();
                    }
                }
                ViewEvent::OpenFailed(e) => {
                    eprintln!("Could not load the watchlist for {}: {}", user, e);
                    stop.cancel();
                }
            })
            .await;

        Ok(())
    }
}

fn print_snapshot(snapshot: &RefreshSnapshot) {
    println!(
        "-- cycle {} at {} --",
        snapshot.cycle,
        snapshot.cycle_timestamp.format("%H:%M:%S")
    );
    for quote in &snapshot.quotes {
        println!("{}", super::format_quote(quote));
    }
    for (symbol, error) in &snapshot.failures {
        println!("{:<6} unavailable: {}", symbol, error);
    }
}
