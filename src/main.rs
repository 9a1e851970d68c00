use clap::Parser;
use quanta_watch::cli::{Cli, Commands};
use quanta_watch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {}", e);
            eprintln!("Using default configuration");
            Config::from_toml(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    let _telemetry = quanta_watch::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Add(args) => args.execute(&config).await?,
        Commands::Remove(args) => args.execute(&config).await?,
        Commands::List(args) => args.execute(&config).await?,
        Commands::Quote(args) => args.execute(&config).await?,
        Commands::Watch(args) => {
            tracing::info!(user_id = %config.session.user_id, "Starting watch mode");
            args.execute(&config).await?;
        }
        Commands::Config => {
            let mut shown = config.clone();
            if shown.provider.api_key.is_some() {
                shown.provider.api_key = Some("<redacted>".to_string());
            }
            println!("Current configuration:");
            print!("{}", toml::to_string_pretty(&shown)?);
        }
    }

    Ok(())
}
