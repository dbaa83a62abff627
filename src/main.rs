use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pricer::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pricer=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            port,
            host,
            local,
        } => {
            pricer::cli::serve(config, port, host, local).await?;
        }
        Commands::Predict {
            input,
            config,
            local,
        } => {
            pricer::cli::predict(input, config, local).await?;
        }
        Commands::Info { config, local } => {
            pricer::cli::info(config, local).await?;
        }
        Commands::Pull { config, output } => {
            pricer::cli::pull(config, output).await?;
        }
        Commands::List { dir } => {
            pricer::cli::list(dir).await?;
        }
    }

    Ok(())
}
