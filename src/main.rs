use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use predictr::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "predictr=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port, host } => {
            predictr::cli::serve(config, port, host).await?;
        }
        Commands::List { config, verbose } => {
            predictr::cli::list(config, verbose).await?;
        }
        Commands::Info { model, config } => {
            predictr::cli::info(model, config).await?;
        }
        Commands::Predict {
            model,
            input,
            config,
        } => {
            predictr::cli::predict(model, input, config).await?;
        }
    }

    Ok(())
}
