use clap::Parser;
use mirra::config::{Cli, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Convert CLI args to Config - validation failures are fatal here,
    // before any scheduling starts
    let config = Config::try_from(cli)?;

    tracing::info!("mirra v{}", mirra::VERSION);
    mirra::commands::mirror::run(config).await?;

    Ok(())
}
