use clap::Parser;
use tracing::info;

use wamedia::cli::{self, Cli, Command};
use wamedia::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let config: Config = cli.config.into();
    info!("{:?}", &config);

    match cli.command {
        Command::Sync => cli::sync(&config).await?,
        Command::Albums => cli::list_albums(&config).await?,
        Command::Media { media_id } => cli::show_media_item(&config, &media_id).await?,
        Command::Login => cli::login(&config).await?,
    }

    Ok(())
}
