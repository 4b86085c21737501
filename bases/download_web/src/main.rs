// bases/download_web/src/main.rs
use clap::Parser;
use color_eyre::Result;

mod config;
mod error;
mod forms;
mod jobs;
mod server;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "download_web=info,media_downloader=info,tower_http=info".into()),
        )
        .init();

    let args = config::CliArgs::parse();
    let config = config::Config::from_args(args);

    server::run(config).await?;

    Ok(())
}
