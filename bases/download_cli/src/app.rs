// bases/download_cli/src/app.rs
use crate::args::{Args, Command, DownloadArgs};
use crate::output::OutputHandler;
use color_eyre::Result;
use media_downloader::{DownloaderConfig, EventSink, MediaDownloader};
use tokio_util::sync::CancellationToken;

pub struct App {
    args: Args,
    output: OutputHandler,
}

impl App {
    pub fn new(args: Args) -> Self {
        let output = OutputHandler::new(args.verbose);
        Self { args, output }
    }

    pub async fn run(&self) -> Result<()> {
        match &self.args.command {
            Command::Info { url } => self.info(url).await,
            Command::Download(download) => self.download(download).await,
        }
    }

    async fn info(&self, url: &str) -> Result<()> {
        // Nothing is written, so plan against the working directory
        let config = DownloaderConfig::default()
            .with_base_dir(".")
            .with_ytdlp_binary(&self.args.ytdlp);
        let downloader = MediaDownloader::new(config).await?;

        let listing = downloader.resolve(url).await?;
        if listing.is_empty() {
            println!("No content found at the provided URL.");
            return Ok(());
        }
        self.output.print_listing(&listing);
        Ok(())
    }

    async fn download(&self, args: &DownloadArgs) -> Result<()> {
        let downloader = MediaDownloader::new(args.config(self.args.ytdlp.clone())).await?;

        let mut session = downloader.open_session(&args.url).await?;
        if session.listing().is_empty() {
            println!("No content found at the provided URL.");
            return Ok(());
        }
        self.output.print_listing(session.listing());

        session.select_range(args.selection(session.listing().len()))?;
        if session.selected_count() == 0 {
            println!("No videos selected.");
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let on_ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping after the current item");
                on_ctrl_c.cancel();
            }
        });

        let toggles = args.toggles();
        let (sink, mut events) = EventSink::channel();
        let download = async {
            let sink = sink;
            downloader
                .download_selection(&mut session, &toggles, &sink, &cancel)
                .await
        };
        let report = async {
            while let Some(event) = events.recv().await {
                self.output.print_event(&event);
            }
        };

        let (outcome, ()) = tokio::join!(download, report);
        let outcome = outcome?;

        self.output
            .print_summary(&outcome, session.last_run().map(|(paths, _)| paths));
        if args.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Ok(())
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        self.output.print_error(error);
    }
}
