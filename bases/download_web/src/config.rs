// bases/download_web/src/config.rs
use clap::Parser;
use media_downloader::DownloaderConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Web front end configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    pub downloader: DownloaderConfig,
}

/// Browser front end for downloading videos and playlists
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8501)]
    pub port: u16,

    /// Listen on all interfaces instead of localhost only
    #[arg(long)]
    pub public: bool,

    /// Directory downloads are stored under
    #[arg(short, long, default_value = "downloads")]
    pub download_dir: PathBuf,

    /// yt-dlp executable to use
    #[arg(long, default_value = "yt-dlp")]
    pub ytdlp: PathBuf,

    /// Subtitle language to request
    #[arg(long, default_value = "en")]
    pub sub_lang: String,

    /// Directory served under /static
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_args(args: CliArgs) -> Self {
        let ip = if args.public {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };

        let static_dir = args
            .static_dir
            .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")));

        Self {
            addr: SocketAddr::new(ip, args.port),
            static_dir,
            downloader: DownloaderConfig::default()
                .with_base_dir(args.download_dir)
                .with_ytdlp_binary(args.ytdlp)
                .with_subtitle_language(args.sub_lang),
        }
    }
}
