use anyhow::{Context, Result};
use newspaper_overlay::config::Config;
use newspaper_overlay::host::http::HttpHostTransport;
use newspaper_overlay::host::replay::ReplayFeed;
use newspaper_overlay::host::ws::WsFeed;
use newspaper_overlay::host::{HostTransport, MessageSource};
use newspaper_overlay::images::ImageProber;
use newspaper_overlay::overlay::OverlayController;
use newspaper_overlay::tui;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

struct Args {
    config_path: PathBuf,
    offline: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        config_path: PathBuf::from("config.toml"),
        offline: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--offline" => args.offline = true,
            "--config" => {
                if let Some(path) = iter.next() {
                    args.config_path = PathBuf::from(path);
                }
            }
            other => eprintln!("  ignoring unknown argument: {}", other),
        }
    }
    args
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args();

    // Load saved settings from .env (real env vars take precedence)
    Config::load_env_file();
    let config = Config::load(&args.config_path)?;

    let log_file = std::fs::File::create(&config.logging.file)
        .with_context(|| format!("Failed to create log file: {}", config.logging.file.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(log_file)
        .init();

    let host: Option<Arc<dyn HostTransport>> = if args.offline || config.host.offline {
        println!("  Offline: host callbacks disabled");
        None
    } else {
        let base = config.host.callback_base();
        println!("  Host callbacks: {}", base);
        Some(Arc::new(HttpHostTransport::new(&base)?))
    };

    let source: Option<Box<dyn MessageSource>> = match (&config.host.feed_url, &config.host.replay_file) {
        (Some(url), _) => Some(Box::new(WsFeed::new(
            url,
            Duration::from_secs(config.host.reconnect_delay_s),
        ))),
        (None, Some(path)) => Some(Box::new(ReplayFeed::new(
            path.clone(),
            Duration::from_millis(config.host.replay_interval_ms),
        ))),
        (None, None) => None,
    };

    match &source {
        Some(source) => println!("  Host messages: {}", source.name()),
        None => println!("  No host message source configured"),
    }

    let prober = if config.images.probe {
        Some(ImageProber::new(Duration::from_millis(config.images.probe_timeout_ms))?)
    } else {
        None
    };

    let controller = OverlayController::new(config.overlay.options(), host);
    tracing::info!(resource = %config.host.resource_name(), "starting overlay");

    tui::run_tui(controller, source, prober, config.overlay.title.clone()).await
}
