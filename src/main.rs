use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use log::{LevelFilter, info, warn};
use slotwatch::{
    PollLoop, Verdict, Verdicts,
    config::{MonitorConfig, RendererKind},
    notifier::{DiscordNotifier, LogNotifier, Notifier},
    renderer::{BrowserRenderer, HttpRenderer, PageRenderer},
    requests::RequestClient,
};
use tokio_util::sync::CancellationToken;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "slotwatch", version)]
#[command(about = "Watches a challenge-protected reservation page and alerts when target dates open up")]
struct Args {
    /// Run a single check, print the verdicts and exit
    #[arg(long)]
    once: bool,

    /// Send a test notification with every target marked available and exit
    #[arg(long)]
    test_notify: bool,

    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

fn build_notifier(config: &MonitorConfig, client: &RequestClient) -> Box<dyn Notifier> {
    match &config.discord_webhook_url {
        Some(url) => Box::new(DiscordNotifier::new(client.clone(), url, &config.page_url)),
        None => {
            warn!("DISCORD_WEBHOOK_URL is not set, alerts will only be logged");
            Box::new(LogNotifier)
        }
    }
}

async fn build_renderer(config: &MonitorConfig) -> anyhow::Result<Box<dyn PageRenderer>> {
    let renderer: Box<dyn PageRenderer> = match config.renderer {
        RendererKind::Browser => Box::new(
            BrowserRenderer::launch(&config.page_url, &config.browser_settings()).await?,
        ),
        RendererKind::Http => Box::new(HttpRenderer::new(
            RequestClient::new(config.render_timeout)?,
            &config.page_url,
        )),
    };
    Ok(renderer)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    // Only for RUST_LOG; MonitorConfig reads the same file itself.
    match &args.env_file {
        Some(path) => {
            dotenv::from_path(path)
                .with_context(|| format!("could not load {}", path.display()))?;
        }
        None => {
            dotenv().ok();
        }
    }
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = MonitorConfig::new(args.env_file.as_deref())?;
    let client = RequestClient::new(HTTP_TIMEOUT)?;
    let notifier = build_notifier(&config, &client);

    if args.test_notify {
        let verdicts = Verdicts::uniform(&config.targets, Verdict::Available);
        notifier
            .notify(&config.targets, &verdicts)
            .await
            .context("test notification failed")?;
        info!("Test notification sent");
        return Ok(());
    }

    let dates: Vec<String> = config.targets.iter().map(ToString::to_string).collect();
    info!("🅿️ slotwatch starting");
    info!("📅 Target dates: {}", dates.join(", "));
    info!("⏰ Check interval: {:?}", config.poll_interval);

    let renderer = build_renderer(&config).await?;
    let poll_loop = PollLoop::new(renderer, notifier, config.targets.clone())
        .with_gate(config.challenge_gate())
        .with_detector(config.detector())
        .with_poll_interval(config.poll_interval)
        .with_render_timeout(config.render_timeout);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("🛑 Stop requested");
                cancel.cancel();
            }
        }
    });

    if args.once {
        let report = poll_loop.run_once(cancel).await;
        for (date, verdict) in report.verdicts.iter() {
            println!("{date}: {verdict}");
        }
        return Ok(());
    }

    poll_loop.run(cancel).await;
    Ok(())
}
