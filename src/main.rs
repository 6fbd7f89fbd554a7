use anyhow::Context;
use clap::Parser;
use log::info;

use wallwatch::{BoardConfig, Monitor, Viewport, DEFAULT_REFRESH_INTERVAL};

/// Headless wallboard monitor: polls a status dashboard and keeps its
/// layout, favicon badge, and countdown fresh.
#[derive(Parser, Debug)]
#[command(name = "wallwatch", version, about)]
struct Cli {
    /// Dashboard URL to watch
    url: String,

    /// Poll interval in seconds (falls back to REFRESH_INTERVAL, then 30)
    #[arg(long)]
    interval: Option<u64>,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Poll once, print the outcome, and exit
    #[arg(long)]
    once: bool,

    /// Print the page snapshot as JSON after the first load and exit
    #[arg(long)]
    snapshot: bool,

    /// Override the User-Agent header
    #[arg(long)]
    user_agent: Option<String>,
}

fn refresh_interval(flag: Option<u64>) -> anyhow::Result<u64> {
    if let Some(secs) = flag {
        return Ok(secs);
    }
    match std::env::var("REFRESH_INTERVAL") {
        Ok(raw) => raw
            .trim()
            .parse()
            .context("REFRESH_INTERVAL must be an int"),
        Err(_) => Ok(DEFAULT_REFRESH_INTERVAL),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let interval = refresh_interval(cli.interval)?;
    let mut config = BoardConfig {
        refresh_interval_secs: interval,
        viewport: Viewport {
            width: cli.width,
            height: cli.height,
        },
        ..Default::default()
    };
    if let Some(user_agent) = cli.user_agent {
        config.user_agent = user_agent;
    }

    let mut monitor = Monitor::new(config)?;
    monitor.load(&cli.url)?;

    if cli.snapshot {
        println!("{}", monitor.snapshot()?);
        return Ok(());
    }

    if cli.once {
        let outcome = monitor.poll();
        println!("{:?}", outcome);
        return Ok(());
    }

    info!("watching {} every {}s", cli.url, interval);
    monitor.run();
    Ok(())
}
