use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use scrapekit::agent::Agent;
use scrapekit::config::{ConfigBuilder, LogLevel, ENV_PREFIX};
use scrapekit::exposition;
use scrapekit::registry::CollectorRegistry;
use scrapekit::source::CimQuerySource;
use scrapekit::util::logging;

/// Scrape the enabled collectors and print their metrics
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, default_value = "scrapekit.toml")]
    config: PathBuf,

    /// Comma-separated collectors to enable (default: all)
    #[arg(long, value_delimiter = ',')]
    collectors: Vec<String>,

    /// Logging level
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// Print the registered collector names and exit
    #[arg(long)]
    list: bool,

    /// Scrape repeatedly, this many seconds apart
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ConfigBuilder::new()
        .add_file(&args.config)
        .add_env(ENV_PREFIX)
        .build()
        .context("loading configuration")?;

    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if !args.collectors.is_empty() {
        config.collectors.enabled = args.collectors.clone();
    }

    logging::init(config.log_level);

    let registry = CollectorRegistry::with_builtin();
    if args.list {
        for name in registry.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let query = Arc::new(CimQuerySource::new(
        config.query.program.clone(),
        Duration::from_secs(config.query.timeout_secs),
    ));
    let agent = Agent::from_config(&config, &registry, query)?;

    match args.interval {
        None => {
            let report = agent.scrape().await;
            print!("{}", exposition::render(&report.samples));
        }
        Some(secs) => {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
            info!("Scraping every {}s", secs.max(1));

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = agent.scrape().await;
                        let failed = report.failed().count();
                        if failed > 0 {
                            warn!("{} of {} collectors failed", failed, report.outcomes.len());
                        }
                        print!("{}", exposition::render(&report.samples));
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutting down");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
