mod article;
mod config;
mod db;
mod error;
mod fetch;
mod models;
mod pipeline;
mod report;
mod services;
mod sitemap;
mod sources;

use config::Config;
use db::Repository;
use error::Result;
use fetch::PageFetcher;
use services::SlackNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = Config::load()?;

    // --db <path> overrides the configured store location
    if let Some(pos) = args.iter().position(|a| a == "--db") {
        if let Some(path) = args.get(pos + 1) {
            config.db_path = path.clone();
        }
    }

    let scrape_only = args.iter().any(|a| a == "--scrape-only");
    let report_only = args.iter().any(|a| a == "--report-only");

    // No store, no run.
    let repository = Repository::new(&config.db_path).await?;

    let fetcher = PageFetcher::new(config.concurrency);
    let notifier = config
        .slack_bot_token
        .as_ref()
        .map(|token| SlackNotifier::new(token.clone()));

    if !report_only {
        let inserted =
            pipeline::run_scrape(&config, &repository, &fetcher, notifier.as_ref()).await?;
        println!("Committed {} new articles", inserted);
    }

    if !scrape_only {
        match (notifier.as_ref(), config.slack_channel.as_deref()) {
            (Some(notifier), Some(channel)) => {
                report::run_report(&config, &repository, notifier, channel).await?;
            }
            _ => tracing::warn!("Slack token or channel not configured, skipping report"),
        }
    }

    Ok(())
}
