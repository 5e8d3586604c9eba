use std::collections::HashSet;

use crate::article;
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::models::NewArticleImage;
use crate::services::SlackNotifier;
use crate::sitemap;

/// Fetch one sitemap and extract a record per article page.
///
/// Partial success is the norm: a sitemap that fails to fetch or parse
/// contributes nothing, and an article that fails any required step is
/// skipped. The only error propagated is a failed alert delivery.
async fn scrape_sitemap(
    fetcher: &PageFetcher,
    alerts: Option<(&SlackNotifier, &str)>,
    sitemap_url: &str,
) -> Result<Vec<NewArticleImage>> {
    let xml = match fetcher.get_bytes(sitemap_url).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::error!("{} => Error Document: {}", sitemap_url, e);
            return Ok(Vec::new());
        }
    };

    let article_urls = sitemap::extract_article_urls(sitemap_url, &xml);
    let pages = fetcher.fetch_batch(&article_urls).await;

    let mut records = Vec::new();
    for page in &pages {
        if let Some(record) = article::extract_record(fetcher, alerts, page).await? {
            records.push(record);
        }
    }

    tracing::info!("Extracted {} articles from {}", records.len(), sitemap_url);
    Ok(records)
}

/// Keep only records whose URL is not already in the store, preserving the
/// batch's relative order. The removed count is informational, never an
/// error.
pub fn drop_duplicates(
    batch: Vec<NewArticleImage>,
    existing: &HashSet<String>,
) -> Vec<NewArticleImage> {
    let before = batch.len();
    let fresh: Vec<_> = batch
        .into_iter()
        .filter(|article| !existing.contains(&article.article_url))
        .collect();
    tracing::info!("Removed {} duplicated articles", before - fresh.len());
    fresh
}

/// One full scrape run: every configured sitemap in order, dedup against
/// the store, append what is new. Returns the number of rows committed.
pub async fn run_scrape(
    config: &Config,
    repository: &Repository,
    fetcher: &PageFetcher,
    notifier: Option<&SlackNotifier>,
) -> Result<usize> {
    let alerts = match (notifier, config.alert_channel.as_deref()) {
        (Some(notifier), Some(channel)) => Some((notifier, channel)),
        _ => None,
    };

    let mut batch = Vec::new();
    for sitemap_url in &config.sitemaps {
        let mut records = scrape_sitemap(fetcher, alerts, sitemap_url).await?;
        batch.append(&mut records);
    }

    tracing::info!(
        "Extracted {} articles from {} sitemaps",
        batch.len(),
        config.sitemaps.len()
    );

    let existing = repository.existing_urls().await?;
    let fresh = drop_duplicates(batch, &existing);

    tracing::info!("Committing {} rows to the store", fresh.len());
    let inserted = repository.insert_articles(fresh).await?;

    Ok(inserted)
}
