use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use url::Url;

use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::models::ArticleImage;
use crate::services::SlackNotifier;

/// Compose the report block for one under-threshold image. Values outside
/// the newsroom's requirements are bolded.
pub fn format_entry(row: &ArticleImage) -> String {
    let size = format!("{}x{}", row.image_width, row.image_height);
    let size = if row.image_width >= 1200 {
        size
    } else {
        format!("**{}**", size)
    };

    let ratio = row.image_width as f64 / row.image_height as f64;
    let ratio = if (1.75..1.80).contains(&ratio) {
        format!("{:.2}", ratio)
    } else {
        format!("**{:.2}**", ratio)
    };

    let weight = format!("{:.2} KB", row.image_weight as f64 / 1024.0);

    let mut text = format!(
        "{url}\n- **SIZE** (min 1200*675px): {size} -> {weight}\n- **RATIO** (tra 1,75 e 1,80): {ratio}\n- **REDA** : {source}",
        url = row.article_url,
        size = size,
        weight = weight,
        ratio = ratio,
        source = row.source.to_uppercase(),
    );
    if row.has_video {
        text.push_str("\n**VIDEO**: **SI** in **TOPMEDIA**");
    }
    text
}

/// Unique images per domain per day, as CSV. The reporting channel gets
/// this instead of a rendered chart; same aggregation, tabular form.
pub fn domain_day_csv(rows: &[(String, DateTime<Utc>)]) -> String {
    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for (article_url, fetched_at) in rows {
        let domain = Url::parse(article_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| {
                article_url
                    .split('/')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            });
        let day = fetched_at.date_naive().to_string();
        *counts.entry((day, domain)).or_insert(0) += 1;
    }

    let mut csv = String::from("date,domain,image_count\n");
    for ((day, domain), count) in counts {
        csv.push_str(&format!("{},{},{}\n", day, domain, count));
    }
    csv
}

/// The reporting pass: select under-threshold images not yet notified,
/// deliver the batched report, stamp audit rows so the next pass skips
/// them, then upload the 7-day activity summary. Report delivery failures
/// abort the pass; a failed summary upload is only logged.
pub async fn run_report(
    config: &Config,
    repository: &Repository,
    notifier: &SlackNotifier,
    channel: &str,
) -> Result<()> {
    let low = repository
        .low_width_images(config.low_width_threshold, config.report_limit)
        .await?;

    if low.is_empty() {
        tracing::info!("No under-threshold images to report");
    } else {
        let blocks: Vec<String> = low.iter().map(format_entry).collect();
        notifier.batch_notify(channel, &blocks.join("\n\n")).await?;

        for row in &low {
            repository.add_audit(row.id, "notified", "low_img").await?;
        }
        tracing::info!("Reported {} under-threshold images", low.len());
    }

    let recent = repository.recent_fetches(7).await?;
    let csv = domain_day_csv(&recent);
    // A lost summary is not worth aborting the run over; the audit rows
    // above are already stamped and the next pass regenerates the CSV.
    if let Err(e) = notifier
        .upload_file(channel, "images_per_day.csv", csv.into_bytes())
        .await
    {
        tracing::error!("Error uploading file: {}", e);
    }

    Ok(())
}
