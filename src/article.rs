use std::io::Cursor;

use bytes::Bytes;
use chrono::Utc;
use image::ImageReader;
use scraper::{Html, Selector};

use crate::error::Result;
use crate::fetch::{FetchError, FetchedPage, PageFetcher};
use crate::models::NewArticleImage;
use crate::services::SlackNotifier;
use crate::sources;

/// Metadata pulled from the article HTML before the image is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArticle {
    pub image_url: String,
    pub has_video: bool,
    pub published_at: String,
    pub source: String,
}

/// Pixel dimensions, container format and byte size of a fetched image.
#[derive(Debug, Clone)]
struct DecodedImage {
    width: u32,
    height: u32,
    extension: String,
    weight: usize,
}

/// The ordered image-resolution policy: fetch, retry once with an https
/// prefix when the URL had no scheme, alert-and-skip on an HTTP error
/// status. `Locate` happens in [`parse_article`] before this runs.
#[derive(Debug)]
enum ImageStep {
    Fetch { url: String, retried: bool },
    SchemeRetry { url: String },
    Done { url: String, image: DecodedImage },
    Failed,
}

/// Parse one article page into its metadata.
///
/// Returns `None` (logged) when the page is missing the og:image or the
/// published-time metadata; both are required and neither has a fallback.
/// The HTML parse itself is tolerant and never fails outright.
pub fn parse_article(url: &str, html: &str) -> Option<ParsedArticle> {
    let doc = Html::parse_document(html);

    let image_sel = Selector::parse(r#"meta[property="og:image"]"#).expect("valid selector");
    let image_url = match doc
        .select(&image_sel)
        .find_map(|el| el.value().attr("content"))
    {
        Some(content) => content.to_string(),
        None => {
            tracing::error!("{} => Error: No image found", url);
            return None;
        }
    };

    let published_sel =
        Selector::parse(r#"meta[property="article:published_time"]"#).expect("valid selector");
    let published_at = match doc
        .select(&published_sel)
        .find_map(|el| el.value().attr("content"))
    {
        Some(content) => content.to_string(),
        None => {
            tracing::error!("{} => Error: No published time found", url);
            return None;
        }
    };

    // The player wrapper only counts as a video marker when it carries a
    // content attribute.
    let video_sel = Selector::parse(r#"div[class*="dailymotion-player-wrapper"][content]"#)
        .expect("valid selector");
    let has_video = doc.select(&video_sel).next().is_some();

    // props.pageProps.leaf.source from the embedded __NEXT_DATA__ block,
    // defaulting to "web" when the path is missing. When several blocks
    // parse, the last one wins.
    let data_sel = Selector::parse(r#"script[id="__NEXT_DATA__"]"#).expect("valid selector");
    let mut source = sources::normalize_source("");
    for script in doc.select(&data_sel) {
        let raw: String = script.text().collect();
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(data) => {
                let tag = data
                    .pointer("/props/pageProps/leaf/source")
                    .and_then(|v| v.as_str())
                    .unwrap_or("web");
                source = sources::normalize_source(tag);
            }
            Err(e) => tracing::debug!("{} => unparseable __NEXT_DATA__ block: {}", url, e),
        }
    }

    Some(ParsedArticle {
        image_url,
        has_video,
        published_at,
        source,
    })
}

/// True when the URL cannot be fetched as-is for lack of a scheme
/// (e.g. `//cdn.example.com/img.jpg`).
fn missing_scheme(url: &str) -> bool {
    url::Url::parse(url).is_err()
}

fn decode_image(bytes: &Bytes) -> anyhow::Result<DecodedImage> {
    let reader = ImageReader::new(Cursor::new(bytes.as_ref())).with_guessed_format()?;
    let format = reader
        .format()
        .ok_or_else(|| anyhow::anyhow!("unrecognized image format"))?;
    let (width, height) = reader.into_dimensions()?;

    Ok(DecodedImage {
        width,
        height,
        extension: format
            .extensions_str()
            .first()
            .copied()
            .unwrap_or("bin")
            .to_string(),
        weight: bytes.len(),
    })
}

/// Drive the image-resolution state machine for one article.
///
/// `Ok(None)` means the article is skipped; the only error surfaced is a
/// failed alert delivery, which the caller decides how to handle.
async fn resolve_image(
    fetcher: &PageFetcher,
    alerts: Option<(&SlackNotifier, &str)>,
    article_url: &str,
    image_url: &str,
) -> Result<Option<(String, DecodedImage)>> {
    let mut step = ImageStep::Fetch {
        url: image_url.to_string(),
        retried: false,
    };

    loop {
        step = match step {
            ImageStep::Fetch { url, retried } => match fetcher.get_bytes(&url).await {
                Ok(bytes) => match decode_image(&bytes) {
                    Ok(image) => ImageStep::Done { url, image },
                    Err(e) => {
                        tracing::warn!("{} => Warning Image: undecodable {}: {}", article_url, url, e);
                        ImageStep::Failed
                    }
                },
                Err(FetchError::Status(status)) => {
                    if let Some((notifier, channel)) = alerts {
                        let text = format!(
                            "[Scraper Error] The article {} has an image failing with status {}: {}",
                            article_url,
                            status.as_u16(),
                            url
                        );
                        notifier.post_message(channel, &text).await?;
                    }
                    tracing::warn!("{} => Warning Image: HTTP {} for {}", article_url, status, url);
                    ImageStep::Failed
                }
                Err(FetchError::Transport(e)) => {
                    if !retried && missing_scheme(&url) {
                        tracing::warn!("{} => Warning Image: missing scheme on {}", article_url, url);
                        ImageStep::SchemeRetry { url }
                    } else {
                        tracing::warn!("{} => Warning Image: {}", article_url, e);
                        ImageStep::Failed
                    }
                }
            },
            ImageStep::SchemeRetry { url } => ImageStep::Fetch {
                url: format!("https://{}", url.trim_start_matches('/')),
                retried: true,
            },
            ImageStep::Done { url, image } => return Ok(Some((url, image))),
            ImageStep::Failed => return Ok(None),
        };
    }
}

/// Full extraction for one fetched page: zero or one record.
///
/// Every per-article failure (missing metadata, unreachable or undecodable
/// image) is a logged skip, never a batch failure.
pub async fn extract_record(
    fetcher: &PageFetcher,
    alerts: Option<(&SlackNotifier, &str)>,
    page: &FetchedPage,
) -> Result<Option<NewArticleImage>> {
    let Some(parsed) = parse_article(&page.url, &page.body) else {
        return Ok(None);
    };

    let Some((image_url, image)) =
        resolve_image(fetcher, alerts, &page.url, &parsed.image_url).await?
    else {
        return Ok(None);
    };

    Ok(Some(NewArticleImage {
        article_url: page.url.clone(),
        image_url,
        image_width: i64::from(image.width),
        image_height: i64::from(image.height),
        image_extension: image.extension,
        image_weight: image.weight as i64,
        has_video: parsed.has_video,
        source: parsed.source,
        published_at: parsed.published_at,
        fetched_at: Utc::now(),
    }))
}
