use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};

const USER_AGENT_STRING: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 (SeoAgent)";
const X_AGENT_STRING: &str = "SeoAgent-images/1.0";

/// A page that fetched successfully: the final URL after redirects and the
/// response body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub body: String,
}

/// Why a single GET failed. Status failures are handled differently from
/// transport failures on the image path, so the two are kept apart.
#[derive(Debug)]
pub enum FetchError {
    Transport(reqwest::Error),
    Status(StatusCode),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(e) => write!(f, "transport error: {}", e),
            FetchError::Status(status) => write!(f, "HTTP status {}", status),
        }
    }
}

impl std::error::Error for FetchError {}

/// Shared HTTP retrieval layer for sitemaps, article pages and images.
///
/// One client, one header set, one timeout policy. Batch fetches keep at
/// most `concurrency` requests in flight.
pub struct PageFetcher {
    client: Client,
    concurrency: usize,
}

impl PageFetcher {
    pub fn new(concurrency: usize) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
        headers.insert("X-Agent", HeaderValue::from_static(X_AGENT_STRING));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch a batch of URLs and return the pages that succeeded.
    ///
    /// Any URL that fails at the transport level or returns a non-success
    /// status is logged and dropped; one bad URL never fails the batch. The
    /// order of the returned pages is unspecified.
    pub async fn fetch_batch(&self, urls: &[String]) -> Vec<FetchedPage> {
        stream::iter(urls)
            .map(|url| async move {
                match self.get_page(url).await {
                    Ok(page) => Some(page),
                    Err(e) => {
                        tracing::warn!("Failed to fetch {}: {}", url, e);
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|r| async { r })
            .collect()
            .await
    }

    async fn get_page(&self, url: &str) -> std::result::Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(FetchError::Transport)?;

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }

    /// Single GET returning raw bytes, used for sitemap XML and images.
    pub async fn get_bytes(&self, url: &str) -> std::result::Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        response.bytes().await.map_err(FetchError::Transport)
    }
}
