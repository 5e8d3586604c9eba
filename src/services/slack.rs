use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const SLACK_API_URL: &str = "https://slack.com/api";

/// Slack rejects messages around 4000 bytes; stay safely under.
pub const MAX_MESSAGE_BYTES: usize = 3600;

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    mrkdwn: bool,
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadUrlResponse {
    ok: bool,
    error: Option<String>,
    upload_url: Option<String>,
    file_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompleteUploadRequest<'a> {
    files: Vec<FileRef<'a>>,
    channel_id: &'a str,
}

#[derive(Debug, Serialize)]
struct FileRef<'a> {
    id: String,
    title: &'a str,
}

pub struct SlackNotifier {
    client: Client,
    token: String,
    api_url: String,
}

impl SlackNotifier {
    pub fn new(token: String) -> Self {
        Self::with_api_url(token, SLACK_API_URL.to_string())
    }

    pub(crate) fn with_api_url(token: String, api_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            token,
            api_url,
        }
    }

    /// Post one markdown message to a channel.
    ///
    /// A Slack-side refusal (`ok: false`) is a hard error: the caller
    /// decides whether a lost alert aborts the run.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        let request = PostMessageRequest {
            channel,
            text,
            mrkdwn: true,
        };

        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.api_url))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        let slack: SlackResponse = response.json().await?;
        if !slack.ok {
            return Err(AppError::Slack(
                slack.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }

    /// Upload a file to a channel through the external upload flow:
    /// reserve a URL with `files.getUploadURLExternal`, send the bytes,
    /// then attach the file with `files.completeUploadExternal`.
    pub async fn upload_file(&self, channel: &str, filename: &str, contents: Vec<u8>) -> Result<()> {
        let length = contents.len().to_string();
        let response = self
            .client
            .post(format!("{}/files.getUploadURLExternal", self.api_url))
            .bearer_auth(&self.token)
            .form(&[("filename", filename), ("length", &length)])
            .send()
            .await?;

        let reserved: UploadUrlResponse = response.json().await?;
        if !reserved.ok {
            return Err(AppError::Slack(
                reserved.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        let upload_url = reserved
            .upload_url
            .ok_or_else(|| AppError::Slack("no upload_url returned".to_string()))?;
        let file_id = reserved
            .file_id
            .ok_or_else(|| AppError::Slack("no file_id returned".to_string()))?;

        let response = self.client.post(&upload_url).body(contents).send().await?;
        if !response.status().is_success() {
            return Err(AppError::Slack(format!(
                "file upload failed with status {}",
                response.status()
            )));
        }

        let complete = CompleteUploadRequest {
            files: vec![FileRef {
                id: file_id,
                title: filename,
            }],
            channel_id: channel,
        };
        let response = self
            .client
            .post(format!("{}/files.completeUploadExternal", self.api_url))
            .bearer_auth(&self.token)
            .json(&complete)
            .send()
            .await?;

        let slack: SlackResponse = response.json().await?;
        if !slack.ok {
            return Err(AppError::Slack(
                slack.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }

    /// Post `text` as a series of messages, each within the byte budget.
    pub async fn batch_notify(&self, channel: &str, text: &str) -> Result<()> {
        for chunk in split_paragraphs(text, MAX_MESSAGE_BYTES) {
            self.post_message(channel, &chunk).await?;
        }
        Ok(())
    }
}

/// Greedy paragraph packing under a byte budget.
///
/// Splits only on paragraph boundaries (`\n\n`), never mid-paragraph, and
/// preserves paragraph order: joining the batches back with the separator
/// reproduces the input verbatim.
pub fn split_paragraphs(text: &str, max_bytes: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut batches = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for paragraph in text.split("\n\n") {
        let len = paragraph.len();
        if current_len + len + 2 <= max_bytes {
            current.push(paragraph);
            current_len += len + 2;
        } else {
            if !current.is_empty() {
                batches.push(current.join("\n\n"));
            }
            current = vec![paragraph];
            current_len = len;
        }
    }

    if !current.is_empty() {
        batches.push(current.join("\n\n"));
    }

    batches
}
