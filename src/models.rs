use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One freshly extracted article image, not yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticleImage {
    pub article_url: String,
    pub image_url: String,
    pub image_width: i64,
    pub image_height: i64,
    pub image_extension: String,
    pub image_weight: i64,
    pub has_video: bool,
    pub source: String,
    /// Raw `article:published_time` attribute value, stored verbatim.
    pub published_at: String,
    pub fetched_at: DateTime<Utc>,
}

/// A stored article image row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleImage {
    pub id: i64,
    pub article_url: String,
    pub image_url: String,
    pub image_width: i64,
    pub image_height: i64,
    pub image_extension: String,
    pub image_weight: i64,
    pub has_video: bool,
    pub source: String,
    pub published_at: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// One notification event. Created once per (article, type) the first time
/// a threshold is crossed; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub article_id: i64,
    pub status: String,
    pub kind: String,
    pub last_notify: DateTime<Utc>,
}
