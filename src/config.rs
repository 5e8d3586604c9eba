use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::sources;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Sitemap endpoints scraped on every run, in order.
    #[serde(default = "sources::default_sitemaps")]
    pub sitemaps: Vec<String>,

    /// Maximum in-flight requests per article batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    pub slack_bot_token: Option<String>,
    /// Channel for the low-image report and activity summary.
    pub slack_channel: Option<String>,
    /// Channel for synchronous image-fetch-error alerts.
    pub alert_channel: Option<String>,

    /// Images at or under this width (pixels) end up in the report.
    #[serde(default = "default_low_width_threshold")]
    pub low_width_threshold: i64,

    /// Maximum rows per report pass.
    #[serde(default = "default_report_limit")]
    pub report_limit: i64,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("image-audit");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("images.db").to_string_lossy().to_string()
}

fn default_concurrency() -> usize {
    20
}

fn default_low_width_threshold() -> i64 {
    1100
}

fn default_report_limit() -> i64 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            sitemaps: sources::default_sitemaps(),
            concurrency: default_concurrency(),
            slack_bot_token: None,
            slack_channel: None,
            alert_channel: None,
            low_width_threshold: default_low_width_threshold(),
            report_limit: default_report_limit(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("image-audit")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = Config::default();
        let content = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();
        assert_eq!(parsed.sitemaps, config.sitemaps);
        assert_eq!(parsed.concurrency, 20);
        assert_eq!(parsed.low_width_threshold, 1100);
        assert_eq!(parsed.report_limit, 50);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: Config = toml::from_str(r#"db_path = "/tmp/test.db""#).unwrap();
        assert_eq!(parsed.db_path, "/tmp/test.db");
        assert_eq!(parsed.sitemaps.len(), 4);
        assert!(parsed.slack_bot_token.is_none());
    }
}
