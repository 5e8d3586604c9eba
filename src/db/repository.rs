use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{ArticleImage, AuditEntry, NewArticleImage};

use super::schema::SCHEMA;

pub struct Repository {
    conn: Connection,
}

impl Repository {
    /// Open the store, creating the tables if they do not exist. A failure
    /// here is fatal to the run: there is nothing useful to do without a
    /// store.
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Article operations

    /// Every article URL currently in the store, loaded once per run for
    /// the dedup membership test.
    pub async fn existing_urls(&self) -> Result<HashSet<String>> {
        let urls = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT article_url FROM article_image")?;
                let urls = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<HashSet<_>, _>>()?;
                Ok(urls)
            })
            .await?;
        Ok(urls)
    }

    /// Append a batch of freshly extracted rows in one transaction.
    ///
    /// Pure append: no update or merge semantics. The caller is expected to
    /// have filtered out URLs already present.
    pub async fn insert_articles(&self, articles: Vec<NewArticleImage>) -> Result<usize> {
        let count = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        r#"INSERT INTO article_image
                               (article_url, image_url, image_width, image_height,
                                image_extension, image_weight, has_video, source,
                                published_at, fetched_at)
                           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
                    )?;
                    for article in &articles {
                        stmt.execute(params![
                            article.article_url,
                            article.image_url,
                            article.image_width,
                            article.image_height,
                            article.image_extension,
                            article.image_weight,
                            article.has_video,
                            article.source,
                            article.published_at,
                            article
                                .fetched_at
                                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(articles.len())
            })
            .await?;
        Ok(count)
    }

    /// Under-threshold images not yet notified, smallest first. URLs under
    /// /ultimaora/ are breaking-news placeholders and excluded.
    pub async fn low_width_images(&self, max_width: i64, limit: i64) -> Result<Vec<ArticleImage>> {
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, article_url, image_url, image_width, image_height,
                              image_extension, image_weight, has_video, source,
                              published_at, fetched_at
                       FROM article_image
                       WHERE image_width <= ?1
                         AND id NOT IN (SELECT article_id FROM audit_image
                                        WHERE status = 'notified' AND type = 'low_img')
                         AND article_url NOT LIKE '%/ultimaora/%'
                       ORDER BY image_width ASC
                       LIMIT ?2"#,
                )?;
                let rows = stmt
                    .query_map(params![max_width, limit], |row| Ok(article_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(rows)
    }

    /// Distinct (article_url, fetched_at) pairs from the last `days` days,
    /// for the per-domain activity summary.
    pub async fn recent_fetches(&self, days: i64) -> Result<Vec<(String, DateTime<Utc>)>> {
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT DISTINCT article_url, fetched_at
                       FROM article_image
                       WHERE DATE(fetched_at) >= DATE('now', ?1)"#,
                )?;
                let window = format!("-{} days", days);
                let rows = stmt
                    .query_map(params![window], |row| {
                        let url: String = row.get(0)?;
                        let fetched_at: String = row.get(1)?;
                        Ok((url, fetched_at))
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(|(url, fetched_at)| {
                let fetched_at = parse_datetime(&fetched_at).unwrap_or_else(Utc::now);
                (url, fetched_at)
            })
            .collect())
    }

    // Audit operations

    /// Record a notification event, stamping the current time. Append-only;
    /// audit rows are never updated or deleted.
    pub async fn add_audit(&self, article_id: i64, status: &str, kind: &str) -> Result<i64> {
        let status = status.to_string();
        let kind = kind.to_string();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO audit_image (article_id, status, type, last_notify)
                       VALUES (?1, ?2, ?3, datetime('now'))"#,
                    params![article_id, status, kind],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Audit rows for one article, oldest first. Read surface for ad hoc
    /// filtering by the reporting pass.
    #[allow(dead_code)]
    pub async fn audits_for(&self, article_id: i64) -> Result<Vec<AuditEntry>> {
        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT id, article_id, status, type, last_notify
                       FROM audit_image
                       WHERE article_id = ?1
                       ORDER BY id"#,
                )?;
                let rows = stmt
                    .query_map(params![article_id], |row| Ok(audit_from_row(row)))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;
        Ok(rows)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn article_from_row(row: &Row) -> ArticleImage {
    ArticleImage {
        id: row.get(0).unwrap(),
        article_url: row.get(1).unwrap(),
        image_url: row.get(2).unwrap(),
        image_width: row.get(3).unwrap(),
        image_height: row.get(4).unwrap(),
        image_extension: row.get(5).unwrap(),
        image_weight: row.get(6).unwrap(),
        has_video: row.get::<_, i64>(7).unwrap() != 0,
        source: row.get(8).unwrap(),
        published_at: row.get(9).unwrap(),
        fetched_at: row
            .get::<_, String>(10)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

fn audit_from_row(row: &Row) -> AuditEntry {
    AuditEntry {
        id: row.get(0).unwrap(),
        article_id: row.get(1).unwrap(),
        status: row.get(2).unwrap(),
        kind: row.get(3).unwrap(),
        last_notify: row
            .get::<_, String>(4)
            .ok()
            .and_then(|s| parse_datetime(&s))
            .unwrap_or_else(Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, width: i64) -> NewArticleImage {
        NewArticleImage {
            article_url: url.to_string(),
            image_url: format!("{}/image.jpg", url),
            image_width: width,
            image_height: 675,
            image_extension: "jpg".to_string(),
            image_weight: 150_000,
            has_video: false,
            source: "web".to_string(),
            published_at: "2025-06-01T10:00:00+02:00".to_string(),
            fetched_at: Utc::now(),
        }
    }

    async fn temp_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    #[tokio::test]
    async fn schema_creation_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let path = path.to_str().unwrap();

        let repo = Repository::new(path).await.unwrap();
        repo.insert_articles(vec![record("https://example.com/a", 800)])
            .await
            .unwrap();
        drop(repo);

        // Reopening applies the DDL again and must not clobber the data.
        let repo = Repository::new(path).await.unwrap();
        let urls = repo.existing_urls().await.unwrap();
        assert!(urls.contains("https://example.com/a"));
    }

    #[tokio::test]
    async fn insert_then_read_back() {
        let (_dir, repo) = temp_repo().await;

        let inserted = repo
            .insert_articles(vec![
                record("https://example.com/a", 800),
                record("https://example.com/b", 1400),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let urls = repo.existing_urls().await.unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://example.com/a"));
        assert!(urls.contains("https://example.com/b"));
    }

    #[tokio::test]
    async fn low_width_excludes_audited_and_breaking_news() {
        let (_dir, repo) = temp_repo().await;

        repo.insert_articles(vec![
            record("https://example.com/a", 800),
            record("https://example.com/b", 900),
            record("https://example.com/ultimaora/c", 700),
            record("https://example.com/d", 1400),
        ])
        .await
        .unwrap();

        let low = repo.low_width_images(1100, 50).await.unwrap();
        let urls: Vec<_> = low.iter().map(|r| r.article_url.as_str()).collect();
        // Smallest first, /ultimaora/ and over-threshold rows excluded.
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);

        // Marking the smallest as notified removes it from the next pass.
        repo.add_audit(low[0].id, "notified", "low_img").await.unwrap();
        let low = repo.low_width_images(1100, 50).await.unwrap();
        let urls: Vec<_> = low.iter().map(|r| r.article_url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/b"]);
    }

    #[tokio::test]
    async fn audit_rows_are_append_only() {
        let (_dir, repo) = temp_repo().await;

        repo.insert_articles(vec![record("https://example.com/a", 800)])
            .await
            .unwrap();
        let low = repo.low_width_images(1100, 50).await.unwrap();
        let article_id = low[0].id;

        repo.add_audit(article_id, "notified", "low_img").await.unwrap();
        repo.add_audit(article_id, "notified", "bad_ratio").await.unwrap();

        let audits = repo.audits_for(article_id).await.unwrap();
        assert_eq!(audits.len(), 2);
        assert_eq!(audits[0].kind, "low_img");
        assert_eq!(audits[1].kind, "bad_ratio");
        assert!(audits.iter().all(|a| a.status == "notified"));
    }

    #[tokio::test]
    async fn recent_fetches_covers_fresh_rows() {
        let (_dir, repo) = temp_repo().await;

        repo.insert_articles(vec![record("https://example.com/a", 800)])
            .await
            .unwrap();

        let recent = repo.recent_fetches(7).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].0, "https://example.com/a");
    }
}
