pub const SCHEMA: &str = r#"
-- article_image table
-- article_url is deliberately not UNIQUE: dedup is the pipeline's job and
-- out-of-band inserts are out of scope.
CREATE TABLE IF NOT EXISTS article_image (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_url TEXT NOT NULL,
    image_url TEXT NOT NULL,
    image_width INTEGER NOT NULL,
    image_height INTEGER NOT NULL,
    image_extension TEXT NOT NULL,
    image_weight INTEGER NOT NULL,
    has_video INTEGER NOT NULL DEFAULT 0,
    source TEXT NOT NULL DEFAULT 'web',
    published_at TEXT,
    fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_article_image_url ON article_image(article_url);
CREATE INDEX IF NOT EXISTS idx_article_image_width ON article_image(image_width);

-- audit_image table
CREATE TABLE IF NOT EXISTS audit_image (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id INTEGER NOT NULL REFERENCES article_image(id),
    status TEXT NOT NULL,
    type TEXT NOT NULL,
    last_notify TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_image_article_id ON audit_image(article_id);
"#;
