use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Number of rows served by `/history`
pub const HISTORY_LIMIT: i64 = 15;

/// One completed lookup. Rows are append-only.
#[derive(Debug, Clone)]
pub struct SearchRecord {
    pub id: i64,
    pub topic: String,
    pub summary: String,
    pub sentiment: String,
    pub timestamp: DateTime<Utc>,
}

/// Ensure the history table exists. Idempotent; safe to call at every startup.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    info!("storage: ensuring DB schema (CREATE TABLE IF NOT EXISTS ...)");

    let stmts = [
        r#"
        CREATE TABLE IF NOT EXISTS search_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            topic TEXT NOT NULL CHECK (length(topic) BETWEEN 1 AND 100),
            summary TEXT NOT NULL,
            sentiment TEXT NOT NULL,
            timestamp TIMESTAMP NOT NULL
        );
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_search_history_timestamp
            ON search_history (timestamp);
        "#,
    ];

    for s in &stmts {
        sqlx::query(s)
            .execute(pool)
            .await
            .context("failed to ensure schema")?;
    }

    info!("storage: DB schema ensured");
    Ok(())
}

/// Insert one record; the store assigns `id` and the write time.
pub async fn append_search(
    pool: &SqlitePool,
    topic: &str,
    summary: &str,
    sentiment: &str,
) -> Result<SearchRecord> {
    let timestamp = Utc::now();

    let id = sqlx::query(
        r#"
        INSERT INTO search_history (topic, summary, sentiment, timestamp)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(topic)
    .bind(summary)
    .bind(sentiment)
    .bind(timestamp)
    .execute(pool)
    .await
    .context("failed to insert search record")?
    .last_insert_rowid();

    info!(id, topic, "stored search record");

    Ok(SearchRecord {
        id,
        topic: topic.to_string(),
        summary: summary.to_string(),
        sentiment: sentiment.to_string(),
        timestamp,
    })
}

/// Most recent `limit` records, newest first. Equal timestamps fall back to insertion order.
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<SearchRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, topic, summary, sentiment, timestamp
        FROM search_history
        ORDER BY timestamp DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to query search history")?;

    rows.into_iter()
        .map(|r| {
            Ok(SearchRecord {
                id: r.try_get("id")?,
                topic: r.try_get("topic")?,
                summary: r.try_get("summary")?,
                sentiment: r.try_get("sentiment")?,
                timestamp: r.try_get("timestamp")?,
            })
        })
        .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
        .context("failed to decode search history row")
}
