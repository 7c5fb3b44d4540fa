//! Request orchestration for `/get-news`:
//! validate → fetch news → summarize → persist → respond.
//!
//! Any failure short-circuits; a history row is written only after both
//! upstream calls succeed.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use common::Credentials;

use crate::error::{AppError, AppResult};
use crate::llm::summarizer::Summarizer;
use crate::news::{compose_context, NewsClient};
use crate::storage;

/// Success body for `/get-news`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsAnalysis {
    pub topic: String,
    pub summary: String,
    pub sentiment: String,
}

/// Holds everything a lookup needs; built once at startup and shared across requests.
pub struct Orchestrator {
    credentials: Credentials,
    news: NewsClient,
    summarizer: Summarizer,
    db: SqlitePool,
}

impl Orchestrator {
    pub fn new(
        credentials: Credentials,
        news: NewsClient,
        summarizer: Summarizer,
        db: SqlitePool,
    ) -> Self {
        Self {
            credentials,
            news,
            summarizer,
            db,
        }
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }

    /// Run one lookup. Missing credentials are reported before a missing topic.
    pub async fn analyze(&self, topic: Option<&str>) -> AppResult<NewsAnalysis> {
        let missing = self.credentials.missing();
        if !missing.is_empty() {
            return Err(AppError::missing_config(missing.as_slice()));
        }
        let news_key = self.credentials.news.value().unwrap_or_default();

        let topic = match topic.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AppError::Validation("Topic is required".to_string())),
        };

        info!(topic, "analyzing topic");

        let snippets = self.news.fetch_articles(topic, news_key).await?;
        let context = compose_context(&snippets);

        let analysis = self.summarizer.summarize(topic, &context).await?;

        storage::append_search(&self.db, topic, &analysis.summary, &analysis.sentiment)
            .await
            .map_err(AppError::store)?;

        Ok(NewsAnalysis {
            topic: topic.to_string(),
            summary: analysis.summary,
            sentiment: analysis.sentiment,
        })
    }
}
