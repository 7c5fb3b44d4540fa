// Shared fixtures for the integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use sqlx::SqlitePool;
use tempfile::TempDir;

use common::{init_db_pool, Config, Credentials};
use vibecheck::llm::summarizer::Summarizer;
use vibecheck::llm::{LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use vibecheck::news::NewsClient;
use vibecheck::pipeline::Orchestrator;
use vibecheck::storage;

pub const NEWS_KEY: &str = "news-test-key";
pub const LLM_KEY: &str = "llm-test-key";

/// Fresh database with the history schema in a temporary directory.
pub async fn setup_test_db(dir: &TempDir) -> SqlitePool {
    let db_path = dir.path().join("news.db");
    let pool = init_db_pool(&db_path.to_string_lossy()).await.expect("init pool");
    storage::ensure_schema(&pool).await.expect("ensure schema");
    pool
}

/// Default config pointed at a mock news server, with three fallback models.
pub fn test_config(news_base_url: &str) -> Config {
    let mut config = Config::default();
    config.news.api_url = format!("{}/v2/everything", news_base_url);
    config.llm.models = vec!["model-a".into(), "model-b".into(), "model-c".into()];
    config
}

pub fn credentials(news: Option<&str>, llm: Option<&str>) -> Credentials {
    Credentials::resolve(&Config::default(), |name| match name {
        "NEWS_API_KEY" => news.map(str::to_string),
        "GEMINI_API_KEY" => llm.map(str::to_string),
        _ => None,
    })
}

pub fn news_body(articles: &[(&str, &str)]) -> String {
    let articles: Vec<serde_json::Value> = articles
        .iter()
        .map(|(title, description)| serde_json::json!({ "title": title, "description": description }))
        .collect();
    serde_json::json!({
        "status": "ok",
        "totalResults": articles.len(),
        "articles": articles,
    })
    .to_string()
}

/// Provider that replays canned outcomes in order and records every model it was asked for.
#[derive(Default)]
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(outcomes: Vec<Result<&str, &str>>) -> Arc<Self> {
        let outcomes = outcomes
            .into_iter()
            .map(|o| o.map(str::to_string).map_err(str::to_string))
            .collect();
        Arc::new(Self {
            outcomes: Mutex::new(outcomes),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, request: LlmRequest) -> anyhow::Result<LlmResponse> {
        self.calls.lock().unwrap().push(request.model.clone());
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted outcome left".to_string()));

        match outcome {
            Ok(content) => Ok(LlmResponse {
                content,
                usage: UsageMetadata::default(),
                model: request.model,
            }),
            Err(message) => Err(anyhow!(message)),
        }
    }
}

pub fn orchestrator(
    config: &Config,
    credentials: Credentials,
    provider: Arc<ScriptedProvider>,
    pool: SqlitePool,
) -> Orchestrator {
    let news = NewsClient::new(&config.news).expect("news client");
    let summarizer = Summarizer::new(provider, &config.llm);
    Orchestrator::new(credentials, news, summarizer, pool)
}
