use anyhow::Context;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use common::NewsConfig;

use crate::error::{AppError, AppResult};

/// One article reduced to the two fields the prompt needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSnippet {
    pub title: String,
    pub description: String,
}

impl ArticleSnippet {
    pub fn render(&self) -> String {
        format!("Title: {}\nDescription: {}", self.title, self.description)
    }
}

/// Join snippets into the prompt context block, separated by a blank line.
pub fn compose_context(snippets: &[ArticleSnippet]) -> String {
    snippets
        .iter()
        .map(ArticleSnippet::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Client for a NewsAPI-compatible `everything` search endpoint.
#[derive(Clone)]
pub struct NewsClient {
    api_url: String,
    page_size: u32,
    client: Client,
}

impl NewsClient {
    pub fn new(config: &NewsConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            api_url: config.api_url.clone(),
            page_size: config.page_size,
            client,
        })
    }

    /// Fetch the most relevant articles for `topic`, one page only.
    pub async fn fetch_articles(&self, topic: &str, api_key: &str) -> AppResult<Vec<ArticleSnippet>> {
        let page_size = self.page_size.to_string();
        let url = Url::parse_with_params(
            &self.api_url,
            &[
                ("q", topic),
                ("pageSize", page_size.as_str()),
                ("sortBy", "relevancy"),
            ],
        )
        .map_err(|e| AppError::upstream(format!("Failed to fetch news: invalid api_url: {}", e)))?;

        debug!(url = %url, "querying news API");

        let response = self
            .client
            .get(url)
            .header("X-Api-Key", api_key)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("Failed to fetch news: {}", e)))?;

        let http_status = response.status();
        let body: NewsResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("Failed to fetch news: {}", e)))?;

        if body.status != "ok" {
            warn!(
                topic,
                http_status = http_status.as_u16(),
                code = body.code.as_deref().unwrap_or(""),
                message = body.message.as_deref().unwrap_or(""),
                "news API reported an error"
            );
            return Err(AppError::upstream("Failed to fetch news"));
        }

        if body.articles.is_empty() {
            info!(topic, "news API returned no articles");
            return Err(AppError::NotFound("No news found for this topic".to_string()));
        }

        let snippets: Vec<ArticleSnippet> = body
            .articles
            .into_iter()
            .map(|a| ArticleSnippet {
                title: a.title.unwrap_or_default(),
                description: a.description.unwrap_or_default(),
            })
            .collect();

        info!(topic, articles = snippets.len(), "fetched news articles");
        Ok(snippets)
    }
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}
