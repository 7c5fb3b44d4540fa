/*!
common/src/lib.rs

Shared configuration types and DB helper functions for Vibe Check.

This file provides:
- Config data structures (deserialized from TOML, every section defaulted)
- An async loader merging a default and an override config file
- Credential resolution from the process environment
- A helper to initialize the SQLite connection pool
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Database configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the sqlite database file (e.g. "data/news.db")
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/news.db".to_string(),
        }
    }
}

/// HTTP server section, merged into Rocket's figment at launch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
    /// Directory holding `index.html` and other static assets
    pub static_dir: Option<String>,
}

/// News search API section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub api_url: String,
    /// Name of the environment variable holding the news API key
    pub api_key_env: String,
    /// Number of articles requested per lookup (deployments use 5 or 10)
    pub page_size: u32,
    pub user_agent: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://newsapi.org/v2/everything".to_string(),
            api_key_env: "NEWS_API_KEY".to_string(),
            page_size: 5,
            user_agent: "VibeCheck/0.1.0".to_string(),
        }
    }
}

/// Which wire protocol the LLM endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmAdapter {
    Gemini,
    OpenAi,
}

/// Prompt variant sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// Three-point bullet summary
    Bullets,
    /// Narrative assessment followed by 3-5 bullet points
    Assessment,
}

/// LLM section: endpoint, credentials and the ordered fallback model list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub adapter: LlmAdapter,
    pub api_url: String,
    pub api_key_env: String,
    /// Tried in order; the first model producing a non-empty response wins
    pub models: Vec<String>,
    pub prompt_style: PromptStyle,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            adapter: LlmAdapter::Gemini,
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            models: vec![
                "gemini-2.0-flash".to_string(),
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-flash-8b".to_string(),
            ],
            prompt_style: PromptStyle::Bullets,
            max_tokens: None,
            temperature: None,
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub news: NewsConfig,
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). With neither,
    /// the built-in defaults are returned.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// A secret read from a named environment variable. The value is never printed.
#[derive(Clone)]
pub struct Credential {
    pub env_var: String,
    value: Option<String>,
}

impl Credential {
    pub fn new(env_var: impl Into<String>, value: Option<String>) -> Self {
        Self {
            env_var: env_var.into(),
            value: value.filter(|v| !v.is_empty()),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("env_var", &self.env_var)
            .field("present", &self.is_present())
            .finish()
    }
}

/// The two API keys the pipeline needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub news: Credential,
    pub llm: Credential,
}

impl Credentials {
    /// Read both keys from the process environment using the variable names in `config`.
    pub fn from_env(config: &Config) -> Self {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve both keys through an arbitrary lookup (the environment in production).
    pub fn resolve<F>(config: &Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            news: Credential::new(&config.news.api_key_env, lookup(&config.news.api_key_env)),
            llm: Credential::new(&config.llm.api_key_env, lookup(&config.llm.api_key_env)),
        }
    }

    /// Names of the environment variables whose value is absent, news key first.
    pub fn missing(&self) -> Vec<&str> {
        [&self.news, &self.llm]
            .into_iter()
            .filter(|c| !c.is_present())
            .map(|c| c.env_var.as_str())
            .collect()
    }
}

/// Initialize an SQLite connection pool.
///
/// Creates the parent directory if necessary and returns a configured `SqlitePool`
/// (WAL journal, at most 5 connections). Schema creation is left to the caller.
pub async fn init_db_pool(path: &str) -> Result<SqlitePool> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create DB parent directory: {}", parent.display())
            })?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to sqlite database at path: {}", path))?;

    tracing::debug!(db_path = %path, "sqlite pool ready");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: Config = toml::from_str("").expect("parse config");
        assert_eq!(cfg.database.path, "data/news.db");
        assert_eq!(cfg.news.page_size, 5);
        assert_eq!(cfg.news.api_key_env, "NEWS_API_KEY");
        assert_eq!(cfg.llm.adapter, LlmAdapter::Gemini);
        assert_eq!(cfg.llm.api_key_env, "GEMINI_API_KEY");
        assert_eq!(cfg.llm.models[0], "gemini-2.0-flash");
        assert_eq!(cfg.llm.prompt_style, PromptStyle::Bullets);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let toml = r#"
            [news]
            page_size = 10

            [llm]
            adapter = "openai"
            models = ["gpt-4o", "gpt-4o-mini"]
            prompt_style = "assessment"
        "#;

        let cfg: Config = toml::from_str(toml).expect("parse config");
        assert_eq!(cfg.news.page_size, 10);
        assert_eq!(cfg.news.api_url, "https://newsapi.org/v2/everything");
        assert_eq!(cfg.llm.adapter, LlmAdapter::OpenAi);
        assert_eq!(cfg.llm.models, vec!["gpt-4o", "gpt-4o-mini"]);
        assert_eq!(cfg.llm.prompt_style, PromptStyle::Assessment);
        assert_eq!(cfg.llm.api_key_env, "GEMINI_API_KEY");
    }

    #[tokio::test]
    async fn override_file_wins_over_default_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("config.default.toml");
        let override_path = dir.path().join("config.toml");
        std::fs::write(&default_path, "[database]\npath = \"a.db\"\n[news]\npage_size = 10\n").unwrap();
        std::fs::write(&override_path, "[database]\npath = \"b.db\"\n").unwrap();

        let cfg = Config::load_with_defaults(Some(&default_path), Some(&override_path))
            .await
            .expect("load config");
        assert_eq!(cfg.database.path, "b.db");
        assert_eq!(cfg.news.page_size, 10);
    }

    #[test]
    fn credentials_report_missing_names_in_order() {
        let cfg = Config::default();
        let env: HashMap<&str, &str> = HashMap::from([("GEMINI_API_KEY", "g-key")]);
        let creds = Credentials::resolve(&cfg, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(creds.missing(), vec!["NEWS_API_KEY"]);
        assert_eq!(creds.llm.value(), Some("g-key"));

        let none = Credentials::resolve(&cfg, |_| None);
        assert_eq!(none.missing(), vec!["NEWS_API_KEY", "GEMINI_API_KEY"]);
    }

    #[test]
    fn empty_credential_counts_as_absent_and_is_not_printed() {
        let cred = Credential::new("NEWS_API_KEY", Some(String::new()));
        assert!(!cred.is_present());
        assert!(Credential::new("NEWS_API_KEY", Some(" ".to_string())).is_present());

        let secret = Credential::new("NEWS_API_KEY", Some("super-secret".to_string()));
        assert!(!format!("{:?}", secret).contains("super-secret"));
    }

    #[tokio::test]
    async fn db_pool_creates_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("nested").join("news.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let pool = init_db_pool(&db_path_str).await.expect("init pool");
        let conn = pool.acquire().await.expect("acquire conn");
        drop(conn);
        assert!(db_path.exists());
    }
}
