/*
vibecheck - single-binary main.rs
This binary loads configuration, prepares the history database and starts the Rocket HTTP server.
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use common::{init_db_pool, Config, Credentials};
use vibecheck::llm::{create_llm_provider, summarizer::Summarizer};
use vibecheck::news::NewsClient;
use vibecheck::pipeline::Orchestrator;
use vibecheck::server::launch_rocket;
use vibecheck::storage;

#[derive(Parser, Debug)]
#[command(name = "vibecheck", about = "News summarization and sentiment service")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // API keys usually live in .env next to the binary
    match dotenv::dotenv() {
        Ok(path) => info!(path = ?path, "loaded environment file"),
        Err(e) => info!(%e, "no .env file loaded"),
    }

    let default_path = PathBuf::from("config.default.toml");
    let override_path = match args.config {
        Some(p) if !p.exists() => {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p) => Some(p),
        None => Some(PathBuf::from("config.toml")).filter(|p| p.exists()),
    };

    let config = Config::load_with_defaults(
        Some(default_path.as_path()).filter(|p| p.exists()),
        override_path.as_deref(),
    )
    .await
    .map_err(|e| {
        error!(error = %e, "failed to load configuration");
        e
    })?;
    info!(default_file = ?default_path, override_file = ?override_path, "configuration loaded");

    // Missing keys are reported per request, not at startup
    let credentials = Credentials::from_env(&config);
    for name in credentials.missing() {
        warn!(env_var = name, "API key not set; /get-news will report a configuration error");
    }

    let db_path_abs = match tokio::fs::canonicalize(&config.database.path).await {
        Ok(p) => p.to_string_lossy().to_string(),
        Err(_) => config.database.path.clone(),
    };
    info!(db_path = %db_path_abs, "resolved DB path");

    let db_pool = init_db_pool(&db_path_abs).await.map_err(|e| {
        error!(error = %e, db_path = %db_path_abs, "failed to initialize database pool");
        e
    })?;
    storage::ensure_schema(&db_pool).await?;

    let news = NewsClient::new(&config.news).context("failed to build news client")?;
    let provider = create_llm_provider(&config.llm, &credentials);
    let summarizer = Summarizer::new(provider, &config.llm);
    info!(
        adapter = ?config.llm.adapter,
        models = ?config.llm.models,
        page_size = config.news.page_size,
        "pipeline initialized"
    );

    let orchestrator = Arc::new(Orchestrator::new(credentials, news, summarizer, db_pool));

    info!("Launching Rocket HTTP server");
    if let Err(e) = launch_rocket(orchestrator, &config.server).await {
        error!(error = %e, "Rocket server failed");
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}
