use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::SecondsFormat;
use rocket::fs::{FileServer, NamedFile};
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::serde::json::Json;
use rocket::{catch, catchers, get, post, routes, Build, Either, Rocket, State};
use serde::{Deserialize, Serialize};

use common::ServerConfig;

use crate::error::{error_body, AppError, AppResult};
use crate::pipeline::{NewsAnalysis, Orchestrator};
use crate::storage::{self, HISTORY_LIMIT};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, static_dir: Option<PathBuf>) -> Self {
        Self {
            orchestrator,
            static_dir,
        }
    }
}

/// Request body for `/get-news`
#[derive(Debug, Deserialize)]
pub struct GetNewsRequest {
    #[serde(default)]
    pub topic: Option<String>,
}

/// One `/history` entry
#[derive(Debug, Serialize)]
struct HistoryItem {
    topic: String,
    summary: String,
    sentiment: String,
    timestamp: String,
}

impl From<storage::SearchRecord> for HistoryItem {
    fn from(r: storage::SearchRecord) -> Self {
        Self {
            topic: r.topic,
            summary: r.summary,
            sentiment: r.sentiment,
            timestamp: r.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Serve the static front page when one is installed, otherwise a liveness line.
#[get("/")]
async fn index(state: &State<AppState>) -> Either<NamedFile, &'static str> {
    if let Some(dir) = &state.static_dir {
        if let Ok(file) = NamedFile::open(dir.join("index.html")).await {
            return Either::Left(file);
        }
    }
    Either::Right("Vibe Check news service is running")
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

#[get("/history")]
async fn history(state: &State<AppState>) -> AppResult<Json<Vec<HistoryItem>>> {
    let records = storage::list_recent(state.orchestrator.db(), HISTORY_LIMIT)
        .await
        .map_err(AppError::store)?;

    Ok(Json(records.into_iter().map(HistoryItem::from).collect()))
}

/// A missing or unparsable body is treated as a missing topic.
#[post("/get-news", data = "<body>")]
async fn get_news(
    state: &State<AppState>,
    body: Option<Json<GetNewsRequest>>,
) -> AppResult<Json<NewsAnalysis>> {
    let topic = body.and_then(|b| b.into_inner().topic);
    let analysis = state.orchestrator.analyze(topic.as_deref()).await?;
    Ok(Json(analysis))
}

/// Every unhandled status (unknown route, bad method, panics) still gets a JSON body.
#[catch(default)]
fn json_catcher(status: Status, _req: &Request<'_>) -> (Status, (ContentType, String)) {
    let message = status.reason().unwrap_or("Unknown error");
    (status, (ContentType::JSON, error_body(message)))
}

/// Assemble the Rocket instance with routes, catchers and state; does not launch it.
pub fn build_rocket(state: AppState, figment: rocket::figment::Figment) -> Rocket<Build> {
    let static_dir = state.static_dir.clone();

    let mut rocket = rocket::custom(figment)
        .manage(state)
        .mount("/", routes![index, health, history, get_news])
        .register("/", catchers![json_catcher]);

    if let Some(dir) = static_dir.filter(|d| d.is_dir()) {
        tracing::info!(dir = %dir.display(), "serving static assets");
        rocket = rocket.mount("/static", FileServer::from(dir));
    }

    rocket
}

/// Build and launch the Rocket server, applying `[server] bind` / `port` from config.
///
/// Blocks until Rocket shuts down and returns an error if Rocket fails to start.
pub async fn launch_rocket(orchestrator: Arc<Orchestrator>, server: &ServerConfig) -> Result<()> {
    let mut fig = rocket::Config::figment();
    if let Some(bind) = &server.bind {
        fig = fig.merge(("address", bind.clone()));
    }
    if let Some(port) = server.port {
        fig = fig.merge(("port", port));
    }

    let state = AppState::new(orchestrator, server.static_dir.as_ref().map(PathBuf::from));

    tracing::info!("Starting Rocket HTTP server");
    build_rocket(state, fig)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
