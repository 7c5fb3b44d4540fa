use std::io::Cursor;

use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use thiserror::Error;

/// Every failure the `/get-news` and `/history` handlers can surface.
///
/// Each variant maps to one HTTP status; the `Display` text is what the
/// caller sees in the `{"error": ...}` body.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Missing configuration: {}", .missing.join(", "))]
    Configuration { missing: Vec<String> },

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    NotFound(String),

    #[error("All summarization models failed: {last_error}")]
    Summarization { last_error: String },

    #[error("Database error: {0}")]
    Store(String),
}

impl AppError {
    pub fn missing_config<S: AsRef<str>>(names: &[S]) -> Self {
        Self::Configuration {
            missing: names.iter().map(|n| n.as_ref().to_string()).collect(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    pub fn store(err: anyhow::Error) -> Self {
        Self::Store(format!("{:#}", err))
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) => Status::BadRequest,
            Self::NotFound(_) => Status::NotFound,
            Self::Configuration { .. }
            | Self::Upstream(_)
            | Self::Summarization { .. }
            | Self::Store(_) => Status::InternalServerError,
        }
    }
}

/// JSON body `{"error": message}` shared by handlers and catchers.
pub fn error_body(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        let message = self.to_string();
        if status.code >= 500 {
            tracing::error!(status = status.code, error = %message, "request failed");
        } else {
            tracing::warn!(status = status.code, error = %message, "request rejected");
        }

        let body = error_body(&message);
        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_each_missing_key() {
        let err = AppError::missing_config(&["NEWS_API_KEY", "GEMINI_API_KEY"]);
        assert_eq!(err.to_string(), "Missing configuration: NEWS_API_KEY, GEMINI_API_KEY");
        assert_eq!(err.status(), Status::InternalServerError);
    }

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(AppError::Validation("Topic is required".into()).status(), Status::BadRequest);
        assert_eq!(AppError::NotFound("none".into()).status(), Status::NotFound);
        assert_eq!(AppError::upstream("Failed to fetch news").status(), Status::InternalServerError);
        assert_eq!(
            AppError::Summarization { last_error: "boom".into() }.status(),
            Status::InternalServerError
        );
        assert_eq!(
            AppError::store(anyhow::anyhow!("disk full")).status(),
            Status::InternalServerError
        );
    }

    #[test]
    fn store_error_keeps_context_chain() {
        let err = anyhow::anyhow!("disk full").context("failed to insert search record");
        assert_eq!(
            AppError::store(err).to_string(),
            "Database error: failed to insert search record: disk full"
        );
    }

    #[test]
    fn error_body_is_single_key_json() {
        let body: serde_json::Value = serde_json::from_str(&error_body("nope")).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "nope" }));
    }
}
