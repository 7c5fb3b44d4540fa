// Summarizer: prompt composition, model fallback and output parsing
use tracing::{info, warn};

use common::{LlmConfig, PromptStyle};

use super::{LlmProvider, LlmRequest};
use crate::error::{AppError, AppResult};

const SENTIMENT_MARKER: &str = "Sentiment:";
const SUMMARY_LABEL: &str = "Summary:";
const DEFAULT_SENTIMENT: &str = "Neutral";

/// Summary text plus the "vibe check" sentiment, both as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub summary: String,
    pub sentiment: String,
}

/// Build the single prompt sent to every model in the fallback list.
pub fn build_prompt(style: PromptStyle, topic: &str, context: &str) -> String {
    match style {
        PromptStyle::Bullets => format!(
            "Based on the following news snippets about '{topic}', provide:\n\
             1. A 3-point executive summary (bullet points).\n\
             2. A 'Vibe Check' sentiment (one of: Positive, Neutral, Negative).\n\n\
             News Snippets:\n{context}\n\n\
             Respond in format:\nSummary: [Point 1]\n[Point 2]\n[Point 3]\nSentiment: [Vibe Check]"
        ),
        PromptStyle::Assessment => format!(
            "You are a news analyst. Based on the following news snippets about '{topic}', provide:\n\
             1. A short narrative assessment of what is happening and why it matters.\n\
             2. 3 to 5 bullet points with the key facts.\n\
             3. A 'Vibe Check' sentiment (one of: Positive, Neutral, Negative).\n\n\
             News Snippets:\n{context}\n\n\
             Respond in format:\nSummary: [Assessment]\n- [Key point]\n- [Key point]\n- [Key point]\nSentiment: [Vibe Check]"
        ),
    }
}

/// Split raw model text on the first `Sentiment:` marker.
///
/// Text before the marker (trimmed, leading `Summary:` label removed) is the
/// summary; text after it (trimmed) is the sentiment, kept verbatim even if it
/// contains further markers. Without a marker the whole text is the summary and
/// the sentiment is `Neutral`.
pub fn parse_model_output(text: &str) -> Analysis {
    match text.split_once(SENTIMENT_MARKER) {
        Some((before, after)) => Analysis {
            summary: strip_summary_label(before),
            sentiment: after.trim().to_string(),
        },
        None => Analysis {
            summary: strip_summary_label(text),
            sentiment: DEFAULT_SENTIMENT.to_string(),
        },
    }
}

fn strip_summary_label(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix(SUMMARY_LABEL)
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Sends the prompt to each configured model in order until one answers.
pub struct Summarizer {
    provider: std::sync::Arc<dyn LlmProvider>,
    models: Vec<String>,
    style: PromptStyle,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
}

impl Summarizer {
    pub fn new(provider: std::sync::Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            provider,
            models: config.models.clone(),
            style: config.prompt_style,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Summarize `context` for `topic`. Models are tried one at a time with no
    /// delay; the first non-empty response is parsed and returned and the
    /// remaining models are never contacted.
    pub async fn summarize(&self, topic: &str, context: &str) -> AppResult<Analysis> {
        let prompt = build_prompt(self.style, topic, context);
        let mut last_error: Option<String> = None;

        for model in &self.models {
            let request = LlmRequest {
                model: model.clone(),
                prompt: prompt.clone(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
            };

            match self.provider.generate(request).await {
                Ok(response) if !response.content.trim().is_empty() => {
                    info!(
                        model = %model,
                        prompt_tokens = response.usage.prompt_tokens,
                        completion_tokens = response.usage.completion_tokens,
                        total_tokens = response.usage.total_tokens,
                        "summarization succeeded"
                    );
                    return Ok(parse_model_output(&response.content));
                }
                Ok(_) => {
                    warn!(model = %model, "model returned an empty response, trying next");
                    last_error = Some(format!("model {} returned an empty response", model));
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "model attempt failed, trying next");
                    last_error = Some(format!("{:#}", e));
                }
            }
        }

        Err(AppError::Summarization {
            last_error: last_error.unwrap_or_else(|| "no models configured".to_string()),
        })
    }
}
