mod support;

use common::{Config, PromptStyle};
use vibecheck::error::AppError;
use vibecheck::llm::summarizer::{Analysis, Summarizer};

use support::ScriptedProvider;

fn config_with_models(models: &[&str]) -> Config {
    let mut config = Config::default();
    config.llm.models = models.iter().map(|m| m.to_string()).collect();
    config
}

#[tokio::test]
async fn first_successful_model_wins_and_later_models_are_skipped() {
    let provider = ScriptedProvider::new(vec![
        Err("quota exceeded"),
        Err("model not found"),
        Ok("Summary: third\nSentiment: Negative"),
        Ok("Summary: fourth\nSentiment: Positive"),
    ]);
    let config = config_with_models(&["m1", "m2", "m3", "m4"]);
    let summarizer = Summarizer::new(provider.clone(), &config.llm);

    let analysis = summarizer.summarize("rust", "Title: T\nDescription: D").await.unwrap();

    assert_eq!(
        analysis,
        Analysis { summary: "third".into(), sentiment: "Negative".into() }
    );
    assert_eq!(provider.calls(), vec!["m1", "m2", "m3"]);
}

#[tokio::test]
async fn empty_response_falls_through_to_next_model() {
    let provider = ScriptedProvider::new(vec![Ok("   \n"), Ok("plain text answer")]);
    let config = config_with_models(&["m1", "m2"]);
    let summarizer = Summarizer::new(provider.clone(), &config.llm);

    let analysis = summarizer.summarize("rust", "ctx").await.unwrap();

    assert_eq!(analysis.summary, "plain text answer");
    assert_eq!(analysis.sentiment, "Neutral");
    assert_eq!(provider.calls(), vec!["m1", "m2"]);
}

#[tokio::test]
async fn exhausted_list_reports_last_error() {
    let provider = ScriptedProvider::new(vec![Err("first failure"), Err("second failure")]);
    let config = config_with_models(&["m1", "m2"]);
    let summarizer = Summarizer::new(provider.clone(), &config.llm);

    let err = summarizer.summarize("rust", "ctx").await.unwrap_err();

    match &err {
        AppError::Summarization { last_error } => assert_eq!(last_error, "second failure"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "All summarization models failed: second failure");
    assert_eq!(provider.calls().len(), 2);
}

#[tokio::test]
async fn each_model_is_attempted_once() {
    let provider = ScriptedProvider::new(vec![Err("a"), Err("b"), Err("c")]);
    let mut config = config_with_models(&["m1", "m2", "m3"]);
    config.llm.prompt_style = PromptStyle::Assessment;
    let summarizer = Summarizer::new(provider.clone(), &config.llm);

    assert!(summarizer.summarize("rust", "ctx").await.is_err());
    assert_eq!(provider.calls(), vec!["m1", "m2", "m3"]);
}
