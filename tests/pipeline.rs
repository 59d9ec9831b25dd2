//! End-to-end runs of the claim-analysis workflow.

use serde_json::Value;
use std::sync::Arc;
use veriflow::engine::Engine;
use veriflow::message::Message;
use veriflow::pipeline::{self, fields, nodes, PipelineConfig};

fn claim_engine() -> Engine {
    let config = Arc::new(PipelineConfig::default());
    let plan = pipeline::claim_graph(config).expect("claim graph compiles");
    Engine::new(Arc::new(plan), pipeline::reducer_table())
}

#[tokio::test]
async fn disinformation_claim_takes_the_fast_path_to_a_confident_false() {
    let engine = claim_engine();
    let initial = pipeline::initial_state(
        "shocking secret cure for cancer they don't want you to know",
        "https://fake-news.com/miracle",
    );
    let state = engine.run(initial).await.unwrap();

    assert_eq!(state.get_str(fields::CATEGORY), Some("health"));
    assert_eq!(state.get_i64(fields::CREDIBILITY_SCORE), Some(15));
    assert_eq!(state.get_bool(fields::INTERNAL_CONTRADICTION), Some(true));

    let verdict = state.get_str(fields::VERDICT).unwrap();
    assert!(verdict.starts_with("FALSE (High Confidence"), "got {verdict}");
    assert_eq!(state.get_f64(fields::CONFIDENCE), Some(0.95));
    assert_eq!(state.get_str(fields::STAGE), Some("completed"));

    // Every analysis unit logged exactly one decision; no review happened.
    let decisions = state.get(fields::DECISIONS).unwrap().as_object().unwrap();
    assert_eq!(decisions.len(), 7);
    assert!(!decisions.contains_key(nodes::SUPERVISOR));

    // Six units send one message each; the append reducer kept them all.
    let messages: Vec<Message> = state.decode(fields::MESSAGES).unwrap().unwrap();
    assert_eq!(messages.len(), 6);
    let for_analyzer = Message::select(&messages, nodes::ANALYZER, "evidence").count();
    assert_eq!(for_analyzer, 1);
}

#[tokio::test]
async fn neutral_claim_runs_the_full_analysis_path() {
    let engine = claim_engine();
    let initial = pipeline::initial_state(
        "the sky appears blue because of rayleigh scattering",
        "https://example.com/sky",
    );
    let state = engine.run(initial).await.unwrap();

    assert_eq!(state.get_str(fields::CATEGORY), Some("general"));
    assert_eq!(state.get_i64(fields::CREDIBILITY_SCORE), Some(50));

    let verdict = state.get_str(fields::VERDICT).unwrap();
    assert!(verdict.starts_with("FALSE (Medium Confidence"), "got {verdict}");
    assert_eq!(state.get_f64(fields::CONFIDENCE), Some(0.80));
    assert_eq!(state.get_str(fields::STAGE), Some("completed"));

    let decisions = state.get(fields::DECISIONS).unwrap().as_object().unwrap();
    assert!(!decisions.contains_key(nodes::SUPERVISOR));
}

#[tokio::test]
async fn fallacy_heavy_claim_is_routed_through_the_supervisor() {
    let engine = claim_engine();
    let initial = pipeline::initial_state(
        "either you fear the truth or this corrupt liar will certainly win",
        "https://example.com/opinion",
    );
    let state = engine.run(initial).await.unwrap();

    let fallacies = state
        .get(fields::LOGICAL_FALLACIES)
        .and_then(Value::as_array)
        .unwrap();
    assert!(fallacies.len() > 2, "expected >2 fallacies, got {fallacies:?}");
    assert_eq!(state.get_bool(fields::REQUIRES_REVIEW), Some(true));

    // The review router detoured through the supervisor, which left its
    // own decision and advanced the stage marker.
    assert_eq!(state.get_str(fields::STAGE), Some("reviewed"));
    let decisions = state.get(fields::DECISIONS).unwrap().as_object().unwrap();
    assert_eq!(decisions.len(), 8);
    assert!(decisions.contains_key(nodes::SUPERVISOR));
}

#[tokio::test]
async fn missing_query_fails_at_the_entry_node() {
    let engine = claim_engine();
    let initial = pipeline::initial_state("", "https://example.com/empty");
    let err = engine.run(initial).await.unwrap_err();
    assert_eq!(err.node, nodes::TRIAGE);
    // The seeded fields survive in the returned state.
    assert_eq!(err.state.get_str(fields::STAGE), Some("received"));
}

#[tokio::test]
async fn one_engine_serves_consecutive_runs() {
    let engine = claim_engine();
    for url in ["https://reuters.com/a", "https://fake-news.com/b"] {
        let state = engine
            .run(pipeline::initial_state("crypto market crash imminent", url))
            .await
            .unwrap();
        assert!(state.contains(fields::VERDICT));
    }
}
