//! The built-in claim-analysis workload.
//!
//! A complete workflow assembled from the engine's primitives: eight
//! rule-based analysis units, one shared [`PipelineConfig`], and two routers.
//! Topology:
//!
//! ```text
//! triage ──┬─> source_scorer ────────────┐
//!          ├─> evidence ──> cross_ref ───┼─> analyzer ──(bypass)──> synthesizer ──(review)──> supervisor | End
//!          └─> sentiment ────────────────┘
//! ```
//!
//! The analyzer joins three branches; the bypass router skips nothing
//! structurally (both labels lead to the synthesizer) but records the
//! fast-path decision for claims from known disinformation sources; the
//! review router ends the run or detours through the supervisor.

mod config;
mod units;

pub use config::{FallacyPattern, PipelineConfig};
pub use units::{
    AnalyzerUnit, CrossReferenceUnit, EvidenceUnit, SentimentUnit, SourceScorerUnit,
    SupervisorUnit, SynthesizerUnit, TriageUnit,
};

use crate::graph::{ExecutionPlan, GraphBuilder, GraphError, Router};
use crate::reducers::{Append, LastNonEmpty, MergeByKey, ReducerRegistry};
use crate::state::WorkflowState;
use crate::types::RouteTarget;
use serde_json::json;
use std::sync::Arc;

/// State field names shared by every unit and router.
pub mod fields {
    pub const QUERY: &str = "query";
    pub const SOURCE_URL: &str = "source_url";
    pub const CATEGORY: &str = "category";
    pub const CREDIBILITY_SCORE: &str = "credibility_score";
    pub const SEARCH_RESULTS: &str = "search_results";
    pub const FACT_CHECK_RESULTS: &str = "fact_check_results";
    pub const SENTIMENT_ANALYSIS: &str = "sentiment_analysis";
    pub const CROSS_REFERENCES: &str = "cross_references";
    pub const LOGICAL_FALLACIES: &str = "logical_fallacies";
    pub const INTERNAL_CONTRADICTION: &str = "internal_contradiction";
    pub const MESSAGES: &str = "messages";
    pub const DECISIONS: &str = "decisions";
    pub const STAGE: &str = "stage";
    pub const REQUIRES_REVIEW: &str = "requires_review";
    pub const REVIEW_REASON: &str = "review_reason";
    pub const VERDICT: &str = "verdict";
    pub const CONFIDENCE: &str = "confidence";
    pub const REASONING: &str = "reasoning";
    pub const EVIDENCE_SUMMARY: &str = "evidence_summary";
}

/// Node names used in the claim graph.
pub mod nodes {
    pub const TRIAGE: &str = "triage";
    pub const SOURCE_SCORER: &str = "source_scorer";
    pub const EVIDENCE: &str = "evidence_gatherer";
    pub const SENTIMENT: &str = "sentiment_analyzer";
    pub const CROSS_REFERENCE: &str = "cross_reference";
    pub const ANALYZER: &str = "logical_analyzer";
    pub const SYNTHESIZER: &str = "verdict_synthesizer";
    pub const SUPERVISOR: &str = "supervisor";
}

/// Router labels.
pub mod labels {
    pub const FAST_VERDICT: &str = "fast_verdict";
    pub const FULL_ANALYSIS: &str = "full_analysis";
    pub const REVIEW_NEEDED: &str = "review_needed";
    pub const FINAL: &str = "final";
}

/// Fast-path router after logical analysis: a claim from a known
/// disinformation source with internal contradictions does not need the
/// full synthesis weighting.
pub fn bypass_router(config: Arc<PipelineConfig>) -> Router {
    Arc::new(move |snapshot| {
        let score = snapshot.get_i64(fields::CREDIBILITY_SCORE).unwrap_or(50);
        let contradiction = snapshot
            .get_bool(fields::INTERNAL_CONTRADICTION)
            .unwrap_or(false);
        if score < config.low_credibility_threshold && contradiction {
            labels::FAST_VERDICT.to_owned()
        } else {
            labels::FULL_ANALYSIS.to_owned()
        }
    })
}

/// Post-verdict router: detour through the supervisor when the synthesizer
/// flagged the run or confidence is too low to publish unattended.
pub fn review_router() -> Router {
    Arc::new(|snapshot| {
        let flagged = snapshot.get_bool(fields::REQUIRES_REVIEW).unwrap_or(false);
        let confidence = snapshot.get_f64(fields::CONFIDENCE).unwrap_or(0.0);
        if flagged || confidence < 0.5 {
            labels::REVIEW_NEEDED.to_owned()
        } else {
            labels::FINAL.to_owned()
        }
    })
}

/// Reducer table for the claim-analysis state schema: messages accumulate,
/// decisions merge per agent, the stage marker keeps its latest non-empty
/// value, and everything else replaces.
pub fn reducer_table() -> ReducerRegistry {
    ReducerRegistry::new()
        .with_reducer(fields::MESSAGES, Arc::new(Append))
        .with_reducer(fields::DECISIONS, Arc::new(MergeByKey))
        .with_reducer(fields::STAGE, Arc::new(LastNonEmpty))
}

/// Builds and validates the claim-analysis graph.
pub fn claim_graph(config: Arc<PipelineConfig>) -> Result<ExecutionPlan, GraphError> {
    GraphBuilder::new()
        .add_node(nodes::TRIAGE, TriageUnit::new(config.clone()))?
        .add_node(nodes::SOURCE_SCORER, SourceScorerUnit::new(config.clone()))?
        .add_node(nodes::EVIDENCE, EvidenceUnit)?
        .add_node(nodes::SENTIMENT, SentimentUnit::new(config.clone()))?
        .add_node(nodes::CROSS_REFERENCE, CrossReferenceUnit)?
        .add_node(nodes::ANALYZER, AnalyzerUnit::new(config.clone()))?
        .add_node(nodes::SYNTHESIZER, SynthesizerUnit::new(config.clone()))?
        .add_node(nodes::SUPERVISOR, SupervisorUnit)?
        .set_entry(nodes::TRIAGE)?
        .add_edge(nodes::TRIAGE, nodes::SOURCE_SCORER)?
        .add_edge(nodes::TRIAGE, nodes::EVIDENCE)?
        .add_edge(nodes::TRIAGE, nodes::SENTIMENT)?
        .add_edge(nodes::EVIDENCE, nodes::CROSS_REFERENCE)?
        .add_edge(nodes::SOURCE_SCORER, nodes::ANALYZER)?
        .add_edge(nodes::SENTIMENT, nodes::ANALYZER)?
        .add_edge(nodes::CROSS_REFERENCE, nodes::ANALYZER)?
        .add_conditional_edge(
            nodes::ANALYZER,
            bypass_router(config.clone()),
            [
                (labels::FAST_VERDICT, RouteTarget::node(nodes::SYNTHESIZER)),
                (labels::FULL_ANALYSIS, RouteTarget::node(nodes::SYNTHESIZER)),
            ],
        )?
        .add_conditional_edge(
            nodes::SYNTHESIZER,
            review_router(),
            [
                (labels::REVIEW_NEEDED, RouteTarget::node(nodes::SUPERVISOR)),
                (labels::FINAL, RouteTarget::End),
            ],
        )?
        .compile()
}

/// Seeds the state for one claim-analysis run.
pub fn initial_state(query: impl Into<String>, source_url: impl Into<String>) -> WorkflowState {
    WorkflowState::builder()
        .with_field(fields::QUERY, json!(query.into()))
        .with_field(fields::SOURCE_URL, json!(source_url.into()))
        .with_field(fields::STAGE, json!("received"))
        .build()
}
