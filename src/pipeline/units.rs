//! The analysis units wired into the claim graph.
//!
//! All units are rule-based and deterministic. Each one is a plain
//! [`NodeUnit`]: snapshot in, partial out, collaboration through the
//! append-reduced message list and the merge-by-key decision map.

use super::config::PipelineConfig;
use super::{fields, nodes};
use crate::decision::Decision;
use crate::message::Message;
use crate::node::{NodePartial, NodeUnit, ProcessingError};
use crate::state::StateSnapshot;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

fn require_str(snapshot: &StateSnapshot, field: &'static str) -> Result<String, ProcessingError> {
    match snapshot.get_str(field) {
        Some(s) if !s.is_empty() => Ok(s.to_owned()),
        _ => Err(ProcessingError::invalid_input(field, "missing or empty")),
    }
}

fn array_field(snapshot: &StateSnapshot, field: &str) -> Vec<Value> {
    snapshot
        .get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn messages_in(snapshot: &StateSnapshot) -> Result<Vec<Message>, ProcessingError> {
    snapshot
        .decode::<Vec<Message>>(fields::MESSAGES)
        .map_err(|e| ProcessingError::with_cause("message list is malformed", e))
        .map(Option::unwrap_or_default)
}

/// Attaches the standard collaboration records to a unit's partial.
fn with_records(
    partial: NodePartial,
    agent: &str,
    message: Option<Message>,
    decision: Decision,
) -> NodePartial {
    let mut partial = partial.with_update(fields::DECISIONS, json!({ agent: decision.to_value() }));
    if let Some(message) = message {
        partial.set(fields::MESSAGES, json!([message.to_value()]));
    }
    partial
}

/// Classifies the claim into a category by keyword votes.
pub struct TriageUnit {
    config: Arc<PipelineConfig>,
}

impl TriageUnit {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NodeUnit for TriageUnit {
    async fn process(&self, snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        let query = require_str(&snapshot, fields::QUERY)?.to_lowercase();

        let mut category = "general";
        let mut best = 0;
        for (name, keywords) in &self.config.category_keywords {
            let matches = keywords.iter().filter(|k| query.contains(k.as_str())).count();
            if matches > best {
                best = matches;
                category = name;
            }
        }
        debug!(category, matches = best, "claim categorized");

        let message = Message::new(
            nodes::TRIAGE,
            nodes::SUPERVISOR,
            "classification",
            json!({"category": category, "confidence": 0.9}),
            0.9,
        );
        let decision = Decision::new(
            nodes::TRIAGE,
            format!("classified as {category}"),
            format!("matched {best} category keywords"),
            0.9,
        );
        Ok(with_records(
            NodePartial::new()
                .with_update(fields::CATEGORY, json!(category))
                .with_update(fields::STAGE, json!("triaged")),
            nodes::TRIAGE,
            Some(message),
            decision,
        ))
    }
}

/// Scores the claim's source domain on a 0..100 credibility scale.
pub struct SourceScorerUnit {
    config: Arc<PipelineConfig>,
}

impl SourceScorerUnit {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }

    fn score_domain(&self, domain: &str) -> (i64, &'static str) {
        let domain = domain.to_lowercase();
        let hit = |list: &[String]| list.iter().any(|d| domain.contains(&d.to_lowercase()));
        if hit(&self.config.low_credibility_domains) {
            (15, "known low-credibility domain")
        } else if hit(&self.config.high_credibility_domains) {
            (85, "known high-credibility domain")
        } else if domain.contains(".gov") || domain.contains(".edu") {
            (75, "government or educational domain")
        } else if domain.contains("blog") || domain.contains("wordpress") {
            (30, "blog or personal website")
        } else {
            (50, "unknown domain, neutral credibility")
        }
    }
}

fn extract_domain(url: &str) -> &str {
    let trimmed = url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    trimmed.split('/').next().unwrap_or(trimmed)
}

#[async_trait]
impl NodeUnit for SourceScorerUnit {
    async fn process(&self, snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        let source_url = require_str(&snapshot, fields::SOURCE_URL)?;
        let domain = extract_domain(&source_url);
        let (score, reasoning) = self.score_domain(domain);
        let decisive = score < self.config.low_credibility_threshold
            || score > self.config.high_credibility_threshold;
        let confidence = if decisive { 0.8 } else { 0.6 };
        debug!(domain, score, "source credibility assessed");

        let message = Message::new(
            nodes::SOURCE_SCORER,
            nodes::SUPERVISOR,
            "credibility_score",
            json!({"score": score, "reasoning": reasoning, "domain": domain}),
            confidence,
        );
        let decision = Decision::new(
            nodes::SOURCE_SCORER,
            format!("credibility score: {score}"),
            reasoning,
            confidence,
        );
        Ok(with_records(
            NodePartial::new().with_update(fields::CREDIBILITY_SCORE, json!(score)),
            nodes::SOURCE_SCORER,
            Some(message),
            decision,
        ))
    }
}

/// Gathers category-appropriate evidence and fact-check verdicts.
#[derive(Default)]
pub struct EvidenceUnit;

fn canned_evidence(category: &str) -> (Vec<&'static str>, Value) {
    match category {
        "health" => (
            vec![
                "No peer-reviewed study supports this claim",
                "Major medical institutions deny this claim",
                "Fact-checker rates this as FALSE",
            ],
            json!([
                {"source": "WHO", "verdict": "False", "confidence": 0.95},
                {"source": "Snopes", "verdict": "False", "confidence": 0.90},
            ]),
        ),
        "finance" => (
            vec![
                "Market data contradicts this claim",
                "Financial regulator warns about this information",
            ],
            json!([{"source": "SEC", "verdict": "Misleading", "confidence": 0.85}]),
        ),
        "politics" => (
            vec![
                "Official statements contradict this claim",
                "Multiple fact-checkers rate this as false",
            ],
            json!([
                {"source": "PolitiFact", "verdict": "False", "confidence": 0.88},
                {"source": "FactCheck.org", "verdict": "False", "confidence": 0.85},
            ]),
        ),
        "science" => (
            vec![
                "No scientific evidence supports this claim",
                "Peer review contradicts this claim",
            ],
            json!([{"source": "Science Feedback", "verdict": "False", "confidence": 0.90}]),
        ),
        _ => (
            vec![
                "Official statement contradicts claim",
                "Fact-checker article rates claim false",
            ],
            json!([{"source": "Generic Fact-Checker", "verdict": "False", "confidence": 0.80}]),
        ),
    }
}

#[async_trait]
impl NodeUnit for EvidenceUnit {
    async fn process(&self, snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        require_str(&snapshot, fields::QUERY)?;
        let category = snapshot.get_str(fields::CATEGORY).unwrap_or("general");
        let (search_results, fact_checks) = canned_evidence(category);
        let fact_check_count = fact_checks.as_array().map(Vec::len).unwrap_or(0);
        debug!(
            category,
            evidence = search_results.len(),
            fact_checks = fact_check_count,
            "evidence gathered"
        );

        let message = Message::new(
            nodes::EVIDENCE,
            nodes::ANALYZER,
            "evidence",
            json!({
                "search_results": search_results,
                "fact_check_results": fact_checks,
                "category": category,
            }),
            0.85,
        );
        let decision = Decision::new(
            nodes::EVIDENCE,
            format!("gathered {} evidence items", search_results.len()),
            format!("found {fact_check_count} fact-check results"),
            0.85,
        );
        Ok(with_records(
            NodePartial::new()
                .with_update(fields::SEARCH_RESULTS, json!(search_results))
                .with_update(fields::FACT_CHECK_RESULTS, fact_checks),
            nodes::EVIDENCE,
            Some(message),
            decision,
        ))
    }
}

/// Detects emotional manipulation and overall sentiment.
pub struct SentimentUnit {
    config: Arc<PipelineConfig>,
}

const POSITIVE_WORDS: &[&str] = &["good", "great", "amazing", "cure", "discovered", "breakthrough"];
const NEGATIVE_WORDS: &[&str] = &["danger", "warning", "threat", "scam", "fake"];

impl SentimentUnit {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NodeUnit for SentimentUnit {
    async fn process(&self, snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        let query = require_str(&snapshot, fields::QUERY)?.to_lowercase();

        let manipulative = self
            .config
            .manipulative_phrases
            .iter()
            .filter(|phrase| query.contains(&phrase.to_lowercase()))
            .count();
        let positive = POSITIVE_WORDS.iter().filter(|w| query.contains(*w)).count();
        let negative = NEGATIVE_WORDS.iter().filter(|w| query.contains(*w)).count();

        let sentiment = if positive > negative {
            "positive"
        } else if negative > positive {
            "negative"
        } else {
            "neutral"
        };
        let manipulation_score = (manipulative as f64 * 0.3).min(1.0);
        let analysis = json!({
            "sentiment": sentiment,
            "manipulation_score": manipulation_score,
            "manipulative_phrases_found": manipulative,
            "is_emotional_appeal": manipulation_score > 0.5,
            "positive_words": positive,
            "negative_words": negative,
        });
        debug!(sentiment, manipulation_score, "sentiment analyzed");

        let message = Message::new(
            nodes::SENTIMENT,
            nodes::ANALYZER,
            "sentiment",
            analysis.clone(),
            0.75,
        );
        let decision = Decision::new(
            nodes::SENTIMENT,
            format!("sentiment: {sentiment}, manipulation: {manipulation_score:.2}"),
            format!("found {manipulative} manipulative phrases"),
            0.75,
        );
        Ok(with_records(
            NodePartial::new().with_update(fields::SENTIMENT_ANALYSIS, analysis),
            nodes::SENTIMENT,
            Some(message),
            decision,
        ))
    }
}

/// Cross-references fact-check verdicts and measures their consensus.
#[derive(Default)]
pub struct CrossReferenceUnit;

#[async_trait]
impl NodeUnit for CrossReferenceUnit {
    async fn process(&self, snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        let fact_checks = array_field(&snapshot, fields::FACT_CHECK_RESULTS);

        let cross_references: Vec<Value> = fact_checks
            .iter()
            .map(|result| {
                json!({
                    "source": result.get("source").cloned().unwrap_or(json!("Unknown")),
                    "verdict": result.get("verdict").cloned().unwrap_or(json!("Unknown")),
                    "confidence": result.get("confidence").cloned().unwrap_or(json!(0.0)),
                    "matches_other_sources": fact_checks.len() > 1,
                })
            })
            .collect();

        let mut verdicts: Vec<&str> = fact_checks
            .iter()
            .filter_map(|r| r.get("verdict").and_then(Value::as_str))
            .collect();
        verdicts.sort_unstable();
        verdicts.dedup();
        let consensus = !fact_checks.is_empty() && verdicts.len() == 1;
        let consensus_level = match fact_checks.len() {
            0 => "none",
            1 => "low",
            2 => "medium",
            _ => "high",
        };
        debug!(
            sources = cross_references.len(),
            consensus, consensus_level, "cross-reference complete"
        );

        let message = Message::new(
            nodes::CROSS_REFERENCE,
            nodes::ANALYZER,
            "cross_reference",
            json!({
                "cross_references": cross_references,
                "consensus": consensus,
                "consensus_level": consensus_level,
            }),
            0.8,
        );
        let decision = Decision::new(
            nodes::CROSS_REFERENCE,
            format!("found {} cross-references", cross_references.len()),
            format!("consensus: {consensus} ({consensus_level})"),
            0.8,
        );
        Ok(with_records(
            NodePartial::new().with_update(fields::CROSS_REFERENCES, json!(cross_references)),
            nodes::CROSS_REFERENCE,
            Some(message),
            decision,
        ))
    }
}

/// Detects logical fallacies and internal contradictions.
pub struct AnalyzerUnit {
    config: Arc<PipelineConfig>,
}

impl AnalyzerUnit {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NodeUnit for AnalyzerUnit {
    async fn process(&self, snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        let query = require_str(&snapshot, fields::QUERY)?.to_lowercase();
        let credibility = snapshot.get_i64(fields::CREDIBILITY_SCORE).unwrap_or(50);
        let fact_checks = array_field(&snapshot, fields::FACT_CHECK_RESULTS);

        let fallacies: Vec<&str> = self
            .config
            .fallacy_patterns
            .iter()
            .filter(|pattern| pattern.cues.iter().any(|cue| query.contains(cue.as_str())))
            .map(|pattern| pattern.name.as_str())
            .collect();

        let mut contradiction = false;
        let mut reasons: Vec<&str> = Vec::new();
        if credibility < self.config.low_credibility_threshold {
            contradiction = true;
            reasons.push("low credibility source contradicts high-credibility fact-checkers");
        }
        let false_verdicts = fact_checks
            .iter()
            .filter(|r| r.get("verdict").and_then(Value::as_str) == Some("False"))
            .count();
        if false_verdicts > 0 {
            contradiction = true;
            reasons.push("fact-checkers contradict the claim");
        }
        let reasoning = if reasons.is_empty() {
            "no major contradictions found".to_owned()
        } else {
            reasons.join(". ")
        };

        let inbox = messages_in(&snapshot)?;
        let evidence_notes = Message::select(&inbox, nodes::ANALYZER, "evidence").count();
        let sentiment_notes = Message::select(&inbox, nodes::ANALYZER, "sentiment").count();
        debug!(
            fallacies = fallacies.len(),
            contradiction, evidence_notes, sentiment_notes, "logical analysis complete"
        );

        let message = Message::new(
            nodes::ANALYZER,
            nodes::SUPERVISOR,
            "logical_analysis",
            json!({
                "fallacies": fallacies,
                "contradiction": contradiction,
                "reasoning": reasoning,
            }),
            0.85,
        );
        let decision = Decision::new(
            nodes::ANALYZER,
            format!(
                "found {} fallacies, contradiction: {contradiction}",
                fallacies.len()
            ),
            reasoning,
            0.85,
        );
        Ok(with_records(
            NodePartial::new()
                .with_update(fields::LOGICAL_FALLACIES, json!(fallacies))
                .with_update(fields::INTERNAL_CONTRADICTION, json!(contradiction))
                .with_update(fields::STAGE, json!("analyzed")),
            nodes::ANALYZER,
            Some(message),
            decision,
        ))
    }
}

/// Synthesizes the final verdict from the accumulated evidence.
pub struct SynthesizerUnit {
    config: Arc<PipelineConfig>,
}

impl SynthesizerUnit {
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NodeUnit for SynthesizerUnit {
    async fn process(&self, snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        let credibility = snapshot.get_i64(fields::CREDIBILITY_SCORE).unwrap_or(50);
        let contradiction = snapshot
            .get_bool(fields::INTERNAL_CONTRADICTION)
            .unwrap_or(false);
        let fact_checks = array_field(&snapshot, fields::FACT_CHECK_RESULTS);
        let search_results = array_field(&snapshot, fields::SEARCH_RESULTS);
        let fallacies = array_field(&snapshot, fields::LOGICAL_FALLACIES);
        let sentiment = snapshot
            .get(fields::SENTIMENT_ANALYSIS)
            .cloned()
            .unwrap_or(Value::Null);

        let has_false_verdict = fact_checks
            .iter()
            .any(|r| r.get("verdict").and_then(Value::as_str) == Some("False"));

        let mut reasoning_parts: Vec<String> = Vec::new();
        let mut evidence_summary: Vec<String> = Vec::new();

        let (verdict, confidence) = if credibility < self.config.low_credibility_threshold
            && contradiction
        {
            reasoning_parts.push(format!(
                "low credibility source (< {})",
                self.config.low_credibility_threshold
            ));
            reasoning_parts.push("internal contradictions detected".into());
            evidence_summary.push(format!("credibility score: {credibility}"));
            evidence_summary.push("multiple fact-checkers contradict claim".into());
            (
                "FALSE (High Confidence - Known Disinformation Source)",
                self.config.high_confidence,
            )
        } else if has_false_verdict {
            reasoning_parts.push("fact-checkers rate as false".into());
            reasoning_parts.push(format!(
                "found {} contradicting evidence items",
                search_results.len()
            ));
            for result in &fact_checks {
                let source = result.get("source").and_then(Value::as_str).unwrap_or("?");
                let verdict = result.get("verdict").and_then(Value::as_str).unwrap_or("?");
                evidence_summary.push(format!("{source}: {verdict}"));
            }
            (
                "FALSE (Medium Confidence - Fact-Checked)",
                self.config.medium_confidence,
            )
        } else if !search_results.is_empty() || !fallacies.is_empty() {
            reasoning_parts.push("contradictory evidence found".into());
            if !fallacies.is_empty() {
                reasoning_parts.push(format!("detected {} logical fallacies", fallacies.len()));
            }
            if sentiment
                .get("is_emotional_appeal")
                .and_then(Value::as_bool)
                .unwrap_or(false)
            {
                reasoning_parts.push("emotional manipulation detected".into());
            }
            for item in search_results.iter().take(3) {
                if let Some(text) = item.as_str() {
                    evidence_summary.push(text.to_owned());
                }
            }
            (
                "MISLEADING (Low Confidence - Contradictory Evidence)",
                self.config.low_confidence,
            )
        } else {
            reasoning_parts.push("insufficient evidence to make determination".into());
            evidence_summary.push("no fact-check results available".into());
            ("UNVERIFIABLE (Insufficient Evidence)", 0.4)
        };

        let (requires_review, review_reason) = if confidence < 0.6 && fact_checks.is_empty() {
            (true, "low confidence and no fact-check results")
        } else if fallacies.len() > 2 {
            (true, "multiple logical fallacies detected")
        } else {
            (false, "")
        };

        let reasoning = reasoning_parts.join(". ");
        let summary = if evidence_summary.is_empty() {
            "no evidence collected".to_owned()
        } else {
            evidence_summary.join("\n")
        };
        debug!(verdict, confidence, requires_review, "verdict synthesized");

        let decision = Decision::new(nodes::SYNTHESIZER, verdict, reasoning.clone(), confidence);
        Ok(with_records(
            NodePartial::new()
                .with_update(fields::VERDICT, json!(verdict))
                .with_update(fields::CONFIDENCE, json!(confidence))
                .with_update(fields::REASONING, json!(reasoning))
                .with_update(fields::EVIDENCE_SUMMARY, json!(summary))
                .with_update(fields::REQUIRES_REVIEW, json!(requires_review))
                .with_update(fields::REVIEW_REASON, json!(review_reason))
                .with_update(fields::STAGE, json!("completed")),
            nodes::SYNTHESIZER,
            None,
            decision,
        ))
    }
}

/// Reviews flagged runs and records a coordination summary.
#[derive(Default)]
pub struct SupervisorUnit;

#[async_trait]
impl NodeUnit for SupervisorUnit {
    async fn process(&self, snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        let reporting_agents = snapshot
            .get(fields::DECISIONS)
            .and_then(Value::as_object)
            .map(serde_json::Map::len)
            .unwrap_or(0);
        let inbox = messages_in(&snapshot)?;
        let received = inbox.iter().filter(|m| m.to == nodes::SUPERVISOR).count();
        let review_reason = snapshot
            .get_str(fields::REVIEW_REASON)
            .filter(|r| !r.is_empty())
            .unwrap_or("flagged for review")
            .to_owned();
        debug!(reporting_agents, received, "supervisor review");

        let decision = Decision::new(
            nodes::SUPERVISOR,
            "review complete",
            format!(
                "{reporting_agents} agents reported, {received} messages received; reason: {review_reason}"
            ),
            0.9,
        );
        Ok(with_records(
            NodePartial::new().with_update(fields::STAGE, json!("reviewed")),
            nodes::SUPERVISOR,
            None,
            decision,
        ))
    }
}
