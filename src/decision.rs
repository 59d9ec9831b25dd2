//! Audit records of per-unit decisions.

use crate::message::clamp_confidence;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single unit's recorded decision, keyed by agent name in the shared
/// state's merge-by-key decisions field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Name of the deciding unit.
    pub agent: String,
    /// Short statement of what was decided.
    pub decision: String,
    /// Why the decision was made.
    pub reasoning: String,
    /// Confidence, clamped to `[0.0, 1.0]`.
    pub confidence: f64,
    /// Decision time.
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    pub fn new(
        agent: impl Into<String>,
        decision: impl Into<String>,
        reasoning: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            agent: agent.into(),
            decision: decision.into(),
            reasoning: reasoning.into(),
            confidence: clamp_confidence(confidence),
            timestamp: Utc::now(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
