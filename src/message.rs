//! Inter-unit messages carried through the shared state.
//!
//! Units collaborate indirectly: a producer appends a [`Message`] to an
//! append-reduced state field, and a downstream unit filters the accumulated
//! list by recipient and kind. The engine never interprets message content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A directed note from one unit to another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Name of the producing unit.
    pub from: String,
    /// Name of the intended recipient.
    pub to: String,
    /// Message kind, used for filtering (e.g. `"evidence"`, `"sentiment"`).
    pub kind: String,
    /// Arbitrary JSON payload.
    pub content: Value,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Producer confidence, clamped to `[0.0, 1.0]`.
    pub confidence: f64,
}

impl Message {
    /// Creates a message stamped with the current time.
    ///
    /// Confidence is clamped into `[0.0, 1.0]`; NaN collapses to `0.0`.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        kind: impl Into<String>,
        content: Value,
        confidence: f64,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: kind.into(),
            content,
            timestamp: Utc::now(),
            confidence: clamp_confidence(confidence),
        }
    }

    /// True when this message is addressed to `recipient` with kind `kind`.
    pub fn is_for(&self, recipient: &str, kind: &str) -> bool {
        self.to == recipient && self.kind == kind
    }

    /// Filters a decoded message list down to those for `recipient` / `kind`.
    pub fn select<'a>(
        messages: &'a [Message],
        recipient: &'a str,
        kind: &'a str,
    ) -> impl Iterator<Item = &'a Message> {
        messages.iter().filter(move |m| m.is_for(recipient, kind))
    }

    /// Serializes into a JSON value for inclusion in a node partial.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

pub(crate) fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
