//! The node processing contract.
//!
//! A [`NodeUnit`] is the unit of work the engine schedules. It receives an
//! immutable [`StateSnapshot`] and produces a [`NodePartial`]: a sparse set
//! of field updates. Units never mutate shared state, never block on other
//! units, and never talk to the scheduler. All coordination happens through
//! reducer-mediated merges.

use crate::state::StateSnapshot;
use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

/// Failure surfaced by a node's `process`.
///
/// The engine attributes the failing node's registration name when wrapping
/// this into a [`RunError`](crate::engine::RunError); units only describe
/// what went wrong.
#[derive(Debug, Error, Diagnostic)]
pub enum ProcessingError {
    /// The unit's own logic failed.
    #[error("{message}")]
    #[diagnostic(
        code(veriflow::node::processing_failed),
        help("inspect the node's inputs in the returned run state")
    )]
    Failed {
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A required input field was missing or malformed.
    #[error("invalid input field `{field}`: {reason}")]
    #[diagnostic(
        code(veriflow::node::invalid_input),
        help("check the initial state and upstream partials for this field")
    )]
    InvalidInput { field: String, reason: String },

    /// The node's configured timeout elapsed before `process` returned.
    #[error("node timed out after {timeout_ms} ms")]
    #[diagnostic(
        code(veriflow::node::timeout),
        help("raise the node's timeout or make its work cancellable sooner")
    )]
    Timeout { timeout_ms: u64 },
}

impl ProcessingError {
    /// A plain failure with no underlying cause.
    pub fn message(message: impl Into<String>) -> Self {
        ProcessingError::Failed {
            message: message.into(),
            cause: None,
        }
    }

    /// A failure wrapping an underlying error.
    pub fn with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ProcessingError::Failed {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ProcessingError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Sparse state update produced by one node execution.
///
/// A field absent from the partial means the node has no opinion about it;
/// a present field is handed to that field's reducer. Partials carry plain
/// JSON values so reducers stay agnostic of unit-level types.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodePartial {
    updates: FxHashMap<String, Value>,
}

impl NodePartial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent insert, for building partials in one expression.
    pub fn with_update(mut self, field: impl Into<String>, value: Value) -> Self {
        self.updates.insert(field.into(), value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.updates.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.updates.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.updates.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn into_updates(self) -> FxHashMap<String, Value> {
        self.updates
    }
}

impl FromIterator<(String, Value)> for NodePartial {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            updates: iter.into_iter().collect(),
        }
    }
}

/// Async processing unit scheduled by the engine.
///
/// Implementations must be pure with respect to the shared state: read the
/// snapshot, compute, return a partial. Side effects (I/O, logging) are
/// allowed but get no delivery guarantees on failed runs.
#[async_trait]
pub trait NodeUnit: Send + Sync {
    async fn process(&self, snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError>;
}
