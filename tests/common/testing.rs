//! Configurable node units shared across integration tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use veriflow::node::{NodePartial, NodeUnit, ProcessingError};
use veriflow::state::StateSnapshot;

/// Returns a fixed partial on every invocation.
pub struct EmitUnit {
    partial: NodePartial,
}

impl EmitUnit {
    pub fn new() -> Self {
        Self {
            partial: NodePartial::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.partial.set(field, value);
        self
    }
}

impl Default for EmitUnit {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeUnit for EmitUnit {
    async fn process(&self, _snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        Ok(self.partial.clone())
    }
}

/// Counts invocations, then behaves like [`EmitUnit`].
pub struct CountingUnit {
    calls: Arc<AtomicUsize>,
    partial: NodePartial,
}

impl CountingUnit {
    pub fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            partial: NodePartial::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.partial.set(field, value);
        self
    }
}

#[async_trait]
impl NodeUnit for CountingUnit {
    async fn process(&self, _snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.partial.clone())
    }
}

/// Always fails with the given message.
pub struct FailingUnit {
    message: String,
}

impl FailingUnit {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl NodeUnit for FailingUnit {
    async fn process(&self, _snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        Err(ProcessingError::message(self.message.clone()))
    }
}

/// Sleeps before emitting, for timeout and ordering tests.
pub struct DelayedUnit {
    delay: Duration,
    partial: NodePartial,
}

impl DelayedUnit {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            partial: NodePartial::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.partial.set(field, value);
        self
    }
}

#[async_trait]
impl NodeUnit for DelayedUnit {
    async fn process(&self, _snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.partial.clone())
    }
}

/// Writes the length of an array field it observes in its snapshot.
///
/// Used by join tests: the count it records proves which merges were
/// visible when the join node was dispatched.
pub struct ArrayLenUnit {
    source: String,
    target: String,
}

impl ArrayLenUnit {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[async_trait]
impl NodeUnit for ArrayLenUnit {
    async fn process(&self, snapshot: StateSnapshot) -> Result<NodePartial, ProcessingError> {
        let len = snapshot
            .get(&self.source)
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        Ok(NodePartial::new().with_update(self.target.clone(), json!(len)))
    }
}
