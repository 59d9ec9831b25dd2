//! Shared workflow state and immutable snapshots.
//!
//! A run owns exactly one [`WorkflowState`]: a keyed map of field name to
//! JSON value. The engine is the only writer; units observe the state
//! through [`StateSnapshot`]s captured at dispatch time and contribute
//! updates via [`NodePartial`](crate::node::NodePartial)s, which the
//! reducer registry folds back in. Snapshots share their backing map
//! through an `Arc`, so handing the same snapshot to several sibling tasks
//! is cheap.

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Mutable, engine-owned state for a single run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowState {
    fields: FxHashMap<String, Value>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fluent builder for seeding an initial state.
    pub fn builder() -> WorkflowStateBuilder {
        WorkflowStateBuilder::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }

    /// Deserializes a field into a concrete type. `Ok(None)` when absent.
    pub fn decode<T: DeserializeOwned>(
        &self,
        field: &str,
    ) -> Result<Option<T>, serde_json::Error> {
        self.fields
            .get(field)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(field.into(), value)
    }

    /// Removes and returns a field, for read-modify-write merges.
    pub(crate) fn take(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Captures an immutable view of the current state.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            fields: Arc::new(self.fields.clone()),
        }
    }
}

impl FromIterator<(String, Value)> for WorkflowState {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Fluent constructor for initial states.
///
/// ```
/// use serde_json::json;
/// use veriflow::state::WorkflowState;
///
/// let state = WorkflowState::builder()
///     .with_field("query", json!("claim text"))
///     .with_field("credibility_score", json!(50))
///     .build();
/// assert_eq!(state.get_i64("credibility_score"), Some(50));
/// ```
#[derive(Debug, Default)]
pub struct WorkflowStateBuilder {
    fields: FxHashMap<String, Value>,
}

impl WorkflowStateBuilder {
    pub fn with_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn build(self) -> WorkflowState {
        WorkflowState {
            fields: self.fields,
        }
    }
}

/// Read-only view of the state as of a node's dispatch.
///
/// Cloning shares the backing map; mutation of the live state after capture
/// is never visible through an existing snapshot.
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    fields: Arc<FxHashMap<String, Value>>,
}

impl StateSnapshot {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.fields.get(field).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }

    /// Deserializes a field into a concrete type. `Ok(None)` when absent.
    pub fn decode<T: DeserializeOwned>(
        &self,
        field: &str,
    ) -> Result<Option<T>, serde_json::Error> {
        self.fields
            .get(field)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
