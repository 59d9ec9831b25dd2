//! Merge policies for folding node partials into the shared state.
//!
//! Every state field has exactly one merge policy. The engine applies a
//! completed node's partial one field at a time through the
//! [`ReducerRegistry`]; the reducer sees the field's current value (if any)
//! and the node's contribution and returns the merged value. Reducers are
//! pure, so concurrent siblings writing APPEND or MERGE-BY-KEY fields yield
//! the same membership regardless of completion order.

mod builtins;
mod registry;

pub use builtins::{Append, LastNonEmpty, MergeByKey, Replace};
pub use registry::ReducerRegistry;

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

/// A reducer's refusal to merge, attributed to the field and both operands.
#[derive(Debug, Error, Diagnostic)]
#[error("reducer `{reducer}` cannot merge field `{field}`: {reason} (current: {current}, update: {update})")]
#[diagnostic(
    code(veriflow::reducers::merge_failed),
    help("the field's declared merge policy does not accept these operand shapes")
)]
pub struct StateMergeError {
    pub field: String,
    pub reducer: &'static str,
    pub reason: String,
    /// Shape of the field's current value, e.g. `array[2]` or `absent`.
    pub current: String,
    /// Shape of the incoming contribution.
    pub update: String,
}

impl StateMergeError {
    pub(crate) fn new(
        reducer: &'static str,
        field: &str,
        reason: impl Into<String>,
        current: Option<&Value>,
        update: &Value,
    ) -> Self {
        Self {
            field: field.to_owned(),
            reducer,
            reason: reason.into(),
            current: describe(current),
            update: describe(Some(update)),
        }
    }
}

/// Short operand shape for diagnostics, avoiding echoing large payloads.
fn describe(value: Option<&Value>) -> String {
    match value {
        None => "absent".into(),
        Some(Value::Null) => "null".into(),
        Some(Value::Bool(_)) => "bool".into(),
        Some(Value::Number(_)) => "number".into(),
        Some(Value::String(_)) => "string".into(),
        Some(Value::Array(items)) => format!("array[{}]", items.len()),
        Some(Value::Object(entries)) => format!("object[{}]", entries.len()),
    }
}

/// A merge policy for one state field.
///
/// `current` is `None` when the field has never been written. The returned
/// value replaces the field wholesale; reducers that keep the current value
/// return it unchanged.
pub trait Reducer: Send + Sync {
    /// Stable policy name used in merge diagnostics.
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        field: &str,
        current: Option<Value>,
        update: Value,
    ) -> Result<Value, StateMergeError>;
}
