//! The built-in merge policies.

use super::{Reducer, StateMergeError};
use serde_json::Value;

/// Default policy: the update overwrites whatever is there.
#[derive(Clone, Copy, Debug, Default)]
pub struct Replace;

impl Reducer for Replace {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn apply(
        &self,
        _field: &str,
        _current: Option<Value>,
        update: Value,
    ) -> Result<Value, StateMergeError> {
        Ok(update)
    }
}

/// Ordered-collection policy: contributions accumulate.
///
/// The current value must be an array (an absent field counts as empty).
/// An array update extends the collection; a scalar update is pushed as a
/// single element.
#[derive(Clone, Copy, Debug, Default)]
pub struct Append;

impl Reducer for Append {
    fn name(&self) -> &'static str {
        "append"
    }

    fn apply(
        &self,
        field: &str,
        current: Option<Value>,
        update: Value,
    ) -> Result<Value, StateMergeError> {
        let mut items = match &current {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(other) => {
                return Err(StateMergeError::new(
                    self.name(),
                    field,
                    "current value is not a collection",
                    Some(other),
                    &update,
                ));
            }
        };
        match update {
            Value::Array(new_items) => items.extend(new_items),
            scalar => items.push(scalar),
        }
        Ok(Value::Array(items))
    }
}

/// Keyed-map policy: shallow union, update entries win per key.
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeByKey;

impl Reducer for MergeByKey {
    fn name(&self) -> &'static str {
        "merge_by_key"
    }

    fn apply(
        &self,
        field: &str,
        current: Option<Value>,
        update: Value,
    ) -> Result<Value, StateMergeError> {
        let mut entries = match &current {
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(Value::Object(entries)) => entries.clone(),
            Some(other) => {
                return Err(StateMergeError::new(
                    self.name(),
                    field,
                    "current value is not a keyed map",
                    Some(other),
                    &update,
                ));
            }
        };
        match update {
            Value::Object(new_entries) => {
                for (key, value) in new_entries {
                    entries.insert(key, value);
                }
            }
            other => {
                return Err(StateMergeError::new(
                    self.name(),
                    field,
                    "update is not a keyed map",
                    current.as_ref(),
                    &other,
                ));
            }
        }
        Ok(Value::Object(entries))
    }
}

/// Sticky-scalar policy: keep the current value unless the update carries
/// something. JSON `null` and the empty string count as "nothing".
#[derive(Clone, Copy, Debug, Default)]
pub struct LastNonEmpty;

impl Reducer for LastNonEmpty {
    fn name(&self) -> &'static str {
        "last_non_empty"
    }

    fn apply(
        &self,
        _field: &str,
        current: Option<Value>,
        update: Value,
    ) -> Result<Value, StateMergeError> {
        let empty = match &update {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        };
        if empty {
            Ok(current.unwrap_or(Value::Null))
        } else {
            Ok(update)
        }
    }
}
