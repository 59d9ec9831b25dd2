//! Field-to-policy table applied at every merge point.

use super::builtins::Replace;
use super::{Reducer, StateMergeError};
use crate::node::NodePartial;
use crate::state::WorkflowState;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Explicit mapping from state field to merge policy.
///
/// Fields without an entry fall back to [`Replace`]. The registry is built
/// alongside the graph and injected into the engine; there is no process
/// global, so two engines can run with different tables.
#[derive(Clone)]
pub struct ReducerRegistry {
    table: FxHashMap<String, Arc<dyn Reducer>>,
    fallback: Arc<dyn Reducer>,
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        Self {
            table: FxHashMap::default(),
            fallback: Arc::new(Replace),
        }
    }
}

impl ReducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent registration of a field's merge policy.
    pub fn with_reducer(mut self, field: impl Into<String>, reducer: Arc<dyn Reducer>) -> Self {
        self.table.insert(field.into(), reducer);
        self
    }

    pub fn register(&mut self, field: impl Into<String>, reducer: Arc<dyn Reducer>) {
        self.table.insert(field.into(), reducer);
    }

    /// Policy that will be used for a field.
    pub fn reducer_for(&self, field: &str) -> &Arc<dyn Reducer> {
        self.table.get(field).unwrap_or(&self.fallback)
    }

    /// Folds a completed node's partial into the state.
    ///
    /// Fields are applied in sorted order so merge failures are attributed
    /// deterministically. On error the state keeps every field merged before
    /// the failing one; the engine treats the whole run as failed anyway.
    pub fn apply_partial(
        &self,
        state: &mut WorkflowState,
        partial: NodePartial,
    ) -> Result<(), StateMergeError> {
        let mut updates: Vec<_> = partial.into_updates().into_iter().collect();
        updates.sort_by(|(a, _), (b, _)| a.cmp(b));
        for (field, update) in updates {
            let current = state.take(&field);
            let merged = self.reducer_for(&field).apply(&field, current, update)?;
            state.insert(field, merged);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ReducerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<_> = self
            .table
            .iter()
            .map(|(field, reducer)| (field.as_str(), reducer.name()))
            .collect();
        entries.sort_unstable();
        f.debug_struct("ReducerRegistry")
            .field("table", &entries)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}
