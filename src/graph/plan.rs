//! The compiled, immutable execution plan.

use super::edges::ConditionalEdge;
use crate::node::NodeUnit;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;

/// A registered unit plus its execution policy.
pub(crate) struct NodeSlot {
    pub(crate) unit: Arc<dyn NodeUnit>,
    pub(crate) timeout: Option<Duration>,
}

/// Validated graph ready for execution.
///
/// A plan is immutable and intended to be wrapped in an `Arc`: many engines
/// or concurrent runs can share one compiled graph. Per-run bookkeeping
/// (pending counters, scheduled sets) lives in the engine, never here.
pub struct ExecutionPlan {
    nodes: FxHashMap<String, NodeSlot>,
    adjacency: FxHashMap<String, Vec<String>>,
    in_degree: FxHashMap<String, usize>,
    conditionals: FxHashMap<String, ConditionalEdge>,
    entry: String,
}

impl ExecutionPlan {
    pub(crate) fn new(
        nodes: FxHashMap<String, NodeSlot>,
        adjacency: FxHashMap<String, Vec<String>>,
        in_degree: FxHashMap<String, usize>,
        conditionals: FxHashMap<String, ConditionalEdge>,
        entry: String,
    ) -> Self {
        Self {
            nodes,
            adjacency,
            in_degree,
            conditionals,
            entry,
        }
    }

    /// Name of the node every run starts with.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Node names in sorted order, for stable iteration in diagnostics.
    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of static predecessors a node waits for before dispatch.
    /// Conditional-only nodes have a static in-degree of zero and are
    /// dispatched exclusively by routers.
    pub fn static_in_degree(&self, name: &str) -> usize {
        self.in_degree.get(name).copied().unwrap_or(0)
    }

    pub fn static_successors(&self, name: &str) -> &[String] {
        self.adjacency
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn conditional(&self, name: &str) -> Option<&ConditionalEdge> {
        self.conditionals.get(name)
    }

    pub(crate) fn slot(&self, name: &str) -> Option<&NodeSlot> {
        self.nodes.get(name)
    }

    /// In-degree table snapshot used to seed a run's pending counters.
    pub(crate) fn pending_counters(&self) -> FxHashMap<String, usize> {
        self.in_degree.clone()
    }
}

impl std::fmt::Debug for ExecutionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionPlan")
            .field("entry", &self.entry)
            .field("nodes", &self.node_names())
            .field("conditional_sources", &{
                let mut sources: Vec<_> =
                    self.conditionals.keys().map(String::as_str).collect();
                sources.sort_unstable();
                sources
            })
            .finish()
    }
}
