//! Conditional routing: routers and their declared label maps.

use crate::state::StateSnapshot;
use crate::types::RouteTarget;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Pure routing function evaluated against the post-merge snapshot of its
/// source node's completion.
///
/// A router returns a label, never a node name; the label is resolved
/// through the [`ConditionalEdge`]'s declared map. Returning a label outside
/// the map fails the run, so routers and maps are kept honest together.
///
/// ```
/// use std::sync::Arc;
/// use veriflow::graph::Router;
///
/// let bypass: Router = Arc::new(|snapshot| {
///     let score = snapshot.get_i64("credibility_score").unwrap_or(50);
///     if score < 20 { "fast_verdict".into() } else { "full_analysis".into() }
/// });
/// ```
pub type Router = Arc<dyn Fn(&StateSnapshot) -> String + Send + Sync + 'static>;

/// A router together with its label map, attached to one source node.
#[derive(Clone)]
pub struct ConditionalEdge {
    router: Router,
    targets: FxHashMap<String, RouteTarget>,
}

impl ConditionalEdge {
    pub(crate) fn new(router: Router, targets: FxHashMap<String, RouteTarget>) -> Self {
        Self { router, targets }
    }

    /// Evaluates the router against a snapshot, returning the chosen label.
    pub fn route(&self, snapshot: &StateSnapshot) -> String {
        (self.router)(snapshot)
    }

    /// Resolves a label through the declared map.
    pub fn resolve(&self, label: &str) -> Option<&RouteTarget> {
        self.targets.get(label)
    }

    /// Declared labels, sorted for stable diagnostics.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<_> = self.targets.keys().cloned().collect();
        labels.sort_unstable();
        labels
    }

    /// Declared targets, for validation and reachability walks.
    pub(crate) fn targets(&self) -> impl Iterator<Item = &RouteTarget> {
        self.targets.values()
    }
}

impl std::fmt::Debug for ConditionalEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalEdge")
            .field("labels", &self.labels())
            .finish_non_exhaustive()
    }
}
