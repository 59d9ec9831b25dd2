//! Fluent, fail-fast graph declaration.

use super::edges::{ConditionalEdge, Router};
use super::plan::{ExecutionPlan, NodeSlot};
use super::GraphError;
use crate::node::NodeUnit;
use crate::types::RouteTarget;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Declares a workflow graph, rejecting structural mistakes as they are made.
///
/// Every mutating method consumes and returns the builder, so declarations
/// chain with `?`:
///
/// ```
/// use veriflow::graph::GraphBuilder;
/// use veriflow::node::{NodePartial, NodeUnit, ProcessingError};
/// use veriflow::state::StateSnapshot;
///
/// struct Noop;
///
/// #[async_trait::async_trait]
/// impl NodeUnit for Noop {
///     async fn process(&self, _: StateSnapshot) -> Result<NodePartial, ProcessingError> {
///         Ok(NodePartial::new())
///     }
/// }
///
/// # fn main() -> Result<(), veriflow::graph::GraphError> {
/// let plan = GraphBuilder::new()
///     .add_node("a", Noop)?
///     .add_node("b", Noop)?
///     .add_edge("a", "b")?
///     .set_entry("a")?
///     .compile()?;
/// assert_eq!(plan.entry(), "a");
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    nodes: FxHashMap<String, NodeSlot>,
    node_order: Vec<String>,
    edges: Vec<(String, String)>,
    edge_set: FxHashSet<(String, String)>,
    conditionals: FxHashMap<String, ConditionalEdge>,
    entry: Option<String>,
}

impl std::fmt::Debug for GraphBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("nodes", &self.node_order)
            .field("edges", &self.edges)
            .field("conditionals", &self.conditionals.keys().collect::<Vec<_>>())
            .field("entry", &self.entry)
            .finish()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node under a unique name.
    pub fn add_node(
        mut self,
        name: impl Into<String>,
        unit: impl NodeUnit + 'static,
    ) -> Result<Self, GraphError> {
        let name = name.into();
        if self.nodes.contains_key(&name) {
            return Err(GraphError::DuplicateNode { name });
        }
        self.nodes.insert(
            name.clone(),
            NodeSlot {
                unit: Arc::new(unit),
                timeout: None,
            },
        );
        self.node_order.push(name);
        Ok(self)
    }

    /// Sets an execution timeout for a registered node.
    pub fn with_timeout(
        mut self,
        name: &str,
        timeout: Duration,
    ) -> Result<Self, GraphError> {
        let slot = self.nodes.get_mut(name).ok_or_else(|| GraphError::UnknownNode {
            name: name.to_owned(),
            referenced_by: "with_timeout".into(),
        })?;
        slot.timeout = Some(timeout);
        Ok(self)
    }

    /// Adds a static dependency edge between two registered nodes.
    ///
    /// Exact duplicates are dropped with a debug log rather than double
    /// counting the target's predecessor requirement.
    pub fn add_edge(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<Self, GraphError> {
        let from = from.into();
        let to = to.into();
        self.require_node(&from, "add_edge")?;
        self.require_node(&to, "add_edge")?;
        if self.edge_set.insert((from.clone(), to.clone())) {
            self.edges.push((from, to));
        } else {
            debug!(%from, %to, "ignoring duplicate static edge");
        }
        Ok(self)
    }

    /// Attaches a router and its label map to a source node.
    ///
    /// At most one conditional edge per source. Every `Node` target in the
    /// map must already be registered; `End` is always valid.
    pub fn add_conditional_edge<L, T>(
        mut self,
        from: impl Into<String>,
        router: Router,
        labels: L,
    ) -> Result<Self, GraphError>
    where
        L: IntoIterator<Item = (T, RouteTarget)>,
        T: Into<String>,
    {
        let from = from.into();
        self.require_node(&from, "add_conditional_edge")?;
        if self.conditionals.contains_key(&from) {
            return Err(GraphError::DuplicateConditionalEdge { from });
        }
        let mut targets = FxHashMap::default();
        for (label, target) in labels {
            if let RouteTarget::Node(name) = &target {
                self.require_node(name, &from)?;
            }
            targets.insert(label.into(), target);
        }
        self.conditionals
            .insert(from, ConditionalEdge::new(router, targets));
        Ok(self)
    }

    /// Designates the single entry node. Setting it twice is an error.
    pub fn set_entry(mut self, name: impl Into<String>) -> Result<Self, GraphError> {
        let name = name.into();
        self.require_node(&name, "set_entry")?;
        if let Some(current) = &self.entry {
            return Err(GraphError::EntryAlreadySet {
                current: current.clone(),
                attempted: name,
            });
        }
        self.entry = Some(name);
        Ok(self)
    }

    /// Validates the declaration and freezes it into an [`ExecutionPlan`].
    ///
    /// Checks performed here: an entry point exists, static edges are
    /// acyclic (the offending path is reported), and every node is reachable
    /// from the entry (unreachable nodes are only warned about since they
    /// can never run).
    pub fn compile(self) -> Result<ExecutionPlan, GraphError> {
        let entry = self.entry.clone().ok_or(GraphError::MissingEntry)?;

        let mut adjacency: FxHashMap<String, Vec<String>> = FxHashMap::default();
        let mut in_degree: FxHashMap<String, usize> = FxHashMap::default();
        for name in &self.node_order {
            adjacency.entry(name.clone()).or_default();
            in_degree.entry(name.clone()).or_insert(0);
        }
        for (from, to) in &self.edges {
            if let Some(successors) = adjacency.get_mut(from) {
                successors.push(to.clone());
            }
            *in_degree.entry(to.clone()).or_insert(0) += 1;
        }

        if let Some(cycle) = find_cycle(&self.node_order, &adjacency) {
            return Err(GraphError::CycleDetected { cycle });
        }

        for name in unreachable_nodes(&entry, &self.node_order, &adjacency, &self.conditionals) {
            warn!(node = %name, "node is unreachable from the entry point and will never run");
        }

        Ok(ExecutionPlan::new(
            self.nodes,
            adjacency,
            in_degree,
            self.conditionals,
            entry,
        ))
    }

    fn require_node(&self, name: &str, referenced_by: &str) -> Result<(), GraphError> {
        if self.nodes.contains_key(name) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode {
                name: name.to_owned(),
                referenced_by: referenced_by.to_owned(),
            })
        }
    }
}

/// Three-color DFS over the static edges. Returns the first cycle found as
/// the path from the revisited node back to itself.
fn find_cycle(
    order: &[String],
    adjacency: &FxHashMap<String, Vec<String>>,
) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    fn visit(
        node: &str,
        adjacency: &FxHashMap<String, Vec<String>>,
        colors: &mut FxHashMap<String, Color>,
        path: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        colors.insert(node.to_owned(), Color::Gray);
        path.push(node.to_owned());
        if let Some(successors) = adjacency.get(node) {
            for next in successors {
                match colors.get(next).copied().unwrap_or(Color::White) {
                    Color::Gray => {
                        let start = path.iter().position(|n| n == next).unwrap_or(0);
                        let mut cycle: Vec<String> = path[start..].to_vec();
                        cycle.push(next.clone());
                        return Some(cycle);
                    }
                    Color::White => {
                        if let Some(cycle) = visit(next, adjacency, colors, path) {
                            return Some(cycle);
                        }
                    }
                    Color::Black => {}
                }
            }
        }
        path.pop();
        colors.insert(node.to_owned(), Color::Black);
        None
    }

    let mut colors: FxHashMap<String, Color> = FxHashMap::default();
    let mut path = Vec::new();
    for node in order {
        if colors.get(node).copied().unwrap_or(Color::White) == Color::White {
            if let Some(cycle) = visit(node, adjacency, &mut colors, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

/// Breadth-first walk from the entry over static edges and conditional
/// targets; anything not visited can never be dispatched.
fn unreachable_nodes(
    entry: &str,
    order: &[String],
    adjacency: &FxHashMap<String, Vec<String>>,
    conditionals: &FxHashMap<String, ConditionalEdge>,
) -> Vec<String> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut frontier = vec![entry];
    seen.insert(entry);
    while let Some(node) = frontier.pop() {
        if let Some(successors) = adjacency.get(node) {
            for next in successors {
                if seen.insert(next) {
                    frontier.push(next);
                }
            }
        }
        if let Some(edge) = conditionals.get(node) {
            for target in edge.targets() {
                if let Some(next) = target.as_node() {
                    if seen.insert(next) {
                        frontier.push(next);
                    }
                }
            }
        }
    }
    order
        .iter()
        .filter(|name| !seen.contains(name.as_str()))
        .cloned()
        .collect()
}
