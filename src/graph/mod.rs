//! Graph definition, validation, and the compiled execution plan.
//!
//! A workflow graph is declared through [`GraphBuilder`], which rejects
//! structural mistakes at definition time, and compiled into an immutable
//! [`ExecutionPlan`] that the engine shares across runs.

mod builder;
mod edges;
mod plan;

pub use builder::GraphBuilder;
pub use edges::{ConditionalEdge, Router};
pub use plan::ExecutionPlan;

use miette::Diagnostic;
use thiserror::Error;

/// Definition-time graph error.
///
/// Everything here is raised while declaring or compiling a graph; a plan
/// that compiles cleanly cannot hit these at runtime.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node `{name}` is already registered")]
    #[diagnostic(
        code(veriflow::graph::duplicate_node),
        help("node names are unique per graph; pick a distinct name")
    )]
    DuplicateNode { name: String },

    #[error("unknown node `{name}` referenced by `{referenced_by}`")]
    #[diagnostic(
        code(veriflow::graph::unknown_node),
        help("register the node with add_node before wiring edges to it")
    )]
    UnknownNode {
        name: String,
        referenced_by: String,
    },

    #[error("node `{from}` already has a conditional edge")]
    #[diagnostic(
        code(veriflow::graph::duplicate_conditional_edge),
        help("each node routes through at most one router; add more labels to its map instead")
    )]
    DuplicateConditionalEdge { from: String },

    #[error("entry point is already set to `{current}` (attempted `{attempted}`)")]
    #[diagnostic(code(veriflow::graph::entry_already_set))]
    EntryAlreadySet { current: String, attempted: String },

    #[error("graph has no entry point")]
    #[diagnostic(
        code(veriflow::graph::missing_entry),
        help("call set_entry with the node that should start every run")
    )]
    MissingEntry,

    #[error("static edges form a cycle: {}", cycle.join(" -> "))]
    #[diagnostic(
        code(veriflow::graph::cycle),
        help("static dependencies must be acyclic; restructure the workflow so data flows one way")
    )]
    CycleDetected { cycle: Vec<String> },
}
