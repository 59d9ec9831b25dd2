//! The concurrent run loop and its failure surface.
//!
//! [`Engine`] owns a compiled [`ExecutionPlan`](crate::graph::ExecutionPlan)
//! and an injected [`ReducerRegistry`](crate::reducers::ReducerRegistry),
//! and executes runs against it. The engine task is the only writer of the
//! run's [`WorkflowState`](crate::state::WorkflowState); node tasks run
//! concurrently and report back partials, so merge application is the single
//! synchronization point of the whole model.

mod context;
mod runner;

pub use context::RunStatus;
pub use runner::Engine;

use crate::node::ProcessingError;
use crate::reducers::StateMergeError;
use crate::state::WorkflowState;
use miette::Diagnostic;
use thiserror::Error;

/// Why a run failed.
#[derive(Debug, Error, Diagnostic)]
pub enum RunErrorKind {
    /// The node's `process` returned an error (or timed out).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Processing(#[from] ProcessingError),

    /// A reducer refused the node's contribution.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Merge(#[from] StateMergeError),

    /// A router produced a label missing from its declared map.
    #[error("router returned undeclared label `{label}` (declared: {})", declared.join(", "))]
    #[diagnostic(
        code(veriflow::engine::undeclared_router_label),
        help("every label a router can return must appear in the conditional edge's map")
    )]
    UndeclaredRouterLabel {
        label: String,
        declared: Vec<String>,
    },

    /// The node task panicked or was torn down by the runtime.
    #[error("node task aborted: {detail}")]
    #[diagnostic(code(veriflow::engine::task_aborted))]
    Panicked { detail: String },
}

/// Terminal failure of a run.
///
/// Carries the name of the node whose completion (or routing) failed and the
/// last consistent state: every merge applied before the failure is present,
/// nothing from abandoned siblings is.
#[derive(Debug, Error, Diagnostic)]
#[error("run failed at node `{node}`")]
#[diagnostic(code(veriflow::engine::run_failed))]
pub struct RunError {
    pub node: String,
    #[source]
    #[diagnostic_source]
    pub kind: RunErrorKind,
    pub state: WorkflowState,
}

impl RunError {
    pub(crate) fn new(
        node: impl Into<String>,
        kind: impl Into<RunErrorKind>,
        state: WorkflowState,
    ) -> Self {
        Self {
            node: node.into(),
            kind: kind.into(),
            state,
        }
    }
}
