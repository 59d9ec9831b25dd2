//! Dispatch-on-ready execution over a compiled plan.

use super::context::{RunContext, RunStatus};
use super::{RunError, RunErrorKind};
use crate::graph::ExecutionPlan;
use crate::node::{NodePartial, ProcessingError};
use crate::reducers::ReducerRegistry;
use crate::state::{StateSnapshot, WorkflowState};
use crate::types::RouteTarget;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

type NodeOutcome = (String, Result<NodePartial, ProcessingError>);

/// Executes runs against a shared plan.
///
/// The engine itself is cheap to clone conceptually: it holds an `Arc`ed
/// plan and a reducer table, and every call to [`Engine::run`] gets fresh
/// per-run bookkeeping, so one engine can serve concurrent runs.
pub struct Engine {
    plan: Arc<ExecutionPlan>,
    reducers: ReducerRegistry,
}

impl Engine {
    pub fn new(plan: Arc<ExecutionPlan>, reducers: ReducerRegistry) -> Self {
        Self { plan, reducers }
    }

    /// Engine over a plan whose fields all merge by replacement.
    pub fn with_default_reducers(plan: Arc<ExecutionPlan>) -> Self {
        Self::new(plan, ReducerRegistry::default())
    }

    pub fn plan(&self) -> &Arc<ExecutionPlan> {
        &self.plan
    }

    /// Runs the workflow to completion.
    ///
    /// Ready nodes are dispatched as concurrent tasks the moment their last
    /// static predecessor's merge lands (the entry immediately, router
    /// targets straight after their source's merge). The loop below is the
    /// only writer of `state`; each completed task is folded in before the
    /// next scheduling decision, so every dispatched snapshot reflects all
    /// merges that happened before it.
    ///
    /// The first failing completion ends the run: remaining tasks are
    /// aborted, their partials discarded, and the returned [`RunError`]
    /// names the node and carries the last consistent state.
    pub async fn run(&self, initial: WorkflowState) -> Result<WorkflowState, RunError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("workflow_run", %run_id, entry = self.plan.entry());
        self.run_inner(initial).instrument(span).await
    }

    async fn run_inner(&self, initial: WorkflowState) -> Result<WorkflowState, RunError> {
        let mut state = initial;
        let mut ctx = RunContext::new(&self.plan);
        let mut tasks: JoinSet<NodeOutcome> = JoinSet::new();
        debug!(status = %RunStatus::Initialized, nodes = self.plan.node_count());

        let entry = self.plan.entry().to_owned();
        ctx.mark_scheduled(&entry);
        self.dispatch(&mut tasks, &mut ctx, &entry, state.snapshot());
        info!(status = %RunStatus::Running);

        while let Some(joined) = tasks.join_next_with_id().await {
            let (node, outcome) = match joined {
                Ok((id, pair)) => {
                    ctx.untrack(id);
                    pair
                }
                Err(join_err) => {
                    let node = ctx
                        .untrack(join_err.id())
                        .unwrap_or_else(|| "<unknown>".to_owned());
                    return self.fail(
                        &mut tasks,
                        node,
                        RunErrorKind::Panicked {
                            detail: join_err.to_string(),
                        },
                        state,
                    );
                }
            };

            let partial = match outcome {
                Ok(partial) => partial,
                Err(processing) => {
                    return self.fail(&mut tasks, node, processing.into(), state);
                }
            };

            debug!(node = %node, updates = partial.len(), "merging completion");
            if let Err(merge) = self.reducers.apply_partial(&mut state, partial) {
                return self.fail(&mut tasks, node, merge.into(), state);
            }

            let mut newly_ready: Vec<String> = Vec::new();
            for successor in self.plan.static_successors(&node) {
                if ctx.note_predecessor_done(successor) {
                    newly_ready.push(successor.clone());
                }
            }

            if let Some(edge) = self.plan.conditional(&node) {
                let snapshot = state.snapshot();
                let label = edge.route(&snapshot);
                match edge.resolve(&label) {
                    Some(RouteTarget::Node(target)) => {
                        debug!(node = %node, %label, %target, "router selected target");
                        newly_ready.push(target.clone());
                    }
                    Some(RouteTarget::End) => {
                        debug!(node = %node, %label, "router closed this branch");
                    }
                    None => {
                        return self.fail(
                            &mut tasks,
                            node,
                            RunErrorKind::UndeclaredRouterLabel {
                                label,
                                declared: edge.labels(),
                            },
                            state,
                        );
                    }
                }
            }

            if !newly_ready.is_empty() {
                let snapshot = state.snapshot();
                for target in newly_ready {
                    if ctx.mark_scheduled(&target) {
                        self.dispatch(&mut tasks, &mut ctx, &target, snapshot.clone());
                    } else {
                        warn!(node = %target, "dropping duplicate dispatch attempt");
                    }
                }
            }
        }

        info!(status = %RunStatus::Completed, fields = state.len());
        Ok(state)
    }

    fn dispatch(
        &self,
        tasks: &mut JoinSet<NodeOutcome>,
        ctx: &mut RunContext,
        name: &str,
        snapshot: StateSnapshot,
    ) {
        let Some(slot) = self.plan.slot(name) else {
            // Compile-time validation makes this unreachable for any plan
            // produced by GraphBuilder.
            warn!(node = %name, "skipping dispatch of unregistered node");
            return;
        };
        debug!(node = %name, timeout = ?slot.timeout, "dispatching");
        let unit = slot.unit.clone();
        let timeout = slot.timeout;
        let node = name.to_owned();
        let handle = tasks.spawn(async move {
            let result = match timeout {
                Some(limit) => match tokio::time::timeout(limit, unit.process(snapshot)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProcessingError::Timeout {
                        timeout_ms: limit.as_millis() as u64,
                    }),
                },
                None => unit.process(snapshot).await,
            };
            (node, result)
        });
        ctx.track(handle.id(), name.to_owned());
    }

    /// Stops the run at its first failure, aborting in-flight siblings.
    /// Their partials never reach the state.
    fn fail(
        &self,
        tasks: &mut JoinSet<NodeOutcome>,
        node: String,
        kind: RunErrorKind,
        state: WorkflowState,
    ) -> Result<WorkflowState, RunError> {
        let in_flight = tasks.len();
        tasks.abort_all();
        error!(status = %RunStatus::Failed, node = %node, aborted_siblings = in_flight, "run failed");
        Err(RunError::new(node, kind, state))
    }
}
