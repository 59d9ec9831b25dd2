//! Per-run bookkeeping: lifecycle, pending counters, dispatch guards.

use crate::graph::ExecutionPlan;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use tokio::task::Id;

/// Lifecycle of a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// State seeded, nothing dispatched yet.
    Initialized,
    /// At least one node dispatched, none failed.
    Running,
    /// No tasks in flight and nothing ready; final state returned.
    Completed,
    /// A completion failed; the run stopped at its first error.
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::Initialized => "initialized",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Mutable scheduling state owned by the engine loop for one run.
pub(crate) struct RunContext {
    /// Remaining static predecessors per node, seeded from the plan's
    /// in-degrees. Conditional-only nodes start at zero and are never
    /// decremented; only routers can dispatch them.
    pending: FxHashMap<String, usize>,
    /// Exactly-once dispatch guard.
    scheduled: FxHashSet<String>,
    /// Task-id to node-name map for attributing join failures.
    running: FxHashMap<Id, String>,
}

impl RunContext {
    pub(crate) fn new(plan: &ExecutionPlan) -> Self {
        Self {
            pending: plan.pending_counters(),
            scheduled: FxHashSet::default(),
            running: FxHashMap::default(),
        }
    }

    /// Records one merged predecessor of `node`; true when the node's last
    /// static dependency just landed.
    pub(crate) fn note_predecessor_done(&mut self, node: &str) -> bool {
        match self.pending.get_mut(node) {
            Some(count) if *count > 0 => {
                *count -= 1;
                *count == 0
            }
            _ => false,
        }
    }

    /// Claims the right to dispatch `node`. False means it was already
    /// dispatched this run.
    pub(crate) fn mark_scheduled(&mut self, node: &str) -> bool {
        self.scheduled.insert(node.to_owned())
    }

    pub(crate) fn track(&mut self, id: Id, node: String) {
        self.running.insert(id, node);
    }

    pub(crate) fn untrack(&mut self, id: Id) -> Option<String> {
        self.running.remove(&id)
    }
}
