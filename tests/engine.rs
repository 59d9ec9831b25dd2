//! Engine scheduling semantics: dispatch-on-ready, joins, routing, failure.

mod common;

use common::testing::{ArrayLenUnit, CountingUnit, DelayedUnit, EmitUnit, FailingUnit};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use veriflow::engine::{Engine, RunErrorKind};
use veriflow::graph::{ExecutionPlan, GraphBuilder, Router};
use veriflow::node::ProcessingError;
use veriflow::reducers::{Append, ReducerRegistry};
use veriflow::state::WorkflowState;
use veriflow::types::RouteTarget;

fn score_router() -> Router {
    Arc::new(|snapshot| {
        let score = snapshot.get_i64("score").unwrap_or(100);
        let flagged = snapshot.get_bool("flagged").unwrap_or(false);
        if score < 20 && flagged {
            "fast".to_owned()
        } else {
            "full".to_owned()
        }
    })
}

fn routed_plan() -> ExecutionPlan {
    GraphBuilder::new()
        .add_node("probe", EmitUnit::new())
        .unwrap()
        .add_node("fast", EmitUnit::new().with("path", json!("fast")))
        .unwrap()
        .add_node("full", EmitUnit::new().with("path", json!("full")))
        .unwrap()
        .add_conditional_edge(
            "probe",
            score_router(),
            [
                ("fast", RouteTarget::node("fast")),
                ("full", RouteTarget::node("full")),
            ],
        )
        .unwrap()
        .set_entry("probe")
        .unwrap()
        .compile()
        .unwrap()
}

#[tokio::test]
async fn router_takes_fast_path_on_flagged_low_score() {
    let engine = Engine::with_default_reducers(Arc::new(routed_plan()));

    let fast_run = WorkflowState::builder()
        .with_field("score", json!(10))
        .with_field("flagged", json!(true))
        .build();
    let state = engine.run(fast_run).await.unwrap();
    assert_eq!(state.get_str("path"), Some("fast"));

    let full_run = WorkflowState::builder()
        .with_field("score", json!(50))
        .build();
    let state = engine.run(full_run).await.unwrap();
    assert_eq!(state.get_str("path"), Some("full"));
}

#[tokio::test]
async fn router_observes_the_source_nodes_own_merge() {
    let plan = GraphBuilder::new()
        .add_node(
            "probe",
            EmitUnit::new()
                .with("score", json!(5))
                .with("flagged", json!(true)),
        )
        .unwrap()
        .add_node("fast", EmitUnit::new().with("path", json!("fast")))
        .unwrap()
        .add_node("full", EmitUnit::new().with("path", json!("full")))
        .unwrap()
        .add_conditional_edge(
            "probe",
            score_router(),
            [
                ("fast", RouteTarget::node("fast")),
                ("full", RouteTarget::node("full")),
            ],
        )
        .unwrap()
        .set_entry("probe")
        .unwrap()
        .compile()
        .unwrap();

    let engine = Engine::with_default_reducers(Arc::new(plan));
    let state = engine.run(WorkflowState::new()).await.unwrap();
    assert_eq!(state.get_str("path"), Some("fast"));
}

#[tokio::test]
async fn join_sees_both_sibling_contributions() {
    let plan = GraphBuilder::new()
        .add_node("seed", EmitUnit::new())
        .unwrap()
        .add_node("a", EmitUnit::new().with("msgs", json!(["from-a"])))
        .unwrap()
        .add_node(
            "b",
            DelayedUnit::new(Duration::from_millis(20)).with("msgs", json!(["from-b"])),
        )
        .unwrap()
        .add_node("join", ArrayLenUnit::new("msgs", "observed"))
        .unwrap()
        .add_edge("seed", "a")
        .unwrap()
        .add_edge("seed", "b")
        .unwrap()
        .add_edge("a", "join")
        .unwrap()
        .add_edge("b", "join")
        .unwrap()
        .set_entry("seed")
        .unwrap()
        .compile()
        .unwrap();

    let reducers = ReducerRegistry::new().with_reducer("msgs", Arc::new(Append));
    let engine = Engine::new(Arc::new(plan), reducers);
    let state = engine.run(WorkflowState::new()).await.unwrap();

    assert_eq!(state.get_i64("observed"), Some(2));
    let mut msgs: Vec<String> = state.decode("msgs").unwrap().unwrap();
    msgs.sort();
    assert_eq!(msgs, ["from-a", "from-b"]);
}

#[tokio::test]
async fn join_fires_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let plan = GraphBuilder::new()
        .add_node("seed", EmitUnit::new())
        .unwrap()
        .add_node("a", EmitUnit::new())
        .unwrap()
        .add_node("b", EmitUnit::new())
        .unwrap()
        .add_node("c", DelayedUnit::new(Duration::from_millis(15)))
        .unwrap()
        .add_node("join", CountingUnit::new(calls.clone()))
        .unwrap()
        .add_edge("seed", "a")
        .unwrap()
        .add_edge("seed", "b")
        .unwrap()
        .add_edge("seed", "c")
        .unwrap()
        .add_edge("a", "join")
        .unwrap()
        .add_edge("b", "join")
        .unwrap()
        .add_edge("c", "join")
        .unwrap()
        .set_entry("seed")
        .unwrap()
        .compile()
        .unwrap();

    let engine = Engine::with_default_reducers(Arc::new(plan));
    engine.run(WorkflowState::new()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failure_names_the_node_and_skips_descendants() {
    let child_calls = Arc::new(AtomicUsize::new(0));
    let plan = GraphBuilder::new()
        .add_node("seed", EmitUnit::new().with("seeded", json!(true)))
        .unwrap()
        .add_node("ok", DelayedUnit::new(Duration::from_millis(30)))
        .unwrap()
        .add_node("bad", FailingUnit::new("boom"))
        .unwrap()
        .add_node("child", CountingUnit::new(child_calls.clone()))
        .unwrap()
        .add_edge("seed", "ok")
        .unwrap()
        .add_edge("seed", "bad")
        .unwrap()
        .add_edge("bad", "child")
        .unwrap()
        .set_entry("seed")
        .unwrap()
        .compile()
        .unwrap();

    let engine = Engine::with_default_reducers(Arc::new(plan));
    let err = engine.run(WorkflowState::new()).await.unwrap_err();

    assert_eq!(err.node, "bad");
    assert!(matches!(err.kind, RunErrorKind::Processing(_)));
    // Merges applied before the failure are preserved in the returned state.
    assert_eq!(err.state.get_bool("seeded"), Some(true));
    assert_eq!(child_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn undeclared_router_label_fails_the_run() {
    let rogue: Router = Arc::new(|_snapshot| "mystery".to_owned());
    let plan = GraphBuilder::new()
        .add_node("probe", EmitUnit::new())
        .unwrap()
        .add_conditional_edge("probe", rogue, [("known", RouteTarget::End)])
        .unwrap()
        .set_entry("probe")
        .unwrap()
        .compile()
        .unwrap();

    let engine = Engine::with_default_reducers(Arc::new(plan));
    let err = engine.run(WorkflowState::new()).await.unwrap_err();
    assert_eq!(err.node, "probe");
    match err.kind {
        RunErrorKind::UndeclaredRouterLabel { label, declared } => {
            assert_eq!(label, "mystery");
            assert_eq!(declared, ["known"]);
        }
        other => panic!("expected UndeclaredRouterLabel, got {other:?}"),
    }
}

#[tokio::test]
async fn node_timeout_fails_the_run() {
    let plan = GraphBuilder::new()
        .add_node("slow", DelayedUnit::new(Duration::from_millis(500)))
        .unwrap()
        .with_timeout("slow", Duration::from_millis(25))
        .unwrap()
        .set_entry("slow")
        .unwrap()
        .compile()
        .unwrap();

    let engine = Engine::with_default_reducers(Arc::new(plan));
    let err = engine.run(WorkflowState::new()).await.unwrap_err();
    assert_eq!(err.node, "slow");
    assert!(matches!(
        err.kind,
        RunErrorKind::Processing(ProcessingError::Timeout { .. })
    ));
}

#[tokio::test]
async fn conditional_routing_is_exclusive() {
    let left_calls = Arc::new(AtomicUsize::new(0));
    let right_calls = Arc::new(AtomicUsize::new(0));
    let pick_left: Router = Arc::new(|_snapshot| "left".to_owned());
    let plan = GraphBuilder::new()
        .add_node("probe", EmitUnit::new())
        .unwrap()
        .add_node("left", CountingUnit::new(left_calls.clone()))
        .unwrap()
        .add_node("right", CountingUnit::new(right_calls.clone()))
        .unwrap()
        .add_conditional_edge(
            "probe",
            pick_left,
            [
                ("left", RouteTarget::node("left")),
                ("right", RouteTarget::node("right")),
            ],
        )
        .unwrap()
        .set_entry("probe")
        .unwrap()
        .compile()
        .unwrap();

    let engine = Engine::with_default_reducers(Arc::new(plan));
    engine.run(WorkflowState::new()).await.unwrap();
    assert_eq!(left_calls.load(Ordering::SeqCst), 1);
    assert_eq!(right_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn end_target_closes_the_branch() {
    let orphan_calls = Arc::new(AtomicUsize::new(0));
    let stop: Router = Arc::new(|_snapshot| "stop".to_owned());
    let plan = GraphBuilder::new()
        .add_node("probe", EmitUnit::new().with("ran", json!(true)))
        .unwrap()
        .add_node("orphan", CountingUnit::new(orphan_calls.clone()))
        .unwrap()
        .add_conditional_edge(
            "probe",
            stop,
            [
                ("stop", RouteTarget::End),
                ("go", RouteTarget::node("orphan")),
            ],
        )
        .unwrap()
        .set_entry("probe")
        .unwrap()
        .compile()
        .unwrap();

    let engine = Engine::with_default_reducers(Arc::new(plan));
    let state = engine.run(WorkflowState::new()).await.unwrap();
    assert_eq!(state.get_bool("ran"), Some(true));
    assert_eq!(orphan_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn node_reached_both_ways_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let to_b: Router = Arc::new(|_snapshot| "go".to_owned());
    let plan = GraphBuilder::new()
        .add_node("a", EmitUnit::new())
        .unwrap()
        .add_node("b", CountingUnit::new(calls.clone()))
        .unwrap()
        .add_edge("a", "b")
        .unwrap()
        .add_conditional_edge("a", to_b, [("go", RouteTarget::node("b"))])
        .unwrap()
        .set_entry("a")
        .unwrap()
        .compile()
        .unwrap();

    let engine = Engine::with_default_reducers(Arc::new(plan));
    engine.run(WorkflowState::new()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
