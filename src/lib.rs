//! Veriflow: a concurrent DAG workflow engine.
//!
//! Workflows are directed acyclic graphs of [`NodeUnit`](node::NodeUnit)s
//! sharing a keyed [`WorkflowState`](state::WorkflowState). Each unit receives
//! an immutable [`StateSnapshot`](state::StateSnapshot) and returns a sparse
//! [`NodePartial`](node::NodePartial); the engine folds partials into the
//! shared state through per-field [`Reducer`](reducers::Reducer)s, so sibling
//! branches can run concurrently without locking.
//!
//! Graphs are declared with [`GraphBuilder`](graph::GraphBuilder) and
//! validated into an immutable [`ExecutionPlan`](graph::ExecutionPlan).
//! Static edges express data dependencies (a node with several predecessors
//! fires once, after all of them have merged); conditional edges route
//! through a pure [`Router`](graph::Router) whose labels map to declared
//! targets or the terminal sentinel.
//!
//! ```no_run
//! use std::sync::Arc;
//! use veriflow::engine::Engine;
//! use veriflow::pipeline::{self, PipelineConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(PipelineConfig::default());
//! let plan = Arc::new(pipeline::claim_graph(config)?);
//! let engine = Engine::new(plan, pipeline::reducer_table());
//!
//! let initial = pipeline::initial_state(
//!     "shocking cure they don't want you to know",
//!     "https://fake-news.com/article",
//! );
//! let final_state = engine.run(initial).await?;
//! println!("{:?}", final_state.get_str(pipeline::fields::VERDICT));
//! # Ok(())
//! # }
//! ```

pub mod decision;
pub mod engine;
pub mod graph;
pub mod message;
pub mod node;
pub mod pipeline;
pub mod reducers;
pub mod state;
pub mod telemetry;
pub mod types;
