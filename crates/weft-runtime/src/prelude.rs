//! Prelude module for convenient imports.
//!
//! ```rust
//! use weft_runtime::prelude::*;
//! ```

pub use crate::engine::{Engine, EngineConfig, EngineConfigBuilder, ExecutionMode, Executors};
pub use crate::error::{WorkflowError, WorkflowResult};
pub use crate::graph::{Edge, Node, NodeId, NodeKind, NodeType, WorkflowGraph};
pub use crate::run::{
    NodeResult, NodeStatus, RunId, RunOutcome, RunRecord, RunScope, RunStatus,
};
pub use crate::runtime::{InMemoryRunStore, RunRequest, RunResponse, RunStore, RuntimeService};
