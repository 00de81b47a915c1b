//! Workflow graph structures and dependency analysis.
//!
//! This module provides the graph representation for workflows:
//! - [`WorkflowGraph`]: nodes plus edges, with cycle detection, topological
//!   ordering, and parallel batching
//! - [`Node`] / [`NodeKind`]: typed per-node configuration
//! - [`NodeType`]: the closed set of node type discriminants
//! - [`Edge`]: handle-addressed connections between nodes
//! - [`NodeId`]: canvas-assigned node identifier

mod edge;
mod id;
mod node;
mod workflow;

pub use edge::{Edge, IMAGES_HANDLE, SYSTEM_PROMPT_HANDLE};
pub use id::NodeId;
pub use node::{
    ConditionConfig, CropImageConfig, ExtractFrameConfig, GenerateConfig, LlmConfig, LoopConfig,
    MergeConfig, Node, NodeKind, NodeType, OutputConfig, TextConfig, UploadImageConfig,
    UploadVideoConfig,
};
pub use workflow::WorkflowGraph;
