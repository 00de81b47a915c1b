//! Edge model for workflow graphs.

use serde::{Deserialize, Serialize};

use super::NodeId;

/// Input handle that overrides an LLM node's system prompt.
pub const SYSTEM_PROMPT_HANDLE: &str = "system_prompt";

/// Input handle that attaches an image to an LLM request.
pub const IMAGES_HANDLE: &str = "images";

/// A directed data-flow connection between two node ports.
///
/// Handles disambiguate multiple inputs or outputs on one node; an edge
/// without a target handle feeds the node's default input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Edge identifier from the canvas editor.
    #[serde(default)]
    pub id: String,
    /// Source node id.
    pub source: NodeId,
    /// Target node id.
    pub target: NodeId,
    /// Optional output port name on the source node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Optional input port name on the target node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Edge {
    /// Creates an edge between two nodes with no handles.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: String::new(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Sets the target handle.
    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }

    /// Sets the source handle.
    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }
}
