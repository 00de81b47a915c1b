//! Per-node execution results.

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::graph::{Node, NodeId};

/// Status of a single node execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// The node produced an output.
    Success,
    /// The node's executor failed; the error message is the payload.
    Failed,
}

/// Result of one node execution within a run.
///
/// Created once per node per run and never mutated afterwards; downstream
/// nodes read the `output` of upstream results by node id lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    /// Id of the executed node.
    pub node_id: NodeId,
    /// Wire name of the node type.
    pub node_type: String,
    /// Whether the execution succeeded.
    pub status: NodeStatus,
    /// Typed output, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// Error message, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Execution time in milliseconds.
    pub duration: u64,
    /// When the result was recorded.
    pub timestamp: Timestamp,
}

impl NodeResult {
    /// Creates a success result for `node`.
    pub fn success(node: &Node, output: serde_json::Value, duration: Duration) -> Self {
        Self {
            node_id: node.id().clone(),
            node_type: node.type_name().to_string(),
            status: NodeStatus::Success,
            output: Some(output),
            error: None,
            duration: duration.as_millis() as u64,
            timestamp: Timestamp::now(),
        }
    }

    /// Creates a failure result for `node`.
    pub fn failure(node: &Node, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            node_id: node.id().clone(),
            node_type: node.type_name().to_string(),
            status: NodeStatus::Failed,
            output: None,
            error: Some(error.into()),
            duration: duration.as_millis() as u64,
            timestamp: Timestamp::now(),
        }
    }

    /// Returns whether the node succeeded.
    pub fn is_success(&self) -> bool {
        self.status == NodeStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_result_serializes_camel_case() {
        let node = Node::text("textNode-1", "hi");
        let result = NodeResult::success(&node, json!({"text": "hi"}), Duration::from_millis(3));
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["nodeId"], "textNode-1");
        assert_eq!(value["nodeType"], "textNode");
        assert_eq!(value["status"], "success");
        assert_eq!(value["output"]["text"], "hi");
        assert!(value.get("error").is_none());
        assert_eq!(value["duration"], 3);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_failure_has_no_output() {
        let node = Node::llm("llmNode-1", "gpt-4o-mini");
        let result = NodeResult::failure(&node, "quota exceeded", Duration::from_millis(10));
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"], "quota exceeded");
        assert!(value.get("output").is_none());
    }
}
