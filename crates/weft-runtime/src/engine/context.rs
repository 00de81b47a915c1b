//! Per-run execution context and input resolution.

use std::collections::HashMap;

use serde_json::Value;

use crate::graph::{IMAGES_HANDLE, Node, NodeId, NodeKind, SYSTEM_PROMPT_HANDLE, WorkflowGraph};
use crate::run::NodeResult;

/// Inputs resolved for one node from its upstream results.
///
/// Failed upstreams contribute nothing: their values are absent, which the
/// executor treats as "fall back to configuration", not as an error.
#[derive(Debug, Clone, Default)]
pub struct ResolvedInputs {
    /// Text-bearing values from unnamed-handle edges, in edge input order.
    pub texts: Vec<String>,
    /// System prompt override from a `system_prompt` handle.
    pub system_prompt: Option<String>,
    /// Image URLs attached through `images` handles.
    pub images: Vec<String>,
    /// First upstream image URL, for image-consuming nodes.
    pub image_url: Option<String>,
    /// First upstream video URL, for video-consuming nodes.
    pub video_url: Option<String>,
    /// Every successful upstream output, in edge input order.
    pub upstream: Vec<Value>,
}

impl ResolvedInputs {
    /// Joined user message from the unnamed-handle texts.
    pub fn merged_text(&self) -> Option<String> {
        if self.texts.is_empty() {
            None
        } else {
            Some(self.texts.join("\n"))
        }
    }
}

/// Accumulates node results during a run and resolves downstream inputs.
#[derive(Debug, Default)]
pub struct RunContext {
    results: Vec<NodeResult>,
    index: HashMap<NodeId, usize>,
}

impl RunContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node result.
    pub fn push(&mut self, result: NodeResult) {
        self.index.insert(result.node_id.clone(), self.results.len());
        self.results.push(result);
    }

    /// Returns the result recorded for a node, if any.
    pub fn get(&self, id: &NodeId) -> Option<&NodeResult> {
        self.index.get(id).map(|&i| &self.results[i])
    }

    /// Consumes the context, returning the results in execution order.
    pub fn into_results(self) -> Vec<NodeResult> {
        self.results
    }

    /// Resolves the inputs for `node_id` from its incoming edges and the
    /// results recorded so far.
    pub fn resolve_inputs(&self, graph: &WorkflowGraph, node_id: &NodeId) -> ResolvedInputs {
        let mut inputs = ResolvedInputs::default();

        for edge in graph.incoming_edges(node_id) {
            let Some(result) = self.get(&edge.source) else {
                continue;
            };
            if !result.is_success() {
                continue;
            }
            let Some(output) = result.output.as_ref() else {
                continue;
            };

            inputs.upstream.push(output.clone());
            let source = graph.get_node(&edge.source);

            match edge.target_handle.as_deref() {
                Some(SYSTEM_PROMPT_HANDLE) => {
                    if let Some(text) = text_value(output) {
                        inputs.system_prompt = Some(text);
                    }
                }
                Some(IMAGES_HANDLE) => {
                    if let Some(url) = image_value(output, source) {
                        inputs.images.push(url);
                    }
                }
                _ => {
                    if let Some(text) = text_value(output) {
                        inputs.texts.push(text);
                    }
                }
            }

            if inputs.image_url.is_none() {
                inputs.image_url = image_value(output, source);
            }
            if inputs.video_url.is_none() {
                inputs.video_url = video_value(output, source);
            }
        }

        inputs
    }
}

/// Extracts a text-bearing value: a non-empty `text` or `response` field.
fn text_value(output: &Value) -> Option<String> {
    non_empty_str(output.get("text"))
        .or_else(|| non_empty_str(output.get("response")))
        .map(str::to_owned)
}

/// Extracts an image URL.
///
/// Explicit image fields always count; the generic `url` field counts only
/// when the source node is known to produce an image.
fn image_value(output: &Value, source: Option<&Node>) -> Option<String> {
    for key in ["imageUrl", "croppedUrl", "extractedFrameUrl"] {
        if let Some(url) = non_empty_str(output.get(key)) {
            return Some(url.to_owned());
        }
    }
    if matches!(
        source.map(Node::kind),
        Some(NodeKind::UploadImage(_) | NodeKind::TextToImage(_))
    ) {
        return non_empty_str(output.get("url")).map(str::to_owned);
    }
    None
}

/// Extracts a video URL, analogous to [`image_value`].
fn video_value(output: &Value, source: Option<&Node>) -> Option<String> {
    if let Some(url) = non_empty_str(output.get("videoUrl")) {
        return Some(url.to_owned());
    }
    if matches!(
        source.map(Node::kind),
        Some(NodeKind::UploadVideo(_) | NodeKind::TextToVideo(_))
    ) {
        return non_empty_str(output.get("url")).map(str::to_owned);
    }
    None
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::graph::{Edge, NodeKind, UploadImageConfig, UploadVideoConfig};

    fn success(node: &Node, output: Value) -> NodeResult {
        NodeResult::success(node, output, Duration::from_millis(1))
    }

    fn upload_image(id: &str, url: &str) -> Node {
        Node::new(
            id,
            NodeKind::UploadImage(UploadImageConfig {
                image_url: Some(url.into()),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_texts_collected_in_edge_order() {
        let a1 = Node::text("a1", "foo");
        let a2 = Node::text("a2", "bar");
        let b = Node::llm("b", "gpt-4o-mini");
        let graph = WorkflowGraph::new(
            vec![a1.clone(), a2.clone(), b.clone()],
            vec![Edge::new("a1", "b"), Edge::new("a2", "b")],
        );

        let mut ctx = RunContext::new();
        ctx.push(success(&a1, json!({"text": "foo"})));
        ctx.push(success(&a2, json!({"text": "bar"})));

        let inputs = ctx.resolve_inputs(&graph, b.id());
        assert_eq!(inputs.texts, ["foo", "bar"]);
        assert_eq!(inputs.merged_text().as_deref(), Some("foo\nbar"));
    }

    #[test]
    fn test_system_prompt_handle_overrides() {
        let s = Node::text("s", "Be terse.");
        let b = Node::llm("b", "gpt-4o-mini");
        let graph = WorkflowGraph::new(
            vec![s.clone(), b.clone()],
            vec![Edge::new("s", "b").with_target_handle(SYSTEM_PROMPT_HANDLE)],
        );

        let mut ctx = RunContext::new();
        ctx.push(success(&s, json!({"text": "Be terse."})));

        let inputs = ctx.resolve_inputs(&graph, b.id());
        assert_eq!(inputs.system_prompt.as_deref(), Some("Be terse."));
        // A handle-addressed edge does not feed the default text input.
        assert!(inputs.texts.is_empty());
    }

    #[test]
    fn test_failed_upstream_is_absent() {
        let a = Node::text("a", "x");
        let b = Node::llm("b", "gpt-4o-mini");
        let graph = WorkflowGraph::new(
            vec![a.clone(), b.clone()],
            vec![Edge::new("a", "b")],
        );

        let mut ctx = RunContext::new();
        ctx.push(NodeResult::failure(&a, "boom", Duration::from_millis(1)));

        let inputs = ctx.resolve_inputs(&graph, b.id());
        assert!(inputs.texts.is_empty());
        assert!(inputs.upstream.is_empty());
    }

    #[test]
    fn test_image_url_from_upload_node() {
        let up = upload_image("up", "https://cdn.example.com/a.png");
        let crop = Node::new(
            "crop",
            NodeKind::CropImage(Default::default()),
        );
        let graph = WorkflowGraph::new(
            vec![up.clone(), crop.clone()],
            vec![Edge::new("up", "crop")],
        );

        let mut ctx = RunContext::new();
        ctx.push(success(&up, json!({"url": "https://cdn.example.com/a.png"})));

        let inputs = ctx.resolve_inputs(&graph, crop.id());
        assert_eq!(
            inputs.image_url.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        // An image URL is not mistaken for a video source.
        assert!(inputs.video_url.is_none());
    }

    #[test]
    fn test_video_url_requires_video_source() {
        let up = Node::new(
            "up",
            NodeKind::UploadVideo(UploadVideoConfig {
                video_url: Some("https://cdn.example.com/v.mp4".into()),
                ..Default::default()
            }),
        );
        let frame = Node::new("frame", NodeKind::ExtractFrame(Default::default()));
        let graph = WorkflowGraph::new(
            vec![up.clone(), frame.clone()],
            vec![Edge::new("up", "frame")],
        );

        let mut ctx = RunContext::new();
        ctx.push(success(&up, json!({"url": "https://cdn.example.com/v.mp4"})));

        let inputs = ctx.resolve_inputs(&graph, frame.id());
        assert_eq!(
            inputs.video_url.as_deref(),
            Some("https://cdn.example.com/v.mp4")
        );
        assert!(inputs.image_url.is_none());
    }

    #[test]
    fn test_cropped_output_feeds_downstream_image() {
        let crop = Node::new("crop", NodeKind::CropImage(Default::default()));
        let next = Node::new("next", NodeKind::CropImage(Default::default()));
        let graph = WorkflowGraph::new(
            vec![crop.clone(), next.clone()],
            vec![Edge::new("crop", "next")],
        );

        let mut ctx = RunContext::new();
        ctx.push(success(
            &crop,
            json!({"imageUrl": "https://cdn.example.com/c.png", "width": 10, "height": 10}),
        ));

        let inputs = ctx.resolve_inputs(&graph, next.id());
        assert_eq!(
            inputs.image_url.as_deref(),
            Some("https://cdn.example.com/c.png")
        );
    }
}
