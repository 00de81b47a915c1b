//! Node model for workflow graphs.
//!
//! Each node type carries its own typed configuration record instead of a
//! free-form data bag, so adding an executor is compile-time exhaustive.
//! The wire format stays the canvas editor's `{ id, type, data }` shape.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use super::NodeId;

/// Discriminant for the built-in node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
pub enum NodeType {
    /// Static text.
    #[strum(serialize = "textNode")]
    Text,
    /// Pre-uploaded image asset.
    #[strum(serialize = "uploadImageNode")]
    UploadImage,
    /// Pre-uploaded video asset.
    #[strum(serialize = "uploadVideoNode")]
    UploadVideo,
    /// AI model invocation.
    #[strum(serialize = "llmNode")]
    Llm,
    /// Image crop.
    #[strum(serialize = "cropImageNode")]
    CropImage,
    /// Video frame extraction.
    #[strum(serialize = "extractFrameNode")]
    ExtractFrame,
    /// Generative text-to-image.
    #[strum(serialize = "textToImageNode")]
    TextToImage,
    /// Generative text-to-video.
    #[strum(serialize = "textToVideoNode")]
    TextToVideo,
    /// Predicate evaluation.
    #[strum(serialize = "conditionNode")]
    Condition,
    /// Iteration counter.
    #[strum(serialize = "loopNode")]
    Loop,
    /// Fan-in concatenation.
    #[strum(serialize = "mergeNode")]
    Merge,
    /// Terminal passthrough.
    #[strum(serialize = "outputNode")]
    Output,
}

/// Configuration for a text node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextConfig {
    /// The text value this node produces.
    pub text: String,
}

/// Configuration for an upload-image node.
///
/// The upload itself happens elsewhere; by run time the node only carries
/// the resulting asset URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadImageConfig {
    /// URL of the uploaded image.
    pub image_url: Option<String>,
    /// Original file name.
    pub file_name: Option<String>,
    /// File size in bytes.
    pub file_size: Option<u64>,
}

/// Configuration for an upload-video node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UploadVideoConfig {
    /// URL of the uploaded video.
    pub video_url: Option<String>,
    /// Original file name.
    pub file_name: Option<String>,
    /// File size in bytes.
    pub file_size: Option<u64>,
}

/// Configuration for an LLM node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmConfig {
    /// Model identifier; selects the provider family by prefix.
    pub model: String,
    /// System prompt, overridable by a `system_prompt` input edge.
    pub system_prompt: Option<String>,
    /// Fallback user message when no text inputs are connected.
    pub user_message: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
}

/// Configuration for a crop-image node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropImageConfig {
    /// Fallback source when no image input is connected.
    pub image_url: Option<String>,
    /// Left edge as a percentage of the image width.
    pub x_percent: f64,
    /// Top edge as a percentage of the image height.
    pub y_percent: f64,
    /// Box width as a percentage of the image width.
    pub width_percent: f64,
    /// Box height as a percentage of the image height.
    pub height_percent: f64,
}

/// Configuration for an extract-frame node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractFrameConfig {
    /// Fallback source when no video input is connected.
    pub video_url: Option<String>,
    /// Frame position: seconds (`"12.5"`) or a percentage (`"40%"`).
    pub timestamp: String,
}

/// Configuration for the generative text-to-image/video nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateConfig {
    /// Fallback prompt when no text input is connected.
    pub prompt: Option<String>,
}

/// Configuration for a condition node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConditionConfig {
    /// Predicate operator: `equals`, `contains`, `starts_with`,
    /// `ends_with`. Anything else falls back to a presence check.
    pub condition: String,
    /// Comparison operand.
    pub value: Option<String>,
}

/// Configuration for a loop node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoopConfig {
    /// Declared iteration count.
    pub iterations: u32,
    /// Delay between iterations in milliseconds.
    pub delay: u64,
}

/// Configuration for a merge node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeConfig {
    /// How many inputs to merge; all connected inputs when unset.
    pub num_inputs: Option<usize>,
}

/// Configuration for an output node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {}

/// Typed configuration for each node type.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Static text.
    Text(TextConfig),
    /// Pre-uploaded image asset.
    UploadImage(UploadImageConfig),
    /// Pre-uploaded video asset.
    UploadVideo(UploadVideoConfig),
    /// AI model invocation.
    Llm(LlmConfig),
    /// Image crop.
    CropImage(CropImageConfig),
    /// Video frame extraction.
    ExtractFrame(ExtractFrameConfig),
    /// Generative text-to-image.
    TextToImage(GenerateConfig),
    /// Generative text-to-video.
    TextToVideo(GenerateConfig),
    /// Predicate evaluation.
    Condition(ConditionConfig),
    /// Iteration counter.
    Loop(LoopConfig),
    /// Fan-in concatenation.
    Merge(MergeConfig),
    /// Terminal passthrough.
    Output(OutputConfig),
    /// Unknown node type: the raw data bag is echoed through unchanged.
    Passthrough {
        /// The unrecognized wire type string.
        type_name: String,
        /// The raw configuration bag.
        data: serde_json::Value,
    },
}

impl NodeKind {
    /// Builds a kind from a known type discriminant and its data bag.
    ///
    /// Malformed configuration falls back to the type's defaults rather
    /// than rejecting the graph.
    fn from_parts(node_type: NodeType, data: serde_json::Value) -> Self {
        fn parse<T: DeserializeOwned + Default>(data: serde_json::Value) -> T {
            serde_json::from_value(data).unwrap_or_default()
        }

        match node_type {
            NodeType::Text => Self::Text(parse(data)),
            NodeType::UploadImage => Self::UploadImage(parse(data)),
            NodeType::UploadVideo => Self::UploadVideo(parse(data)),
            NodeType::Llm => Self::Llm(parse(data)),
            NodeType::CropImage => Self::CropImage(parse(data)),
            NodeType::ExtractFrame => Self::ExtractFrame(parse(data)),
            NodeType::TextToImage => Self::TextToImage(parse(data)),
            NodeType::TextToVideo => Self::TextToVideo(parse(data)),
            NodeType::Condition => Self::Condition(parse(data)),
            NodeType::Loop => Self::Loop(parse(data)),
            NodeType::Merge => Self::Merge(parse(data)),
            NodeType::Output => Self::Output(parse(data)),
        }
    }

    /// Returns the type discriminant for the built-in kinds.
    pub fn node_type(&self) -> Option<NodeType> {
        match self {
            Self::Text(_) => Some(NodeType::Text),
            Self::UploadImage(_) => Some(NodeType::UploadImage),
            Self::UploadVideo(_) => Some(NodeType::UploadVideo),
            Self::Llm(_) => Some(NodeType::Llm),
            Self::CropImage(_) => Some(NodeType::CropImage),
            Self::ExtractFrame(_) => Some(NodeType::ExtractFrame),
            Self::TextToImage(_) => Some(NodeType::TextToImage),
            Self::TextToVideo(_) => Some(NodeType::TextToVideo),
            Self::Condition(_) => Some(NodeType::Condition),
            Self::Loop(_) => Some(NodeType::Loop),
            Self::Merge(_) => Some(NodeType::Merge),
            Self::Output(_) => Some(NodeType::Output),
            Self::Passthrough { .. } => None,
        }
    }

    /// Returns the wire name of the node type.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Passthrough { type_name, .. } => type_name,
            other => match other.node_type() {
                Some(node_type) => {
                    let name: &'static str = node_type.into();
                    name
                }
                None => "unknown",
            },
        }
    }

    fn config_value(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Text(c) => serde_json::to_value(c),
            Self::UploadImage(c) => serde_json::to_value(c),
            Self::UploadVideo(c) => serde_json::to_value(c),
            Self::Llm(c) => serde_json::to_value(c),
            Self::CropImage(c) => serde_json::to_value(c),
            Self::ExtractFrame(c) => serde_json::to_value(c),
            Self::TextToImage(c) => serde_json::to_value(c),
            Self::TextToVideo(c) => serde_json::to_value(c),
            Self::Condition(c) => serde_json::to_value(c),
            Self::Loop(c) => serde_json::to_value(c),
            Self::Merge(c) => serde_json::to_value(c),
            Self::Output(c) => serde_json::to_value(c),
            Self::Passthrough { data, .. } => Ok(data.clone()),
        }
    }
}

/// One unit of work in a workflow graph, typed by its operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
}

impl Node {
    /// Creates a node with the given id and kind.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Creates a text node.
    pub fn text(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self::new(id, NodeKind::Text(TextConfig { text: text.into() }))
    }

    /// Creates an LLM node for the given model.
    pub fn llm(id: impl Into<NodeId>, model: impl Into<String>) -> Self {
        Self::new(
            id,
            NodeKind::Llm(LlmConfig {
                model: model.into(),
                ..Default::default()
            }),
        )
    }

    /// Creates an output node.
    pub fn output(id: impl Into<NodeId>) -> Self {
        Self::new(id, NodeKind::Output(OutputConfig::default()))
    }

    /// Returns the node id.
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Returns the node's typed configuration.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the wire name of the node type.
    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }
}

/// Canvas wire shape: `{ id, type, data }`.
#[derive(Serialize, Deserialize)]
struct NodeWire {
    id: NodeId,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = NodeWire::deserialize(deserializer)?;
        let kind = match wire.node_type.parse::<NodeType>() {
            Ok(node_type) => NodeKind::from_parts(node_type, wire.data),
            // Unknown types keep their data bag and execute as identity.
            Err(_) => NodeKind::Passthrough {
                type_name: wire.node_type,
                data: wire.data,
            },
        };
        Ok(Node {
            id: wire.id,
            kind,
        })
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data = self
            .kind
            .config_value()
            .map_err(serde::ser::Error::custom)?;
        NodeWire {
            id: self.id.clone(),
            node_type: self.type_name().to_string(),
            data,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_llm_node() {
        let node: Node = serde_json::from_str(
            r#"{
                "id": "llmNode-1",
                "type": "llmNode",
                "position": {"x": 80, "y": 40},
                "data": {"model": "gemini-1.5-flash", "systemPrompt": "Be brief.", "label": "LLM"}
            }"#,
        )
        .unwrap();

        assert_eq!(node.id().as_str(), "llmNode-1");
        assert_eq!(node.type_name(), "llmNode");
        match node.kind() {
            NodeKind::Llm(config) => {
                assert_eq!(config.model, "gemini-1.5-flash");
                assert_eq!(config.system_prompt.as_deref(), Some("Be brief."));
                assert!(config.user_message.is_none());
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_unknown_type_keeps_data() {
        let node: Node = serde_json::from_str(
            r#"{"id": "x-1", "type": "webhookNode", "data": {"endpoint": "https://example.com"}}"#,
        )
        .unwrap();

        assert_eq!(node.type_name(), "webhookNode");
        match node.kind() {
            NodeKind::Passthrough { data, .. } => {
                assert_eq!(data["endpoint"], "https://example.com");
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let node: Node = serde_json::from_str(
            r#"{"id": "crop-1", "type": "cropImageNode", "data": {"xPercent": "not a number"}}"#,
        )
        .unwrap();

        match node.kind() {
            NodeKind::CropImage(config) => {
                assert_eq!(config.x_percent, 0.0);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_serialize_round_trip() {
        let node = Node::text("textNode-2", "hello");
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "textNode");
        assert_eq!(value["data"]["text"], "hello");

        let back: Node = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_node_type_parsing() {
        assert_eq!("textNode".parse::<NodeType>().unwrap(), NodeType::Text);
        assert_eq!(
            "extractFrameNode".parse::<NodeType>().unwrap(),
            NodeType::ExtractFrame
        );
        assert!("mysteryNode".parse::<NodeType>().is_err());
        assert_eq!(NodeType::TextToImage.as_ref(), "textToImageNode");
    }
}
