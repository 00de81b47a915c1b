//! Per-type node executors.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use weft_media::backend::MediaBackend;
use weft_media::{CropRegion, GeneratedAsset, GenerativeService, ImageService, VideoService};
use weft_rig::{CompletionRequest, CompletionRouter};

use super::context::ResolvedInputs;
use crate::graph::{
    ConditionConfig, CropImageConfig, ExtractFrameConfig, GenerateConfig, LlmConfig, LoopConfig,
    MergeConfig, Node, NodeKind,
};

/// Upper bound on declared loop iterations.
const MAX_LOOP_ITERATIONS: u32 = 1000;

/// Per-node execution failure, recorded as that node's `failed` result.
#[derive(Debug, Error)]
pub enum NodeError {
    /// A required upstream input is missing.
    #[error("missing required {0} input")]
    MissingInput(&'static str),

    /// Completion provider failure.
    #[error(transparent)]
    Completion(#[from] weft_rig::RigError),

    /// Media processing failure.
    #[error(transparent)]
    Media(#[from] weft_media::MediaError),
}

/// Typed output of one node execution, serialized into the node result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeOutput {
    /// `{ text }`
    Text {
        /// The produced text.
        text: String,
    },

    /// `{ url, fileName?, fileSize? }`
    #[serde(rename_all = "camelCase")]
    Upload {
        /// URL of the uploaded asset.
        url: String,
        /// Original file name.
        #[serde(skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
        /// File size in bytes.
        #[serde(skip_serializing_if = "Option::is_none")]
        file_size: Option<u64>,
    },

    /// `{ response, imageUrl? }`
    #[serde(rename_all = "camelCase")]
    Llm {
        /// Provider response text.
        response: String,
        /// Attached image passed through for downstream inspection.
        #[serde(skip_serializing_if = "Option::is_none")]
        image_url: Option<String>,
    },

    /// `{ imageUrl, width, height }`
    #[serde(rename_all = "camelCase")]
    CroppedImage {
        /// URL of the cropped asset.
        image_url: String,
        /// Crop width in pixels.
        width: u32,
        /// Crop height in pixels.
        height: u32,
    },

    /// `{ extractedFrameUrl }`
    #[serde(rename_all = "camelCase")]
    Frame {
        /// URL of the extracted frame.
        extracted_frame_url: String,
    },

    /// `{ url, prompt, warning? }`
    Generated(GeneratedAsset),

    /// `{ result }`
    Condition {
        /// Predicate verdict.
        result: bool,
    },

    /// `{ iterations, completed }`
    Loop {
        /// Number of declared iterations.
        iterations: u32,
        /// Always true once the node executes.
        completed: bool,
    },

    /// `{ merged }`
    Merge {
        /// The merged upstream outputs.
        merged: Value,
    },

    /// Raw passthrough of configuration or an upstream output.
    Raw(Value),
}

impl NodeOutput {
    /// Serializes to the wire value stored in a node result.
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Node executors: one strategy per node type, sharing the provider
/// services.
pub struct Executors {
    completions: CompletionRouter,
    images: ImageService,
    videos: VideoService,
    generative: GenerativeService,
}

impl Executors {
    /// Creates executors from individually configured services.
    pub fn new(
        completions: CompletionRouter,
        images: ImageService,
        videos: VideoService,
        generative: GenerativeService,
    ) -> Self {
        Self {
            completions,
            images,
            videos,
            generative,
        }
    }

    /// Convenience constructor wiring all media services to one backend.
    pub fn with_media_backend(
        completions: CompletionRouter,
        backend: Arc<dyn MediaBackend>,
    ) -> Self {
        Self::new(
            completions,
            ImageService::new(Arc::clone(&backend)),
            VideoService::new(Arc::clone(&backend)),
            GenerativeService::new(backend),
        )
    }

    /// Executes `node` against its resolved inputs.
    pub async fn execute(
        &self,
        node: &Node,
        inputs: &ResolvedInputs,
    ) -> Result<NodeOutput, NodeError> {
        match node.kind() {
            NodeKind::Text(config) => Ok(NodeOutput::Text {
                text: config.text.clone(),
            }),
            NodeKind::UploadImage(config) => Ok(NodeOutput::Upload {
                url: config.image_url.clone().unwrap_or_default(),
                file_name: config.file_name.clone(),
                file_size: config.file_size,
            }),
            NodeKind::UploadVideo(config) => Ok(NodeOutput::Upload {
                url: config.video_url.clone().unwrap_or_default(),
                file_name: config.file_name.clone(),
                file_size: config.file_size,
            }),
            NodeKind::Llm(config) => self.llm(config, inputs).await,
            NodeKind::CropImage(config) => self.crop_image(config, inputs).await,
            NodeKind::ExtractFrame(config) => self.extract_frame(config, inputs).await,
            NodeKind::TextToImage(config) => self.text_to_image(config, inputs).await,
            NodeKind::TextToVideo(config) => self.text_to_video(config, inputs).await,
            NodeKind::Condition(config) => Ok(condition(config, inputs)),
            NodeKind::Loop(config) => Ok(loop_count(config)),
            NodeKind::Merge(config) => Ok(merge(config, inputs)),
            NodeKind::Output(_) => Ok(output_passthrough(inputs)),
            NodeKind::Passthrough { data, .. } => Ok(NodeOutput::Raw(data.clone())),
        }
    }

    async fn llm(
        &self,
        config: &LlmConfig,
        inputs: &ResolvedInputs,
    ) -> Result<NodeOutput, NodeError> {
        let user_message = inputs
            .merged_text()
            .or_else(|| config.user_message.clone())
            .unwrap_or_else(|| "No input provided".to_string());

        let mut request = CompletionRequest::new(&config.model, user_message);
        request.system_prompt = inputs
            .system_prompt
            .clone()
            .or_else(|| config.system_prompt.clone());
        request.images = inputs.images.clone();

        let response = self.completions.generate(&request).await?;

        Ok(NodeOutput::Llm {
            response,
            image_url: inputs.images.first().cloned(),
        })
    }

    async fn crop_image(
        &self,
        config: &CropImageConfig,
        inputs: &ResolvedInputs,
    ) -> Result<NodeOutput, NodeError> {
        let source = inputs
            .image_url
            .clone()
            .or_else(|| config.image_url.clone())
            .ok_or(NodeError::MissingInput("image"))?;

        let region = CropRegion {
            x_percent: config.x_percent,
            y_percent: config.y_percent,
            width_percent: config.width_percent,
            height_percent: config.height_percent,
        };
        let output = self.images.crop(&source, region).await?;

        Ok(NodeOutput::CroppedImage {
            image_url: output.image_url,
            width: output.width,
            height: output.height,
        })
    }

    async fn extract_frame(
        &self,
        config: &ExtractFrameConfig,
        inputs: &ResolvedInputs,
    ) -> Result<NodeOutput, NodeError> {
        let source = inputs
            .video_url
            .clone()
            .or_else(|| config.video_url.clone())
            .ok_or(NodeError::MissingInput("video"))?;

        let output = self.videos.extract_frame(&source, &config.timestamp).await?;

        Ok(NodeOutput::Frame {
            extracted_frame_url: output.extracted_frame_url,
        })
    }

    async fn text_to_image(
        &self,
        config: &GenerateConfig,
        inputs: &ResolvedInputs,
    ) -> Result<NodeOutput, NodeError> {
        let prompt = generation_prompt(config, inputs).ok_or(NodeError::MissingInput("prompt"))?;
        Ok(NodeOutput::Generated(
            self.generative.text_to_image(&prompt).await,
        ))
    }

    async fn text_to_video(
        &self,
        config: &GenerateConfig,
        inputs: &ResolvedInputs,
    ) -> Result<NodeOutput, NodeError> {
        let prompt = generation_prompt(config, inputs).ok_or(NodeError::MissingInput("prompt"))?;
        Ok(NodeOutput::Generated(
            self.generative.text_to_video(&prompt).await,
        ))
    }
}

impl std::fmt::Debug for Executors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executors")
            .field("completions", &self.completions)
            .finish_non_exhaustive()
    }
}

/// Prompt for the generative nodes: upstream text wins over configuration.
fn generation_prompt(config: &GenerateConfig, inputs: &ResolvedInputs) -> Option<String> {
    inputs
        .merged_text()
        .or_else(|| config.prompt.clone())
        .filter(|prompt| !prompt.trim().is_empty())
}

/// Evaluates the condition operator against the first upstream text.
///
/// Malformed operators degrade to a presence check; a condition node never
/// fails.
fn condition(config: &ConditionConfig, inputs: &ResolvedInputs) -> NodeOutput {
    let subject = inputs.texts.first().map(String::as_str).unwrap_or("");
    let expected = config.value.as_deref().unwrap_or("");

    let result = match config.condition.trim() {
        "equals" => subject == expected,
        "contains" => subject.contains(expected),
        "starts_with" => subject.starts_with(expected),
        "ends_with" => subject.ends_with(expected),
        _ => !subject.is_empty(),
    };

    NodeOutput::Condition { result }
}

fn loop_count(config: &LoopConfig) -> NodeOutput {
    NodeOutput::Loop {
        iterations: config.iterations.min(MAX_LOOP_ITERATIONS),
        completed: true,
    }
}

/// Concatenates the first `num_inputs` upstream outputs into an array.
fn merge(config: &MergeConfig, inputs: &ResolvedInputs) -> NodeOutput {
    let take = config
        .num_inputs
        .unwrap_or(inputs.upstream.len())
        .min(inputs.upstream.len());
    let merged: Vec<Value> = inputs.upstream.iter().take(take).cloned().collect();
    NodeOutput::Merge {
        merged: Value::Array(merged),
    }
}

/// Passes the single upstream output through unchanged.
fn output_passthrough(inputs: &ResolvedInputs) -> NodeOutput {
    NodeOutput::Raw(inputs.upstream.first().cloned().unwrap_or_else(|| json!({})))
}
