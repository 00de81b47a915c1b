//! Media processing job types.

use serde::{Deserialize, Serialize};

/// A processing operation submitted to the media backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum MediaOperation {
    /// Crop an image to an absolute pixel box.
    #[serde(rename_all = "camelCase")]
    Crop {
        /// URL of the source image.
        source_url: String,
        /// Left edge of the crop box.
        x: u32,
        /// Top edge of the crop box.
        y: u32,
        /// Crop box width.
        width: u32,
        /// Crop box height.
        height: u32,
    },

    /// Extract a single frame from a video.
    #[serde(rename_all = "camelCase")]
    ExtractFrame {
        /// URL of the source video.
        source_url: String,
        /// Seek position formatted `HH:MM:SS`.
        seek: String,
    },

    /// Generate an image from a text prompt.
    GenerateImage {
        /// The generation prompt.
        prompt: String,
    },

    /// Generate a video clip from a text prompt.
    GenerateVideo {
        /// The generation prompt.
        prompt: String,
    },
}

impl MediaOperation {
    /// Returns the operation name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Crop { .. } => "crop",
            Self::ExtractFrame { .. } => "extract_frame",
            Self::GenerateImage { .. } => "generate_image",
            Self::GenerateVideo { .. } => "generate_video",
        }
    }
}

/// Handle to a submitted processing job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobHandle {
    /// Backend-assigned job id.
    pub id: String,
    /// URL polled for job status.
    pub status_url: String,
}

/// State of a submitted processing job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobState {
    /// Still executing.
    Pending,

    /// Finished with a result asset.
    #[serde(rename_all = "camelCase")]
    Completed {
        /// URL of the produced asset.
        result_url: String,
    },

    /// Finished unsuccessfully.
    Failed {
        /// Backend-reported failure reason.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_serialization() {
        let operation = MediaOperation::Crop {
            source_url: "https://cdn.example.com/a.png".into(),
            x: 10,
            y: 20,
            width: 100,
            height: 50,
        };
        let value = serde_json::to_value(&operation).unwrap();
        assert_eq!(value["operation"], "crop");
        assert_eq!(value["sourceUrl"], "https://cdn.example.com/a.png");
        assert_eq!(value["width"], 100);
    }

    #[test]
    fn test_job_state_deserialization() {
        let state: JobState = serde_json::from_str(
            r#"{"status": "completed", "resultUrl": "https://cdn.example.com/out.png"}"#,
        )
        .unwrap();
        assert_eq!(
            state,
            JobState::Completed {
                result_url: "https://cdn.example.com/out.png".into()
            }
        );
    }
}
