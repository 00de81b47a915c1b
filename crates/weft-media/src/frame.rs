//! Video frame extraction.

use std::sync::Arc;

use crate::TRACING_TARGET;
use crate::backend::MediaBackend;
use crate::error::{MediaError, MediaResult};
use crate::job::MediaOperation;
use crate::poll::{PollOutcome, PollSettings, await_job};

/// A parsed frame timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Seek {
    /// Absolute position in seconds.
    Seconds(f64),
    /// Percentage of the clip duration.
    Percent(f64),
}

impl Seek {
    /// Parses a timestamp string: `"12.5"` is seconds, `"40%"` a percentage.
    ///
    /// Malformed input parses as second zero rather than erroring; a bad
    /// timestamp is not a reason to fail the node.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if let Some(percent) = trimmed.strip_suffix('%') {
            return Self::Percent(percent.trim().parse().unwrap_or(0.0));
        }
        Self::Seconds(trimmed.parse().unwrap_or(0.0))
    }

    /// Resolves to absolute seconds.
    ///
    /// Percentages need the clip duration; when it is unknown the seek
    /// falls back to the clip start.
    pub fn resolve(&self, duration: Option<f64>) -> f64 {
        match self {
            Self::Seconds(s) => s.max(0.0),
            Self::Percent(p) => match duration {
                Some(d) => (p.clamp(0.0, 100.0) / 100.0) * d,
                None => 0.0,
            },
        }
    }
}

/// Formats seconds as an `HH:MM:SS` seek string.
pub fn format_seek(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Result of a frame extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutput {
    /// URL of the extracted frame asset.
    pub extracted_frame_url: String,
}

/// Video processing service backed by a media backend.
#[derive(Clone)]
pub struct VideoService {
    backend: Arc<dyn MediaBackend>,
    poll: PollSettings,
}

impl VideoService {
    /// Creates a new service with default poll pacing.
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            poll: PollSettings::default(),
        }
    }

    /// Sets the job polling pace.
    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Extracts a single frame from the video at `source_url`.
    pub async fn extract_frame(&self, source_url: &str, timestamp: &str) -> MediaResult<FrameOutput> {
        let seek = format_seek(Seek::parse(timestamp).resolve(None));

        tracing::debug!(
            target: TRACING_TARGET,
            source_url,
            timestamp,
            seek = %seek,
            "Submitting frame extraction"
        );

        let operation = MediaOperation::ExtractFrame {
            source_url: source_url.to_string(),
            seek,
        };
        let handle = self.backend.submit(&operation).await?;

        match await_job(self.backend.as_ref(), &handle, self.poll).await {
            PollOutcome::Completed(result_url) => Ok(FrameOutput {
                extracted_frame_url: result_url,
            }),
            PollOutcome::Failed(reason) => Err(MediaError::Job { reason }),
            PollOutcome::TimedOut => Err(MediaError::JobTimeout),
        }
    }
}
