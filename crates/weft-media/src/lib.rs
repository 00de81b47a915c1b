#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod backend;
mod config;
mod crop;
mod error;
mod frame;
mod generate;
mod job;
mod poll;

pub use config::MediaConfig;
pub use crop::{CropBox, CropOutput, CropRegion, ImageService, crop_box};
pub use error::{MediaError, MediaResult};
pub use frame::{FrameOutput, Seek, VideoService, format_seek};
pub use generate::{GeneratedAsset, GenerativeService};
pub use job::{JobHandle, JobState, MediaOperation};
pub use poll::{PollOutcome, PollSettings, await_job};

/// Tracing target for media provider operations.
pub const TRACING_TARGET: &str = "weft_media";
