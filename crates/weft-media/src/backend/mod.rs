//! Media processing backend interface and implementations.

mod http;
#[cfg(any(test, feature = "test-utils"))]
mod mock;

pub use http::HttpMediaBackend;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockJobScript, MockMediaBackend};

use bytes::Bytes;

use crate::error::MediaResult;
use crate::job::{JobHandle, JobState, MediaOperation};

/// An opaque media processing provider.
///
/// Processing is asynchronous on the provider side: submitting an operation
/// yields a job handle whose status is polled until it reaches a terminal
/// state (see [`crate::await_job`]).
#[async_trait::async_trait]
pub trait MediaBackend: Send + Sync {
    /// Downloads the asset at `url`.
    async fn fetch(&self, url: &str) -> MediaResult<Bytes>;

    /// Submits a processing operation and returns its job handle.
    async fn submit(&self, operation: &MediaOperation) -> MediaResult<JobHandle>;

    /// Reads the current state of a submitted job.
    async fn status(&self, handle: &JobHandle) -> MediaResult<JobState>;
}
