//! Mock media backend for testing.
//!
//! In-memory backend with scripted job outcomes and canned fetch bodies.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! weft-media = { version = "...", features = ["test-utils"] }
//! ```

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;

use super::MediaBackend;
use crate::error::{MediaError, MediaResult};
use crate::job::{JobHandle, JobState, MediaOperation};

/// Scripted outcome for submitted mock jobs.
#[derive(Debug, Clone)]
pub enum MockJobScript {
    /// Complete with `result_url` after reporting pending `pending_polls` times.
    Complete {
        /// URL returned in the terminal state.
        result_url: String,
        /// Number of pending states reported before completion.
        pending_polls: u32,
    },
    /// Fail with the given reason.
    Fail {
        /// Backend-reported failure reason.
        reason: String,
    },
    /// Never reach a terminal state.
    Stall,
}

struct MockJob {
    script: MockJobScript,
    polls: u32,
}

/// Mock media backend for unit and integration tests.
pub struct MockMediaBackend {
    script: MockJobScript,
    fail_submit: Option<String>,
    fetch_bodies: Mutex<HashMap<String, Bytes>>,
    jobs: Mutex<HashMap<String, MockJob>>,
    submissions: Mutex<Vec<MediaOperation>>,
    next_id: AtomicU64,
}

impl Default for MockMediaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMediaBackend {
    /// Creates a mock backend whose jobs complete immediately.
    pub fn new() -> Self {
        Self {
            script: MockJobScript::Complete {
                result_url: "https://cdn.example.com/result.png".into(),
                pending_polls: 0,
            },
            fail_submit: None,
            fetch_bodies: Mutex::new(HashMap::new()),
            jobs: Mutex::new(HashMap::new()),
            submissions: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Sets the script applied to every submitted job.
    pub fn with_script(mut self, script: MockJobScript) -> Self {
        self.script = script;
        self
    }

    /// Makes every submission fail with the given reason.
    pub fn failing_submit(mut self, reason: impl Into<String>) -> Self {
        self.fail_submit = Some(reason.into());
        self
    }

    /// Registers a canned body returned by [`MediaBackend::fetch`] for `url`.
    pub fn with_fetch_body(self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.fetch_bodies.lock().unwrap().insert(url.into(), body.into());
        self
    }

    /// Returns the operations submitted so far.
    pub fn submissions(&self) -> Vec<MediaOperation> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MediaBackend for MockMediaBackend {
    async fn fetch(&self, url: &str) -> MediaResult<Bytes> {
        self.fetch_bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| MediaError::Backend(format!("no canned body for '{}'", url)))
    }

    async fn submit(&self, operation: &MediaOperation) -> MediaResult<JobHandle> {
        self.submissions.lock().unwrap().push(operation.clone());

        if let Some(reason) = &self.fail_submit {
            return Err(MediaError::Backend(reason.clone()));
        }

        let id = format!("job-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.jobs.lock().unwrap().insert(
            id.clone(),
            MockJob {
                script: self.script.clone(),
                polls: 0,
            },
        );

        Ok(JobHandle {
            status_url: format!("mock://jobs/{}", id),
            id,
        })
    }

    async fn status(&self, handle: &JobHandle) -> MediaResult<JobState> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get_mut(&handle.id)
            .ok_or_else(|| MediaError::Backend(format!("unknown job '{}'", handle.id)))?;

        job.polls += 1;
        let state = match &job.script {
            MockJobScript::Complete {
                result_url,
                pending_polls,
            } => {
                if job.polls > *pending_polls {
                    JobState::Completed {
                        result_url: result_url.clone(),
                    }
                } else {
                    JobState::Pending
                }
            }
            MockJobScript::Fail { reason } => JobState::Failed {
                reason: reason.clone(),
            },
            MockJobScript::Stall => JobState::Pending,
        };
        Ok(state)
    }
}
