//! Bounded polling for asynchronous media jobs.

use std::time::Duration;

use crate::TRACING_TARGET;
use crate::backend::MediaBackend;
use crate::job::{JobHandle, JobState};

/// Pacing for job status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between consecutive status checks.
    pub interval: Duration,
    /// Maximum number of status checks before giving up.
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

/// Outcome of polling a job to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job finished and produced a result asset.
    Completed(String),
    /// The job failed on the backend.
    Failed(String),
    /// The job did not reach a terminal state within the attempt budget.
    TimedOut,
}

/// Polls `handle` until it reaches a terminal state or the attempt budget
/// is exhausted.
///
/// Returns a tagged outcome instead of an error so callers can decide
/// whether a timeout is a hard failure or a soft-fail placeholder
/// opportunity. Transient status-check errors count against the attempt
/// budget rather than aborting the poll.
pub async fn await_job(
    backend: &dyn MediaBackend,
    handle: &JobHandle,
    settings: PollSettings,
) -> PollOutcome {
    for attempt in 0..settings.max_attempts {
        if attempt > 0 {
            tokio::time::sleep(settings.interval).await;
        }

        match backend.status(handle).await {
            Ok(JobState::Completed { result_url }) => return PollOutcome::Completed(result_url),
            Ok(JobState::Failed { reason }) => return PollOutcome::Failed(reason),
            Ok(JobState::Pending) => {}
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    job_id = %handle.id,
                    attempt,
                    error = %err,
                    "Job status check failed"
                );
            }
        }
    }

    PollOutcome::TimedOut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockJobScript, MockMediaBackend};
    use crate::job::MediaOperation;

    fn fast_poll() -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(1),
            max_attempts: 5,
        }
    }

    #[tokio::test]
    async fn test_completes_after_pending_polls() {
        let backend = MockMediaBackend::new().with_script(MockJobScript::Complete {
            result_url: "https://cdn.example.com/out.png".into(),
            pending_polls: 3,
        });
        let handle = backend
            .submit(&MediaOperation::GenerateImage { prompt: "x".into() })
            .await
            .unwrap();

        let outcome = await_job(&backend, &handle, fast_poll()).await;
        assert_eq!(
            outcome,
            PollOutcome::Completed("https://cdn.example.com/out.png".into())
        );
    }

    #[tokio::test]
    async fn test_times_out_when_job_stalls() {
        let backend = MockMediaBackend::new().with_script(MockJobScript::Stall);
        let handle = backend
            .submit(&MediaOperation::GenerateImage { prompt: "x".into() })
            .await
            .unwrap();

        let outcome = await_job(&backend, &handle, fast_poll()).await;
        assert_eq!(outcome, PollOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_reports_job_failure() {
        let backend = MockMediaBackend::new().with_script(MockJobScript::Fail {
            reason: "unsupported codec".into(),
        });
        let handle = backend
            .submit(&MediaOperation::ExtractFrame {
                source_url: "https://cdn.example.com/v.mp4".into(),
                seek: "00:00:05".into(),
            })
            .await
            .unwrap();

        let outcome = await_job(&backend, &handle, fast_poll()).await;
        assert_eq!(outcome, PollOutcome::Failed("unsupported codec".into()));
    }
}
