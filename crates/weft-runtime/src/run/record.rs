//! Run outcome and persisted record types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{NodeResult, RunId};

/// Terminal status of a workflow run.
///
/// A run transitions `RUNNING → SUCCESS | FAILED` and never resumes.
/// Individual node failures do not flip the run to `FAILED`: they are
/// visible in the per-node results, while `FAILED` is reserved for
/// structural rejection and engine faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// The run is executing.
    Running,
    /// The per-node sweep completed.
    Success,
    /// The run aborted before completing the sweep.
    Failed,
}

/// Which part of the workflow a run executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunScope {
    /// The whole graph.
    #[default]
    Full,
    /// Only the nodes selected in the editor.
    Selected,
}

/// Aggregate outcome of one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    /// Terminal status of the run.
    pub status: RunStatus,
    /// Per-node results in execution order.
    pub results: Vec<NodeResult>,
    /// Top-level failure message, set only when the run aborted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Total run time in milliseconds.
    pub duration: u64,
}

impl RunOutcome {
    /// Creates a successful outcome.
    pub(crate) fn success(results: Vec<NodeResult>, duration: u64) -> Self {
        Self {
            status: RunStatus::Success,
            results,
            error: None,
            duration,
        }
    }

    /// Creates a failed outcome, keeping any partial results.
    pub(crate) fn failed(error: String, results: Vec<NodeResult>, duration: u64) -> Self {
        Self {
            status: RunStatus::Failed,
            results,
            error: Some(error),
            duration,
        }
    }
}

/// Persisted record of a workflow run.
///
/// The engine populates the record through a
/// [`RunStore`](crate::runtime::RunStore); durable storage is the caller's
/// concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// Id of the run.
    pub run_id: RunId,
    /// Current status.
    pub status: RunStatus,
    /// Requested execution scope.
    pub scope: RunScope,
    /// Per-node results, empty until the run completes.
    #[serde(default)]
    pub node_results: Vec<NodeResult>,
    /// Total run time in milliseconds, set on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// When the run was started.
    pub started_at: Timestamp,
    /// When the run reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Top-level failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    /// Creates a fresh `RUNNING` record.
    pub fn running(scope: RunScope) -> Self {
        Self {
            run_id: RunId::new(),
            status: RunStatus::Running,
            scope,
            node_results: Vec::new(),
            duration: None,
            started_at: Timestamp::now(),
            completed_at: None,
            error: None,
        }
    }

    /// Folds a terminal outcome into the record.
    pub fn complete(mut self, outcome: RunOutcome) -> Self {
        self.status = outcome.status;
        self.node_results = outcome.results;
        self.duration = Some(outcome.duration);
        self.completed_at = Some(Timestamp::now());
        self.error = outcome.error;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_strings() {
        assert_eq!(
            serde_json::to_value(RunStatus::Running).unwrap(),
            "RUNNING"
        );
        assert_eq!(
            serde_json::to_value(RunStatus::Success).unwrap(),
            "SUCCESS"
        );
        assert_eq!(serde_json::to_value(RunStatus::Failed).unwrap(), "FAILED");
        assert_eq!(serde_json::to_value(RunScope::Full).unwrap(), "FULL");
    }

    #[test]
    fn test_record_completion() {
        let record = RunRecord::running(RunScope::Full);
        assert_eq!(record.status, RunStatus::Running);
        assert!(record.completed_at.is_none());

        let outcome = RunOutcome::success(Vec::new(), 12);
        let record = record.complete(outcome);
        assert_eq!(record.status, RunStatus::Success);
        assert_eq!(record.duration, Some(12));
        assert!(record.completed_at.is_some());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_failed_outcome_keeps_partial_results() {
        let outcome = RunOutcome::failed("engine fault".into(), Vec::new(), 5);
        assert_eq!(outcome.status, RunStatus::Failed);
        assert_eq!(outcome.error.as_deref(), Some("engine fault"));
    }
}
