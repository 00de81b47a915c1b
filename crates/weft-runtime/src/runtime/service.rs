//! Runtime service facade.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::store::RunStore;
use crate::TRACING_TARGET;
use crate::engine::Engine;
use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::WorkflowGraph;
use crate::run::{RunId, RunOutcome, RunRecord, RunScope, RunStatus};

/// Request parameters for starting a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Which part of the workflow to execute.
    #[serde(default)]
    pub scope: RunScope,
}

/// Immediate response to a run request; the caller polls for the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    /// Id of the created run.
    pub run_id: RunId,
    /// Initial status, always `RUNNING`.
    pub status: RunStatus,
}

/// Runtime service that owns the engine and the run store.
///
/// Starting a run inserts a `RUNNING` record and returns immediately; the
/// graph executes on a background task and the record is updated to its
/// terminal status once the sweep finishes.
#[derive(Clone)]
pub struct RuntimeService {
    engine: Arc<Engine>,
    store: Arc<dyn RunStore>,
}

impl RuntimeService {
    /// Creates a service from an engine and a run store.
    pub fn new(engine: Engine, store: impl RunStore + 'static) -> Self {
        Self {
            engine: Arc::new(engine),
            store: Arc::new(store),
        }
    }

    /// Returns a reference to the underlying engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Starts a run in the background and returns its id immediately.
    pub async fn start(
        &self,
        graph: WorkflowGraph,
        request: RunRequest,
    ) -> WorkflowResult<RunResponse> {
        let record = RunRecord::running(request.scope);
        let run_id = record.run_id;
        self.store.insert(record).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            run_id = %run_id,
            node_count = graph.node_count(),
            "Run started"
        );

        let engine = Arc::clone(&self.engine);
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let run_task = tokio::spawn(async move { engine.run(&graph).await });
            // A panicked run task is an engine fault; the record still
            // reaches a terminal status instead of staying RUNNING forever.
            let outcome = match run_task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    RunOutcome::failed(format!("run task failed: {}", err), Vec::new(), 0)
                }
            };
            finish(store.as_ref(), run_id, outcome).await;
        });

        Ok(RunResponse {
            run_id,
            status: RunStatus::Running,
        })
    }

    /// Executes a run inline and returns the terminal record.
    pub async fn execute(
        &self,
        graph: &WorkflowGraph,
        request: RunRequest,
    ) -> WorkflowResult<RunRecord> {
        let record = RunRecord::running(request.scope);
        let run_id = record.run_id;
        self.store.insert(record).await?;

        let outcome = self.engine.run(graph).await;
        finish(self.store.as_ref(), run_id, outcome).await;

        self.store
            .get(run_id)
            .await?
            .ok_or_else(|| WorkflowError::Store(format!("run '{}' disappeared", run_id)))
    }

    /// Reads the record for `run_id`, if it exists.
    pub async fn get(&self, run_id: RunId) -> WorkflowResult<Option<RunRecord>> {
        self.store.get(run_id).await
    }
}

impl std::fmt::Debug for RuntimeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeService")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// Folds a terminal outcome into the stored record.
async fn finish(store: &dyn RunStore, run_id: RunId, outcome: RunOutcome) {
    let record = match store.get(run_id).await {
        Ok(Some(record)) => record.complete(outcome),
        Ok(None) => {
            tracing::error!(
                target: TRACING_TARGET,
                run_id = %run_id,
                "Run record vanished before completion"
            );
            return;
        }
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET,
                run_id = %run_id,
                error = %err,
                "Failed to load run record for completion"
            );
            return;
        }
    };

    if let Err(err) = store.update(record).await {
        tracing::error!(
            target: TRACING_TARGET,
            run_id = %run_id,
            error = %err,
            "Failed to persist run outcome"
        );
    }
}
