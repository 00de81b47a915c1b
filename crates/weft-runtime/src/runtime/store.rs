//! Run record persistence boundary.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::{WorkflowError, WorkflowResult};
use crate::run::{RunId, RunRecord};

/// Persistence boundary for run records.
///
/// The engine reads a graph and reports results; durable storage of the
/// records is the caller's concern behind this trait.
#[async_trait::async_trait]
pub trait RunStore: Send + Sync {
    /// Inserts a new record.
    async fn insert(&self, record: RunRecord) -> WorkflowResult<()>;

    /// Replaces an existing record.
    async fn update(&self, record: RunRecord) -> WorkflowResult<()>;

    /// Reads a record by run id.
    async fn get(&self, run_id: RunId) -> WorkflowResult<Option<RunRecord>>;
}

/// In-memory run store, suitable for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    records: RwLock<HashMap<RunId, RunRecord>>,
}

impl InMemoryRunStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl RunStore for InMemoryRunStore {
    async fn insert(&self, record: RunRecord) -> WorkflowResult<()> {
        self.records.write().await.insert(record.run_id, record);
        Ok(())
    }

    async fn update(&self, record: RunRecord) -> WorkflowResult<()> {
        let mut records = self.records.write().await;
        if !records.contains_key(&record.run_id) {
            return Err(WorkflowError::Store(format!(
                "unknown run '{}'",
                record.run_id
            )));
        }
        records.insert(record.run_id, record);
        Ok(())
    }

    async fn get(&self, run_id: RunId) -> WorkflowResult<Option<RunRecord>> {
        Ok(self.records.read().await.get(&run_id).cloned())
    }
}
