//! Run records and per-node results.
//!
//! - [`RunId`]: unique identifier for one workflow run
//! - [`NodeResult`] / [`NodeStatus`]: append-only per-node outcomes
//! - [`RunOutcome`] / [`RunStatus`]: the engine's aggregate verdict
//! - [`RunRecord`] / [`RunScope`]: the persisted run record shape

mod id;
mod record;
mod result;

pub use id::RunId;
pub use record::{RunOutcome, RunRecord, RunScope, RunStatus};
pub use result::{NodeResult, NodeStatus};
