use crate::execution::api::{Task, TaskProcessingOutcome};
use serde::{Deserialize, Serialize};

/// Coordinator to worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessageToWorker {
    ProcessTask { task: Task },
}

/// Worker to coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessageFromWorker {
    TaskCompleted {
        outcome: TaskProcessingOutcome,
        #[serde(default)]
        message: Option<String>,
    },
    Error {
        error: String,
    },
}

/// A raw message tagged with the id of the worker that sent it.
pub type WorkerEnvelope = (usize, String);
