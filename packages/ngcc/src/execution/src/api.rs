use super::task_queue::TaskQueue;
use crate::error::NgccResult;
use crate::packages::{EntryPoint, EntryPointJsonProperty};
use serde::{Deserialize, Serialize};

/// One unit of work: compile one format of one entry-point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub entry_point: EntryPoint,
    pub format_property: EntryPointJsonProperty,
    /// Every property pointing at the same bundle as `format_property`.
    pub format_properties_to_mark_as_processed: Vec<EntryPointJsonProperty>,
    /// Whether this task also processes the typings of the entry-point.
    pub process_dts: bool,
}

impl Task {
    pub fn describe(&self) -> String {
        format!("{} : {}", self.entry_point.name, self.format_property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskProcessingOutcome {
    Processed,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    pub task: Task,
    pub message: String,
}

/// What happened to every task of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionSummary {
    pub processed: Vec<Task>,
    pub failed: Vec<TaskFailure>,
    /// Entry-points never compiled because a dependency failed.
    pub skipped: Vec<EntryPoint>,
}

/// The compilation step run for each task. The rendering itself lives outside this crate.
pub type CompileFn<'c> = dyn Fn(&Task) -> anyhow::Result<()> + Sync + 'c;

/// Runs the tasks of a queue, honouring its dependency constraints.
pub trait Executor {
    fn execute(&self, queue: TaskQueue, compile: &CompileFn<'_>) -> NgccResult<ExecutionSummary>;
}

/// Render a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
