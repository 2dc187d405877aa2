//! What happens once a task reports back, shared by every executor.

use super::api::{ExecutionSummary, Task, TaskFailure, TaskProcessingOutcome};
use super::task_queue::TaskQueue;
use crate::error::{NgccError, NgccResult};
use crate::ngtsc::logging::Logger;

/// Records task outcomes and applies the failure policy.
///
/// Strict (`error_on_failed_entry_point`): the first failure aborts the run.
/// Lenient: the failure is logged and the entry-point's remaining formats and its dependants are skipped.
pub struct TaskCompletion<'a> {
    logger: &'a dyn Logger,
    error_on_failed_entry_point: bool,
}

impl<'a> TaskCompletion<'a> {
    pub fn new(logger: &'a dyn Logger, error_on_failed_entry_point: bool) -> Self {
        Self {
            logger,
            error_on_failed_entry_point,
        }
    }

    pub fn on_task_completed(
        &self,
        queue: &mut TaskQueue,
        summary: &mut ExecutionSummary,
        task: Task,
        outcome: TaskProcessingOutcome,
        message: Option<String>,
    ) -> NgccResult<()> {
        match outcome {
            TaskProcessingOutcome::Processed => {
                queue.mark_as_completed(&task);
                summary.processed.push(task);
                Ok(())
            }
            TaskProcessingOutcome::Failed => {
                let message = message.unwrap_or_default();
                if self.error_on_failed_entry_point {
                    queue.mark_as_failed(&task);
                    return Err(NgccError::TaskFailed {
                        entry_point: task.entry_point.name,
                        format_property: task.format_property.to_string(),
                        message,
                    });
                }

                self.logger.error(&format!(
                    "Failed to compile entry-point {} ({}) due to compilation errors:\n{}",
                    task.entry_point.name, task.format_property, message
                ));
                for skipped in queue.mark_as_failed(&task) {
                    self.logger.debug(&format!(
                        "Skipping processing of {} because its dependency {} failed to compile.",
                        skipped.name, task.entry_point.name
                    ));
                    summary.skipped.push(skipped);
                }
                summary.failed.push(TaskFailure { task, message });
                Ok(())
            }
        }
    }
}
