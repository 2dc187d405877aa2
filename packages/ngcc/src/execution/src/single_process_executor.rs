use super::api::{panic_message, CompileFn, ExecutionSummary, Executor, TaskProcessingOutcome};
use super::completion::TaskCompletion;
use super::task_queue::TaskQueue;
use crate::error::{NgccError, NgccResult};
use crate::ngtsc::logging::Logger;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Runs every task on the calling thread, one after the other.
pub struct SingleProcessExecutor<'a> {
    logger: &'a dyn Logger,
    error_on_failed_entry_point: bool,
}

impl<'a> SingleProcessExecutor<'a> {
    pub fn new(logger: &'a dyn Logger, error_on_failed_entry_point: bool) -> Self {
        Self {
            logger,
            error_on_failed_entry_point,
        }
    }
}

impl Executor for SingleProcessExecutor<'_> {
    fn execute(&self, mut queue: TaskQueue, compile: &CompileFn<'_>) -> NgccResult<ExecutionSummary> {
        self.logger.debug("Running ngcc on SingleProcessExecutor.");
        let completion = TaskCompletion::new(self.logger, self.error_on_failed_entry_point);
        let mut summary = ExecutionSummary::default();

        while let Some(task) = queue.get_next_task() {
            let (outcome, message) = match catch_unwind(AssertUnwindSafe(|| compile(&task))) {
                Ok(Ok(())) => (TaskProcessingOutcome::Processed, None),
                Ok(Err(error)) => (TaskProcessingOutcome::Failed, Some(format!("{:?}", error))),
                Err(payload) => (TaskProcessingOutcome::Failed, Some(panic_message(payload.as_ref()))),
            };
            completion.on_task_completed(&mut queue, &mut summary, task, outcome, message)?;
        }

        if !queue.all_tasks_completed() {
            return Err(NgccError::Deadlock {
                remaining: queue.pending_count(),
            });
        }
        Ok(summary)
    }
}
