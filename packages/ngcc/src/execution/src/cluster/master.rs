use super::api::{MessageFromWorker, MessageToWorker, WorkerEnvelope};
use crate::error::{NgccError, NgccResult};
use crate::execution::api::{ExecutionSummary, Task};
use crate::execution::completion::TaskCompletion;
use crate::execution::task_queue::TaskQueue;
use crate::ngtsc::logging::Logger;
use crossbeam_channel::{Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoordinatorState {
    /// Between events; decides whether there is anything left to do.
    Idle,
    /// Handing available tasks to idle workers.
    Dispatching,
    /// Waiting for a worker to report back.
    AwaitingCompletion,
    Finished,
}

/// Owns the task queue and drives the workers until every task is done.
pub struct ClusterMaster<'a> {
    logger: &'a dyn Logger,
    queue: TaskQueue,
    completion: TaskCompletion<'a>,
    /// The task each worker is busy with.
    assignments: Vec<Option<Task>>,
    summary: ExecutionSummary,
    state: CoordinatorState,
}

impl<'a> ClusterMaster<'a> {
    pub fn new(
        logger: &'a dyn Logger,
        queue: TaskQueue,
        worker_count: usize,
        error_on_failed_entry_point: bool,
    ) -> Self {
        Self {
            logger,
            queue,
            completion: TaskCompletion::new(logger, error_on_failed_entry_point),
            assignments: vec![None; worker_count],
            summary: ExecutionSummary::default(),
            state: CoordinatorState::Idle,
        }
    }

    /// Drive the run. `to_workers[i]` is the inbox of worker `i`; every reply arrives on `from_workers`.
    pub fn run(
        mut self,
        to_workers: &[Sender<String>],
        from_workers: &Receiver<WorkerEnvelope>,
    ) -> NgccResult<ExecutionSummary> {
        loop {
            self.state = match self.state {
                CoordinatorState::Idle => {
                    if self.queue.all_tasks_completed() {
                        CoordinatorState::Finished
                    } else {
                        CoordinatorState::Dispatching
                    }
                }
                CoordinatorState::Dispatching => {
                    self.dispatch(to_workers)?;
                    CoordinatorState::AwaitingCompletion
                }
                CoordinatorState::AwaitingCompletion => {
                    let (worker_id, raw) =
                        from_workers
                            .recv()
                            .map_err(|_| NgccError::WorkerCrashed {
                                worker_id: self.busy_worker().unwrap_or_default(),
                                message: "All workers exited before their tasks completed.".to_string(),
                            })?;
                    self.on_worker_message(worker_id, &raw)?;
                    CoordinatorState::Idle
                }
                CoordinatorState::Finished => return Ok(self.summary),
            };
        }
    }

    fn dispatch(&mut self, to_workers: &[Sender<String>]) -> NgccResult<()> {
        for worker_id in 0..self.assignments.len() {
            if self.assignments[worker_id].is_some() {
                continue;
            }
            let task = match self.queue.get_next_task() {
                Some(task) => task,
                None => break,
            };
            self.logger.debug(&format!(
                "Dispatching task {} to worker #{}.",
                task.describe(),
                worker_id
            ));
            let message = serde_json::to_string(&MessageToWorker::ProcessTask { task: task.clone() })
                .map_err(|e| NgccError::WorkerCrashed {
                    worker_id,
                    message: e.to_string(),
                })?;
            let inbox = to_workers.get(worker_id).ok_or_else(|| NgccError::WorkerCrashed {
                worker_id,
                message: "No such worker.".to_string(),
            })?;
            inbox.send(message).map_err(|_| NgccError::WorkerCrashed {
                worker_id,
                message: "The worker is no longer accepting tasks.".to_string(),
            })?;
            self.assignments[worker_id] = Some(task);
        }

        if self.busy_worker().is_none() {
            return Err(NgccError::Deadlock {
                remaining: self.queue.pending_count(),
            });
        }
        Ok(())
    }

    fn on_worker_message(&mut self, worker_id: usize, raw: &str) -> NgccResult<()> {
        let message: MessageFromWorker =
            serde_json::from_str(raw).map_err(|_| NgccError::WorkerMessage {
                worker_id,
                payload: raw.to_string(),
            })?;

        match message {
            MessageFromWorker::TaskCompleted { outcome, message } => {
                let task = self
                    .assignments
                    .get_mut(worker_id)
                    .and_then(Option::take)
                    .ok_or_else(|| NgccError::WorkerMessage {
                        worker_id,
                        payload: raw.to_string(),
                    })?;
                self.completion
                    .on_task_completed(&mut self.queue, &mut self.summary, task, outcome, message)
            }
            MessageFromWorker::Error { error } => Err(NgccError::WorkerCrashed {
                worker_id,
                message: error,
            }),
        }
    }

    fn busy_worker(&self) -> Option<usize> {
        self.assignments.iter().position(Option::is_some)
    }
}
