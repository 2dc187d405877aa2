use super::master::ClusterMaster;
use super::worker::run_worker;
use crate::error::{NgccError, NgccResult};
use crate::execution::api::{CompileFn, ExecutionSummary, Executor};
use crate::execution::task_queue::TaskQueue;
use crate::ngtsc::logging::Logger;

/// Runs tasks in parallel on a fixed pool of worker threads.
pub struct ClusterExecutor<'a> {
    logger: &'a dyn Logger,
    worker_count: usize,
    error_on_failed_entry_point: bool,
}

impl<'a> ClusterExecutor<'a> {
    pub fn new(logger: &'a dyn Logger, worker_count: usize, error_on_failed_entry_point: bool) -> Self {
        Self {
            logger,
            worker_count: worker_count.max(1),
            error_on_failed_entry_point,
        }
    }
}

impl Executor for ClusterExecutor<'_> {
    fn execute(&self, queue: TaskQueue, compile: &CompileFn<'_>) -> NgccResult<ExecutionSummary> {
        self.logger.debug(&format!(
            "Running ngcc on ClusterExecutor (using {} worker threads).",
            self.worker_count
        ));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_count)
            .thread_name(|i| format!("ngcc-worker-{}", i))
            .build()
            .map_err(|e| NgccError::WorkerCrashed {
                worker_id: 0,
                message: e.to_string(),
            })?;

        let master = ClusterMaster::new(
            self.logger,
            queue,
            self.worker_count,
            self.error_on_failed_entry_point,
        );
        pool.in_place_scope(|scope| {
            let (outbox, from_workers) = crossbeam_channel::unbounded();
            let mut to_workers = Vec::with_capacity(self.worker_count);
            for worker_id in 0..self.worker_count {
                let (inbox_tx, inbox) = crossbeam_channel::unbounded::<String>();
                to_workers.push(inbox_tx);
                let outbox = outbox.clone();
                scope.spawn(move |_| run_worker(worker_id, inbox, outbox, compile));
            }
            drop(outbox);

            // Closing the inboxes lets the workers drain and exit before the scope joins them.
            let result = master.run(&to_workers, &from_workers);
            drop(to_workers);
            result
        })
    }
}
