use super::api::{MessageFromWorker, MessageToWorker, WorkerEnvelope};
use crate::execution::api::{panic_message, CompileFn, TaskProcessingOutcome};
use crossbeam_channel::{Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Process tasks from `inbox` until it is closed, reporting each outcome to `outbox`.
///
/// Compilation errors and panics become `failed` outcomes. A message the worker cannot
/// understand is answered with an `error` message, after which the worker stops.
pub fn run_worker(
    worker_id: usize,
    inbox: Receiver<String>,
    outbox: Sender<WorkerEnvelope>,
    compile: &CompileFn<'_>,
) {
    for raw in inbox.iter() {
        let (reply, keep_going) = match serde_json::from_str::<MessageToWorker>(&raw) {
            Ok(MessageToWorker::ProcessTask { task }) => {
                let reply = match catch_unwind(AssertUnwindSafe(|| compile(&task))) {
                    Ok(Ok(())) => MessageFromWorker::TaskCompleted {
                        outcome: TaskProcessingOutcome::Processed,
                        message: None,
                    },
                    Ok(Err(error)) => MessageFromWorker::TaskCompleted {
                        outcome: TaskProcessingOutcome::Failed,
                        message: Some(format!("{:?}", error)),
                    },
                    Err(payload) => MessageFromWorker::TaskCompleted {
                        outcome: TaskProcessingOutcome::Failed,
                        message: Some(panic_message(payload.as_ref())),
                    },
                };
                (reply, true)
            }
            Err(error) => (
                MessageFromWorker::Error {
                    error: format!("Invalid message received by worker #{}: {} ({})", worker_id, raw, error),
                },
                false,
            ),
        };

        let sent = serde_json::to_string(&reply)
            .map_or(false, |json| outbox.send((worker_id, json)).is_ok());
        if !sent || !keep_going {
            return;
        }
    }
}
