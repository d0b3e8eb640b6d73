//! Bounded pool of delete executors shared by the whole sweep.
//!
//! `concurrency` workers drain one queue of the same capacity, so at most
//! `concurrency` deletions run at once and `submit` waits while the queue is
//! full. Every accepted task resolves its [`TaskHandle`] exactly once.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::{FailurePolicy, SweepConfig};
use crate::error::SweepError;
use crate::model::DeleteTask;
use crate::provider::ResourceProvider;
use crate::report::{ReportLine, ReportSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Reported but not deleted.
    DryRun,
    /// Dropped from the queue after the sweep was cancelled.
    Cancelled,
    /// Dropped from the queue after another task failed.
    Halted,
}

pub type TaskResult = Result<DeleteOutcome, SweepError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub concurrency: usize,
    pub dry_run: bool,
    /// Stop executing queued tasks once any deletion fails.
    pub halt_on_error: bool,
}

impl From<&SweepConfig> for PoolSettings {
    fn from(config: &SweepConfig) -> Self {
        Self {
            concurrency: config.concurrency(),
            dry_run: config.dry_run(),
            halt_on_error: config.failure_policy() == FailurePolicy::FailFast,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("sweep was cancelled")]
    Cancelled,
    #[error("worker pool halted after a failed deletion")]
    Halted,
}

struct QueuedTask {
    task: DeleteTask,
    done: oneshot::Sender<TaskResult>,
}

/// Completion handle of one accepted task.
#[derive(Debug)]
pub struct TaskHandle {
    task: DeleteTask,
    done: oneshot::Receiver<TaskResult>,
}

impl TaskHandle {
    pub fn task(&self) -> &DeleteTask {
        &self.task
    }

    /// A dropped sender means the executor died (panicked) holding the task,
    /// which fails the task like any other deletion error.
    pub async fn outcome(self) -> TaskResult {
        let Self { task, done } = self;
        done.await.unwrap_or_else(|_| {
            Err(SweepError::ExecutorLost {
                function: task.function,
                version: task.version,
            })
        })
    }
}

pub struct WorkerPool {
    queue: mpsc::Sender<QueuedTask>,
    workers: JoinSet<()>,
    halt: CancellationToken,
    cancel: CancellationToken,
}

impl WorkerPool {
    pub fn start<P>(
        settings: PoolSettings,
        provider: Arc<P>,
        report: Arc<dyn ReportSink>,
        cancel: CancellationToken,
    ) -> Self
    where
        P: ResourceProvider + ?Sized + 'static,
    {
        let concurrency = settings.concurrency.max(1);
        let (queue, receiver) = mpsc::channel(concurrency);
        let receiver = Arc::new(Mutex::new(receiver));
        let halt = CancellationToken::new();

        let mut workers = JoinSet::new();
        for worker_id in 0..concurrency {
            let worker = Worker {
                id: worker_id,
                queue: Arc::clone(&receiver),
                provider: Arc::clone(&provider),
                report: Arc::clone(&report),
                settings,
                halt: halt.clone(),
                cancel: cancel.clone(),
            };
            workers.spawn(worker.run());
        }

        Self {
            queue,
            workers,
            halt,
            cancel,
        }
    }

    /// Waits for queue space, then hands the task to the workers.
    pub async fn submit(&self, task: DeleteTask) -> Result<TaskHandle, SubmitError> {
        let (done_tx, done_rx) = oneshot::channel();
        let queued = QueuedTask {
            task: task.clone(),
            done: done_tx,
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SubmitError::Cancelled),
            _ = self.halt.cancelled() => Err(SubmitError::Halted),
            sent = self.queue.send(queued) => match sent {
                Ok(()) => Ok(TaskHandle { task, done: done_rx }),
                Err(_) => Err(SubmitError::Halted),
            },
        }
    }

    /// Stops execution of every task still queued.
    pub fn halt(&self) {
        self.halt.cancel();
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_cancelled()
    }

    /// Closes the queue and waits for every worker to drain it.
    pub async fn close(self) {
        let Self {
            queue, mut workers, ..
        } = self;
        drop(queue);

        while let Some(joined) = workers.join_next().await {
            if let Err(join_error) = joined {
                error!(error = %join_error, "delete worker terminated abnormally");
            }
        }
    }
}

struct Worker<P: ?Sized> {
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<QueuedTask>>>,
    provider: Arc<P>,
    report: Arc<dyn ReportSink>,
    settings: PoolSettings,
    halt: CancellationToken,
    cancel: CancellationToken,
}

impl<P: ResourceProvider + ?Sized> Worker<P> {
    async fn run(self) {
        loop {
            let next = {
                let mut queue = self.queue.lock().await;
                queue.recv().await
            };
            let Some(queued) = next else {
                break;
            };

            let result = self.execute(&queued.task).await;
            if result.is_err() && self.settings.halt_on_error {
                self.halt.cancel();
            }
            let _ = queued.done.send(result);
        }
        debug!(worker = self.id, "delete worker stopped");
    }

    async fn execute(&self, task: &DeleteTask) -> TaskResult {
        if self.halt.is_cancelled() {
            return Ok(DeleteOutcome::Halted);
        }
        if self.cancel.is_cancelled() {
            return Ok(DeleteOutcome::Cancelled);
        }

        let outcome = if self.settings.dry_run {
            DeleteOutcome::DryRun
        } else {
            // Started deletions run to completion even if the sweep is cancelled.
            match self
                .provider
                .delete_function_version(&task.function, &task.version)
                .await
            {
                Ok(()) => DeleteOutcome::Deleted,
                Err(_) if self.cancel.is_cancelled() => return Ok(DeleteOutcome::Cancelled),
                Err(source) => {
                    return Err(SweepError::Delete {
                        function: task.function.clone(),
                        version: task.version.clone(),
                        source,
                    });
                }
            }
        };

        debug!(
            worker = self.id,
            function = %task.function,
            version = %task.version,
            dry_run = self.settings.dry_run,
            "function version deleted"
        );
        self.report
            .record(ReportLine::delete(&task.function, &task.version));
        Ok(outcome)
    }
}

/// Settled results of the tasks submitted for one function.
#[derive(Debug, Default)]
pub struct Settled {
    /// Tasks that produced a `[DELETE]` line.
    pub reported: usize,
    /// Tasks discarded unrun after cancellation or a halt.
    pub dropped: usize,
    pub first_error: Option<SweepError>,
}

/// Result handles of one function's deletions. Waiting on it keeps that
/// function's report contiguous while the pool itself stays shared.
#[derive(Debug, Default)]
pub struct CompletionBarrier {
    pending: Vec<TaskHandle>,
}

impl CompletionBarrier {
    pub fn track(&mut self, handle: TaskHandle) {
        self.pending.push(handle);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Waits for every tracked task, keeping the first failure.
    pub async fn wait(self) -> Settled {
        let mut settled = Settled::default();
        for handle in self.pending {
            match handle.outcome().await {
                Ok(DeleteOutcome::Deleted | DeleteOutcome::DryRun) => settled.reported += 1,
                Ok(DeleteOutcome::Cancelled | DeleteOutcome::Halted) => settled.dropped += 1,
                Err(error) => {
                    if settled.first_error.is_none() {
                        settled.first_error = Some(error);
                    }
                }
            }
        }
        settled
    }
}
