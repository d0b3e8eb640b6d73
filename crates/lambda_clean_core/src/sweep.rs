//! Sweep orchestration.
//!
//! Functions are processed one at a time: list versions through the
//! retention window, submit evictions to the shared pool, wait for this
//! function's deletions, then report its kept versions. Deletions of one
//! function overlap with nothing but each other; the pool bound is global.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{FailurePolicy, SweepConfig};
use crate::discovery::DiscoveryStream;
use crate::error::SweepError;
use crate::model::{DeleteTask, FunctionName};
use crate::provider::ResourceProvider;
use crate::report::{ReportLine, ReportSink};
use crate::retention::RetentionWindow;
use crate::versions::VersionStream;
use crate::worker_pool::{CompletionBarrier, PoolSettings, SubmitError, WorkerPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepState {
    Discovering,
    ProcessingFunction,
    Done,
    Aborted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub functions_processed: usize,
    pub functions_failed: usize,
    /// Versions reported as deleted; nothing was removed when `dry_run` is set.
    pub versions_deleted: usize,
    pub versions_kept: usize,
    pub dry_run: bool,
    pub cancelled: bool,
}

enum FunctionOutcome {
    Completed,
    Cancelled,
}

pub struct Sweeper<P: ?Sized> {
    provider: Arc<P>,
    config: SweepConfig,
    report: Arc<dyn ReportSink>,
    cancel: CancellationToken,
}

impl<P: ResourceProvider + ?Sized + 'static> Sweeper<P> {
    pub fn new(
        provider: Arc<P>,
        config: SweepConfig,
        report: Arc<dyn ReportSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider,
            config,
            report,
            cancel,
        }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Runs the sweep to completion. Cancellation ends it early with
    /// `cancelled` set in the summary rather than an error.
    pub async fn run(self) -> Result<SweepSummary, SweepError> {
        info!(
            prefix = self.config.prefix(),
            stack = self.config.group(),
            keep = self.config.keep(),
            concurrency = self.config.concurrency(),
            dry_run = self.config.dry_run(),
            "starting version sweep"
        );

        let pool = WorkerPool::start(
            PoolSettings::from(&self.config),
            Arc::clone(&self.provider),
            Arc::clone(&self.report),
            self.cancel.clone(),
        );

        let mut summary = SweepSummary {
            dry_run: self.config.dry_run(),
            ..SweepSummary::default()
        };
        let mut state = SweepState::Discovering;
        let result = self.sweep(&pool, &mut summary, &mut state).await;

        if result.is_err() {
            pool.halt();
        }
        pool.close().await;

        match result {
            Ok(()) => {
                summary.cancelled |= self.cancel.is_cancelled();
                let terminal = if summary.cancelled {
                    SweepState::Aborted
                } else {
                    SweepState::Done
                };
                transition(&mut state, terminal);
                info!(
                    functions_processed = summary.functions_processed,
                    functions_failed = summary.functions_failed,
                    versions_deleted = summary.versions_deleted,
                    versions_kept = summary.versions_kept,
                    dry_run = summary.dry_run,
                    cancelled = summary.cancelled,
                    "version sweep finished"
                );
                Ok(summary)
            }
            Err(sweep_error) => {
                transition(&mut state, SweepState::Aborted);
                error!(error = %sweep_error, "version sweep aborted");
                Err(sweep_error)
            }
        }
    }

    async fn sweep(
        &self,
        pool: &WorkerPool,
        summary: &mut SweepSummary,
        state: &mut SweepState,
    ) -> Result<(), SweepError> {
        let provider = &*self.provider;
        let mut discovery = match self.config.group() {
            Some(group) => DiscoveryStream::group(
                provider,
                self.config.prefix(),
                group,
                self.config.max_group_depth(),
                self.cancel.clone(),
            ),
            None => DiscoveryStream::catalog(provider, self.config.prefix(), self.cancel.clone()),
        };

        while let Some(function) = discovery.next().await? {
            transition(state, SweepState::ProcessingFunction);
            match self.process_function(pool, &function, summary).await {
                Ok(FunctionOutcome::Completed) => summary.functions_processed += 1,
                Ok(FunctionOutcome::Cancelled) => {
                    summary.cancelled = true;
                    return Ok(());
                }
                Err(function_error) => match self.config.failure_policy() {
                    FailurePolicy::FailFast => return Err(function_error),
                    FailurePolicy::SkipFunction => {
                        warn!(
                            function = %function,
                            error = %function_error,
                            "skipping function after failure"
                        );
                        summary.functions_failed += 1;
                    }
                },
            }
            transition(state, SweepState::Discovering);
        }

        Ok(())
    }

    async fn process_function(
        &self,
        pool: &WorkerPool,
        function: &FunctionName,
        summary: &mut SweepSummary,
    ) -> Result<FunctionOutcome, SweepError> {
        let mut versions =
            VersionStream::new(&*self.provider, function.clone(), self.cancel.clone());
        let mut window = RetentionWindow::new(function.clone(), self.config.keep());
        let mut barrier = CompletionBarrier::default();

        let listing = loop {
            let version = match versions.next().await {
                Ok(Some(version)) => version,
                Ok(None) => break Ok(()),
                Err(list_error) => break Err(list_error),
            };
            let Some(evicted) = window.push(version) else {
                continue;
            };

            match pool.submit(DeleteTask::from(evicted)).await {
                Ok(handle) => barrier.track(handle),
                Err(SubmitError::Cancelled) => break Ok(()),
                Err(SubmitError::Halted) => {
                    break Err(SweepError::PoolHalted {
                        function: function.clone(),
                    })
                }
            }
        };

        // Under fail-fast a listing failure ends the sweep without waiting;
        // the caller halts the pool.
        if matches!(listing, Err(SweepError::ListVersions { .. }))
            && self.config.failure_policy() == FailurePolicy::FailFast
        {
            return listing.map(|()| FunctionOutcome::Completed);
        }

        debug!(function = %function, pending = barrier.len(), "waiting for deletions");
        let settled = barrier.wait().await;
        summary.versions_deleted += settled.reported;
        debug!(
            function = %function,
            reported = settled.reported,
            dropped = settled.dropped,
            "deletions settled"
        );

        // A failed deletion explains a halted pool, so it takes precedence.
        if let Some(delete_error) = settled.first_error {
            return Err(delete_error);
        }
        listing?;

        if self.cancel.is_cancelled() {
            return Ok(FunctionOutcome::Cancelled);
        }

        let kept = window.finish();
        summary.versions_kept += kept.len();
        for decision in kept {
            self.report.record(ReportLine::from(decision));
        }
        Ok(FunctionOutcome::Completed)
    }
}

fn transition(state: &mut SweepState, next: SweepState) {
    if *state != next {
        debug!(from = ?*state, to = ?next, "sweep state changed");
        *state = next;
    }
}
