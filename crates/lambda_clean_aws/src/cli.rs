use std::future::Future;

use clap::Parser;
use lambda_clean_core::config::{DEFAULT_CONCURRENCY, DEFAULT_NUM_TO_KEEP};
use lambda_clean_core::SweepRequest;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Exit status after a second interrupt, as a shell reports SIGINT.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Parser)]
#[command(
    name = "lambda-clean",
    about = "Delete old Lambda function versions, keeping the newest ones",
    long_about = "Deletes published versions of every Lambda function whose name starts with\n\
                  the given prefix, keeping only the most recent ones. Functions can also be\n\
                  discovered through a CloudFormation stack and its nested stacks."
)]
pub struct Cli {
    /// Function name prefix (exact, case-sensitive)
    pub prefix: String,
    /// AWS Region (default from local configuration)
    #[arg(short, long)]
    pub region: Option<String>,
    /// Name or ID of the CloudFormation stack to which a function belongs
    #[arg(short, long, visible_alias = "group")]
    pub stack: Option<String>,
    /// Number of latest versions to keep; older versions are deleted
    #[arg(short = 'n', long, visible_alias = "keep", default_value_t = DEFAULT_NUM_TO_KEEP)]
    pub num_to_keep: usize,
    /// Number of delete requests that can be performed concurrently
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
    /// Report what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,
    /// Skip a function whose versions cannot be listed or deleted instead of aborting
    #[arg(long)]
    pub continue_on_error: bool,
    /// Maximum nesting depth followed when expanding stacks (unlimited by default)
    #[arg(long)]
    pub max_stack_depth: Option<usize>,
}

impl Cli {
    pub fn sweep_request(&self) -> SweepRequest {
        SweepRequest {
            prefix: self.prefix.clone(),
            stack: self.stack.clone(),
            num_to_keep: self.num_to_keep,
            concurrency: self.concurrency,
            dry_run: self.dry_run,
            continue_on_error: self.continue_on_error,
            max_stack_depth: self.max_stack_depth,
        }
    }
}

/// Cancels `cancel` on the first Ctrl-C and exits the process on the second.
pub fn cancel_on_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        let interrupted = || async { tokio::signal::ctrl_c().await.is_ok() };
        if watch_interrupts(interrupted, cancel).await {
            warn!("second interrupt received, exiting without waiting for deletions");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });
}

/// Returns `true` once a second interrupt arrives after the first one
/// cancelled the sweep.
async fn watch_interrupts<F, Fut>(mut interrupted: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    if !interrupted().await {
        return false;
    }
    info!("interrupt received, stopping sweep; interrupt again to exit immediately");
    cancel.cancel();

    interrupted().await
}
