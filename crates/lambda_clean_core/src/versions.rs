use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SweepError;
use crate::model::{FunctionName, VersionId};
use crate::pagination::{unless_cancelled, Paginated};
use crate::provider::ResourceProvider;

/// Lazy, oldest-first listing of one function's published versions.
pub struct VersionStream<'a, P: ResourceProvider + ?Sized> {
    provider: &'a P,
    function: FunctionName,
    pages: Paginated<String>,
    cancel: CancellationToken,
}

impl<'a, P: ResourceProvider + ?Sized> VersionStream<'a, P> {
    pub fn new(provider: &'a P, function: FunctionName, cancel: CancellationToken) -> Self {
        Self {
            provider,
            function,
            pages: Paginated::default(),
            cancel,
        }
    }

    pub fn function(&self) -> &FunctionName {
        &self.function
    }

    /// Next published version, `Ok(None)` at the end of the listing or once
    /// the sweep is cancelled.
    pub async fn next(&mut self) -> Result<Option<VersionId>, SweepError> {
        loop {
            while let Some(raw) = self.pages.pop() {
                if let Some(version) = VersionId::published(raw) {
                    return Ok(Some(version));
                }
            }

            let Some(cursor) = self.pages.next_request() else {
                return Ok(None);
            };

            debug!(function = %self.function, cursor = ?cursor, "listing function versions");
            let listed = unless_cancelled(
                &self.cancel,
                self.provider.list_versions(&self.function, cursor),
            )
            .await;

            match listed {
                None => {
                    self.pages.terminate();
                    return Ok(None);
                }
                Some(Ok(page)) => self.pages.absorb(page),
                Some(Err(source)) => {
                    self.pages.terminate();
                    return Err(SweepError::ListVersions {
                        function: self.function.clone(),
                        source,
                    });
                }
            }
        }
    }
}
