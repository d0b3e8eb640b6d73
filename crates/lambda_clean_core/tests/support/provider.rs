use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lambda_clean_core::model::GroupMember;
use lambda_clean_core::provider::Page;
use lambda_clean_core::{FunctionName, ProviderError, ResourceProvider, VersionId};
use tokio_util::sync::CancellationToken;

/// Scripted provider serving fixed pages; cursors are page indexes.
#[derive(Default)]
pub struct InMemoryProvider {
    catalog: Vec<Vec<String>>,
    groups: HashMap<String, Vec<Vec<GroupMember>>>,
    versions: HashMap<String, Vec<Vec<String>>>,
    failing_catalog: bool,
    failing_groups: HashSet<String>,
    failing_versions: HashSet<String>,
    failing_deletes: HashSet<(String, String)>,
    cancel_on_versions: Option<(String, CancellationToken)>,
    delete_limit: Option<usize>,
    delete_delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    deleted: Mutex<Vec<(String, String)>>,
    version_listings: Mutex<Vec<String>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog_pages(mut self, pages: &[&[&str]]) -> Self {
        self.catalog = pages
            .iter()
            .map(|page| page.iter().map(|name| name.to_string()).collect())
            .collect();
        self
    }

    pub fn with_group_pages(mut self, group: &str, pages: Vec<Vec<GroupMember>>) -> Self {
        self.groups.insert(group.to_string(), pages);
        self
    }

    pub fn with_version_pages(mut self, function: &str, pages: &[&[&str]]) -> Self {
        self.versions.insert(
            function.to_string(),
            pages
                .iter()
                .map(|page| page.iter().map(|version| version.to_string()).collect())
                .collect(),
        );
        self
    }

    /// One page holding `$LATEST` followed by versions `1..=count`, the way
    /// Lambda lists them.
    pub fn with_versions(mut self, function: &str, count: u32) -> Self {
        let mut page = vec!["$LATEST".to_string()];
        page.extend((1..=count).map(|n| n.to_string()));
        self.versions.insert(function.to_string(), vec![page]);
        self
    }

    pub fn failing_catalog(mut self) -> Self {
        self.failing_catalog = true;
        self
    }

    pub fn failing_group(mut self, group: &str) -> Self {
        self.failing_groups.insert(group.to_string());
        self
    }

    pub fn failing_versions(mut self, function: &str) -> Self {
        self.failing_versions.insert(function.to_string());
        self
    }

    pub fn failing_delete(mut self, function: &str, version: &str) -> Self {
        self.failing_deletes
            .insert((function.to_string(), version.to_string()));
        self
    }

    /// Cancels `token` while the versions of `function` are being listed.
    pub fn cancel_when_listing(mut self, function: &str, token: CancellationToken) -> Self {
        self.cancel_on_versions = Some((function.to_string(), token));
        self
    }

    /// Fails any delete call that would exceed `limit` concurrent calls.
    pub fn with_delete_limit(mut self, limit: usize, delay: Duration) -> Self {
        self.delete_limit = Some(limit);
        self.delete_delay = Some(delay);
        self
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().expect("poisoned mutex").clone()
    }

    pub fn version_listings(&self) -> Vec<String> {
        self.version_listings
            .lock()
            .expect("poisoned mutex")
            .clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

fn serve<T: Clone>(pages: &[Vec<T>], cursor: Option<&str>) -> Page<T> {
    let index = cursor
        .map(|value| value.parse::<usize>().expect("cursor is a page index"))
        .unwrap_or(0);
    let items = pages.get(index).cloned().unwrap_or_default();
    if index + 1 < pages.len() {
        Page::with_cursor(items, (index + 1).to_string())
    } else {
        Page::last(items)
    }
}

#[async_trait]
impl ResourceProvider for InMemoryProvider {
    async fn list_functions(
        &self,
        cursor: Option<&str>,
    ) -> Result<Page<FunctionName>, ProviderError> {
        if self.failing_catalog {
            return Err(ProviderError::new("ServiceException"));
        }
        let page = serve(&self.catalog, cursor);
        Ok(Page {
            items: page.items.into_iter().map(FunctionName::new).collect(),
            next_cursor: page.next_cursor,
        })
    }

    async fn list_group_members(
        &self,
        group: &str,
        cursor: Option<&str>,
    ) -> Result<Page<GroupMember>, ProviderError> {
        if self.failing_groups.contains(group) {
            return Err(ProviderError::new(format!("Stack with id {group} does not exist")));
        }
        let pages = self.groups.get(group).cloned().unwrap_or_default();
        Ok(serve(&pages, cursor))
    }

    async fn list_versions(
        &self,
        function: &FunctionName,
        cursor: Option<&str>,
    ) -> Result<Page<String>, ProviderError> {
        self.version_listings
            .lock()
            .expect("poisoned mutex")
            .push(function.to_string());

        if let Some((target, token)) = &self.cancel_on_versions {
            if target == function.as_str() {
                token.cancel();
            }
        }
        if self.failing_versions.contains(function.as_str()) {
            return Err(ProviderError::new("ResourceNotFoundException"));
        }
        let pages = self
            .versions
            .get(function.as_str())
            .cloned()
            .unwrap_or_default();
        Ok(serve(&pages, cursor))
    }

    async fn delete_function_version(
        &self,
        function: &FunctionName,
        version: &VersionId,
    ) -> Result<(), ProviderError> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let result = if self.delete_limit.is_some_and(|limit| in_flight > limit) {
            Err(ProviderError::new("TooManyRequestsException"))
        } else if self
            .failing_deletes
            .contains(&(function.to_string(), version.to_string()))
        {
            Err(ProviderError::new("ResourceConflictException"))
        } else {
            if let Some(delay) = self.delete_delay {
                tokio::time::sleep(delay).await;
            }
            self.deleted
                .lock()
                .expect("poisoned mutex")
                .push((function.to_string(), version.to_string()));
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
