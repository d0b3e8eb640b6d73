use async_trait::async_trait;

use crate::error::ProviderError;
use crate::model::{FunctionName, GroupMember, VersionId};

/// One page of a paginated listing. `next_cursor` is `None` on the last page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    pub fn with_cursor(items: Vec<T>, next_cursor: impl Into<String>) -> Self {
        Self {
            items,
            next_cursor: Some(next_cursor.into()),
        }
    }
}

/// Cloud API the sweep runs against.
///
/// Cursors are opaque: callers pass back exactly what the previous page
/// returned and never construct one themselves.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    async fn list_functions(&self, cursor: Option<&str>)
        -> Result<Page<FunctionName>, ProviderError>;

    async fn list_group_members(
        &self,
        group: &str,
        cursor: Option<&str>,
    ) -> Result<Page<GroupMember>, ProviderError>;

    /// Lists versions oldest first, including the alias marker; callers
    /// filter it out.
    async fn list_versions(
        &self,
        function: &FunctionName,
        cursor: Option<&str>,
    ) -> Result<Page<String>, ProviderError>;

    async fn delete_function_version(
        &self,
        function: &FunctionName,
        version: &VersionId,
    ) -> Result<(), ProviderError>;
}
