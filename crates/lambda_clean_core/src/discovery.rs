//! Discovery of the functions a sweep should visit.
//!
//! Two modes exist. Prefix mode pages through the whole function catalog.
//! Group mode walks a stack of groups depth-first, expanding nested groups in
//! place so member order is preserved. Both modes apply the same literal,
//! case-sensitive name prefix. A function reachable through several nested
//! groups is yielded once per path.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SweepError;
use crate::model::{FunctionName, GroupMember, MemberKind};
use crate::pagination::{unless_cancelled, Paginated};
use crate::provider::ResourceProvider;

struct GroupFrame {
    group: String,
    depth: usize,
    members: Paginated<GroupMember>,
}

impl GroupFrame {
    fn new(group: String, depth: usize) -> Self {
        Self {
            group,
            depth,
            members: Paginated::default(),
        }
    }
}

enum Source {
    Catalog(Paginated<FunctionName>),
    Groups {
        stack: Vec<GroupFrame>,
        max_depth: Option<usize>,
    },
}

pub struct DiscoveryStream<'a, P: ResourceProvider + ?Sized> {
    provider: &'a P,
    prefix: String,
    source: Source,
    cancel: CancellationToken,
}

impl<'a, P: ResourceProvider + ?Sized> DiscoveryStream<'a, P> {
    pub fn catalog(provider: &'a P, prefix: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            provider,
            prefix: prefix.into(),
            source: Source::Catalog(Paginated::default()),
            cancel,
        }
    }

    /// `max_depth` counts the root group as depth 1; `None` follows nesting
    /// to any depth.
    pub fn group(
        provider: &'a P,
        prefix: impl Into<String>,
        root: impl Into<String>,
        max_depth: Option<usize>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider,
            prefix: prefix.into(),
            source: Source::Groups {
                stack: vec![GroupFrame::new(root.into(), 1)],
                max_depth,
            },
            cancel,
        }
    }

    pub async fn next(&mut self) -> Result<Option<FunctionName>, SweepError> {
        match &mut self.source {
            Source::Catalog(pages) => {
                next_from_catalog(self.provider, &self.prefix, pages, &self.cancel).await
            }
            Source::Groups { stack, max_depth } => {
                next_from_groups(self.provider, &self.prefix, stack, *max_depth, &self.cancel)
                    .await
            }
        }
    }
}

async fn next_from_catalog<P: ResourceProvider + ?Sized>(
    provider: &P,
    prefix: &str,
    pages: &mut Paginated<FunctionName>,
    cancel: &CancellationToken,
) -> Result<Option<FunctionName>, SweepError> {
    loop {
        while let Some(function) = pages.pop() {
            if function.has_prefix(prefix) {
                return Ok(Some(function));
            }
        }

        let Some(cursor) = pages.next_request() else {
            return Ok(None);
        };

        debug!(cursor = ?cursor, "listing functions");
        let listed = unless_cancelled(cancel, provider.list_functions(cursor)).await;
        match listed {
            None => {
                pages.terminate();
                return Ok(None);
            }
            Some(Ok(page)) => pages.absorb(page),
            Some(Err(source)) => {
                pages.terminate();
                return Err(SweepError::ListFunctions { source });
            }
        }
    }
}

async fn next_from_groups<P: ResourceProvider + ?Sized>(
    provider: &P,
    prefix: &str,
    stack: &mut Vec<GroupFrame>,
    max_depth: Option<usize>,
    cancel: &CancellationToken,
) -> Result<Option<FunctionName>, SweepError> {
    loop {
        let Some(frame) = stack.last_mut() else {
            return Ok(None);
        };

        if let Some(member) = frame.members.pop() {
            let Some(physical_id) = member.physical_id else {
                continue;
            };
            match member.kind {
                MemberKind::Function => {
                    let function = FunctionName::new(physical_id);
                    if function.has_prefix(prefix) {
                        return Ok(Some(function));
                    }
                }
                MemberKind::Group => {
                    let depth = frame.depth + 1;
                    if let Some(limit) = max_depth.filter(|limit| depth > *limit) {
                        stack.clear();
                        return Err(SweepError::GroupDepthExceeded {
                            group: physical_id,
                            limit,
                        });
                    }
                    debug!(group = %physical_id, depth, "expanding nested stack");
                    stack.push(GroupFrame::new(physical_id, depth));
                }
                MemberKind::Other(_) => {}
            }
            continue;
        }

        let Some(cursor) = frame.members.next_request() else {
            stack.pop();
            continue;
        };

        debug!(group = %frame.group, cursor = ?cursor, "listing stack resources");
        let listed =
            unless_cancelled(cancel, provider.list_group_members(&frame.group, cursor)).await;
        match listed {
            None => {
                stack.clear();
                return Ok(None);
            }
            Some(Ok(page)) => frame.members.absorb(page),
            Some(Err(source)) => {
                let group = frame.group.clone();
                stack.clear();
                return Err(SweepError::ListGroupMembers { group, source });
            }
        }
    }
}
