use std::fmt;

use serde::{Deserialize, Serialize};

/// Versions whose identifier starts with this marker are aliases of the
/// unpublished code (`$LATEST`), never real published versions.
pub const ALIAS_VERSION_MARKER: char = '$';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionName(String);

impl FunctionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A published, immutable version of a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    /// Returns `None` for the alias marker, which is never a published version.
    pub fn published(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.starts_with(ALIAS_VERSION_MARKER) {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Retention {
    Keep,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionDecision {
    pub function: FunctionName,
    pub version: VersionId,
    pub retention: Retention,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTask {
    pub function: FunctionName,
    pub version: VersionId,
}

impl From<RetentionDecision> for DeleteTask {
    fn from(decision: RetentionDecision) -> Self {
        Self {
            function: decision.function,
            version: decision.version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Function,
    Group,
    /// Any other resource type, carried for logging only.
    Other(String),
}

/// One resource listed inside a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub kind: MemberKind,
    /// Absent while the provider has not created the resource yet.
    pub physical_id: Option<String>,
}

impl GroupMember {
    pub fn function(physical_id: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Function,
            physical_id: Some(physical_id.into()),
        }
    }

    pub fn group(physical_id: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Group,
            physical_id: Some(physical_id.into()),
        }
    }
}
