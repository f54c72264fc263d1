/*!
 * Permission Types
 * Core types shared by the compiler, builder and evaluator
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Kind of operation a policy guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    Read,
    Create,
    Update,
    Delete,
    Share,
}

impl PermissionKind {
    /// Every kind, in binding order
    pub const ALL: [PermissionKind; 5] = [
        PermissionKind::Read,
        PermissionKind::Create,
        PermissionKind::Delete,
        PermissionKind::Share,
        PermissionKind::Update,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Read => "read",
            PermissionKind::Create => "create",
            PermissionKind::Update => "update",
            PermissionKind::Delete => "delete",
            PermissionKind::Share => "share",
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Stable identity of a candidate resource, used in cache keys and failure reasons
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentity {
    pub resource_type: String,
    pub id: String,
}

impl ResourceIdentity {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.resource_type, self.id)
    }
}

static NEXT_CHANGE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one change descriptor; two descriptors never share an id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(u64);

impl ChangeId {
    fn next() -> Self {
        ChangeId(NEXT_CHANGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Description of a pending field mutation
///
/// A deserialized descriptor always receives a fresh id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSpec {
    #[serde(skip_deserializing, default = "ChangeId::next")]
    id: ChangeId,
    pub field: String,
    pub original: Value,
    pub modified: Value,
}

impl ChangeSpec {
    pub fn new(field: impl Into<String>, original: Value, modified: Value) -> Self {
        Self {
            id: ChangeId::next(),
            field: field.into(),
            original,
            modified,
        }
    }

    pub fn id(&self) -> ChangeId {
        self.id
    }

    /// Whether the change actually alters the value
    pub fn is_modification(&self) -> bool {
        self.original != self.modified
    }
}
