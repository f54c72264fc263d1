/*!
 * Checks
 * The atomic predicates policies are built from
 *
 * A check comes in one of two capabilities:
 * - [`UserCheck`]: depends on the acting principal only, safe in any phase
 * - [`OperationCheck`]: depends on the candidate resource, the request and the
 *   pending change; runs in the operation or the commit phase
 */

pub mod prefab;
mod registry;

pub use registry::{CheckFactory, CheckRegistry};

use crate::permissions::context::{RequestScope, User};
use crate::permissions::types::{ChangeSpec, PersistentResource};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Check that only inspects the acting principal
pub trait UserCheck: Send + Sync {
    fn ok(&self, user: &User) -> bool;
}

/// Check that inspects the resource and the change being made
pub trait OperationCheck: Send + Sync {
    fn ok(
        &self,
        resource: &dyn PersistentResource,
        scope: &RequestScope,
        change: Option<&ChangeSpec>,
    ) -> bool;
}

/// Capability of a check, known without instantiating it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    User,
    Operation,
}

/// A runnable check instance
pub enum Check {
    User(Box<dyn UserCheck>),
    Operation(Box<dyn OperationCheck>),
}

impl Check {
    pub fn kind(&self) -> CheckKind {
        match self {
            Check::User(_) => CheckKind::User,
            Check::Operation(_) => CheckKind::Operation,
        }
    }
}

static NEXT_CHECK_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one registered check
///
/// Every registration gets a fresh id, so two configurations of the same
/// implementation type never share cached results. Aliases copy the id of
/// their target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckId {
    serial: u64,
    type_name: &'static str,
}

impl CheckId {
    /// Fresh identity for a registration of `C`
    pub fn new<C: 'static>() -> Self {
        Self {
            serial: NEXT_CHECK_ID.fetch_add(1, Ordering::Relaxed),
            type_name: std::any::type_name::<C>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_name, self.serial)
    }
}

/// Fresh check together with the name it was referenced by
pub struct CheckInstance {
    identifier: Arc<str>,
    id: CheckId,
    check: Check,
}

impl CheckInstance {
    pub(crate) fn new(identifier: Arc<str>, id: CheckId, check: Check) -> Self {
        Self {
            identifier,
            id,
            check,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn id(&self) -> CheckId {
        self.id
    }

    pub fn check(&self) -> &Check {
        &self.check
    }

    pub fn is_user_check(&self) -> bool {
        self.check.kind() == CheckKind::User
    }
}

impl fmt::Debug for CheckInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckInstance")
            .field("identifier", &self.identifier)
            .field("kind", &self.check.kind())
            .finish()
    }
}
