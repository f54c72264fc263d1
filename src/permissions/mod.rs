/*!
 * Permissions Module
 * Policy compilation, permission binding and three-valued authorization decisions
 *
 * ## Features
 * - Boolean policy expressions over named checks, compiled once at registration
 * - Entity-level and field-level permissions per kind
 * - Two-phase (operation / commit) evaluation with deferred operation checks
 * - Per-request result caching and an audit trail of decisions
 *
 * ## Usage
 * ```ignore
 * use ai_os_permissions::permissions::*;
 *
 * let mut checks = CheckRegistry::default();
 * checks.register_operation::<IsOwner>("is owner")?;
 *
 * let mut dictionary = EntityDictionary::new(checks);
 * dictionary.bind_entity(
 *     &ModelDefinition::new("book")
 *         .permission(PermissionKind::Update, PermissionSource::expression("is owner")),
 * )?;
 *
 * let scope = Arc::new(RequestScope::new(User::new("alice")));
 * let mut executor = PermissionExecutor::new(Arc::new(dictionary), scope);
 * executor.check_permission(PermissionKind::Update, &book)?;
 * // apply the change, then
 * executor.execute_commit_checks()?;
 * ```
 */

pub mod audit;
pub mod binding;
pub mod cache;
pub mod checks;
pub mod context;
pub mod executor;
pub mod expression;
pub mod manifest;
pub mod policy;
pub mod types;

// Re-export commonly used items
pub use audit::{AuditEvent, AuditLogger, AuditSeverity, AuditStats, DecisionPhase};
pub use binding::{EntityDictionary, EntityPermissions, FieldDefinition, ModelDefinition};
pub use cache::{CacheKey, CacheStats, ExpressionResultCache};
pub use checks::{
    Check, CheckFactory, CheckId, CheckInstance, CheckKind, CheckRegistry, OperationCheck,
    UserCheck,
};
pub use context::{RequestScope, User};
pub use executor::PermissionExecutor;
pub use expression::{
    CheckExpression, CheckMode, Expression, ExpressionResult, Expressions,
    PermissionExpressionBuilder, Status,
};
pub use manifest::ModelManifest;
pub use policy::{CheckRef, PermissionSource, PolicyCompiler, PolicyTree};
pub use types::{ChangeId, ChangeSpec, PermissionKind, PersistentResource, Record, ResourceIdentity};
