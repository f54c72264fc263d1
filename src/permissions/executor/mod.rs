/*!
 * Permission Executor
 * Drives two-phase authorization decisions for one request
 *
 * The executor evaluates the pre-commit expression of every decision right away.
 * PASS lets the operation proceed, FAIL is translated into
 * [`PolicyError::Forbidden`], and DEFERRED queues the paired commit expression.
 * Once the caller has applied its mutations it calls
 * [`PermissionExecutor::execute_commit_checks`], where every queued expression
 * must resolve to PASS or FAIL.
 */

use crate::core::errors::{PolicyError, PolicyResult};
use crate::monitoring::DecisionSpan;
use crate::permissions::audit::{AuditEvent, AuditLogger, DecisionPhase};
use crate::permissions::binding::EntityDictionary;
use crate::permissions::cache::{CacheStats, ExpressionResultCache};
use crate::permissions::context::RequestScope;
use crate::permissions::expression::{
    Expression, ExpressionResult, Expressions, PermissionExpressionBuilder, Status,
};
use crate::permissions::types::{ChangeSpec, PermissionKind, PersistentResource};
use std::sync::Arc;
use tracing::{debug, warn};

/// Commit expression waiting for the mutation to be applied
#[derive(Debug)]
struct PendingCommit {
    resource_type: String,
    kind: PermissionKind,
    field: Option<String>,
    expression: Expression,
}

/// Request-scoped authorization driver
#[derive(Debug)]
pub struct PermissionExecutor {
    builder: PermissionExpressionBuilder,
    audit: Option<Arc<AuditLogger>>,
    pending: Vec<PendingCommit>,
}

impl PermissionExecutor {
    /// Executor with a fresh result cache sized from the dictionary's configuration
    pub fn new(dictionary: Arc<EntityDictionary>, scope: Arc<RequestScope>) -> Self {
        let cache = Arc::new(ExpressionResultCache::new(dictionary.config().cache_capacity));
        Self {
            builder: PermissionExpressionBuilder::new(dictionary, scope, cache),
            audit: None,
            pending: Vec::new(),
        }
    }

    /// Record every decision in `audit`
    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn scope(&self) -> &RequestScope {
        self.builder.scope()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.builder.cache().stats()
    }

    /// Number of commit expressions still waiting for `execute_commit_checks`
    pub fn pending_commit_checks(&self) -> usize {
        self.pending.len()
    }

    /// May the operation touch at least one field of `resource`?
    pub fn check_permission(
        &mut self,
        kind: PermissionKind,
        resource: &Arc<dyn PersistentResource>,
    ) -> PolicyResult<()> {
        let span = self.span("check_permission", resource.resource_type(), kind);
        let _guard = span.enter();

        let expressions = self
            .builder
            .build_any_field_expressions(resource, kind, None)?;
        let status = self.run_operation(resource.resource_type(), kind, None, expressions)?;
        span.record_status(status.as_str());
        Ok(())
    }

    /// May the operation touch `field` of `resource`, optionally with `change`?
    pub fn check_specific_field_permissions(
        &mut self,
        resource: &Arc<dyn PersistentResource>,
        change: Option<ChangeSpec>,
        kind: PermissionKind,
        field: &str,
    ) -> PolicyResult<()> {
        let span = self.span("check_specific_field_permissions", resource.resource_type(), kind);
        span.record_field(field);
        let _guard = span.enter();

        let expressions = self
            .builder
            .build_specific_field_expressions(resource, kind, field, change)?;
        let status = self.run_operation(resource.resource_type(), kind, Some(field), expressions)?;
        span.record_status(status.as_str());
        Ok(())
    }

    /// User-only pre-check before any instance of `resource_type` is loaded
    pub fn check_user_permissions(
        &mut self,
        resource_type: &str,
        kind: PermissionKind,
    ) -> PolicyResult<()> {
        let span = self.span("check_user_permissions", resource_type, kind);
        let _guard = span.enter();

        let expressions = self
            .builder
            .build_user_check_any_expression(resource_type, kind)?;
        let status = self.run_user(resource_type, kind, None, expressions)?;
        span.record_status(status.as_str());
        Ok(())
    }

    /// User-only pre-check for one field of `resource`
    pub fn check_user_field_permissions(
        &mut self,
        resource: &Arc<dyn PersistentResource>,
        kind: PermissionKind,
        field: &str,
    ) -> PolicyResult<()> {
        let span = self.span("check_user_field_permissions", resource.resource_type(), kind);
        span.record_field(field);
        let _guard = span.enter();

        let expressions = self
            .builder
            .build_user_check_field_expressions(resource, kind, Some(field))?;
        let status = self.run_user(resource.resource_type(), kind, Some(field), expressions)?;
        span.record_status(status.as_str());
        Ok(())
    }

    /// Evaluate every queued commit expression once, in the order queued
    ///
    /// The queue is drained even when a check fails.
    pub fn execute_commit_checks(&mut self) -> PolicyResult<()> {
        let pending = std::mem::take(&mut self.pending);
        debug!(count = pending.len(), "Executing commit checks");

        for commit in pending {
            let result = commit.expression.evaluate();
            self.audit(
                &commit.resource_type,
                commit.kind,
                commit.field.as_deref(),
                DecisionPhase::Commit,
                &result,
            );

            match result.status {
                Status::Pass => {}
                Status::Fail => return Err(self.forbidden(&commit.expression, result)),
                Status::Deferred => {
                    warn!(
                        resource_type = %commit.resource_type,
                        kind = %commit.kind,
                        expression = %commit.expression,
                        "Commit expression did not resolve"
                    );
                    return Err(PolicyError::InvariantViolation(format!(
                        "commit expression {} for {} {} resolved to DEFERRED",
                        commit.expression, commit.kind, commit.resource_type
                    )));
                }
            }
        }
        Ok(())
    }

    fn run_operation(
        &mut self,
        resource_type: &str,
        kind: PermissionKind,
        field: Option<&str>,
        expressions: Expressions,
    ) -> PolicyResult<Status> {
        let result = expressions.operation.evaluate();
        self.audit(resource_type, kind, field, DecisionPhase::Operation, &result);

        match result.status {
            Status::Pass => Ok(Status::Pass),
            Status::Fail => Err(self.forbidden(&expressions.operation, result)),
            Status::Deferred => {
                if let Some(expression) = expressions.commit {
                    self.pending.push(PendingCommit {
                        resource_type: resource_type.to_string(),
                        kind,
                        field: field.map(str::to_string),
                        expression,
                    });
                }
                Ok(Status::Deferred)
            }
        }
    }

    /// PASS and DEFERRED both let the request proceed; only FAIL is final here
    fn run_user(
        &mut self,
        resource_type: &str,
        kind: PermissionKind,
        field: Option<&str>,
        expressions: Expressions,
    ) -> PolicyResult<Status> {
        let result = expressions.operation.evaluate();
        self.audit(resource_type, kind, field, DecisionPhase::User, &result);

        if result.is_fail() {
            return Err(self.forbidden(&expressions.operation, result));
        }
        Ok(result.status)
    }

    fn forbidden(&self, expression: &Expression, result: ExpressionResult) -> PolicyError {
        let reason = result
            .reason
            .unwrap_or_else(|| format!("ForbiddenAccess {}", expression));
        debug!(%expression, reason = %reason, "Authorization denied");
        self.scope().log_auth_failure(reason.clone());
        PolicyError::Forbidden(reason)
    }

    fn audit(
        &self,
        resource_type: &str,
        kind: PermissionKind,
        field: Option<&str>,
        phase: DecisionPhase,
        result: &ExpressionResult,
    ) {
        if let Some(audit) = &self.audit {
            audit.log(AuditEvent::new(
                *self.scope().request_id(),
                resource_type,
                kind,
                field,
                phase,
                result.clone(),
            ));
        }
    }

    fn span(&self, operation: &'static str, resource_type: &str, kind: PermissionKind) -> DecisionSpan {
        DecisionSpan::new(operation, self.scope().request_id(), resource_type, kind.as_str())
    }
}
