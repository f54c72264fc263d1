/*!
 * Expression Builder
 * Turns bound policy trees into executable expression pairs for one decision
 */

use super::{CheckExpression, CheckMode, Expression};
use crate::core::errors::{PolicyError, PolicyResult};
use crate::permissions::binding::EntityDictionary;
use crate::permissions::cache::ExpressionResultCache;
use crate::permissions::context::RequestScope;
use crate::permissions::policy::PolicyTree;
use crate::permissions::types::{ChangeSpec, PermissionKind, PersistentResource};
use std::sync::Arc;
use tracing::debug;

/// Pre-commit expression and its commit-phase counterpart
///
/// `commit` is `None` for user-only decisions, which are phase independent.
#[derive(Debug)]
pub struct Expressions {
    pub operation: Expression,
    pub commit: Option<Expression>,
}

impl Expressions {
    fn pass() -> Self {
        Self {
            operation: Expression::PASS,
            commit: Some(Expression::PASS),
        }
    }
}

/// Everything a leaf captures at build time
struct LeafContext<'a> {
    mode: CheckMode,
    resource: Option<&'a Arc<dyn PersistentResource>>,
    change: Option<&'a Arc<ChangeSpec>>,
}

/// Builds expressions for the decisions of one request
#[derive(Debug)]
pub struct PermissionExpressionBuilder {
    dictionary: Arc<EntityDictionary>,
    scope: Arc<RequestScope>,
    cache: Arc<ExpressionResultCache>,
}

impl PermissionExpressionBuilder {
    pub fn new(
        dictionary: Arc<EntityDictionary>,
        scope: Arc<RequestScope>,
        cache: Arc<ExpressionResultCache>,
    ) -> Self {
        Self {
            dictionary,
            scope,
            cache,
        }
    }

    pub fn scope(&self) -> &Arc<RequestScope> {
        &self.scope
    }

    pub fn cache(&self) -> &Arc<ExpressionResultCache> {
        &self.cache
    }

    pub fn dictionary(&self) -> &Arc<EntityDictionary> {
        &self.dictionary
    }

    /// Decision for one field: the entity policy and the field policy must both pass
    pub fn build_specific_field_expressions(
        &self,
        resource: &Arc<dyn PersistentResource>,
        kind: PermissionKind,
        field: &str,
        change: Option<ChangeSpec>,
    ) -> PolicyResult<Expressions> {
        let entity = self.bound_entity(resource.resource_type())?;
        if !self.dictionary.entity_has_checks_for_permission(entity, kind) {
            return Ok(Expressions::pass());
        }

        let change = change.map(Arc::new);
        let build = |mode| {
            let ctx = LeafContext {
                mode,
                resource: Some(resource),
                change: change.as_ref(),
            };
            self.specific_field_expression(entity, kind, Some(field), &ctx)
        };

        let expressions = Expressions {
            operation: build(CheckMode::Deferred),
            commit: Some(build(CheckMode::Immediate)),
        };
        debug!(
            entity,
            field,
            %kind,
            operation = %expressions.operation,
            "Built specific field expressions"
        );
        Ok(expressions)
    }

    /// Decision for "at least one field": the entity policy or any field policy
    pub fn build_any_field_expressions(
        &self,
        resource: &Arc<dyn PersistentResource>,
        kind: PermissionKind,
        change: Option<ChangeSpec>,
    ) -> PolicyResult<Expressions> {
        let entity = self.bound_entity(resource.resource_type())?;
        if !self.dictionary.entity_has_checks_for_permission(entity, kind) {
            return Ok(Expressions::pass());
        }

        let change = change.map(Arc::new);
        let build = |mode| {
            let ctx = LeafContext {
                mode,
                resource: Some(resource),
                change: change.as_ref(),
            };
            self.any_field_expression(entity, kind, &ctx)
        };

        let expressions = Expressions {
            operation: build(CheckMode::Deferred),
            commit: Some(build(CheckMode::Immediate)),
        };
        debug!(
            entity,
            %kind,
            operation = %expressions.operation,
            "Built any field expressions"
        );
        Ok(expressions)
    }

    /// User-only decision for a resource, optionally narrowed to one field
    pub fn build_user_check_field_expressions(
        &self,
        resource: &Arc<dyn PersistentResource>,
        kind: PermissionKind,
        field: Option<&str>,
    ) -> PolicyResult<Expressions> {
        let entity = self.bound_entity(resource.resource_type())?;
        if !self.dictionary.entity_has_checks_for_permission(entity, kind) {
            return Ok(Expressions::pass());
        }

        let ctx = LeafContext {
            mode: CheckMode::UserOnly,
            resource: Some(resource),
            change: None,
        };
        Ok(Expressions {
            operation: self.specific_field_expression(entity, kind, field, &ctx),
            commit: None,
        })
    }

    /// User-only decision before any resource instance exists
    pub fn build_user_check_any_expression(
        &self,
        resource_type: &str,
        kind: PermissionKind,
    ) -> PolicyResult<Expressions> {
        let entity = self.bound_entity(resource_type)?;
        if !self.dictionary.entity_has_checks_for_permission(entity, kind) {
            return Ok(Expressions::pass());
        }

        let ctx = LeafContext {
            mode: CheckMode::UserOnly,
            resource: None,
            change: None,
        };
        Ok(Expressions {
            operation: self.any_field_expression(entity, kind, &ctx),
            commit: None,
        })
    }

    fn bound_entity<'a>(&self, resource_type: &'a str) -> PolicyResult<&'a str> {
        if self.dictionary.is_bound(resource_type) {
            Ok(resource_type)
        } else {
            Err(PolicyError::UnknownEntity(resource_type.to_string()))
        }
    }

    /// And(entity or PASS, field or PASS); an undeclared field has no field policy
    fn specific_field_expression(
        &self,
        entity: &str,
        kind: PermissionKind,
        field: Option<&str>,
        ctx: &LeafContext<'_>,
    ) -> Expression {
        let entity_expr = self
            .dictionary
            .permissions_for_class(entity, kind)
            .map(|tree| self.expression_for(tree, ctx))
            .unwrap_or(Expression::PASS);
        let field_expr = field
            .and_then(|f| self.dictionary.permissions_for_field(entity, f, kind))
            .map(|tree| self.expression_for(tree, ctx))
            .unwrap_or(Expression::PASS);

        Expression::and(entity_expr, field_expr)
    }

    /// Or(entity, fields) where the fields fold by Or in declaration order from a FAIL seed
    ///
    /// An absent entity tree drops out of the disjunction so the fields decide.
    fn any_field_expression(
        &self,
        entity: &str,
        kind: PermissionKind,
        ctx: &LeafContext<'_>,
    ) -> Expression {
        let entity_expr = self
            .dictionary
            .permissions_for_class(entity, kind)
            .map(|tree| self.expression_for(tree, ctx));

        let fields_expr = self
            .dictionary
            .all_fields(entity)
            .iter()
            .filter_map(|f| self.dictionary.permissions_for_field(entity, f, kind))
            .fold(None, |acc: Option<Expression>, tree| {
                let field = self.expression_for(tree, ctx);
                Some(Expression::or(acc.unwrap_or(Expression::FAIL), field))
            });

        match (entity_expr, fields_expr) {
            (Some(entity), Some(fields)) => Expression::or(entity, fields),
            (Some(entity), None) => entity,
            (None, Some(fields)) => fields,
            (None, None) => Expression::PASS,
        }
    }

    fn expression_for(&self, tree: &PolicyTree, ctx: &LeafContext<'_>) -> Expression {
        match tree {
            PolicyTree::And(l, r) => {
                Expression::and(self.expression_for(l, ctx), self.expression_for(r, ctx))
            }
            PolicyTree::Or(l, r) => {
                Expression::or(self.expression_for(l, ctx), self.expression_for(r, ctx))
            }
            PolicyTree::Not(child) => Expression::not(self.expression_for(child, ctx)),
            PolicyTree::Check(check) => Expression::Check(CheckExpression::new(
                check.factory().instantiate(),
                ctx.mode,
                ctx.resource.cloned(),
                self.scope.clone(),
                ctx.change.cloned(),
                self.cache.clone(),
            )),
        }
    }
}
