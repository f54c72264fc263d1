/*!
 * Permission Expressions
 * Executable expression tree and its three-valued evaluator
 *
 * An [`Expression`] is built per decision from a compiled policy tree. Leaves
 * carry a fresh check instance together with everything it needs (resource,
 * request scope, change descriptor and the request's result cache), plus the
 * wrapping mode that decides when the check may actually run.
 */

mod builder;
mod result;

pub use builder::{Expressions, PermissionExpressionBuilder};
pub use result::{ExpressionResult, Status};

use crate::permissions::cache::{CacheKey, ExpressionResultCache};
use crate::permissions::checks::{Check, CheckInstance};
use crate::permissions::context::RequestScope;
use crate::permissions::types::{ChangeSpec, PersistentResource};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// When a check leaf is allowed to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckMode {
    /// Run now; always PASS or FAIL
    Immediate,
    /// User checks run now, operation checks wait for the commit phase
    Deferred,
    /// Only user checks run; resource and change are ignored
    UserOnly,
}

/// Executable expression
pub enum Expression {
    Constant(Status),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    Check(CheckExpression),
}

impl Expression {
    pub const PASS: Expression = Expression::Constant(Status::Pass);
    pub const FAIL: Expression = Expression::Constant(Status::Fail);

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }

    pub fn not(child: Expression) -> Self {
        Expression::Not(Box::new(child))
    }

    /// Evaluate depth-first, left to right, with short-circuiting
    pub fn evaluate(&self) -> ExpressionResult {
        match self {
            Expression::Constant(status) => ExpressionResult::from(*status),
            Expression::And(left, right) => {
                let l = left.evaluate();
                if l.is_fail() {
                    return l;
                }
                let r = right.evaluate();
                if r.is_fail() {
                    return r;
                }
                if l.is_deferred() || r.is_deferred() {
                    ExpressionResult::DEFERRED
                } else {
                    ExpressionResult::PASS
                }
            }
            Expression::Or(left, right) => {
                let l = left.evaluate();
                if l.is_pass() {
                    return l;
                }
                let r = right.evaluate();
                if r.is_pass() {
                    return r;
                }
                if l.is_deferred() || r.is_deferred() {
                    ExpressionResult::DEFERRED
                } else {
                    r
                }
            }
            Expression::Not(child) => {
                let result = child.evaluate();
                match result.status {
                    Status::Pass => ExpressionResult::fail(format!("ForbiddenAccess {}", self)),
                    Status::Fail => ExpressionResult::PASS,
                    Status::Deferred => result,
                }
            }
            Expression::Check(leaf) => leaf.evaluate(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(status) => write!(f, "{}", status),
            Expression::And(l, r) => write!(f, "({} and {})", l, r),
            Expression::Or(l, r) => write!(f, "({} or {})", l, r),
            Expression::Not(child) => write!(f, "not {}", child),
            Expression::Check(leaf) => f.write_str(leaf.instance.identifier()),
        }
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expression({})", self)
    }
}

/// Leaf wrapping one check instance
pub struct CheckExpression {
    instance: CheckInstance,
    mode: CheckMode,
    resource: Option<Arc<dyn PersistentResource>>,
    scope: Arc<RequestScope>,
    change: Option<Arc<ChangeSpec>>,
    cache: Arc<ExpressionResultCache>,
}

impl CheckExpression {
    pub fn new(
        instance: CheckInstance,
        mode: CheckMode,
        resource: Option<Arc<dyn PersistentResource>>,
        scope: Arc<RequestScope>,
        change: Option<Arc<ChangeSpec>>,
        cache: Arc<ExpressionResultCache>,
    ) -> Self {
        Self {
            instance,
            mode,
            resource,
            scope,
            change,
            cache,
        }
    }

    pub fn mode(&self) -> CheckMode {
        self.mode
    }

    pub fn identifier(&self) -> &str {
        self.instance.identifier()
    }

    fn evaluate(&self) -> ExpressionResult {
        match (self.mode, self.instance.check()) {
            (_, Check::User(check)) => {
                let key = CacheKey::new(None, self.instance.id(), None);
                self.cache.get_or_compute(key, || {
                    let passed = check.ok(self.scope.user());
                    trace!(check = self.identifier(), passed, "Evaluated user check");
                    self.outcome(passed, None)
                })
            }
            (CheckMode::Immediate, Check::Operation(check)) => {
                let Some(resource) = self.resource.as_deref() else {
                    warn!(
                        check = self.identifier(),
                        "Operation check has no resource to run against"
                    );
                    return ExpressionResult::DEFERRED;
                };
                let key = CacheKey::new(
                    Some(resource.identity()),
                    self.instance.id(),
                    self.change.as_ref().map(|c| c.id()),
                );
                self.cache.get_or_compute(key, || {
                    let passed = check.ok(resource, &self.scope, self.change.as_deref());
                    trace!(
                        check = self.identifier(),
                        resource = %resource.identity(),
                        passed,
                        "Evaluated operation check"
                    );
                    self.outcome(passed, Some(resource))
                })
            }
            (CheckMode::Deferred | CheckMode::UserOnly, Check::Operation(_)) => {
                ExpressionResult::DEFERRED
            }
        }
    }

    /// User check outcomes are shared across resources, so their reason names none
    fn outcome(&self, passed: bool, resource: Option<&dyn PersistentResource>) -> ExpressionResult {
        if passed {
            return ExpressionResult::PASS;
        }
        match resource {
            Some(resource) => ExpressionResult::fail(format!(
                "ForbiddenAccess {} {}",
                self.identifier(),
                resource.identity()
            )),
            None => ExpressionResult::fail(format!("ForbiddenAccess {}", self.identifier())),
        }
    }
}

impl fmt::Debug for CheckExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckExpression")
            .field("check", &self.instance)
            .field("mode", &self.mode)
            .field("resource", &self.resource.as_ref().map(|r| r.identity()))
            .finish_non_exhaustive()
    }
}
