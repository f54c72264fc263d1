/*!
 * Policy Tree
 * Immutable syntax tree produced by the compiler
 */

use crate::permissions::checks::{CheckFactory, CheckKind};
use std::fmt;

/// Compiled policy expression
///
/// Leaves hold the resolved check factory, so building an executable expression
/// from a tree can never hit an unknown check.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyTree {
    And(Box<PolicyTree>, Box<PolicyTree>),
    Or(Box<PolicyTree>, Box<PolicyTree>),
    Not(Box<PolicyTree>),
    Check(CheckRef),
}

impl PolicyTree {
    pub fn and(left: PolicyTree, right: PolicyTree) -> Self {
        PolicyTree::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: PolicyTree, right: PolicyTree) -> Self {
        PolicyTree::Or(Box::new(left), Box::new(right))
    }

    pub fn not(child: PolicyTree) -> Self {
        PolicyTree::Not(Box::new(child))
    }

    /// Identifiers of every check leaf, left to right
    pub fn check_identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            PolicyTree::And(l, r) | PolicyTree::Or(l, r) => {
                l.collect_identifiers(out);
                r.collect_identifiers(out);
            }
            PolicyTree::Not(child) => child.collect_identifiers(out),
            PolicyTree::Check(check) => out.push(check.identifier()),
        }
    }

    /// Whether every leaf is a user check
    pub fn is_user_only(&self) -> bool {
        match self {
            PolicyTree::And(l, r) | PolicyTree::Or(l, r) => l.is_user_only() && r.is_user_only(),
            PolicyTree::Not(child) => child.is_user_only(),
            PolicyTree::Check(check) => check.factory().kind() == CheckKind::User,
        }
    }
}

impl fmt::Display for PolicyTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyTree::And(l, r) => write!(f, "({} and {})", l, r),
            PolicyTree::Or(l, r) => write!(f, "({} or {})", l, r),
            PolicyTree::Not(child) => write!(f, "not {}", child),
            PolicyTree::Check(check) => f.write_str(check.identifier()),
        }
    }
}

/// Reference from a leaf to its resolved check
#[derive(Debug, Clone)]
pub struct CheckRef {
    factory: CheckFactory,
}

impl CheckRef {
    pub(crate) fn new(factory: CheckFactory) -> Self {
        Self { factory }
    }

    pub fn identifier(&self) -> &str {
        self.factory.identifier()
    }

    pub fn factory(&self) -> &CheckFactory {
        &self.factory
    }
}

impl PartialEq for CheckRef {
    fn eq(&self, other: &Self) -> bool {
        self.identifier() == other.identifier() && self.factory.id() == other.factory.id()
    }
}
