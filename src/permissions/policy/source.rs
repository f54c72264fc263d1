/*!
 * Permission Source
 * The raw configuration of one permission: an expression, an all-of list or an any-of list
 */

use crate::core::errors::{PolicyError, PolicyResult};
use crate::permissions::checks::CheckRegistry;
use crate::permissions::types::PermissionKind;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Raw permission configuration; exactly one form must be supplied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PermissionSource {
    /// Free-form boolean expression over check identifiers
    #[serde(skip_serializing_if = "String::is_empty")]
    pub expression: String,
    /// Checks that must all pass
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all: Vec<String>,
    /// Checks of which at least one must pass
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any: Vec<String>,
}

impl PermissionSource {
    pub fn expression(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..Default::default()
        }
    }

    pub fn all_of<I, S>(checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            all: checks.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn any_of<I, S>(checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            any: checks.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Textual expression for this source
    ///
    /// All/any lists are joined with ` and ` / ` or `. Each list entry must name a
    /// registered check so that an entry can never smuggle in operators.
    pub fn to_expression(
        &self,
        kind: PermissionKind,
        target: &str,
        registry: &CheckRegistry,
    ) -> PolicyResult<String> {
        let has_expression = !self.expression.trim().is_empty();
        let has_all = !self.all.is_empty();
        let has_any = !self.any.is_empty();

        let configured = [has_expression, has_all, has_any]
            .iter()
            .filter(|set| **set)
            .count();

        if configured != 1 {
            let reason = if configured == 0 {
                "no checks specified"
            } else {
                "more than one set of checks specified"
            };
            warn!(%kind, target, reason, "Poorly configured permission");
            return Err(PolicyError::invalid_configuration(kind, target, reason));
        }

        if has_expression {
            return Ok(self.expression.clone());
        }

        let (checks, conjunction) = if has_all {
            (&self.all, " and ")
        } else {
            (&self.any, " or ")
        };

        let mut expression = String::new();
        for check in checks {
            let factory = registry.resolve(check.trim())?;
            if !expression.is_empty() {
                expression.push_str(conjunction);
            }
            expression.push_str(factory.identifier());
        }
        Ok(expression)
    }
}
