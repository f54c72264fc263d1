/*!
 * Policy Compiler
 * Turns permission sources into immutable policy trees
 *
 * Compilation is deterministic and side-effect free: the same text against the
 * same registry always yields the same tree, and any malformed text, unknown
 * check or ambiguous source fails before a model becomes usable.
 */

mod lexer;
mod parser;
mod source;
mod tree;

pub use source::PermissionSource;
pub use tree::{CheckRef, PolicyTree};

use crate::core::config::EngineConfig;
use crate::core::errors::{PolicyError, PolicyResult};
use crate::permissions::checks::CheckRegistry;
use crate::permissions::types::PermissionKind;
use lexer::Lexer;
use parser::Parser;
use tracing::debug;

/// Compiler bound to one check registry
pub struct PolicyCompiler<'a> {
    registry: &'a CheckRegistry,
    max_expression_len: usize,
    max_depth: usize,
}

impl<'a> PolicyCompiler<'a> {
    pub fn new(registry: &'a CheckRegistry) -> Self {
        Self::with_config(registry, &EngineConfig::default())
    }

    pub fn with_config(registry: &'a CheckRegistry, config: &EngineConfig) -> Self {
        Self {
            registry,
            max_expression_len: config.max_expression_len,
            max_depth: config.max_depth,
        }
    }

    /// Compile a free-form expression
    pub fn compile(&self, expression: &str) -> PolicyResult<PolicyTree> {
        if expression.len() > self.max_expression_len {
            return Err(PolicyError::LimitExceeded(format!(
                "policy expression of {} bytes exceeds {} bytes",
                expression.len(),
                self.max_expression_len
            )));
        }

        let tokens = Lexer::new(expression, self.registry).tokenize()?;
        let tree = Parser::new(expression, tokens, self.registry, self.max_depth).parse()?;
        debug!(expression, compiled = %tree, "Compiled policy expression");
        Ok(tree)
    }

    /// Compile a permission source attached to `target` for `kind`
    pub fn compile_source(
        &self,
        kind: PermissionKind,
        target: &str,
        source: &PermissionSource,
    ) -> PolicyResult<PolicyTree> {
        let expression = source.to_expression(kind, target, self.registry)?;
        self.compile(&expression)
    }
}
