/*!
 * Policy Parser
 * Recursive descent over the token stream
 *
 * Grammar, loosest binding first:
 *
 * ```text
 * expression := conjunction ( OR conjunction )*
 * conjunction := unary ( AND unary )*
 * unary := NOT unary | '(' expression ')' | CHECK
 * ```
 */

use super::lexer::{Token, TokenKind};
use super::tree::{CheckRef, PolicyTree};
use crate::core::errors::{PolicyError, PolicyResult};
use crate::permissions::checks::CheckRegistry;

pub(crate) struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    registry: &'a CheckRegistry,
    max_depth: usize,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(
        input: &'a str,
        tokens: Vec<Token>,
        registry: &'a CheckRegistry,
        max_depth: usize,
    ) -> Self {
        Self {
            input,
            tokens,
            registry,
            max_depth,
            pos: 0,
        }
    }

    pub fn parse(mut self) -> PolicyResult<PolicyTree> {
        if self.tokens.is_empty() {
            return Err(self.error(0, "empty expression"));
        }

        let tree = self.expression(0)?;
        match self.peek() {
            None => Ok(tree),
            Some(Token {
                kind: TokenKind::RParen,
                offset,
            }) => Err(self.error(*offset, "unbalanced ')'")),
            Some(Token {
                kind: TokenKind::Unknown(word),
                offset,
            }) => Err(self.error(*offset, format!("unknown operator '{}'", word))),
            Some(token) => Err(self.error(token.offset, "expected 'and' or 'or'")),
        }
    }

    fn expression(&mut self, depth: usize) -> PolicyResult<PolicyTree> {
        let mut left = self.conjunction(depth)?;
        while self.eat(&TokenKind::Or) {
            let right = self.conjunction(depth)?;
            left = PolicyTree::or(left, right);
        }
        Ok(left)
    }

    fn conjunction(&mut self, depth: usize) -> PolicyResult<PolicyTree> {
        let mut left = self.unary(depth)?;
        while self.eat(&TokenKind::And) {
            let right = self.unary(depth)?;
            left = PolicyTree::and(left, right);
        }
        Ok(left)
    }

    fn unary(&mut self, depth: usize) -> PolicyResult<PolicyTree> {
        let Some(token) = self.advance() else {
            return Err(self.error(self.input.len(), "unexpected end of expression"));
        };

        match token.kind {
            TokenKind::Not => {
                let depth = self.descend(depth, token.offset)?;
                Ok(PolicyTree::not(self.unary(depth)?))
            }
            TokenKind::LParen => {
                let depth = self.descend(depth, token.offset)?;
                let inner = self.expression(depth)?;
                if self.eat(&TokenKind::RParen) {
                    Ok(inner)
                } else {
                    Err(self.error(token.offset, "unbalanced '('"))
                }
            }
            TokenKind::Check(identifier) => {
                let factory = self.registry.resolve(&identifier)?;
                Ok(PolicyTree::Check(CheckRef::new(factory.clone())))
            }
            TokenKind::Unknown(identifier) => Err(PolicyError::UnknownCheck(identifier)),
            TokenKind::And | TokenKind::Or => {
                Err(self.error(token.offset, "expected a check, 'not' or '('"))
            }
            TokenKind::RParen => Err(self.error(token.offset, "unexpected ')'")),
        }
    }

    fn descend(&self, depth: usize, offset: usize) -> PolicyResult<usize> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(PolicyError::LimitExceeded(format!(
                "policy nesting deeper than {} at offset {} of '{}'",
                self.max_depth, offset, self.input
            )));
        }
        Ok(depth)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().map(|t| &t.kind) == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> PolicyError {
        PolicyError::Parse {
            expression: self.input.to_string(),
            offset,
            message: message.into(),
        }
    }
}
