/*!
 * Policy Lexer
 * Check-identifier-aware tokenization
 *
 * Check identifiers may contain spaces and dots, so a token boundary is not simply
 * whitespace: at each position the longest registered identifier wins, then the
 * operator keywords, then an unresolved run of words.
 */

use crate::core::errors::{PolicyError, PolicyResult};
use crate::permissions::checks::CheckRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    LParen,
    RParen,
    And,
    Or,
    Not,
    /// A registered check identifier
    Check(String),
    /// Words that match neither a keyword nor a registered check
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    registry: &'a CheckRegistry,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, registry: &'a CheckRegistry) -> Self {
        Self {
            input,
            registry,
            pos: 0,
        }
    }

    pub fn tokenize(mut self) -> PolicyResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> PolicyResult<Option<Token>> {
        self.skip_whitespace();
        let input = self.input;
        let offset = self.pos;
        let rest = &input[offset..];
        let Some(c) = rest.chars().next() else {
            return Ok(None);
        };

        let kind = match c {
            '(' => {
                self.pos += 1;
                TokenKind::LParen
            }
            ')' => {
                self.pos += 1;
                TokenKind::RParen
            }
            _ if is_reserved(c) => {
                return Err(PolicyError::Parse {
                    expression: self.input.to_string(),
                    offset,
                    message: format!("unexpected character '{}'", c),
                });
            }
            _ => self.word_token(rest),
        };

        Ok(Some(Token { kind, offset }))
    }

    fn word_token(&mut self, rest: &str) -> TokenKind {
        let first_len = word_len(rest);
        let check_len = self.longest_check(rest);

        if let Some(keyword) = keyword(&rest[..first_len]) {
            if check_len.map_or(true, |len| len <= first_len) {
                self.pos += first_len;
                return keyword;
            }
        }

        if let Some(len) = check_len {
            self.pos += len;
            return TokenKind::Check(rest[..len].to_string());
        }

        // Gather the unresolved phrase up to the next keyword, check or paren
        let mut len = first_len;
        loop {
            let tail = &rest[len..];
            let trimmed = tail.trim_start();
            if trimmed.is_empty() || trimmed.starts_with(|c: char| c == '(' || c == ')') {
                break;
            }
            let next_word = &trimmed[..word_len(trimmed)];
            if keyword(next_word).is_some() || self.longest_check(trimmed).is_some() {
                break;
            }
            len += (tail.len() - trimmed.len()) + next_word.len();
        }

        self.pos += len;
        TokenKind::Unknown(rest[..len].to_string())
    }

    /// Length of the longest registered identifier starting `rest` and ending on a boundary
    fn longest_check(&self, rest: &str) -> Option<usize> {
        self.registry
            .identifiers()
            .filter(|id| rest.starts_with(id) && is_boundary(&rest[id.len()..]))
            .map(str::len)
            .max()
    }

    fn skip_whitespace(&mut self) {
        let input = self.input;
        let rest = &input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }
}

fn is_reserved(c: char) -> bool {
    matches!(c, '&' | '|' | '!')
}

fn is_boundary(tail: &str) -> bool {
    tail.chars()
        .next()
        .map_or(true, |c| c.is_whitespace() || c == '(' || c == ')')
}

fn word_len(s: &str) -> usize {
    s.find(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .unwrap_or(s.len())
}

fn keyword(word: &str) -> Option<TokenKind> {
    if word.eq_ignore_ascii_case("and") {
        Some(TokenKind::And)
    } else if word.eq_ignore_ascii_case("or") {
        Some(TokenKind::Or)
    } else if word.eq_ignore_ascii_case("not") {
        Some(TokenKind::Not)
    } else {
        None
    }
}
