//! Our default `Display` output for each `TokenKind` is less ambiguous
//! than the format printed by `--lextest` and therefore improves error
//! messages.
use crate::TokenKind::{self, *};
use std::fmt;

pub struct Output<'token> {
    token: &'token TokenKind<'token>,
}

impl<'token> Output<'token> {
    pub fn new(token: &'token TokenKind<'token>) -> Self {
        Self { token }
    }
}

impl<'token> fmt::Display for Output<'token> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token {
            Keyword(keyword) => write!(f, "{}", keyword),
            Operator(operator) => write!(f, "{}", operator),
            Identifier(symbol) => write!(f, "identifier {}", symbol),
            IntegerLiteral(lit) => write!(f, "integer literal {}", lit),
            DoubleLiteral(lit) => write!(f, "double literal {}", lit),
            StringLiteral(lit) => write!(f, "string literal \"{}\"", lit),
            Comment(body) => write!(f, "//{}", body),
            Whitespace => Ok(()),
        }
    }
}
