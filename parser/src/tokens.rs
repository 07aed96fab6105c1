use crate::{SyntaxError, SyntaxResult};
use asciifile::{MaybeSpanned, Position, Span};
use lexer::Token;
use utils::MultiPeekable;

fn unexpected_eof<'f>() -> MaybeSpanned<'f, SyntaxError> {
    MaybeSpanned::WithoutSpan(SyntaxError::UnexpectedEOF)
}

/// The parser's view of the token stream: arbitrary lookahead, plus the end
/// of the last consumed token so that a node can be spanned from its first
/// to its last token.
pub(crate) struct TokenCursor<'f, I>
where
    I: Iterator<Item = Token<'f>>,
{
    tokens: MultiPeekable<I>,
    consumed_until: Option<Position<'f>>,
}

impl<'f, I> TokenCursor<'f, I>
where
    I: Iterator<Item = Token<'f>>,
{
    pub fn new(tokens: I) -> Self {
        TokenCursor {
            tokens: MultiPeekable::new(tokens),
            consumed_until: None,
        }
    }

    /// Consume the next token. Running out of tokens is a syntax error.
    pub fn advance(&mut self) -> SyntaxResult<'f, Token<'f>> {
        let token = self.tokens.next().ok_or_else(unexpected_eof)?;
        self.consumed_until = Some(token.span.end_position());
        Ok(token)
    }

    /// The token `n` positions ahead, `0` being the next one
    pub fn lookahead(&mut self, n: usize) -> Option<&Token<'f>> {
        self.tokens.peek_multiple(n + 1).get(n)
    }

    pub fn at_eof(&mut self) -> bool {
        self.lookahead(0).is_none()
    }

    pub fn upcoming_span(&mut self) -> SyntaxResult<'f, Span<'f>> {
        self.lookahead(0)
            .map(|token| token.span)
            .ok_or_else(unexpected_eof)
    }

    /// From `start` to the end of the last consumed token
    pub fn span_from(&self, start: Position<'f>) -> Span<'f> {
        Span::new(start, self.consumed_until.unwrap_or(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asciifile::AsciiFile;
    use compiler_shared::context::Context;
    use lexer::{Lexer, TokenKind};
    use strtab::StringTable;

    #[test]
    fn spans_cover_consumed_tokens() {
        let file = AsciiFile::new(b"class A { }").unwrap();
        let context = Context::dummy(&file);
        let mut strtab = StringTable::new();
        let tokens: Vec<_> = Lexer::new(&mut strtab, &context)
            .map(|token| token.unwrap())
            .filter(|token| token.data != TokenKind::Whitespace)
            .collect();
        let mut cursor = TokenCursor::new(tokens.into_iter());

        let start = cursor.upcoming_span().unwrap().start_position();
        cursor.advance().unwrap();
        cursor.advance().unwrap();
        assert_eq!(cursor.span_from(start).as_str(), "class A");
        assert_eq!(cursor.lookahead(1).map(|token| token.span.as_str()), Some("}"));

        cursor.advance().unwrap();
        cursor.advance().unwrap();
        assert!(cursor.at_eof());
        match cursor.advance() {
            Err(MaybeSpanned::WithoutSpan(SyntaxError::UnexpectedEOF)) => {}
            other => panic!("{:?}", other.map(|token| token.data)),
        }
    }
}
