use crate::{Position, Span};

#[derive(Copy, Clone, Debug)]
pub struct PositionIterator<'t> {
    /// current iterator position. Always points to the next character/position
    /// to emit
    position_to_emit: Option<Position<'t>>,
}

impl<'t> Iterator for PositionIterator<'t> {
    type Item = Position<'t>;
    fn next(&mut self) -> Option<Position<'t>> {
        let position = self.position_to_emit?;
        self.position_to_emit = position.next();
        Some(position)
    }
}

impl<'t> PositionIterator<'t> {
    pub fn new(position: Option<Position<'t>>) -> Self {
        Self {
            position_to_emit: position,
        }
    }

    /// Look at the next `n` characters without advancing the iterator.
    /// If there are less than `n` characters, return `None`.
    pub fn peek_exactly(&self, n: usize) -> Option<Span<'t>> {
        self.peek_at_most(n)
            .filter(|span| span.as_str().len() == n)
    }

    /// Look at the next `n` characters without advancing the iterator.
    ///
    /// If there are less than `n` charcters left, the returned Span will be
    /// shortened to the maximal possible length. If there are no
    /// characters left, a span cannot be built, because a span must contain
    /// at least one character.
    pub fn peek_at_most(&self, n: usize) -> Option<Span<'t>> {
        debug_assert!(n >= 1);
        // spans use inclusive ranges, so we have to built one
        // from the next char and `n` characters ahead
        self.position_to_emit.map(|span_start| {
            let span_end = (*self).take(n).last().unwrap_or(span_start);
            Span::new(span_start, span_end)
        })
    }

    pub fn matches(&self, wanted: &str) -> bool {
        match self.peek_exactly(wanted.len()) {
            None => wanted.is_empty(),
            Some(span) => span.as_str() == wanted,
        }
    }

    pub fn peek(&self) -> Option<Position<'t>> {
        self.position_to_emit
    }

    /// Look at the character `n` positions ahead without advancing.
    pub fn peek_nth(&self, n: usize) -> Option<Position<'t>> {
        let mut ahead = *self;
        ahead.nth(n)
    }

    pub fn eof_reached(&self) -> bool {
        self.peek().is_none()
    }
}

#[cfg(test)]
mod tests {
    use crate::AsciiFile;

    #[test]
    fn peeking_multiple_times_works() {
        let file = AsciiFile::new(b"abc").unwrap();
        let mut iter = file.iter();
        let peeked_once = iter.peek();
        let peeked_twice = iter.peek();
        assert_eq!(peeked_once, peeked_twice);
        let consumed = iter.next();
        assert_eq!(peeked_once, consumed);
    }

    #[test]
    fn peeking_multiple_chars_at_once_works() {
        let input = "one\ntwo three\nfour\n\n";
        let file = AsciiFile::new(input.as_bytes()).unwrap();
        let iter = file.iter();

        let peeked_once = iter.peek_exactly(input.len()).unwrap();
        assert_eq!(input, peeked_once.as_str());

        // peek a second time, state should not be forwarded
        let peeked_twice = iter.peek_exactly(2).unwrap();
        assert_eq!(&input[..2], peeked_twice.as_str());

        assert!(iter.peek_exactly(input.len() + 1).is_none());
    }

    #[test]
    fn peeking_multiple_chars_with_at_most_works() {
        let input = "one\ntwo three\nfour\n\n";
        let file = AsciiFile::new(input.as_bytes()).unwrap();
        let iter = file.iter();

        let peeked = iter.peek_at_most(input.len() + 1).unwrap();
        assert_eq!(input, peeked.as_str());
    }

    #[test]
    fn matches_and_peek_nth() {
        let file = AsciiFile::new(b"// x").unwrap();
        let iter = file.iter();
        assert!(iter.matches("//"));
        assert!(!iter.matches("/*"));
        assert!(!iter.matches("// x y"));
        assert_eq!(iter.peek_nth(3).map(|p| p.chr()), Some('x'));
        assert_eq!(iter.peek_nth(4), None);
    }
}
