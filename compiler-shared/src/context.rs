//! State shared by the lexer, the parser and the semantic analysis.
use asciifile::AsciiFile;
use diagnostics::Diagnostics;
use std::io;
use termcolor::{NoColor, WriteColor};

pub struct Context<'m> {
    pub file: &'m AsciiFile<'m>,
    pub diagnostics: Diagnostics,
}

impl<'m> Context<'m> {
    pub fn new(file: &'m AsciiFile<'m>, writer: Box<dyn WriteColor>) -> Self {
        Self {
            file,
            diagnostics: Diagnostics::new(writer),
        }
    }

    /// Context whose diagnostics go nowhere. Only their counts survive.
    pub fn dummy(file: &'m AsciiFile<'m>) -> Self {
        Self::new(file, Box::new(dummy_writer()))
    }
}

pub fn dummy_writer() -> impl WriteColor {
    NoColor::new(io::sink())
}

#[cfg(test)]
mod tests {
    use super::*;
    use asciifile::MaybeSpanned;
    use diagnostics::MessageLevel;

    #[test]
    fn dummy_context_still_counts_errors() {
        let file = AsciiFile::new(b"class Main {}").unwrap();
        let context = Context::dummy(&file);
        let msg = "nope";

        context
            .diagnostics
            .error(MaybeSpanned::WithoutSpan(&msg as &dyn std::fmt::Display));

        assert!(context.diagnostics.errored());
        assert_eq!(context.diagnostics.count(MessageLevel::Error), 1);
    }
}
