use crate::{Position, PositionIterator};
use failure::Fail;
use std::ops::Deref;

/// A source file that was checked to only contain ASCII characters.
///
/// The byte offsets of all line breaks are collected once on construction,
/// which makes row and column lookups `O(log N)`. Rows are only requested
/// when diagnostics are printed or declarations are ordered, so this is
/// cheaper than tracking them in every `Position`.
#[derive(Debug)]
pub struct AsciiFile<'m> {
    text: &'m str,
    /// byte offsets of all `\n` characters, sorted ascending. The index of a
    /// line break within this list is the row it terminates.
    linebreaks: Vec<usize>,
}

#[derive(Debug, Fail)]
pub enum EncodingError {
    #[fail(
        display = "input contains non-ascii character at byte offset {}: {}<?>",
        position, prev
    )]
    NotAscii { position: usize, prev: String },
}

const ENCODING_ERROR_MAX_CONTEXT_LENGTH: usize = 80;

impl<'m> AsciiFile<'m> {
    // cost: O(fileLen) since we need to check if all chars are ASCII
    pub fn new(mapping: &'m [u8]) -> Result<AsciiFile<'m>, EncodingError> {
        if let Some(position) = mapping.iter().position(|c| !c.is_ascii()) {
            return Err(not_ascii(mapping, position));
        }

        let text =
            std::str::from_utf8(mapping).map_err(|err| not_ascii(mapping, err.valid_up_to()))?;

        let linebreaks = text.match_indices('\n').map(|(offset, _)| offset).collect();

        Ok(AsciiFile { text, linebreaks })
    }

    pub fn iter(&self) -> PositionIterator<'_> {
        PositionIterator::new(Position::at_file_start(self))
    }

    /// Zero based row of the character at `byte_offset`. A newline
    /// character belongs to the line it terminates.
    pub fn row(&self, byte_offset: usize) -> usize {
        match self.linebreaks.binary_search(&byte_offset) {
            Ok(row) | Err(row) => row,
        }
    }

    /// Zero based column of the character at `byte_offset`.
    pub fn column(&self, byte_offset: usize) -> usize {
        byte_offset - self.line_start(self.row(byte_offset))
    }

    /// Number of lines in the file. A trailing newline does not start
    /// another line.
    pub fn line_count(&self) -> usize {
        match self.linebreaks.last() {
            Some(&last) if last + 1 == self.text.len() => self.linebreaks.len(),
            _ => self.linebreaks.len() + 1,
        }
    }

    /// Text of the given row without its trailing newline.
    pub fn line(&self, row: usize) -> &'m str {
        let start = self.line_start(row).min(self.text.len());
        let end = self
            .linebreaks
            .get(row)
            .cloned()
            .unwrap_or_else(|| self.text.len());
        &self.text[start..end]
    }

    fn line_start(&self, row: usize) -> usize {
        match row {
            0 => 0,
            row => self.linebreaks[row - 1] + 1,
        }
    }
}

fn not_ascii(mapping: &[u8], position: usize) -> EncodingError {
    let line_start = mapping[..position]
        .iter()
        .rposition(|&chr| chr == b'\n')
        .map_or(0, |newline| newline + 1);

    let (dots, context_start) = if position - line_start > ENCODING_ERROR_MAX_CONTEXT_LENGTH {
        ("...", position - ENCODING_ERROR_MAX_CONTEXT_LENGTH)
    } else {
        ("", line_start)
    };

    // everything before `position` is ASCII, the lossy conversion is exact
    let prev = String::from_utf8_lossy(&mapping[context_start..position]);

    EncodingError::NotAscii {
        position,
        prev: format!("{}{}", dots, prev),
    }
}

impl<'m> Deref for AsciiFile<'m> {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_ascii_input() {
        let input = "class Main { string s; }\nclass B { int \u{e4}; }";
        match AsciiFile::new(input.as_bytes()) {
            Err(EncodingError::NotAscii { position, prev }) => {
                assert_eq!(position, 39);
                assert_eq!(prev, "class B { int ");
            }
            Ok(_) => panic!("non-ascii input was accepted"),
        }
    }

    #[test]
    fn long_lines_are_truncated_in_encoding_errors() {
        let mut input = "a".repeat(200).into_bytes();
        input.push(0xc3);
        input.push(0xa4);

        match AsciiFile::new(&input) {
            Err(EncodingError::NotAscii { prev, .. }) => {
                assert!(prev.starts_with("..."));
                assert_eq!(prev.len(), 3 + ENCODING_ERROR_MAX_CONTEXT_LENGTH);
            }
            Ok(_) => panic!("non-ascii input was accepted"),
        }
    }

    #[test]
    fn rows_and_columns() {
        let file = AsciiFile::new(b"ab\n\ncd\n").unwrap();
        let actual: Vec<_> = (0..file.len())
            .map(|offset| (file.row(offset), file.column(offset)))
            .collect();

        assert_eq!(
            actual,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (2, 0), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn lines() {
        let file = AsciiFile::new(b"banana\napple\n\nkiwi").unwrap();
        assert_eq!(file.line_count(), 4);
        assert_eq!(file.line(0), "banana");
        assert_eq!(file.line(1), "apple");
        assert_eq!(file.line(2), "");
        assert_eq!(file.line(3), "kiwi");

        let file = AsciiFile::new(b"one\n").unwrap();
        assert_eq!(file.line_count(), 1);
        assert_eq!(file.line(0), "one");
    }
}
