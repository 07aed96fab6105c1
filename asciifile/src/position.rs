//! Abstraction over a character and its position within a file.
//!
//! There is no end of file character. The end of file is modeled using
//! the `None` case of `Option`.
use super::{AsciiFile, PositionIterator, Span};
use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display},
};

#[derive(Copy, Clone)]
pub struct Position<'t> {
    byte_offset: usize,
    file: &'t AsciiFile<'t>,
}

impl PartialOrd for Position<'_> {
    fn partial_cmp(&self, other: &Position<'_>) -> Option<Ordering> {
        if !std::ptr::eq(self.file, other.file) {
            return None;
        }
        Some(self.byte_offset.cmp(&other.byte_offset))
    }
}

impl Ord for Position<'_> {
    fn cmp(&self, other: &Position<'_>) -> Ordering {
        if !std::ptr::eq(self.file, other.file) {
            panic!(
                "comparing positions of different files: {:?} {:?}",
                self.file as *const _, other.file as *const _
            )
        }
        self.byte_offset.cmp(&other.byte_offset)
    }
}

impl<'t> Position<'t> {
    /// Create a new Position object pointing at the first character
    /// of a file. Returns `None` for empty files.
    pub fn at_file_start(file: &'t AsciiFile<'t>) -> Option<Self> {
        if file.is_empty() {
            None
        } else {
            Some(Self {
                byte_offset: 0,
                file,
            })
        }
    }

    pub fn to_single_char_span(self) -> Span<'t> {
        Span::from_single_position(self)
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn file(&self) -> &'t AsciiFile<'t> {
        self.file
    }

    /// Get the character at this position
    pub fn chr(&self) -> char {
        self.byte() as char
    }

    /// Get the byte at this position
    ///
    /// For matching on the character or comparisons, you probably want `chr()`
    /// instead.
    pub fn byte(&self) -> u8 {
        self.file.as_bytes()[self.byte_offset]
    }

    /// Return the row of the character's position within the file.
    ///
    /// The row is zero based, meaning characters on the first line
    /// of the file are in row `0`. To get the line number, add `1` to
    /// the return value.
    pub fn row(&self) -> usize {
        self.file.row(self.byte_offset)
    }

    /// Identical to `row() + 1`
    pub fn line_number(&self) -> usize {
        self.row() + 1
    }

    /// The column is zero based, meaning the first character of
    /// a line/row is positioned at column `0`.
    pub fn column(&self) -> usize {
        self.file.column(self.byte_offset)
    }

    pub fn row_and_column(&self) -> (usize, usize) {
        (self.row(), self.column())
    }

    /// Get the position immediatly following this position or `None` if
    /// this is the last position in the file.
    pub fn next(&self) -> Option<Position<'t>> {
        if self.byte_offset + 1 < self.file.len() {
            Some(Position {
                byte_offset: self.byte_offset + 1,
                file: self.file,
            })
        } else {
            None
        }
    }

    /// Get the position immediatly preceding this position or `None` if
    /// this is the first position in the file.
    pub fn prev(&self) -> Option<Position<'t>> {
        self.byte_offset.checked_sub(1).map(|byte_offset| Position {
            byte_offset,
            file: self.file,
        })
    }

    pub fn is_last(&self) -> bool {
        self.next().is_none()
    }

    /// Source code line containing the position, without the trailing
    /// newline character.
    pub fn line(&self) -> &'t str {
        self.file.line(self.row())
    }

    pub fn iter(&self) -> PositionIterator<'t> {
        PositionIterator::new(Some(*self))
    }
}

impl Display for Position<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}:{}", self.line_number(), self.column())
    }
}

impl Debug for Position<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            fmt,
            "Position{{row: {:?}, col: {:?}, byte_offset: {:?}, file: {:?}}}",
            self.row(),
            self.column(),
            self.byte_offset,
            self.file as *const _
        )
    }
}

impl PartialEq for Position<'_> {
    fn eq(&self, rhs: &Position<'_>) -> bool {
        self.byte_offset == rhs.byte_offset && std::ptr::eq(self.file, rhs.file)
    }
}

impl Eq for Position<'_> {}
