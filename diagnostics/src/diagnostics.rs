//! The diagnostics object controls the output of warnings and errors generated
//! by the compiler during the lexing, parsing and semantic analysis phases.
//! It also tracks the number of warnings and errors generated for flow control.
//!
//! This implementation is NOT thread-safe.
#![warn(rust_2018_idioms)]

use asciifile::{MaybeSpanned, Span};
use std::{
    ascii::escape_default,
    cell::RefCell,
    collections::HashMap,
    fmt,
    io::{self, Write},
};
use termcolor::{Color, ColorSpec, WriteColor};

/// Instead of writing errors and warnings generated in the different
/// compiler stages directly to stderr, they are collected in this object.
///
/// This has several advantages:
/// - the output level can be adapted by users.
/// - we have a single source responsible for formatting compiler messages.
pub struct Diagnostics {
    message_count: RefCell<HashMap<MessageLevel, usize>>,
    writer: RefCell<Box<dyn WriteColor>>,
}

impl Diagnostics {
    pub fn new(writer: Box<dyn WriteColor>) -> Self {
        Self {
            writer: RefCell::new(writer),
            message_count: RefCell::new(HashMap::new()),
        }
    }

    /// True when an error message was emitted, false
    /// if only warnings were emitted.
    pub fn errored(&self) -> bool {
        self.count(MessageLevel::Error) > 0
    }

    pub fn count(&self, level: MessageLevel) -> usize {
        self.message_count
            .borrow()
            .get(&level)
            .cloned()
            .unwrap_or(0)
    }

    pub fn write_statistics(&self) {
        let mut writer = self.writer.borrow_mut();
        let mut output = ColorOutput::new(&mut **writer);

        output.set_bold(true);

        // ignore write failures, there is nowhere left to report them
        if self.errored() {
            output.set_color(MessageLevel::Error.color());
            writeln!(
                output.writer(),
                "Compilation aborted due to {}",
                match self.count(MessageLevel::Error) {
                    1 => "an error".to_string(),
                    n => format!("{} errors", n),
                }
            )
            .ok();
        } else {
            output.set_color(Some(Color::Green));
            writeln!(
                output.writer(),
                "Compilation finished successfully {}",
                match self.count(MessageLevel::Warning) {
                    0 => "without warnings".to_string(),
                    1 => "with a warning".to_string(),
                    n => format!("with {} warnings", n),
                }
            )
            .ok();
        }
    }

    /// Generate an error or a warning that is printed to the
    /// writer given in the `new` constructor. Most of the time
    /// this will be stderr.
    pub fn emit(&self, level: MessageLevel, kind: MaybeSpanned<'_, &dyn fmt::Display>) {
        self.increment_level_count(level);
        let msg = Message { level, kind };

        let mut writer = self.writer.borrow_mut();
        msg.write_colored(&mut **writer).ok();
    }

    pub fn error<'a, 'b>(&self, kind: impl Into<MaybeSpanned<'a, &'b dyn fmt::Display>>) {
        self.emit(MessageLevel::Error, kind.into())
    }

    pub fn warning<'a, 'b>(&self, kind: impl Into<MaybeSpanned<'a, &'b dyn fmt::Display>>) {
        self.emit(MessageLevel::Warning, kind.into())
    }

    fn increment_level_count(&self, level: MessageLevel) {
        let mut message_count = self.message_count.borrow_mut();
        let counter = message_count.entry(level).or_insert(0);
        *counter += 1;
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MessageLevel {
    Error,
    Warning,
}

impl MessageLevel {
    fn color(self) -> Option<Color> {
        // Don't be confused by the return type. `None` means default color!
        match self {
            MessageLevel::Error => Some(Color::Red),
            MessageLevel::Warning => Some(Color::Yellow),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MessageLevel::Error => "error",
            MessageLevel::Warning => "warning",
        }
    }
}

struct Message<'a, 'b> {
    level: MessageLevel,
    kind: MaybeSpanned<'a, &'b dyn fmt::Display>,
}

/// Terminal style guard. Every function that writes colored output creates
/// its own instance from the raw writer; dropping it resets the terminal, so
/// nested calls cannot leak their colors into the output of the caller.
struct ColorOutput<'a> {
    writer: &'a mut dyn WriteColor,
    spec: ColorSpec,
}

impl<'a> ColorOutput<'a> {
    fn new(writer: &'a mut dyn WriteColor) -> Self {
        writer.reset().ok();

        Self {
            writer,
            spec: ColorSpec::new(),
        }
    }

    fn set_color(&mut self, color: Option<Color>) {
        self.spec.set_fg(color);
        self.writer.set_color(&self.spec).ok();
    }

    fn set_bold(&mut self, yes: bool) {
        self.spec.set_bold(yes);
        self.writer.set_color(&self.spec).ok();
    }

    fn set_style(&mut self, color: Option<Color>, bold: bool) {
        self.set_color(color);
        self.set_bold(bold);
    }

    fn writer(&mut self) -> &mut dyn WriteColor {
        &mut *self.writer
    }
}

impl<'a> Drop for ColorOutput<'a> {
    fn drop(&mut self) {
        self.writer.reset().ok();
    }
}

const TAB_WIDTH: usize = 4;
const HIGHLIGHT: Option<Color> = Some(Color::Cyan);

impl Message<'_, '_> {
    fn write_colored(&self, writer: &mut dyn WriteColor) -> io::Result<()> {
        self.write_colored_header(writer)?;

        match self.kind.span() {
            Some(span) => self.write_source_snippet(writer, &span),
            None => writeln!(writer),
        }
    }

    fn write_colored_header(&self, writer: &mut dyn WriteColor) -> io::Result<()> {
        let mut output = ColorOutput::new(writer);
        output.set_style(self.level.color(), true);
        write!(output.writer(), "{}", self.level.name())?;

        if let Some(span) = self.kind.span() {
            let start = span.start_position();
            write!(
                output.writer(),
                " at ({},{})",
                start.line_number(),
                start.column() + 1
            )?;
        }

        write!(output.writer(), ": ")?;
        output.set_style(None, false);
        writeln!(output.writer(), "{}", *self.kind)
    }

    fn write_source_snippet(&self, writer: &mut dyn WriteColor, span: &Span<'_>) -> io::Result<()> {
        let start = span.start_position();
        let end = span.end_position();

        let line_number_width = end.line_number().to_string().len();

        // NOTE: this has to be the same width as the line_marker with
        // line numbers, otherwise the indicators for single line errors
        // are misaligned.
        let empty_line_marker = format!(" {} | ", " ".repeat(line_number_width));

        let mut output = ColorOutput::new(writer);

        // add padding line above
        output.set_style(HIGHLIGHT, true);
        writeln!(output.writer(), "{}", empty_line_marker.trim_end())?;

        if !span.is_multiline() {
            write!(
                output.writer(),
                " {} | ",
                pad_left(&start.line_number().to_string(), line_number_width)
            )?;

            output.set_style(None, false);
            let formatter = LineFormatter::new(start.line());
            formatter.render(output.writer())?;
            writeln!(output.writer())?;

            // add positional indicators below the line
            output.set_style(HIGHLIGHT, true);
            write!(output.writer(), "{}", empty_line_marker)?;

            let indent = formatter.get_actual_column(start.column());
            let width = formatter
                .get_actual_column(end.column() + 1)
                .saturating_sub(indent)
                .max(1);

            output.set_style(self.level.color(), true);
            writeln!(
                output.writer(),
                "{}{}",
                " ".repeat(indent),
                "^".repeat(width)
            )?;
        } else {
            // Mark every line of a multiline span at its start instead of
            // underlining it.
            for row in start.row()..=end.row() {
                output.set_style(HIGHLIGHT, true);
                write!(
                    output.writer(),
                    " {} |",
                    pad_left(&(row + 1).to_string(), line_number_width)
                )?;

                output.set_color(self.level.color());
                write!(output.writer(), "> ")?;

                output.set_style(None, false);
                LineFormatter::new(start.file().line(row)).render(output.writer())?;
                writeln!(output.writer())?;
            }

            // add padding line below
            output.set_style(HIGHLIGHT, true);
            writeln!(output.writer(), "{}", empty_line_marker.trim_end())?;
        }

        writeln!(output.writer())
    }
}

pub fn u8_to_printable_representation(byte: u8) -> String {
    escape_default(byte).map(char::from).collect()
}

struct LineFormatter<'a> {
    line: &'a str,
}

impl<'a> LineFormatter<'a> {
    fn new(line: &'a str) -> Self {
        Self { line }
    }

    fn render(&self, writer: &mut dyn WriteColor) -> io::Result<()> {
        let mut output = ColorOutput::new(writer);

        for chr in self.line.chars() {
            let (text, color) = self.render_char(chr);
            output.set_color(color);
            write!(output.writer(), "{}", text)?;
        }

        Ok(())
    }

    /// Each printed character does not actually take up one monospace grid
    /// cell, for example a TAB character is represented by 4 spaces. This
    /// function returns the actual number of monospace grid cells
    /// rendered before the given column.
    fn get_actual_column(&self, col: usize) -> usize {
        let col = col.min(self.line.len());
        self.line[0..col]
            .chars()
            .map(|chr| self.render_char(chr).0.len())
            .sum()
    }

    fn render_char(&self, chr: char) -> (String, Option<Color>) {
        match chr {
            '\t' => (" ".repeat(TAB_WIDTH), None),
            '\r' => ("".to_string(), None),
            chr if chr.is_control() => (
                format!("{{{}}}", u8_to_printable_representation(chr as u8)),
                HIGHLIGHT,
            ),
            _ => (chr.to_string(), None),
        }
    }
}

pub fn pad_left(s: &str, pad: usize) -> String {
    format!(
        "{padding}{string}",
        padding = " ".repeat(pad.saturating_sub(s.len())),
        string = s
    )
}
