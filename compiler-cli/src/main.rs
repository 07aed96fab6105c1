#![warn(rust_2018_idioms)]

//! Command line driver: lexes, parses and semantically checks one Decaf
//! source file.

use asciifile::{AsciiFile, MaybeSpanned, Span};
use compiler_shared::context::{self, Context};
use diagnostics::MessageLevel;
use failure::{Error, Fail, ResultExt};
use lexer::{lextest, Lexer, Token, TokenKind};
use log::{debug, info};
use memmap::Mmap;
use parser::Parser;
use serde_derive::Serialize;
use std::{
    fmt,
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    process::exit,
    str::FromStr,
};
use strtab::StringTable;
use structopt::StructOpt;
use termcolor::{ColorChoice, StandardStream, WriteColor};
use type_checking::{AnalysisAborted, SemanticContext};

#[derive(Debug, Fail)]
pub enum CliError {
    #[fail(display = "cannot open input file {:?}", path)]
    OpenInput { path: PathBuf },
    #[fail(display = "cannot memory-map input file {:?}", path)]
    Mmap { path: PathBuf },
    #[fail(display = "cannot decode input file {:?}", path)]
    Ascii { path: PathBuf },
    #[fail(display = "unknown message format '{}', expected 'human' or 'json'", format)]
    MessageFormat { format: String },
    #[fail(
        display = "unknown color choice '{}', expected 'auto', 'always' or 'never'",
        choice
    )]
    Color { choice: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    /// Colored messages with source snippets on stderr
    Human,
    /// A JSON array of messages on stdout
    Json,
}

impl FromStr for MessageFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(MessageFormat::Human),
            "json" => Ok(MessageFormat::Json),
            format => Err(CliError::MessageFormat {
                format: format.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColorArg(ColorChoice);

impl FromStr for ColorArg {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ColorArg(ColorChoice::Auto)),
            "always" => Ok(ColorArg(ColorChoice::Always)),
            "never" => Ok(ColorArg(ColorChoice::Never)),
            choice => Err(CliError::Color {
                choice: choice.to_string(),
            }),
        }
    }
}

#[derive(StructOpt)]
#[structopt(name = "decafc")]
pub struct CliCommand {
    /// Print the token stream of FILE, one token per line
    #[structopt(long = "lextest", raw(conflicts_with_all = r#"&["parsetest", "check"]"#))]
    lextest: bool,
    /// Only check that FILE is syntactically valid
    #[structopt(long = "parsetest", raw(conflicts_with = r#""check""#))]
    parsetest: bool,
    /// Run the full semantic analysis on FILE. This is the default.
    #[structopt(long = "check")]
    check: bool,
    /// How compiler messages are printed: human or json
    #[structopt(long = "message-format", default_value = "human")]
    message_format: MessageFormat,
    /// Colored output: auto, always or never
    #[structopt(long = "color", default_value = "auto")]
    color: ColorArg,
    /// Decaf source file
    #[structopt(name = "FILE", parse(from_os_str))]
    input: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    Lexer,
    Parser,
    Semantics,
}

impl CliCommand {
    fn last_phase(&self) -> Phase {
        if self.lextest {
            Phase::Lexer
        } else if self.parsetest {
            Phase::Parser
        } else {
            Phase::Semantics
        }
    }
}

fn main() {
    env_logger::init();
    let cmd = CliCommand::from_args();

    match run(&cmd) {
        Ok(0) => {}
        Ok(code) => exit(code),
        Err(err) => exit_with_error(&err),
    }
}

/// Compile the input up to the requested phase. Returns the exit code.
fn run(cmd: &CliCommand) -> Result<i32, Error> {
    let input = Input::open(&cmd.input)?;
    let file = AsciiFile::new(input.bytes()).context(CliError::Ascii {
        path: cmd.input.clone(),
    })?;

    let writer: Box<dyn WriteColor> = match cmd.message_format {
        MessageFormat::Human => Box::new(StandardStream::stderr(cmd.color.0)),
        MessageFormat::Json => Box::new(context::dummy_writer()),
    };
    let context = Context::new(&file, writer);
    let mut reporter = Reporter::new(&context, cmd.message_format);
    let mut strtab = StringTable::new();

    let phase = cmd.last_phase();
    info!("compiling {:?} up to {:?}", cmd.input, phase);

    let tokens = match lex(&mut strtab, &context, &mut reporter, phase == Phase::Lexer)? {
        Some(tokens) => tokens,
        None => return reporter.finish(),
    };
    if phase == Phase::Lexer {
        return reporter.finish();
    }

    let ast = match Parser::new(tokens.into_iter()).parse() {
        Ok(ast) => ast,
        Err(error) => {
            reporter.error("SyntaxError", &*error, error.span());
            return reporter.finish();
        }
    };
    if phase == Phase::Parser {
        return reporter.finish();
    }

    let sem_context = SemanticContext::new(&context);
    let result = type_checking::analyze(&mut strtab, &ast, &sem_context);
    for error in sem_context.errors().iter() {
        reporter.error(&error.kind().to_string(), &**error, error.span());
    }

    match result {
        Ok((table, type_analysis)) => debug!(
            "{} classes, {} typed expressions",
            table.classes().count(),
            type_analysis.expr_count()
        ),
        Err(err) => {
            if err.downcast_ref::<AnalysisAborted>().is_none() {
                return Err(err);
            }
            info!("{}", err);
        }
    }

    reporter.finish()
}

/// Tokens of the file without whitespace and comments. Stops at the first
/// lexical error, which is reported, and returns `None` in that case. With
/// `print` every token is written to stdout as it is produced.
fn lex<'f>(
    strtab: &mut StringTable<'f>,
    context: &'f Context<'f>,
    reporter: &mut Reporter<'_, 'f>,
    print: bool,
) -> Result<Option<Vec<Token<'f>>>, Error> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut tokens = Vec::new();

    for result in Lexer::new(strtab, context) {
        let token = match result {
            Ok(token) => token,
            Err(error) => {
                reporter.error("LexicalError", &error.data, Some(error.span));
                return Ok(None);
            }
        };

        match token.data {
            TokenKind::Whitespace | TokenKind::Comment(_) => continue,
            _ => {}
        }
        if print {
            writeln!(out, "{}", lextest::Output::new(&token.data))?;
        }
        tokens.push(token);
    }

    if print {
        writeln!(out, "EOF")?;
    }
    Ok(Some(tokens))
}

/// The source file. Empty files cannot be mapped.
enum Input {
    Mapped(Mmap),
    Empty,
}

impl Input {
    fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).context(CliError::OpenInput {
            path: path.to_path_buf(),
        })?;
        let len = file
            .metadata()
            .context(CliError::OpenInput {
                path: path.to_path_buf(),
            })?
            .len();
        if len == 0 {
            return Ok(Input::Empty);
        }

        // the mapping is read only and lives as long as the compilation
        let mmap = unsafe { Mmap::map(&file) }.context(CliError::Mmap {
            path: path.to_path_buf(),
        })?;
        Ok(Input::Mapped(mmap))
    }

    fn bytes(&self) -> &[u8] {
        match self {
            Input::Mapped(mmap) => &mmap[..],
            Input::Empty => &[],
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonMessage {
    level: &'static str,
    kind: String,
    message: String,
    line: Option<usize>,
    column: Option<usize>,
}

/// Writes compiler messages in the requested format and decides the exit
/// code
struct Reporter<'ctx, 'f> {
    context: &'ctx Context<'f>,
    format: MessageFormat,
    json: Vec<JsonMessage>,
}

impl<'ctx, 'f> Reporter<'ctx, 'f> {
    fn new(context: &'ctx Context<'f>, format: MessageFormat) -> Self {
        Self {
            context,
            format,
            json: Vec::new(),
        }
    }

    fn error(&mut self, kind: &str, message: &dyn fmt::Display, span: Option<Span<'f>>) {
        // counted in both formats, the exit code depends on it
        self.context
            .diagnostics
            .error(MaybeSpanned::new(span, message));

        if self.format == MessageFormat::Json {
            let start = span.map(|span| span.start_position());
            self.json.push(JsonMessage {
                level: MessageLevel::Error.name(),
                kind: kind.to_string(),
                message: message.to_string(),
                line: start.map(|start| start.line_number()),
                column: start.map(|start| start.column() + 1),
            });
        }
    }

    fn finish(self) -> Result<i32, Error> {
        match self.format {
            MessageFormat::Human => self.context.diagnostics.write_statistics(),
            MessageFormat::Json => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                serde_json::to_writer_pretty(&mut out, &self.json)?;
                writeln!(out)?;
            }
        }

        Ok(if self.context.diagnostics.errored() {
            1
        } else {
            0
        })
    }
}

/// Print an error in a format intended for end users and terminate
/// the program.
fn exit_with_error(err: &Error) -> ! {
    let mut stderr = io::stderr();
    print_error(&mut stderr, err).ok();
    exit(1);
}

/// Print error objects in a format intended for end users
fn print_error(writer: &mut dyn io::Write, err: &Error) -> Result<(), Error> {
    writeln!(writer, "error: {}", err.as_fail())?;
    for cause in err.iter_causes() {
        writeln!(writer, "caused by: {}", cause)?;
    }
    Ok(())
}
