//! Turns a Decaf source file into a stream of spanned tokens.
#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]

pub mod lextest;

use asciifile::{Position, PositionIterator, Span, Spanned};
use compiler_shared::context::Context;
use derive_more::Display;
use diagnostics::u8_to_printable_representation;
use failure::Fail;
use std::{convert::TryFrom, fmt, result::Result};
use strtab::{StringTable, Symbol};

macro_rules! match_op {
    ($input:expr, $( ($token_string:expr, $token:expr) ),+: $len:expr, $default:expr) => {{
        match $input.peek_at_most($len) {
            $(
                Some(span) if span.as_str() == $token_string => match_op!($input, span, $len, $token),
            )+
            _ => $default,
        }
    }};
    ($input:expr, $span:ident, $len:expr, $right:expr) => {{
        // The span was peeked with exactly $len characters, so they all exist
        debug_assert!($len >= 1);
        for _ in 0..$len {
            $input.next();
        }
        Some(Ok(Token::new($span, TokenKind::Operator($right))))
    }};
}

pub type TokenResult<'f> = Result<Token<'f>, LexicalError<'f>>;

pub type Token<'f> = Spanned<'f, TokenKind<'f>>;
pub type LexicalError<'f> = Spanned<'f, ErrorKind>;

pub type IntLit<'f> = &'f str;
pub type DoubleLit<'f> = &'f str;
pub type StringLit<'f> = &'f str;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Display)]
/// Keywords are single-ticked, operators back-ticked
pub enum TokenKind<'f> {
    #[display(fmt = "'{}'", _0)]
    Keyword(Keyword),
    #[display(fmt = "`{}`", _0)]
    Operator(Operator),
    #[display(fmt = "identifier `{}`", _0)]
    Identifier(Symbol<'f>),
    #[display(fmt = "integer literal `{}`", _0)]
    IntegerLiteral(IntLit<'f>),
    #[display(fmt = "double literal `{}`", _0)]
    DoubleLiteral(DoubleLit<'f>),
    /// Text between the quotes, escape sequences are kept as written
    #[display(fmt = "string literal \"{}\"", _0)]
    StringLiteral(StringLit<'f>),
    #[display(fmt = "a comment")]
    Comment(&'f str),
    #[display(fmt = "whitespace")]
    Whitespace,
}

#[derive(Debug, Fail)]
pub enum ErrorKind {
    UnexpectedCharacter(u8),
    UnterminatedString,
    NewlineInString,
    InvalidEscape(u8),
    IntegerTooLarge(String),
    DoubleTooLarge(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnexpectedCharacter(byte) => fmt_unexpected_character(f, *byte),
            ErrorKind::UnterminatedString => write!(f, "unterminated string constant"),
            ErrorKind::NewlineInString => write!(f, "illegal newline in string constant"),
            ErrorKind::InvalidEscape(byte) => write!(
                f,
                "unknown escape sequence '\\{}'",
                u8_to_printable_representation(*byte)
            ),
            ErrorKind::IntegerTooLarge(lit) => write!(f, "integer literal {} is too large", lit),
            ErrorKind::DoubleTooLarge(lit) => write!(f, "double literal {} is too large", lit),
        }
    }
}

fn fmt_unexpected_character(f: &mut fmt::Formatter<'_>, byte: u8) -> fmt::Result {
    match byte as char {
        '\\' => write!(f, "unexpected backslash"),
        '\'' => write!(f, "unexpected single quote"),
        chr if chr.is_whitespace() => write!(
            f,
            "unexpected whitespace '{}'",
            u8_to_printable_representation(byte)
        ),
        chr if chr.is_control() => write!(
            f,
            "unexpected control character '{}'",
            u8_to_printable_representation(byte)
        ),
        _ => write!(
            f,
            "unrecognized character '{}'",
            u8_to_printable_representation(byte)
        ),
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Copy)]
pub enum Keyword {
    Bool,
    Break,
    Class,
    Double,
    Else,
    Extends,
    False,
    For,
    If,
    InstanceOf,
    Int,
    New,
    Null,
    Print,
    ReadInteger,
    ReadLine,
    Repeat,
    Return,
    Static,
    String,
    This,
    True,
    Until,
    Void,
    While,
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::Keyword::*;
        write!(
            f,
            "{}",
            match self {
                Bool => "bool",
                Break => "break",
                Class => "class",
                Double => "double",
                Else => "else",
                Extends => "extends",
                False => "false",
                For => "for",
                If => "if",
                InstanceOf => "instanceof",
                Int => "int",
                New => "new",
                Null => "null",
                Print => "Print",
                ReadInteger => "ReadInteger",
                ReadLine => "ReadLine",
                Repeat => "repeat",
                Return => "return",
                Static => "static",
                String => "string",
                This => "this",
                True => "true",
                Until => "until",
                Void => "void",
                While => "while",
            }
        )
    }
}

impl TryFrom<&str> for Keyword {
    type Error = ();

    fn try_from(s: &str) -> Result<Keyword, Self::Error> {
        use self::Keyword::*;

        match s {
            "bool" => Ok(Bool),
            "break" => Ok(Break),
            "class" => Ok(Class),
            "double" => Ok(Double),
            "else" => Ok(Else),
            "extends" => Ok(Extends),
            "false" => Ok(False),
            "for" => Ok(For),
            "if" => Ok(If),
            "instanceof" => Ok(InstanceOf),
            "int" => Ok(Int),
            "new" => Ok(New),
            "null" => Ok(Null),
            "Print" => Ok(Print),
            "ReadInteger" => Ok(ReadInteger),
            "ReadLine" => Ok(ReadLine),
            "repeat" => Ok(Repeat),
            "return" => Ok(Return),
            "static" => Ok(Static),
            "string" => Ok(String),
            "this" => Ok(This),
            "true" => Ok(True),
            "until" => Ok(Until),
            "void" => Ok(Void),
            "while" => Ok(While),
            _ => Err(()),
        }
    }
}

// Use non-semantic names, since e.g. '<' might mean more than 'less-than'
#[derive(Debug, PartialEq, Eq, Clone, Hash, PartialOrd, Ord, Copy)]
pub enum Operator {
    ExclaimEqual,
    Exclaim,
    LeftParen,
    RightParen,
    Star,
    Plus,
    Comma,
    Minus,
    Dot,
    Slash,
    Semicolon,
    LeftChevronEqual,
    LeftChevron,
    DoubleEqual,
    Equal,
    RightChevronEqual,
    RightChevron,
    Percent,
    DoubleAmpersand,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    DoublePipe,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::Operator::*;
        write!(
            f,
            "{}",
            match self {
                ExclaimEqual => "!=",
                LeftChevronEqual => "<=",
                DoubleEqual => "==",
                RightChevronEqual => ">=",
                DoubleAmpersand => "&&",
                DoublePipe => "||",
                Exclaim => "!",
                LeftParen => "(",
                RightParen => ")",
                Star => "*",
                Plus => "+",
                Comma => ",",
                Minus => "-",
                Dot => ".",
                Slash => "/",
                Semicolon => ";",
                LeftChevron => "<",
                Equal => "=",
                RightChevron => ">",
                Percent => "%",
                LeftBracket => "[",
                RightBracket => "]",
                LeftBrace => "{",
                RightBrace => "}",
            }
        )
    }
}

pub struct Lexer<'f, 's> {
    input: PositionIterator<'f>,
    strtab: &'s mut StringTable<'f>,
}

fn is_decaf_whitespace(c: char) -> bool {
    match c {
        ' ' | '\n' | '\r' | '\t' => true,
        _ => false,
    }
}

impl<'f, 's> Lexer<'f, 's> {
    pub fn new(strtab: &'s mut StringTable<'f>, context: &'f Context<'f>) -> Self {
        Self {
            input: context.file.iter(),
            strtab,
        }
    }

    fn lex_token(&mut self) -> Option<TokenResult<'f>> {
        let position = self.input.peek()?;

        Some(match position.chr() {
            'a'..='z' | 'A'..='Z' => self.lex_identifier_or_keyword(position),
            '0'..='9' => self.lex_number(position),
            '"' => self.lex_string(position),
            c if is_decaf_whitespace(c) => self.lex_whitespace(position),
            '/' if self.input.matches("//") => self.lex_comment(position),

            _ => self.lex_operator().unwrap_or_else(|| {
                self.input.next();
                Err(LexicalError::new(
                    position.to_single_char_span(),
                    ErrorKind::UnexpectedCharacter(position.byte()),
                ))
            }),
        })
    }

    fn lex_identifier_or_keyword(&mut self, start: Position<'f>) -> TokenResult<'f> {
        let span = self.lex_while(start, |position| {
            let chr = position.chr();
            chr.is_ascii_alphanumeric() || chr == '_'
        });

        let kind = match Keyword::try_from(span.as_str()) {
            Ok(keyword) => TokenKind::Keyword(keyword),
            Err(_) => TokenKind::Identifier(self.strtab.intern(span.as_str())),
        };

        Ok(Token::new(span, kind))
    }

    fn lex_number(&mut self, start: Position<'f>) -> TokenResult<'f> {
        let is_hex = (self.input.matches("0x") || self.input.matches("0X"))
            && self
                .input
                .peek_nth(2)
                .map_or(false, |position| position.chr().is_ascii_hexdigit());

        if is_hex {
            return self.lex_hex_integer_literal(start);
        }

        let digits = self.lex_while(start, |position| position.chr().is_ascii_digit());

        match self.input.peek() {
            Some(dot) if dot.chr() == '.' => self.lex_double_literal(digits, dot),
            _ => {
                let lit = digits.as_str();
                if lit.parse::<i32>().is_err() {
                    return Err(LexicalError::new(
                        digits,
                        ErrorKind::IntegerTooLarge(lit.to_string()),
                    ));
                }
                Ok(Token::new(digits, TokenKind::IntegerLiteral(lit)))
            }
        }
    }

    fn lex_hex_integer_literal(&mut self, start: Position<'f>) -> TokenResult<'f> {
        let span = self.lex_while(start, |position| {
            let chr = position.chr();
            chr.is_ascii_hexdigit() || chr == 'x' || chr == 'X'
        });

        let lit = span.as_str();
        let hex_digits = &lit[2..];
        if hex_digits.contains(|c: char| c == 'x' || c == 'X') {
            return Err(LexicalError::new(
                span,
                ErrorKind::UnexpectedCharacter(b'x'),
            ));
        }

        if i32::from_str_radix(hex_digits, 16).is_err() {
            return Err(LexicalError::new(
                span,
                ErrorKind::IntegerTooLarge(lit.to_string()),
            ));
        }

        Ok(Token::new(span, TokenKind::IntegerLiteral(lit)))
    }

    /// Continues a number at its decimal point: `digits '.' digits? exponent?`.
    fn lex_double_literal(&mut self, integral: Span<'f>, dot: Position<'f>) -> TokenResult<'f> {
        self.input.next();
        let mut span = integral.extend_to_position(&dot);

        if let Some(digit) = self.peek_digit(0) {
            let fraction = self.lex_while(digit, |position| position.chr().is_ascii_digit());
            span = Span::combine(&span, &fraction);
        }

        // The exponent is only part of the literal if digits follow it
        let sign_len = match self.input.peek_nth(1).map(|position| position.chr()) {
            Some('+') | Some('-') => 1,
            _ => 0,
        };
        let has_exponent = match self.input.peek().map(|position| position.chr()) {
            Some('e') | Some('E') => self.peek_digit(1 + sign_len).is_some(),
            _ => false,
        };

        if has_exponent {
            for _ in 0..=sign_len {
                if let Some(position) = self.input.next() {
                    span = span.extend_to_position(&position);
                }
            }
            if let Some(digit) = self.peek_digit(0) {
                let exponent = self.lex_while(digit, |position| position.chr().is_ascii_digit());
                span = Span::combine(&span, &exponent);
            }
        }

        let lit = span.as_str();
        let finite = normalize_double_literal(lit)
            .parse::<f64>()
            .map(f64::is_finite)
            .unwrap_or(false);

        if !finite {
            return Err(LexicalError::new(
                span,
                ErrorKind::DoubleTooLarge(lit.to_string()),
            ));
        }

        Ok(Token::new(span, TokenKind::DoubleLiteral(lit)))
    }

    fn peek_digit(&self, n: usize) -> Option<Position<'f>> {
        self.input
            .peek_nth(n)
            .filter(|position| position.chr().is_ascii_digit())
    }

    fn lex_string(&mut self, opening: Position<'f>) -> TokenResult<'f> {
        self.input.next();
        let mut span = opening.to_single_char_span();

        loop {
            let position = match self.input.next() {
                Some(position) => position,
                None => return Err(LexicalError::new(span, ErrorKind::UnterminatedString)),
            };

            match position.chr() {
                '"' => {
                    span = span.extend_to_position(&position);
                    break;
                }
                '\n' => return Err(LexicalError::new(span, ErrorKind::NewlineInString)),
                '\\' => {
                    let escaped = match self.input.next() {
                        Some(escaped) => escaped,
                        None => {
                            return Err(LexicalError::new(span, ErrorKind::UnterminatedString));
                        }
                    };
                    span = span.extend_to_position(&escaped);
                    match escaped.chr() {
                        'n' | 't' | '"' | '\\' => (),
                        _ => {
                            return Err(LexicalError::new(
                                Span::new(position, escaped),
                                ErrorKind::InvalidEscape(escaped.byte()),
                            ));
                        }
                    }
                }
                _ => span = span.extend_to_position(&position),
            }
        }

        let text = span.as_str();
        let body = &text[1..text.len() - 1];
        Ok(Token::new(span, TokenKind::StringLiteral(body)))
    }

    fn lex_comment(&mut self, start: Position<'f>) -> TokenResult<'f> {
        let span = self.lex_while(start, |position| position.chr() != '\n');
        Ok(Token::new(span, TokenKind::Comment(&span.as_str()[2..])))
    }

    fn lex_whitespace(&mut self, start: Position<'f>) -> TokenResult<'f> {
        let span = self.lex_while(start, |position| is_decaf_whitespace(position.chr()));
        Ok(Token::new(span, TokenKind::Whitespace))
    }

    fn lex_operator(&mut self) -> Option<TokenResult<'f>> {
        use self::Operator::*;

        match_op!(
            self.input,
            ("!=", ExclaimEqual),
            ("<=", LeftChevronEqual),
            ("==", DoubleEqual),
            (">=", RightChevronEqual),
            ("&&", DoubleAmpersand),
            ("||", DoublePipe):
            2,
            match_op!(
                self.input,
                ("!", Exclaim),
                ("(", LeftParen),
                (")", RightParen),
                ("*", Star),
                ("+", Plus),
                (",", Comma),
                ("-", Minus),
                (".", Dot),
                ("/", Slash),
                (";", Semicolon),
                ("<", LeftChevron),
                ("=", Equal),
                (">", RightChevron),
                ("%", Percent),
                ("[", LeftBracket),
                ("]", RightBracket),
                ("{", LeftBrace),
                ("}", RightBrace):
                1,
                None
            )
        )
    }

    /// Consumes `start`, which the caller has just peeked, and then further
    /// characters as long as `predicate` holds for them.
    fn lex_while<P>(&mut self, start: Position<'f>, predicate: P) -> Span<'f>
    where
        P: Fn(Position<'f>) -> bool,
    {
        debug_assert_eq!(self.input.peek(), Some(start));
        self.input.next();
        let mut consumed = start.to_single_char_span();

        while let Some(peeked) = self.input.peek() {
            if !predicate(peeked) {
                break;
            }
            self.input.next();
            consumed = consumed.extend_to_position(&peeked);
        }

        consumed
    }
}

/// `1.` and `1.E5` are valid Decaf but not accepted by `f64::from_str`.
fn normalize_double_literal(lit: &str) -> String {
    let mut normalized = String::with_capacity(lit.len() + 1);
    let mut chars = lit.chars().peekable();

    while let Some(chr) = chars.next() {
        normalized.push(chr);
        if chr == '.' && !chars.peek().map_or(false, char::is_ascii_digit) {
            normalized.push('0');
        }
    }

    normalized
}

impl<'f, 's> Iterator for Lexer<'f, 's> {
    type Item = TokenResult<'f>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lex_token()
    }
}
