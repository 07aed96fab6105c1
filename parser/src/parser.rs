//! Recursive descent parser for Decaf. Binary expressions are parsed with
//! an operator precedence table instead of one function per level.
#![warn(rust_2018_idioms)]
#![warn(clippy::print_stdout)]

pub mod ast;
mod tokens;

use crate::tokens::TokenCursor;
use asciifile::{
    MaybeSpanned::{self, *},
    Span, Spanned,
};
use derive_more::Display;
use failure::Fail;
use lexer::{Keyword, Operator, Token, TokenKind};
use std::fmt;
use strtab::Symbol;

type Precedence = usize;
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    /// `a < b < c` is rejected
    None,
}
#[rustfmt::skip]
const BINARY_OPERATORS: &[(Operator, ast::BinaryOp, Precedence, Assoc)] = &[
    (Operator::Star,              ast::BinaryOp::Mul,           1, Assoc::Left),
    (Operator::Slash,             ast::BinaryOp::Div,           1, Assoc::Left),
    (Operator::Percent,           ast::BinaryOp::Mod,           1, Assoc::Left),

    (Operator::Plus,              ast::BinaryOp::Add,           2, Assoc::Left),
    (Operator::Minus,             ast::BinaryOp::Sub,           2, Assoc::Left),

    (Operator::LeftChevron,       ast::BinaryOp::LessThan,      3, Assoc::None),
    (Operator::LeftChevronEqual,  ast::BinaryOp::LessEquals,    3, Assoc::None),
    (Operator::RightChevron,      ast::BinaryOp::GreaterThan,   3, Assoc::None),
    (Operator::RightChevronEqual, ast::BinaryOp::GreaterEquals, 3, Assoc::None),

    (Operator::DoubleEqual,       ast::BinaryOp::Equals,        4, Assoc::None),
    (Operator::ExclaimEqual,      ast::BinaryOp::NotEquals,     4, Assoc::None),

    (Operator::DoubleAmpersand,   ast::BinaryOp::LogicalAnd,    5, Assoc::Left),
    (Operator::DoublePipe,        ast::BinaryOp::LogicalOr,     6, Assoc::Left),
];

#[derive(Debug, Clone, Fail)]
pub enum SyntaxError {
    #[fail(display = "expected {}, found {}", expected, actual)]
    UnexpectedToken { actual: String, expected: String },
    #[fail(display = "operator `{}` cannot be chained", op)]
    NonAssociativeOperator { op: &'static str },
    #[fail(display = "invalid assignment target")]
    InvalidAssignmentTarget,
    #[fail(display = "only assignments and method calls can be used as a statement")]
    NotAStatement,
    #[fail(display = "unexpected end of file")]
    UnexpectedEOF,
}

pub trait ExpectedToken<'f>: fmt::Debug + fmt::Display {
    type Yields;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields>;

    fn matches(&self, token: &TokenKind<'f>) -> bool {
        self.matching(token).is_some()
    }
}

#[derive(Debug, Clone, Display)]
#[display(fmt = "{}", _0)]
struct Exactly<'f>(TokenKind<'f>);
#[derive(Debug, Clone, Display)]
#[display(fmt = "a binary operator")]
struct BinaryOp;
#[derive(Debug, Clone, Display)]
#[display(fmt = "a unary operator")]
struct UnaryOp;
#[derive(Debug, Clone, Display)]
#[display(fmt = "an identifier")]
struct Identifier;
#[derive(Debug, Clone, Display)]
#[display(fmt = "a literal")]
struct Literal;
#[derive(Debug, Clone, Display)]
#[display(fmt = "a type")]
struct TypeKeyword;

impl<'f> From<Operator> for Exactly<'f> {
    fn from(op: Operator) -> Self {
        Exactly(TokenKind::Operator(op))
    }
}

impl<'f> From<Keyword> for Exactly<'f> {
    fn from(kw: Keyword) -> Self {
        Exactly(TokenKind::Keyword(kw))
    }
}

fn exactly<'f>(thing: impl Into<Exactly<'f>>) -> Exactly<'f> {
    thing.into()
}

impl<'f> ExpectedToken<'f> for Exactly<'f> {
    type Yields = ();
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        if &self.0 == token {
            Some(())
        } else {
            None
        }
    }
}

impl<'f> ExpectedToken<'f> for BinaryOp {
    type Yields = (ast::BinaryOp, Precedence, Assoc);
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::Operator(op) => BINARY_OPERATORS
                .iter()
                .find(|(this_op, _, _, _)| this_op == op)
                .map(|(_, op, prec, assoc)| (*op, *prec, *assoc)),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for UnaryOp {
    type Yields = ast::UnaryOp;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::Operator(Operator::Exclaim) => Some(ast::UnaryOp::Not),
            TokenKind::Operator(Operator::Minus) => Some(ast::UnaryOp::Neg),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for Identifier {
    type Yields = Symbol<'f>;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::Identifier(ident) => Some(*ident),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for Literal {
    type Yields = ast::Expr<'f>;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::IntegerLiteral(lit) => Some(ast::Expr::Int(*lit)),
            TokenKind::DoubleLiteral(lit) => Some(ast::Expr::Double(*lit)),
            TokenKind::StringLiteral(lit) => Some(ast::Expr::String(*lit)),
            TokenKind::Keyword(Keyword::True) => Some(ast::Expr::Boolean(true)),
            TokenKind::Keyword(Keyword::False) => Some(ast::Expr::Boolean(false)),
            TokenKind::Keyword(Keyword::Null) => Some(ast::Expr::Null),
            _ => None,
        }
    }
}

impl<'f> ExpectedToken<'f> for TypeKeyword {
    type Yields = Keyword;
    fn matching(&self, token: &TokenKind<'f>) -> Option<Self::Yields> {
        match token {
            TokenKind::Keyword(kw @ Keyword::Int)
            | TokenKind::Keyword(kw @ Keyword::Double)
            | TokenKind::Keyword(kw @ Keyword::Bool)
            | TokenKind::Keyword(kw @ Keyword::String)
            | TokenKind::Keyword(kw @ Keyword::Void)
            | TokenKind::Keyword(kw @ Keyword::Class) => Some(*kw),
            _ => None,
        }
    }
}

pub type SyntaxResult<'f, T> = Result<T, MaybeSpanned<'f, SyntaxError>>;
type ParserResult<'f, T> = SyntaxResult<'f, Spanned<'f, T>>;
type BoxedResult<'f, T> = SyntaxResult<'f, Box<Spanned<'f, T>>>;

pub struct Parser<'f, I>
where
    I: Iterator<Item = Token<'f>>,
{
    tokens: TokenCursor<'f, I>,
}

/// Spans the result of `$code` from the first token it looked at to the
/// last token it consumed. `$code` must consume at least one token.
macro_rules! spanned {
    ($self:expr, $code:expr) => {{
        let start = $self.tokens.upcoming_span();
        let data: SyntaxResult<'f, _> = $code;
        let data = data?;

        // an end of file is reported by `$code` itself
        let start = start?.start_position();
        let res: SyntaxResult<'f, _> = Ok(Spanned {
            span: $self.tokens.span_from(start),
            data,
        });

        res
    }};
}

impl<'f, I> Parser<'f, I>
where
    I: Iterator<Item = Token<'f>>,
{
    pub fn new(lexer: I) -> Self {
        Parser {
            tokens: TokenCursor::new(lexer),
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    fn omnomnom<E>(&mut self, want: E) -> SyntaxResult<'f, Spanned<'f, E::Yields>>
    where
        E: ExpectedToken<'f>,
    {
        let actual = self.tokens.advance()?;

        want.matching(&actual.data)
            .map(|yielded| actual.map(|_| yielded))
            .ok_or_else(|| unexpected(&actual, &want))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn omnomnoptional<E>(&mut self, want: E) -> SyntaxResult<'f, Option<Spanned<'f, E::Yields>>>
    where
        E: ExpectedToken<'f>,
    {
        self.omnomnoptional_if(want, |_| true)
    }

    /// Only consume token if pred(E::Yields) holds
    #[allow(clippy::needless_pass_by_value)]
    fn omnomnoptional_if<E, P>(
        &mut self,
        want: E,
        pred: P,
    ) -> SyntaxResult<'f, Option<Spanned<'f, E::Yields>>>
    where
        E: ExpectedToken<'f>,
        P: Fn(&E::Yields) -> bool,
    {
        let matched = self
            .tokens
            .lookahead(0)
            .and_then(|token| want.matching(&token.data))
            .filter(&pred);

        match matched {
            Some(yielded) => {
                let got = self.tokens.advance()?;
                Ok(Some(got.map(|_| yielded)))
            }
            None => Ok(None),
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    fn tastes_like<E>(&mut self, want: E) -> SyntaxResult<'f, bool>
    where
        E: ExpectedToken<'f>,
    {
        self.nth_tastes_like(0, want)
    }

    #[allow(clippy::needless_pass_by_value)]
    fn nth_tastes_like<E>(&mut self, n: usize, want: E) -> SyntaxResult<'f, bool>
    where
        E: ExpectedToken<'f>,
    {
        Ok(self
            .tokens
            .lookahead(n)
            .map_or(false, |got| want.matches(&got.data)))
    }

    /// Consumes the next token and reports it as not being `expected`.
    fn unexpected_next<T>(&mut self, expected: &str) -> SyntaxResult<'f, T> {
        let actual = self.tokens.advance()?;
        Err(unexpected(&actual, &expected))
    }

    pub fn parse(&mut self) -> Result<ast::AST<'f>, MaybeSpanned<'f, SyntaxError>> {
        if self.tokens.at_eof() {
            Ok(ast::AST::Empty)
        } else {
            Ok(ast::AST::Program(self.parse_program()?))
        }
    }

    fn parse_program(&mut self) -> ParserResult<'f, ast::Program<'f>> {
        spanned!(self, {
            let mut classes = Vec::new();
            while !self.tokens.at_eof() {
                classes.push(self.parse_class_declaration()?);
            }

            Ok(ast::Program { classes })
        })
    }

    fn parse_class_declaration(&mut self) -> ParserResult<'f, ast::ClassDeclaration<'f>> {
        spanned!(self, {
            self.omnomnom(exactly(Keyword::Class))?;
            let name = self.omnomnom(Identifier)?;

            let parent = if self.omnomnoptional(exactly(Keyword::Extends))?.is_some() {
                Some(self.omnomnom(Identifier)?)
            } else {
                None
            };

            let mut members = Vec::new();
            self.omnomnom(exactly(Operator::LeftBrace))?;
            while self
                .omnomnoptional(exactly(Operator::RightBrace))?
                .is_none()
            {
                members.push(self.parse_class_member()?);
            }

            Ok(ast::ClassDeclaration {
                name,
                parent,
                members,
            })
        })
    }

    fn parse_class_member(&mut self) -> ParserResult<'f, ast::ClassMember<'f>> {
        spanned!(self, {
            let is_static = self.omnomnoptional(exactly(Keyword::Static))?.is_some();
            let ty = self.parse_type()?;
            let name = self.omnomnom(Identifier)?;

            let kind = if is_static || self.tastes_like(exactly(Operator::LeftParen))? {
                let params = self.parse_parameter_declarations()?;
                let body = self.parse_block()?;

                ast::ClassMemberKind::Method {
                    is_static,
                    return_ty: ty,
                    params,
                    body,
                }
            } else {
                self.omnomnom(exactly(Operator::Semicolon))?;
                ast::ClassMemberKind::Field(ty)
            };

            Ok(ast::ClassMember { kind, name })
        })
    }

    fn parse_parameter_declarations(&mut self) -> ParserResult<'f, ast::ParameterList<'f>> {
        self.parse_parenthesized_list(|parser| parser.parse_parameter())
    }

    fn parse_parameter(&mut self) -> ParserResult<'f, ast::Parameter<'f>> {
        spanned!(self, {
            let ty = self.parse_type()?;
            let name = self.omnomnom(Identifier)?;
            Ok(ast::Parameter { ty, name })
        })
    }

    fn parse_type(&mut self) -> ParserResult<'f, ast::Type<'f>> {
        spanned!(self, {
            let basic = spanned!(self, self.parse_basic_type())?;

            // Only consume `[]` pairs, so that `new int[len]` keeps its length
            let mut array_depth = 0;
            while self.tastes_like(exactly(Operator::LeftBracket))?
                && self.nth_tastes_like(1, exactly(Operator::RightBracket))?
            {
                self.omnomnom(exactly(Operator::LeftBracket))?;
                self.omnomnom(exactly(Operator::RightBracket))?;
                array_depth += 1;
            }

            Ok(ast::Type { basic, array_depth })
        })
    }

    fn parse_basic_type(&mut self) -> SyntaxResult<'f, ast::BasicType<'f>> {
        let keyword = match self.omnomnoptional(TypeKeyword)? {
            Some(keyword) => keyword.data,
            None => {
                return self.unexpected_next(
                    "keyword `int`, `double`, `bool`, `string`, `void` or `class`",
                );
            }
        };

        Ok(match keyword {
            Keyword::Int => ast::BasicType::Int,
            Keyword::Double => ast::BasicType::Double,
            Keyword::Bool => ast::BasicType::Boolean,
            Keyword::String => ast::BasicType::String,
            Keyword::Void => ast::BasicType::Void,
            _ => ast::BasicType::Class(self.omnomnom(Identifier)?.data),
        })
    }

    fn parse_block(&mut self) -> ParserResult<'f, ast::Block<'f>> {
        spanned!(self, {
            self.omnomnom(exactly(Operator::LeftBrace))?;

            let mut statements = Vec::new();
            while self
                .omnomnoptional(exactly(Operator::RightBrace))?
                .is_none()
            {
                statements.push(self.parse_statement()?);
            }

            Ok(ast::Block { statements })
        })
    }

    fn parse_statement(&mut self) -> ParserResult<'f, ast::Stmt<'f>> {
        spanned!(self, {
            use self::ast::Stmt::*;

            if self.tastes_like(exactly(Operator::LeftBrace))? {
                Ok(Block(self.parse_block()?))
            } else if self.omnomnoptional(exactly(Operator::Semicolon))?.is_some() {
                // empty statement
                Ok(Empty)
            } else if self.omnomnoptional(exactly(Keyword::If))?.is_some() {
                let cond = self.parse_condition()?;

                let if_arm = self.parse_statement()?;
                let else_arm = if self.omnomnoptional(exactly(Keyword::Else))?.is_some() {
                    Some(self.parse_statement()?)
                } else {
                    None
                };

                Ok(If(cond, Box::new(if_arm), else_arm.map(Box::new)))
            } else if self.omnomnoptional(exactly(Keyword::While))?.is_some() {
                let cond = self.parse_condition()?;
                let body = self.parse_statement()?;

                Ok(While(cond, Box::new(body)))
            } else if self.omnomnoptional(exactly(Keyword::For))?.is_some() {
                self.omnomnom(exactly(Operator::LeftParen))?;
                let init = self.parse_simple_statement()?;
                self.omnomnom(exactly(Operator::Semicolon))?;
                let cond = self.parse_expression()?;
                self.omnomnom(exactly(Operator::Semicolon))?;
                let update = self.parse_simple_statement()?;
                self.omnomnom(exactly(Operator::RightParen))?;

                let body = self.parse_statement()?;

                Ok(For {
                    init: Box::new(init),
                    cond,
                    update: Box::new(update),
                    body: Box::new(body),
                })
            } else if self.omnomnoptional(exactly(Keyword::Repeat))?.is_some() {
                let body = self.parse_statement()?;
                self.omnomnom(exactly(Keyword::Until))?;
                let cond = self.parse_condition()?;
                self.omnomnom(exactly(Operator::Semicolon))?;

                Ok(RepeatUntil(Box::new(body), cond))
            } else if self.omnomnoptional(exactly(Keyword::Return))?.is_some() {
                let expr = if !self.tastes_like(exactly(Operator::Semicolon))? {
                    Some(self.parse_expression()?)
                } else {
                    None
                };

                self.omnomnom(exactly(Operator::Semicolon))?;

                Ok(Return(expr))
            } else if self.omnomnoptional(exactly(Keyword::Break))?.is_some() {
                self.omnomnom(exactly(Operator::Semicolon))?;
                Ok(Break)
            } else if self.omnomnoptional(exactly(Keyword::Print))?.is_some() {
                let args = self.parse_argument_list()?;
                self.omnomnom(exactly(Operator::Semicolon))?;
                Ok(Print(args))
            } else if self.tastes_like(TypeKeyword)? {
                let ty = self.parse_type()?;
                let name = self.omnomnom(Identifier)?;
                let init = if self.omnomnoptional(exactly(Operator::Equal))?.is_some() {
                    Some(self.parse_expression()?)
                } else {
                    None
                };

                self.omnomnom(exactly(Operator::Semicolon))?;

                Ok(LocalVariableDeclaration(ty, name, init))
            } else {
                let stmt = self.parse_assignment_or_call()?;
                self.omnomnom(exactly(Operator::Semicolon))?;
                Ok(stmt)
            }
        })
    }

    /// `'(' Expr ')'` after `if`, `while` and `until`
    fn parse_condition(&mut self) -> BoxedResult<'f, ast::Expr<'f>> {
        self.omnomnom(exactly(Operator::LeftParen))?;
        let cond = self.parse_expression()?;
        self.omnomnom(exactly(Operator::RightParen))?;
        Ok(cond)
    }

    /// A simple statement inside a `for` header, which may be empty. The
    /// empty statement is spanned over the token that follows it.
    fn parse_simple_statement(&mut self) -> ParserResult<'f, ast::Stmt<'f>> {
        if self.tastes_like(exactly(Operator::Semicolon))?
            || self.tastes_like(exactly(Operator::RightParen))?
        {
            let span = self.tokens.upcoming_span()?;
            return Ok(Spanned {
                span,
                data: ast::Stmt::Empty,
            });
        }

        spanned!(self, self.parse_assignment_or_call())
    }

    fn parse_assignment_or_call(&mut self) -> SyntaxResult<'f, ast::Stmt<'f>> {
        let expr = self.parse_expression()?;

        if self.omnomnoptional(exactly(Operator::Equal))?.is_some() {
            if !expr.data.is_lvalue() {
                return Err(WithSpan(Spanned {
                    span: expr.span,
                    data: SyntaxError::InvalidAssignmentTarget,
                }));
            }

            let rhs = self.parse_expression()?;
            Ok(ast::Stmt::Assign(expr, rhs))
        } else if expr.data.is_call() {
            Ok(ast::Stmt::Expression(expr))
        } else {
            Err(WithSpan(Spanned {
                span: expr.span,
                data: SyntaxError::NotAStatement,
            }))
        }
    }

    fn parse_expression(&mut self) -> BoxedResult<'f, ast::Expr<'f>> {
        self.parse_binary_expression()
    }

    /// This uses an adapted version of Djikstras original "Shunting Yard"
    /// algorithm [1]. While this traditionally only converts to RPN, it is
    /// combined with an RPN evaluator [2] to build the AST of the
    /// expression on the fly instead. This can also be seen
    /// as a non-recursive variant of precedence climbing [3].
    ///
    /// [1]: https://en.wikipedia.org/wiki/Shunting-yard_algorithm
    /// [2]: https://en.wikipedia.org/wiki/Reverse_Polish_notation#Postfix_evaluation_algorithm
    /// [3]: https://eli.thegreenplace.net/2012/08/02/parsing-expressions-by-precedence-climbing
    fn parse_binary_expression(&mut self) -> BoxedResult<'f, ast::Expr<'f>> {
        let mut operator_stack: Vec<(ast::BinaryOp, Precedence, Assoc)> = Vec::new();
        let mut operand_stack = Vec::new();
        fn rpn_eval<'f>(
            operand_stack: &mut Vec<Box<Spanned<'f, ast::Expr<'f>>>>,
            op: ast::BinaryOp,
        ) {
            // Invariant: we only construct valid RPN
            debug_assert!(operand_stack.len() >= 2);
            if let (Some(rhs), Some(lhs)) = (operand_stack.pop(), operand_stack.pop()) {
                operand_stack.push(Box::new(Spanned {
                    span: Span::combine(&lhs.span, &rhs.span),
                    data: ast::Expr::Binary(op, lhs, rhs),
                }));
            }
        }

        operand_stack.push(self.parse_unary_expression()?);

        // Convert to RPN, but "evaluate" RPN on-the-fly (where "evaluate" means
        // constructing an AST)
        while let Some(spanned_op) = self.omnomnoptional(BinaryOp)? {
            let (op, prec, assoc) = spanned_op.data;

            // This is the part that replaces the recursion from precedence climbing.
            // Instead, we use an explicit `operator_stack` of operands that we need to
            // defer because we have one with higher precedence in our hands
            while let Some(&(top_op, top_prec, top_assoc)) = operator_stack.last() {
                if top_prec == prec && top_assoc == Assoc::None {
                    return Err(WithSpan(Spanned {
                        span: spanned_op.span,
                        data: SyntaxError::NonAssociativeOperator { op: op.symbol() },
                    }));
                }
                if top_prec > prec {
                    break;
                }
                operator_stack.pop();
                rpn_eval(&mut operand_stack, top_op);
            }

            operator_stack.push((op, prec, assoc));
            operand_stack.push(self.parse_unary_expression()?);
        }

        // Consume remaining operators
        while let Some((op, _, _)) = operator_stack.pop() {
            rpn_eval(&mut operand_stack, op)
        }

        debug_assert_eq!(operand_stack.len(), 1);
        Ok(operand_stack.remove(0))
    }

    fn parse_unary_expression(&mut self) -> BoxedResult<'f, ast::Expr<'f>> {
        let mut ops = Vec::new();
        while let Some(op) = self.omnomnoptional(UnaryOp)? {
            ops.push(op);
        }

        let mut expr = self.parse_postfix_expression()?;

        for op in ops.into_iter().rev() {
            expr = Box::new(Spanned {
                span: Span::combine(&op.span, &expr.span),
                data: ast::Expr::Unary(op.data, expr),
            });
        }

        Ok(expr)
    }

    fn parse_postfix_expression(&mut self) -> BoxedResult<'f, ast::Expr<'f>> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            expr = Box::new(if self.omnomnoptional(exactly(Operator::Dot))?.is_some() {
                let adressee = self.omnomnom(Identifier)?;

                if self.tastes_like(exactly(Operator::LeftParen))? {
                    // method call: EXPR.ident(arg1, arg2, ...)
                    let args = self.parse_argument_list()?;

                    Spanned {
                        span: Span::combine(&expr.span, &args.span),
                        data: ast::Expr::MethodInvocation(expr, adressee, args),
                    }
                } else {
                    // member reference: EXPR.ident
                    Spanned {
                        span: Span::combine(&expr.span, &adressee.span),
                        data: ast::Expr::FieldAccess(expr, adressee),
                    }
                }
            } else if self
                .omnomnoptional(exactly(Operator::LeftBracket))?
                .is_some()
            {
                // array access: EXPR[EXPR]
                let index_expr = self.parse_expression()?;
                let spanned = self.omnomnom(exactly(Operator::RightBracket))?;

                Spanned {
                    span: Span::combine(&expr.span, &spanned.span),
                    data: ast::Expr::ArrayAccess(expr, index_expr),
                }
            } else {
                break;
            });
        }

        Ok(expr)
    }

    fn parse_primary_expression(&mut self) -> BoxedResult<'f, ast::Expr<'f>> {
        spanned!(self, {
            use self::ast::Expr::*;

            if let Some(adressee) = self.omnomnoptional(Identifier)? {
                if self.tastes_like(exactly(Operator::LeftParen))? {
                    // call with implicit receiver
                    let args = self.parse_argument_list()?;
                    Ok(ThisMethodInvocation(adressee, args))
                } else {
                    Ok(Var(adressee))
                }
            } else if self.omnomnoptional(exactly(Operator::LeftParen))?.is_some() {
                if self.omnomnoptional(exactly(Keyword::Class))?.is_some() {
                    // cast: (class Name) EXPR
                    let target = self.omnomnom(Identifier)?;
                    self.omnomnom(exactly(Operator::RightParen))?;
                    let expr = self.parse_unary_expression()?;
                    Ok(Cast(target, expr))
                } else {
                    // parenthesized expression
                    let expr = self.parse_expression()?;
                    self.omnomnom(exactly(Operator::RightParen))?;

                    // Return early, parentheses have no node of their own
                    return Ok(expr);
                }
            } else if self.omnomnoptional(exactly(Keyword::New))?.is_some() {
                if self.tastes_like(Identifier)? {
                    // new object expression
                    let new_type = self.omnomnom(Identifier)?;

                    self.omnomnom(exactly(Operator::LeftParen))?;
                    self.omnomnom(exactly(Operator::RightParen))?;
                    Ok(NewObject(new_type))
                } else {
                    // new array expression
                    let element_type = self.parse_type()?;
                    self.omnomnom(exactly(Operator::LeftBracket))?;
                    let length = self.parse_expression()?;
                    self.omnomnom(exactly(Operator::RightBracket))?;

                    Ok(NewArray(element_type, length))
                }
            } else if self.omnomnoptional(exactly(Keyword::This))?.is_some() {
                Ok(This)
            } else if self.omnomnoptional(exactly(Keyword::ReadInteger))?.is_some() {
                self.omnomnom(exactly(Operator::LeftParen))?;
                self.omnomnom(exactly(Operator::RightParen))?;
                Ok(ReadInteger)
            } else if self.omnomnoptional(exactly(Keyword::ReadLine))?.is_some() {
                self.omnomnom(exactly(Operator::LeftParen))?;
                self.omnomnom(exactly(Operator::RightParen))?;
                Ok(ReadLine)
            } else if self.omnomnoptional(exactly(Keyword::InstanceOf))?.is_some() {
                self.omnomnom(exactly(Operator::LeftParen))?;
                let expr = self.parse_expression()?;
                self.omnomnom(exactly(Operator::Comma))?;
                let class = self.omnomnom(Identifier)?;
                self.omnomnom(exactly(Operator::RightParen))?;
                Ok(InstanceOf(expr, class))
            } else if let Some(lit) = self.omnomnoptional(Literal)? {
                Ok(lit.data)
            } else {
                self.unexpected_next("an expression")
            }
        })
        .map(Box::new)
    }

    fn parse_argument_list(&mut self) -> ParserResult<'f, ast::ArgumentList<'f>> {
        self.parse_parenthesized_list(|parser| Ok(*parser.parse_expression()?))
    }

    fn parse_parenthesized_list<F, T>(&mut self, parse_element: F) -> ParserResult<'f, Vec<T>>
    where
        F: Fn(&mut Self) -> SyntaxResult<'f, T>,
    {
        spanned!(self, {
            let mut list = Vec::new();
            self.omnomnom(exactly(Operator::LeftParen))?;

            if !self.tastes_like(exactly(Operator::RightParen))? {
                list.push(parse_element(self)?);
                while self.omnomnoptional(exactly(Operator::Comma))?.is_some() {
                    list.push(parse_element(self)?);
                }
            }

            self.omnomnom(exactly(Operator::RightParen))?;

            Ok(list)
        })
    }
}

fn unexpected<'f>(actual: &Token<'f>, expected: &dyn fmt::Display) -> MaybeSpanned<'f, SyntaxError> {
    WithSpan(Spanned {
        span: actual.span,
        data: SyntaxError::UnexpectedToken {
            actual: actual.data.to_string(),
            expected: expected.to_string(),
        },
    })
}

#[cfg(test)]
#[allow(clippy::string_lit_as_bytes)]
mod tests {
    use super::*;
    use asciifile::AsciiFile;
    use compiler_shared::context::Context;
    use lexer::Lexer;
    use strtab::StringTable;
    use utils::assert_matches;

    macro_rules! lex_input {
        ($itervar:ident = $input:expr) => {
            let mut strtab = StringTable::new();
            let input_string = $input;
            let input = AsciiFile::new(input_string.as_bytes()).unwrap();
            let ctx = Context::dummy(&input);
            let $itervar = Lexer::new(&mut strtab, &ctx)
                .map(|r| r.unwrap())
                .filter(|t| match t.data {
                    TokenKind::Whitespace | TokenKind::Comment(_) => false,
                    _ => true,
                });
        };
    }

    fn program_in_main(body: &str) -> String {
        format!("class Main {{ static void main() {{ {} }} }}", body)
    }

    #[test]
    fn hello_world() {
        lex_input!(
            lx = r#"
            class Main {
                static void main() {
                    Print("hello world", 42);
                }
            }
        "#
        );
        assert_matches!(Parser::new(lx).parse(), Ok(_))
    }

    #[test]
    fn empty_file() {
        lex_input!(lx = "  // nothing here\n");
        assert_matches!(Parser::new(lx).parse(), Ok(ast::AST::Empty))
    }

    #[test]
    fn missing_semicolon() {
        lex_input!(lx = program_in_main("Print(42)"));
        assert_matches!(Parser::new(lx).parse(), Err(_))
    }

    #[test]
    fn class_with_parent_fields_and_methods() {
        lex_input!(
            lx = r#"
            class A extends B {
                int x;
                class B[] bs;
                int f(int a, double b) { return a; }
                static string g() { return "s"; }
            }
        "#
        );
        let ast = Parser::new(lx).parse();
        let prog = match ast {
            Ok(ast::AST::Program(prog)) => prog,
            other => panic!("ast parsing failed: {:?}", other),
        };
        let class = &prog.classes[0];
        assert_eq!(class.name.as_str(), "A");
        assert_eq!(class.parent.as_ref().map(|p| p.as_str()), Some("B"));
        assert_eq!(class.members.len(), 4);
        assert_matches!(
            &class.members[1].kind,
            ast::ClassMemberKind::Field(Spanned {
                data: ast::Type { array_depth: 1, .. },
                ..
            })
        );
        assert_matches!(
            &class.members[3].kind,
            ast::ClassMemberKind::Method {
                is_static: true,
                ..
            }
        );
    }

    #[test]
    fn invalid_basic_type() {
        lex_input!(lx = "class Main { float x; }");
        assert_matches!(Parser::new(lx).parse(), Err(_));
    }

    #[test]
    fn class_type_needs_keyword() {
        lex_input!(lx = program_in_main("A a;"));
        assert_matches!(
            Parser::new(lx).parse(),
            Err(WithSpan(Spanned {
                data: SyntaxError::NotAStatement,
                ..
            }))
        );
    }

    #[test]
    fn invalid_expression() {
        lex_input!(lx = program_in_main("return + 42;"));
        assert_matches!(Parser::new(lx).parse(), Err(_));
    }

    #[test]
    fn valid_expression() {
        lex_input!(lx = program_in_main("return 11 + 42 * 31;"));
        assert_matches!(Parser::new(lx).parse(), Ok(_));
    }

    #[test]
    fn expression_statement_must_be_call() {
        lex_input!(lx = program_in_main("x + 1;"));
        assert_matches!(
            Parser::new(lx).parse(),
            Err(WithSpan(Spanned {
                data: SyntaxError::NotAStatement,
                ..
            }))
        );
    }

    #[test]
    fn assignment_target_must_be_lvalue() {
        lex_input!(lx = program_in_main("f() = 1;"));
        assert_matches!(
            Parser::new(lx).parse(),
            Err(WithSpan(Spanned {
                data: SyntaxError::InvalidAssignmentTarget,
                ..
            }))
        );
    }

    #[test]
    fn comparisons_do_not_chain() {
        lex_input!(lx = "a < b < c");
        assert_matches!(
            Parser::new(lx).parse_expression(),
            Err(WithSpan(Spanned {
                data: SyntaxError::NonAssociativeOperator { op: "<" },
                ..
            }))
        );
    }

    #[test]
    fn unexpected_eof() {
        lex_input!(lx = "class Main { static void main() {");
        assert_matches!(
            Parser::new(lx).parse(),
            Err(WithoutSpan(SyntaxError::UnexpectedEOF))
        );
    }

    #[test]
    fn statements() {
        lex_input!(
            lx = r#"{
                int i = 0;
                class A[] as;
                for (i = 0; i < 10; i = i + 1) { if (i == 5) break; }
                for (; true; ) {}
                repeat i = i - 1; until (i <= 0);
                while (false) ;
                as[0].f(1, 2.5);
                this.x = (class A) ReadInteger();
                if (instanceof(y, A)) Print(ReadLine()); else return;
            }"#
        );
        let block = Parser::new(lx).parse_statement().unwrap();
        let statements = match block.data {
            ast::Stmt::Block(block) => block.data.statements,
            other => panic!("not a block: {:?}", other),
        };

        let kinds: Vec<_> = statements
            .iter()
            .map(|stmt| ast::StmtDiscriminants::from(&stmt.data).to_string())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "LocalVariableDeclaration",
                "LocalVariableDeclaration",
                "For",
                "For",
                "RepeatUntil",
                "While",
                "Expression",
                "Assign",
                "If"
            ]
        );

        match &statements[3].data {
            ast::Stmt::For { init, update, .. } => {
                assert_eq!(init.data, ast::Stmt::Empty);
                assert_eq!(update.data, ast::Stmt::Empty);
            }
            other => panic!("not a for loop: {:?}", other),
        }
    }

    #[test]
    fn new_array_keeps_length() {
        lex_input!(lx = "new int[][n + 1]");
        let expr = Parser::new(lx).parse_expression().unwrap();
        match expr.data {
            ast::Expr::NewArray(element_type, length) => {
                assert_eq!(element_type.array_depth, 1);
                assert_eq!(element_type.basic.data, ast::BasicType::Int);
                assert_matches!(length.data, ast::Expr::Binary(ast::BinaryOp::Add, _, _));
            }
            other => panic!("not a new array: {:?}", other),
        }
    }

    #[test]
    fn cast_binds_tighter_than_binary_operators() {
        lex_input!(lx = "(class A) x.y == null");
        let expr = Parser::new(lx).parse_expression().unwrap();
        match expr.data {
            ast::Expr::Binary(ast::BinaryOp::Equals, lhs, rhs) => {
                assert_matches!(lhs.data, ast::Expr::Cast(_, _));
                assert_eq!(rhs.data, ast::Expr::Null);
            }
            other => panic!("not a comparison: {:?}", other),
        }
    }

    #[test]
    fn spanning_whole_program() {
        let src = "\n class Main {\n static void main() { }\n }  \n";
        lex_input!(lx = src);

        let prog = match Parser::new(lx).parse() {
            Ok(ast::AST::Program(prog)) => prog,
            _ => panic!("ast parsing failed!"),
        };

        let start = prog.span.start_position();
        let end = prog.span.end_position();

        assert_eq!(start.line_number(), 2);
        assert_eq!(start.column(), 1);
        assert_eq!(end.line_number(), 4);
        assert_eq!(end.column(), 1);
        assert_eq!(prog.span.as_str(), src.trim());
    }

    mod expr {
        use super::*;
        use crate::ast::{BinaryOp::*, *};

        #[test]
        fn precedence() {
            // (3 + (4 * 7)) + ((9 / 7) * 42)
            lex_input!(lx = r#"3 + 4 * 7 + 9 / 7 * 42"#);
            let expr = Parser::new(lx).parse_binary_expression().unwrap().data;

            match expr {
                Expr::Binary(op, lhs, rhs) => {
                    assert_eq!(op, Add);
                    // lhs = 3 + (4 * 7)
                    match lhs.data {
                        Expr::Binary(op, lhs, rhs) => {
                            assert_eq!(op, Add);
                            assert_eq!(lhs.data, Expr::Int("3"));
                            // rhs = 4 * 7
                            match rhs.data {
                                Expr::Binary(op, lhs, rhs) => {
                                    assert_eq!(op, Mul);
                                    assert_eq!(lhs.data, Expr::Int("4"));
                                    assert_eq!(rhs.data, Expr::Int("7"));
                                }
                                expr => panic!("not a binary expr: {:#?}", expr),
                            }
                        }
                        expr => panic!("not a binary expr: {:#?}", expr),
                    };
                    // rhs = (9 / 7) * 42
                    match rhs.data {
                        Expr::Binary(op, lhs, rhs) => {
                            assert_eq!(op, Mul);
                            match lhs.data {
                                Expr::Binary(op, lhs, rhs) => {
                                    assert_eq!(op, Div);
                                    assert_eq!(lhs.data, Expr::Int("9"));
                                    assert_eq!(rhs.data, Expr::Int("7"));
                                }
                                expr => panic!("not a binary expr: {:#?}", expr),
                            }
                            assert_eq!(rhs.data, Expr::Int("42"));
                        }
                        expr => panic!("not a binary expr: {:#?}", expr),
                    }
                }

                expr => panic!("not a binary expr: {:#?}", expr),
            }
        }

        #[test]
        fn logical_operators() {
            // a || (b && (!c))
            lex_input!(lx = "a || b && !c");
            let expr = Parser::new(lx).parse_binary_expression().unwrap().data;
            match expr {
                Expr::Binary(LogicalOr, _, rhs) => match rhs.data {
                    Expr::Binary(LogicalAnd, _, rhs) => {
                        assert_matches!(rhs.data, Expr::Unary(crate::ast::UnaryOp::Not, _))
                    }
                    expr => panic!("not a conjunction: {:#?}", expr),
                },
                expr => panic!("not a disjunction: {:#?}", expr),
            }
        }
    }
}
