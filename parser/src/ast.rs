use asciifile::Spanned;
use derive_more::Display;
use lexer::{DoubleLit, IntLit, StringLit};
use strtab::Symbol;
use strum_macros::EnumDiscriminants;

#[derive(EnumDiscriminants, Debug, PartialEq, Eq)]
#[strum_discriminants(derive(Display))]
pub enum AST<'t> {
    Empty,
    Program(Spanned<'t, Program<'t>>),
}

/// This is the top-level AST node. It stores all class declarations of the
/// Decaf program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Program<'t> {
    pub classes: Vec<Spanned<'t, ClassDeclaration<'t>>>,
}

/// A class with its optional `extends` clause and its members.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ClassDeclaration<'t> {
    pub name: Spanned<'t, Symbol<'t>>,
    pub parent: Option<Spanned<'t, Symbol<'t>>>,
    pub members: Vec<Spanned<'t, ClassMember<'t>>>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ClassMember<'t> {
    pub kind: ClassMemberKind<'t>,
    pub name: Spanned<'t, Symbol<'t>>,
}

pub type ParameterList<'t> = Vec<Spanned<'t, Parameter<'t>>>;

/// A class member is either a field declaration or a (static or instance)
/// method. The implicit `this` parameter of instance methods is not part of
/// `params`, the symbol table adds it.
#[derive(EnumDiscriminants, Debug, PartialEq, Eq, Clone)]
#[strum_discriminants(derive(Display, Hash, PartialOrd, Ord))]
pub enum ClassMemberKind<'t> {
    Field(Spanned<'t, Type<'t>>),
    Method {
        is_static: bool,
        return_ty: Spanned<'t, Type<'t>>,
        params: Spanned<'t, ParameterList<'t>>,
        body: Spanned<'t, Block<'t>>,
    },
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Parameter<'t> {
    pub ty: Spanned<'t, Type<'t>>,
    pub name: Spanned<'t, Symbol<'t>>,
}

/// A `BasicType` followed by `array_depth` pairs of brackets.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Type<'t> {
    pub basic: Spanned<'t, BasicType<'t>>,
    pub array_depth: u64,
}

#[derive(EnumDiscriminants, Debug, PartialEq, Eq, Clone)]
#[strum_discriminants(derive(Display))]
pub enum BasicType<'t> {
    Int,
    Double,
    Boolean,
    String,
    Void,
    /// `class Name`
    Class(Symbol<'t>),
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Block<'t> {
    pub statements: Vec<Spanned<'t, Stmt<'t>>>,
}

/// Statements. `Assign`, `Expression` and `Empty` are the simple statements
/// that may also appear in the header of a `for` loop. `Expression` only
/// ever holds a method invocation.
#[derive(EnumDiscriminants, Debug, PartialEq, Eq, Clone)]
#[strum_discriminants(derive(Display))]
pub enum Stmt<'t> {
    Block(Spanned<'t, Block<'t>>),
    Empty,
    If(
        Box<Spanned<'t, Expr<'t>>>,
        Box<Spanned<'t, Stmt<'t>>>,
        Option<Box<Spanned<'t, Stmt<'t>>>>,
    ),
    While(Box<Spanned<'t, Expr<'t>>>, Box<Spanned<'t, Stmt<'t>>>),
    For {
        init: Box<Spanned<'t, Stmt<'t>>>,
        cond: Box<Spanned<'t, Expr<'t>>>,
        update: Box<Spanned<'t, Stmt<'t>>>,
        body: Box<Spanned<'t, Stmt<'t>>>,
    },
    RepeatUntil(Box<Spanned<'t, Stmt<'t>>>, Box<Spanned<'t, Expr<'t>>>),
    Assign(Box<Spanned<'t, Expr<'t>>>, Box<Spanned<'t, Expr<'t>>>),
    Expression(Box<Spanned<'t, Expr<'t>>>),
    Return(Option<Box<Spanned<'t, Expr<'t>>>>),
    Break,
    Print(Spanned<'t, ArgumentList<'t>>),
    LocalVariableDeclaration(
        Spanned<'t, Type<'t>>,
        Spanned<'t, Symbol<'t>>,
        Option<Box<Spanned<'t, Expr<'t>>>>,
    ),
}

/// Expressions. Variants with an explicit owner (`FieldAccess`,
/// `MethodInvocation`) have a sibling without one (`Var`,
/// `ThisMethodInvocation`), for which the type checker decides whether an
/// implicit `this` is the receiver.
#[derive(EnumDiscriminants, Debug, PartialEq, Eq, Clone)]
#[strum_discriminants(derive(Display))]
pub enum Expr<'t> {
    Binary(
        BinaryOp,
        Box<Spanned<'t, Expr<'t>>>,
        Box<Spanned<'t, Expr<'t>>>,
    ),
    Unary(UnaryOp, Box<Spanned<'t, Expr<'t>>>),

    // Postfix ops
    MethodInvocation(
        Box<Spanned<'t, Expr<'t>>>,
        Spanned<'t, Symbol<'t>>,
        Spanned<'t, ArgumentList<'t>>,
    ),
    FieldAccess(Box<Spanned<'t, Expr<'t>>>, Spanned<'t, Symbol<'t>>),
    ArrayAccess(Box<Spanned<'t, Expr<'t>>>, Box<Spanned<'t, Expr<'t>>>),

    // Primary expressions
    Null,
    Boolean(bool),
    Int(IntLit<'t>),
    Double(DoubleLit<'t>),
    String(StringLit<'t>),
    Var(Spanned<'t, Symbol<'t>>),
    ThisMethodInvocation(Spanned<'t, Symbol<'t>>, Spanned<'t, ArgumentList<'t>>),
    This,
    ReadInteger,
    ReadLine,
    NewObject(Spanned<'t, Symbol<'t>>),
    /// `new T[len]`, holding the element type `T`
    NewArray(Spanned<'t, Type<'t>>, Box<Spanned<'t, Expr<'t>>>),
    InstanceOf(Box<Spanned<'t, Expr<'t>>>, Spanned<'t, Symbol<'t>>),
    Cast(Spanned<'t, Symbol<'t>>, Box<Spanned<'t, Expr<'t>>>),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOp {
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessEquals,
    GreaterEquals,

    LogicalOr,
    LogicalAnd,

    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// One of the unary operations `!` and `-`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    Not,
    Neg,
}

pub type ArgumentList<'t> = Vec<Spanned<'t, Expr<'t>>>;

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        use self::BinaryOp::*;
        match self {
            Equals => "==",
            NotEquals => "!=",
            LessThan => "<",
            GreaterThan => ">",
            LessEquals => "<=",
            GreaterEquals => ">=",
            LogicalOr => "||",
            LogicalAnd => "&&",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
        }
    }
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

impl<'t> Expr<'t> {
    /// Whether the expression may appear on the left of `=`
    pub fn is_lvalue(&self) -> bool {
        match self {
            Expr::Var(_) | Expr::FieldAccess(_, _) | Expr::ArrayAccess(_, _) => true,
            _ => false,
        }
    }

    pub fn is_call(&self) -> bool {
        match self {
            Expr::MethodInvocation(_, _, _) | Expr::ThisMethodInvocation(_, _) => true,
            _ => false,
        }
    }
}
