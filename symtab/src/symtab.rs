#![warn(
    clippy::print_stdout,
    clippy::unimplemented,
    clippy::doc_markdown,
    clippy::items_after_statements,
    clippy::match_same_arms,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::use_self,
    clippy::use_debug
)]

//! Symbol table of a Decaf program: the type lattice, symbols, the scope
//! arena and the scope stack used while walking method bodies.

pub mod scope;
pub mod scope_stack;
pub mod symbol;
pub mod type_system;

pub use self::{
    scope::{DuplicateDeclaration, Scope, ScopeId, ScopeKind, SymbolTable},
    scope_stack::ScopeStack,
    symbol::{Location, Symbol, SymbolKind, VariableKind},
    type_system::{ClassHierarchy, FunctionType, Type},
};

/// Identifiers are interned strings
pub type Name<'f> = strtab::Symbol<'f>;
