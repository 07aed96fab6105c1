use parser::ast;
use std::collections::HashMap;
use symtab::{ScopeId, Symbol, Type, VariableKind};
use utils::RefEq;

/// What an assignable expression refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LValueKind {
    Local,
    Parameter,
    Member,
    ArrayElement,
}

impl From<VariableKind> for LValueKind {
    fn from(kind: VariableKind) -> Self {
        match kind {
            VariableKind::Local => LValueKind::Local,
            VariableKind::Parameter => LValueKind::Parameter,
            VariableKind::Member => LValueKind::Member,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprInfo<'f> {
    pub ty: Type<'f>,
    /// Declaration an identifier, field access or call resolved to
    pub symbol: Option<Symbol<'f>>,
    pub lvalue: Option<LValueKind>,
    /// A bare member name or method call whose receiver is the implicit
    /// `this`
    pub implicit_this: bool,
    /// An identifier naming a class, used as receiver of a static call
    pub is_class: bool,
    /// `arr.length()`
    pub is_array_length: bool,
}

impl<'f> From<Type<'f>> for ExprInfo<'f> {
    fn from(ty: Type<'f>) -> Self {
        ExprInfo {
            ty,
            symbol: None,
            lvalue: None,
            implicit_this: false,
            is_class: false,
            is_array_length: false,
        }
    }
}

impl<'f> ExprInfo<'f> {
    pub fn new(ty: Type<'f>, symbol: Symbol<'f>) -> Self {
        ExprInfo {
            symbol: Some(symbol),
            ..ExprInfo::from(ty)
        }
    }

    pub fn error() -> Self {
        ExprInfo::from(Type::Error)
    }
}

/// Results of semantic analysis, keyed by the identity of AST nodes. The
/// tree itself is never modified.
#[derive(Debug, Default)]
pub struct TypeAnalysis<'ast, 'f> {
    class_scopes: HashMap<RefEq<'ast, ast::ClassDeclaration<'f>>, ScopeId>,
    method_scopes: HashMap<RefEq<'ast, ast::ClassMember<'f>>, ScopeId>,
    block_scopes: HashMap<RefEq<'ast, ast::Block<'f>>, ScopeId>,
    expr_info: HashMap<RefEq<'ast, ast::Expr<'f>>, ExprInfo<'f>>,
}

impl<'ast, 'f> TypeAnalysis<'ast, 'f> {
    pub fn new() -> Self {
        TypeAnalysis::default()
    }

    /// `None` for expressions in methods that were not analyzed because
    /// their declaration failed
    pub fn expr_info(&self, expr: &'ast ast::Expr<'f>) -> Option<&ExprInfo<'f>> {
        self.expr_info.get(&RefEq(expr))
    }

    pub fn set_expr_info(&mut self, expr: &'ast ast::Expr<'f>, info: ExprInfo<'f>) {
        self.expr_info.insert(RefEq(expr), info);
    }

    /// Every annotated expression, in no particular order
    pub fn exprs(&self) -> impl Iterator<Item = (&'ast ast::Expr<'f>, &ExprInfo<'f>)> {
        self.expr_info.iter().map(|(expr, info)| (expr.0, info))
    }

    pub fn expr_count(&self) -> usize {
        self.expr_info.len()
    }

    pub fn class_scope(&self, class: &'ast ast::ClassDeclaration<'f>) -> Option<ScopeId> {
        self.class_scopes.get(&RefEq(class)).cloned()
    }

    pub fn set_class_scope(&mut self, class: &'ast ast::ClassDeclaration<'f>, scope: ScopeId) {
        self.class_scopes.insert(RefEq(class), scope);
    }

    /// Formal scope of a method
    pub fn method_scope(&self, method: &'ast ast::ClassMember<'f>) -> Option<ScopeId> {
        self.method_scopes.get(&RefEq(method)).cloned()
    }

    pub fn set_method_scope(&mut self, method: &'ast ast::ClassMember<'f>, scope: ScopeId) {
        self.method_scopes.insert(RefEq(method), scope);
    }

    pub fn block_scope(&self, block: &'ast ast::Block<'f>) -> Option<ScopeId> {
        self.block_scopes.get(&RefEq(block)).cloned()
    }

    pub fn set_block_scope(&mut self, block: &'ast ast::Block<'f>, scope: ScopeId) {
        self.block_scopes.insert(RefEq(block), scope);
    }
}
