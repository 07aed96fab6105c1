use crate::{scope::ScopeId, type_system::Type, Name};
use asciifile::{Position, Span};
use std::fmt;

/// A named declaration: a class, a method or a variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol<'f> {
    pub name: Name<'f>,
    /// Span of the declared name
    pub location: Span<'f>,
    pub ty: Type<'f>,
    pub kind: SymbolKind<'f>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind<'f> {
    Variable(VariableKind),
    Function {
        is_static: bool,
        /// Formal scope holding the parameters
        scope: ScopeId,
        /// Class that declares the method
        owner: Name<'f>,
    },
    Class {
        /// Resolved superclass, `None` for roots and unresolvable parents
        parent: Option<Name<'f>>,
        scope: ScopeId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Local,
    Parameter,
    /// Field of a class
    Member,
}

impl<'f> Symbol<'f> {
    pub fn variable(name: Name<'f>, location: Span<'f>, ty: Type<'f>, kind: VariableKind) -> Self {
        Symbol {
            name,
            location,
            ty,
            kind: SymbolKind::Variable(kind),
        }
    }

    pub fn class(name: Name<'f>, location: Span<'f>, scope: ScopeId) -> Self {
        Symbol {
            name,
            location,
            ty: Type::Class(name),
            kind: SymbolKind::Class {
                parent: None,
                scope,
            },
        }
    }

    pub fn function(
        name: Name<'f>,
        location: Span<'f>,
        owner: Name<'f>,
        is_static: bool,
        scope: ScopeId,
        ty: Type<'f>,
    ) -> Self {
        debug_assert!(ty.is_function_type());
        Symbol {
            name,
            location,
            ty,
            kind: SymbolKind::Function {
                is_static,
                scope,
                owner,
            },
        }
    }

    pub fn start(&self) -> Position<'f> {
        self.location.start_position()
    }

    pub fn declared_at(&self) -> Location<'f> {
        Location(self.start())
    }

    pub fn is_variable(&self) -> bool {
        self.variable_kind().is_some()
    }

    pub fn variable_kind(&self) -> Option<VariableKind> {
        match self.kind {
            SymbolKind::Variable(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        match self.kind {
            SymbolKind::Function { .. } => true,
            _ => false,
        }
    }

    pub fn is_class(&self) -> bool {
        match self.kind {
            SymbolKind::Class { .. } => true,
            _ => false,
        }
    }

    pub fn is_static(&self) -> bool {
        match self.kind {
            SymbolKind::Function { is_static, .. } => is_static,
            _ => false,
        }
    }

    /// Declared scope of a class or a method
    pub fn scope(&self) -> Option<ScopeId> {
        match self.kind {
            SymbolKind::Function { scope, .. } | SymbolKind::Class { scope, .. } => Some(scope),
            SymbolKind::Variable(_) => None,
        }
    }

    pub fn parent(&self) -> Option<Name<'f>> {
        match self.kind {
            SymbolKind::Class { parent, .. } => parent,
            _ => None,
        }
    }

    /// Return type of a method
    pub fn return_type(&self) -> Option<&Type<'f>> {
        self.ty.as_function().map(|function| &function.return_type)
    }
}

/// `(line,column)` of the declaration, one based
#[derive(Debug, Clone, Copy)]
pub struct Location<'f>(pub Position<'f>);

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.0.line_number(), self.0.column() + 1)
    }
}
