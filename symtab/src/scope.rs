//! Scopes live in an arena owned by `SymbolTable` and refer to each other by
//! `ScopeId`. Two chains run through the arena: the lexical chain
//! (`Local -> ... -> Formal -> Class -> Global`) used by ordinary lookup, and
//! the inheritance chain between `Class` scopes used for member lookup.

use crate::{
    symbol::{Symbol, SymbolKind},
    type_system::ClassHierarchy,
    Name,
};
use asciifile::Span;
use log::trace;
use std::collections::{hash_map::Entry, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Class,
    Formal,
    Local,
}

#[derive(Debug)]
pub struct Scope<'f> {
    pub kind: ScopeKind,
    /// Class or method that introduces the scope
    pub owner: Option<Name<'f>>,
    /// Lexical parent, `None` for the global scope
    pub parent: Option<ScopeId>,
    /// Scope of the superclass, only set on class scopes
    pub superclass: Option<ScopeId>,
    symbols: HashMap<Name<'f>, Symbol<'f>>,
    declaration_order: Vec<Name<'f>>,
}

impl<'f> Scope<'f> {
    fn new(kind: ScopeKind, owner: Option<Name<'f>>, parent: Option<ScopeId>) -> Self {
        Scope {
            kind,
            owner,
            parent,
            superclass: None,
            symbols: HashMap::new(),
            declaration_order: Vec::new(),
        }
    }

    pub fn get(&self, name: Name<'f>) -> Option<&Symbol<'f>> {
        self.symbols.get(&name)
    }

    /// Symbols in declaration order
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol<'f>> {
        self.declaration_order
            .iter()
            .filter_map(move |name| self.symbols.get(name))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// The name is already declared in the same scope
#[derive(Debug, Clone, Copy)]
pub struct DuplicateDeclaration<'f> {
    pub earlier: Span<'f>,
}

#[derive(Debug)]
pub struct SymbolTable<'f> {
    scopes: Vec<Scope<'f>>,
}

impl<'f> Default for SymbolTable<'f> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'f> SymbolTable<'f> {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new(ScopeKind::Global, None, None)],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn new_scope(
        &mut self,
        kind: ScopeKind,
        owner: Option<Name<'f>>,
        parent: ScopeId,
    ) -> ScopeId {
        debug_assert_ne!(kind, ScopeKind::Global);
        let id = ScopeId(self.scopes.len());
        trace!("new {:?} scope {:?} in {:?}", kind, id, parent);
        self.scopes.push(Scope::new(kind, owner, Some(parent)));
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope<'f> {
        &self.scopes[id.0]
    }

    pub fn declare(
        &mut self,
        scope: ScopeId,
        symbol: Symbol<'f>,
    ) -> Result<(), DuplicateDeclaration<'f>> {
        let scope = &mut self.scopes[scope.0];
        match scope.symbols.entry(symbol.name) {
            Entry::Occupied(earlier) => Err(DuplicateDeclaration {
                earlier: earlier.get().location,
            }),
            Entry::Vacant(slot) => {
                scope.declaration_order.push(symbol.name);
                slot.insert(symbol);
                Ok(())
            }
        }
    }

    pub fn lookup_class(&self, name: Name<'f>) -> Option<&Symbol<'f>> {
        self.scope(self.global())
            .get(name)
            .filter(|symbol| symbol.is_class())
    }

    pub fn class_scope(&self, class: Name<'f>) -> Option<ScopeId> {
        self.lookup_class(class).and_then(Symbol::scope)
    }

    /// Set the superclass of `class` and link their class scopes. Both
    /// classes must already be declared.
    pub fn link_superclass(&mut self, class: Name<'f>, superclass: Name<'f>) {
        let superclass_scope = self.class_scope(superclass);
        let global = self.global();

        let class_scope = match self.scopes[global.0].symbols.get_mut(&class) {
            Some(Symbol {
                kind: SymbolKind::Class { parent, scope },
                ..
            }) => {
                *parent = Some(superclass);
                *scope
            }
            _ => return,
        };

        trace!("{} extends {}", class, superclass);
        self.scopes[class_scope.0].superclass = superclass_scope;
    }

    /// Look up a member in the class scope `class_scope`, then in the scopes
    /// of its superclasses. The nearest declaration wins.
    pub fn lookup_visible(&self, class_scope: ScopeId, name: Name<'f>) -> Option<&Symbol<'f>> {
        let mut current = Some(class_scope);
        // bounded so that a cyclic chain cannot loop forever
        let mut remaining = self.scopes.len();

        while let Some(id) = current {
            if remaining == 0 {
                break;
            }
            remaining -= 1;

            let scope = self.scope(id);
            debug_assert_eq!(scope.kind, ScopeKind::Class);
            if let Some(symbol) = scope.get(name) {
                return Some(symbol);
            }
            current = scope.superclass;
        }

        None
    }

    /// Look up a member of `class` or one of its superclasses
    pub fn lookup_member(&self, class: Name<'f>, name: Name<'f>) -> Option<&Symbol<'f>> {
        self.class_scope(class)
            .and_then(|scope| self.lookup_visible(scope, name))
    }

    /// Classes in declaration order
    pub fn classes(&self) -> impl Iterator<Item = &Symbol<'f>> {
        self.scope(self.global()).symbols()
    }

    /// Some class whose superclass chain leads back to itself
    pub fn find_inheritance_cycle(&self) -> Option<Name<'f>> {
        self.classes().map(|class| class.name).find(|&class| {
            let mut visited = vec![class];
            let mut current = self.superclass_of(class);
            while let Some(ancestor) = current {
                if visited.contains(&ancestor) {
                    return ancestor == class;
                }
                visited.push(ancestor);
                current = self.superclass_of(ancestor);
            }
            false
        })
    }
}

impl<'f> ClassHierarchy<'f> for SymbolTable<'f> {
    fn superclass_of(&self, class: Name<'f>) -> Option<Name<'f>> {
        self.lookup_class(class).and_then(Symbol::parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{symbol::VariableKind, type_system::Type};
    use asciifile::AsciiFile;
    use strtab::StringTable;

    fn span_at<'f>(file: &'f AsciiFile<'f>, offset: usize) -> Span<'f> {
        Span::from_single_position(file.iter().nth(offset).unwrap())
    }

    #[test]
    fn redeclaration_in_same_scope_fails() {
        let file = AsciiFile::new(b"x x").unwrap();
        let mut strtab = StringTable::new();
        let x = strtab.intern("x");
        let mut table = SymbolTable::new();
        let class = table.new_scope(ScopeKind::Class, None, table.global());

        let first = Symbol::variable(x, span_at(&file, 0), Type::Int, VariableKind::Member);
        let second = Symbol::variable(x, span_at(&file, 2), Type::Bool, VariableKind::Member);

        assert!(table.declare(class, first).is_ok());
        let err = table.declare(class, second).unwrap_err();
        assert_eq!(err.earlier, span_at(&file, 0));
        assert_eq!(table.scope(class).get(x).unwrap().ty, Type::Int);
        assert_eq!(table.scope(class).len(), 1);
    }

    #[test]
    fn shadowing_in_nested_scope_is_legal() {
        let file = AsciiFile::new(b"x x").unwrap();
        let mut strtab = StringTable::new();
        let x = strtab.intern("x");
        let mut table = SymbolTable::new();
        let class = table.new_scope(ScopeKind::Class, None, table.global());
        let local = table.new_scope(ScopeKind::Local, None, class);

        let member = Symbol::variable(x, span_at(&file, 0), Type::Int, VariableKind::Member);
        let var = Symbol::variable(x, span_at(&file, 2), Type::Bool, VariableKind::Local);
        assert!(table.declare(class, member).is_ok());
        assert!(table.declare(local, var).is_ok());
    }

    #[test]
    fn members_are_found_along_the_inheritance_chain() {
        let file = AsciiFile::new(b"A B f g").unwrap();
        let mut strtab = StringTable::new();
        let (a, b, f, g) = (
            strtab.intern("A"),
            strtab.intern("B"),
            strtab.intern("f"),
            strtab.intern("g"),
        );
        let mut table = SymbolTable::new();
        let global = table.global();
        let a_scope = table.new_scope(ScopeKind::Class, Some(a), global);
        let b_scope = table.new_scope(ScopeKind::Class, Some(b), global);
        table.declare(global, Symbol::class(a, span_at(&file, 0), a_scope)).unwrap();
        table.declare(global, Symbol::class(b, span_at(&file, 2), b_scope)).unwrap();
        table.link_superclass(b, a);

        table
            .declare(a_scope, Symbol::variable(f, span_at(&file, 4), Type::Int, VariableKind::Member))
            .unwrap();
        table
            .declare(b_scope, Symbol::variable(g, span_at(&file, 6), Type::Bool, VariableKind::Member))
            .unwrap();

        assert_eq!(table.lookup_visible(b_scope, f).unwrap().ty, Type::Int);
        assert_eq!(table.lookup_visible(b_scope, g).unwrap().ty, Type::Bool);
        assert!(table.lookup_visible(a_scope, g).is_none());
        assert_eq!(table.lookup_member(b, f).unwrap().name, f);

        assert_eq!(table.lookup_class(b).unwrap().parent(), Some(a));
        assert!(table.is_subclass_of(b, a));
        assert!(!table.is_subclass_of(a, b));
        assert!(table.find_inheritance_cycle().is_none());
    }

    #[test]
    fn detects_inheritance_cycle() {
        let file = AsciiFile::new(b"A B C").unwrap();
        let mut strtab = StringTable::new();
        let (a, b, c) = (strtab.intern("A"), strtab.intern("B"), strtab.intern("C"));
        let mut table = SymbolTable::new();
        let global = table.global();
        for (offset, &name) in [a, b, c].iter().enumerate() {
            let scope = table.new_scope(ScopeKind::Class, Some(name), global);
            table
                .declare(global, Symbol::class(name, span_at(&file, offset * 2), scope))
                .unwrap();
        }
        // C extends A, A extends B, B extends A
        table.link_superclass(c, a);
        table.link_superclass(a, b);
        table.link_superclass(b, a);

        let cyclic = table.find_inheritance_cycle().unwrap();
        assert!(cyclic == a || cyclic == b);
        let unknown = strtab.intern("x");
        assert!(table.lookup_member(c, unknown).is_none());
    }
}
