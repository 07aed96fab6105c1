use crate::{
    scope::{ScopeId, ScopeKind, SymbolTable},
    symbol::{Symbol, VariableKind},
    Name,
};
use asciifile::Position;
use log::trace;

/// The scopes that are open while a method body is traversed, outermost
/// first. Mirrors the ancestor chain of the node being visited.
#[derive(Debug)]
pub struct ScopeStack<'t, 'f> {
    table: &'t SymbolTable<'f>,
    open: Vec<ScopeId>,
}

impl<'t, 'f> ScopeStack<'t, 'f> {
    /// A stack with only the global scope open
    pub fn new(table: &'t SymbolTable<'f>) -> Self {
        ScopeStack {
            table,
            open: vec![table.global()],
        }
    }

    pub fn table(&self) -> &'t SymbolTable<'f> {
        self.table
    }

    pub fn open(&mut self, scope: ScopeId) {
        trace!("open {:?} scope {:?}", self.table.scope(scope).kind, scope);
        self.open.push(scope);
    }

    /// Close the innermost scope. The global scope is never closed.
    pub fn close(&mut self) {
        if self.open.len() > 1 {
            let scope = self.open.pop();
            trace!("close scope {:?}", scope);
        }
    }

    pub fn current(&self) -> ScopeId {
        *self.open.last().unwrap_or(&self.table.global())
    }

    fn innermost(&self, kind: ScopeKind) -> Option<ScopeId> {
        self.open
            .iter()
            .rev()
            .cloned()
            .find(|&id| self.table.scope(id).kind == kind)
    }

    fn current_class_scope(&self) -> Option<ScopeId> {
        self.innermost(ScopeKind::Class)
    }

    /// Class whose body is being visited
    pub fn current_class(&self) -> Option<&'t Symbol<'f>> {
        let scope = self.current_class_scope()?;
        let name = self.table.scope(scope).owner?;
        self.table.lookup_class(name)
    }

    /// Method whose body is being visited
    pub fn current_function(&self) -> Option<&'t Symbol<'f>> {
        let formal = self.table.scope(self.innermost(ScopeKind::Formal)?);
        let class_scope = self.table.scope(formal.parent?);
        class_scope
            .get(formal.owner?)
            .filter(|symbol| symbol.is_function())
    }

    /// Resolve a bare identifier used at `location`. Locals and parameters
    /// are only visible after their declaration, members and methods of the
    /// current class and its superclasses are visible anywhere, and the
    /// global scope contributes classes.
    pub fn lookup_before_location(
        &self,
        name: Name<'f>,
        location: Position<'f>,
    ) -> Option<&'t Symbol<'f>> {
        let table = self.table;

        for &id in self.open.iter().rev() {
            let scope = table.scope(id);
            let found = match scope.kind {
                ScopeKind::Local | ScopeKind::Formal => scope.get(name).filter(|symbol| {
                    match symbol.variable_kind() {
                        Some(VariableKind::Local) | Some(VariableKind::Parameter) => {
                            symbol.start() < location
                        }
                        _ => true,
                    }
                }),
                ScopeKind::Class => table.lookup_visible(id, name),
                ScopeKind::Global => scope.get(name).filter(|symbol| symbol.is_class()),
            };

            if found.is_some() {
                return found;
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_system::Type;
    use asciifile::{AsciiFile, Span};
    use strtab::StringTable;

    // class A { int m; void f(int p) { x; int x; m; } }
    const SRC: &[u8] = b"A m f p x x m";

    struct Fixture<'f> {
        table: SymbolTable<'f>,
        class: ScopeId,
        formal: ScopeId,
        local: ScopeId,
    }

    fn position<'f>(file: &'f AsciiFile<'f>, offset: usize) -> Position<'f> {
        file.iter().nth(offset).unwrap()
    }

    fn fixture<'f>(file: &'f AsciiFile<'f>, strtab: &mut StringTable<'f>) -> Fixture<'f> {
        let span = |offset| Span::from_single_position(position(file, offset));
        let (a, m, f, p, x) = (
            strtab.intern("A"),
            strtab.intern("m"),
            strtab.intern("f"),
            strtab.intern("p"),
            strtab.intern("x"),
        );

        let mut table = SymbolTable::new();
        let global = table.global();
        let class = table.new_scope(ScopeKind::Class, Some(a), global);
        let formal = table.new_scope(ScopeKind::Formal, Some(f), class);
        let local = table.new_scope(ScopeKind::Local, None, formal);

        table.declare(global, Symbol::class(a, span(0), class)).unwrap();
        table
            .declare(class, Symbol::variable(m, span(2), Type::Int, VariableKind::Member))
            .unwrap();
        let signature = Type::function(Type::Void, vec![Type::Class(a), Type::Int]);
        table
            .declare(class, Symbol::function(f, span(4), a, false, formal, signature))
            .unwrap();
        table
            .declare(formal, Symbol::variable(p, span(6), Type::Int, VariableKind::Parameter))
            .unwrap();
        table
            .declare(local, Symbol::variable(x, span(10), Type::Bool, VariableKind::Local))
            .unwrap();

        Fixture {
            table,
            class,
            formal,
            local,
        }
    }

    #[test]
    fn locals_are_visible_only_after_declaration() {
        let file = AsciiFile::new(SRC).unwrap();
        let mut strtab = StringTable::new();
        let fixture = fixture(&file, &mut strtab);
        let mut stack = ScopeStack::new(&fixture.table);
        stack.open(fixture.class);
        stack.open(fixture.formal);
        stack.open(fixture.local);

        let x = strtab.intern("x");
        assert!(stack.lookup_before_location(x, position(&file, 8)).is_none());
        assert!(stack.lookup_before_location(x, position(&file, 12)).is_some());

        let m = strtab.intern("m");
        assert!(stack.lookup_before_location(m, position(&file, 0)).is_some());

        let a = strtab.intern("A");
        assert!(stack.lookup_before_location(a, position(&file, 8)).unwrap().is_class());
    }

    #[test]
    fn tracks_current_class_and_function() {
        let file = AsciiFile::new(SRC).unwrap();
        let mut strtab = StringTable::new();
        let fixture = fixture(&file, &mut strtab);
        let mut stack = ScopeStack::new(&fixture.table);

        assert!(stack.current_class().is_none());
        stack.open(fixture.class);
        stack.open(fixture.formal);
        stack.open(fixture.local);
        assert_eq!(stack.current_class().unwrap().name, strtab.intern("A"));
        assert_eq!(stack.current_function().unwrap().name, strtab.intern("f"));

        stack.close();
        stack.close();
        assert!(stack.current_function().is_none());
        assert_eq!(stack.current(), fixture.class);
        stack.close();
        stack.close();
        assert_eq!(stack.current(), fixture.table.global());
    }
}
