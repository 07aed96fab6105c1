//! Populates the symbol table before any method body is checked. Classes are
//! declared first so that types can refer to classes declared later in the
//! file, then superclasses are linked, then members, parameters and locals
//! are declared.

use crate::{
    checker::{checked_type_from_ty, AnalysisAborted, SemanticContext},
    semantic_error::SemanticError,
    type_analysis::TypeAnalysis,
};
use asciifile::Spanned;
use failure::Error;
use log::{debug, trace};
use parser::ast;
use strtab::StringTable;
use symtab::{
    ClassHierarchy, DuplicateDeclaration, Location, Name, ScopeId, ScopeKind, Symbol,
    SymbolKind, SymbolTable, Type, VariableKind,
};

pub fn build<'ast, 'f>(
    strtab: &mut StringTable<'f>,
    program: &'ast Spanned<'f, ast::Program<'f>>,
    type_analysis: &mut TypeAnalysis<'ast, 'f>,
    context: &SemanticContext<'_, 'f>,
) -> Result<SymbolTable<'f>, Error> {
    let mut builder = SymbolTableBuilder {
        context,
        table: SymbolTable::new(),
        type_analysis,
        this: strtab.this_symbol(),
    };

    let declared = builder.declare_classes(&program.classes);
    debug!("declared {} classes", declared.len());

    builder.link_superclasses(&declared)?;

    let mut ordered = declared;
    ordered.sort_by_key(|class_decl| builder.inheritance_depth(class_decl.name.data));
    for class_decl in ordered {
        builder.declare_members(class_decl);
    }

    builder.check_main_class(strtab);

    Ok(builder.table)
}

struct SymbolTableBuilder<'cx, 'ctx, 'ana, 'ast, 'f> {
    context: &'cx SemanticContext<'ctx, 'f>,
    table: SymbolTable<'f>,
    type_analysis: &'ana mut TypeAnalysis<'ast, 'f>,
    this: Name<'f>,
}

impl<'cx, 'ctx, 'ana, 'ast, 'f> SymbolTableBuilder<'cx, 'ctx, 'ana, 'ast, 'f> {
    /// Declares a shell for every class. Repeated class names are reported
    /// and left out of the result.
    fn declare_classes(
        &mut self,
        classes: &'ast [Spanned<'f, ast::ClassDeclaration<'f>>],
    ) -> Vec<&'ast Spanned<'f, ast::ClassDeclaration<'f>>> {
        let global = self.table.global();
        let mut declared = Vec::with_capacity(classes.len());

        for class_decl in classes {
            let name = &class_decl.name;
            let scope = self
                .table
                .new_scope(ScopeKind::Class, Some(name.data), global);

            if self.declare(global, name, Symbol::class(name.data, name.span, scope)) {
                self.type_analysis.set_class_scope(&class_decl.data, scope);
                declared.push(class_decl);
            }
        }

        declared
    }

    fn link_superclasses(
        &mut self,
        declared: &[&'ast Spanned<'f, ast::ClassDeclaration<'f>>],
    ) -> Result<(), Error> {
        for class_decl in declared {
            let parent = match &class_decl.parent {
                Some(parent) => parent,
                None => continue,
            };

            if self.table.lookup_class(parent.data).is_some() {
                self.table.link_superclass(class_decl.name.data, parent.data);
            } else {
                self.context.report_error(
                    &parent.span,
                    SemanticError::ClassNotFound {
                        name: parent.data.to_string(),
                    },
                );
            }
        }

        if let Some(class) = self.table.find_inheritance_cycle() {
            debug!("inheritance cycle through class {}", class);
            let symbol = self.table.lookup_class(class);
            match symbol {
                Some(symbol) => self
                    .context
                    .report_error(&symbol.location, SemanticError::BadInheritance),
                None => self.context.report_global(SemanticError::BadInheritance),
            }
            return Err(AnalysisAborted.into());
        }

        Ok(())
    }

    fn inheritance_depth(&self, class: Name<'f>) -> usize {
        let mut depth = 0;
        let mut current = self.table.superclass_of(class);
        while let Some(parent) = current {
            depth += 1;
            current = self.table.superclass_of(parent);
        }
        depth
    }

    fn declare_members(&mut self, class_decl: &'ast Spanned<'f, ast::ClassDeclaration<'f>>) {
        let scope = match self.type_analysis.class_scope(&class_decl.data) {
            Some(scope) => scope,
            None => return,
        };
        let superclass_scope = self.table.scope(scope).superclass;
        trace!("declaring members of {}", class_decl.name.data);

        for member in &class_decl.members {
            match &member.kind {
                ast::ClassMemberKind::Field(ty) => {
                    self.declare_field(scope, superclass_scope, &member.name, ty)
                }
                ast::ClassMemberKind::Method {
                    is_static,
                    return_ty,
                    params,
                    body,
                } => {
                    let method = Method {
                        member: &member.data,
                        class: class_decl.name.data,
                        is_static: *is_static,
                        return_ty,
                        params,
                        body,
                    };
                    self.declare_method(scope, superclass_scope, method)
                }
            }
        }
    }

    fn declare_field(
        &mut self,
        scope: ScopeId,
        superclass_scope: Option<ScopeId>,
        name: &Spanned<'f, Name<'f>>,
        ty: &Spanned<'f, ast::Type<'f>>,
    ) {
        let ty = checked_type_from_ty(ty, &self.table, self.context);
        if ty == Type::Void {
            self.report_void_variable(name);
            return;
        }

        let inherited = superclass_scope.and_then(|scope| self.table.lookup_visible(scope, name.data));
        if let Some(inherited) = inherited {
            let error = if inherited.is_variable() {
                SemanticError::OverridingVar {
                    name: name.data.to_string(),
                }
            } else {
                duplicate_declaration(name, inherited.declared_at())
            };
            self.context.report_error(&name.span, error);
            return;
        }

        self.declare(
            scope,
            name,
            Symbol::variable(name.data, name.span, ty, VariableKind::Member),
        );
    }

    fn declare_method(
        &mut self,
        scope: ScopeId,
        superclass_scope: Option<ScopeId>,
        method: Method<'ast, 'f>,
    ) {
        let name = &method.member.name;
        let return_type = checked_type_from_ty(method.return_ty, &self.table, self.context);
        let formal = self
            .table
            .new_scope(ScopeKind::Formal, Some(name.data), scope);

        let mut param_types = Vec::with_capacity(method.params.len() + 1);
        if !method.is_static {
            let receiver = Type::Class(method.class);
            param_types.push(receiver.clone());
            let this = Symbol::variable(self.this, name.span, receiver, VariableKind::Parameter);
            self.declare(formal, name, this);
        }

        for param in method.params.iter() {
            let ty = checked_type_from_ty(&param.ty, &self.table, self.context);
            if ty == Type::Void {
                self.report_void_variable(&param.name);
                param_types.push(Type::Error);
                continue;
            }

            param_types.push(ty.clone());
            self.declare(
                formal,
                &param.name,
                Symbol::variable(param.name.data, param.name.span, ty, VariableKind::Parameter),
            );
        }

        let signature = Type::function(return_type, param_types);

        let inherited = superclass_scope.and_then(|scope| self.table.lookup_visible(scope, name.data));
        if let Some(inherited) = inherited {
            if let Some(error) = self.override_error(name, method.is_static, &signature, inherited) {
                self.context.report_error(&name.span, error);
                return;
            }
        }

        let symbol = Symbol::function(
            name.data,
            name.span,
            method.class,
            method.is_static,
            formal,
            signature,
        );
        if self.declare(scope, name, symbol) {
            self.type_analysis.set_method_scope(method.member, formal);
            self.declare_block(method.body, formal);
        }
    }

    fn override_error(
        &self,
        name: &Spanned<'f, Name<'f>>,
        is_static: bool,
        signature: &Type<'f>,
        inherited: &Symbol<'f>,
    ) -> Option<SemanticError> {
        let (inherited_static, owner) = match inherited.kind {
            SymbolKind::Function {
                is_static: inherited_static,
                owner,
                ..
            } => (inherited_static, owner),
            _ => return Some(duplicate_declaration(name, inherited.declared_at())),
        };

        let matches = match (signature.as_function(), inherited.ty.as_function()) {
            _ if is_static != inherited_static => false,
            // static methods hide each other
            _ if is_static => true,
            (Some(signature), Some(inherited)) => signature.overrides(inherited, &self.table),
            _ => false,
        };

        if matches {
            None
        } else {
            Some(SemanticError::BadOverride {
                name: name.data.to_string(),
                class: owner.to_string(),
            })
        }
    }

    fn declare_block(&mut self, block: &'ast Spanned<'f, ast::Block<'f>>, parent: ScopeId) {
        let scope = self.table.new_scope(ScopeKind::Local, None, parent);
        self.type_analysis.set_block_scope(&block.data, scope);

        for stmt in &block.statements {
            self.declare_in_stmt(stmt, scope);
        }
    }

    fn declare_in_stmt(&mut self, stmt: &'ast Spanned<'f, ast::Stmt<'f>>, scope: ScopeId) {
        use self::ast::Stmt::*;
        match &stmt.data {
            Block(block) => self.declare_block(block, scope),
            If(_, then_branch, else_branch) => {
                self.declare_in_stmt(then_branch, scope);
                if let Some(else_branch) = else_branch {
                    self.declare_in_stmt(else_branch, scope);
                }
            }
            While(_, body) | RepeatUntil(body, _) => self.declare_in_stmt(body, scope),
            For {
                init, update, body, ..
            } => {
                self.declare_in_stmt(init, scope);
                self.declare_in_stmt(update, scope);
                self.declare_in_stmt(body, scope);
            }
            LocalVariableDeclaration(ty, name, _) => self.declare_local(scope, ty, name),
            Empty | Assign(_, _) | Expression(_) | Return(_) | Break | Print(_) => {}
        }
    }

    /// Locals may shadow anything declared in an enclosing scope
    fn declare_local(
        &mut self,
        scope: ScopeId,
        ty: &Spanned<'f, ast::Type<'f>>,
        name: &Spanned<'f, Name<'f>>,
    ) {
        let ty = checked_type_from_ty(ty, &self.table, self.context);
        if ty == Type::Void {
            self.report_void_variable(name);
            return;
        }

        self.declare(
            scope,
            name,
            Symbol::variable(name.data, name.span, ty, VariableKind::Local),
        );
    }

    /// A legal program has a class `Main` with a method `static void main()`
    fn check_main_class(&self, strtab: &StringTable<'f>) {
        let main = strtab.get("Main").and_then(|class| {
            strtab
                .get("main")
                .and_then(|method| self.table.lookup_member(class, method))
        });

        let legal = main.map_or(false, |main| {
            main.is_function()
                && main.is_static()
                && main.ty == Type::function(Type::Void, Vec::new())
        });

        if !legal {
            self.context.report_global(SemanticError::NoMainClass);
        }
    }

    /// Declare `symbol` in `scope` or report that `name` is taken
    fn declare(&mut self, scope: ScopeId, name: &Spanned<'f, Name<'f>>, symbol: Symbol<'f>) -> bool {
        match self.table.declare(scope, symbol) {
            Ok(()) => true,
            Err(DuplicateDeclaration { earlier }) => {
                let earlier = Location(earlier.start_position());
                self.context
                    .report_error(&name.span, duplicate_declaration(name, earlier));
                false
            }
        }
    }

    fn report_void_variable(&self, name: &Spanned<'f, Name<'f>>) {
        self.context.report_error(
            &name.span,
            SemanticError::BadVarType {
                name: name.data.to_string(),
            },
        );
    }
}

/// The parts of a method declaration the builder needs
struct Method<'ast, 'f> {
    member: &'ast ast::ClassMember<'f>,
    class: Name<'f>,
    is_static: bool,
    return_ty: &'ast Spanned<'f, ast::Type<'f>>,
    params: &'ast Spanned<'f, ast::ParameterList<'f>>,
    body: &'ast Spanned<'f, ast::Block<'f>>,
}

fn duplicate_declaration<'f>(name: &Spanned<'f, Name<'f>>, earlier: Location<'f>) -> SemanticError {
    SemanticError::DuplicateDeclaration {
        name: name.data.to_string(),
        earlier: earlier.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::{with_main, SemanticErrorKind::*};
    use symtab::{ScopeKind, Type};
    use utils::assert_matches;

    #[test]
    fn valid_program_has_no_errors() {
        analyze_input!(
            with_main(
                "class A { int x; int get() { return x; } }
                 class B extends A { void set(int v) { x = v; } }"
            ),
            |sem, result, _ast| {
                assert_eq!(sem.error_kinds(), vec![]);
                let (table, _) = result.unwrap();
                assert_eq!(table.classes().count(), 3);
            }
        );
    }

    #[test]
    fn classes_may_be_used_before_their_declaration() {
        analyze_input!(
            with_main("class A extends B { class C c; } class B {} class C {}"),
            |sem, result, _ast| {
                assert_eq!(sem.error_kinds(), vec![]);
                assert!(result.is_ok());
            }
        );
    }

    #[test]
    fn duplicate_class_is_skipped() {
        analyze_input!(
            with_main("class A { int x; } class A { bool y; }"),
            |sem, result, _ast| {
                assert_eq!(sem.error_kinds(), vec![DuplicateDeclaration]);
                assert_eq!(
                    sem.errors()[0].to_string(),
                    "declaration of 'A' here conflicts with earlier declaration at (1,7)"
                );
                let (table, _) = result.unwrap();
                assert_eq!(table.classes().count(), 2);
            }
        );
    }

    #[test]
    fn unknown_parent_class() {
        analyze_input!(with_main("class A extends Nope {}"), |sem, result, _ast| {
            assert_eq!(sem.error_kinds(), vec![ClassNotFound]);
            assert!(result.is_ok());
        });
    }

    #[test]
    fn inheritance_cycle_is_fatal() {
        analyze_input!(
            with_main("class A extends B {} class B extends A { void f() { return 1; } }"),
            |sem, result, _ast| {
                assert_eq!(sem.error_kinds(), vec![BadInheritance]);
                assert!(result.is_err());
            }
        );
    }

    #[test]
    fn self_inheritance_is_a_cycle() {
        analyze_input!(with_main("class A extends A {}"), |sem, result, _ast| {
            assert_eq!(sem.error_kinds(), vec![BadInheritance]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn void_variables() {
        analyze_input!(
            with_main(
                "class A {
                    void x;
                    void f(void p) { void l; }
                    void[] g() { }
                }"
            ),
            |sem, _result, _ast| {
                assert_eq!(
                    sem.error_kinds(),
                    vec![BadVarType, BadVarType, BadVarType, BadArrayElementType]
                );
            }
        );
    }

    #[test]
    fn overriding_fields_is_not_allowed() {
        analyze_input!(
            with_main("class A { int x; } class B extends A { int x; }"),
            |sem, _result, _ast| {
                assert_eq!(sem.error_kinds(), vec![OverridingVar]);
            }
        );
    }

    #[test]
    fn overriding_methods_must_match() {
        analyze_input!(
            with_main(
                "class A {
                    int f(int a) { return a; }
                    class A g() { return this; }
                    int h() { return 0; }
                    static void s() {}
                }
                class B extends A {
                    bool f(int a) { return true; }
                    class B g() { return this; }
                    static int h() { return 1; }
                    static void s() {}
                }"
            ),
            |sem, _result, _ast| {
                assert_eq!(sem.error_kinds(), vec![BadOverride, BadOverride]);
                assert_eq!(
                    sem.errors()[0].to_string(),
                    "overriding method 'f' doesn't match the type signature in class 'A'"
                );
            }
        );
    }

    #[test]
    fn duplicate_members_and_parameters() {
        analyze_input!(
            with_main(
                "class A {
                    int x;
                    bool x;
                    void f(int a, int a) {}
                    void f() {}
                }"
            ),
            |sem, _result, _ast| {
                assert_eq!(
                    sem.error_kinds(),
                    vec![DuplicateDeclaration, DuplicateDeclaration, DuplicateDeclaration]
                );
            }
        );
    }

    #[test]
    fn locals_may_shadow_enclosing_scopes() {
        analyze_input!(
            with_main(
                "class A {
                    int x;
                    void f(int x) { { int x; } }
                    void g() { int x; { int x; } }
                    void h(int p) { int p; }
                }"
            ),
            |sem, _result, _ast| {
                assert_eq!(sem.error_kinds(), vec![]);
            }
        );
    }

    #[test]
    fn locals_may_not_be_redeclared_in_the_same_block() {
        analyze_input!(
            with_main("class A { void f() { int y; { bool z; int z; } bool y; } }"),
            |sem, _result, _ast| {
                assert_eq!(sem.error_kinds(), vec![DuplicateDeclaration, DuplicateDeclaration]);
                assert_eq!(
                    sem.errors()[0].to_string(),
                    "declaration of 'z' here conflicts with earlier declaration at (1,36)"
                );
            }
        );
    }

    #[test]
    fn missing_main_class() {
        analyze_input!("class A { static void main() {} }", |sem, _result, _ast| {
            assert_eq!(sem.error_kinds(), vec![NoMainClass]);
            assert!(sem.errors()[0].span().is_none());
        });

        analyze_input!("class Main { void main() {} }", |sem, _result, _ast| {
            assert_eq!(sem.error_kinds(), vec![NoMainClass]);
        });

        analyze_input!("class Main { static int main() { return 0; } }", |sem, _result, _ast| {
            assert_eq!(sem.error_kinds(), vec![NoMainClass]);
        });
    }

    #[test]
    fn instance_methods_get_an_implicit_this_parameter() {
        analyze_input!(
            with_main("class A { int f(bool b) { return 1; } static int g(bool b) { return 1; } }"),
            |sem, result, _ast| {
                assert_eq!(sem.error_kinds(), vec![]);
                let (table, _) = result.unwrap();
                let a = table.classes().next().unwrap();
                let class_scope = table.scope(a.scope().unwrap());
                assert_eq!(class_scope.kind, ScopeKind::Class);

                let mut methods = class_scope.symbols();
                let f = methods.next().unwrap();
                let g = methods.next().unwrap();
                assert_eq!(f.ty.to_string(), "class : A->bool->int");
                assert_eq!(g.ty.to_string(), "bool->int");
                assert_matches!(
                    &table.scope(f.scope().unwrap()).symbols().next().unwrap().ty,
                    Type::Class(_)
                );
            }
        );
    }
}
