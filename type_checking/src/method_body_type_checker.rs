use crate::{
    checker::{checked_type_from_ty, SemanticContext},
    semantic_error::SemanticError,
    type_analysis::{ExprInfo, LValueKind, TypeAnalysis},
};
use asciifile::{Span, Spanned};
use log::trace;
use parser::ast;
use symtab::{Name, ScopeStack, Symbol, SymbolKind, SymbolTable, Type, VariableKind};

pub struct MethodBodyTypeChecker<'cx, 'ctx, 'ana, 'ast, 't, 'f> {
    context: &'cx SemanticContext<'ctx, 'f>,
    scopes: ScopeStack<'t, 'f>,
    type_analysis: &'ana mut TypeAnalysis<'ast, 'f>,
    current_class: &'t Symbol<'f>,
    current_method: &'t Symbol<'f>,
    /// Enclosing loops of the statement being checked, innermost last
    loops: Vec<&'ast Spanned<'f, ast::Stmt<'f>>>,
    length: Name<'f>,
}

impl<'cx, 'ctx, 'ana, 'ast, 't, 'f> MethodBodyTypeChecker<'cx, 'ctx, 'ana, 'ast, 't, 'f> {
    /// Check the bodies of all methods of `class_decl` that made it into
    /// the symbol table
    pub fn check_methods(
        class_decl: &'ast Spanned<'f, ast::ClassDeclaration<'f>>,
        table: &'t SymbolTable<'f>,
        type_analysis: &'ana mut TypeAnalysis<'ast, 'f>,
        context: &'cx SemanticContext<'ctx, 'f>,
        length: Name<'f>,
    ) {
        let class_scope = match type_analysis.class_scope(&class_decl.data) {
            Some(scope) => scope,
            None => return,
        };

        for member in &class_decl.members {
            let body = match &member.kind {
                ast::ClassMemberKind::Method { body, .. } => body,
                ast::ClassMemberKind::Field(_) => continue,
            };
            let formal = match type_analysis.method_scope(&member.data) {
                Some(formal) => formal,
                None => continue,
            };

            let mut scopes = ScopeStack::new(table);
            scopes.open(class_scope);
            scopes.open(formal);
            let (current_class, current_method) =
                match (scopes.current_class(), scopes.current_function()) {
                    (Some(class), Some(method)) => (class, method),
                    _ => continue,
                };
            trace!("checking {}.{}", current_class.name, current_method.name);

            let mut checker = MethodBodyTypeChecker {
                context,
                scopes,
                type_analysis: &mut *type_analysis,
                current_class,
                current_method,
                loops: Vec::new(),
                length,
            };
            checker.check_block(body);
        }
    }

    fn report(&self, span: &Span<'f>, error: SemanticError) {
        self.context.report_error(span, error)
    }

    fn table(&self) -> &'t SymbolTable<'f> {
        self.scopes.table()
    }

    fn check_block(&mut self, block: &'ast Spanned<'f, ast::Block<'f>>) {
        let scope = self.type_analysis.block_scope(&block.data);
        if let Some(scope) = scope {
            self.scopes.open(scope);
        }

        for stmt in &block.statements {
            self.check_stmt(stmt);
        }

        if scope.is_some() {
            self.scopes.close();
        }
    }

    fn check_stmt(&mut self, stmt: &'ast Spanned<'f, ast::Stmt<'f>>) {
        use self::ast::Stmt::*;
        match &stmt.data {
            Block(block) => self.check_block(block),
            Empty => {}
            If(cond, then_branch, else_branch) => {
                self.check_test_expr(cond);
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }
            While(cond, body) => {
                self.check_test_expr(cond);
                self.check_loop_body(stmt, body);
            }
            For {
                init,
                cond,
                update,
                body,
            } => {
                self.check_stmt(init);
                self.check_test_expr(cond);
                self.check_stmt(update);
                self.check_loop_body(stmt, body);
            }
            // condition first, like the other loops
            RepeatUntil(body, cond) => {
                self.check_test_expr(cond);
                self.check_loop_body(stmt, body);
            }
            Assign(lhs, rhs) => {
                let target = self.type_expr(lhs);
                let value = self.type_expr(rhs);
                if target.is_function_type() || !value.compatible(&target, self.table()) {
                    self.report_incompatible_assignment(&stmt.span, &target, &value);
                }
            }
            Expression(expr) => {
                self.type_expr(expr);
            }
            Return(expr) => self.check_return(&stmt.span, expr.as_ref().map(|expr| &**expr)),
            Break => {
                if self.loops.is_empty() {
                    self.report(&stmt.span, SemanticError::BreakOutsideLoop);
                }
            }
            Print(args) => {
                for (index, arg) in args.iter().enumerate() {
                    let ty = self.type_expr(arg);
                    match ty {
                        Type::Error | Type::Bool | Type::Int | Type::String | Type::Double => {}
                        _ => self.report(
                            &arg.span,
                            SemanticError::BadPrintArgument {
                                index: index + 1,
                                given: ty.to_string(),
                            },
                        ),
                    }
                }
            }
            LocalVariableDeclaration(_, name, init) => {
                if let Some(init) = init {
                    let declared = self.declared_local_type(name);
                    let value = self.type_expr(init);
                    if !value.compatible(&declared, self.table()) {
                        self.report_incompatible_assignment(&stmt.span, &declared, &value);
                    }
                }
            }
        }
    }

    fn check_loop_body(
        &mut self,
        loop_stmt: &'ast Spanned<'f, ast::Stmt<'f>>,
        body: &'ast Spanned<'f, ast::Stmt<'f>>,
    ) {
        self.loops.push(loop_stmt);
        self.check_stmt(body);
        self.loops.pop();
    }

    fn check_test_expr(&mut self, cond: &'ast Spanned<'f, ast::Expr<'f>>) {
        let ty = self.type_expr(cond);
        if !ty.is_error() && ty != Type::Bool {
            self.report(&cond.span, SemanticError::BadTestExpression);
        }
    }

    fn check_return(&mut self, span: &Span<'f>, expr: Option<&'ast Spanned<'f, ast::Expr<'f>>>) {
        let expected = self
            .current_method
            .return_type()
            .cloned()
            .unwrap_or(Type::Error);
        let given = expr.map(|expr| self.type_expr(expr));

        let valid = match &given {
            Some(_) if expected == Type::Void => false,
            Some(given) => given.compatible(&expected, self.table()),
            None => expected == Type::Void || expected.is_error(),
        };

        if !valid {
            self.report(
                span,
                SemanticError::BadReturnType {
                    given: given.unwrap_or(Type::Void).to_string(),
                    expected: expected.to_string(),
                },
            );
        }
    }

    /// Type of the local declared by `name`, `Error` if its declaration
    /// failed
    fn declared_local_type(&self, name: &Spanned<'f, Name<'f>>) -> Type<'f> {
        self.table()
            .scope(self.scopes.current())
            .get(name.data)
            .filter(|symbol| symbol.location == name.span)
            .map_or(Type::Error, |symbol| symbol.ty.clone())
    }

    fn report_incompatible_assignment(&self, span: &Span<'f>, target: &Type<'f>, value: &Type<'f>) {
        self.report(
            span,
            SemanticError::IncompatibleBinaryOperands {
                left: target.to_string(),
                op: "=",
                right: value.to_string(),
            },
        );
    }

    /// Type `expr` and record the result in the type analysis
    fn type_expr(&mut self, expr: &'ast Spanned<'f, ast::Expr<'f>>) -> Type<'f> {
        self.type_expr_as(expr, false).ty
    }

    /// `used_for_ref` marks receivers, where a class name or a method name
    /// may stand on its own
    fn type_expr_as(
        &mut self,
        expr: &'ast Spanned<'f, ast::Expr<'f>>,
        used_for_ref: bool,
    ) -> ExprInfo<'f> {
        let info = self.type_expr_internal(expr, used_for_ref);
        self.type_analysis.set_expr_info(&expr.data, info.clone());
        info
    }

    fn type_expr_internal(
        &mut self,
        expr: &'ast Spanned<'f, ast::Expr<'f>>,
        used_for_ref: bool,
    ) -> ExprInfo<'f> {
        use self::ast::Expr::*;
        match &expr.data {
            Binary(op, lhs, rhs) => self.check_binary_expr(&expr.span, *op, lhs, rhs),
            Unary(op, operand) => self.check_unary_expr(&expr.span, *op, operand),
            MethodInvocation(receiver, name, args) => {
                self.check_method_invocation(&expr.span, Some(&**receiver), name, args)
            }
            ThisMethodInvocation(name, args) => {
                self.check_method_invocation(&expr.span, None, name, args)
            }
            FieldAccess(owner, name) => self.check_field_access(owner, name),
            ArrayAccess(base, index) => self.check_array_access(&expr.span, base, index),
            Null => Type::Null.into(),
            Boolean(_) => Type::Bool.into(),
            Int(_) | ReadInteger => Type::Int.into(),
            Double(_) => Type::Double.into(),
            String(_) | ReadLine => Type::String.into(),
            Var(name) => self.check_var(name, used_for_ref),
            This => {
                if self.current_method.is_static() {
                    self.report(&expr.span, SemanticError::ThisInStaticMethod);
                    ExprInfo::error()
                } else {
                    Type::Class(self.current_class.name).into()
                }
            }
            NewObject(class) => match self.lookup_class(class) {
                Some(symbol) => ExprInfo::new(symbol.ty.clone(), symbol.clone()),
                None => ExprInfo::error(),
            },
            NewArray(element, len) => {
                let element = checked_type_from_ty(element, self.table(), self.context);
                let ty = match element {
                    Type::Void => {
                        self.report(&expr.span, SemanticError::BadArrayElementType);
                        Type::Error
                    }
                    Type::Error => Type::Error,
                    element => Type::Array(Box::new(element)),
                };

                let len_ty = self.type_expr(len);
                if !len_ty.is_error() && len_ty != Type::Int {
                    self.report(&len.span, SemanticError::BadArrayLength);
                }

                ty.into()
            }
            InstanceOf(instance, class) => {
                self.check_class_operand(&expr.span, instance);
                match self.lookup_class(class) {
                    Some(symbol) => ExprInfo::new(Type::Bool, symbol.clone()),
                    None => Type::Bool.into(),
                }
            }
            Cast(class, operand) => {
                self.check_class_operand(&expr.span, operand);
                match self.lookup_class(class) {
                    Some(symbol) => ExprInfo::new(symbol.ty.clone(), symbol.clone()),
                    None => ExprInfo::error(),
                }
            }
        }
    }

    fn check_binary_expr(
        &mut self,
        span: &Span<'f>,
        op: ast::BinaryOp,
        lhs: &'ast Spanned<'f, ast::Expr<'f>>,
        rhs: &'ast Spanned<'f, ast::Expr<'f>>,
    ) -> ExprInfo<'f> {
        use self::ast::BinaryOp::*;
        let left = self.type_expr(lhs);
        let right = self.type_expr(rhs);

        if left.is_error() || right.is_error() {
            return match op {
                Add | Sub | Mul | Div => left,
                Mod => Type::Int,
                _ => Type::Bool,
            }
            .into();
        }

        let numeric = |ty: &Type<'f>| *ty == Type::Int || *ty == Type::Double;
        let (valid, result) = match op {
            Add | Sub | Mul | Div => {
                let valid = numeric(&left) && left.equal(&right);
                (valid, if valid { left.clone() } else { Type::Error })
            }
            Mod => (left == Type::Int && right == Type::Int, Type::Int),
            LessThan | GreaterThan | LessEquals | GreaterEquals => {
                (numeric(&left) && left.equal(&right), Type::Bool)
            }
            Equals | NotEquals => (
                left.compatible(&right, self.table()) || right.compatible(&left, self.table()),
                Type::Bool,
            ),
            LogicalAnd | LogicalOr => (left == Type::Bool && right == Type::Bool, Type::Bool),
        };

        if !valid {
            self.report(
                span,
                SemanticError::IncompatibleBinaryOperands {
                    left: left.to_string(),
                    op: op.symbol(),
                    right: right.to_string(),
                },
            );
        }

        result.into()
    }

    fn check_unary_expr(
        &mut self,
        span: &Span<'f>,
        op: ast::UnaryOp,
        operand: &'ast Spanned<'f, ast::Expr<'f>>,
    ) -> ExprInfo<'f> {
        let ty = self.type_expr(operand);
        let (valid, result) = match op {
            ast::UnaryOp::Neg => match ty {
                Type::Error | Type::Int | Type::Double => (true, ty.clone()),
                _ => (false, Type::Error),
            },
            ast::UnaryOp::Not => (ty == Type::Bool || ty.is_error(), Type::Bool),
        };

        if !valid {
            self.report(
                span,
                SemanticError::IncompatibleUnaryOperand {
                    op: op.symbol(),
                    operand: ty.to_string(),
                },
            );
        }

        result.into()
    }

    fn check_array_access(
        &mut self,
        span: &Span<'f>,
        base: &'ast Spanned<'f, ast::Expr<'f>>,
        index: &'ast Spanned<'f, ast::Expr<'f>>,
    ) -> ExprInfo<'f> {
        let base_ty = self.type_expr(base);
        let ty = match base_ty.element_type() {
            Some(element) => element.clone(),
            None => {
                if !base_ty.is_error() {
                    self.report(&base.span, SemanticError::NotArray);
                }
                Type::Error
            }
        };

        let index_ty = self.type_expr(index);
        if !index_ty.is_error() && index_ty != Type::Int {
            self.report(span, SemanticError::IndexNotInteger);
        }

        ExprInfo {
            lvalue: Some(LValueKind::ArrayElement),
            ..ty.into()
        }
    }

    fn check_var(&mut self, name: &'ast Spanned<'f, Name<'f>>, used_for_ref: bool) -> ExprInfo<'f> {
        let symbol = match self
            .scopes
            .lookup_before_location(name.data, name.span.start_position())
        {
            Some(symbol) => symbol,
            None => {
                self.report_undeclared(name);
                return ExprInfo::error();
            }
        };

        match symbol.kind {
            SymbolKind::Variable(kind) => {
                let mut info = ExprInfo::new(symbol.ty.clone(), symbol.clone());
                info.lvalue = Some(kind.into());
                if kind == VariableKind::Member {
                    if self.current_method.is_static() {
                        self.report(
                            &name.span,
                            SemanticError::ReferenceToNonStaticFromStatic {
                                name: name.data.to_string(),
                                method: self.current_method.name.to_string(),
                            },
                        );
                    } else {
                        info.implicit_this = true;
                    }
                }
                info
            }
            SymbolKind::Function { .. } if used_for_ref => {
                ExprInfo::new(symbol.ty.clone(), symbol.clone())
            }
            SymbolKind::Class { .. } if used_for_ref => ExprInfo {
                is_class: true,
                ..ExprInfo::new(symbol.ty.clone(), symbol.clone())
            },
            SymbolKind::Function { .. } | SymbolKind::Class { .. } => {
                self.report_undeclared(name);
                ExprInfo::error()
            }
        }
    }

    fn report_undeclared(&self, name: &Spanned<'f, Name<'f>>) {
        self.report(
            &name.span,
            SemanticError::UndeclaredVariable {
                name: name.data.to_string(),
            },
        );
    }

    fn check_field_access(
        &mut self,
        owner: &'ast Spanned<'f, ast::Expr<'f>>,
        name: &'ast Spanned<'f, Name<'f>>,
    ) -> ExprInfo<'f> {
        let owner_info = self.type_expr_as(owner, true);
        if owner_info.ty.is_error() {
            return ExprInfo::error();
        }

        let class = match owner_info.ty.class_name() {
            Some(class) if !owner_info.is_class => class,
            _ => {
                self.report(
                    &name.span,
                    SemanticError::NotClassField {
                        name: name.data.to_string(),
                        owner: owner_info.ty.to_string(),
                    },
                );
                return ExprInfo::error();
            }
        };

        let table = self.table();
        match table.lookup_member(class, name.data) {
            None => {
                self.report(
                    &name.span,
                    SemanticError::FieldNotFound {
                        name: name.data.to_string(),
                        owner: owner_info.ty.to_string(),
                    },
                );
                ExprInfo::error()
            }
            Some(symbol) if symbol.is_variable() => {
                let this_class = Type::Class(self.current_class.name);
                if this_class.compatible(&owner_info.ty, table) {
                    ExprInfo {
                        lvalue: Some(LValueKind::Member),
                        ..ExprInfo::new(symbol.ty.clone(), symbol.clone())
                    }
                } else {
                    self.report(
                        &name.span,
                        SemanticError::FieldNotAccessible {
                            name: name.data.to_string(),
                            owner: owner_info.ty.to_string(),
                        },
                    );
                    symbol.ty.clone().into()
                }
            }
            Some(symbol) => ExprInfo::new(symbol.ty.clone(), symbol.clone()),
        }
    }

    fn check_method_invocation(
        &mut self,
        span: &Span<'f>,
        receiver: Option<&'ast Spanned<'f, ast::Expr<'f>>>,
        name: &'ast Spanned<'f, Name<'f>>,
        args: &'ast Spanned<'f, ast::ArgumentList<'f>>,
    ) -> ExprInfo<'f> {
        let receiver_info = match receiver {
            Some(receiver) => {
                let info = self.type_expr_as(receiver, true);
                if let Some(result) = self.check_receiver(span, &info, name, args) {
                    self.type_args(args);
                    return result;
                }
                Some(info)
            }
            None => None,
        };

        let (class, receiver_ty) = match &receiver_info {
            Some(info) => match info.ty.class_name() {
                Some(class) => (class, info.ty.clone()),
                None => return ExprInfo::error(),
            },
            None => (
                self.current_class.name,
                Type::Class(self.current_class.name),
            ),
        };

        let table = self.table();
        let function = match table.lookup_member(class, name.data) {
            Some(symbol) if symbol.is_function() => symbol,
            lookup => {
                let name = name.data.to_string();
                let owner = receiver_ty.to_string();
                let error = match lookup {
                    None => SemanticError::FieldNotFound { name, owner },
                    Some(_) => SemanticError::NotClassMethod { name, owner },
                };
                self.report(span, error);
                self.type_args(args);
                return ExprInfo::error();
            }
        };

        let is_static = function.is_static();
        match &receiver_info {
            None if !is_static && self.current_method.is_static() => self.report(
                span,
                SemanticError::ReferenceToNonStaticFromStatic {
                    name: name.data.to_string(),
                    method: self.current_method.name.to_string(),
                },
            ),
            Some(info) if !is_static && info.is_class => self.report(
                span,
                SemanticError::NotClassField {
                    name: name.data.to_string(),
                    owner: receiver_ty.to_string(),
                },
            ),
            _ => {}
        }

        let arg_types = self.type_args(args);

        // instance methods carry the receiver as their first parameter
        let params = function
            .ty
            .as_function()
            .map_or(&[][..], |function| &function.params[..]);
        let offset = if is_static { 0 } else { 1 };
        let expected = params.len().saturating_sub(offset);
        if args.len() != expected {
            self.report(
                span,
                SemanticError::BadArgCount {
                    name: name.data.to_string(),
                    expected,
                    given: args.len(),
                },
            );
        }

        for (index, (arg, ty)) in args.iter().zip(&arg_types).enumerate() {
            if let Some(param) = params.get(index + offset) {
                if !ty.compatible(param, table) {
                    self.report(
                        &arg.span,
                        SemanticError::BadArgType {
                            index: index + 1,
                            given: ty.to_string(),
                            expected: param.to_string(),
                        },
                    );
                }
            }
        }

        let return_type = function.return_type().cloned().unwrap_or(Type::Error);
        ExprInfo {
            implicit_this: receiver_info.is_none() && !is_static && !self.current_method.is_static(),
            ..ExprInfo::new(return_type, function.clone())
        }
    }

    /// Checks on an explicit receiver that decide the type of the call on
    /// their own: an erroneous receiver, the builtin `length` and receivers
    /// that are not objects.
    fn check_receiver(
        &self,
        span: &Span<'f>,
        receiver: &ExprInfo<'f>,
        name: &Spanned<'f, Name<'f>>,
        args: &Spanned<'f, ast::ArgumentList<'f>>,
    ) -> Option<ExprInfo<'f>> {
        if receiver.ty.is_error() {
            return Some(ExprInfo::error());
        }

        if name.data == self.length {
            if receiver.ty.is_array_type() {
                if !args.is_empty() {
                    self.report(span, SemanticError::BadLengthArg { given: args.len() });
                }
                return Some(ExprInfo {
                    is_array_length: true,
                    ..Type::Int.into()
                });
            } else if !receiver.ty.is_class_type() {
                self.report(span, SemanticError::BadLength);
                return Some(ExprInfo::error());
            }
        }

        if !receiver.ty.is_class_type() {
            self.report(
                span,
                SemanticError::NotClassField {
                    name: name.data.to_string(),
                    owner: receiver.ty.to_string(),
                },
            );
            return Some(ExprInfo::error());
        }

        None
    }

    fn type_args(&mut self, args: &'ast Spanned<'f, ast::ArgumentList<'f>>) -> Vec<Type<'f>> {
        args.iter().map(|arg| self.type_expr(arg)).collect()
    }

    /// Operand of `instanceof` and casts
    fn check_class_operand(&mut self, span: &Span<'f>, operand: &'ast Spanned<'f, ast::Expr<'f>>) {
        let ty = self.type_expr(operand);
        if !ty.is_error() && !ty.is_class_type() {
            self.report(span, SemanticError::NotClassType { ty: ty.to_string() });
        }
    }

    fn lookup_class(&self, class: &Spanned<'f, Name<'f>>) -> Option<&'t Symbol<'f>> {
        let symbol = self.table().lookup_class(class.data);
        if symbol.is_none() {
            self.report(
                &class.span,
                SemanticError::ClassNotFound {
                    name: class.data.to_string(),
                },
            );
        }
        symbol
    }
}
