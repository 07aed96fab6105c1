use crate::{
    build_symbols, method_body_type_checker::MethodBodyTypeChecker,
    semantic_error::{SemanticError, SemanticErrorKind},
    type_analysis::TypeAnalysis,
};
use asciifile::{MaybeSpanned, Span, Spanned};
use compiler_shared::context::Context;
use failure::{Error, Fail};
use log::debug;
use parser::ast;
use std::cell::{Ref, RefCell};
use strtab::StringTable;
use symtab::{SymbolTable, Type};

/// Semantic analysis stopped early. The reason was already reported as a
/// diagnostic.
#[derive(Debug, Fail)]
#[fail(display = "semantic analysis aborted")]
pub struct AnalysisAborted;

/// Build the symbol table of `ast` and type check all method bodies. Every
/// diagnostic is emitted through `context` once analysis is done.
pub fn check<'ast, 'f>(
    strtab: &mut StringTable<'f>,
    ast: &'ast ast::AST<'f>,
    context: &Context<'f>,
) -> Result<(SymbolTable<'f>, TypeAnalysis<'ast, 'f>), Error> {
    let sem_context = SemanticContext::new(context);
    let result = analyze(strtab, ast, &sem_context);
    sem_context.emit();
    result
}

/// Like `check`, but diagnostics stay in `sem_context`
pub fn analyze<'ast, 'f>(
    strtab: &mut StringTable<'f>,
    ast: &'ast ast::AST<'f>,
    sem_context: &SemanticContext<'_, 'f>,
) -> Result<(SymbolTable<'f>, TypeAnalysis<'ast, 'f>), Error> {
    let mut type_analysis = TypeAnalysis::new();

    let program = match ast {
        ast::AST::Program(program) => program,
        ast::AST::Empty => {
            sem_context.report_global(SemanticError::NoMainClass);
            return Ok((SymbolTable::new(), type_analysis));
        }
    };

    let table = build_symbols::build(strtab, program, &mut type_analysis, sem_context)?;

    debug!("type checking {} classes", program.classes.len());
    let length = strtab.length_symbol();
    for class_decl in &program.classes {
        MethodBodyTypeChecker::check_methods(
            class_decl,
            &table,
            &mut type_analysis,
            sem_context,
            length,
        );
    }

    Ok((table, type_analysis))
}

pub struct SemanticContext<'ctx, 'f> {
    pub context: &'ctx Context<'f>,
    errors: RefCell<Vec<MaybeSpanned<'f, SemanticError>>>,
}

impl<'ctx, 'f> SemanticContext<'ctx, 'f> {
    pub fn new(context: &'ctx Context<'f>) -> SemanticContext<'ctx, 'f> {
        SemanticContext {
            context,
            errors: RefCell::new(Vec::new()),
        }
    }

    pub fn report_error(&self, span: &Span<'f>, error: SemanticError) {
        self.errors
            .borrow_mut()
            .push(MaybeSpanned::new(Some(*span), error))
    }

    /// Report an error that belongs to the program as a whole
    pub fn report_global(&self, error: SemanticError) {
        self.errors
            .borrow_mut()
            .push(MaybeSpanned::WithoutSpan(error))
    }

    /// Errors in the order they were found
    pub fn errors(&self) -> Ref<'_, Vec<MaybeSpanned<'f, SemanticError>>> {
        self.errors.borrow()
    }

    pub fn error_kinds(&self) -> Vec<SemanticErrorKind> {
        self.errors().iter().map(|error| error.kind()).collect()
    }

    /// Write all errors to the diagnostics of the shared context
    pub fn emit(&self) {
        for error in self.errors().iter() {
            self.context.diagnostics.error(error.as_display());
        }
    }
}

/// Type denoted by a type expression. Unknown classes and arrays of `void`
/// are reported and yield `Error`, a plain `void` is returned as is and left
/// to the caller.
pub fn checked_type_from_ty<'f>(
    ty: &Spanned<'f, ast::Type<'f>>,
    table: &SymbolTable<'f>,
    context: &SemanticContext<'_, 'f>,
) -> Type<'f> {
    use self::ast::BasicType::*;
    let basic = match &ty.basic.data {
        Int => Type::Int,
        Double => Type::Double,
        Boolean => Type::Bool,
        String => Type::String,
        Void => Type::Void,
        Class(name) => {
            if table.lookup_class(*name).is_none() {
                context.report_error(
                    &ty.basic.span,
                    SemanticError::ClassNotFound {
                        name: name.to_string(),
                    },
                );
                return Type::Error;
            }
            Type::Class(*name)
        }
    };

    if ty.array_depth > 0 && basic == Type::Void {
        context.report_error(&ty.span, SemanticError::BadArrayElementType);
        return Type::Error;
    }

    Type::array_of(basic, ty.array_depth)
}
