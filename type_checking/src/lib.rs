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

//! Semantic analysis of Decaf programs: a pre-pass that builds the symbol
//! table, then one traversal per method body that resolves names, types
//! every expression and reports all violations it finds.

/// Lex, parse and analyze `$input`. `$sem` is the `SemanticContext` holding
/// the reported errors, `$result` what `analyze` returned.
#[cfg(test)]
macro_rules! analyze_input {
    ($input:expr, |$sem:ident, $result:ident, $ast:ident| $body:block) => {{
        let input: String = $input.into();
        let file = asciifile::AsciiFile::new(input.as_bytes()).unwrap();
        let context = compiler_shared::context::Context::dummy(&file);
        let mut strtab = strtab::StringTable::new();
        let tokens: Vec<_> = lexer::Lexer::new(&mut strtab, &context)
            .map(|token| token.unwrap())
            .filter(|token| match token.data {
                lexer::TokenKind::Whitespace | lexer::TokenKind::Comment(_) => false,
                _ => true,
            })
            .collect();
        let $ast = parser::Parser::new(tokens.into_iter()).parse().unwrap();
        let $sem = crate::checker::SemanticContext::new(&context);
        let $result = crate::checker::analyze(&mut strtab, &$ast, &$sem);
        $body
    }};
}

mod build_symbols;
pub mod checker;
pub mod method_body_type_checker;
pub mod semantic_error;
pub mod type_analysis;

pub use self::{
    checker::{analyze, check, AnalysisAborted, SemanticContext},
    semantic_error::{SemanticError, SemanticErrorKind},
    type_analysis::{ExprInfo, LValueKind, TypeAnalysis},
};

#[cfg(test)]
fn with_main(classes: &str) -> String {
    format!("{}\nclass Main {{ static void main() {{ }} }}\n", classes)
}
