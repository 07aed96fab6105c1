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

//! String table with zero-copy and amortised O(1) insert
//!
//! Identifiers are interned once by the lexer. Afterwards, all phases compare
//! names by pointer, which is what makes `Symbol` usable as a cheap key in
//! the scope maps of the semantic analysis.

use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
};

#[derive(Debug, Clone, Copy, Eq, PartialOrd, Ord)]
pub struct Symbol<'f>(&'f str);

impl<'f> Symbol<'f> {
    fn as_raw(&self) -> *const u8 {
        self.0.as_ptr()
    }

    pub fn as_str(&self) -> &'f str {
        self.0
    }
}

impl Hash for Symbol<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_raw().hash(state)
    }
}

impl PartialEq for Symbol<'_> {
    fn eq(&self, other: &Symbol<'_>) -> bool {
        self.as_raw() == other.as_raw() && self.0.len() == other.0.len()
    }
}

impl PartialEq<str> for Symbol<'_> {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl fmt::Display for Symbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Default)]
pub struct StringTable<'f> {
    entries: HashSet<&'f str>,
}

const STRING_TABLE_THIS_SYMBOL: &str = "this";
const STRING_TABLE_LENGTH_SYMBOL: &str = "length";

impl<'f> StringTable<'f> {
    pub fn new() -> Self {
        let mut st = StringTable::default();
        st.intern(STRING_TABLE_THIS_SYMBOL);
        st.intern(STRING_TABLE_LENGTH_SYMBOL);
        st
    }

    pub fn intern(&mut self, value: &'f str) -> Symbol<'f> {
        if let Some(&entry) = self.entries.get(value) {
            return Symbol(entry);
        }

        self.entries.insert(value);
        Symbol(value)
    }

    /// Name of the implicit receiver parameter of instance methods
    pub fn this_symbol(&mut self) -> Symbol<'f> {
        self.intern(STRING_TABLE_THIS_SYMBOL)
    }

    /// Name of the builtin array length method
    pub fn length_symbol(&mut self) -> Symbol<'f> {
        self.intern(STRING_TABLE_LENGTH_SYMBOL)
    }

    /// Look up an already interned string without inserting it
    pub fn get(&self, value: &str) -> Option<Symbol<'f>> {
        self.entries.get(value).map(|entry| Symbol(*entry))
    }
}
