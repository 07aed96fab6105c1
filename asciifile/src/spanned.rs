//! Values tagged with the source range they were read from. AST nodes,
//! tokens and compiler messages are all `Spanned`. Messages about the
//! program as a whole, like a missing `Main` class or an unexpected end of
//! file, are `MaybeSpanned::WithoutSpan`.

use crate::Span;
use std::{fmt, ops::Deref};

#[derive(Debug, Clone)]
pub struct Spanned<'f, T> {
    pub span: Span<'f>,
    pub data: T,
}

impl<'f, T> Spanned<'f, T> {
    pub fn new(span: Span<'f>, data: T) -> Self {
        Spanned { span, data }
    }

    /// Same span, other data. Used to turn a token into the value it
    /// yields.
    pub fn map<U, F>(&self, f: F) -> Spanned<'f, U>
    where
        F: FnOnce(&T) -> U,
    {
        Spanned::new(self.span, f(&self.data))
    }
}

/// Equal data at different places is equal, so that trees parsed from
/// different sources can be compared.
impl<T: PartialEq> PartialEq for Spanned<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T: Eq> Eq for Spanned<'_, T> {}

impl<T> Deref for Spanned<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

#[derive(Debug)]
pub enum MaybeSpanned<'f, T> {
    WithoutSpan(T),
    WithSpan(Spanned<'f, T>),
}

impl<'f, T> MaybeSpanned<'f, T> {
    pub fn new(span: Option<Span<'f>>, data: T) -> Self {
        match span {
            Some(span) => MaybeSpanned::WithSpan(Spanned::new(span, data)),
            None => MaybeSpanned::WithoutSpan(data),
        }
    }

    pub fn span(&self) -> Option<Span<'f>> {
        match self {
            MaybeSpanned::WithoutSpan(_) => None,
            MaybeSpanned::WithSpan(spanned) => Some(spanned.span),
        }
    }

    /// Borrow the message for the diagnostics writer
    pub fn as_display(&self) -> MaybeSpanned<'f, &dyn fmt::Display>
    where
        T: fmt::Display,
    {
        MaybeSpanned::new(self.span(), &**self as &dyn fmt::Display)
    }
}

impl<T> Deref for MaybeSpanned<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            MaybeSpanned::WithoutSpan(data) => data,
            MaybeSpanned::WithSpan(spanned) => &spanned.data,
        }
    }
}

impl<'f, 'a, T: fmt::Display> From<&'a Spanned<'f, T>> for MaybeSpanned<'f, &'a dyn fmt::Display> {
    fn from(spanned: &'a Spanned<'f, T>) -> Self {
        MaybeSpanned::WithSpan(Spanned::new(spanned.span, &spanned.data))
    }
}
