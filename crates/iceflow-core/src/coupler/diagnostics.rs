//! Lazily-computed diagnostics aggregated across a component chain.
//!
//! Each entry pairs a name with metadata and a closure borrowing the
//! producing component; nothing is computed until `compute()` is called.
//! `combine` merges an inner component's list with the wrapping
//! component's own entries: own entries come after the inner ones and, on
//! a name collision, the outer entry replaces the inner one. The inner
//! list itself is never mutated.

use crate::domain::CoreResult;
use crate::grid::{Field2, FieldMetadata};

pub struct Diagnostic<'a, T> {
    metadata: FieldMetadata,
    compute: Box<dyn Fn() -> CoreResult<T> + 'a>,
}

impl<'a, T> Diagnostic<'a, T> {
    pub fn new(metadata: FieldMetadata, compute: impl Fn() -> CoreResult<T> + 'a) -> Self {
        Self {
            metadata,
            compute: Box::new(compute),
        }
    }

    pub fn metadata(&self) -> &FieldMetadata {
        &self.metadata
    }

    pub fn compute(&self) -> CoreResult<T> {
        (self.compute)()
    }
}

pub type FieldDiagnostic<'a> = Diagnostic<'a, Field2>;
pub type TsDiagnostic<'a> = Diagnostic<'a, f64>;

pub struct DiagnosticList<'a, T> {
    entries: Vec<(String, Diagnostic<'a, T>)>,
}

pub type FieldDiagnosticList<'a> = DiagnosticList<'a, Field2>;
pub type TsDiagnosticList<'a> = DiagnosticList<'a, f64>;

impl<T> Default for DiagnosticList<'_, T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<'a, T> DiagnosticList<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, diagnostic: Diagnostic<'a, T>) {
        self.entries.push((name.into(), diagnostic));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Diagnostic<'a, T>> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, diagnostic)| diagnostic)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Diagnostic<'a, T>)> {
        self.entries
            .iter()
            .map(|(name, diagnostic)| (name.as_str(), diagnostic))
    }

    /// Merges a wrapped component's list with the wrapping component's
    /// own entries; identically-named outer entries shadow inner ones.
    pub fn combine(inner: Self, outer: Self) -> Self {
        let mut entries = inner.entries;
        for (name, diagnostic) in outer.entries {
            entries.retain(|(existing, _)| *existing != name);
            entries.push((name, diagnostic));
        }
        Self { entries }
    }
}
