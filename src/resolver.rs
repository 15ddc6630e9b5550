//! The symbol-level capability the mapper queries.
//!
//! A [`Resolver`] owns all knowledge about the analyzed codebase: where methods
//! are declared, what a method body calls, who overrides or implements what,
//! and where a symbol is referenced. The mapping engine only combines these
//! answers.

use crate::entry_point::EntryPoint;
use crate::error::ResolveMiss;
use crate::filter::{Project, ProjectFilter};
use anyhow::Result;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a caller and a mapping session.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// A bound method symbol.
pub trait MethodSymbol: Clone + Debug + PartialEq {
    fn name(&self) -> &str;
    fn display_name(&self) -> String;
    fn is_abstract(&self) -> bool;
    fn is_virtual(&self) -> bool;
    fn is_override(&self) -> bool;
    /// The base method this symbol overrides, when it is an override.
    fn overridden_method(&self) -> Option<Self>;
}

/// A call site of some symbol.
pub trait ReferenceLocation: Debug {
    fn project(&self) -> &dyn Project;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationQuery {
    pub class_name: String,
    pub method_name: Option<String>,
}

impl DeclarationQuery {
    pub fn new(class_name: impl Into<String>, method_name: Option<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name,
        }
    }
}

pub trait Resolver {
    type Symbol: MethodSymbol;
    type Location: ReferenceLocation;

    /// Method declarations on a class (and optionally with a method name),
    /// restricted to projects accepted by `projects`. Interface members are
    /// never returned and results are unique by display name.
    fn find_declarations(
        &self,
        query: &DeclarationQuery,
        projects: &dyn ProjectFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<EntryPoint<Self::Symbol>>>;

    /// Method symbols referenced inside the entry point's body that belong to
    /// the analyzed codebase.
    fn find_call_candidates(
        &self,
        entry: &EntryPoint<Self::Symbol>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Self::Symbol>>;

    /// Workspace-wide implementations and overrides of an abstract or virtual symbol.
    fn find_implementations(
        &self,
        symbol: &Self::Symbol,
        cancel: &CancellationToken,
    ) -> Result<Vec<Self::Symbol>>;

    /// Workspace-wide call sites of a symbol.
    fn find_references(
        &self,
        symbol: &Self::Symbol,
        cancel: &CancellationToken,
    ) -> Result<Vec<Self::Location>>;

    /// The method declaration enclosing a call site, if any.
    fn containing_method(
        &self,
        location: &Self::Location,
        cancel: &CancellationToken,
    ) -> Result<Option<EntryPoint<Self::Symbol>>>;

    /// Builds the entry point for a symbol's declaration.
    fn declaration_of(
        &self,
        symbol: &Self::Symbol,
    ) -> std::result::Result<EntryPoint<Self::Symbol>, ResolveMiss>;

    fn symbols_equal(&self, a: &Self::Symbol, b: &Self::Symbol) -> bool {
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationToken;

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }
}
