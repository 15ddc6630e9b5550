//! Strategies that narrow raw call-site candidates to real dependencies.

use crate::entry_point::EntryPoint;
use crate::resolver::{CancellationToken, MethodSymbol, Resolver};
use anyhow::Result;
use tracing::debug;

/// Symbol identity as the active resolver defines it.
pub type SymbolEq<'a, S> = &'a dyn Fn(&S, &S) -> bool;

/// Pure selection over candidates that are already known.
pub trait SimpleSelector<S: MethodSymbol> {
    fn select(&self, entry: &EntryPoint<S>, candidates: &[S], same: SymbolEq<'_, S>) -> Vec<S>;
}

/// Selection that has to ask the resolver for more symbols.
pub trait ImplementationSelector<R: Resolver> {
    fn select(
        &self,
        entry: &EntryPoint<R::Symbol>,
        candidates: &[R::Symbol],
        resolver: &R,
        cancel: &CancellationToken,
    ) -> Result<Vec<R::Symbol>>;
}

pub enum MethodSelector<R: Resolver> {
    Simple(Box<dyn SimpleSelector<R::Symbol>>),
    Implementation(Box<dyn ImplementationSelector<R>>),
}

impl<R: Resolver> MethodSelector<R> {
    pub fn select(
        &self,
        entry: &EntryPoint<R::Symbol>,
        candidates: &[R::Symbol],
        resolver: &R,
        cancel: &CancellationToken,
    ) -> Result<Vec<R::Symbol>> {
        match self {
            MethodSelector::Simple(selector) => Ok(selector.select(
                entry,
                candidates,
                &|a, b| resolver.symbols_equal(a, b),
            )),
            MethodSelector::Implementation(selector) => {
                selector.select(entry, candidates, resolver, cancel)
            }
        }
    }
}

/// Concrete calls, overridden bases, and implementations of polymorphic calls.
pub fn default_selectors<R: Resolver + 'static>() -> Vec<MethodSelector<R>> {
    vec![
        MethodSelector::Simple(Box::new(ConcreteMethodSelector)),
        MethodSelector::Simple(Box::new(OverriddenMethodSelector)),
        MethodSelector::Implementation(Box::new(AbstractOrVirtualMethodSelector)),
    ]
}

/// Keeps candidates that are not abstract.
///
/// Abstract targets are left to [`AbstractOrVirtualMethodSelector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcreteMethodSelector;

impl<S: MethodSymbol> SimpleSelector<S> for ConcreteMethodSelector {
    fn select(&self, _entry: &EntryPoint<S>, candidates: &[S], _same: SymbolEq<'_, S>) -> Vec<S> {
        candidates
            .iter()
            .filter(|symbol| !symbol.is_abstract())
            .cloned()
            .collect()
    }
}

/// When the entry point overrides a base method, keeps that base method if the
/// body calls it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverriddenMethodSelector;

impl<S: MethodSymbol> SimpleSelector<S> for OverriddenMethodSelector {
    fn select(&self, entry: &EntryPoint<S>, candidates: &[S], same: SymbolEq<'_, S>) -> Vec<S> {
        let Some(symbol) = entry.symbol() else {
            return Vec::new();
        };
        if !symbol.is_override() {
            return Vec::new();
        }
        let Some(overridden) = symbol.overridden_method() else {
            return Vec::new();
        };
        candidates
            .iter()
            .filter(|candidate| {
                (candidate.is_abstract() || candidate.is_virtual())
                    && !same(candidate, symbol)
                    && same(candidate, &overridden)
            })
            .cloned()
            .collect()
    }
}

/// Expands abstract and virtual candidates to their implementations.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbstractOrVirtualMethodSelector;

impl<R: Resolver> ImplementationSelector<R> for AbstractOrVirtualMethodSelector {
    fn select(
        &self,
        entry: &EntryPoint<R::Symbol>,
        candidates: &[R::Symbol],
        resolver: &R,
        cancel: &CancellationToken,
    ) -> Result<Vec<R::Symbol>> {
        let mut out = Vec::new();
        for candidate in candidates
            .iter()
            .filter(|symbol| symbol.is_abstract() || symbol.is_virtual())
        {
            debug!(symbol = %candidate.display_name(), "finding implementations");
            for implementation in resolver.find_implementations(candidate, cancel)? {
                let is_self = entry
                    .symbol()
                    .is_some_and(|own| resolver.symbols_equal(own, &implementation));
                if !is_self {
                    out.push(implementation);
                }
            }
        }
        Ok(out)
    }
}
