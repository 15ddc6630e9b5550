use crate::entry_point::EntryPoint;
use crate::error::{MapError, MapResult};
use crate::filter::ProjectFilter;
use crate::mapper::FlowDirection;
use crate::metadata::{DependencyMap, MethodMetadata};
use crate::resolver::{CancellationToken, MethodSymbol, ReferenceLocation, Resolver};
use crate::selector::MethodSelector;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// One mapping session: a fresh [`DependencyMap`] filled by depth-first
/// expansion of every entry point handed to [`MappingContext::map_entry_point`].
///
/// A node is recorded before its dependencies are expanded, so re-entering it
/// through a cycle finds the record and stops.
pub struct MappingContext<'a, R: Resolver> {
    resolver: &'a R,
    selectors: &'a [MethodSelector<R>],
    consumers: &'a dyn ProjectFilter,
    flow: FlowDirection,
    max_depth: Option<usize>,
    cancel: &'a CancellationToken,
    map: DependencyMap,
    // Largest remaining hop budget each node was expanded with.
    budgets: HashMap<String, usize>,
    // Resolved dependencies, kept in bounded sessions so a node reached again
    // with a larger budget is not resolved twice.
    resolved: HashMap<String, Vec<EntryPoint<R::Symbol>>>,
}

impl<'a, R: Resolver> MappingContext<'a, R> {
    pub fn new(
        resolver: &'a R,
        selectors: &'a [MethodSelector<R>],
        consumers: &'a dyn ProjectFilter,
        flow: FlowDirection,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            resolver,
            selectors,
            consumers,
            flow,
            max_depth: None,
            cancel,
            map: DependencyMap::new(),
            budgets: HashMap::new(),
            resolved: HashMap::new(),
        }
    }

    /// Bounds expansion to `depth` hops from each seed. Nodes reached with no
    /// hops left are recorded with an empty dependency set.
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn map(&self) -> &DependencyMap {
        &self.map
    }

    pub fn into_map(self) -> DependencyMap {
        self.map
    }

    pub fn map_entry_point(&mut self, entry: &EntryPoint<R::Symbol>) -> MapResult<()> {
        let budget = self.max_depth.unwrap_or(usize::MAX);
        self.visit(entry, budget)
    }

    fn visit(&mut self, entry: &EntryPoint<R::Symbol>, remaining: usize) -> MapResult<()> {
        if self.cancel.is_cancelled() {
            return Err(MapError::Cancelled);
        }
        let name = entry.display_name();
        if name.trim().is_empty() {
            info!("entry point with a blank name; skipping");
            return Ok(());
        }
        if let Some(&seen) = self.budgets.get(name) {
            if self.max_depth.is_none() || remaining <= seen {
                debug!(display_name = name, "already mapped; skipping");
                return Ok(());
            }
        }
        self.budgets.insert(name.to_string(), remaining);

        if remaining == 0 {
            self.map.insert(entry.metadata(), HashSet::new());
            return Ok(());
        }
        if entry.symbol().is_none() {
            info!(display_name = name, "no declared symbol for entry point; skipping");
            self.map.insert(entry.metadata(), HashSet::new());
            return Ok(());
        }

        let cached = self.resolved.get(name).cloned();
        let dependencies = match cached {
            Some(cached) => cached,
            None => {
                let found = self.resolve(entry)?;
                if self.cancel.is_cancelled() {
                    return Err(MapError::Cancelled);
                }
                if self.max_depth.is_some() {
                    self.resolved.insert(name.to_string(), found.clone());
                }
                found
            }
        };

        let recorded: HashSet<MethodMetadata> =
            dependencies.iter().map(EntryPoint::metadata).collect();
        self.map.insert(entry.metadata(), recorded);

        let next = match self.max_depth {
            Some(_) => remaining - 1,
            None => usize::MAX,
        };
        for dependency in &dependencies {
            self.visit(dependency, next)?;
        }
        Ok(())
    }

    fn resolve(&self, entry: &EntryPoint<R::Symbol>) -> MapResult<Vec<EntryPoint<R::Symbol>>> {
        let found = match self.flow {
            FlowDirection::Upstream => self.resolve_upstream(entry)?,
            FlowDirection::Downstream => self.resolve_downstream(entry)?,
        };
        Ok(dedup_dependencies(entry, found))
    }

    fn resolve_upstream(
        &self,
        entry: &EntryPoint<R::Symbol>,
    ) -> MapResult<Vec<EntryPoint<R::Symbol>>> {
        let candidates = self.recover(
            self.resolver.find_call_candidates(entry, self.cancel),
            "find call candidates",
        )?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let mut selected = Vec::new();
        for selector in self.selectors {
            let symbols = self.recover(
                selector.select(entry, &candidates, self.resolver, self.cancel),
                "select candidates",
            )?;
            selected.extend(symbols);
        }

        let mut out = Vec::with_capacity(selected.len());
        for symbol in &selected {
            match self.resolver.declaration_of(symbol) {
                Ok(dependency) => out.push(dependency),
                Err(miss) => info!(symbol = %symbol.display_name(), reason = %miss, "skipping candidate"),
            }
        }
        Ok(out)
    }

    fn resolve_downstream(
        &self,
        entry: &EntryPoint<R::Symbol>,
    ) -> MapResult<Vec<EntryPoint<R::Symbol>>> {
        let Some(symbol) = entry.symbol() else {
            return Ok(Vec::new());
        };
        let references = self.recover(
            self.resolver.find_references(symbol, self.cancel),
            "find references",
        )?;
        let mut out = Vec::new();
        for location in &references {
            if !self.consumers.matches(location.project()) {
                debug!(project = location.project().name(), "reference outside consumer projects");
                continue;
            }
            let consumer = self.recover(
                self.resolver.containing_method(location, self.cancel),
                "resolve containing method",
            )?;
            let Some(consumer) = consumer else {
                debug!(?location, "reference is not inside a method body");
                continue;
            };
            let is_self = consumer
                .symbol()
                .is_some_and(|own| self.resolver.symbols_equal(own, symbol));
            if is_self {
                continue;
            }
            out.push(consumer);
        }
        Ok(out)
    }

    /// Resolver failures skip the step unless the session was cancelled.
    fn recover<T: Default>(&self, result: anyhow::Result<T>, step: &str) -> MapResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(_) if self.cancel.is_cancelled() => Err(MapError::Cancelled),
            Err(err) => {
                warn!(step, error = %err, "resolver step failed; skipping");
                Ok(T::default())
            }
        }
    }
}

/// Keeps the first dependency per display name and drops self references.
fn dedup_dependencies<S>(
    entry: &EntryPoint<S>,
    found: Vec<EntryPoint<S>>,
) -> Vec<EntryPoint<S>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(found.len());
    for dependency in found {
        let name = dependency.display_name();
        if name.trim().is_empty() {
            info!("dependency with a blank name; skipping");
            continue;
        }
        if name == entry.display_name() {
            debug!(display_name = name, "self reference; skipping");
            continue;
        }
        if !seen.insert(name.to_string()) {
            debug!(display_name = name, "duplicate dependency; skipping");
            continue;
        }
        out.push(dependency);
    }
    out
}
