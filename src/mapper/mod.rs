//! Dependency mapping engine
//!
//! Expands seed entry points into a [`DependencyMap`] in one flow direction:
//! - upstream: what each method calls
//! - downstream: which methods call it

pub mod context;
pub mod trim;

pub use context::MappingContext;
pub use trim::trim_to_depth;

use crate::entry_point::EntryPoint;
use crate::error::MapResult;
use crate::filter::{DefaultProjectFilter, ProjectFilter};
use crate::metadata::DependencyMap;
use crate::resolver::{CancellationToken, Resolver};
use crate::selector::{MethodSelector, default_selectors};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use tracing::info;

#[derive(ValueEnum, Serialize, Clone, Copy, Debug, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    #[value(alias = "u")]
    Upstream,
    #[value(alias = "d")]
    Downstream,
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowDirection::Upstream => f.write_str("upstream"),
            FlowDirection::Downstream => f.write_str("downstream"),
        }
    }
}

/// Runs mapping sessions with a fixed selector list.
pub struct DependencyMapper<R: Resolver> {
    selectors: Vec<MethodSelector<R>>,
}

impl<R: Resolver + 'static> Default for DependencyMapper<R> {
    fn default() -> Self {
        Self::new(default_selectors())
    }
}

impl<R: Resolver> DependencyMapper<R> {
    pub fn new(selectors: Vec<MethodSelector<R>>) -> Self {
        Self { selectors }
    }

    /// Callees of every seed, optionally bounded to `depth` hops.
    pub fn map_upstream(
        &self,
        resolver: &R,
        entries: &[EntryPoint<R::Symbol>],
        depth: Option<usize>,
        cancel: &CancellationToken,
    ) -> MapResult<DependencyMap> {
        self.run(
            FlowDirection::Upstream,
            resolver,
            entries,
            &DefaultProjectFilter,
            depth,
            cancel,
        )
    }

    /// Callers of every seed. Call sites in projects rejected by `consumers`
    /// are ignored.
    pub fn map_downstream(
        &self,
        resolver: &R,
        entries: &[EntryPoint<R::Symbol>],
        consumers: Option<&dyn ProjectFilter>,
        depth: Option<usize>,
        cancel: &CancellationToken,
    ) -> MapResult<DependencyMap> {
        self.run(
            FlowDirection::Downstream,
            resolver,
            entries,
            consumers.unwrap_or(&DefaultProjectFilter),
            depth,
            cancel,
        )
    }

    pub fn map(
        &self,
        flow: FlowDirection,
        resolver: &R,
        entries: &[EntryPoint<R::Symbol>],
        consumers: Option<&dyn ProjectFilter>,
        depth: Option<usize>,
        cancel: &CancellationToken,
    ) -> MapResult<DependencyMap> {
        match flow {
            FlowDirection::Upstream => self.map_upstream(resolver, entries, depth, cancel),
            FlowDirection::Downstream => {
                self.map_downstream(resolver, entries, consumers, depth, cancel)
            }
        }
    }

    fn run(
        &self,
        flow: FlowDirection,
        resolver: &R,
        entries: &[EntryPoint<R::Symbol>],
        consumers: &dyn ProjectFilter,
        depth: Option<usize>,
        cancel: &CancellationToken,
    ) -> MapResult<DependencyMap> {
        let span = tracing::info_span!("map", %flow, seeds = entries.len());
        let _guard = span.enter();
        info!(depth = ?depth, "mapping started");

        let mut context = MappingContext::new(resolver, &self.selectors, consumers, flow, cancel)
            .with_max_depth(depth);
        for entry in entries {
            context.map_entry_point(entry)?;
        }
        let map = context.into_map();
        info!(nodes = map.len(), edges = map.edge_count(), "mapping finished");
        Ok(map)
    }
}
