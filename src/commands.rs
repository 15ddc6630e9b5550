//! The work behind each CLI subcommand.

use crate::cli::TargetArgs;
use crate::config::Config;
use crate::entry_point::EntryPoint;
use crate::export::{ExportFormat, write_dependency_map};
use crate::filter::{
    DefaultProjectFilter, FilterMode, ProjectFilter, ProjectNameContainsFilter, ProjectNameFilter,
};
use crate::mapper::{DependencyMapper, FlowDirection};
use crate::resolver::{CancellationToken, DeclarationQuery, Resolver};
use crate::workspace::{CSharpSymbol, Workspace, WorkspaceOptions};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MapSummary {
    pub output: PathBuf,
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntryPointRecord {
    pub display_name: String,
    pub source_path: String,
    pub project: String,
    pub line: usize,
}

pub struct MapRequest {
    pub flow: FlowDirection,
    pub distance: Option<usize>,
    pub output: Option<PathBuf>,
    pub format: ExportFormat,
}

/// Maps every matching entry point and writes the result. Returns `None`
/// when nothing matched.
pub fn run_map(
    target: &TargetArgs,
    request: &MapRequest,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<Option<MapSummary>> {
    let workspace = load_workspace(target, config)?;
    let entries = find_entry_points(&workspace, target, cancel)?;
    if entries.is_empty() {
        info!("No matching entry points found.");
        return Ok(None);
    }

    let consumers = consumer_filter(config);
    let mapper = DependencyMapper::<Workspace>::default();
    let map = mapper
        .map(
            request.flow,
            &workspace,
            &entries,
            Some(consumers.as_ref()),
            request.distance,
            cancel,
        )
        .with_context(|| format!("map {}", target.map_name()))?;

    let output = request.output.clone().unwrap_or_else(|| config.output.clone());
    write_dependency_map(
        &output,
        &target.map_name(),
        &map,
        request.format,
        config.namespace_specificity,
    )?;
    Ok(Some(MapSummary {
        output,
        nodes: map.len(),
        edges: map.edge_count(),
    }))
}

pub fn run_entry_points(
    target: &TargetArgs,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<Vec<EntryPointRecord>> {
    let workspace = load_workspace(target, config)?;
    let entries = find_entry_points(&workspace, target, cancel)?;
    if entries.is_empty() {
        info!("No matching entry points found.");
    }
    Ok(entries
        .iter()
        .map(|entry| EntryPointRecord {
            display_name: entry.display_name().to_string(),
            source_path: entry.source_path(),
            project: entry.declaration().project.clone(),
            line: entry.declaration().start_line,
        })
        .collect())
}

fn load_workspace(target: &TargetArgs, config: &Config) -> Result<Workspace> {
    Workspace::load(
        &target.path,
        &WorkspaceOptions {
            no_ignore: target.no_ignore,
            threads: config.parse_threads,
        },
    )
    .with_context(|| format!("load workspace {}", target.path.display()))
}

fn find_entry_points(
    workspace: &Workspace,
    target: &TargetArgs,
    cancel: &CancellationToken,
) -> Result<Vec<EntryPoint<CSharpSymbol>>> {
    let projects = entry_point_filter(target.project.as_deref());
    let query = DeclarationQuery::new(target.class.clone(), target.method.clone());
    workspace.find_declarations(&query, projects.as_ref(), cancel)
}

/// Only the named project when one is given, otherwise every project.
pub fn entry_point_filter(project: Option<&str>) -> Box<dyn ProjectFilter> {
    match project {
        Some(name) => Box::new(ProjectNameFilter::new([name], FilterMode::Include)),
        None => Box::new(DefaultProjectFilter),
    }
}

/// Projects searched for callers in downstream mapping.
pub fn consumer_filter(config: &Config) -> Box<dyn ProjectFilter> {
    if config.downstream_exclude.is_empty() {
        Box::new(DefaultProjectFilter)
    } else {
        Box::new(ProjectNameContainsFilter::new(
            config.downstream_exclude.clone(),
            FilterMode::Exclude,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_filter_excludes_configured_substring() {
        let config = Config::default();
        let filter = consumer_filter(&config);
        assert!(!filter.matches(&"Orders.Tests".to_string()));
        assert!(filter.matches(&"Orders.Api".to_string()));

        let open = Config {
            downstream_exclude: String::new(),
            ..Config::default()
        };
        assert!(consumer_filter(&open).matches(&"Orders.Tests".to_string()));
    }

    #[test]
    fn entry_point_filter_restricts_to_named_project() {
        let filter = entry_point_filter(Some("Orders.Api"));
        assert!(filter.matches(&"Orders.Api".to_string()));
        assert!(!filter.matches(&"Orders.Core".to_string()));
        assert!(entry_point_filter(None).matches(&"Anything".to_string()));
    }
}
