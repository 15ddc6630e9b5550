//! Rendering of dependency maps for viewers and scripts.

pub mod colors;
pub mod dgml;

pub use colors::ColorPicker;
pub use dgml::{DgmlBuilder, DgmlCategory, DgmlLink, DgmlNode};

use crate::metadata::{DependencyMap, MethodMetadata};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::info;

/// Category used for methods declared outside any namespace.
pub const GLOBAL_CATEGORY: &str = "global";

#[derive(ValueEnum, Serialize, Clone, Copy, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Dgml,
    Json,
}

/// Renders `map` as DGML. Nodes are grouped into one colored category per
/// namespace prefix of `specificity` components.
pub fn export_dependency_map(name: &str, map: &DependencyMap, specificity: usize) -> Result<String> {
    export_with_colors(name, map, specificity, &mut ColorPicker::new())
}

pub fn export_with_colors(
    name: &str,
    map: &DependencyMap,
    specificity: usize,
    colors: &mut ColorPicker,
) -> Result<String> {
    let mut builder = DgmlBuilder::new(format!("{name} Dependency Map"));
    let mut categories = HashSet::new();
    for key in map.sorted_keys() {
        let category = category_name(key, specificity);
        if categories.insert(category.clone()) {
            builder.add_category(DgmlCategory {
                id: category.clone(),
                background: colors.next_color().to_string(),
                stroke: None,
                label: Some(category.clone()),
            });
        }
        builder.add_node(DgmlNode {
            id: key.member_path().to_string(),
            label: None,
            category: Some(category),
            reference: Some(key.source_path().to_string()),
        });
    }
    for (source, target) in map.sorted_edges() {
        builder.add_link(DgmlLink {
            source: source.member_path().to_string(),
            target: target.member_path().to_string(),
            label: None,
            category: None,
        });
    }
    builder.build()
}

pub fn to_json(map: &DependencyMap) -> Result<String> {
    serde_json::to_string_pretty(map).context("serialize dependency map")
}

/// Writes `map` to `path` in `format`, creating parent directories.
pub fn write_dependency_map(
    path: &Path,
    name: &str,
    map: &DependencyMap,
    format: ExportFormat,
    specificity: usize,
) -> Result<()> {
    let rendered = match format {
        ExportFormat::Dgml => export_dependency_map(name, map, specificity)?,
        ExportFormat::Json => to_json(map)?,
    };
    crate::util::ensure_parent_dir(path)?;
    fs::write(path, rendered).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), ?format, nodes = map.len(), "dependency map written");
    Ok(())
}

/// The first `specificity` namespace components joined by `.`.
pub fn category_name(method: &MethodMetadata, specificity: usize) -> String {
    let parts = method.namespace_components();
    let take = specificity.min(parts.len());
    if take == 0 {
        return GLOBAL_CATEGORY.to_string();
    }
    parts[..take].join(".")
}
