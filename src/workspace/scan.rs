use anyhow::{Result, bail};
use ignore::WalkBuilder;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::warn;

const SOURCE_EXTENSIONS: &[&str] = &["cs"];
const PROJECT_EXTENSION: &str = "csproj";

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub no_ignore: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedProject {
    pub name: String,
    /// Directory holding the project file.
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedSource {
    pub rel_path: String,
    pub abs_path: PathBuf,
    /// Index into [`ScanResult::projects`].
    pub project: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub projects: Vec<ScannedProject>,
    pub sources: Vec<ScannedSource>,
}

/// Finds project files and C# sources under `root`.
///
/// Every source belongs to the project whose directory is its deepest
/// ancestor. Sources outside any project fall into a project named after the
/// root directory.
pub fn scan_workspace(root: &Path, options: ScanOptions) -> Result<ScanResult> {
    if !root.is_dir() {
        bail!("workspace root {} is not a directory", root.display());
    }
    let mut builder = WalkBuilder::new(root);
    if options.no_ignore {
        builder
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false);
    } else {
        builder
            .ignore(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .parents(true)
            .require_git(false);
    }
    let walker = builder
        .hidden(false)
        .filter_entry(|entry| !is_ignored_entry(entry))
        .build();

    let mut projects = Vec::new();
    let mut source_paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "walk error");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path.extension().and_then(OsStr::to_str) else {
            continue;
        };
        if ext.eq_ignore_ascii_case(PROJECT_EXTENSION) {
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let dir = path.parent().unwrap_or(root).to_path_buf();
            projects.push(ScannedProject { name, root: dir });
        } else if SOURCE_EXTENSIONS.contains(&ext) {
            source_paths.push(path.to_path_buf());
        }
    }
    projects.sort_by(|a, b| a.root.cmp(&b.root).then_with(|| a.name.cmp(&b.name)));

    let mut fallback = None;
    let mut sources = Vec::with_capacity(source_paths.len());
    for abs_path in source_paths {
        let rel_path = crate::util::normalize_rel_path(root, &abs_path)?;
        let project = match owning_project(&projects, &abs_path) {
            Some(index) => index,
            None => *fallback.get_or_insert_with(|| {
                projects.push(ScannedProject {
                    name: fallback_project_name(root),
                    root: root.to_path_buf(),
                });
                projects.len() - 1
            }),
        };
        sources.push(ScannedSource {
            rel_path,
            abs_path,
            project,
        });
    }
    sources.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(ScanResult { projects, sources })
}

fn owning_project(projects: &[ScannedProject], path: &Path) -> Option<usize> {
    projects
        .iter()
        .enumerate()
        .filter(|(_, project)| path.starts_with(&project.root))
        .max_by_key(|(_, project)| project.root.components().count())
        .map(|(index, _)| index)
}

fn fallback_project_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(root)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Workspace".to_string())
}

fn is_ignored_entry(entry: &ignore::DirEntry) -> bool {
    let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
    match entry.file_name() {
        name if name == OsStr::new(".git") => true,
        name if is_dir && (name == OsStr::new("bin") || name == OsStr::new("obj")) => true,
        _ => false,
    }
}
