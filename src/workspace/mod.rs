//! A C# source tree loaded into memory and exposed as a [`Resolver`].
//!
//! Loading walks the tree once, parses every `.cs` file with tree-sitter and
//! builds a [`binding::SymbolTable`]. All later queries are answered from the
//! table.

pub mod binding;
pub mod csharp;
pub mod scan;

use crate::entry_point::{Declaration, EntryPoint};
use crate::error::ResolveMiss;
use crate::filter::{Project, ProjectFilter};
use crate::resolver::{
    CancellationToken, DeclarationQuery, MethodSymbol, ReferenceLocation, Resolver,
};
use anyhow::{Context, Result, bail};
use binding::{DocumentInfo, SymbolTable};
use csharp::{CSharpParser, ParsedFile, TypeKind};
use rayon::prelude::*;
use scan::{ScanOptions, scan_workspace};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkspaceOptions {
    pub no_ignore: bool,
    /// Parser threads; 0 uses the global rayon pool.
    pub threads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: String,
    pub root: PathBuf,
}

impl Project for ProjectInfo {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A method declared in a loaded workspace.
#[derive(Clone)]
pub struct CSharpSymbol {
    table: Arc<SymbolTable>,
    id: usize,
}

impl CSharpSymbol {
    fn info(&self) -> &binding::MethodInfo {
        &self.table.methods[self.id]
    }
}

impl PartialEq for CSharpSymbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table) && self.id == other.id
    }
}

impl fmt::Debug for CSharpSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CSharpSymbol")
            .field(&self.info().display_name)
            .finish()
    }
}

impl MethodSymbol for CSharpSymbol {
    fn name(&self) -> &str {
        &self.info().name
    }

    fn display_name(&self) -> String {
        self.info().display_name.clone()
    }

    fn is_abstract(&self) -> bool {
        self.info().modifiers.is_abstract
    }

    fn is_virtual(&self) -> bool {
        self.info().modifiers.is_virtual
    }

    fn is_override(&self) -> bool {
        self.info().modifiers.is_override
    }

    fn overridden_method(&self) -> Option<Self> {
        self.info().overridden.map(|id| CSharpSymbol {
            table: Arc::clone(&self.table),
            id,
        })
    }
}

/// A call site inside some body of the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CSharpReference {
    pub project: String,
    pub path: PathBuf,
    pub line: usize,
    pub start_byte: usize,
    body: usize,
}

impl ReferenceLocation for CSharpReference {
    fn project(&self) -> &dyn Project {
        &self.project
    }
}

pub struct Workspace {
    root: PathBuf,
    projects: Vec<ProjectInfo>,
    table: Arc<SymbolTable>,
    pool: Option<rayon::ThreadPool>,
}

impl Workspace {
    pub fn load(root: &Path, options: &WorkspaceOptions) -> Result<Self> {
        let scan = scan_workspace(
            root,
            ScanOptions {
                no_ignore: options.no_ignore,
            },
        )?;
        let pool = match options.threads {
            0 => None,
            threads => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .context("build parser thread pool")?,
            ),
        };
        // Fail early if the grammar cannot be loaded at all.
        CSharpParser::new().context("load C# grammar")?;

        let sources = &scan.sources;
        let parse_all = || {
            sources
                .par_iter()
                .map_init(
                    || CSharpParser::new().ok(),
                    |parser, source| {
                        let parser = parser.as_mut()?;
                        let text = match crate::util::read_to_string(&source.abs_path) {
                            Ok(text) => text,
                            Err(err) => {
                                warn!(path = %source.rel_path, error = %err, "skipping unreadable source");
                                return None;
                            }
                        };
                        parser.parse(&text)
                    },
                )
                .collect::<Vec<Option<ParsedFile>>>()
        };
        let parsed = match &pool {
            Some(pool) => pool.install(parse_all),
            None => parse_all(),
        };

        let mut documents = Vec::with_capacity(sources.len());
        let mut files = Vec::with_capacity(sources.len());
        for (source, file) in sources.iter().zip(parsed) {
            let file = file.unwrap_or_else(|| {
                debug!(path = %source.rel_path, "no declarations extracted");
                ParsedFile::default()
            });
            documents.push(DocumentInfo {
                path: source.abs_path.clone(),
                rel_path: source.rel_path.clone(),
                project: source.project,
            });
            files.push(file);
        }
        let table = SymbolTable::build(documents, files);
        let projects = scan
            .projects
            .into_iter()
            .map(|project| ProjectInfo {
                name: project.name,
                root: project.root,
            })
            .collect::<Vec<_>>();
        info!(
            root = %root.display(),
            projects = projects.len(),
            documents = table.documents.len(),
            types = table.types.len(),
            methods = table.methods.len(),
            "workspace loaded"
        );
        Ok(Self {
            root: root.to_path_buf(),
            projects,
            table: Arc::new(table),
            pool,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn projects(&self) -> &[ProjectInfo] {
        &self.projects
    }

    pub fn document_count(&self) -> usize {
        self.table.documents.len()
    }

    pub fn method_count(&self) -> usize {
        self.table.methods.len()
    }

    fn install<T: Send>(&self, work: impl FnOnce() -> T + Send) -> T {
        match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    }

    fn symbol(&self, id: usize) -> CSharpSymbol {
        CSharpSymbol {
            table: Arc::clone(&self.table),
            id,
        }
    }

    fn project_name(&self, document: usize) -> &str {
        self.projects
            .get(self.table.documents[document].project)
            .map(|p| p.name.as_str())
            .unwrap_or("")
    }

    fn entry_point(&self, id: usize) -> EntryPoint<CSharpSymbol> {
        let method = &self.table.methods[id];
        let document = &self.table.documents[method.document];
        EntryPoint::new(
            Some(self.symbol(id)),
            method.display_name.clone(),
            Declaration {
                path: document.path.clone(),
                project: self.project_name(method.document).to_string(),
                start_byte: method.start_byte,
                end_byte: method.end_byte,
                start_line: method.start_line,
            },
        )
    }

    fn owned_id(&self, symbol: &CSharpSymbol) -> Result<usize> {
        if !Arc::ptr_eq(&symbol.table, &self.table) {
            bail!("symbol {:?} belongs to another workspace", symbol);
        }
        Ok(symbol.id)
    }
}

impl Resolver for Workspace {
    type Symbol = CSharpSymbol;
    type Location = CSharpReference;

    fn find_declarations(
        &self,
        query: &DeclarationQuery,
        projects: &dyn ProjectFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<EntryPoint<CSharpSymbol>>> {
        let accepted: Vec<bool> = self
            .projects
            .iter()
            .map(|project| projects.matches(project))
            .collect();
        let table = &self.table;
        let mut ids: Vec<usize> = self.install(|| {
            (0..table.methods.len())
                .into_par_iter()
                .filter(|&id| {
                    if cancel.is_cancelled() {
                        return false;
                    }
                    let method = &table.methods[id];
                    let owner = &table.types[method.type_id];
                    let project = table.documents[method.document].project;
                    owner.kind != TypeKind::Interface
                        && accepted.get(project).copied().unwrap_or(false)
                        && owner.name.eq_ignore_ascii_case(&query.class_name)
                        && query
                            .method_name
                            .as_deref()
                            .is_none_or(|name| method.name.eq_ignore_ascii_case(name))
                })
                .collect()
        });
        if cancel.is_cancelled() {
            bail!("declaration search cancelled");
        }
        ids.sort_by(|a, b| table.methods[*a].display_name.cmp(&table.methods[*b].display_name));
        ids.dedup_by(|a, b| table.methods[*a].display_name == table.methods[*b].display_name);
        debug!(class = %query.class_name, found = ids.len(), "declarations resolved");
        Ok(ids.into_iter().map(|id| self.entry_point(id)).collect())
    }

    fn find_call_candidates(
        &self,
        entry: &EntryPoint<CSharpSymbol>,
        _cancel: &CancellationToken,
    ) -> Result<Vec<CSharpSymbol>> {
        let Some(symbol) = entry.symbol() else {
            return Ok(Vec::new());
        };
        let id = self.owned_id(symbol)?;
        Ok(self
            .table
            .call_targets(id)
            .into_iter()
            .map(|target| self.symbol(target))
            .collect())
    }

    fn find_implementations(
        &self,
        symbol: &CSharpSymbol,
        _cancel: &CancellationToken,
    ) -> Result<Vec<CSharpSymbol>> {
        let id = self.owned_id(symbol)?;
        Ok(self
            .table
            .implementations(id)
            .into_iter()
            .map(|found| self.symbol(found))
            .collect())
    }

    fn find_references(
        &self,
        symbol: &CSharpSymbol,
        cancel: &CancellationToken,
    ) -> Result<Vec<CSharpReference>> {
        let id = self.owned_id(symbol)?;
        let mut out = Vec::new();
        for site_ref in self.table.references_of(id) {
            if cancel.is_cancelled() {
                bail!("reference search cancelled");
            }
            let body = &self.table.bodies[site_ref.body];
            let site = &body.sites[site_ref.site];
            out.push(CSharpReference {
                project: self.project_name(body.document).to_string(),
                path: self.table.documents[body.document].path.clone(),
                line: site.line,
                start_byte: site.start_byte,
                body: site_ref.body,
            });
        }
        Ok(out)
    }

    fn containing_method(
        &self,
        location: &CSharpReference,
        _cancel: &CancellationToken,
    ) -> Result<Option<EntryPoint<CSharpSymbol>>> {
        let body = self
            .table
            .bodies
            .get(location.body)
            .with_context(|| format!("unknown body for reference at {}", location.path.display()))?;
        Ok(body.method.map(|id| self.entry_point(id)))
    }

    fn declaration_of(
        &self,
        symbol: &CSharpSymbol,
    ) -> std::result::Result<EntryPoint<CSharpSymbol>, ResolveMiss> {
        if !Arc::ptr_eq(&symbol.table, &self.table) {
            return Err(ResolveMiss::NotInSolution(symbol.display_name()));
        }
        let method = &self.table.methods[symbol.id];
        let document = &self.table.documents[method.document];
        if self.projects.get(document.project).is_none() {
            return Err(ResolveMiss::DocumentNotFound {
                project: String::new(),
                document: document.rel_path.clone(),
            });
        }
        Ok(self.entry_point(symbol.id))
    }
}
