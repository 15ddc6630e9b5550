#![allow(dead_code)]

use anyhow::{Result, anyhow, bail};
use iceberg::entry_point::{Declaration, EntryPoint};
use iceberg::error::ResolveMiss;
use iceberg::filter::{Project, ProjectFilter};
use iceberg::metadata::{DependencyMap, MethodMetadata};
use iceberg::resolver::{
    CancellationToken, DeclarationQuery, MethodSymbol, ReferenceLocation, Resolver,
};
use iceberg::workspace::{Workspace, WorkspaceOptions};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub type NameMap = BTreeMap<String, BTreeSet<String>>;

/// Display-name view of a map for readable assertions.
pub fn names(map: &DependencyMap) -> NameMap {
    map.iter()
        .map(|(node, deps)| {
            (
                node.display_name().to_string(),
                deps.iter().map(|d| d.display_name().to_string()).collect(),
            )
        })
        .collect()
}

pub fn expected(entries: &[(&str, &[&str])]) -> NameMap {
    entries
        .iter()
        .map(|(node, deps)| {
            (
                node.to_string(),
                deps.iter().map(|d| d.to_string()).collect(),
            )
        })
        .collect()
}

/// A throwaway C# source tree.
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn with_file(self, rel: &str, contents: &str) -> Self {
        let path = self.dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
        self
    }

    pub fn with_project(self, dir: &str, name: &str) -> Self {
        self.with_file(&format!("{dir}/{name}.csproj"), "<Project Sdk=\"Microsoft.NET.Sdk\" />\n")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn load(&self) -> Workspace {
        Workspace::load(self.path(), &WorkspaceOptions::default()).unwrap()
    }
}

/// Looks up entry points for `Class.Method` with every project accepted.
pub fn entries(
    workspace: &Workspace,
    class: &str,
    method: Option<&str>,
) -> Vec<EntryPoint<<Workspace as Resolver>::Symbol>> {
    workspace
        .find_declarations(
            &DeclarationQuery::new(class, method.map(str::to_string)),
            &iceberg::filter::DefaultProjectFilter,
            &CancellationToken::new(),
        )
        .unwrap()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeSymbol {
    pub name: String,
    pub is_abstract: bool,
    pub is_virtual: bool,
    pub is_override: bool,
    pub overridden: Option<Box<FakeSymbol>>,
}

impl MethodSymbol for FakeSymbol {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    fn is_override(&self) -> bool {
        self.is_override
    }

    fn overridden_method(&self) -> Option<Self> {
        self.overridden.as_deref().cloned()
    }
}

#[derive(Debug, Clone)]
pub struct FakeLocation {
    pub project: String,
    pub caller: String,
}

impl ReferenceLocation for FakeLocation {
    fn project(&self) -> &dyn Project {
        &self.project
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeMethod {
    pub calls: Vec<String>,
    pub project: String,
    pub is_abstract: bool,
    pub is_virtual: bool,
    pub is_override: bool,
    pub overridden: Option<String>,
    pub implementations: Vec<String>,
    /// `declaration_of` reports a miss for this method.
    pub undeclared: bool,
    /// Resolver queries about this method fail.
    pub failing: bool,
    /// Resolving this method cancels the session.
    pub cancels: bool,
}

/// An in-memory call graph answering resolver queries.
#[derive(Debug, Default)]
pub struct FakeResolver {
    pub methods: BTreeMap<String, FakeMethod>,
    /// Names whose dependencies were resolved, in order.
    pub resolved: RefCell<Vec<String>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a resolver from `(method, callees)` pairs in project `Core`.
    pub fn from_calls(graph: &[(&str, &[&str])]) -> Self {
        let mut resolver = Self::new();
        for (name, calls) in graph {
            resolver.add(name, calls);
        }
        resolver
    }

    pub fn add(&mut self, name: &str, calls: &[&str]) -> &mut FakeMethod {
        let method = self.methods.entry(name.to_string()).or_default();
        method.calls = calls.iter().map(|c| c.to_string()).collect();
        if method.project.is_empty() {
            method.project = "Core".to_string();
        }
        for call in calls {
            self.methods
                .entry(call.to_string())
                .or_insert_with(|| FakeMethod {
                    project: "Core".to_string(),
                    ..FakeMethod::default()
                });
        }
        self.methods.get_mut(name).unwrap()
    }

    pub fn get_mut(&mut self, name: &str) -> &mut FakeMethod {
        self.methods.get_mut(name).unwrap()
    }

    pub fn symbol(&self, name: &str) -> FakeSymbol {
        let method = self.methods.get(name).cloned().unwrap_or_default();
        FakeSymbol {
            name: name.to_string(),
            is_abstract: method.is_abstract,
            is_virtual: method.is_virtual,
            is_override: method.is_override,
            overridden: method
                .overridden
                .as_deref()
                .map(|base| Box::new(self.symbol(base))),
        }
    }

    pub fn entry(&self, name: &str) -> EntryPoint<FakeSymbol> {
        EntryPoint::new(Some(self.symbol(name)), name, self.declaration(name))
    }

    pub fn unbound_entry(&self, name: &str) -> EntryPoint<FakeSymbol> {
        EntryPoint::new(None, name, self.declaration(name))
    }

    fn declaration(&self, name: &str) -> Declaration {
        Declaration {
            path: PathBuf::from(format!("/src/{}.cs", MethodMetadata::new(name, "").class_name())),
            project: self
                .methods
                .get(name)
                .map(|m| m.project.clone())
                .unwrap_or_default(),
            start_byte: 0,
            end_byte: 0,
            start_line: 1,
        }
    }

    fn method(&self, name: &str) -> Result<&FakeMethod> {
        self.methods
            .get(name)
            .ok_or_else(|| anyhow!("unknown method {name}"))
    }

    fn check(&self, name: &str, cancel: &CancellationToken) -> Result<&FakeMethod> {
        let method = self.method(name)?;
        if method.cancels {
            cancel.cancel();
            bail!("cancelled while resolving {name}");
        }
        if method.failing {
            bail!("resolver failure for {name}");
        }
        Ok(method)
    }
}

impl Resolver for FakeResolver {
    type Symbol = FakeSymbol;
    type Location = FakeLocation;

    fn find_declarations(
        &self,
        query: &DeclarationQuery,
        projects: &dyn ProjectFilter,
        _cancel: &CancellationToken,
    ) -> Result<Vec<EntryPoint<FakeSymbol>>> {
        Ok(self
            .methods
            .iter()
            .filter(|(name, method)| {
                let meta = MethodMetadata::new(name.as_str(), "");
                meta.class_name().eq_ignore_ascii_case(&query.class_name)
                    && query
                        .method_name
                        .as_deref()
                        .is_none_or(|m| meta.method_name().eq_ignore_ascii_case(m))
                    && projects.matches(&method.project)
            })
            .map(|(name, _)| self.entry(name))
            .collect())
    }

    fn find_call_candidates(
        &self,
        entry: &EntryPoint<FakeSymbol>,
        cancel: &CancellationToken,
    ) -> Result<Vec<FakeSymbol>> {
        self.resolved
            .borrow_mut()
            .push(entry.display_name().to_string());
        let method = self.check(entry.display_name(), cancel)?;
        Ok(method.calls.iter().map(|call| self.symbol(call)).collect())
    }

    fn find_implementations(
        &self,
        symbol: &FakeSymbol,
        cancel: &CancellationToken,
    ) -> Result<Vec<FakeSymbol>> {
        let method = self.check(&symbol.name, cancel)?;
        Ok(method
            .implementations
            .iter()
            .map(|name| self.symbol(name))
            .collect())
    }

    fn find_references(
        &self,
        symbol: &FakeSymbol,
        cancel: &CancellationToken,
    ) -> Result<Vec<FakeLocation>> {
        self.resolved.borrow_mut().push(symbol.name.clone());
        self.check(&symbol.name, cancel)?;
        Ok(self
            .methods
            .iter()
            .filter(|(_, method)| method.calls.iter().any(|call| *call == symbol.name))
            .map(|(caller, method)| FakeLocation {
                project: method.project.clone(),
                caller: caller.clone(),
            })
            .collect())
    }

    fn containing_method(
        &self,
        location: &FakeLocation,
        _cancel: &CancellationToken,
    ) -> Result<Option<EntryPoint<FakeSymbol>>> {
        Ok(Some(self.entry(&location.caller)))
    }

    fn declaration_of(
        &self,
        symbol: &FakeSymbol,
    ) -> std::result::Result<EntryPoint<FakeSymbol>, ResolveMiss> {
        match self.methods.get(&symbol.name) {
            Some(method) if method.undeclared => Err(ResolveMiss::NoDeclaration(symbol.name.clone())),
            Some(_) => Ok(self.entry(&symbol.name)),
            None => Err(ResolveMiss::NotInSolution(symbol.name.clone())),
        }
    }
}

/// Every dependency of every node is itself a node.
pub fn is_closed(map: &DependencyMap) -> bool {
    map.iter()
        .all(|(_, deps)| deps.iter().all(|dep| map.contains(dep.display_name())))
}

pub fn key_set(map: &DependencyMap) -> HashSet<String> {
    map.keys().map(|k| k.display_name().to_string()).collect()
}
