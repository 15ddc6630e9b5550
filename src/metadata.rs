use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// A node of a dependency graph, identified solely by its display name.
///
/// The name-derived accessors parse `display_name` on first use and cache the
/// result. They never fail: malformed input yields empty values.
#[derive(Clone, Default)]
pub struct MethodMetadata {
    display_name: String,
    source_path: String,
    method_name: OnceLock<String>,
    class_name: OnceLock<String>,
    namespace_components: OnceLock<Vec<String>>,
    type_parameters: OnceLock<Vec<String>>,
    parameters: OnceLock<Vec<String>>,
}

impl MethodMetadata {
    pub fn new(display_name: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            source_path: source_path.into(),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn method_name(&self) -> &str {
        self.method_name.get_or_init(|| {
            path_segments(&self.display_name)
                .last()
                .cloned()
                .unwrap_or_default()
        })
    }

    pub fn class_name(&self) -> &str {
        self.class_name.get_or_init(|| {
            let segments = path_segments(&self.display_name);
            if segments.len() < 2 {
                return String::new();
            }
            segments[segments.len() - 2].clone()
        })
    }

    pub fn namespace_components(&self) -> &[String] {
        self.namespace_components.get_or_init(|| {
            let mut segments = path_segments(&self.display_name);
            let keep = segments.len().saturating_sub(2);
            segments.truncate(keep);
            segments
        })
    }

    pub fn type_parameters(&self) -> &[String] {
        self.type_parameters
            .get_or_init(|| parse_type_parameters(&self.display_name))
    }

    pub fn parameters(&self) -> &[String] {
        self.parameters
            .get_or_init(|| parse_parameters(&self.display_name))
    }

    /// Display name with the namespace prefix removed, e.g. `Class.Method(int)`.
    pub fn member_path(&self) -> &str {
        let namespace = self.namespace_components();
        if namespace.is_empty() {
            return &self.display_name;
        }
        let prefix = namespace.join(".");
        self.display_name
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(&self.display_name)
    }
}

impl PartialEq for MethodMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.display_name == other.display_name
    }
}

impl Eq for MethodMetadata {}

impl Hash for MethodMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.display_name.hash(state);
    }
}

impl Borrow<str> for MethodMetadata {
    fn borrow(&self) -> &str {
        &self.display_name
    }
}

impl fmt::Debug for MethodMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodMetadata")
            .field("display_name", &self.display_name)
            .field("source_path", &self.source_path)
            .finish()
    }
}

impl fmt::Display for MethodMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

impl Serialize for MethodMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MethodMetadata", 2)?;
        state.serialize_field("display_name", &self.display_name)?;
        state.serialize_field("source_path", &self.source_path)?;
        state.end()
    }
}

/// The part of a display name before its parameter list.
fn signature_head(display_name: &str) -> &str {
    match display_name.find('(') {
        Some(idx) => &display_name[..idx],
        None => display_name,
    }
}

/// Dotted path segments of the signature head with every generic group removed,
/// so `Outer<T>.Inner.Run<U>` yields `["Outer", "Inner", "Run"]`.
fn path_segments(display_name: &str) -> Vec<String> {
    let head = signature_head(display_name);
    let mut stripped = String::with_capacity(head.len());
    let mut depth = 0usize;
    for ch in head.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }
    stripped.split('.').map(|s| s.trim().to_string()).collect()
}

fn parse_type_parameters(display_name: &str) -> Vec<String> {
    let head = signature_head(display_name).trim_end();
    if !head.ends_with('>') {
        return Vec::new();
    }
    let mut depth = 0usize;
    let mut open = None;
    for (idx, ch) in head.char_indices().rev() {
        match ch {
            '>' => depth += 1,
            '<' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    open = Some(idx);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(open) = open else {
        return Vec::new();
    };
    split_top_level(&head[open + 1..head.len() - 1])
}

fn parse_parameters(display_name: &str) -> Vec<String> {
    let Some(open) = display_name.find('(') else {
        return Vec::new();
    };
    let close = display_name.rfind(')').filter(|close| *close > open);
    let inner = match close {
        Some(close) => &display_name[open + 1..close],
        None => &display_name[open + 1..],
    };
    split_top_level(inner)
}

/// Splits on commas that are not nested inside `<>`, `()` or `[]`.
fn split_top_level(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in raw.chars() {
        match ch {
            '<' | '(' | '[' => {
                depth += 1;
                current.push(ch);
            }
            '>' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    out.push(current);
    out.into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Direct dependencies of every visited method in one flow direction.
///
/// A key exists for every visited node, including terminal and depth-truncated
/// ones, whose sets are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    entries: HashMap<MethodMetadata, HashSet<MethodMetadata>>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `node` with `dependencies`, replacing any previous record.
    pub fn insert(
        &mut self,
        node: MethodMetadata,
        dependencies: HashSet<MethodMetadata>,
    ) -> Option<HashSet<MethodMetadata>> {
        self.entries.insert(node, dependencies)
    }

    pub fn get(&self, display_name: &str) -> Option<&HashSet<MethodMetadata>> {
        self.entries.get(display_name)
    }

    pub fn get_key(&self, display_name: &str) -> Option<&MethodMetadata> {
        self.entries.get_key_value(display_name).map(|(key, _)| key)
    }

    pub fn contains(&self, display_name: &str) -> bool {
        self.entries.contains_key(display_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.entries.values().map(HashSet::len).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &MethodMetadata> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MethodMetadata, &HashSet<MethodMetadata>)> {
        self.entries.iter()
    }

    /// Keys sorted by display name, for deterministic output.
    pub fn sorted_keys(&self) -> Vec<&MethodMetadata> {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort_by(|a, b| a.display_name().cmp(b.display_name()));
        keys
    }

    /// `(dependent, dependency)` pairs sorted by display name.
    pub fn sorted_edges(&self) -> Vec<(&MethodMetadata, &MethodMetadata)> {
        let mut edges: Vec<_> = self
            .entries
            .iter()
            .flat_map(|(node, deps)| deps.iter().map(move |dep| (node, dep)))
            .collect();
        edges.sort_by(|a, b| {
            a.0.display_name()
                .cmp(b.0.display_name())
                .then_with(|| a.1.display_name().cmp(b.1.display_name()))
        });
        edges
    }
}

impl FromIterator<(MethodMetadata, HashSet<MethodMetadata>)> for DependencyMap {
    fn from_iter<I: IntoIterator<Item = (MethodMetadata, HashSet<MethodMetadata>)>>(
        iter: I,
    ) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DependencyMap {
    type Item = (MethodMetadata, HashSet<MethodMetadata>);
    type IntoIter = std::collections::hash_map::IntoIter<MethodMetadata, HashSet<MethodMetadata>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[derive(Serialize)]
struct EdgeRecord<'a> {
    source: &'a str,
    target: &'a str,
}

impl Serialize for DependencyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let edges: Vec<EdgeRecord<'_>> = self
            .sorted_edges()
            .into_iter()
            .map(|(source, target)| EdgeRecord {
                source: source.display_name(),
                target: target.display_name(),
            })
            .collect();
        let mut state = serializer.serialize_struct("DependencyMap", 2)?;
        state.serialize_field("nodes", &self.sorted_keys())?;
        state.serialize_field("edges", &edges)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_names_from_display_name() {
        let meta = MethodMetadata::new("Acme.App.Service.Run(int, string)", "Service.cs");
        assert_eq!(meta.method_name(), "Run");
        assert_eq!(meta.class_name(), "Service");
        assert_eq!(meta.namespace_components(), ["Acme", "App"]);
        assert!(meta.type_parameters().is_empty());
        assert_eq!(meta.parameters(), ["int", "string"]);
        assert_eq!(meta.member_path(), "Service.Run(int, string)");
    }

    #[test]
    fn parses_type_parameters_and_nested_generics() {
        let meta = MethodMetadata::new(
            "Acme.Cache<TKey>.Store.Put<T, U>(Dictionary<string, int>, T)",
            "",
        );
        assert_eq!(meta.method_name(), "Put");
        assert_eq!(meta.class_name(), "Store");
        assert_eq!(meta.namespace_components(), ["Acme", "Cache"]);
        assert_eq!(meta.type_parameters(), ["T", "U"]);
        assert_eq!(meta.parameters(), ["Dictionary<string, int>", "T"]);
    }

    #[test]
    fn global_namespace_and_no_parameters() {
        let meta = MethodMetadata::new("MyClass.EntryPoint()", "MyClass.cs");
        assert_eq!(meta.class_name(), "MyClass");
        assert!(meta.namespace_components().is_empty());
        assert!(meta.parameters().is_empty());
        assert_eq!(meta.member_path(), "MyClass.EntryPoint()");
    }

    #[test]
    fn malformed_names_yield_empty_fields() {
        let meta = MethodMetadata::new("", "");
        assert_eq!(meta.method_name(), "");
        assert_eq!(meta.class_name(), "");
        assert!(meta.namespace_components().is_empty());
        assert!(meta.parameters().is_empty());

        let meta = MethodMetadata::new("Broken(int", "");
        assert_eq!(meta.method_name(), "Broken");
        assert_eq!(meta.class_name(), "");
        assert_eq!(meta.parameters(), ["int"]);
    }

    #[test]
    fn equality_ignores_source_path() {
        let a = MethodMetadata::new("A.B()", "one.cs");
        let b = MethodMetadata::new("A.B()", "two.cs");
        assert_eq!(a, b);
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn map_lookup_by_display_name() {
        let mut map = DependencyMap::new();
        let dep = MethodMetadata::new("A.Callee()", "a.cs");
        map.insert(
            MethodMetadata::new("A.Caller()", "a.cs"),
            [dep.clone()].into_iter().collect(),
        );
        map.insert(dep, HashSet::new());
        assert!(map.contains("A.Caller()"));
        assert_eq!(map.get("A.Caller()").map(HashSet::len), Some(1));
        assert_eq!(map.edge_count(), 1);
        assert_eq!(map.get_key("A.Callee()").map(|m| m.source_path()), Some("a.cs"));
    }

    #[test]
    fn serializes_sorted_nodes_and_edges() {
        let map: DependencyMap = [
            (
                MethodMetadata::new("B.Run()", "b.cs"),
                [MethodMetadata::new("A.Run()", "a.cs")].into_iter().collect(),
            ),
            (MethodMetadata::new("A.Run()", "a.cs"), HashSet::new()),
        ]
        .into_iter()
        .collect();
        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(value["nodes"][0]["display_name"], "A.Run()");
        assert_eq!(value["nodes"][1]["source_path"], "b.cs");
        assert_eq!(value["edges"][0]["source"], "B.Run()");
        assert_eq!(value["edges"][0]["target"], "A.Run()");
    }
}
