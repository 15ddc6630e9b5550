//! Workspace-wide symbol table built from parsed files.
//!
//! Binding is name-based: receivers are typed from locals, parameters, fields,
//! properties and call return types declared in the workspace. Calls into
//! anything declared outside the workspace stay unbound.

use super::csharp::{CallSite, Modifiers, Parameter, ParsedFile, Receiver, TypeKind};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub path: PathBuf,
    pub rel_path: String,
    pub project: usize,
}

#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub name: String,
    pub kind: TypeKind,
    pub namespace: String,
    pub outer: Option<usize>,
    pub type_params: Vec<String>,
    /// Namespace and enclosing types, e.g. `Acme.Outer<T>`.
    pub container: String,
    pub bases: Vec<String>,
    pub base_class: Option<usize>,
    pub interfaces: Vec<usize>,
    pub members: HashMap<String, String>,
    pub methods: Vec<usize>,
}

impl TypeInfo {
    fn display_name(&self) -> String {
        let own = with_type_params(&self.name, &self.type_params);
        if self.container.is_empty() {
            own
        } else {
            format!("{}.{own}", self.container)
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    pub type_id: usize,
    pub document: usize,
    pub type_params: Vec<String>,
    pub params: Vec<Parameter>,
    pub return_type: String,
    pub modifiers: Modifiers,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub body: Option<usize>,
    pub display_name: String,
    pub overridden: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct BodyInfo {
    pub type_id: usize,
    pub document: usize,
    pub method: Option<usize>,
    pub locals: HashMap<String, String>,
    pub sites: Vec<CallSite>,
    /// Bound method per site, parallel to `sites`.
    pub targets: Vec<Option<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteRef {
    pub body: usize,
    pub site: usize,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    pub documents: Vec<DocumentInfo>,
    pub types: Vec<TypeInfo>,
    pub methods: Vec<MethodInfo>,
    pub bodies: Vec<BodyInfo>,
    types_by_name: HashMap<String, Vec<usize>>,
    references: HashMap<usize, Vec<SiteRef>>,
}

impl SymbolTable {
    /// `parsed[i]` holds the declarations of `documents[i]`.
    pub fn build(documents: Vec<DocumentInfo>, parsed: Vec<ParsedFile>) -> Self {
        let mut table = SymbolTable {
            documents,
            ..Default::default()
        };
        let mut by_key: HashMap<(String, String, usize), usize> = HashMap::new();

        for (document, file) in parsed.into_iter().enumerate() {
            let mut local_ids: Vec<usize> = Vec::with_capacity(file.types.len());
            for parsed_type in file.types {
                let outer = parsed_type.outer.and_then(|local| local_ids.get(local).copied());
                let container = match outer {
                    Some(outer) => table.types[outer].display_name(),
                    None => parsed_type.namespace.clone(),
                };
                let key = (
                    container.clone(),
                    parsed_type.name.clone(),
                    parsed_type.type_params.len(),
                );
                // Partial declarations share one type.
                let type_id = *by_key.entry(key).or_insert_with(|| {
                    table.types.push(TypeInfo {
                        name: parsed_type.name.clone(),
                        kind: parsed_type.kind,
                        namespace: parsed_type.namespace.clone(),
                        outer,
                        type_params: parsed_type.type_params.clone(),
                        container,
                        bases: Vec::new(),
                        base_class: None,
                        interfaces: Vec::new(),
                        members: HashMap::new(),
                        methods: Vec::new(),
                    });
                    table.types.len() - 1
                });
                local_ids.push(type_id);

                let info = &mut table.types[type_id];
                for base in parsed_type.bases {
                    if !info.bases.contains(&base) {
                        info.bases.push(base);
                    }
                }
                info.members.extend(parsed_type.members);

                for method in parsed_type.methods {
                    let method_id = table.methods.len();
                    let body = method.body.map(|body| {
                        table.bodies.push(BodyInfo {
                            type_id,
                            document,
                            method: Some(method_id),
                            locals: body.locals,
                            targets: Vec::new(),
                            sites: body.sites,
                        });
                        table.bodies.len() - 1
                    });
                    table.methods.push(MethodInfo {
                        name: method.name,
                        type_id,
                        document,
                        type_params: method.type_params,
                        params: method.params,
                        return_type: method.return_type,
                        modifiers: method.modifiers,
                        start_byte: method.start_byte,
                        end_byte: method.end_byte,
                        start_line: method.start_line,
                        body,
                        display_name: String::new(),
                        overridden: None,
                    });
                    table.types[type_id].methods.push(method_id);
                }
                for body in parsed_type.bodies {
                    table.bodies.push(BodyInfo {
                        type_id,
                        document,
                        method: None,
                        locals: body.locals,
                        targets: Vec::new(),
                        sites: body.sites,
                    });
                }
            }
        }

        for (id, info) in table.types.iter().enumerate() {
            table
                .types_by_name
                .entry(info.name.clone())
                .or_default()
                .push(id);
        }
        table.resolve_bases();
        for id in 0..table.methods.len() {
            table.methods[id].display_name = table.method_display_name(id);
        }
        for id in 0..table.methods.len() {
            table.methods[id].overridden = table.find_overridden(id);
        }
        table.bind_bodies();
        table
    }

    fn resolve_bases(&mut self) {
        for id in 0..self.types.len() {
            let mut base_class = None;
            let mut interfaces = Vec::new();
            for raw in &self.types[id].bases {
                let Some(base) = self.lookup_type(raw, id) else {
                    continue;
                };
                if base == id {
                    continue;
                }
                let is_class = matches!(self.types[base].kind, TypeKind::Class | TypeKind::Record);
                let self_is_class =
                    matches!(self.types[id].kind, TypeKind::Class | TypeKind::Record);
                if is_class && self_is_class && base_class.is_none() {
                    base_class = Some(base);
                } else if self.types[base].kind == TypeKind::Interface && !interfaces.contains(&base)
                {
                    interfaces.push(base);
                }
            }
            self.types[id].base_class = base_class;
            self.types[id].interfaces = interfaces;
        }
    }

    fn bind_bodies(&mut self) {
        let mut all_targets = Vec::with_capacity(self.bodies.len());
        for body in &self.bodies {
            let targets: Vec<Option<usize>> = body
                .sites
                .iter()
                .map(|site| self.bind_site(body, site))
                .collect();
            all_targets.push(targets);
        }
        for (body_id, targets) in all_targets.into_iter().enumerate() {
            for (site, target) in targets.iter().enumerate() {
                if let Some(method) = target {
                    self.references
                        .entry(*method)
                        .or_default()
                        .push(SiteRef { body: body_id, site });
                }
            }
            self.bodies[body_id].targets = targets;
        }
    }

    fn method_display_name(&self, id: usize) -> String {
        let method = &self.methods[id];
        let owner = self.types[method.type_id].display_name();
        let params: Vec<&str> = method.params.iter().map(|p| p.ty.as_str()).collect();
        format!(
            "{owner}.{}({})",
            with_type_params(&method.name, &method.type_params),
            params.join(", ")
        )
    }

    fn find_overridden(&self, id: usize) -> Option<usize> {
        let method = &self.methods[id];
        if !method.modifiers.is_override {
            return None;
        }
        self.class_chain(method.type_id)
            .into_iter()
            .skip(1)
            .flat_map(|ty| self.types[ty].methods.iter().copied())
            .find(|&candidate| {
                let base = &self.methods[candidate];
                base.name == method.name
                    && base.params.len() == method.params.len()
                    && (base.modifiers.is_virtual
                        || base.modifiers.is_abstract
                        || base.modifiers.is_override)
            })
    }

    /// Bound targets of a method body, unique and in call order.
    pub fn call_targets(&self, method: usize) -> Vec<usize> {
        let Some(body) = self.methods.get(method).and_then(|m| m.body) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.bodies[body]
            .targets
            .iter()
            .flatten()
            .copied()
            .filter(|target| seen.insert(*target))
            .collect()
    }

    /// Overrides of a virtual or abstract method, or implementations of an
    /// interface member.
    pub fn implementations(&self, method: usize) -> Vec<usize> {
        let info = &self.methods[method];
        let owner = info.type_id;
        let mut out = Vec::new();
        if self.types[owner].kind == TypeKind::Interface {
            for ty in 0..self.types.len() {
                if self.types[ty].kind == TypeKind::Interface
                    || !self.all_interfaces(ty).contains(&owner)
                {
                    continue;
                }
                if let Some(found) = self.find_declared(ty, &info.name, info.params.len()) {
                    if !out.contains(&found) {
                        out.push(found);
                    }
                }
            }
        } else if info.modifiers.is_abstract || info.modifiers.is_virtual || info.modifiers.is_override
        {
            for candidate in 0..self.methods.len() {
                if candidate != method && self.overrides_transitively(candidate, method) {
                    out.push(candidate);
                }
            }
        }
        out
    }

    /// Every method whose call sites count as references of `method`: the
    /// method itself, what it overrides or implements, and what overrides or
    /// implements it.
    pub fn reference_targets(&self, method: usize) -> Vec<usize> {
        let mut out = vec![method];
        let mut ancestor = self.methods[method].overridden;
        while let Some(id) = ancestor {
            if out.contains(&id) {
                break;
            }
            out.push(id);
            ancestor = self.methods[id].overridden;
        }
        let upward = out.clone();
        for id in upward {
            let info = &self.methods[id];
            for iface in self.all_interfaces(info.type_id) {
                for &member in &self.types[iface].methods {
                    let candidate = &self.methods[member];
                    if candidate.name == info.name
                        && candidate.params.len() == info.params.len()
                        && !out.contains(&member)
                    {
                        out.push(member);
                    }
                }
            }
        }
        for id in self.implementations(method) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    pub fn references_of(&self, method: usize) -> Vec<SiteRef> {
        let mut seen = HashSet::new();
        self.reference_targets(method)
            .into_iter()
            .filter_map(|target| self.references.get(&target))
            .flatten()
            .copied()
            .filter(|site| seen.insert(*site))
            .collect()
    }

    fn overrides_transitively(&self, candidate: usize, base: usize) -> bool {
        let mut current = self.methods[candidate].overridden;
        let mut hops = 0;
        while let Some(id) = current {
            if id == base {
                return true;
            }
            hops += 1;
            if hops > self.methods.len() {
                break;
            }
            current = self.methods[id].overridden;
        }
        false
    }

    fn bind_site(&self, body: &BodyInfo, site: &CallSite) -> Option<usize> {
        let name = site.name.as_str();
        match &site.receiver {
            Receiver::Implicit => {
                if site.arity.is_none() && body.locals.contains_key(name) {
                    return None;
                }
                self.enclosing_chain(body.type_id)
                    .into_iter()
                    .find_map(|ty| self.find_method(ty, name, site.arity))
            }
            Receiver::Unknown => None,
            receiver => {
                let ty = self.receiver_type(body, receiver)?;
                self.find_method(ty, name, site.arity)
            }
        }
    }

    fn receiver_type(&self, body: &BodyInfo, receiver: &Receiver) -> Option<usize> {
        match receiver {
            Receiver::This => Some(body.type_id),
            Receiver::Base => self.types[body.type_id].base_class,
            Receiver::Typed(raw) => self.lookup_type(raw, body.type_id),
            Receiver::Named(text) => self.resolve_named(body, text),
            Receiver::Invocation(inner) => {
                let method = self.bind_site(body, inner)?;
                let info = &self.methods[method];
                self.lookup_type(&info.return_type, info.type_id)
            }
            Receiver::Implicit | Receiver::Unknown => None,
        }
    }

    fn resolve_named(&self, body: &BodyInfo, text: &str) -> Option<usize> {
        let (chain, this_prefixed) = match text.strip_prefix("this.") {
            Some(rest) => (rest, true),
            None => (text, false),
        };
        let segments: Vec<&str> = chain.split('.').map(|s| strip_generics(s).trim()).collect();
        let (first, rest) = segments.split_first()?;
        let mut ty = if this_prefixed {
            self.member_type(body.type_id, first)
        } else if let Some(raw) = body.locals.get(*first) {
            self.lookup_type(raw, body.type_id)
        } else {
            self.member_type(body.type_id, first)
                .or_else(|| self.lookup_type(first, body.type_id))
        };
        for segment in rest {
            ty = ty.and_then(|current| self.member_type(current, segment));
        }
        if ty.is_none() && !rest.is_empty() && !this_prefixed {
            return self.lookup_type(chain, body.type_id);
        }
        ty
    }

    fn member_type(&self, ty: usize, name: &str) -> Option<usize> {
        self.class_chain(ty)
            .into_iter()
            .chain(self.all_interfaces(ty))
            .find_map(|owner| {
                let raw = self.types[owner].members.get(name)?;
                self.lookup_type(raw, owner)
            })
    }

    /// Most-derived method named `name` visible on `ty`. An exact arity
    /// match wins over the first method with that name.
    fn find_method(&self, ty: usize, name: &str, arity: Option<usize>) -> Option<usize> {
        let mut fallback = None;
        let search = self.class_chain(ty).into_iter().chain(self.all_interfaces(ty));
        for owner in search {
            for &method in &self.types[owner].methods {
                let info = &self.methods[method];
                if info.name != name {
                    continue;
                }
                match arity {
                    Some(count) if count != info.params.len() => {
                        fallback.get_or_insert(method);
                    }
                    _ => return Some(method),
                }
            }
        }
        fallback
    }

    /// Method with an exact name and arity declared on `ty` or its base classes.
    fn find_declared(&self, ty: usize, name: &str, arity: usize) -> Option<usize> {
        self.class_chain(ty).into_iter().find_map(|owner| {
            self.types[owner].methods.iter().copied().find(|&method| {
                let info = &self.methods[method];
                info.name == name && info.params.len() == arity
            })
        })
    }

    fn lookup_type(&self, raw: &str, context: usize) -> Option<usize> {
        let cleaned = clean_type_name(raw);
        let simple = cleaned.rsplit('.').next().filter(|s| !s.is_empty())?;
        let qualifier = cleaned
            .strip_suffix(simple)
            .map(|q| q.trim_end_matches('.'))
            .filter(|q| !q.is_empty());
        let candidates: Vec<usize> = self
            .types_by_name
            .get(simple)?
            .iter()
            .copied()
            .filter(|&id| match qualifier {
                Some(q) => {
                    let container = strip_generics_all(&self.types[id].container);
                    container == q || container.ends_with(&format!(".{q}"))
                }
                None => true,
            })
            .collect();
        let enclosing = self.enclosing_chain(context);
        let namespace = &self.types[context].namespace;
        candidates
            .iter()
            .find(|&&id| self.types[id].outer.is_some_and(|o| enclosing.contains(&o)))
            .or_else(|| candidates.iter().find(|&&id| enclosing.contains(&id)))
            .or_else(|| candidates.iter().find(|&&id| &self.types[id].namespace == namespace))
            .or_else(|| candidates.first())
            .copied()
    }

    /// `ty` followed by its base classes.
    fn class_chain(&self, ty: usize) -> Vec<usize> {
        let mut out = vec![ty];
        let mut current = ty;
        while let Some(base) = self.types[current].base_class {
            if out.contains(&base) {
                break;
            }
            out.push(base);
            current = base;
        }
        out
    }

    /// `ty` followed by the types it is nested in.
    fn enclosing_chain(&self, ty: usize) -> Vec<usize> {
        let mut out = vec![ty];
        let mut current = ty;
        while let Some(outer) = self.types[current].outer {
            if out.contains(&outer) {
                break;
            }
            out.push(outer);
            current = outer;
        }
        out
    }

    /// Interfaces implemented by `ty` or its base classes, including the
    /// interfaces those extend.
    fn all_interfaces(&self, ty: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut queue: VecDeque<usize> = self
            .class_chain(ty)
            .into_iter()
            .flat_map(|owner| self.types[owner].interfaces.iter().copied())
            .collect();
        while let Some(iface) = queue.pop_front() {
            if iface == ty || out.contains(&iface) {
                continue;
            }
            out.push(iface);
            queue.extend(self.types[iface].interfaces.iter().copied());
        }
        out
    }
}

fn with_type_params(name: &str, params: &[String]) -> String {
    if params.is_empty() {
        name.to_string()
    } else {
        format!("{name}<{}>", params.join(", "))
    }
}

fn strip_generics(segment: &str) -> &str {
    match segment.find('<') {
        Some(idx) => &segment[..idx],
        None => segment,
    }
}

fn strip_generics_all(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Reduces a written type to the name used for lookup, e.g.
/// `ref global::Acme.List<int>[]?` becomes `Acme.List`.
fn clean_type_name(raw: &str) -> String {
    let mut value = raw.trim();
    for prefix in ["ref ", "out ", "in ", "params ", "this "] {
        if let Some(rest) = value.strip_prefix(prefix) {
            value = rest.trim_start();
        }
    }
    let value = value.strip_prefix("global::").unwrap_or(value);
    let stripped = strip_generics_all(value);
    stripped
        .trim_end_matches(['?', '[', ']', ',', ' ', '*'])
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::csharp::CSharpParser;

    fn table(files: &[&str]) -> SymbolTable {
        let mut parser = CSharpParser::new().unwrap();
        let parsed = files.iter().map(|src| parser.parse(src).unwrap()).collect();
        let documents = (0..files.len())
            .map(|i| DocumentInfo {
                path: PathBuf::from(format!("/ws/File{i}.cs")),
                rel_path: format!("File{i}.cs"),
                project: 0,
            })
            .collect();
        SymbolTable::build(documents, parsed)
    }

    fn method(table: &SymbolTable, display: &str) -> usize {
        table
            .methods
            .iter()
            .position(|m| m.display_name == display)
            .unwrap_or_else(|| panic!("no method {display}"))
    }

    fn names(table: &SymbolTable, ids: &[usize]) -> Vec<String> {
        let mut out: Vec<String> = ids.iter().map(|&id| table.methods[id].display_name.clone()).collect();
        out.sort();
        out
    }

    #[test]
    fn display_names_follow_namespace_and_generics() {
        let t = table(&[r#"
namespace Acme.Data
{
    public class Repo<T>
    {
        public T Get<TKey>(TKey key, int count) => default;
    }
}
"#]);
        assert_eq!(t.methods[0].display_name, "Acme.Data.Repo<T>.Get<TKey>(TKey, int)");
    }

    #[test]
    fn partial_types_merge() {
        let t = table(&[
            "public partial class Split { public void A() { B(); } }",
            "public partial class Split { public void B() {} }",
        ]);
        assert_eq!(t.types.len(), 1);
        let a = method(&t, "Split.A()");
        assert_eq!(names(&t, &t.call_targets(a)), ["Split.B()"]);
    }

    #[test]
    fn binds_through_fields_locals_and_statics() {
        let t = table(&[r#"
public interface IService { void Serve(); }
public class Worker { public void Work() {} }
public static class Tools { public static void Help() {} }
public class Caller
{
    private readonly IService _service;
    public void Run(Worker worker)
    {
        _service.Serve();
        worker.Work();
        var other = new Worker();
        other.Work();
        Tools.Help();
        Missing.Call();
    }
}
"#]);
        let run = method(&t, "Caller.Run(Worker)");
        assert_eq!(
            names(&t, &t.call_targets(run)),
            ["IService.Serve()", "Tools.Help()", "Worker.Work()"]
        );
    }

    #[test]
    fn overload_prefers_matching_arity() {
        let t = table(&[r#"
public class Calc
{
    public int Add(int a) => a;
    public int Add(int a, int b) => a + b;
    public int Run() => Add(1, 2);
}
"#]);
        let run = method(&t, "Calc.Run()");
        assert_eq!(names(&t, &t.call_targets(run)), ["Calc.Add(int, int)"]);
    }

    #[test]
    fn overrides_and_implementations() {
        let t = table(&[r#"
public interface IShape { double Area(); }
public abstract class Shape : IShape { public abstract double Area(); }
public class Square : Shape { public override double Area() => 1; }
public class Circle : IShape { public double Area() => 3; }
"#]);
        let square = method(&t, "Square.Area()");
        let shape = method(&t, "Shape.Area()");
        let iface = method(&t, "IShape.Area()");
        assert_eq!(t.methods[square].overridden, Some(shape));
        assert_eq!(names(&t, &t.implementations(shape)), ["Square.Area()"]);
        assert_eq!(
            names(&t, &t.implementations(iface)),
            ["Circle.Area()", "Shape.Area()", "Square.Area()"]
        );
        assert_eq!(
            names(&t, &t.reference_targets(square)),
            ["IShape.Area()", "Shape.Area()", "Square.Area()"]
        );
    }

    #[test]
    fn base_calls_bind_to_base_class() {
        let t = table(&[r#"
public class BaseClass { public virtual void VirtualMethod() {} }
public class DerivedClass : BaseClass
{
    public override void VirtualMethod() { base.VirtualMethod(); }
}
"#]);
        let derived = method(&t, "DerivedClass.VirtualMethod()");
        assert_eq!(
            names(&t, &t.call_targets(derived)),
            ["BaseClass.VirtualMethod()"]
        );
    }

    #[test]
    fn cleans_type_spellings() {
        assert_eq!(clean_type_name("ref global::Acme.List<int>[]?"), "Acme.List");
        assert_eq!(clean_type_name("Dictionary<string, List<int>>"), "Dictionary");
    }
}
