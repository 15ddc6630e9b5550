//! Syntactic extraction of C# declarations and call sites.

use anyhow::Result;
use std::collections::HashMap;
use tree_sitter::{Node, Parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Record,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub is_abstract: bool,
    pub is_virtual: bool,
    pub is_override: bool,
    pub is_static: bool,
}

/// What a member access or invocation is called on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    Implicit,
    This,
    Base,
    /// An identifier or dotted chain, e.g. `_service` or `Acme.Util`.
    Named(String),
    /// An expression whose type is spelled out, e.g. `new Foo()`.
    Typed(String),
    /// The result of another call.
    Invocation(Box<CallSite>),
    Unknown,
}

/// A method invocation, or a method group when `arity` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub receiver: Receiver,
    pub name: String,
    pub arity: Option<usize>,
    pub start_byte: usize,
    pub line: usize,
}

/// Call sites of one executable body plus the declared types of its locals.
#[derive(Debug, Clone, Default)]
pub struct ParsedBody {
    pub locals: HashMap<String, String>,
    pub sites: Vec<CallSite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone)]
pub struct ParsedMethod {
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<Parameter>,
    pub return_type: String,
    pub modifiers: Modifiers,
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub body: Option<ParsedBody>,
}

#[derive(Debug, Clone)]
pub struct ParsedType {
    pub name: String,
    pub kind: TypeKind,
    pub namespace: String,
    /// Index of the enclosing type in the same file.
    pub outer: Option<usize>,
    pub type_params: Vec<String>,
    pub bases: Vec<String>,
    /// Field and property names mapped to their declared types.
    pub members: HashMap<String, String>,
    pub methods: Vec<ParsedMethod>,
    /// Constructors, accessors and initializers. Their calls count as
    /// references but belong to no method.
    pub bodies: Vec<ParsedBody>,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub types: Vec<ParsedType>,
}

#[derive(Clone, Default)]
struct Context {
    namespace_stack: Vec<String>,
    outer: Option<usize>,
}

pub struct CSharpParser {
    parser: Parser,
}

impl CSharpParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_c_sharp::LANGUAGE;
        parser.set_language(&language.into())?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Option<ParsedFile> {
        let tree = self.parser.parse(source, None)?;
        let root = tree.root_node();
        let mut output = ParsedFile::default();
        let ctx = Context::default();
        if root.kind() == "compilation_unit" {
            walk_compilation_unit(root, &ctx, source, &mut output);
        } else {
            walk_declaration(root, &ctx, source, &mut output);
        }
        Some(output)
    }
}

fn walk_compilation_unit(node: Node<'_>, ctx: &Context, source: &str, output: &mut ParsedFile) {
    let mut next_ctx = ctx.clone();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "file_scoped_namespace_declaration" {
            continue;
        }
        if let Some(name) = namespace_name(child, source) {
            next_ctx.namespace_stack = namespace_parts(&name);
        }
        // Some grammar versions nest the following declarations inside the
        // file-scoped namespace node, others keep them as siblings.
        let mut inner = child.walk();
        for decl in child.named_children(&mut inner) {
            walk_declaration(decl, &next_ctx, source, output);
        }
        break;
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "file_scoped_namespace_declaration" {
            continue;
        }
        walk_declaration(child, &next_ctx, source, output);
    }
}

fn walk_declaration(node: Node<'_>, ctx: &Context, source: &str, output: &mut ParsedFile) {
    match node.kind() {
        "namespace_declaration" => handle_namespace(node, ctx, source, output),
        "class_declaration" => handle_type(node, ctx, source, output, TypeKind::Class),
        "struct_declaration" => handle_type(node, ctx, source, output, TypeKind::Struct),
        "interface_declaration" => handle_type(node, ctx, source, output, TypeKind::Interface),
        "record_declaration" | "record_struct_declaration" => {
            handle_type(node, ctx, source, output, TypeKind::Record)
        }
        "declaration_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                walk_declaration(child, ctx, source, output);
            }
        }
        _ => {}
    }
}

fn handle_namespace(node: Node<'_>, ctx: &Context, source: &str, output: &mut ParsedFile) {
    let Some(name) = namespace_name(node, source) else {
        return;
    };
    let parts = namespace_parts(&name);
    if parts.is_empty() {
        return;
    }
    let mut next_ctx = ctx.clone();
    next_ctx.namespace_stack.extend(parts);
    if let Some(body) = node.child_by_field_name("body") {
        walk_declaration(body, &next_ctx, source, output);
    }
}

fn handle_type(
    node: Node<'_>,
    ctx: &Context,
    source: &str,
    output: &mut ParsedFile,
    kind: TypeKind,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source);
    if name.is_empty() {
        return;
    }

    let mut bases = Vec::new();
    let mut members = HashMap::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "base_list" => bases.extend(base_list_types(child, source)),
            // Positional record parameters become properties.
            "parameter_list" => {
                for param in parameters(child, source) {
                    members.insert(param.name, param.ty);
                }
            }
            _ => {}
        }
    }

    let index = output.types.len();
    output.types.push(ParsedType {
        name,
        kind,
        namespace: ctx.namespace_stack.join("."),
        outer: ctx.outer,
        type_params: type_parameters(node, source),
        bases,
        members,
        methods: Vec::new(),
        bodies: Vec::new(),
    });

    let mut next_ctx = ctx.clone();
    next_ctx.outer = Some(index);
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            handle_member(member, index, &next_ctx, source, output);
        }
    }
}

fn handle_member(
    node: Node<'_>,
    type_index: usize,
    ctx: &Context,
    source: &str,
    output: &mut ParsedFile,
) {
    match node.kind() {
        "method_declaration" => handle_method(node, type_index, source, output),
        "constructor_declaration"
        | "destructor_declaration"
        | "operator_declaration"
        | "conversion_operator_declaration" => {
            let mut body = ParsedBody::default();
            if let Some(params) = node.child_by_field_name("parameters") {
                for param in parameters(params, source) {
                    body.locals.insert(param.name, param.ty);
                }
            }
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if matches!(
                    child.kind(),
                    "block" | "arrow_expression_clause" | "constructor_initializer"
                ) {
                    walk_body(child, source, &mut body);
                }
            }
            push_body(output, type_index, body);
        }
        "property_declaration" | "indexer_declaration" => {
            let ty = node
                .child_by_field_name("type")
                .map(|n| normalize_type(&node_text(n, source)));
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(n, source));
            if let (Some(ty), Some(name)) = (ty, name) {
                output.types[type_index].members.insert(name, ty);
            }
            let mut body = ParsedBody::default();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if matches!(child.kind(), "accessor_list" | "arrow_expression_clause") {
                    walk_body(child, source, &mut body);
                }
            }
            if let Some(value) = node.child_by_field_name("value") {
                walk_body(value, source, &mut body);
            }
            push_body(output, type_index, body);
        }
        "field_declaration" => {
            let mut body = ParsedBody::default();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() != "variable_declaration" {
                    continue;
                }
                let ty = child
                    .child_by_field_name("type")
                    .map(|n| normalize_type(&node_text(n, source)))
                    .unwrap_or_default();
                for (name, initializer) in declarators(child, source) {
                    output.types[type_index].members.insert(name, ty.clone());
                    if let Some(init) = initializer {
                        walk_body(init, source, &mut body);
                    }
                }
            }
            push_body(output, type_index, body);
        }
        "class_declaration" | "struct_declaration" | "interface_declaration"
        | "record_declaration" | "record_struct_declaration" => {
            walk_declaration(node, ctx, source, output);
        }
        _ => {}
    }
}

fn push_body(output: &mut ParsedFile, type_index: usize, body: ParsedBody) {
    if !body.sites.is_empty() {
        output.types[type_index].bodies.push(body);
    }
}

fn handle_method(node: Node<'_>, type_index: usize, source: &str, output: &mut ParsedFile) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source);
    if name.is_empty() {
        return;
    }
    let params = node
        .child_by_field_name("parameters")
        .map(|n| parameters(n, source))
        .unwrap_or_default();
    let return_type = node
        .child_by_field_name("returns")
        .or_else(|| node.child_by_field_name("type"))
        .map(|n| normalize_type(&node_text(n, source)))
        .unwrap_or_default();

    let body_node = node.child_by_field_name("body").or_else(|| {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|child| matches!(child.kind(), "block" | "arrow_expression_clause"));
        found
    });

    let mut modifiers = modifiers(node, source);
    if output.types[type_index].kind == TypeKind::Interface && !modifiers.is_static {
        if body_node.is_some() {
            modifiers.is_virtual = true;
        } else {
            modifiers.is_abstract = true;
        }
    }

    let body = body_node.map(|body_node| {
        let mut body = ParsedBody::default();
        for param in &params {
            body.locals.insert(param.name.clone(), param.ty.clone());
        }
        walk_body(body_node, source, &mut body);
        body
    });

    output.types[type_index].methods.push(ParsedMethod {
        name,
        type_params: type_parameters(node, source),
        params,
        return_type,
        modifiers,
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start_line: node.start_position().row + 1,
        body,
    });
}

fn modifiers(node: Node<'_>, source: &str) -> Modifiers {
    let mut out = Modifiers::default();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let word = if child.kind() == "modifier" {
            node_text(child, source)
        } else {
            child.kind().to_string()
        };
        match word.as_str() {
            "abstract" => out.is_abstract = true,
            "virtual" => out.is_virtual = true,
            "override" => out.is_override = true,
            "static" => out.is_static = true,
            _ => {}
        }
    }
    out
}

fn type_parameters(node: Node<'_>, source: &str) -> Vec<String> {
    let list = node.child_by_field_name("type_parameters").or_else(|| {
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "type_parameter_list");
        found
    });
    let Some(list) = list else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = list.walk();
    for param in list.named_children(&mut cursor) {
        if param.kind() != "type_parameter" {
            continue;
        }
        let name = param
            .child_by_field_name("name")
            .map(|n| node_text(n, source))
            .unwrap_or_else(|| node_text(param, source));
        if !name.is_empty() {
            out.push(name);
        }
    }
    out
}

fn parameters(list: Node<'_>, source: &str) -> Vec<Parameter> {
    let mut out = Vec::new();
    let mut cursor = list.walk();
    for param in list.named_children(&mut cursor) {
        if param.kind() != "parameter" {
            continue;
        }
        let name = param
            .child_by_field_name("name")
            .map(|n| node_text(n, source))
            .unwrap_or_default();
        let mut ty = param
            .child_by_field_name("type")
            .map(|n| normalize_type(&node_text(n, source)))
            .unwrap_or_default();
        if let Some(prefix) = parameter_prefix(param, source) {
            ty = format!("{prefix} {ty}");
        }
        out.push(Parameter { name, ty });
    }
    out
}

fn parameter_prefix(param: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = param.walk();
    for child in param.children(&mut cursor) {
        let word = match child.kind() {
            "parameter_modifier" | "modifier" => node_text(child, source),
            kind => kind.to_string(),
        };
        if matches!(word.as_str(), "ref" | "out" | "in" | "params") {
            return Some(word);
        }
    }
    None
}

/// Declarator names paired with their initializer expressions.
fn declarators<'a>(node: Node<'a>, source: &str) -> Vec<(String, Option<Node<'a>>)> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "variable_declarator" {
            continue;
        }
        let name_node = child.child_by_field_name("name");
        let Some(name) = name_node.map(|n| node_text(n, source)) else {
            continue;
        };
        let mut initializer = None;
        let mut inner = child.walk();
        for part in child.named_children(&mut inner) {
            if Some(part.id()) == name_node.map(|n| n.id()) {
                continue;
            }
            initializer = if part.kind() == "equals_value_clause" {
                part.named_child(0)
            } else {
                Some(part)
            };
        }
        out.push((name, initializer));
    }
    out
}

/// Collects call sites and local variable types below `node`.
fn walk_body(node: Node<'_>, source: &str, body: &mut ParsedBody) {
    match node.kind() {
        "invocation_expression" => {
            let target = node
                .child_by_field_name("function")
                .or_else(|| node.child_by_field_name("expression"));
            let arity = node.child_by_field_name("arguments").map(argument_count);
            if let Some(target) = target {
                if let Some(site) = call_site(target, arity, source) {
                    body.sites.push(site);
                }
                if target.kind() == "member_access_expression" {
                    if let Some(receiver) = target.child_by_field_name("expression") {
                        walk_receiver(receiver, source, body);
                    }
                }
            }
            if let Some(args) = node.child_by_field_name("arguments") {
                walk_body(args, source, body);
            }
        }
        "member_access_expression" => {
            if let Some(site) = call_site(node, None, source) {
                body.sites.push(site);
            }
            if let Some(receiver) = node.child_by_field_name("expression") {
                walk_receiver(receiver, source, body);
            }
        }
        "identifier" => {
            let name = node_text(node, source);
            if !name.is_empty() {
                body.sites.push(CallSite {
                    receiver: Receiver::Implicit,
                    name,
                    arity: None,
                    start_byte: node.start_byte(),
                    line: node.start_position().row + 1,
                });
            }
        }
        "variable_declaration" => {
            let declared = node
                .child_by_field_name("type")
                .map(|n| normalize_type(&node_text(n, source)))
                .unwrap_or_default();
            for (name, initializer) in declarators(node, source) {
                let ty = if declared == "var" {
                    initializer.and_then(|init| created_type(init, source))
                } else {
                    Some(declared.clone())
                };
                if let Some(ty) = ty {
                    body.locals.insert(name, ty);
                }
                if let Some(init) = initializer {
                    walk_body(init, source, body);
                }
            }
        }
        "for_each_statement" => {
            let ty = node
                .child_by_field_name("type")
                .map(|n| normalize_type(&node_text(n, source)));
            let left = node
                .child_by_field_name("left")
                .map(|n| node_text(n, source));
            if let (Some(ty), Some(left)) = (ty, left) {
                if ty != "var" {
                    body.locals.insert(left, ty);
                }
            }
            for field in ["right", "body"] {
                if let Some(child) = node.child_by_field_name(field) {
                    walk_body(child, source, body);
                }
            }
        }
        "object_creation_expression" | "implicit_object_creation_expression" => {
            for field in ["arguments", "initializer"] {
                if let Some(child) = node.child_by_field_name(field) {
                    walk_body(child, source, body);
                }
            }
        }
        "cast_expression" => {
            if let Some(value) = node.child_by_field_name("value") {
                walk_body(value, source, body);
            }
        }
        "local_function_statement" | "lambda_expression" | "anonymous_method_expression" => {
            if let Some(inner) = node.child_by_field_name("body") {
                walk_body(inner, source, body);
            }
        }
        "parameter_list" | "parameter" | "type_parameter_list" | "type_argument_list"
        | "generic_name" | "qualified_name" | "predefined_type" | "array_type"
        | "nullable_type" | "pointer_type" | "tuple_type" | "declaration_expression"
        | "this_expression" | "base_expression" | "typeof_expression" => {}
        _ => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                walk_body(child, source, body);
            }
        }
    }
}

/// Receivers that are plain names never contribute method groups.
fn walk_receiver(node: Node<'_>, source: &str, body: &mut ParsedBody) {
    match node.kind() {
        "identifier" | "generic_name" | "qualified_name" | "this_expression"
        | "base_expression" | "predefined_type" => {}
        "member_access_expression" => {
            if let Some(inner) = node.child_by_field_name("expression") {
                walk_receiver(inner, source, body);
            }
        }
        _ => walk_body(node, source, body),
    }
}

fn call_site(target: Node<'_>, arity: Option<usize>, source: &str) -> Option<CallSite> {
    let (receiver, name_node) = match target.kind() {
        "identifier" | "generic_name" => (Receiver::Implicit, target),
        "member_access_expression" => {
            let receiver = target
                .child_by_field_name("expression")
                .map(|expr| classify_receiver(expr, source))
                .unwrap_or(Receiver::Unknown);
            (receiver, target.child_by_field_name("name")?)
        }
        _ => return None,
    };
    let name = simple_name(name_node, source);
    if name.is_empty() {
        return None;
    }
    Some(CallSite {
        receiver,
        name,
        arity,
        start_byte: target.start_byte(),
        line: target.start_position().row + 1,
    })
}

fn classify_receiver(node: Node<'_>, source: &str) -> Receiver {
    let text = node_text(node, source);
    match node.kind() {
        _ if text == "this" => Receiver::This,
        _ if text == "base" => Receiver::Base,
        "identifier" | "generic_name" | "qualified_name" | "member_access_expression"
            if is_simple_chain(&text) =>
        {
            Receiver::Named(text)
        }
        "object_creation_expression" | "cast_expression" => node
            .child_by_field_name("type")
            .map(|ty| Receiver::Typed(normalize_type(&node_text(ty, source))))
            .unwrap_or(Receiver::Unknown),
        "parenthesized_expression" => node
            .named_child(0)
            .map(|inner| classify_receiver(inner, source))
            .unwrap_or(Receiver::Unknown),
        "invocation_expression" => {
            let target = node
                .child_by_field_name("function")
                .or_else(|| node.child_by_field_name("expression"));
            let arity = node.child_by_field_name("arguments").map(argument_count);
            target
                .and_then(|target| call_site(target, arity, source))
                .map(|site| Receiver::Invocation(Box::new(site)))
                .unwrap_or(Receiver::Unknown)
        }
        _ => Receiver::Unknown,
    }
}

fn is_simple_chain(raw: &str) -> bool {
    !raw.is_empty()
        && raw.chars().all(|ch| {
            ch.is_alphanumeric() || matches!(ch, '_' | '.' | '@' | '<' | '>' | ',' | ' ')
        })
}

fn created_type(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "object_creation_expression" => node
            .child_by_field_name("type")
            .map(|ty| normalize_type(&node_text(ty, source))),
        "equals_value_clause" => node.named_child(0).and_then(|n| created_type(n, source)),
        _ => None,
    }
}

fn argument_count(list: Node<'_>) -> usize {
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|child| child.kind() == "argument")
        .count()
}

/// Identifier text without type arguments, e.g. `Map` for `Map<int>`.
fn simple_name(node: Node<'_>, source: &str) -> String {
    let text = node_text(node, source);
    match text.find('<') {
        Some(idx) => text[..idx].trim().to_string(),
        None => text,
    }
}

fn base_list_types(node: Node<'_>, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let target = match child.kind() {
            "argument_list" => continue,
            "primary_constructor_base_type" => child.child_by_field_name("type").unwrap_or(child),
            _ => child,
        };
        let name = normalize_type(&node_text(target, source));
        if !name.is_empty() {
            out.push(name);
        }
    }
    out
}

fn namespace_name(node: Node<'_>, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .map(|n| node_text(n, source))
        .filter(|value| !value.is_empty())
}

fn namespace_parts(name: &str) -> Vec<String> {
    name.split('.')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collapses whitespace and renders type argument lists as `A<B, C>`.
pub fn normalize_type(raw: &str) -> String {
    let compact: String = raw.chars().filter(|ch| !ch.is_whitespace()).collect();
    compact.replace(',', ", ")
}

fn node_text(node: Node<'_>, source: &str) -> String {
    source
        .get(node.start_byte()..node.end_byte())
        .unwrap_or("")
        .trim()
        .to_string()
}
