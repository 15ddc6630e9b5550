use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::collections::HashSet;
use tracing::debug;

pub const DGML_NAMESPACE: &str = "http://schemas.microsoft.com/vs/2009/dgml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DgmlNode {
    pub id: String,
    /// Shown instead of the id when set.
    pub label: Option<String>,
    pub category: Option<String>,
    /// Source file opened when the node is activated.
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DgmlLink {
    pub source: String,
    pub target: String,
    pub label: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DgmlCategory {
    pub id: String,
    pub background: String,
    pub stroke: Option<String>,
    pub label: Option<String>,
}

/// Collects a directed graph and renders it as a DGML document.
#[derive(Debug, Clone, Default)]
pub struct DgmlBuilder {
    title: String,
    nodes: Vec<DgmlNode>,
    node_ids: HashSet<String>,
    links: Vec<DgmlLink>,
    categories: Vec<DgmlCategory>,
}

impl DgmlBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Adds a node unless one with the same id exists. Returns whether it was added.
    pub fn add_node(&mut self, node: DgmlNode) -> bool {
        if !self.node_ids.insert(node.id.clone()) {
            debug!(id = %node.id, "duplicate node id; keeping the first");
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn add_link(&mut self, link: DgmlLink) {
        self.links.push(link);
    }

    pub fn add_category(&mut self, category: DgmlCategory) {
        self.categories.push(category);
    }

    pub fn nodes(&self) -> &[DgmlNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[DgmlLink] {
        &self.links
    }

    pub fn categories(&self) -> &[DgmlCategory] {
        &self.categories
    }

    pub fn build(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("DirectedGraph").with_attributes([
            ("xmlns", DGML_NAMESPACE),
            ("Title", self.title.as_str()),
        ])))?;

        writer.write_event(Event::Start(BytesStart::new("Nodes")))?;
        for node in &self.nodes {
            let mut element = BytesStart::new("Node");
            element.push_attribute(("Id", node.id.as_str()));
            element.push_attribute(("Label", node.label.as_deref().unwrap_or(&node.id)));
            if let Some(category) = &node.category {
                element.push_attribute(("Category", category.as_str()));
            }
            if let Some(reference) = &node.reference {
                element.push_attribute(("Reference", reference.as_str()));
            }
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new("Nodes")))?;

        writer.write_event(Event::Start(BytesStart::new("Links")))?;
        for link in &self.links {
            let mut element = BytesStart::new("Link");
            element.push_attribute(("Source", link.source.as_str()));
            element.push_attribute(("Target", link.target.as_str()));
            if let Some(label) = &link.label {
                element.push_attribute(("Label", label.as_str()));
            }
            if let Some(category) = &link.category {
                element.push_attribute(("Category", category.as_str()));
            }
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new("Links")))?;

        writer.write_event(Event::Start(BytesStart::new("Categories")))?;
        for category in &self.categories {
            let mut element = BytesStart::new("Category");
            element.push_attribute(("Id", category.id.as_str()));
            element.push_attribute(("Background", category.background.as_str()));
            if let Some(stroke) = &category.stroke {
                element.push_attribute(("Stroke", stroke.as_str()));
            }
            if let Some(label) = &category.label {
                element.push_attribute(("Label", label.as_str()));
            }
            writer.write_event(Event::Empty(element))?;
        }
        writer.write_event(Event::End(BytesEnd::new("Categories")))?;

        writer.write_event(Event::End(BytesEnd::new("DirectedGraph")))?;
        String::from_utf8(writer.into_inner()).context("DGML output is not UTF-8")
    }
}
