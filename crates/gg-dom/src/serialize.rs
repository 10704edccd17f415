//! XML serialization
//!
//! Pretty-printer behind `GetXML`. Elements start on their own line,
//! indented by depth; childless elements self-close. Attributes are
//! written inline and wrap onto a continuation line, one level deeper,
//! once the current line passes the length threshold. Text is trimmed
//! and escaped, comments and CDATA sections are written verbatim.

use std::iter;

use crate::names::{escape_xml, trim_xml_whitespace};
use crate::node::{NodeData, NodeEntry, NodeType};
use crate::tree::DomTree;
use crate::NodeId;

/// Serializer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Line length after which attributes wrap
    pub line_length_threshold: usize,
    /// Spaces per nesting level
    pub indent: usize,
    /// Emitted before the children of a document node (empty to omit)
    pub xml_declaration: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            line_length_threshold: 70,
            indent: 1,
            xml_declaration: r#"<?xml version="1.0" encoding="utf-8"?>"#.to_string(),
        }
    }
}

struct XmlWriter<'a> {
    tree: &'a DomTree,
    options: &'a SerializeOptions,
    out: String,
}

impl<'a> XmlWriter<'a> {
    fn push_indent(&mut self, indent: usize) {
        self.out.extend(iter::repeat_n(' ', indent));
    }

    /// Start a new line unless already at one, then indent
    fn indent_new_line(&mut self, indent: usize) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.push_indent(indent);
    }

    fn indent_if_new_line(&mut self, indent: usize) {
        if self.out.is_empty() || self.out.ends_with('\n') {
            self.push_indent(indent);
        }
    }

    fn node(&mut self, id: NodeId, indent: usize) {
        let tree = self.tree;
        let Some(entry) = tree.get(id) else {
            return;
        };
        match &entry.data {
            NodeData::Document => {
                self.out.push_str(&self.options.xml_declaration);
                self.children(entry, 0);
            }
            // A fragment is never nested, its children start at the margin
            NodeData::DocumentFragment => self.children(entry, 0),
            NodeData::Element { .. } => self.element(entry, indent),
            NodeData::Attr => self.attribute(id, entry),
            NodeData::Text(text) => self.text(id, text),
            NodeData::CData(data) => {
                self.indent_new_line(indent);
                self.out.push_str("<![CDATA[");
                self.out.push_str(data);
                self.out.push_str("]]>\n");
            }
            NodeData::Comment(data) => {
                self.indent_new_line(indent);
                self.out.push_str("<!--");
                self.out.push_str(data);
                self.out.push_str("-->\n");
            }
            NodeData::ProcessingInstruction { data } => {
                self.indent_new_line(indent);
                self.out.push_str("<?");
                self.out.push_str(&entry.node_name());
                self.out.push(' ');
                self.out.push_str(data);
                self.out.push_str("?>\n");
            }
        }
    }

    fn children(&mut self, entry: &NodeEntry, indent: usize) {
        for &child in entry.children() {
            self.node(child, indent);
        }
    }

    fn element(&mut self, entry: &NodeEntry, indent: usize) {
        let name = entry.node_name();
        let mut line_begin = self.out.len();
        self.indent_new_line(indent);
        self.out.push('<');
        self.out.push_str(&name);

        let tree = self.tree;
        for &attr in entry.attrs() {
            let Some(attr_entry) = tree.get(attr) else {
                continue;
            };
            self.out.push(' ');
            self.attribute(attr, attr_entry);
            if self.out.len() - line_begin > self.options.line_length_threshold {
                line_begin = self.out.len();
                self.indent_new_line(indent + self.options.indent);
            }
        }

        if entry.children().is_empty() {
            self.out.push_str("/>\n");
        } else {
            self.out.push('>');
            self.children(entry, indent + self.options.indent);
            self.indent_if_new_line(indent);
            self.out.push_str("</");
            self.out.push_str(&name);
            self.out.push_str(">\n");
        }
    }

    fn attribute(&mut self, id: NodeId, entry: &NodeEntry) {
        self.out.push_str(&entry.node_name());
        self.out.push_str("=\"");
        let value = self.tree.node_value(id).unwrap_or_default();
        self.out.push_str(&escape_xml(&value));
        self.out.push('"');
    }

    fn text(&mut self, id: NodeId, text: &str) {
        let escaped = escape_xml(text);
        let trimmed = trim_xml_whitespace(&escaped);
        self.out.push_str(trimmed);

        // Keep one space between two runs of text whose gap was trimmed
        let is_space = |c: char| matches!(c, ' ' | '\t' | '\r' | '\n');
        let Some(next) = self
            .tree
            .next_sibling(id)
            .filter(|&next| self.tree.node_type(next) == Some(NodeType::Text))
        else {
            return;
        };
        let next_lead = self.tree.data(next).is_some_and(|d| d.starts_with(is_space));
        if text.ends_with(is_space) || (next_lead && !trimmed.is_empty()) {
            self.out.push(' ');
        }
    }
}

impl DomTree {
    /// Serialize a node and its subtree with default options
    pub fn get_xml(&self, id: NodeId) -> String {
        self.get_xml_with(id, &SerializeOptions::default())
    }

    pub fn get_xml_with(&self, id: NodeId, options: &SerializeOptions) -> String {
        let mut writer = XmlWriter {
            tree: self,
            options,
            out: String::new(),
        };
        writer.node(id, 0);
        writer.out
    }
}
