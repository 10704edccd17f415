//! DOM Node - arena entry and per-kind behavior
//!
//! Each slot of a [`DomTree`](crate::DomTree) holds one `NodeEntry`:
//! shared bookkeeping (name, parent/owner links, child list, accumulated
//! reference count) plus a `NodeData` payload tagged by node kind. The
//! per-kind contract (allowed children, clone-self) is matched here so the
//! child-type table stays exhaustive.

use crate::names::split_qualified_name;
use crate::NodeId;

pub(crate) const DOCUMENT_NAME: &str = "#document";
pub(crate) const DOCUMENT_FRAGMENT_NAME: &str = "#document-fragment";
pub(crate) const TEXT_NAME: &str = "#text";
pub(crate) const CDATA_SECTION_NAME: &str = "#cdata-section";
pub(crate) const COMMENT_NAME: &str = "#comment";

/// DOM node type (W3C DOM Level 2 Core numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CDataSection = 4,
    EntityReference = 5,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl NodeType {
    /// Numeric `nodeType` code
    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(value: u16) -> Option<Self> {
        match value {
            1 => Some(NodeType::Element),
            2 => Some(NodeType::Attribute),
            3 => Some(NodeType::Text),
            4 => Some(NodeType::CDataSection),
            5 => Some(NodeType::EntityReference),
            6 => Some(NodeType::Entity),
            7 => Some(NodeType::ProcessingInstruction),
            8 => Some(NodeType::Comment),
            9 => Some(NodeType::Document),
            10 => Some(NodeType::DocumentType),
            11 => Some(NodeType::DocumentFragment),
            12 => Some(NodeType::Notation),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Document root, always slot 0
    Document,
    /// Element with its attribute nodes in insertion order
    Element { attrs: Vec<NodeId> },
    /// Attribute; its value lives in Text children
    Attr,
    /// Text content
    Text(String),
    /// CDATA section
    CData(String),
    /// Comment
    Comment(String),
    /// Processing instruction; the target is the node name
    ProcessingInstruction { data: String },
    /// Document fragment
    DocumentFragment,
}

impl NodeData {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeData::Document => NodeType::Document,
            NodeData::Element { .. } => NodeType::Element,
            NodeData::Attr => NodeType::Attribute,
            NodeData::Text(_) => NodeType::Text,
            NodeData::CData(_) => NodeType::CDataSection,
            NodeData::Comment(_) => NodeType::Comment,
            NodeData::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            NodeData::DocumentFragment => NodeType::DocumentFragment,
        }
    }

    /// Whether a node of `child` type may be inserted under this kind
    pub fn allows_child(&self, child: NodeType) -> bool {
        match self {
            NodeData::Element { .. } | NodeData::DocumentFragment => matches!(
                child,
                NodeType::Element
                    | NodeType::Text
                    | NodeType::Comment
                    | NodeType::ProcessingInstruction
                    | NodeType::CDataSection
                    | NodeType::EntityReference
            ),
            NodeData::Attr => matches!(child, NodeType::Text | NodeType::EntityReference),
            NodeData::Document => matches!(
                child,
                NodeType::Element
                    | NodeType::Comment
                    | NodeType::ProcessingInstruction
                    | NodeType::DocumentType
            ),
            NodeData::Text(_)
            | NodeData::CData(_)
            | NodeData::Comment(_)
            | NodeData::ProcessingInstruction { .. } => false,
        }
    }

    /// Payload for a shallow copy of this node, `None` if the kind can't be
    /// cloned. Element attributes are cloned separately by the tree.
    pub(crate) fn clone_self(&self) -> Option<NodeData> {
        match self {
            NodeData::Document => None,
            NodeData::Element { .. } => Some(NodeData::Element { attrs: Vec::new() }),
            other => Some(other.clone()),
        }
    }

    /// Character data of Text, CDATA and Comment nodes
    #[inline]
    pub fn character_data(&self) -> Option<&str> {
        match self {
            NodeData::Text(s) | NodeData::CData(s) | NodeData::Comment(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn character_data_mut(&mut self) -> Option<&mut String> {
        match self {
            NodeData::Text(s) | NodeData::CData(s) | NodeData::Comment(s) => Some(s),
            _ => None,
        }
    }
}

/// One node in the arena
#[derive(Debug)]
pub struct NodeEntry {
    pub(crate) data: NodeData,
    pub(crate) prefix: Option<String>,
    pub(crate) local_name: String,
    /// Positional parent (always `None` for attributes)
    pub(crate) parent: Option<NodeId>,
    /// Node one level up for reference propagation: the parent, or the
    /// owner element of an attribute
    pub(crate) owner: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// External references on this node plus the accumulated counts of
    /// every child and attribute
    pub(crate) ref_count: usize,
    /// External references taken on this node itself
    pub(crate) direct_refs: usize,
    pub(crate) row: u32,
    pub(crate) column: u32,
}

impl NodeEntry {
    pub(crate) fn new(data: NodeData, name: &str) -> Self {
        let (prefix, local_name) = split_qualified_name(name);
        Self {
            data,
            prefix: prefix.map(str::to_owned),
            local_name: local_name.to_owned(),
            parent: None,
            owner: None,
            children: Vec::new(),
            ref_count: 0,
            direct_refs: 0,
            row: 0,
            column: 0,
        }
    }

    #[inline]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.data.node_type()
    }

    /// Qualified name (`prefix:local` or `local`)
    pub fn node_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Compare against a qualified name without allocating
    pub(crate) fn name_is(&self, name: &str) -> bool {
        match &self.prefix {
            Some(prefix) => name
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
                .is_some_and(|local| local == self.local_name),
            None => name == self.local_name,
        }
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    #[inline]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Attribute nodes (empty for non-elements)
    #[inline]
    pub fn attrs(&self) -> &[NodeId] {
        match &self.data {
            NodeData::Element { attrs } => attrs,
            _ => &[],
        }
    }

    #[inline]
    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    #[inline]
    pub fn direct_refs(&self) -> usize {
        self.direct_refs
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_codes() {
        assert_eq!(NodeType::Element.code(), 1);
        assert_eq!(NodeType::DocumentFragment.code(), 11);
        assert_eq!(NodeType::from_code(7), Some(NodeType::ProcessingInstruction));
        assert_eq!(NodeType::from_code(0), None);
    }

    #[test]
    fn test_allowed_children_table() {
        let element = NodeData::Element { attrs: Vec::new() };
        assert!(element.allows_child(NodeType::Text));
        assert!(element.allows_child(NodeType::CDataSection));
        assert!(!element.allows_child(NodeType::Attribute));
        assert!(!element.allows_child(NodeType::Document));

        assert!(NodeData::Attr.allows_child(NodeType::Text));
        assert!(!NodeData::Attr.allows_child(NodeType::Element));

        assert!(NodeData::Document.allows_child(NodeType::Comment));
        assert!(!NodeData::Document.allows_child(NodeType::Text));

        assert!(!NodeData::Text("x".into()).allows_child(NodeType::Text));
        assert!(!NodeData::ProcessingInstruction { data: String::new() }
            .allows_child(NodeType::Text));
    }

    #[test]
    fn test_clone_self() {
        assert_eq!(NodeData::Document.clone_self(), None);
        let element = NodeData::Element { attrs: Vec::new() };
        assert_eq!(element.clone_self(), Some(NodeData::Element { attrs: Vec::new() }));
        let pi = NodeData::ProcessingInstruction { data: "d".into() };
        assert_eq!(pi.clone_self(), Some(pi));
    }

    #[test]
    fn test_qualified_names() {
        let entry = NodeEntry::new(NodeData::Attr, "xlink:href");
        assert_eq!(entry.prefix(), Some("xlink"));
        assert_eq!(entry.local_name(), "href");
        assert_eq!(entry.node_name(), "xlink:href");
        assert!(entry.name_is("xlink:href"));
        assert!(!entry.name_is("href"));
        assert!(!entry.name_is("xlinkhref"));

        let plain = NodeEntry::new(NodeData::Attr, "href");
        assert!(plain.name_is("href"));
        assert_eq!(plain.prefix(), None);
    }
}
