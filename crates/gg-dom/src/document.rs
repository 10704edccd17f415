//! Document - factory methods and document-level API
//!
//! Every node starts life here as an orphan: parentless, unreferenced and
//! counted in the document's orphan ledger until it is inserted somewhere.

use crate::names::is_xml_name;
use crate::node::{
    NodeData, NodeType, CDATA_SECTION_NAME, COMMENT_NAME, DOCUMENT_FRAGMENT_NAME, TEXT_NAME,
};
use crate::operations::{DomError, DomResult};
use crate::tree::DomTree;
use crate::NodeId;

/// Fills a document from XML text through the mutation API.
///
/// Parsing is not part of this crate; a reader plugs in here and builds
/// the tree with the factory and insertion methods, optionally recording
/// source positions with [`DomTree::set_position`].
pub trait XmlLoader {
    type Error;

    /// Build the content of `tree` from `xml`. The document is empty when
    /// this is called.
    fn load(&mut self, tree: &mut DomTree, xml: &str) -> Result<(), Self::Error>;
}

fn check_name(name: &str) -> DomResult<()> {
    if is_xml_name(name) {
        Ok(())
    } else {
        tracing::debug!("invalid XML name {:?}", name);
        Err(DomError::InvalidCharacter)
    }
}

impl DomTree {
    /// Create an element node
    pub fn create_element(&mut self, tag_name: &str) -> DomResult<NodeId> {
        check_name(tag_name)?;
        Ok(self.alloc(NodeData::Element { attrs: Vec::new() }, tag_name))
    }

    pub fn create_document_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::DocumentFragment, DOCUMENT_FRAGMENT_NAME)
    }

    /// Create a text node
    pub fn create_text_node(&mut self, data: &str) -> NodeId {
        self.alloc(NodeData::Text(data.to_owned()), TEXT_NAME)
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.alloc(NodeData::Comment(data.to_owned()), COMMENT_NAME)
    }

    pub fn create_cdata_section(&mut self, data: &str) -> NodeId {
        self.alloc(NodeData::CData(data.to_owned()), CDATA_SECTION_NAME)
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> DomResult<NodeId> {
        check_name(target)?;
        Ok(self.alloc(
            NodeData::ProcessingInstruction {
                data: data.to_owned(),
            },
            target,
        ))
    }

    /// Create an unattached attribute with an empty value
    pub fn create_attribute(&mut self, name: &str) -> DomResult<NodeId> {
        check_name(name)?;
        Ok(self.alloc(NodeData::Attr, name))
    }

    /// Entity references need DTD support, which is not implemented
    pub fn create_entity_reference(&mut self, _name: &str) -> DomResult<NodeId> {
        Err(DomError::NotSupported)
    }

    /// The single element child of the document, if any
    pub fn document_element(&self) -> Option<NodeId> {
        self.child_nodes(self.root())
            .iter()
            .copied()
            .find(|&c| self.node_type(c) == Some(NodeType::Element))
    }

    /// Always `None`: document types are never created
    pub fn doctype(&self) -> Option<NodeId> {
        None
    }

    /// `DOMImplementation.hasFeature`: only XML 1.0 is supported
    pub fn has_feature(feature: &str, version: Option<&str>) -> bool {
        feature.eq_ignore_ascii_case("XML") && matches!(version, None | Some("" | "1.0"))
    }

    /// Replace the document content with what `loader` builds from `xml`
    pub fn load_xml<L: XmlLoader>(&mut self, loader: &mut L, xml: &str) -> Result<(), L::Error> {
        let root = self.root();
        let cleared = self.remove_all_children(root);
        debug_assert!(cleared.is_ok(), "document node is always alive");
        loader.load(self, xml)
    }
}
