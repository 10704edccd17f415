//! gg DOM - XML Document Object Model
//!
//! Mutable in-memory XML node tree with DOM Level 2 Core style mutation
//! (insert/replace/remove/clone/normalize) and accumulated reference
//! counting.
//!
//! Two layers:
//! - [`DomTree`]: the arena engine. Nodes are addressed by [`NodeId`] and
//!   external references are explicit ([`DomTree::acquire`] /
//!   [`DomTree::release`]).
//! - [`Document`] / [`Node`]: counted handles. Holding a [`Node`] keeps the
//!   node and every ancestor alive; dropping the last handle to an orphan
//!   subtree destroys it on the spot.
//!
//! # Example
//! ```
//! use gg_dom::Document;
//!
//! # fn main() -> Result<(), gg_dom::DomError> {
//! let doc = Document::new();
//! let root = doc.create_element("root")?;
//! doc.as_node().append_child(&root)?;
//! root.set_attribute("id", "main")?;
//! assert_eq!(doc.get_xml(), "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root id=\"main\"/>\n");
//! # Ok(())
//! # }
//! ```

mod character_data;
mod collections;
mod document;
mod element;
mod generation;
mod handle;
mod names;
mod node;
mod operations;
mod serialize;
mod tree;

pub use collections::{Descendants, ElementsByTagName, NamedNodeMap, NodeList};
pub use document::XmlLoader;
pub use generation::Generation;
pub use handle::{Document, Node};
pub use names::{escape_xml, is_xml_name};
pub use node::{NodeData, NodeEntry, NodeType};
pub use operations::{DomError, DomResult, NodeOperations};
pub use serialize::SerializeOptions;
pub use tree::{Ancestors, ConsistencyError, DomTree, TreeStats};

/// Identity of the [`DomTree`] a node was created by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub(crate) u32);

/// Node identifier (slot in a document's arena)
///
/// Stable for the node's lifetime. Once the node is destroyed its slot
/// generation moves on and the id resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) document: DocumentId,
    pub(crate) index: u32,
    pub(crate) generation: Generation,
}

impl NodeId {
    /// Slot of the document node in every tree
    pub(crate) const DOCUMENT_INDEX: u32 = 0;

    /// The document this id belongs to
    #[inline]
    pub fn document(self) -> DocumentId {
        self.document
    }

    /// Arena slot index
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation captured when the node was created
    #[inline]
    pub fn generation(self) -> Generation {
        self.generation
    }

    #[inline]
    pub(crate) fn is_document_node(self) -> bool {
        self.index == Self::DOCUMENT_INDEX
    }
}
