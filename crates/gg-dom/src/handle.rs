//! Counted node handles
//!
//! A [`Node`] is one external reference: creating or cloning it acquires
//! on the node, dropping it releases (non-transiently). Dropping the last
//! handle into an orphan subtree therefore destroys that subtree on the
//! spot, while nodes reachable from the document live as long as the
//! document does.
//!
//! Handles share the tree through `Rc`, borrowing it only for the duration
//! of each call. Handles created or dropped while the tree is borrowed (from
//! inside a [`Document::with_tree`] closure) queue their acquire or release,
//! which is applied as soon as the borrow ends.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::collections::{NamedNodeMap, NodeList};
use crate::document::XmlLoader;
use crate::node::NodeType;
use crate::operations::{DomResult, NodeOperations};
use crate::serialize::SerializeOptions;
use crate::tree::{ConsistencyError, DomTree, TreeStats};
use crate::NodeId;

/// Reference change made while the tree was borrowed
#[derive(Debug, Clone, Copy)]
enum Deferred {
    Acquire(NodeId),
    Release(NodeId),
}

#[derive(Debug)]
struct Shared {
    tree: RefCell<DomTree>,
    deferred: RefCell<Vec<Deferred>>,
}

type SharedTree = Rc<Shared>;

impl Shared {
    fn new(tree: DomTree) -> Self {
        Self {
            tree: RefCell::new(tree),
            deferred: RefCell::new(Vec::new()),
        }
    }

    /// Apply queued changes, acquires first so that no node is destroyed
    /// by a release whose matching acquire is still queued
    fn apply(&self, tree: &mut DomTree) {
        let pending = self.deferred.take();
        if pending.is_empty() {
            return;
        }
        tracing::trace!("Applying {} deferred reference changes", pending.len());
        for change in &pending {
            if let Deferred::Acquire(id) = *change {
                let _ = tree.acquire(id);
            }
        }
        for change in &pending {
            if let Deferred::Release(id) = *change {
                let _ = tree.release(id);
            }
        }
    }

    fn acquire(&self, id: NodeId) {
        match self.tree.try_borrow_mut() {
            Ok(mut tree) => {
                self.apply(&mut tree);
                let _ = tree.acquire(id);
            }
            Err(_) => self.deferred.borrow_mut().push(Deferred::Acquire(id)),
        }
    }

    fn release(&self, id: NodeId) {
        match self.tree.try_borrow_mut() {
            Ok(mut tree) => {
                self.apply(&mut tree);
                let _ = tree.release(id);
            }
            Err(_) => self.deferred.borrow_mut().push(Deferred::Release(id)),
        }
    }

    /// Apply queued changes if the tree is free
    fn settle(&self) {
        if self.deferred.borrow().is_empty() {
            return;
        }
        if let Ok(mut tree) = self.tree.try_borrow_mut() {
            self.apply(&mut tree);
        }
    }

    fn read<R>(&self, f: impl FnOnce(&DomTree) -> R) -> R {
        self.settle();
        let result = {
            let tree = self.tree.borrow();
            f(&tree)
        };
        self.settle();
        result
    }

    /// Mutable access; panics if the tree is already borrowed, which only
    /// happens when mutating from inside [`Document::with_tree`]
    fn write<R>(&self, f: impl FnOnce(&mut DomTree) -> R) -> R {
        let mut tree = self.tree.borrow_mut();
        self.apply(&mut tree);
        f(&mut tree)
    }
}

/// Handle to a document and its node factory
#[derive(Clone)]
pub struct Document {
    tree: SharedTree,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            tree: Rc::new(Shared::new(DomTree::new())),
        }
    }

    fn adopt(&self, id: NodeId) -> Node {
        Node::adopt_in(&self.tree, id)
    }

    /// The document node itself
    pub fn as_node(&self) -> Node {
        let root = self.tree.read(|tree| tree.root());
        self.adopt(root)
    }

    /// Run `f` against the underlying tree. Handles may be read, created
    /// and dropped inside `f`; mutating through them panics.
    pub fn with_tree<R>(&self, f: impl FnOnce(&DomTree) -> R) -> R {
        self.tree.read(f)
    }

    pub fn create_element(&self, tag_name: &str) -> DomResult<Node> {
        let id = self.tree.write(|tree| tree.create_element(tag_name))?;
        Ok(self.adopt(id))
    }

    pub fn create_document_fragment(&self) -> Node {
        let id = self.tree.write(|tree| tree.create_document_fragment());
        self.adopt(id)
    }

    pub fn create_text_node(&self, data: &str) -> Node {
        let id = self.tree.write(|tree| tree.create_text_node(data));
        self.adopt(id)
    }

    pub fn create_comment(&self, data: &str) -> Node {
        let id = self.tree.write(|tree| tree.create_comment(data));
        self.adopt(id)
    }

    pub fn create_cdata_section(&self, data: &str) -> Node {
        let id = self.tree.write(|tree| tree.create_cdata_section(data));
        self.adopt(id)
    }

    pub fn create_processing_instruction(&self, target: &str, data: &str) -> DomResult<Node> {
        let id = self
            .tree
            .write(|tree| tree.create_processing_instruction(target, data))?;
        Ok(self.adopt(id))
    }

    pub fn create_attribute(&self, name: &str) -> DomResult<Node> {
        let id = self.tree.write(|tree| tree.create_attribute(name))?;
        Ok(self.adopt(id))
    }

    pub fn create_entity_reference(&self, name: &str) -> DomResult<Node> {
        let id = self.tree.write(|tree| tree.create_entity_reference(name))?;
        Ok(self.adopt(id))
    }

    pub fn document_element(&self) -> Option<Node> {
        let id = self.tree.read(|tree| tree.document_element())?;
        Some(self.adopt(id))
    }

    pub fn doctype(&self) -> Option<Node> {
        None
    }

    pub fn has_feature(feature: &str, version: Option<&str>) -> bool {
        DomTree::has_feature(feature, version)
    }

    pub fn get_elements_by_tag_name(&self, name: &str) -> NodeList {
        self.as_node().get_elements_by_tag_name(name)
    }

    /// Replace the content with what `loader` builds from `xml`
    pub fn load_xml<L: XmlLoader>(&self, loader: &mut L, xml: &str) -> Result<(), L::Error> {
        self.tree.write(|tree| tree.load_xml(loader, xml))
    }

    pub fn get_xml(&self) -> String {
        self.with_tree(|tree| tree.get_xml(tree.root()))
    }

    pub fn get_xml_with(&self, options: &SerializeOptions) -> String {
        self.with_tree(|tree| tree.get_xml_with(tree.root(), options))
    }

    pub fn stats(&self) -> TreeStats {
        self.with_tree(|tree| tree.stats())
    }

    pub fn orphan_count(&self) -> usize {
        self.with_tree(|tree| tree.orphan_count())
    }

    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        self.with_tree(|tree| tree.check_consistency())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tree.tree.try_borrow() {
            Ok(tree) => f
                .debug_struct("Document")
                .field("id", &tree.id())
                .field("nodes", &tree.node_count())
                .finish(),
            Err(_) => f.debug_struct("Document").finish_non_exhaustive(),
        }
    }
}

/// Counted reference to one node
pub struct Node {
    tree: SharedTree,
    id: NodeId,
}

impl Node {
    fn adopt_in(tree: &SharedTree, id: NodeId) -> Node {
        tree.acquire(id);
        Node {
            tree: Rc::clone(tree),
            id,
        }
    }

    /// New handle to another node of the same document
    pub(crate) fn adopt(&self, id: NodeId) -> Node {
        Node::adopt_in(&self.tree, id)
    }

    fn adopt_opt(&self, id: Option<NodeId>) -> Option<Node> {
        id.map(|id| self.adopt(id))
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&DomTree) -> R) -> R {
        self.tree.read(f)
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut DomTree) -> R) -> R {
        self.tree.write(f)
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether the node is still alive (a held node always is)
    pub fn is_alive(&self) -> bool {
        self.read(|tree| tree.contains(self.id))
    }

    pub fn ref_count(&self) -> usize {
        self.read(|tree| tree.ref_count(self.id).unwrap_or(0))
    }

    pub fn document(&self) -> Document {
        Document {
            tree: Rc::clone(&self.tree),
        }
    }

    /// Creating document, `None` for the document node itself
    pub fn owner_document(&self) -> Option<Document> {
        (!self.id.is_document_node()).then(|| self.document())
    }

    // --- Node ---

    pub fn node_type(&self) -> NodeType {
        self.read(|tree| tree.node_type(self.id))
            .unwrap_or(NodeType::Document)
    }

    pub fn node_name(&self) -> String {
        self.read(|tree| tree.node_name(self.id).unwrap_or_default())
    }

    pub fn node_value(&self) -> Option<String> {
        self.read(|tree| tree.node_value(self.id))
    }

    pub fn set_node_value(&self, value: &str) -> DomResult<()> {
        self.write(|tree| tree.set_node_value(self.id, value))
    }

    pub fn text_content(&self) -> String {
        self.read(|tree| tree.text_content(self.id).unwrap_or_default())
    }

    pub fn set_text_content(&self, text: &str) -> DomResult<()> {
        self.write(|tree| tree.set_text_content(self.id, text))
    }

    pub fn prefix(&self) -> Option<String> {
        self.read(|tree| tree.prefix(self.id).map(str::to_owned))
    }

    pub fn local_name(&self) -> String {
        self.read(|tree| tree.local_name(self.id).unwrap_or_default().to_owned())
    }

    pub fn set_prefix(&self, prefix: &str) -> DomResult<()> {
        self.write(|tree| tree.set_prefix(self.id, prefix))
    }

    pub fn parent_node(&self) -> Option<Node> {
        let id = self.read(|tree| tree.parent_node(self.id));
        self.adopt_opt(id)
    }

    pub fn child_nodes(&self) -> NodeList {
        NodeList::children(self.clone())
    }

    pub fn first_child(&self) -> Option<Node> {
        let id = self.read(|tree| tree.first_child(self.id));
        self.adopt_opt(id)
    }

    pub fn last_child(&self) -> Option<Node> {
        let id = self.read(|tree| tree.last_child(self.id));
        self.adopt_opt(id)
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        let id = self.read(|tree| tree.previous_sibling(self.id));
        self.adopt_opt(id)
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let id = self.read(|tree| tree.next_sibling(self.id));
        self.adopt_opt(id)
    }

    pub fn has_child_nodes(&self) -> bool {
        self.read(|tree| tree.has_child_nodes(self.id))
    }

    /// Attribute map, elements only
    pub fn attributes(&self) -> Option<NamedNodeMap> {
        (self.node_type() == NodeType::Element).then(|| NamedNodeMap::new(self.clone()))
    }

    pub fn has_attributes(&self) -> bool {
        self.read(|tree| tree.has_attributes(self.id))
    }

    /// Insert `new_child` before `ref_child`, or append if `None`
    pub fn insert_before(&self, new_child: &Node, ref_child: Option<&Node>) -> DomResult<Node> {
        self.write(|tree| tree.insert_before(self.id, new_child.id, ref_child.map(|r| r.id)))?;
        Ok(new_child.clone())
    }

    pub fn append_child(&self, new_child: &Node) -> DomResult<Node> {
        self.insert_before(new_child, None)
    }

    /// Returns the replaced node
    pub fn replace_child(&self, new_child: &Node, old_child: &Node) -> DomResult<Node> {
        let old = self.write(|tree| tree.replace_child(self.id, new_child.id, old_child.id))?;
        Ok(self.adopt(old))
    }

    pub fn remove_child(&self, old_child: &Node) -> DomResult<Node> {
        let old = self.write(|tree| tree.remove_child(self.id, old_child.id))?;
        Ok(self.adopt(old))
    }

    pub fn clone_node(&self, deep: bool) -> DomResult<Node> {
        let copy = self.write(|tree| tree.clone_node(self.id, deep))?;
        Ok(self.adopt(copy))
    }

    pub fn normalize(&self) -> DomResult<()> {
        self.write(|tree| tree.normalize(self.id))
    }

    pub fn get_elements_by_tag_name(&self, name: &str) -> NodeList {
        NodeList::by_tag_name(self.clone(), name)
    }

    pub fn get_xml(&self) -> String {
        self.read(|tree| tree.get_xml(self.id))
    }

    pub fn get_xml_with(&self, options: &SerializeOptions) -> String {
        self.read(|tree| tree.get_xml_with(self.id, options))
    }

    /// Source position as (row, column)
    pub fn position(&self) -> (u32, u32) {
        self.read(|tree| tree.position(self.id).unwrap_or_default())
    }

    pub fn set_position(&self, row: u32, column: u32) -> DomResult<()> {
        self.write(|tree| tree.set_position(self.id, row, column))
    }

    // --- Element ---

    pub fn tag_name(&self) -> Option<String> {
        self.read(|tree| tree.tag_name(self.id))
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.read(|tree| tree.get_attribute(self.id, name))
    }

    pub fn set_attribute(&self, name: &str, value: &str) -> DomResult<()> {
        self.write(|tree| tree.set_attribute(self.id, name, value))
    }

    pub fn remove_attribute(&self, name: &str) -> DomResult<()> {
        self.write(|tree| tree.remove_attribute(self.id, name))
    }

    pub fn get_attribute_node(&self, name: &str) -> Option<Node> {
        let id = self.read(|tree| tree.get_attribute_node(self.id, name));
        self.adopt_opt(id)
    }

    /// Returns the attribute that was replaced, if any
    pub fn set_attribute_node(&self, attr: &Node) -> DomResult<Option<Node>> {
        let replaced = self.write(|tree| tree.set_attribute_node(self.id, attr.id))?;
        Ok(self.adopt_opt(replaced))
    }

    pub fn remove_attribute_node(&self, attr: &Node) -> DomResult<Node> {
        let removed = self.write(|tree| tree.remove_attribute_node(self.id, attr.id))?;
        Ok(self.adopt(removed))
    }

    // --- Attr ---

    pub fn name(&self) -> String {
        self.node_name()
    }

    pub fn value(&self) -> Option<String> {
        self.read(|tree| tree.attr_value(self.id))
    }

    pub fn set_value(&self, value: &str) -> DomResult<()> {
        self.write(|tree| tree.set_attr_value(self.id, value))
    }

    pub fn owner_element(&self) -> Option<Node> {
        let id = self.read(|tree| tree.owner_element(self.id));
        self.adopt_opt(id)
    }

    /// Always true: there is no DTD to supply defaults
    pub fn specified(&self) -> bool {
        true
    }

    // --- CharacterData / ProcessingInstruction ---

    pub fn data(&self) -> Option<String> {
        self.read(|tree| tree.data(self.id).map(str::to_owned))
    }

    pub fn set_data(&self, data: &str) -> DomResult<()> {
        self.write(|tree| tree.set_data(self.id, data))
    }

    pub fn length(&self) -> usize {
        self.read(|tree| tree.length(self.id).unwrap_or(0))
    }

    pub fn substring_data(&self, offset: usize, count: usize) -> DomResult<String> {
        self.read(|tree| tree.substring_data(self.id, offset, count))
    }

    pub fn append_data(&self, arg: &str) -> DomResult<()> {
        self.write(|tree| tree.append_data(self.id, arg))
    }

    pub fn insert_data(&self, offset: usize, arg: &str) -> DomResult<()> {
        self.write(|tree| tree.insert_data(self.id, offset, arg))
    }

    pub fn delete_data(&self, offset: usize, count: usize) -> DomResult<()> {
        self.write(|tree| tree.delete_data(self.id, offset, count))
    }

    pub fn replace_data(&self, offset: usize, count: usize, arg: &str) -> DomResult<()> {
        self.write(|tree| tree.replace_data(self.id, offset, count, arg))
    }

    pub fn split_text(&self, offset: usize) -> DomResult<Node> {
        let tail = self.write(|tree| tree.split_text(self.id, offset))?;
        Ok(self.adopt(tail))
    }

    pub fn target(&self) -> Option<String> {
        self.read(|tree| tree.target(self.id))
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Node::adopt_in(&self.tree, self.id)
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.tree.release(self.id);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Rc::ptr_eq(&self.tree, &other.tree)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node").field("id", &self.id).finish()
    }
}
