//! Live collections
//!
//! Nothing here caches tree state: every `length`/`item` call reads the
//! current child or attribute list, so mutations made while a collection
//! is held show through. Handle-level collections keep their owner node
//! alive for as long as they exist.

use crate::handle::Node;
use crate::operations::DomResult;
use crate::tree::DomTree;
use crate::NodeId;

/// Pre-order walk over the descendants of a node (the node itself excluded)
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.child_nodes(current).iter().rev().copied());
        Some(current)
    }
}

impl DomTree {
    /// Descendants of a node in document order
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: self.child_nodes(id).iter().rev().copied().collect(),
        }
    }

    /// Live list of descendant elements named `name` (`*` matches all)
    pub fn elements_by_tag_name(&self, root: NodeId, name: &str) -> ElementsByTagName {
        ElementsByTagName::new(root, name)
    }
}

/// `getElementsByTagName` result, re-walked on every access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementsByTagName {
    root: NodeId,
    name: String,
}

impl ElementsByTagName {
    pub fn new(root: NodeId, name: &str) -> Self {
        Self {
            root,
            name: name.to_owned(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Matching elements in document order, parents before children
    pub fn iter<'t>(&'t self, tree: &'t DomTree) -> impl Iterator<Item = NodeId> + 't {
        let wildcard = self.name == "*";
        tree.descendants(self.root).filter(move |&id| {
            tree.get(id)
                .is_some_and(|e| e.is_element() && (wildcard || e.name_is(&self.name)))
        })
    }

    pub fn length(&self, tree: &DomTree) -> usize {
        self.iter(tree).count()
    }

    pub fn item(&self, tree: &DomTree, index: usize) -> Option<NodeId> {
        self.iter(tree).nth(index)
    }
}

#[derive(Debug, Clone)]
enum ListSource {
    Children,
    ByTagName(ElementsByTagName),
}

/// Live node list handle (`childNodes` or `getElementsByTagName`)
#[derive(Debug, Clone)]
pub struct NodeList {
    owner: Node,
    source: ListSource,
}

impl NodeList {
    pub(crate) fn children(owner: Node) -> Self {
        Self {
            owner,
            source: ListSource::Children,
        }
    }

    pub(crate) fn by_tag_name(owner: Node, name: &str) -> Self {
        let source = ListSource::ByTagName(ElementsByTagName::new(owner.id(), name));
        Self { owner, source }
    }

    /// Node whose children or descendants this list reflects
    pub fn owner(&self) -> &Node {
        &self.owner
    }

    pub fn length(&self) -> usize {
        self.owner.read(|tree| match &self.source {
            ListSource::Children => tree.child_nodes(self.owner.id()).len(),
            ListSource::ByTagName(list) => list.length(tree),
        })
    }

    pub fn item(&self, index: usize) -> Option<Node> {
        let id = self.owner.read(|tree| match &self.source {
            ListSource::Children => tree.child_nodes(self.owner.id()).get(index).copied(),
            ListSource::ByTagName(list) => list.item(tree, index),
        })?;
        Some(self.owner.adopt(id))
    }

    /// Iterate by index; each step re-reads the tree
    pub fn iter(&self) -> impl Iterator<Item = Node> + '_ {
        (0..).map_while(move |index| self.item(index))
    }
}

/// Live attribute map of an element
#[derive(Debug, Clone)]
pub struct NamedNodeMap {
    element: Node,
}

impl NamedNodeMap {
    pub(crate) fn new(element: Node) -> Self {
        Self { element }
    }

    pub fn owner_element(&self) -> &Node {
        &self.element
    }

    pub fn length(&self) -> usize {
        self.element.read(|tree| tree.attributes(self.element.id()).len())
    }

    pub fn item(&self, index: usize) -> Option<Node> {
        let id = self
            .element
            .read(|tree| tree.attributes(self.element.id()).get(index).copied())?;
        Some(self.element.adopt(id))
    }

    pub fn get_named_item(&self, name: &str) -> Option<Node> {
        self.element.get_attribute_node(name)
    }

    /// Add an attribute node, returning the one it replaced
    pub fn set_named_item(&self, node: &Node) -> DomResult<Option<Node>> {
        let replaced = self
            .element
            .write(|tree| tree.set_named_item(self.element.id(), node.id()))?;
        Ok(replaced.map(|id| self.element.adopt(id)))
    }

    pub fn remove_named_item(&self, name: &str) -> DomResult<Node> {
        let removed = self
            .element
            .write(|tree| tree.remove_named_item(self.element.id(), name))?;
        Ok(self.element.adopt(removed))
    }

    pub fn iter(&self) -> impl Iterator<Item = Node> + '_ {
        (0..).map_while(move |index| self.item(index))
    }
}
