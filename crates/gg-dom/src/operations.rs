//! DOM Node Operations
//!
//! Core node manipulation: appendChild, removeChild, insertBefore,
//! replaceChild, cloneNode, normalize. Every check runs before the first
//! structural change, so a failed call leaves the tree untouched.

use crate::names::is_xml_name;
use crate::node::{NodeData, NodeType};
use crate::tree::{DomTree, TransientHold};
use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM exceptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum DomError {
    /// Offset or count out of range in character data
    #[error("Index or size is out of range")]
    IndexSize,
    /// Child type not allowed, cycle, or document cardinality violated
    #[error("Hierarchy request error")]
    HierarchyRequest,
    /// Node was created by a different document
    #[error("Wrong document")]
    WrongDocument,
    /// Illegal XML name
    #[error("Invalid character")]
    InvalidCharacter,
    /// Node is not a child or attribute of the addressed node
    #[error("Node not found")]
    NotFound,
    /// Optional DOM feature that is not implemented
    #[error("Not supported")]
    NotSupported,
    /// Attribute node is owned by another element
    #[error("Attribute is in use by another element")]
    InUseAttribute,
}

impl DomError {
    /// DOM Level 2 `DOMException.code`
    pub fn code(self) -> u16 {
        match self {
            Self::IndexSize => 1,
            Self::HierarchyRequest => 3,
            Self::WrongDocument => 4,
            Self::InvalidCharacter => 5,
            Self::NotFound => 8,
            Self::NotSupported => 9,
            Self::InUseAttribute => 10,
        }
    }

    /// DOM Level 2 constant name
    pub fn name(self) -> &'static str {
        match self {
            Self::IndexSize => "INDEX_SIZE_ERR",
            Self::HierarchyRequest => "HIERARCHY_REQUEST_ERR",
            Self::WrongDocument => "WRONG_DOCUMENT_ERR",
            Self::InvalidCharacter => "INVALID_CHARACTER_ERR",
            Self::NotFound => "NOT_FOUND_ERR",
            Self::NotSupported => "NOT_SUPPORTED_ERR",
            Self::InUseAttribute => "INUSE_ATTRIBUTE_ERR",
        }
    }
}

/// Node operations trait
pub trait NodeOperations {
    /// Append a child node
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId>;

    /// Remove a child node; the removed node is returned alive
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId>;

    /// Insert before a reference node (append if `None`)
    fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<NodeId>;

    /// Replace a child with another node; the replaced node is returned alive
    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<NodeId>;

    /// Clone a node into a new orphan
    fn clone_node(&mut self, node: NodeId, deep: bool) -> DomResult<NodeId>;

    /// Normalize text nodes (merge adjacent, drop empty)
    fn normalize(&mut self, node: NodeId) -> DomResult<()>;
}

impl NodeOperations for DomTree {
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_child(parent, child, None, None)
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.check_is_child(parent, child)?;
        let mut hold = TransientHold::new(self, child);
        hold.detach_child(parent, child);
        Ok(child)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.insert_child(parent, new_child, ref_child, None)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> DomResult<NodeId> {
        self.check_is_child(parent, old_child)?;
        if new_child == old_child {
            return Ok(old_child);
        }
        let mut hold = TransientHold::new(self, old_child);
        hold.insert_child(parent, new_child, Some(old_child), Some(old_child))?;
        hold.detach_child(parent, old_child);
        Ok(old_child)
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> DomResult<NodeId> {
        let entry = self.entry(node)?;
        // Attribute content is always cloned
        let deep = deep || entry.node_type() == NodeType::Attribute;
        let children = entry.children.clone();

        let copy = self.clone_self(node)?;
        if deep {
            for child in children {
                let child_copy = self.clone_node(child, true)?;
                self.append_child(copy, child_copy)?;
            }
        }
        Ok(copy)
    }

    fn normalize(&mut self, node: NodeId) -> DomResult<()> {
        self.entry(node)?;
        let mut hold = TransientHold::new(self, node);
        hold.normalize_subtree(node)
    }
}

impl DomTree {
    /// Merge adjacent text children, drop empty ones, recurse into element
    /// children and attributes
    fn normalize_subtree(&mut self, node: NodeId) -> DomResult<()> {
        let attrs = self.entry(node)?.attrs().to_vec();

        let mut i = 0;
        while let Some(child) = self.child_nodes(node).get(i).copied() {
            let text = match &self.entry(child)?.data {
                NodeData::Text(text) => Some(text.clone()),
                _ => None,
            };
            let Some(text) = text else {
                self.normalize_subtree(child)?;
                i += 1;
                continue;
            };
            if text.is_empty() {
                self.detach_child(node, child);
                continue;
            }

            let previous = i.checked_sub(1).map(|p| self.child_nodes(node)[p]);
            match previous.and_then(|p| self.get_mut(p)).map(|e| &mut e.data) {
                Some(NodeData::Text(head)) => {
                    head.push_str(&text);
                    self.detach_child(node, child);
                }
                _ => i += 1,
            }
        }

        for attr in attrs {
            self.normalize_subtree(attr)?;
        }
        Ok(())
    }

    /// Validate a prospective child: owner document, cycle, allowed type,
    /// document cardinality, in that order. `replacing` is a child that is
    /// about to leave and does not count toward cardinality.
    pub(crate) fn check_new_child(
        &self,
        parent: NodeId,
        new_child: NodeId,
        replacing: Option<NodeId>,
    ) -> DomResult<()> {
        let parent_entry = self.entry(parent)?;

        if new_child.document != self.id() {
            tracing::debug!("check_new_child: wrong document for {:?}", new_child);
            return Err(DomError::WrongDocument);
        }
        let child_type = self.entry(new_child)?.node_type();

        if self.is_inclusive_ancestor(new_child, parent) {
            tracing::debug!("check_new_child: new child {:?} is self or ancestor", new_child);
            return Err(DomError::HierarchyRequest);
        }

        if !parent_entry.data.allows_child(child_type) {
            tracing::debug!(
                "check_new_child: {:?} not allowed under {:?}",
                child_type,
                parent_entry.node_type()
            );
            return Err(DomError::HierarchyRequest);
        }

        if matches!(parent_entry.data, NodeData::Document)
            && matches!(child_type, NodeType::Element | NodeType::DocumentType)
        {
            let duplicate = parent_entry.children.iter().any(|&c| {
                Some(c) != replacing && c != new_child && self.node_type(c) == Some(child_type)
            });
            if duplicate {
                tracing::debug!("check_new_child: duplicated document {:?}", child_type);
                return Err(DomError::HierarchyRequest);
            }
        }
        Ok(())
    }

    /// `NotFound` unless `child` is a direct child of `parent`
    pub(crate) fn check_is_child(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.entry(parent)?;
        if self.get(child).and_then(|c| c.parent) != Some(parent) {
            tracing::debug!("{:?} is not a child of {:?}", child, parent);
            return Err(DomError::NotFound);
        }
        Ok(())
    }

    /// Shared body of insertBefore, appendChild and replaceChild
    fn insert_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: Option<NodeId>,
        replacing: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.entry(parent)?;
        if let Some(reference) = ref_child {
            self.check_is_child(parent, reference)?;
        }
        if new_child.document != self.id() {
            tracing::debug!("insert_child: wrong document for {:?}", new_child);
            return Err(DomError::WrongDocument);
        }

        if self.entry(new_child)?.node_type() == NodeType::DocumentFragment {
            return self.insert_fragment(parent, new_child, ref_child, replacing);
        }

        self.check_new_child(parent, new_child, replacing)?;
        self.splice_child(parent, new_child, ref_child);
        Ok(new_child)
    }

    /// Move every child of a fragment, in order, in place of the fragment
    fn insert_fragment(
        &mut self,
        parent: NodeId,
        fragment: NodeId,
        ref_child: Option<NodeId>,
        replacing: Option<NodeId>,
    ) -> DomResult<NodeId> {
        if self.is_inclusive_ancestor(fragment, parent) {
            tracing::debug!("insert_fragment: fragment {:?} is self or ancestor", fragment);
            return Err(DomError::HierarchyRequest);
        }

        let children = self.child_nodes(fragment).to_vec();
        for &child in &children {
            self.check_new_child(parent, child, replacing)?;
        }
        if self.node_type(parent) == Some(NodeType::Document) {
            let elements = children
                .iter()
                .filter(|&&c| self.node_type(c) == Some(NodeType::Element))
                .count();
            if elements > 1 {
                tracing::debug!("insert_fragment: {} document elements", elements);
                return Err(DomError::HierarchyRequest);
            }
        }

        // Emptying an unreferenced fragment must not destroy it mid-loop
        let mut hold = TransientHold::new(self, fragment);
        for child in children {
            hold.splice_child(parent, child, ref_child);
        }
        Ok(fragment)
    }

    /// Structural insert of an already validated child
    fn splice_child(&mut self, parent: NodeId, new_child: NodeId, ref_child: Option<NodeId>) {
        if Some(new_child) == ref_child {
            return;
        }

        // Unlink from the old parent; counts move in set_parent
        if let Some(old_parent) = self.parent_node(new_child) {
            if let Some(entry) = self.get_mut(old_parent) {
                entry.children.retain(|&c| c != new_child);
            }
        }

        let Some(entry) = self.get_mut(parent) else {
            return;
        };
        let position = ref_child
            .and_then(|r| entry.children.iter().position(|&c| c == r))
            .unwrap_or(entry.children.len());
        entry.children.insert(position, new_child);
        self.set_parent(new_child, Some(parent));
    }

    /// Structural removal of a known child. Returns `true` if the child
    /// was unreferenced and got destroyed.
    pub(crate) fn detach_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if let Some(entry) = self.get_mut(parent) {
            entry.children.retain(|&c| c != child);
        }
        self.set_parent(child, None)
    }

    /// Detach every child of a node; unreferenced children are destroyed
    pub fn remove_all_children(&mut self, node: NodeId) -> DomResult<()> {
        let children = std::mem::take(&mut self.get_mut(node).ok_or(DomError::NotFound)?.children);
        for child in children {
            self.set_parent(child, None);
        }
        Ok(())
    }

    /// Shallow copy of a node as a new orphan. Elements get deep copies of
    /// their attributes.
    fn clone_self(&mut self, node: NodeId) -> DomResult<NodeId> {
        let entry = self.entry(node)?;
        let Some(data) = entry.data.clone_self() else {
            return Err(DomError::NotSupported);
        };
        let name = entry.node_name();
        let attrs = entry.attrs().to_vec();

        let copy = self.alloc(data, &name);
        for attr in attrs {
            let attr_copy = self.clone_node(attr, true)?;
            self.attach_attribute(copy, attr_copy);
        }
        Ok(copy)
    }

    // --- Values ---

    /// `nodeValue`: character data, PI data, or attribute value
    pub fn node_value(&self, id: NodeId) -> Option<String> {
        match &self.get(id)?.data {
            NodeData::Text(s) | NodeData::CData(s) | NodeData::Comment(s) => Some(s.clone()),
            NodeData::ProcessingInstruction { data } => Some(data.clone()),
            NodeData::Attr => Some(self.children_text_content(id)),
            _ => None,
        }
    }

    /// Set `nodeValue`; a no-op for kinds without a value
    pub fn set_node_value(&mut self, id: NodeId, value: &str) -> DomResult<()> {
        if self.entry(id)?.node_type() == NodeType::Attribute {
            return self.set_child_text_content(id, value);
        }
        let entry = self.get_mut(id).ok_or(DomError::NotFound)?;
        match &mut entry.data {
            NodeData::Text(s) | NodeData::CData(s) | NodeData::Comment(s) => {
                *s = value.to_owned();
                Ok(())
            }
            NodeData::ProcessingInstruction { data } => {
                *data = value.to_owned();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// `textContent`: the node value, or the concatenated text of all
    /// descendants except comments and processing instructions
    pub fn text_content(&self, id: NodeId) -> Option<String> {
        self.get(id)?;
        Some(match self.node_value(id) {
            Some(value) => value,
            None => self.children_text_content(id),
        })
    }

    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        if self.node_value(id).is_some() {
            self.set_node_value(id, text)
        } else {
            self.set_child_text_content(id, text)
        }
    }

    fn children_text_content(&self, id: NodeId) -> String {
        self.child_nodes(id)
            .iter()
            .filter(|&&c| {
                !matches!(
                    self.node_type(c),
                    Some(NodeType::Comment | NodeType::ProcessingInstruction)
                )
            })
            .filter_map(|&c| self.text_content(c))
            .collect()
    }

    /// Replace all children with a single text node
    pub(crate) fn set_child_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        if !self.entry(id)?.data.allows_child(NodeType::Text) {
            return Err(DomError::HierarchyRequest);
        }
        let mut hold = TransientHold::new(self, id);
        hold.remove_all_children(id)?;
        let text_node = hold.create_text_node(text);
        hold.append_child(id, text_node)?;
        Ok(())
    }

    // --- Names ---

    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.prefix()
    }

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|e| e.local_name())
    }

    /// Change the namespace prefix of an element or attribute. Other kinds
    /// ignore the call. An empty prefix clears it.
    pub fn set_prefix(&mut self, id: NodeId, prefix: &str) -> DomResult<()> {
        let entry = self.get_mut(id).ok_or(DomError::NotFound)?;
        if !matches!(entry.data, NodeData::Element { .. } | NodeData::Attr) {
            return Ok(());
        }
        if prefix.is_empty() {
            entry.prefix = None;
        } else if is_xml_name(prefix) {
            entry.prefix = Some(prefix.to_owned());
        } else {
            return Err(DomError::InvalidCharacter);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_root() -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let root = tree.create_element("root").unwrap();
        let document = tree.root();
        tree.append_child(document, root).unwrap();
        (tree, root)
    }

    fn names(tree: &DomTree, id: NodeId) -> Vec<String> {
        tree.child_nodes(id)
            .iter()
            .map(|&c| tree.node_name(c).unwrap())
            .collect()
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(DomError::HierarchyRequest.code(), 3);
        assert_eq!(DomError::InUseAttribute.code(), 10);
        assert_eq!(DomError::NotFound.name(), "NOT_FOUND_ERR");
        assert_eq!(DomError::WrongDocument.to_string(), "Wrong document");
    }

    #[test]
    fn test_insert_before_reference() {
        let (mut tree, root) = tree_with_root();
        let a = tree.create_element("a").unwrap();
        let b = tree.create_element("b").unwrap();
        let c = tree.create_element("c").unwrap();
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();
        tree.insert_before(root, c, Some(b)).unwrap();
        assert_eq!(names(&tree, root), ["a", "c", "b"]);
        assert!(tree.check_consistency().is_ok());
    }

    #[test]
    fn test_insert_before_foreign_reference() {
        let (mut tree, root) = tree_with_root();
        let a = tree.create_element("a").unwrap();
        let loose = tree.create_element("loose").unwrap();
        assert_eq!(tree.insert_before(root, a, Some(loose)), Err(DomError::NotFound));
        assert_eq!(tree.parent_node(a), None);
    }

    #[test]
    fn test_insert_self_is_hierarchy_error() {
        let (mut tree, root) = tree_with_root();
        assert_eq!(tree.append_child(root, root), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_insert_ancestor_reports_hierarchy_before_type() {
        let (mut tree, root) = tree_with_root();
        let text = tree.create_text_node("t");
        tree.append_child(root, text).unwrap();
        // root under a text node: cycle check fires first
        assert_eq!(tree.append_child(text, root), Err(DomError::HierarchyRequest));
        let document = tree.root();
        assert_eq!(tree.append_child(root, document), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_insert_into_leaf_rejected() {
        let (mut tree, _) = tree_with_root();
        let text = tree.create_text_node("t");
        let el = tree.create_element("e").unwrap();
        assert_eq!(tree.append_child(text, el), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_move_within_same_parent() {
        let (mut tree, root) = tree_with_root();
        let a = tree.create_element("a").unwrap();
        let b = tree.create_element("b").unwrap();
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();
        tree.append_child(root, a).unwrap();
        assert_eq!(names(&tree, root), ["b", "a"]);
        tree.insert_before(root, a, Some(a)).unwrap();
        assert_eq!(names(&tree, root), ["b", "a"]);
        assert!(tree.check_consistency().is_ok());
    }

    #[test]
    fn test_document_single_element() {
        let (mut tree, _) = tree_with_root();
        let other = tree.create_element("other").unwrap();
        let document = tree.root();
        assert_eq!(tree.append_child(document, other), Err(DomError::HierarchyRequest));
        let comment = tree.create_comment("ok");
        tree.append_child(document, comment).unwrap();
    }

    #[test]
    fn test_replace_document_element() {
        let (mut tree, root) = tree_with_root();
        let other = tree.create_element("other").unwrap();
        let document = tree.root();
        let old = tree.replace_child(document, other, root).unwrap();
        assert_eq!(old, root);
        assert_eq!(tree.document_element(), Some(other));
        assert!(tree.contains(root));
        assert_eq!(tree.parent_node(root), None);
    }

    #[test]
    fn test_fragment_unwraps_children() {
        let (mut tree, root) = tree_with_root();
        let frag = tree.create_document_fragment();
        let x = tree.create_element("x").unwrap();
        let y = tree.create_element("y").unwrap();
        tree.append_child(frag, x).unwrap();
        tree.append_child(frag, y).unwrap();
        let z = tree.create_element("z").unwrap();
        tree.append_child(root, z).unwrap();

        tree.insert_before(root, frag, Some(z)).unwrap();
        assert_eq!(names(&tree, root), ["x", "y", "z"]);
        assert!(tree.child_nodes(frag).is_empty());
        assert_eq!(tree.parent_node(frag), None);
        assert!(tree.check_consistency().is_ok());
    }

    #[test]
    fn test_fragment_into_document_validates_all_first() {
        let mut tree = DomTree::new();
        let frag = tree.create_document_fragment();
        let x = tree.create_element("x").unwrap();
        let y = tree.create_element("y").unwrap();
        tree.append_child(frag, x).unwrap();
        tree.append_child(frag, y).unwrap();
        let document = tree.root();
        assert_eq!(tree.append_child(document, frag), Err(DomError::HierarchyRequest));
        assert_eq!(tree.child_nodes(frag).len(), 2);
        assert!(tree.child_nodes(document).is_empty());
    }

    #[test]
    fn test_fragment_into_itself_rejected() {
        let mut tree = DomTree::new();
        let frag = tree.create_document_fragment();
        let x = tree.create_element("x").unwrap();
        tree.append_child(frag, x).unwrap();
        assert_eq!(tree.append_child(frag, frag), Err(DomError::HierarchyRequest));
        assert_eq!(tree.append_child(x, frag), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_remove_child_returns_live_node() {
        let (mut tree, root) = tree_with_root();
        let a = tree.create_element("a").unwrap();
        tree.append_child(root, a).unwrap();
        let removed = tree.remove_child(root, a).unwrap();
        assert_eq!(removed, a);
        assert!(tree.contains(a));
        assert_eq!(tree.parent_node(a), None);
        assert!(tree.check_consistency().is_ok());
    }

    #[test]
    fn test_remove_non_child() {
        let (mut tree, root) = tree_with_root();
        let a = tree.create_element("a").unwrap();
        assert_eq!(tree.remove_child(root, a), Err(DomError::NotFound));
        assert!(tree.contains(a));
    }

    #[test]
    fn test_clone_deep_and_shallow() {
        let (mut tree, root) = tree_with_root();
        tree.set_attribute(root, "k", "v").unwrap();
        let c = tree.create_element("c").unwrap();
        tree.append_child(root, c).unwrap();

        let shallow = tree.clone_node(root, false).unwrap();
        assert!(tree.child_nodes(shallow).is_empty());
        assert_eq!(tree.get_attribute(shallow, "k").as_deref(), Some("v"));

        let deep = tree.clone_node(root, true).unwrap();
        assert_eq!(names(&tree, deep), ["c"]);
        assert_eq!(tree.parent_node(deep), None);
        assert_ne!(tree.child_nodes(deep)[0], c);
    }

    #[test]
    fn test_clone_document_not_supported() {
        let mut tree = DomTree::new();
        let document = tree.root();
        assert_eq!(tree.clone_node(document, true), Err(DomError::NotSupported));
    }

    #[test]
    fn test_normalize_merges_and_drops() {
        let (mut tree, root) = tree_with_root();
        for data in ["a", "", "b", "c"] {
            let t = tree.create_text_node(data);
            tree.append_child(root, t).unwrap();
        }
        let e = tree.create_element("e").unwrap();
        tree.append_child(root, e).unwrap();
        let d = tree.create_text_node("d");
        tree.append_child(root, d).unwrap();

        tree.normalize(root).unwrap();
        let kids = tree.child_nodes(root).to_vec();
        assert_eq!(kids.len(), 3);
        assert_eq!(tree.node_value(kids[0]).as_deref(), Some("abc"));
        assert_eq!(kids[1], e);
        assert_eq!(tree.node_value(kids[2]).as_deref(), Some("d"));
        assert!(tree.check_consistency().is_ok());
    }

    #[test]
    fn test_text_content_skips_comments() {
        let (mut tree, root) = tree_with_root();
        let t = tree.create_text_node("hello ");
        let c = tree.create_comment("hidden");
        let inner = tree.create_element("b").unwrap();
        let t2 = tree.create_text_node("world");
        tree.append_child(root, t).unwrap();
        tree.append_child(root, c).unwrap();
        tree.append_child(root, inner).unwrap();
        tree.append_child(inner, t2).unwrap();
        assert_eq!(tree.text_content(root).as_deref(), Some("hello world"));

        tree.set_text_content(root, "replaced").unwrap();
        assert_eq!(tree.child_nodes(root).len(), 1);
        assert_eq!(tree.text_content(root).as_deref(), Some("replaced"));
        assert!(!tree.contains(inner));
    }

    #[test]
    fn test_set_text_content_on_document_rejected() {
        let (mut tree, root) = tree_with_root();
        let document = tree.root();
        assert_eq!(tree.set_text_content(document, "x"), Err(DomError::HierarchyRequest));
        assert_eq!(tree.document_element(), Some(root));
    }

    #[test]
    fn test_set_prefix() {
        let (mut tree, root) = tree_with_root();
        tree.set_prefix(root, "ns").unwrap();
        assert_eq!(tree.node_name(root).as_deref(), Some("ns:root"));
        assert_eq!(tree.set_prefix(root, "bad prefix"), Err(DomError::InvalidCharacter));
        tree.set_prefix(root, "").unwrap();
        assert_eq!(tree.node_name(root).as_deref(), Some("root"));

        let text = tree.create_text_node("t");
        tree.set_prefix(text, "ns").unwrap();
        assert_eq!(tree.prefix(text), None);
    }
}
