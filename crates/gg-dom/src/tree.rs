//! DOM Tree (arena-based allocation)
//!
//! Owns every node of one document and implements the lifetime protocol.
//!
//! # Accumulated reference counting
//!
//! A node's `ref_count` is the number of external references held directly
//! on it plus the `ref_count` of each child and attribute. `acquire`
//! therefore adds along the whole owner chain and `release` subtracts along
//! it. When a release leaves an orphan root at zero the root, and with it
//! the whole (necessarily zero-count) subtree, is destroyed immediately.
//!
//! The document keeps an orphan ledger: every parentless node other than the
//! document itself is counted in `orphan_count`.

use std::ops::{Deref, DerefMut};

use crate::generation::{next_document_id, Generation};
use crate::node::{NodeData, NodeEntry, NodeType, DOCUMENT_NAME};
use crate::operations::{DomError, DomResult};
use crate::{DocumentId, NodeId};

/// Node allocation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Nodes allocated (the document node is not counted)
    pub created: usize,
    /// Nodes destroyed
    pub destroyed: usize,
}

impl TreeStats {
    /// Nodes currently alive, excluding the document node
    pub fn live(&self) -> usize {
        self.created - self.destroyed
    }
}

/// Invariant violation found by [`DomTree::check_consistency`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("node {node:?} points at parent {parent:?} which does not list it exactly once")]
    ParentMismatch { node: NodeId, parent: NodeId },

    #[error("node {node:?} lists child {child:?} whose parent is {actual:?}")]
    ChildMismatch {
        node: NodeId,
        child: NodeId,
        actual: Option<NodeId>,
    },

    #[error("owner chain of {node:?} is cyclic")]
    Cycle { node: NodeId },

    #[error("node {node:?} has count {count}, expected {expected} from its own and its children's references")]
    CountMismatch {
        node: NodeId,
        count: usize,
        expected: usize,
    },

    #[error("orphan ledger is {recorded} but {actual} orphans are alive")]
    OrphanLedger { recorded: usize, actual: usize },
}

#[derive(Debug)]
struct Slot {
    generation: Generation,
    entry: Option<NodeEntry>,
}

/// Arena-based DOM tree for one document
#[derive(Debug)]
pub struct DomTree {
    id: DocumentId,
    slots: Vec<Slot>,
    /// Reclaimed slot indices
    free: Vec<u32>,
    orphan_count: usize,
    stats: TreeStats,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        let id = DocumentId(next_document_id());
        Self {
            id,
            slots: vec![Slot {
                generation: Generation::INITIAL,
                entry: Some(NodeEntry::new(NodeData::Document, DOCUMENT_NAME)),
            }],
            free: Vec::new(),
            orphan_count: 0,
            stats: TreeStats::default(),
        }
    }

    /// Identity of this document
    #[inline]
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId {
            document: self.id,
            index: NodeId::DOCUMENT_INDEX,
            generation: Generation::INITIAL,
        }
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&NodeEntry> {
        if id.document != self.id {
            return None;
        }
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    /// Get a mutable node by ID
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        if id.document != self.id {
            return None;
        }
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    /// Resolve a node, `NotFound` if the id is stale or foreign
    pub(crate) fn entry(&self, id: NodeId) -> DomResult<&NodeEntry> {
        self.get(id).ok_or(DomError::NotFound)
    }

    /// Check whether the node is still alive
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes, including the document node
    pub fn node_count(&self) -> usize {
        self.stats.live() + 1
    }

    /// Allocation counters
    #[inline]
    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    /// Number of live parentless nodes (document excluded)
    #[inline]
    pub fn orphan_count(&self) -> usize {
        self.orphan_count
    }

    /// Accumulated reference count of a node
    pub fn ref_count(&self, id: NodeId) -> Option<usize> {
        self.get(id).map(|e| e.ref_count)
    }

    /// Iterate over live node ids in slot order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.entry.as_ref().map(|_| NodeId {
                document: self.id,
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    /// Allocate a new orphan node. It starts with no references and is
    /// counted in the orphan ledger.
    pub(crate) fn alloc(&mut self, data: NodeData, name: &str) -> NodeId {
        let entry = NodeEntry::new(data, name);
        let (index, generation) = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                (index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: Generation::INITIAL,
                    entry: Some(entry),
                });
                ((self.slots.len() - 1) as u32, Generation::INITIAL)
            }
        };
        self.orphan_count += 1;
        self.stats.created += 1;
        NodeId {
            document: self.id,
            index,
            generation,
        }
    }

    /// Reclaim a node and everything below it (children and attributes)
    fn free_subtree(&mut self, root: NodeId) -> usize {
        let mut stack = vec![root];
        let mut freed = 0;
        while let Some(id) = stack.pop() {
            if id.is_document_node() || id.document != self.id {
                continue;
            }
            let Some(slot) = self.slots.get_mut(id.index as usize) else {
                continue;
            };
            if slot.generation != id.generation {
                continue;
            }
            let Some(entry) = slot.entry.take() else {
                continue;
            };
            debug_assert_eq!(entry.ref_count, 0, "destroying a referenced node");
            slot.generation = slot.generation.next();
            self.free.push(id.index);
            if let NodeData::Element { attrs } = entry.data {
                stack.extend(attrs);
            }
            stack.extend(entry.children);
            freed += 1;
        }
        self.stats.destroyed += freed;
        tracing::trace!("Destroyed subtree rooted at {:?}: {} nodes", root, freed);
        freed
    }

    /// Destroy an orphan root and drop it from the ledger
    fn destroy_orphan(&mut self, root: NodeId) {
        self.orphan_count -= 1;
        self.free_subtree(root);
    }

    // --- Reference accounting ---

    /// Add one external reference to a node
    pub fn acquire(&mut self, id: NodeId) -> DomResult<()> {
        self.get_mut(id).ok_or(DomError::NotFound)?.direct_refs += 1;
        self.acquire_multi(id, 1);
        Ok(())
    }

    /// Drop one external reference from a node. Returns `true` if this
    /// destroyed an unreferenced orphan subtree.
    ///
    /// Only a reference taken on this very node can be released: a node
    /// without direct references is `NotFound`, even when a descendant is
    /// held.
    pub fn release(&mut self, id: NodeId) -> DomResult<bool> {
        let entry = self.get_mut(id).ok_or(DomError::NotFound)?;
        if entry.direct_refs == 0 {
            tracing::debug!("release: {:?} holds no external reference", id);
            return Err(DomError::NotFound);
        }
        entry.direct_refs -= 1;
        Ok(self.release_multi(id, 1, false))
    }

    /// Direct external references on a node, descendants excluded
    pub fn direct_ref_count(&self, id: NodeId) -> Option<usize> {
        self.get(id).map(|e| e.direct_refs)
    }

    /// Add `count` to the node and every node on its owner chain
    pub(crate) fn acquire_multi(&mut self, id: NodeId, count: usize) {
        if count == 0 {
            return;
        }
        let mut current = Some(id);
        while let Some(node) = current {
            let Some(entry) = self.get_mut(node) else {
                break;
            };
            entry.ref_count += count;
            current = entry.owner;
        }
    }

    /// Subtract `count` along the owner chain. The orphan root at the top
    /// is destroyed if it reaches zero, unless `transient` is set.
    pub(crate) fn release_multi(&mut self, id: NodeId, count: usize, transient: bool) -> bool {
        if count == 0 {
            return false;
        }
        let mut current = id;
        loop {
            let Some(entry) = self.get_mut(current) else {
                return false;
            };
            debug_assert!(entry.ref_count >= count, "accumulated count underflow");
            entry.ref_count = entry.ref_count.saturating_sub(count);
            let remaining = entry.ref_count;
            match entry.owner {
                Some(owner) => current = owner,
                None => {
                    // Root count zero means the whole tree is unreferenced
                    if remaining == 0 && !transient && !current.is_document_node() {
                        self.destroy_orphan(current);
                        return true;
                    }
                    return false;
                }
            }
        }
    }

    /// Move a node to a new owner, carrying its accumulated count from the
    /// old owner chain to the new one. Returns `true` if the node became an
    /// unreferenced orphan and was destroyed.
    ///
    /// The caller must already have removed the node from the old owner's
    /// child or attribute list.
    pub(crate) fn set_owner(&mut self, id: NodeId, new_owner: Option<NodeId>) -> bool {
        let Some(entry) = self.get(id) else {
            return false;
        };
        let old_owner = entry.owner;
        let count = entry.ref_count;
        if old_owner == new_owner {
            return false;
        }

        // Acquire before releasing: when both owners share a root, the
        // root never passes through zero.
        if let Some(new) = new_owner {
            self.acquire_multi(new, count);
        }
        if let Some(old) = old_owner {
            self.release_multi(old, count, false);
        }

        match (old_owner, new_owner) {
            (Some(_), None) if count == 0 => {
                // Unreferenced new orphan, never entered the ledger
                self.free_subtree(id);
                return true;
            }
            (Some(_), None) => self.orphan_count += 1,
            (None, Some(_)) => self.orphan_count -= 1,
            _ => {}
        }

        if let Some(entry) = self.get_mut(id) {
            entry.owner = new_owner;
        }
        false
    }

    /// Set the positional parent and the owner together
    pub(crate) fn set_parent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        match self.get_mut(id) {
            Some(entry) => entry.parent = new_parent,
            None => return false,
        }
        self.set_owner(id, new_parent)
    }

    // --- Navigation ---

    /// Parent chain of a node, nearest first (the node itself excluded)
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).and_then(|e| e.parent),
        }
    }

    /// Whether `candidate` is `node` or one of its ancestors
    pub(crate) fn is_inclusive_ancestor(&self, candidate: NodeId, node: NodeId) -> bool {
        candidate == node || self.ancestors(node).any(|a| a == candidate)
    }

    pub fn parent_node(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Children of a node (empty if the id is stale)
    pub fn child_nodes(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|e| e.children()).unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.children.first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.children.last().copied()
    }

    pub fn has_child_nodes(&self, id: NodeId) -> bool {
        !self.child_nodes(id).is_empty()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.child_nodes(self.parent_node(id)?);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.child_nodes(self.parent_node(id)?);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.get(id).map(|e| e.node_type())
    }

    pub fn node_name(&self, id: NodeId) -> Option<String> {
        self.get(id).map(|e| e.node_name())
    }

    /// Document that created the node (`None` for the document itself)
    pub fn owner_document(&self, id: NodeId) -> Option<NodeId> {
        if id.is_document_node() || !self.contains(id) {
            None
        } else {
            Some(self.root())
        }
    }

    /// Source position recorded by a loader
    pub fn position(&self, id: NodeId) -> Option<(u32, u32)> {
        self.get(id).map(|e| (e.row, e.column))
    }

    pub fn set_position(&mut self, id: NodeId, row: u32, column: u32) -> DomResult<()> {
        let entry = self.get_mut(id).ok_or(DomError::NotFound)?;
        entry.row = row;
        entry.column = column;
        Ok(())
    }

    // --- Validation ---

    /// Verify structural and counting invariants over the whole arena
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        let result = self.check_consistency_inner();
        if let Err(err) = &result {
            tracing::error!("DOM consistency check failed: {}", err);
        }
        result
    }

    fn check_consistency_inner(&self) -> Result<(), ConsistencyError> {
        let mut orphans = 0;
        for id in self.node_ids() {
            let Some(entry) = self.get(id) else { continue };

            // Links one level up
            match (entry.node_type(), entry.parent, entry.owner) {
                (NodeType::Attribute, None, Some(owner)) => {
                    let listed = self.get(owner).map_or(0, |o| {
                        o.attrs().iter().filter(|&&a| a == id).count()
                    });
                    if listed != 1 {
                        return Err(ConsistencyError::ParentMismatch { node: id, parent: owner });
                    }
                }
                (_, Some(parent), owner) => {
                    let listed = self.get(parent).map_or(0, |p| {
                        p.children.iter().filter(|&&c| c == id).count()
                    });
                    if listed != 1 || owner != Some(parent) {
                        return Err(ConsistencyError::ParentMismatch { node: id, parent });
                    }
                }
                (_, None, Some(owner)) => {
                    return Err(ConsistencyError::ParentMismatch { node: id, parent: owner });
                }
                (_, None, None) => {
                    if !id.is_document_node() {
                        orphans += 1;
                    }
                }
            }

            // Links one level down
            for &child in entry.children.iter() {
                let actual = self.get(child).and_then(|c| c.parent);
                if actual != Some(id) {
                    return Err(ConsistencyError::ChildMismatch { node: id, child, actual });
                }
            }
            for &attr in entry.attrs() {
                let actual = self.get(attr).and_then(|a| a.owner);
                if actual != Some(id) {
                    return Err(ConsistencyError::ChildMismatch { node: id, child: attr, actual });
                }
            }

            // Owner chain must terminate
            let mut steps = 0;
            let mut current = entry.owner;
            while let Some(node) = current {
                steps += 1;
                if steps > self.slots.len() {
                    return Err(ConsistencyError::Cycle { node: id });
                }
                current = self.get(node).and_then(|e| e.owner);
            }

            let below: usize = entry
                .children
                .iter()
                .chain(entry.attrs())
                .filter_map(|&c| self.ref_count(c))
                .sum();
            let expected = entry.direct_refs + below;
            if entry.ref_count != expected {
                return Err(ConsistencyError::CountMismatch {
                    node: id,
                    count: entry.ref_count,
                    expected,
                });
            }
        }

        if orphans != self.orphan_count {
            return Err(ConsistencyError::OrphanLedger {
                recorded: self.orphan_count,
                actual: orphans,
            });
        }
        Ok(())
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's ancestors
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|e| e.parent);
        Some(current)
    }
}

/// Keeps a node alive across an operation that may leave it unreferenced.
///
/// Acquires one reference on construction and releases it transiently on
/// drop, so the node survives with a zero count instead of being destroyed
/// before the operation returns it to the caller. Derefs to the tree so the
/// guarded operation runs through the guard.
pub(crate) struct TransientHold<'a> {
    tree: &'a mut DomTree,
    node: NodeId,
}

impl<'a> TransientHold<'a> {
    pub(crate) fn new(tree: &'a mut DomTree, node: NodeId) -> Self {
        if let Some(entry) = tree.get_mut(node) {
            entry.direct_refs += 1;
        }
        tree.acquire_multi(node, 1);
        Self { tree, node }
    }
}

impl Deref for TransientHold<'_> {
    type Target = DomTree;

    fn deref(&self) -> &DomTree {
        self.tree
    }
}

impl DerefMut for TransientHold<'_> {
    fn deref_mut(&mut self) -> &mut DomTree {
        self.tree
    }
}

impl Drop for TransientHold<'_> {
    fn drop(&mut self) {
        if let Some(entry) = self.tree.get_mut(self.node) {
            entry.direct_refs = entry.direct_refs.saturating_sub(1);
        }
        self.tree.release_multi(self.node, 1, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tree: &mut DomTree, name: &str) -> NodeId {
        tree.alloc(NodeData::Element { attrs: Vec::new() }, name)
    }

    fn link(tree: &mut DomTree, parent: NodeId, child: NodeId) {
        tree.get_mut(parent).unwrap().children.push(child);
        tree.set_parent(child, Some(parent));
    }

    #[test]
    fn test_new_tree_has_only_document() {
        let tree = DomTree::new();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.node_type(tree.root()), Some(NodeType::Document));
        assert_eq!(tree.orphan_count(), 0);
        assert!(tree.check_consistency().is_ok());
    }

    #[test]
    fn test_alloc_counts_orphan() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, "a");
        assert_eq!(tree.orphan_count(), 1);
        assert_eq!(tree.ref_count(a), Some(0));
        assert_eq!(tree.stats().created, 1);
    }

    #[test]
    fn test_acquire_propagates_to_root() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, "a");
        let b = element(&mut tree, "b");
        link(&mut tree, a, b);
        assert_eq!(tree.orphan_count(), 1);

        tree.acquire(b).unwrap();
        assert_eq!(tree.ref_count(b), Some(1));
        assert_eq!(tree.ref_count(a), Some(1));
        assert!(tree.check_consistency().is_ok());
    }

    #[test]
    fn test_release_destroys_orphan_subtree() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, "a");
        let b = element(&mut tree, "b");
        link(&mut tree, a, b);
        tree.acquire(b).unwrap();

        assert!(tree.release(b).unwrap());
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert_eq!(tree.stats().destroyed, 2);
        assert_eq!(tree.orphan_count(), 0);
        assert!(tree.check_consistency().is_ok());
    }

    #[test]
    fn test_release_inside_document_keeps_nodes() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let a = element(&mut tree, "a");
        link(&mut tree, root, a);
        tree.acquire(a).unwrap();
        assert!(!tree.release(a).unwrap());
        assert!(tree.contains(a));
        assert_eq!(tree.ref_count(root), Some(0));
    }

    #[test]
    fn test_release_without_reference_is_rejected() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, "a");
        assert_eq!(tree.release(a), Err(DomError::NotFound));
    }

    #[test]
    fn test_release_through_ancestor_is_rejected() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, "a");
        let b = element(&mut tree, "b");
        link(&mut tree, a, b);
        tree.acquire(b).unwrap();
        assert_eq!(tree.ref_count(a), Some(1));
        assert_eq!(tree.direct_ref_count(a), Some(0));

        assert_eq!(tree.release(a), Err(DomError::NotFound));
        assert!(tree.contains(a));
        assert!(tree.contains(b));
        assert_eq!(tree.ref_count(a), Some(1));
        assert!(tree.check_consistency().is_ok());

        assert!(tree.release(b).unwrap());
        assert!(!tree.contains(a));
    }

    #[test]
    fn test_consistency_flags_count_drift() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, "a");
        tree.acquire(a).unwrap();
        tree.get_mut(a).unwrap().ref_count += 1;
        assert_eq!(
            tree.check_consistency(),
            Err(ConsistencyError::CountMismatch { node: a, count: 2, expected: 1 })
        );
    }

    #[test]
    fn test_detaching_unreferenced_node_destroys_it() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let a = element(&mut tree, "a");
        link(&mut tree, root, a);
        tree.get_mut(root).unwrap().children.clear();
        assert!(tree.set_parent(a, None));
        assert!(!tree.contains(a));
        assert_eq!(tree.orphan_count(), 0);
    }

    #[test]
    fn test_detaching_referenced_node_becomes_orphan() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let a = element(&mut tree, "a");
        link(&mut tree, root, a);
        tree.acquire(a).unwrap();
        assert_eq!(tree.ref_count(root), Some(1));

        tree.get_mut(root).unwrap().children.clear();
        assert!(!tree.set_parent(a, None));
        assert!(tree.contains(a));
        assert_eq!(tree.ref_count(root), Some(0));
        assert_eq!(tree.orphan_count(), 1);
        assert!(tree.check_consistency().is_ok());
    }

    #[test]
    fn test_stale_id_after_slot_reuse() {
        let mut tree = DomTree::new();
        let a = element(&mut tree, "a");
        tree.acquire(a).unwrap();
        tree.release(a).unwrap();
        let b = element(&mut tree, "b");
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert!(tree.get(a).is_none());
        assert!(tree.get(b).is_some());
    }

    #[test]
    fn test_transient_hold_keeps_node() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let a = element(&mut tree, "a");
        link(&mut tree, root, a);
        {
            let mut hold = TransientHold::new(&mut tree, a);
            hold.get_mut(root).unwrap().children.clear();
            hold.set_parent(a, None);
            assert_eq!(hold.direct_ref_count(a), Some(1));
            assert!(hold.check_consistency().is_ok());
        }
        assert_eq!(tree.direct_ref_count(a), Some(0));
        assert!(tree.contains(a));
        assert_eq!(tree.ref_count(a), Some(0));
        assert_eq!(tree.orphan_count(), 1);
    }

    #[test]
    fn test_foreign_id_does_not_resolve() {
        let mut one = DomTree::new();
        let two = DomTree::new();
        let a = element(&mut one, "a");
        assert!(two.get(a).is_none());
        assert_ne!(one.id(), two.id());
    }
}
