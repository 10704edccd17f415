//! DOM Element and Attr operations
//!
//! Attributes are real nodes: an `Attr` is owned by its element (its
//! `owner` link) without being a positional child, and its value lives in
//! `Text` children.

use crate::names::is_xml_name;
use crate::node::{NodeData, NodeEntry, NodeType};
use crate::operations::{DomError, DomResult};
use crate::tree::{DomTree, TransientHold};
use crate::NodeId;

impl DomTree {
    /// Attribute nodes of an element in insertion order
    pub fn attributes(&self, element: NodeId) -> &[NodeId] {
        self.get(element).map(|e| e.attrs()).unwrap_or(&[])
    }

    pub fn has_attributes(&self, id: NodeId) -> bool {
        !self.attributes(id).is_empty()
    }

    /// Tag name of an element
    pub fn tag_name(&self, element: NodeId) -> Option<String> {
        let entry = self.get(element)?;
        entry.is_element().then(|| entry.node_name())
    }

    fn element_entry(&self, element: NodeId) -> DomResult<&NodeEntry> {
        let entry = self.entry(element)?;
        if !entry.is_element() {
            tracing::debug!("{:?} is not an element", element);
            return Err(DomError::HierarchyRequest);
        }
        Ok(entry)
    }

    pub fn get_attribute_node(&self, element: NodeId, name: &str) -> Option<NodeId> {
        self.attributes(element)
            .iter()
            .copied()
            .find(|&attr| self.get(attr).is_some_and(|a| a.name_is(name)))
    }

    /// Attribute value, `None` if the element has no such attribute
    pub fn get_attribute(&self, element: NodeId, name: &str) -> Option<String> {
        self.node_value(self.get_attribute_node(element, name)?)
    }

    /// Set an attribute value, creating the attribute if needed
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> DomResult<()> {
        let row = self.element_entry(element)?.row;
        if !is_xml_name(name) {
            tracing::debug!("set_attribute: invalid name {:?}", name);
            return Err(DomError::InvalidCharacter);
        }

        if let Some(attr) = self.get_attribute_node(element, name) {
            return self.set_child_text_content(attr, value);
        }
        let attr = self.alloc(NodeData::Attr, name);
        self.attach_attribute(element, attr);
        self.set_child_text_content(attr, value)?;
        // Column is left alone, it would be inaccurate
        if let Some(entry) = self.get_mut(attr) {
            entry.row = row;
        }
        Ok(())
    }

    /// Remove an attribute by name; a missing name is not an error
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> DomResult<()> {
        self.element_entry(element)?;
        if let Some(attr) = self.get_attribute_node(element, name) {
            self.detach_attribute(element, attr);
        }
        Ok(())
    }

    /// Attach an attribute node, replacing any attribute of the same name.
    /// The replaced attribute is returned alive.
    pub fn set_attribute_node(&mut self, element: NodeId, attr: NodeId) -> DomResult<Option<NodeId>> {
        self.element_entry(element)?;
        if attr.document != self.id() {
            tracing::debug!("set_attribute_node: wrong document for {:?}", attr);
            return Err(DomError::WrongDocument);
        }
        let entry = self.entry(attr)?;
        if entry.node_type() != NodeType::Attribute {
            tracing::debug!("set_attribute_node: {:?} is not an attribute", attr);
            return Err(DomError::HierarchyRequest);
        }
        match entry.owner {
            Some(owner) if owner == element => return Ok(None),
            Some(owner) => {
                tracing::debug!("set_attribute_node: {:?} in use by {:?}", attr, owner);
                return Err(DomError::InUseAttribute);
            }
            None => {}
        }

        let name = entry.node_name();
        let replaced = self.get_attribute_node(element, &name);
        match replaced {
            Some(old) => {
                let mut element_hold = TransientHold::new(self, element);
                let mut hold = TransientHold::new(&mut element_hold, old);
                hold.detach_attribute_entry(element, old);
                hold.attach_attribute(element, attr);
                hold.set_owner(old, None);
            }
            None => self.attach_attribute(element, attr),
        }
        Ok(replaced)
    }

    /// Detach an attribute node from its element; it is returned alive
    pub fn remove_attribute_node(&mut self, element: NodeId, attr: NodeId) -> DomResult<NodeId> {
        self.element_entry(element)?;
        if !self.attributes(element).contains(&attr) {
            tracing::debug!("{:?} is not an attribute of {:?}", attr, element);
            return Err(DomError::NotFound);
        }
        let mut hold = TransientHold::new(self, attr);
        hold.detach_attribute(element, attr);
        Ok(attr)
    }

    /// Named-map flavor of [`remove_attribute`](Self::remove_attribute):
    /// a missing name is `NotFound` and the removed node is returned
    pub fn remove_named_item(&mut self, element: NodeId, name: &str) -> DomResult<NodeId> {
        self.element_entry(element)?;
        let Some(attr) = self.get_attribute_node(element, name) else {
            tracing::debug!("remove_named_item: no attribute {:?}", name);
            return Err(DomError::NotFound);
        };
        self.remove_attribute_node(element, attr)
    }

    /// Named-map flavor of [`set_attribute_node`](Self::set_attribute_node)
    pub fn set_named_item(&mut self, element: NodeId, node: NodeId) -> DomResult<Option<NodeId>> {
        self.set_attribute_node(element, node)
    }

    /// Element an attribute belongs to
    pub fn owner_element(&self, attr: NodeId) -> Option<NodeId> {
        let entry = self.get(attr)?;
        match entry.data {
            NodeData::Attr => entry.owner,
            _ => None,
        }
    }

    pub fn attr_value(&self, attr: NodeId) -> Option<String> {
        match self.get(attr)?.data {
            NodeData::Attr => self.node_value(attr),
            _ => None,
        }
    }

    pub fn set_attr_value(&mut self, attr: NodeId, value: &str) -> DomResult<()> {
        match self.entry(attr)?.data {
            NodeData::Attr => self.set_child_text_content(attr, value),
            _ => Err(DomError::NotSupported),
        }
    }

    /// Append an attribute to the element's list and move its count over
    pub(crate) fn attach_attribute(&mut self, element: NodeId, attr: NodeId) {
        if let Some(NodeData::Element { attrs }) = self.get_mut(element).map(|e| &mut e.data) {
            attrs.push(attr);
            self.set_owner(attr, Some(element));
        }
    }

    /// Take an attribute off its element. Returns `true` if it was
    /// unreferenced and got destroyed.
    pub(crate) fn detach_attribute(&mut self, element: NodeId, attr: NodeId) -> bool {
        self.detach_attribute_entry(element, attr);
        self.set_owner(attr, None)
    }

    fn detach_attribute_entry(&mut self, element: NodeId, attr: NodeId) {
        if let Some(NodeData::Element { attrs }) = self.get_mut(element).map(|e| &mut e.data) {
            attrs.retain(|&a| a != attr);
        }
    }
}
