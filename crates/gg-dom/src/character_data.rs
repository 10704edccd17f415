//! CharacterData operations (Text, CDATA section, Comment) and
//! processing-instruction data
//!
//! Offsets and counts are in Unicode scalar values. An offset past the end
//! is `IndexSize`; a count running past the end is clamped.

use std::iter;
use std::ops::Range;

use crate::node::{NodeData, CDATA_SECTION_NAME, TEXT_NAME};
use crate::operations::{DomError, DomResult, NodeOperations};
use crate::tree::DomTree;
use crate::NodeId;

/// Byte index of the `offset`-th char, `len()` counting as one past the end
fn byte_offset(data: &str, offset: usize) -> Option<usize> {
    data.char_indices()
        .map(|(i, _)| i)
        .chain(iter::once(data.len()))
        .nth(offset)
}

fn byte_range(data: &str, offset: usize, count: usize) -> DomResult<Range<usize>> {
    let Some(start) = byte_offset(data, offset) else {
        tracing::debug!("character data offset {} out of range", offset);
        return Err(DomError::IndexSize);
    };
    let end = byte_offset(&data[start..], count).map_or(data.len(), |len| start + len);
    Ok(start..end)
}

impl DomTree {
    /// Character data of Text/CDATA/Comment nodes, data of a processing
    /// instruction
    pub fn data(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::ProcessingInstruction { data } => Some(data),
            other => other.character_data(),
        }
    }

    pub fn set_data(&mut self, id: NodeId, data: &str) -> DomResult<()> {
        let entry = self.get_mut(id).ok_or(DomError::NotFound)?;
        match &mut entry.data {
            NodeData::Text(s)
            | NodeData::CData(s)
            | NodeData::Comment(s)
            | NodeData::ProcessingInstruction { data: s } => {
                data.clone_into(s);
                Ok(())
            }
            _ => Err(DomError::NotSupported),
        }
    }

    /// Length of the character data in chars
    pub fn length(&self, id: NodeId) -> Option<usize> {
        self.get(id)?.data.character_data().map(|s| s.chars().count())
    }

    fn char_data(&self, id: NodeId) -> DomResult<&str> {
        self.entry(id)?
            .data
            .character_data()
            .ok_or(DomError::NotSupported)
    }

    fn char_data_mut(&mut self, id: NodeId) -> DomResult<&mut String> {
        self.get_mut(id)
            .ok_or(DomError::NotFound)?
            .data
            .character_data_mut()
            .ok_or(DomError::NotSupported)
    }

    pub fn substring_data(&self, id: NodeId, offset: usize, count: usize) -> DomResult<String> {
        let data = self.char_data(id)?;
        Ok(data[byte_range(data, offset, count)?].to_owned())
    }

    pub fn append_data(&mut self, id: NodeId, arg: &str) -> DomResult<()> {
        self.char_data_mut(id)?.push_str(arg);
        Ok(())
    }

    pub fn insert_data(&mut self, id: NodeId, offset: usize, arg: &str) -> DomResult<()> {
        let data = self.char_data_mut(id)?;
        let at = byte_range(data, offset, 0)?.start;
        data.insert_str(at, arg);
        Ok(())
    }

    pub fn delete_data(&mut self, id: NodeId, offset: usize, count: usize) -> DomResult<()> {
        self.replace_data(id, offset, count, "")
    }

    pub fn replace_data(&mut self, id: NodeId, offset: usize, count: usize, arg: &str) -> DomResult<()> {
        let data = self.char_data_mut(id)?;
        let range = byte_range(data, offset, count)?;
        data.replace_range(range, arg);
        Ok(())
    }

    /// Split a Text or CDATA node at `offset`. The tail moves into a new
    /// node of the same kind, inserted right after this one.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> DomResult<NodeId> {
        let entry = self.entry(id)?;
        let (data, is_cdata) = match &entry.data {
            NodeData::Text(s) => (s, false),
            NodeData::CData(s) => (s, true),
            _ => return Err(DomError::NotSupported),
        };
        let at = byte_range(data, offset, 0)?.start;
        let Some(parent) = entry.parent else {
            tracing::debug!("split_text: {:?} has no parent", id);
            return Err(DomError::NotFound);
        };
        let next = self.next_sibling(id);

        let tail = self.char_data_mut(id)?.split_off(at);
        let new_text = if is_cdata {
            self.alloc(NodeData::CData(tail), CDATA_SECTION_NAME)
        } else {
            self.alloc(NodeData::Text(tail), TEXT_NAME)
        };
        self.insert_before(parent, new_text, next)?;
        Ok(new_text)
    }

    /// Target of a processing instruction
    pub fn target(&self, id: NodeId) -> Option<String> {
        let entry = self.get(id)?;
        matches!(entry.data, NodeData::ProcessingInstruction { .. }).then(|| entry.node_name())
    }
}
