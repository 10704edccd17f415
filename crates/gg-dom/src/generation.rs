//! Slot generations
//!
//! Every arena slot carries a generation counter that is bumped when the
//! slot is reclaimed. A `NodeId` taken before reclamation keeps the old
//! generation and no longer resolves, so stale ids are detected instead of
//! aliasing whatever node reuses the slot.

use std::sync::atomic::{AtomicU32, Ordering};

/// Generation counter of an arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Generation(u32);

impl Generation {
    /// Generation of a slot that was never reclaimed
    pub const INITIAL: Self = Generation(0);

    /// Get the raw value
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Get the next generation
    #[inline]
    pub const fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::INITIAL
    }
}

static NEXT_DOCUMENT: AtomicU32 = AtomicU32::new(1);

/// Allocate a process-unique document identity
pub(crate) fn next_document_id() -> u32 {
    NEXT_DOCUMENT.fetch_add(1, Ordering::Relaxed)
}
