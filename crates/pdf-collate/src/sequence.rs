//! The result sequence and the drag-transfer rules that mutate it.
//!
//! The sequence is an ordered, duplicate-tolerant list of [`PageId`]s; its
//! insertion order is the output page order. All drag gestures reach it as a
//! single classified [`DragTransfer`] value, so the engine is independent of
//! whatever input device or widget library produced the gesture.

use crate::types::PageId;

/// Where a drag started or ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DropRole {
    /// A source document's page list. Immutable via drag.
    Source,
    /// The result sequence under construction.
    Result,
}

/// A resolved drop location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropTarget {
    pub role: DropRole,
    pub index: usize,
}

/// One classified drag gesture.
///
/// `destination` is `None` when the drop landed outside every valid target.
/// For result-to-result moves the destination index is interpreted against
/// the list with the origin element already removed, so the moved item lands
/// exactly at the visually targeted slot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DragTransfer {
    pub origin: DropRole,
    pub origin_index: usize,
    pub destination: Option<DropTarget>,
    pub page: PageId,
}

/// What a transfer did to the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEffect {
    /// A source page was copied in; length +1.
    Inserted,
    /// An existing entry changed position; length unchanged.
    Moved,
    /// An entry was removed; length −1.
    Removed,
    /// Nothing happened.
    None,
}

/// Ordered list of page references, duplicates allowed.
///
/// Indices passed to the mutators must be valid for the current length;
/// an out-of-range index is a programming error and panics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSequence {
    pages: Vec<PageId>,
}

impl ResultSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<PageId> {
        self.pages.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = PageId> + '_ {
        self.pages.iter().copied()
    }

    pub fn as_slice(&self) -> &[PageId] {
        &self.pages
    }

    /// Copy of the current entries, for handing to an export that must not
    /// observe later mutations.
    pub fn snapshot(&self) -> Vec<PageId> {
        self.pages.clone()
    }

    /// Insert at `index`, shifting later entries right. `index == len()`
    /// appends.
    pub fn insert(&mut self, index: usize, page: PageId) {
        self.pages.insert(index, page);
    }

    /// Remove and return the entry at `index`.
    pub fn remove_at(&mut self, index: usize) -> PageId {
        self.pages.remove(index)
    }

    /// Move the entry at `from` so it ends up at `to`, where `to` is an
    /// index into the list with the origin entry removed.
    pub fn move_page(&mut self, from: usize, to: usize) {
        if from == to {
            return;
        }
        let page = self.pages.remove(from);
        self.pages.insert(to, page);
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Append a batch, preserving the given order.
    pub fn append_all(&mut self, pages: &[PageId]) {
        self.pages.extend_from_slice(pages);
    }
}

/// Apply one classified drag gesture to the sequence.
///
/// Dispatch is keyed on the origin and destination roles. Only gestures
/// that involve the result mutate it; a result-originated drag that ends
/// nowhere (or on a source panel) removes its entry.
pub fn apply_transfer(sequence: &mut ResultSequence, transfer: &DragTransfer) -> TransferEffect {
    match (transfer.origin, transfer.destination) {
        // Dropped outside any valid target: drag-to-delete from the result,
        // nothing for a drag that started in a source.
        (DropRole::Result, None) => {
            sequence.remove_at(transfer.origin_index);
            TransferEffect::Removed
        }
        (DropRole::Source, None) => TransferEffect::None,

        (DropRole::Source, Some(target)) => match target.role {
            DropRole::Result => {
                sequence.insert(target.index, transfer.page);
                TransferEffect::Inserted
            }
            // Source page lists are immutable via drag.
            DropRole::Source => TransferEffect::None,
        },

        (DropRole::Result, Some(target)) => match target.role {
            DropRole::Result => {
                if transfer.origin_index == target.index {
                    TransferEffect::None
                } else {
                    sequence.move_page(transfer.origin_index, target.index);
                    TransferEffect::Moved
                }
            }
            // Dragging out of the result removes the entry; the source
            // collection itself is never touched.
            DropRole::Source => {
                sequence.remove_at(transfer.origin_index);
                TransferEffect::Removed
            }
        },
    }
}
