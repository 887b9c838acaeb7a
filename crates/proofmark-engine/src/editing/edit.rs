use std::ops::Range;

use serde::Serialize;

/// A single document mutation: delete `[from, to)` then insert `inserted_len` bytes at `from`.
///
/// Offsets are in the pre-edit flat offset space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Edit {
    pub from: usize,
    pub to: usize,
    pub inserted_len: usize,
}

impl Edit {
    pub fn new(from: usize, to: usize, inserted_len: usize) -> Self {
        Self {
            from,
            to,
            inserted_len,
        }
    }

    /// Pure insertion at `at`
    pub fn insert(at: usize, inserted_len: usize) -> Self {
        Self::new(at, at, inserted_len)
    }

    /// Pure deletion of `range`
    pub fn delete(range: Range<usize>) -> Self {
        Self::new(range.start, range.end, 0)
    }

    pub fn deleted_len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    /// True when the edit neither deletes nor inserts anything
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.inserted_len == 0
    }

    /// Range the inserted text occupies in the post-edit document
    pub fn inserted_range(&self) -> Range<usize> {
        self.from..self.from + self.inserted_len
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Invalid edit {from}..{to} for document of length {len}")]
    InvalidEdit { from: usize, to: usize, len: usize },
    #[error("Edit boundary {offset} does not fall on a character boundary")]
    NotCharBoundary { offset: usize },
}
