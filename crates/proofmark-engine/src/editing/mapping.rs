//! Translating stored positions through an [`Edit`].
//!
//! Annotations hold plain offsets rather than references into the document,
//! so every edit has to be replayed over them. The rules here are exact:
//!
//! - a position at or before `edit.from` is unchanged
//! - a position at or after the original `edit.to` shifts by the size delta
//! - a position strictly inside the deleted span collapses to `edit.from`
//!
//! Mapping never fails. Whether a collapsed range should be dropped is a
//! policy of the caller (see [`crate::annotations::AnnotationStore::remap_all`]).

use std::ops::Range;

use crate::editing::Edit;

/// Map a single position through an edit
pub fn map_position(pos: usize, edit: &Edit) -> usize {
    if pos <= edit.from {
        pos
    } else if pos >= edit.to {
        pos - edit.deleted_len() + edit.inserted_len
    } else {
        edit.from
    }
}

/// Result of mapping a range through an edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRange {
    pub range: Range<usize>,
    /// A range that had positive length before the edit and has none after it
    pub collapsed: bool,
}

/// Map both ends of a range through an edit
pub fn map_range(range: &Range<usize>, edit: &Edit) -> MappedRange {
    let start = map_position(range.start, edit);
    let end = map_position(range.end, edit).max(start);
    MappedRange {
        collapsed: start == end && range.end > range.start,
        range: start..end,
    }
}
