use std::ops::Range;

/// Editor state that is not part of the document or the annotation store.
///
/// The selection is kept as anchor and head, so a backward selection
/// (`10..3`) reports `3..10` from [`TransientState::selection`] while the
/// caret stays at its head, 3.
///
/// The streaming flag has no public setter: it only changes through
/// [`crate::interaction::Correlator::set_streaming`], which also signals that
/// decorations must be recomputed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransientState {
    anchor: usize,
    head: usize,
    streaming: bool,
}

impl TransientState {
    pub fn new(selection: Range<usize>) -> Self {
        Self {
            anchor: selection.start,
            head: selection.end,
            streaming: false,
        }
    }

    /// Selected range, always forward
    pub fn selection(&self) -> Range<usize> {
        self.anchor.min(self.head)..self.anchor.max(self.head)
    }

    /// Caret position: the head of the selection
    pub fn head(&self) -> usize {
        self.head
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Set anchor to `selection.start` and head to `selection.end`; either order is fine
    pub fn set_selection(&mut self, selection: Range<usize>) {
        self.anchor = selection.start;
        self.head = selection.end;
    }

    /// Move both ends of the selection through `f`
    pub fn map_selection(&mut self, f: impl Fn(usize) -> usize) {
        self.anchor = f(self.anchor);
        self.head = f(self.head);
    }

    pub(crate) fn set_streaming(&mut self, streaming: bool) {
        self.streaming = streaming;
    }
}
