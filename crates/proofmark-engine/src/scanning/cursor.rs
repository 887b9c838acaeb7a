use crate::annotations::Annotation;
use crate::state::TransientState;

/// Id of the single AI cursor marker
pub const CURSOR_MARKER_ID: &str = "ai-cursor";

/// The AI "currently writing" marker: present only while streaming, at the caret.
///
/// Derived from transient state alone, so it is recomputed on every state
/// change rather than stored.
pub fn cursor_marker(state: &TransientState) -> Option<Annotation> {
    state
        .is_streaming()
        .then(|| Annotation::caret(CURSOR_MARKER_ID, state.head()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{AnnotationKind, Target};

    #[test]
    fn test_no_marker_when_idle() {
        let state = TransientState::new(3..10);
        assert_eq!(cursor_marker(&state), None);
    }

    #[test]
    fn test_marker_follows_selection_head() {
        let mut state = TransientState::new(3..10);
        state.set_streaming(true);

        let marker = cursor_marker(&state).unwrap();
        assert_eq!(marker.kind, AnnotationKind::AiCursor);
        assert_eq!(marker.target, Target::Caret(10));

        state.set_selection(12..12);
        assert_eq!(cursor_marker(&state).unwrap().target, Target::Caret(12));
    }
}
