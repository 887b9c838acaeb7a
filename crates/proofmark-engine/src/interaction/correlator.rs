use serde::Serialize;

use crate::annotations::{Annotation, AnnotationId, AnnotationKind, AnnotationStore};
use crate::decorations::DecorationSet;
use crate::state::TransientState;

/// Where the pointer is, as reported by a front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerEvent {
    /// Over a text position; resolved by hit-testing the decorations
    Text { offset: usize },
    /// Over a rendered decoration that carried this id
    Decoration { id: AnnotationId },
}

/// What a tooltip needs to show for a hovered finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoverInfo {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    pub matched_text: String,
    pub suggestion: String,
    pub explanation: String,
    pub context_snippet: String,
}

impl From<&Annotation> for HoverInfo {
    fn from(annotation: &Annotation) -> Self {
        Self {
            id: annotation.id.clone(),
            kind: annotation.kind,
            matched_text: annotation.payload.matched_text.clone(),
            suggestion: annotation.payload.suggestion.clone(),
            explanation: annotation.payload.explanation.clone(),
            context_snippet: annotation.payload.context_snippet.clone(),
        }
    }
}

/// A user decision about one finding. Produced here, executed by the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Intent {
    Accept(AnnotationId),
    Ignore(AnnotationId),
    Dismiss(AnnotationId),
}

impl Intent {
    pub fn id(&self) -> &AnnotationId {
        match self {
            Intent::Accept(id) | Intent::Ignore(id) | Intent::Dismiss(id) => id,
        }
    }
}

/// Token returned by state changes that invalidate the current decorations
#[must_use = "decorations must be recompiled after this change"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recompute;

/// Maps pointer activity back to annotations and tracks the hovered one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlator {
    hovered: Option<AnnotationId>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<&AnnotationId> {
        self.hovered.as_ref()
    }

    /// Resolve a pointer event to the finding under it.
    ///
    /// Offsets hit-test the compiled inline decorations: the smallest covering
    /// decoration wins, earlier ones win ties. Ids are looked up in the store.
    /// Undecorated text and stale ids give `None` and clear the hover.
    pub fn on_hover(
        &mut self,
        event: &PointerEvent,
        decorations: &DecorationSet,
        store: &AnnotationStore,
    ) -> Option<HoverInfo> {
        let id = match event {
            PointerEvent::Text { offset } => decorations
                .inline_at(*offset)
                .min_by_key(|decoration| decoration.range.len())
                .map(|decoration| &decoration.id),
            PointerEvent::Decoration { id } => Some(id),
        };

        let annotation = id
            .and_then(|id| store.get(id))
            .filter(|annotation| annotation.range().is_some());
        if let (None, Some(id)) = (annotation, id) {
            log::debug!("hover over unknown annotation {id}");
        }

        self.hovered = annotation.map(|annotation| annotation.id.clone());
        annotation.map(HoverInfo::from)
    }

    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    /// Forget the hovered id if the store no longer has it
    pub fn sync(&mut self, store: &AnnotationStore) {
        if self.hovered.as_ref().is_some_and(|id| !store.contains(id)) {
            self.hovered = None;
        }
    }

    pub fn on_accept(&self, id: AnnotationId) -> Intent {
        Intent::Accept(id)
    }

    pub fn on_ignore(&self, id: AnnotationId) -> Intent {
        Intent::Ignore(id)
    }

    pub fn on_dismiss(&self, id: AnnotationId) -> Intent {
        Intent::Dismiss(id)
    }

    /// Turn the AI cursor on or off. This is the only writer of the streaming flag.
    pub fn set_streaming(&self, state: &mut TransientState, streaming: bool) -> Recompute {
        if state.is_streaming() != streaming {
            log::debug!("streaming {}", if streaming { "started" } else { "stopped" });
        }
        state.set_streaming(streaming);
        Recompute
    }
}
