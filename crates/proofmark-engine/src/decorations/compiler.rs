use crate::annotations::{Annotation, Target};
use crate::decorations::{DecorationSet, InlineDecoration, StyleKind, WidgetDecoration, WidgetKind};
use crate::editing::Document;
use crate::scanning::cursor_marker;
use crate::state::TransientState;

/// Build the full decoration set from scratch.
///
/// Span annotations of a text kind become inline decorations, clamped to the
/// document and kept in the order given (store order). Ranges that clamp to
/// nothing are skipped. The cursor widget is derived from `state` alone;
/// caret annotations in `annotations` are never rendered.
pub fn compile(
    document: &Document,
    annotations: &[Annotation],
    state: &TransientState,
) -> DecorationSet {
    let len = document.len();

    let inline = annotations
        .iter()
        .filter_map(|annotation| {
            let style = StyleKind::for_kind(annotation.kind)?;
            let Target::Span(range) = &annotation.target else {
                return None;
            };
            let start = range.start.min(len);
            let end = range.end.min(len).max(start);
            if start == end {
                log::trace!("not rendering empty range for {}", annotation.id);
                return None;
            }
            Some(InlineDecoration {
                range: start..end,
                style,
                kind: annotation.kind,
                id: annotation.id.clone(),
            })
        })
        .collect();

    let widget = cursor_marker(state).map(|marker| WidgetDecoration {
        at: marker.target.start().min(len),
        kind: WidgetKind::AiCursor,
    });

    DecorationSet { inline, widget }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{AnnotationKind, Payload};
    use crate::decorations::format_decorations;

    fn span(id: &str, kind: AnnotationKind, range: std::ops::Range<usize>) -> Annotation {
        Annotation::span(id, kind, range, Payload::default())
    }

    #[test]
    fn test_compile_snapshot() {
        let doc = Document::from_text("I will recieve the package.\nHe could of known.");
        let annotations = vec![
            span("s", AnnotationKind::Spelling, 7..14),
            span("g", AnnotationKind::Grammar, 31..39),
        ];
        let mut state = TransientState::new(10..10);
        state.set_streaming(true);

        let set = compile(&doc, &annotations, &state);

        insta::assert_snapshot!(format_decorations(&set, &doc.text()), @r#"
        SpellingUnderline [7..14] "recieve"
        GrammarUnderline [31..39] "could of"
        AiCursor @10
        "#);
    }

    #[test]
    fn test_streaming_toggle_only_changes_widget() {
        let doc = Document::from_text("I will recieve the package.");
        let annotations = vec![span("s", AnnotationKind::Spelling, 7..14)];
        let mut state = TransientState::new(10..10);

        state.set_streaming(true);
        let streaming = compile(&doc, &annotations, &state);
        assert_eq!(streaming.widgets().count(), 1);
        assert_eq!(streaming.widget().unwrap().at, 10);

        state.set_streaming(false);
        let idle = compile(&doc, &annotations, &state);
        assert_eq!(idle.widgets().count(), 0);
        assert_eq!(idle.inline(), streaming.inline());
    }

    #[test]
    fn test_out_of_range_annotations_are_clamped() {
        let doc = Document::from_text("short");
        let annotations = vec![
            span("over", AnnotationKind::Spelling, 3..40),
            span("past", AnnotationKind::Spelling, 20..30),
        ];
        let mut state = TransientState::new(50..50);
        state.set_streaming(true);

        let set = compile(&doc, &annotations, &state);
        assert_eq!(set.inline().len(), 1);
        assert_eq!(set.inline()[0].range, 3..5);
        assert_eq!(set.widget().unwrap().at, 5);
    }

    #[test]
    fn test_carets_and_cursor_kind_are_not_inline() {
        let doc = Document::from_text("hello world");
        let annotations = vec![
            Annotation::caret("cursor", 3),
            span("odd", AnnotationKind::AiCursor, 0..5),
        ];

        let set = compile(&doc, &annotations, &TransientState::default());
        assert!(set.is_empty());
    }

    #[test]
    fn test_overlaps_are_all_emitted_in_order() {
        let doc = Document::from_text("I could of known");
        let annotations = vec![
            span("a", AnnotationKind::Grammar, 2..10),
            span("b", AnnotationKind::Grammar, 8..10),
        ];

        let set = compile(&doc, &annotations, &TransientState::default());
        let ids: Vec<_> = set.inline_at(9).map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
