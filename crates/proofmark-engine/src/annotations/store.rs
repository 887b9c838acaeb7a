use std::collections::HashSet;

use crate::annotations::{Annotation, AnnotationId, AnnotationKind, Target};
use crate::editing::{Document, Edit, map_position, map_range};

/// Keyed collection of annotations, kept sorted by start offset then id.
///
/// Entries are weak references into the document: plain offsets that must be
/// replayed through every edit with [`AnnotationStore::remap_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    entries: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically swap every annotation of `kind` for `annotations`.
    ///
    /// Entries of another kind in `annotations` are skipped, as are ids that
    /// are already taken (first one wins).
    pub fn replace_all(&mut self, kind: AnnotationKind, annotations: Vec<Annotation>) {
        self.entries.retain(|entry| entry.kind != kind);

        let mut seen: HashSet<AnnotationId> =
            self.entries.iter().map(|entry| entry.id.clone()).collect();
        for annotation in annotations {
            if annotation.kind != kind {
                log::debug!(
                    "skipping {} annotation {} in {kind} replacement",
                    annotation.kind,
                    annotation.id
                );
                continue;
            }
            if seen.insert(annotation.id.clone()) {
                self.entries.push(annotation);
            }
        }

        self.sort();
    }

    /// Replay `edit` over every entry, dropping the ones it invalidated.
    ///
    /// `document` must be the post-edit document. A span is dropped when it
    /// collapses or when the live text at its new range differs from its
    /// recorded `matched_text`. Returns the ids that were dropped.
    pub fn remap_all(&mut self, edit: &Edit, document: &Document) -> Vec<AnnotationId> {
        let mut dropped = Vec::new();
        let entries = std::mem::take(&mut self.entries);

        for annotation in entries {
            let target = match &annotation.target {
                Target::Span(range) => {
                    let mapped = map_range(range, edit);
                    let live = document.text_in(mapped.range.clone());
                    if mapped.collapsed
                        || live.as_deref() != Some(annotation.payload.matched_text.as_str())
                    {
                        dropped.push(annotation.id);
                        continue;
                    }
                    Target::Span(mapped.range)
                }
                Target::Caret(pos) => {
                    Target::Caret(map_position(*pos, edit).min(document.len()))
                }
            };
            self.entries.push(annotation.retargeted(target));
        }

        if !dropped.is_empty() {
            log::debug!("edit {edit:?} invalidated {} annotation(s)", dropped.len());
        }
        self.sort();
        dropped
    }

    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn contains(&self, id: &AnnotationId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: &AnnotationId) -> Option<Annotation> {
        let index = self.entries.iter().position(|entry| &entry.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Every annotation, sorted by start offset then id
    pub fn all(&self) -> &[Annotation] {
        &self.entries
    }

    pub fn of_kind(&self, kind: AnnotationKind) -> impl Iterator<Item = &Annotation> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::Payload;
    use pretty_assertions::assert_eq;

    fn finding(
        id: &str,
        kind: AnnotationKind,
        doc: &Document,
        range: std::ops::Range<usize>,
    ) -> Annotation {
        Annotation::span(
            id,
            kind,
            range.clone(),
            Payload {
                matched_text: doc.slice(range).into_owned(),
                ..Payload::default()
            },
        )
    }

    fn ids(store: &AnnotationStore) -> Vec<&str> {
        store.all().iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_all_sorted_by_start_then_id() {
        let doc = Document::from_text("alpha beta gamma");
        let mut store = AnnotationStore::new();
        store.replace_all(
            AnnotationKind::Spelling,
            vec![
                finding("s-gamma", AnnotationKind::Spelling, &doc, 11..16),
                finding("s-b", AnnotationKind::Spelling, &doc, 0..5),
                finding("s-a", AnnotationKind::Spelling, &doc, 0..5),
            ],
        );
        store.replace_all(
            AnnotationKind::Grammar,
            vec![finding("g-beta", AnnotationKind::Grammar, &doc, 6..10)],
        );

        assert_eq!(ids(&store), vec!["s-a", "s-b", "g-beta", "s-gamma"]);
    }

    #[test]
    fn test_replace_all_only_touches_one_kind() {
        let doc = Document::from_text("alpha beta gamma");
        let mut store = AnnotationStore::new();
        store.replace_all(
            AnnotationKind::Spelling,
            vec![finding("s1", AnnotationKind::Spelling, &doc, 0..5)],
        );
        store.replace_all(
            AnnotationKind::Grammar,
            vec![finding("g1", AnnotationKind::Grammar, &doc, 6..10)],
        );
        store.replace_all(
            AnnotationKind::Spelling,
            vec![finding("s2", AnnotationKind::Spelling, &doc, 11..16)],
        );

        assert_eq!(ids(&store), vec!["g1", "s2"]);
        assert_eq!(store.of_kind(AnnotationKind::Spelling).count(), 1);
    }

    #[test]
    fn test_replace_all_skips_foreign_kinds_and_duplicate_ids() {
        let doc = Document::from_text("alpha beta");
        let mut store = AnnotationStore::new();
        store.replace_all(
            AnnotationKind::Spelling,
            vec![
                finding("x", AnnotationKind::Spelling, &doc, 0..5),
                finding("x", AnnotationKind::Spelling, &doc, 6..10),
                finding("g", AnnotationKind::Grammar, &doc, 6..10),
            ],
        );

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&"x".into()).unwrap().range(), Some(0..5));
    }

    #[test]
    fn test_remap_shifts_survivors_and_drops_edited_text() {
        let doc = Document::from_text("teh cat and teh dog");
        let mut store = AnnotationStore::new();
        store.replace_all(
            AnnotationKind::Spelling,
            vec![
                finding("first", AnnotationKind::Spelling, &doc, 0..3),
                finding("second", AnnotationKind::Spelling, &doc, 12..15),
            ],
        );

        // rewrite the first occurrence, shortening the text before the second
        let (doc, edit) = doc.apply_edit(0..3, "a").unwrap();
        let dropped = store.remap_all(&edit, &doc);

        assert_eq!(dropped, vec![AnnotationId::from("first")]);
        assert_eq!(store.len(), 1);
        let second = store.get(&"second".into()).unwrap();
        assert_eq!(second.range(), Some(10..13));
        assert_eq!(doc.slice(10..13), "teh");
    }

    #[test]
    fn test_remap_drops_collapsed_range() {
        let doc = Document::from_text("one teh two");
        let mut store = AnnotationStore::new();
        store.replace_all(
            AnnotationKind::Spelling,
            vec![finding("teh", AnnotationKind::Spelling, &doc, 4..7)],
        );

        let (doc, edit) = doc.apply_edit(2..9, "").unwrap();
        assert_eq!(store.remap_all(&edit, &doc), vec![AnnotationId::from("teh")]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remap_drops_range_whose_text_changed_inside() {
        // [5,12) shrinks to [5,9) after deleting [7,10): still open, but stale
        let doc = Document::from_text("0123456789abcdef");
        let mut store = AnnotationStore::new();
        store.replace_all(
            AnnotationKind::Grammar,
            vec![finding("g", AnnotationKind::Grammar, &doc, 5..12)],
        );

        let (doc, edit) = doc.apply_edit(7..10, "").unwrap();
        assert_eq!(store.remap_all(&edit, &doc).len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remap_moves_caret() {
        let doc = Document::from_text("hello");
        let mut store = AnnotationStore::new();
        store.replace_all(AnnotationKind::AiCursor, vec![Annotation::caret("cursor", 5)]);

        let (doc, edit) = doc.apply_edit(0..0, ">> ").unwrap();
        assert!(store.remap_all(&edit, &doc).is_empty());
        assert_eq!(store.all()[0].target, Target::Caret(8));
    }

    #[test]
    fn test_remove_and_contains() {
        let doc = Document::from_text("alpha");
        let mut store = AnnotationStore::new();
        store.replace_all(
            AnnotationKind::Spelling,
            vec![finding("a", AnnotationKind::Spelling, &doc, 0..5)],
        );

        assert!(store.contains(&"a".into()));
        assert!(store.remove(&"a".into()).is_some());
        assert!(store.remove(&"a".into()).is_none());
        assert!(!store.contains(&"a".into()));
    }
}
