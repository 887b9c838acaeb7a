use std::ops::Range;

use serde::Serialize;

use crate::annotations::{AnnotationId, AnnotationKind};

/// How an inline decoration should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleKind {
    SpellingUnderline,
    GrammarUnderline,
}

impl StyleKind {
    pub fn for_kind(kind: AnnotationKind) -> Option<Self> {
        match kind {
            AnnotationKind::Spelling => Some(StyleKind::SpellingUnderline),
            AnnotationKind::Grammar => Some(StyleKind::GrammarUnderline),
            AnnotationKind::AiCursor => None,
        }
    }
}

/// Highlight over a range of text, tagged with the annotation it renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineDecoration {
    pub range: Range<usize>,
    pub style: StyleKind,
    pub kind: AnnotationKind,
    pub id: AnnotationId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    AiCursor,
}

/// Element drawn at a position rather than over text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetDecoration {
    pub at: usize,
    pub kind: WidgetKind,
}

/// A slice of the document with the inline decorations covering all of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub range: Range<usize>,
    /// Indices into [`DecorationSet::inline`]
    pub decorations: Vec<usize>,
}

/// Render-only output of the compiler. Never patched, always rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecorationSet {
    pub(crate) inline: Vec<InlineDecoration>,
    pub(crate) widget: Option<WidgetDecoration>,
}

impl DecorationSet {
    /// Inline decorations sorted by start offset, then annotation id
    pub fn inline(&self) -> &[InlineDecoration] {
        &self.inline
    }

    pub fn widget(&self) -> Option<&WidgetDecoration> {
        self.widget.as_ref()
    }

    pub fn widgets(&self) -> impl Iterator<Item = &WidgetDecoration> {
        self.widget.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.inline.is_empty() && self.widget.is_none()
    }

    /// Inline decorations whose range contains `offset`
    pub fn inline_at(&self, offset: usize) -> impl Iterator<Item = &InlineDecoration> {
        self.inline
            .iter()
            .filter(move |decoration| decoration.range.contains(&offset))
    }

    /// Split `[0, len)` at every decoration boundary.
    ///
    /// Each segment lists the decorations covering it, so a renderer can draw
    /// overlaps however it likes.
    pub fn segments(&self, len: usize) -> Vec<Segment> {
        let mut cuts = vec![0, len];
        for decoration in &self.inline {
            cuts.push(decoration.range.start.min(len));
            cuts.push(decoration.range.end.min(len));
        }
        cuts.sort_unstable();
        cuts.dedup();

        cuts.windows(2)
            .map(|pair| {
                let range = pair[0]..pair[1];
                let decorations = self
                    .inline
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| d.range.start <= range.start && range.end <= d.range.end)
                    .map(|(index, _)| index)
                    .collect();
                Segment { range, decorations }
            })
            .collect()
    }
}

/// Format a decoration set as a readable string for snapshot testing
pub fn format_decorations(set: &DecorationSet, text: &str) -> String {
    let mut lines: Vec<String> = set
        .inline
        .iter()
        .map(|decoration| {
            let covered = text.get(decoration.range.clone()).unwrap_or("<out of range>");
            format!(
                "{:?} [{}..{}] {:?}",
                decoration.style, decoration.range.start, decoration.range.end, covered
            )
        })
        .collect();
    if let Some(widget) = &set.widget {
        lines.push(format!("{:?} @{}", widget.kind, widget.at));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoration(range: Range<usize>, id: &str) -> InlineDecoration {
        InlineDecoration {
            range,
            style: StyleKind::SpellingUnderline,
            kind: AnnotationKind::Spelling,
            id: id.into(),
        }
    }

    #[test]
    fn test_segments_cover_document_and_list_overlaps() {
        let set = DecorationSet {
            inline: vec![decoration(2..6, "a"), decoration(4..8, "b")],
            widget: None,
        };

        let segments: Vec<_> = set
            .segments(10)
            .into_iter()
            .map(|s| (s.range, s.decorations))
            .collect();
        assert_eq!(
            segments,
            vec![
                (0..2, vec![]),
                (2..4, vec![0]),
                (4..6, vec![0, 1]),
                (6..8, vec![1]),
                (8..10, vec![]),
            ]
        );
    }

    #[test]
    fn test_segments_of_empty_set() {
        let set = DecorationSet::default();
        assert_eq!(set.segments(0), vec![]);
        assert_eq!(
            set.segments(3),
            vec![Segment {
                range: 0..3,
                decorations: vec![]
            }]
        );
    }

    #[test]
    fn test_inline_at_is_half_open() {
        let set = DecorationSet {
            inline: vec![decoration(2..6, "a")],
            widget: None,
        };
        assert_eq!(set.inline_at(2).count(), 1);
        assert_eq!(set.inline_at(5).count(), 1);
        assert_eq!(set.inline_at(6).count(), 0);
    }
}
