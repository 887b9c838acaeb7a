use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// What a finding is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationKind {
    Spelling,
    Grammar,
    AiCursor,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Spelling => "spelling",
            AnnotationKind::Grammar => "grammar",
            AnnotationKind::AiCursor => "ai-cursor",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for an annotation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(pub String);

impl AnnotationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AnnotationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Where an annotation points in the flat offset space
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    /// A range of text `[from, to)`
    Span(Range<usize>),
    /// A single position, used by the AI cursor marker
    Caret(usize),
}

impl Target {
    pub fn start(&self) -> usize {
        match self {
            Target::Span(range) => range.start,
            Target::Caret(pos) => *pos,
        }
    }

    /// The covered range, empty for a caret
    pub fn range(&self) -> Range<usize> {
        match self {
            Target::Span(range) => range.clone(),
            Target::Caret(pos) => *pos..*pos,
        }
    }
}

/// Human-facing details of a finding
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Payload {
    pub matched_text: String,
    pub suggestion: String,
    pub explanation: String,
    pub context_snippet: String,
}

/// A logical finding, independent of how it is rendered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    pub target: Target,
    pub payload: Payload,
}

impl Annotation {
    pub fn span(
        id: impl Into<AnnotationId>,
        kind: AnnotationKind,
        range: Range<usize>,
        payload: Payload,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            target: Target::Span(range),
            payload,
        }
    }

    pub fn caret(id: impl Into<AnnotationId>, at: usize) -> Self {
        Self {
            id: id.into(),
            kind: AnnotationKind::AiCursor,
            target: Target::Caret(at),
            payload: Payload::default(),
        }
    }

    /// The text range for span annotations
    pub fn range(&self) -> Option<Range<usize>> {
        match &self.target {
            Target::Span(range) => Some(range.clone()),
            Target::Caret(_) => None,
        }
    }

    /// Copy of this annotation pointing somewhere else
    pub fn retargeted(&self, target: Target) -> Self {
        Self {
            target,
            ..self.clone()
        }
    }

    /// Sort key: position first, id for ties
    pub(crate) fn order_key(&self) -> (usize, &AnnotationId) {
        (self.target.start(), &self.id)
    }
}
