//! # Scanning
//!
//! Scanners are pure functions from flattened document text to annotations.
//! The matching strategy is pluggable through the [`Scanner`] trait;
//! [`LexicalScanner`] is the built-in phrase matcher and [`FnScanner`] wraps a
//! closure. A scan never aborts as a whole: a failing pattern is reported in
//! [`ScanReport::failures`] and contributes nothing to that pass.
//!
//! The AI cursor marker is not text based, see [`cursor_marker`].

pub mod cursor;
pub mod lexical;
pub mod pattern;

use crate::annotations::{Annotation, AnnotationKind};

pub use cursor::{CURSOR_MARKER_ID, cursor_marker};
pub use lexical::{LexicalOptions, LexicalScanner};
pub use pattern::{FindingPattern, builtin_patterns};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("Pattern phrase is empty")]
    EmptyPhrase,
    #[error("Pattern kind {0} cannot be produced by text scanning")]
    UnsupportedKind(AnnotationKind),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
    #[error("Scan failed: {0}")]
    Failed(String),
}

/// One pattern or scanner that failed during a pass
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFailure {
    /// Which pattern (or scanner) failed
    pub source: String,
    pub error: ScanError,
}

/// Output of one scan pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub annotations: Vec<Annotation>,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    pub fn from_annotations(annotations: Vec<Annotation>) -> Self {
        Self {
            annotations,
            failures: Vec::new(),
        }
    }

    pub fn failed(source: impl Into<String>, error: ScanError) -> Self {
        Self {
            annotations: Vec::new(),
            failures: vec![ScanFailure {
                source: source.into(),
                error,
            }],
        }
    }

    pub fn merge(&mut self, other: ScanReport) {
        self.annotations.extend(other.annotations);
        self.failures.extend(other.failures);
    }
}

/// Produces annotations from flattened text, without side effects
pub trait Scanner {
    /// Kinds this scanner is authoritative for; a pass replaces all of them
    fn kinds(&self) -> &[AnnotationKind];

    fn scan(&self, text: &str) -> ScanReport;
}

/// A closure used as a scanner
pub struct FnScanner<F> {
    kinds: Vec<AnnotationKind>,
    scan: F,
}

impl<F> FnScanner<F>
where
    F: Fn(&str) -> ScanReport,
{
    pub fn new(kinds: impl IntoIterator<Item = AnnotationKind>, scan: F) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            scan,
        }
    }
}

impl<F> Scanner for FnScanner<F>
where
    F: Fn(&str) -> ScanReport,
{
    fn kinds(&self) -> &[AnnotationKind] {
        &self.kinds
    }

    fn scan(&self, text: &str) -> ScanReport {
        (self.scan)(text)
    }
}
