use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::annotations::{Annotation, AnnotationId, AnnotationKind, Payload};
use crate::scanning::{FindingPattern, ScanError, ScanFailure, ScanReport, Scanner};

/// Compiled program size cap per pattern
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalOptions {
    /// Match phrases regardless of letter case
    pub case_insensitive: bool,
    /// Bytes of surrounding text kept on each side of a match for the context snippet
    pub context_radius: usize,
}

impl Default for LexicalOptions {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            context_radius: 24,
        }
    }
}

/// Literal phrase matcher with word-boundary validation.
///
/// A candidate match is kept only when it is not glued to a word character:
/// "has" matches in "The team has left." but not inside "chase".
pub struct LexicalScanner {
    patterns: Vec<(FindingPattern, Result<Regex, ScanError>)>,
    options: LexicalOptions,
}

impl LexicalScanner {
    const KINDS: [AnnotationKind; 2] = [AnnotationKind::Spelling, AnnotationKind::Grammar];

    pub fn new(patterns: Vec<FindingPattern>, options: LexicalOptions) -> Self {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let compiled = compile_pattern(&pattern, &options);
                (pattern, compiled)
            })
            .collect();
        Self { patterns, options }
    }

    pub fn patterns(&self) -> impl Iterator<Item = &FindingPattern> {
        self.patterns.iter().map(|(pattern, _)| pattern)
    }

    pub fn options(&self) -> &LexicalOptions {
        &self.options
    }

    fn scan_pattern(
        &self,
        pattern: &FindingPattern,
        regex: &Regex,
        text: &str,
    ) -> Vec<Annotation> {
        find_bounded(regex, &pattern.phrase, text)
            .into_iter()
            .map(|range| {
                let matched = &text[range.clone()];
                let suggestion = if self.options.case_insensitive {
                    match_leading_case(matched, &pattern.suggestion)
                } else {
                    pattern.suggestion.clone()
                };
                Annotation::span(
                    finding_id(pattern, range.start),
                    pattern.kind,
                    range.clone(),
                    Payload {
                        matched_text: matched.to_string(),
                        suggestion,
                        explanation: pattern.explanation.clone(),
                        context_snippet: context_snippet(text, range, self.options.context_radius),
                    },
                )
            })
            .collect()
    }
}

impl Scanner for LexicalScanner {
    fn kinds(&self) -> &[AnnotationKind] {
        &Self::KINDS
    }

    fn scan(&self, text: &str) -> ScanReport {
        let mut report = ScanReport::default();
        for (pattern, compiled) in &self.patterns {
            match compiled {
                Ok(regex) => report
                    .annotations
                    .extend(self.scan_pattern(pattern, regex, text)),
                Err(error) => report.failures.push(ScanFailure {
                    source: pattern.phrase.clone(),
                    error: error.clone(),
                }),
            }
        }
        report
    }
}

fn compile_pattern(
    pattern: &FindingPattern,
    options: &LexicalOptions,
) -> Result<Regex, ScanError> {
    if pattern.phrase.is_empty() {
        return Err(ScanError::EmptyPhrase);
    }
    if pattern.kind == AnnotationKind::AiCursor {
        return Err(ScanError::UnsupportedKind(pattern.kind));
    }
    Ok(RegexBuilder::new(&regex::escape(&pattern.phrase))
        .case_insensitive(options.case_insensitive)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()?)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// All matches of `regex` in `text` that are not glued to a word character.
///
/// The check only applies on sides where the phrase itself starts or ends
/// with a word character. A rejected candidate resumes one char later so an
/// overlapping valid occurrence is still found.
fn find_bounded(regex: &Regex, phrase: &str, text: &str) -> Vec<Range<usize>> {
    let check_before = phrase.chars().next().is_some_and(is_word_char);
    let check_after = phrase.chars().next_back().is_some_and(is_word_char);

    let mut out = Vec::new();
    let mut at = 0;
    while at <= text.len() {
        let Some(found) = regex.find_at(text, at) else {
            break;
        };
        if found.is_empty() {
            break;
        }
        let glued_before =
            check_before && text[..found.start()].chars().next_back().is_some_and(is_word_char);
        let glued_after =
            check_after && text[found.end()..].chars().next().is_some_and(is_word_char);

        if glued_before || glued_after {
            let step = text[found.start()..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            at = found.start() + step;
        } else {
            out.push(found.range());
            at = found.end();
        }
    }
    out
}

/// Stable id from kind, position and pattern content
fn finding_id(pattern: &FindingPattern, start: usize) -> AnnotationId {
    let mut hasher = DefaultHasher::new();
    pattern.phrase.hash(&mut hasher);
    pattern.suggestion.hash(&mut hasher);
    pattern.explanation.hash(&mut hasher);
    AnnotationId(format!("{}-{start}-{:016x}", pattern.kind, hasher.finish()))
}

/// Capitalize the suggestion when the matched text starts with a capital
fn match_leading_case(matched: &str, suggestion: &str) -> String {
    let starts_upper = matched.chars().next().is_some_and(char::is_uppercase);
    let mut chars = suggestion.chars();
    match chars.next() {
        Some(first) if starts_upper && first.is_lowercase() => {
            first.to_uppercase().chain(chars).collect()
        }
        _ => suggestion.to_string(),
    }
}

/// The match with up to `radius` bytes of its line on each side
fn context_snippet(text: &str, range: Range<usize>, radius: usize) -> String {
    let line_start = text[..range.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[range.end..]
        .find('\n')
        .map_or(text.len(), |i| range.end + i);

    let mut start = range.start.saturating_sub(radius).max(line_start);
    while !text.is_char_boundary(start) {
        start += 1;
    }
    let mut end = (range.end + radius).min(line_end);
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    let mut snippet = String::new();
    if start > line_start {
        snippet.push('…');
    }
    snippet.push_str(text[start..end].trim());
    if end < line_end {
        snippet.push('…');
    }
    snippet
}
