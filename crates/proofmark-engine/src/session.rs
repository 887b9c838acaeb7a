use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use crate::annotations::{Annotation, AnnotationId, AnnotationKind, AnnotationStore, Target};
use crate::decorations::{DecorationSet, compile};
use crate::editing::{Document, Edit, EditError, map_position};
use crate::interaction::{self, Correlator, HoverInfo, Intent, PointerEvent, Recompute};
use crate::scanning::{
    FindingPattern, LexicalOptions, LexicalScanner, ScanFailure, Scanner, builtin_patterns,
};
use crate::state::TransientState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Annotation {0} not found")]
    AnnotationNotFound(AnnotationId),
    #[error("Annotation {0} does not cover any text")]
    NotASpan(AnnotationId),
    #[error(transparent)]
    Edit(#[from] EditError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub patterns: Vec<FindingPattern>,
    pub lexical: LexicalOptions,
    /// Run every scanner again after each document change
    pub rescan_on_edit: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            patterns: builtin_patterns(),
            lexical: LexicalOptions::default(),
            rescan_on_edit: true,
        }
    }
}

/// Result of a document change made through the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub edit: Edit,
    /// Annotations the edit invalidated, not counting an accepted one
    pub dropped: Vec<AnnotationId>,
    pub new_selection: Range<usize>,
    pub version: u64,
}

/// One editing session: a document, its annotations and the decorations
/// compiled from them.
///
/// Every public mutation runs the whole pipeline (edit, remap, rescan,
/// compile) before returning, so [`Session::decorations`] always describes
/// the current document.
pub struct Session {
    document: Document,
    store: AnnotationStore,
    state: TransientState,
    correlator: Correlator,
    scanners: Vec<Box<dyn Scanner + Send>>,
    /// `(kind, matched_text)` pairs the user chose to ignore
    ignored: HashSet<(AnnotationKind, String)>,
    /// Ids produced by the last scan; every other entry came from outside
    scanned: HashSet<AnnotationId>,
    rescan_on_edit: bool,
    failures: Vec<ScanFailure>,
    decorations: DecorationSet,
}

/// Session over `text` with the built-in patterns
pub fn create_session(text: &str) -> Session {
    Session::new(text, SessionConfig::default())
}

impl Session {
    pub fn new(text: &str, config: SessionConfig) -> Self {
        Self::from_document(Document::from_text(text), config)
    }

    pub fn from_document(document: Document, config: SessionConfig) -> Self {
        let lexical = LexicalScanner::new(config.patterns, config.lexical);
        let mut session = Self {
            document,
            store: AnnotationStore::new(),
            state: TransientState::default(),
            correlator: Correlator::new(),
            scanners: vec![Box::new(lexical)],
            ignored: HashSet::new(),
            scanned: HashSet::new(),
            rescan_on_edit: config.rescan_on_edit,
            failures: Vec::new(),
            decorations: DecorationSet::default(),
        };
        session.rescan();
        session
    }

    /// Register another scanner and rescan with it included
    pub fn add_scanner(&mut self, scanner: impl Scanner + Send + 'static) {
        self.scanners.push(Box::new(scanner));
        self.rescan();
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    pub fn selection(&self) -> Range<usize> {
        self.state.selection()
    }

    /// Caret offset, the head of the selection
    pub fn caret(&self) -> usize {
        self.state.head()
    }

    pub fn is_streaming(&self) -> bool {
        self.state.is_streaming()
    }

    pub fn hovered(&self) -> Option<&AnnotationId> {
        self.correlator.hovered()
    }

    /// Failures reported by the most recent scan pass
    pub fn scan_failures(&self) -> &[ScanFailure] {
        &self.failures
    }

    /// Document version, bumped by every change
    pub fn version(&self) -> u64 {
        self.document.version()
    }

    /// Replace `range` with `text`.
    ///
    /// On error nothing changes: not the document, the annotations nor the
    /// decorations.
    pub fn apply_edit(&mut self, range: Range<usize>, text: &str) -> Result<Patch, EditError> {
        let (document, edit) = self.document.apply_edit(range, text)?;
        let dropped = self.store.remap_all(&edit, &document);
        self.state.map_selection(|pos| map_position(pos, &edit));
        Ok(self.commit(document, edit, dropped))
    }

    /// Apply the suggestion of `id`; the caret lands after the inserted text
    pub fn accept_suggestion(&mut self, id: &AnnotationId) -> Result<Patch, SessionError> {
        let before: HashSet<AnnotationId> =
            self.store.all().iter().map(|a| a.id.clone()).collect();
        let (document, edit) =
            interaction::accept_suggestion(&self.document, &mut self.store, id)
                .inspect_err(|error| log::debug!("accept failed: {error}"))?;
        let dropped = before
            .into_iter()
            .filter(|known| known != id && !self.store.contains(known))
            .collect();

        let caret = edit.inserted_range().end;
        self.state.set_selection(caret..caret);
        Ok(self.commit(document, edit, dropped))
    }

    /// Remove `id` along with every other annotation of the same kind and text,
    /// and keep them from coming back
    pub fn ignore_suggestion(&mut self, id: &AnnotationId) -> Result<(), SessionError> {
        let removed = interaction::ignore_suggestion(&mut self.store, id)
            .inspect_err(|error| log::debug!("ignore failed: {error}"))?;
        let same: Vec<AnnotationId> = self
            .store
            .of_kind(removed.kind)
            .filter(|a| a.payload.matched_text == removed.payload.matched_text)
            .map(|a| a.id.clone())
            .collect();
        for other in &same {
            self.store.remove(other);
        }
        log::debug!(
            "ignoring {} {:?}, removed {} more",
            removed.kind,
            removed.payload.matched_text,
            same.len()
        );
        self.ignored.insert((removed.kind, removed.payload.matched_text));
        self.refresh();
        Ok(())
    }

    /// Remove `id` until the next rescan finds it again
    pub fn dismiss(&mut self, id: &AnnotationId) -> Result<(), SessionError> {
        interaction::dismiss(&mut self.store, id)
            .inspect_err(|error| log::debug!("dismiss failed: {error}"))?;
        self.refresh();
        Ok(())
    }

    /// Execute an intent produced by the correlator
    pub fn handle(&mut self, intent: Intent) -> Result<Option<Patch>, SessionError> {
        match intent {
            Intent::Accept(id) => self.accept_suggestion(&id).map(Some),
            Intent::Ignore(id) => self.ignore_suggestion(&id).map(|()| None),
            Intent::Dismiss(id) => self.dismiss(&id).map(|()| None),
        }
    }

    pub fn set_streaming(&mut self, streaming: bool) {
        let Recompute = self.correlator.set_streaming(&mut self.state, streaming);
        self.recompile();
    }

    /// Move the selection, clamped to the document and to char boundaries.
    ///
    /// `selection.end` is the caret; a backward range such as `10..3` selects
    /// `3..10` with the caret at 3.
    pub fn set_selection(&mut self, selection: Range<usize>) {
        let anchor = self.clamp_offset(selection.start);
        let head = self.clamp_offset(selection.end);
        self.state.set_selection(anchor..head);
        self.recompile();
    }

    /// Run every scanner over the current text and replace what the previous
    /// scan produced. Annotations supplied through
    /// [`Session::replace_annotations`] are kept.
    pub fn rescan(&mut self) {
        let text = self.document.text();
        let mut by_kind: BTreeMap<AnnotationKind, Vec<Annotation>> = BTreeMap::new();
        let mut failures = Vec::new();

        for scanner in &self.scanners {
            let kinds = scanner.kinds();
            for kind in kinds {
                by_kind.entry(*kind).or_default();
            }

            let report = scanner.scan(&text);
            failures.extend(report.failures);
            for annotation in report.annotations {
                if !kinds.contains(&annotation.kind) {
                    log::debug!(
                        "scanner produced undeclared kind {} for {}",
                        annotation.kind,
                        annotation.id
                    );
                    continue;
                }
                if let Some(annotation) = self.admit(annotation) {
                    by_kind.entry(annotation.kind).or_default().push(annotation);
                }
            }
        }

        for failure in &failures {
            log::warn!("scan of {:?} failed: {}", failure.source, failure.error);
        }
        let mut scanned = HashSet::new();
        for (kind, found) in by_kind {
            log::debug!("scan found {} {kind} annotation(s)", found.len());
            scanned.extend(found.iter().map(|a| a.id.clone()));
            let mut annotations: Vec<Annotation> = self
                .store
                .of_kind(kind)
                .filter(|a| !self.scanned.contains(&a.id))
                .cloned()
                .collect();
            annotations.extend(found);
            self.store.replace_all(kind, annotations);
        }
        self.scanned = scanned;
        self.failures = failures;
        self.correlator.sync(&self.store);
        self.recompile();
    }

    /// Swap every annotation of `kind` for findings produced outside the session.
    ///
    /// Spans that do not fit the document are skipped; an empty `matched_text`
    /// is filled in from the document. Later edits remap these findings like
    /// any other, and rescans leave them alone.
    pub fn replace_annotations(&mut self, kind: AnnotationKind, annotations: Vec<Annotation>) {
        let admitted: Vec<Annotation> = annotations
            .into_iter()
            .filter_map(|annotation| self.admit(annotation))
            .collect();
        for annotation in &admitted {
            self.scanned.remove(&annotation.id);
        }
        self.store.replace_all(kind, admitted);
        self.refresh();
    }

    pub fn on_hover(&mut self, event: &PointerEvent) -> Option<HoverInfo> {
        self.correlator.on_hover(event, &self.decorations, &self.store)
    }

    pub fn clear_hover(&mut self) {
        self.correlator.clear_hover();
    }

    /// Build an intent for the hovered annotation, e.g. `hovered_intent(Correlator::on_accept)`
    pub fn hovered_intent(
        &self,
        make: fn(&Correlator, AnnotationId) -> Intent,
    ) -> Option<Intent> {
        let id = self.correlator.hovered()?.clone();
        Some(make(&self.correlator, id))
    }

    fn commit(&mut self, document: Document, edit: Edit, dropped: Vec<AnnotationId>) -> Patch {
        self.document = document;
        let len = self.document.len();
        self.state.map_selection(|pos| pos.min(len));

        if self.rescan_on_edit {
            self.rescan();
        } else {
            self.refresh();
        }

        Patch {
            edit,
            dropped,
            new_selection: self.state.selection(),
            version: self.document.version(),
        }
    }

    fn refresh(&mut self) {
        self.correlator.sync(&self.store);
        self.recompile();
    }

    fn recompile(&mut self) {
        self.decorations = compile(&self.document, self.store.all(), &self.state);
    }

    /// Check an incoming annotation against the live document
    fn admit(&self, mut annotation: Annotation) -> Option<Annotation> {
        if let Target::Span(range) = &annotation.target {
            let Some(live) = self.document.text_in(range.clone()) else {
                log::warn!(
                    "dropping {}: range {range:?} does not fit the document",
                    annotation.id
                );
                return None;
            };
            if annotation.payload.matched_text.is_empty() {
                annotation.payload.matched_text = live.into_owned();
            } else if live != annotation.payload.matched_text {
                log::warn!("dropping {}: text at {range:?} has changed", annotation.id);
                return None;
            }
        }
        let key = (annotation.kind, annotation.payload.matched_text.clone());
        (!self.ignored.contains(&key)).then_some(annotation)
    }

    fn clamp_offset(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.document.len());
        while !self.document.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}
