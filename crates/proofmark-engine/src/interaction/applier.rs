use crate::annotations::{Annotation, AnnotationId, AnnotationStore};
use crate::editing::{Document, Edit};
use crate::session::SessionError;

/// Replace the annotated text with its suggestion as one edit.
///
/// The store is remapped through the edit, and the accepted annotation is
/// removed even if its text happened to survive. Returns the new document
/// and the edit applied.
pub fn accept_suggestion(
    document: &Document,
    store: &mut AnnotationStore,
    id: &AnnotationId,
) -> Result<(Document, Edit), SessionError> {
    let annotation = store
        .get(id)
        .ok_or_else(|| SessionError::AnnotationNotFound(id.clone()))?;
    let range = annotation
        .range()
        .ok_or_else(|| SessionError::NotASpan(id.clone()))?;
    let suggestion = annotation.payload.suggestion.clone();

    let (document, edit) = document.apply_edit(range, &suggestion)?;
    store.remap_all(&edit, &document);
    store.remove(id);

    log::debug!("accepted {id}: {edit:?}");
    Ok((document, edit))
}

/// Remove a finding without touching the document
pub fn ignore_suggestion(
    store: &mut AnnotationStore,
    id: &AnnotationId,
) -> Result<Annotation, SessionError> {
    remove(store, id)
}

/// Hide a finding without touching the document
pub fn dismiss(store: &mut AnnotationStore, id: &AnnotationId) -> Result<Annotation, SessionError> {
    remove(store, id)
}

fn remove(store: &mut AnnotationStore, id: &AnnotationId) -> Result<Annotation, SessionError> {
    store
        .remove(id)
        .ok_or_else(|| SessionError::AnnotationNotFound(id.clone()))
}
