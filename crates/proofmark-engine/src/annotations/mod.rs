//! # Annotations
//!
//! Logical findings (spelling, grammar, the AI cursor marker) and the store
//! that keeps them aligned with the document. An [`Annotation`] is never
//! mutated in place: remapping produces a retargeted copy and a rescan
//! replaces every annotation of a kind at once.

pub mod annotation;
pub mod store;

pub use annotation::{Annotation, AnnotationId, AnnotationKind, Payload, Target};
pub use store::AnnotationStore;
