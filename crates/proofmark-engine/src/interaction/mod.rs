//! # Interaction
//!
//! The way back from the rendered view to the model. The [`Correlator`]
//! resolves pointer activity to annotations and turns user decisions into
//! [`Intent`]s; the [`applier`] functions execute them against a document
//! and an annotation store.

pub mod applier;
pub mod correlator;

pub use applier::{accept_suggestion, dismiss, ignore_suggestion};
pub use correlator::{Correlator, HoverInfo, Intent, PointerEvent, Recompute};
