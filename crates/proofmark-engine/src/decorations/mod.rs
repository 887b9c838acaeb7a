//! # Decorations
//!
//! Render-only overlays compiled from the annotation store and transient
//! editor state. A [`DecorationSet`] is rebuilt whenever the document,
//! the store or the streaming flag changes; nothing ever patches one.

pub mod compiler;
pub mod set;

pub use compiler::compile;
pub use set::{
    DecorationSet, InlineDecoration, Segment, StyleKind, WidgetDecoration, WidgetKind,
    format_decorations,
};
