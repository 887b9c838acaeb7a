pub mod annotations;
pub mod decorations;
pub mod editing;
pub mod interaction;
pub mod scanning;
pub mod session;
pub mod state;

// Re-export key types for easier usage
pub use annotations::{Annotation, AnnotationId, AnnotationKind, AnnotationStore, Payload, Target};
pub use decorations::{
    DecorationSet, InlineDecoration, WidgetDecoration, compile, format_decorations,
};
pub use editing::{Document, Edit, EditError};
pub use interaction::{Correlator, HoverInfo, Intent, PointerEvent};
pub use scanning::{
    FindingPattern, FnScanner, LexicalOptions, LexicalScanner, ScanReport, Scanner,
};
pub use session::{Patch, Session, SessionConfig, SessionError, create_session};
pub use state::TransientState;
