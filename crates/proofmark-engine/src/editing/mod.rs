/*!
 * # Editing Core
 *
 * The document model and the arithmetic that keeps stored offsets valid
 * across edits.
 *
 * ## Flat Offset Space
 *
 * A [`Document`] is a forest of blocks. Leaf blocks hold text runs,
 * container blocks hold other blocks. Linearizing the leaves in document
 * order, joined by a single `'\n'`, gives the flat text every other part of
 * the engine addresses: scanners search it, annotations point into it and
 * decorations are expressed in it. Offsets are UTF-8 byte offsets.
 *
 * ## Edits
 *
 * Every change is a single [`Edit`] (delete `[from, to)`, insert
 * `inserted_len` bytes). [`Document::apply_edit`] returns a new document and
 * the clamped edit it actually applied; [`mapping`] replays that edit over
 * any stored position.
 *
 * ```rust
 * use proofmark_engine::editing::{Document, mapping::map_position};
 *
 * let doc = Document::from_text("I will recieve it");
 * let (doc, edit) = doc.apply_edit(7..14, "receive").unwrap();
 * assert_eq!(doc.text(), "I will receive it");
 * assert_eq!(map_position(15, &edit), 15);
 * ```
 */

pub mod document;
pub mod edit;
pub mod mapping;

pub use document::{
    Block, BlockContent, BlockKind, BlockPath, Document, FlatText, Location, Mark, TextRun,
};
pub use edit::{Edit, EditError};
pub use mapping::{MappedRange, map_position, map_range};
