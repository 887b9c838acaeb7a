use std::borrow::Cow;
use std::collections::BTreeSet;
use std::ops::Range;

use serde::Serialize;
use xi_rope::Rope;
use xi_rope::delta::Builder;

use crate::editing::{Edit, EditError};

/// Inline formatting carried by a text run
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Link { href: String },
}

/// An immutable piece of text with a set of marks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRun {
    text: String,
    marks: BTreeSet<Mark>,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: impl IntoIterator<Item = Mark>) -> Self {
        Self {
            text: text.into(),
            marks: marks.into_iter().collect(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, [])
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn marks(&self) -> &BTreeSet<Mark> {
        &self.marks
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// The kind of block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    ListItem,
    BlockQuote,
}

/// Content of a block: either inline text runs or nested child blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BlockContent {
    /// Leaf block holding text runs
    Inline(Vec<TextRun>),
    /// Container block with child blocks
    Children(Vec<Block>),
}

/// A block in the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    pub content: BlockContent,
}

impl Block {
    pub fn leaf(kind: BlockKind, runs: Vec<TextRun>) -> Self {
        Self {
            kind,
            content: BlockContent::Inline(normalize_runs(runs)),
        }
    }

    pub fn container(kind: BlockKind, children: Vec<Block>) -> Self {
        Self {
            kind,
            content: BlockContent::Children(children),
        }
    }

    /// Plain paragraph, empty text gives an empty paragraph
    pub fn paragraph(text: &str) -> Self {
        Self::leaf(BlockKind::Paragraph, vec![TextRun::plain(text)])
    }

    pub fn heading(level: u8, text: &str) -> Self {
        Self::leaf(BlockKind::Heading { level }, vec![TextRun::plain(text)])
    }

    pub fn list_item(text: &str) -> Self {
        Self::leaf(BlockKind::ListItem, vec![TextRun::plain(text)])
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.content, BlockContent::Inline(_))
    }
}

/// Path from the document root to a block: one child index per level
pub type BlockPath = Vec<usize>;

/// Where a flat offset lands in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Leaf block containing the offset
    pub block: BlockPath,
    /// Run index within the leaf, `None` for an empty leaf
    pub run: Option<usize>,
    /// Byte offset within the run (or 0 for an empty leaf)
    pub local_offset: usize,
}

#[derive(Debug, Clone)]
struct LeafSpan {
    path: BlockPath,
    /// Absolute range of the leaf's text in the flat space
    range: Range<usize>,
    /// Absolute range of each run
    runs: Vec<Range<usize>>,
}

/// Linear view of a document: leaf texts joined by `'\n'`
#[derive(Debug, Clone)]
pub struct FlatText {
    text: String,
    leaves: Vec<LeafSpan>,
}

impl FlatText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Flat ranges of each leaf block, in document order
    pub fn leaf_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.leaves.iter().map(|leaf| leaf.range.clone())
    }

    /// Reverse lookup from a flat offset to the node holding it.
    ///
    /// An offset on a separator resolves to the end of the preceding leaf,
    /// and an offset on a run boundary resolves to the start of the later run.
    pub fn locate(&self, offset: usize) -> Option<Location> {
        let leaf = self
            .leaves
            .iter()
            .find(|leaf| leaf.range.start <= offset && offset <= leaf.range.end)?;

        if leaf.runs.is_empty() {
            return Some(Location {
                block: leaf.path.clone(),
                run: None,
                local_offset: 0,
            });
        }

        let last = leaf.runs.len() - 1;
        let run = leaf
            .runs
            .iter()
            .position(|run| offset < run.end)
            .unwrap_or(last);

        Some(Location {
            block: leaf.path.clone(),
            run: Some(run),
            local_offset: offset - leaf.runs[run].start,
        })
    }
}

/// Rich-text document addressed by flat offsets.
///
/// The block tree is the structure; `buffer` holds the linearized text so
/// slicing and boundary checks do not need to walk the tree. Both are
/// replaced together on every edit, and a document is never mutated in place:
/// [`Document::apply_edit`] returns a new value with a bumped version.
#[derive(Debug, Clone)]
pub struct Document {
    blocks: Vec<Block>,
    buffer: Rope,
    version: u64,
}

impl Document {
    /// One paragraph per line of `text`
    pub fn from_text(text: &str) -> Self {
        let blocks = text.split('\n').map(Block::paragraph).collect();
        Self::from_blocks(blocks)
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let buffer = Rope::from(flatten_blocks(&blocks).text);
        Self {
            blocks,
            buffer,
            version: 0,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Version counter incremented on each edit
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.len() == 0
    }

    /// The flattened text as an owned string
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    /// Linear view with reverse lookup
    pub fn flatten(&self) -> FlatText {
        flatten_blocks(&self.blocks)
    }

    pub fn leaf_count(&self) -> usize {
        count_leaves(&self.blocks)
    }

    /// True when `offset` is inside the document and not inside a multi-byte char
    pub fn is_char_boundary(&self, offset: usize) -> bool {
        if offset >= self.buffer.len() {
            return offset == self.buffer.len();
        }
        // UTF-8 continuation bytes look like 0b10xx_xxxx
        (self.buffer.byte_at(offset) as i8) >= -0x40
    }

    /// Slice the text, clamping the range to the document
    pub fn slice(&self, range: Range<usize>) -> Cow<'_, str> {
        let doc_len = self.buffer.len();
        let start = range.start.min(doc_len);
        let end = range.end.min(doc_len).max(start);
        self.text_in(start..end).unwrap_or(Cow::Borrowed(""))
    }

    /// Exact slice, `None` if the range is out of bounds or splits a char
    pub fn text_in(&self, range: Range<usize>) -> Option<Cow<'_, str>> {
        if range.start > range.end
            || range.end > self.buffer.len()
            || !self.is_char_boundary(range.start)
            || !self.is_char_boundary(range.end)
        {
            return None;
        }
        Some(self.buffer.slice_to_cow(range))
    }

    /// Replace `range` with `text`, returning the new document and the edit applied.
    ///
    /// Ends are clamped to `[0, len]`. A range whose start still exceeds its
    /// end, or whose ends split a character, is rejected and `self` is left as is.
    pub fn apply_edit(&self, range: Range<usize>, text: &str) -> Result<(Self, Edit), EditError> {
        let len = self.len();
        let from = range.start.min(len);
        let to = range.end.min(len);
        if from > to {
            return Err(EditError::InvalidEdit {
                from: range.start,
                to: range.end,
                len,
            });
        }
        for offset in [from, to] {
            if !self.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }

        let flat = self.flatten();
        let leaves = collect_leaves(&self.blocks);
        let blocks = if leaves.is_empty() {
            // A document without leaves behaves like a single empty paragraph
            splice_leaf_runs(&BlockKind::Paragraph, &[], 0, &[], 0, text)
        } else {
            let (first, first_offset) = leaf_position(&flat, from);
            let (last, last_offset) = leaf_position(&flat, to);
            let replacement = splice_leaf_runs(
                &leaves[first].0,
                leaves[first].1,
                first_offset,
                leaves[last].1,
                last_offset,
                text,
            );
            let splice = Splice {
                first,
                last,
                replacement,
            };
            let mut cursor = 0;
            rebuild(&self.blocks, &mut cursor, &splice)
        };

        let mut builder = Builder::new(self.buffer.len());
        builder.replace(from..to, Rope::from(text));
        let buffer = builder.build().apply(&self.buffer);

        let edit = Edit::new(from, to, text.len());
        log::trace!("applied edit {edit:?} at version {}", self.version);

        Ok((
            Self {
                blocks,
                buffer,
                version: self.version + 1,
            },
            edit,
        ))
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        // Buffer is derived from blocks
        self.blocks == other.blocks && self.version == other.version
    }
}

fn flatten_blocks(blocks: &[Block]) -> FlatText {
    let mut flat = FlatText {
        text: String::new(),
        leaves: Vec::new(),
    };
    let mut path = Vec::new();
    flatten_into(blocks, &mut path, &mut flat);
    flat
}

fn flatten_into(blocks: &[Block], path: &mut BlockPath, flat: &mut FlatText) {
    for (index, block) in blocks.iter().enumerate() {
        path.push(index);
        match &block.content {
            BlockContent::Inline(runs) => {
                if !flat.leaves.is_empty() {
                    flat.text.push('\n');
                }
                let start = flat.text.len();
                let mut run_ranges = Vec::with_capacity(runs.len());
                for run in runs {
                    let run_start = flat.text.len();
                    flat.text.push_str(run.text());
                    run_ranges.push(run_start..flat.text.len());
                }
                flat.leaves.push(LeafSpan {
                    path: path.clone(),
                    range: start..flat.text.len(),
                    runs: run_ranges,
                });
            }
            BlockContent::Children(children) => flatten_into(children, path, flat),
        }
        path.pop();
    }
}

fn count_leaves(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .map(|block| match &block.content {
            BlockContent::Inline(_) => 1,
            BlockContent::Children(children) => count_leaves(children),
        })
        .sum()
}

fn collect_leaves(blocks: &[Block]) -> Vec<(BlockKind, &[TextRun])> {
    let mut out = Vec::new();
    for block in blocks {
        match &block.content {
            BlockContent::Inline(runs) => out.push((block.kind.clone(), runs.as_slice())),
            BlockContent::Children(children) => out.extend(collect_leaves(children)),
        }
    }
    out
}

/// Leaf index and offset within the leaf text for a flat offset
fn leaf_position(flat: &FlatText, offset: usize) -> (usize, usize) {
    flat.leaves
        .iter()
        .position(|leaf| offset <= leaf.range.end)
        .map(|index| (index, offset - flat.leaves[index].range.start))
        .unwrap_or_else(|| {
            let last = flat.leaves.len() - 1;
            (last, flat.leaves[last].range.len())
        })
}

/// Split runs at a byte offset within their concatenated text
fn split_runs(runs: &[TextRun], at: usize) -> (Vec<TextRun>, Vec<TextRun>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut start = 0;
    for run in runs {
        let end = start + run.len();
        if end <= at {
            left.push(run.clone());
        } else if start >= at {
            right.push(run.clone());
        } else {
            let (head, tail) = run.text.split_at(at - start);
            left.push(TextRun {
                text: head.to_string(),
                marks: run.marks.clone(),
            });
            right.push(TextRun {
                text: tail.to_string(),
                marks: run.marks.clone(),
            });
        }
        start = end;
    }
    (left, right)
}

/// Drop empty runs and merge neighbours with identical marks
fn normalize_runs(runs: Vec<TextRun>) -> Vec<TextRun> {
    let mut out: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs.into_iter().filter(|run| !run.is_empty()) {
        match out.last_mut() {
            Some(prev) if prev.marks == run.marks => prev.text.push_str(&run.text),
            _ => out.push(run),
        }
    }
    out
}

/// Build the leaves that replace the leaves between `first` and `last` (inclusive).
///
/// The head of the first leaf and the tail of the last leaf are kept, the
/// inserted text goes in between and every `'\n'` in it starts a new leaf of
/// the first leaf's kind.
fn splice_leaf_runs(
    kind: &BlockKind,
    first_runs: &[TextRun],
    first_offset: usize,
    last_runs: &[TextRun],
    last_offset: usize,
    text: &str,
) -> Vec<Block> {
    let (head, after_head) = split_runs(first_runs, first_offset);
    let (_, tail) = split_runs(last_runs, last_offset);

    let marks = head
        .last()
        .or_else(|| after_head.first())
        .map(|run| run.marks.clone())
        .unwrap_or_default();
    let inserted = |segment: &str| TextRun {
        text: segment.to_string(),
        marks: marks.clone(),
    };

    let segments: Vec<&str> = text.split('\n').collect();
    let last_segment = segments.len() - 1;
    let mut current = head;
    let mut out = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        current.push(inserted(segment));
        if index == last_segment {
            current.extend(tail.iter().cloned());
        }
        out.push(Block::leaf(kind.clone(), std::mem::take(&mut current)));
    }
    out
}

struct Splice {
    first: usize,
    last: usize,
    replacement: Vec<Block>,
}

/// Rebuild the tree with the leaves `first..=last` swapped for the replacement.
/// Containers left without children are pruned.
fn rebuild(blocks: &[Block], cursor: &mut usize, splice: &Splice) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    for block in blocks {
        match &block.content {
            BlockContent::Inline(_) => {
                let index = *cursor;
                *cursor += 1;
                if index == splice.first {
                    out.extend(splice.replacement.iter().cloned());
                } else if index < splice.first || index > splice.last {
                    out.push(block.clone());
                }
            }
            BlockContent::Children(children) => {
                let children = rebuild(children, cursor, splice);
                if !children.is_empty() {
                    out.push(Block::container(block.kind.clone(), children));
                }
            }
        }
    }
    out
}
