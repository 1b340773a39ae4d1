//! NHX format writing for annotated trees.
//!
//! The writer is the structural inverse of the parser: children in order
//! inside parentheses, followed by the node's `name`, `:length`, and an
//! `[&&NHX:key=value:...]` block holding all remaining tags sorted by key.
//! Parsing the output again yields the same tree, with the same indices.

use crate::model::{AnnotatedTree, NodeIndex};
use crate::nhx::defs::{
    ANNOTATION_CLOSE, ANNOTATION_OPEN, ESTIMATED_CHARS_PER_NODE, LENGTH_TAG, NAME_TAG,
};
use std::io::{self, Write};

/// Style for serializing a tree, controlling which tags are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NhxStyle {
    /// Names, branch lengths and annotation blocks
    #[default]
    Annotated,
    /// Names and branch lengths only (plain Newick)
    Plain,
}

// =#========================================================================#=
// TREE WRITER (Trait)
// =#========================================================================T=
/// Capability to serialize an [AnnotatedTree] to text.
pub trait TreeWriter {
    /// Writes `tree` to `out`.
    ///
    /// # Errors
    /// Returns an I/O error if writing fails.
    fn write(&mut self, out: &mut dyn Write, tree: &dyn AnnotatedTree) -> io::Result<()>;
}

// =#========================================================================#=
// NHX WRITER
// =#========================================================================$=
/// [TreeWriter] producing NHX text.
///
/// # Example
/// ```
/// use nhxtree::nhx::{NhxParser, NhxStyle, NhxWriter, TreeWriter};
///
/// let mut parser = NhxParser::new();
/// let tree = parser.parse_str("(A:1[&&NHX:S=x], B) C;").unwrap();
///
/// let mut out = Vec::new();
/// NhxWriter::new(NhxStyle::Annotated).write(&mut out, tree).unwrap();
/// assert_eq!(out, b"(A:1[&&NHX:S=x],B)C;");
/// ```
#[derive(Debug, Clone, Default)]
pub struct NhxWriter {
    style: NhxStyle,
    trailing_newline: bool,
}

impl NhxWriter {
    /// Creates a new [NhxWriter] with the given style.
    pub fn new(style: NhxStyle) -> Self {
        Self {
            style,
            trailing_newline: false,
        }
    }

    /// Configures the writer to end each tree with a newline after the `;`.
    pub fn with_trailing_newline(mut self) -> Self {
        self.trailing_newline = true;
        self
    }
}

impl TreeWriter for NhxWriter {
    fn write(&mut self, out: &mut dyn Write, tree: &dyn AnnotatedTree) -> io::Result<()> {
        let mut nhx = to_nhx(self.style, tree);
        if self.trailing_newline {
            nhx.push('\n');
        }
        out.write_all(nhx.as_bytes())
    }
}

/// Writes `tree` in NHX format to `out` using the given [NhxStyle].
///
/// # Errors
/// Returns an I/O error if writing fails.
pub fn write_nhx<W: Write>(
    mut out: W,
    style: NhxStyle,
    tree: &dyn AnnotatedTree,
) -> io::Result<()> {
    NhxWriter::new(style).write(&mut out, tree)?;
    out.flush()
}

/// Returns the NHX representation of `tree` with closing semicolon.
///
/// # Arguments
/// * `style` - The [NhxStyle] controlling which tags are written
/// * `tree` - The tree to serialize
///
/// # Example
/// ```
/// use nhxtree::nhx::{NhxStyle, to_nhx};
/// use nhxtree::parse_nhx_str;
///
/// let tree = parse_nhx_str("(A:0.1[&&NHX:S=human:E=1.1.1.1],B:0.2)AB;").unwrap();
/// assert_eq!(to_nhx(NhxStyle::Plain, &tree), "(A:0.1,B:0.2)AB;");
/// ```
pub fn to_nhx(style: NhxStyle, tree: &dyn AnnotatedTree) -> String {
    // Children are pushed in reverse, so they pop in textual order
    enum Step {
        Open(NodeIndex),
        Close(NodeIndex),
        Separator,
    }

    let mut nhx = String::with_capacity(tree.nb_nodes() * ESTIMATED_CHARS_PER_NODE);
    if tree.nb_nodes() == 0 {
        return nhx;
    }

    let mut stack = vec![Step::Open(tree.root())];
    while let Some(step) = stack.pop() {
        match step {
            Step::Open(node) => {
                let children = tree.children(node);
                if children.is_empty() {
                    push_label(&mut nhx, style, tree, node);
                    continue;
                }

                nhx.push('(');
                stack.push(Step::Close(node));
                for (i, &child) in children.iter().enumerate().rev() {
                    stack.push(Step::Open(child));
                    if i > 0 {
                        stack.push(Step::Separator);
                    }
                }
            }
            Step::Close(node) => {
                nhx.push(')');
                push_label(&mut nhx, style, tree, node);
            }
            Step::Separator => nhx.push(','),
        }
    }

    nhx.push(';');
    nhx
}

/// Appends `name`, `:length` and (for [NhxStyle::Annotated]) the
/// annotation block of `node`.
fn push_label(nhx: &mut String, style: NhxStyle, tree: &dyn AnnotatedTree, node: NodeIndex) {
    if let Ok(name) = tree.tag(node, NAME_TAG) {
        nhx.push_str(name);
    }
    if let Ok(length) = tree.tag(node, LENGTH_TAG) {
        nhx.push(':');
        nhx.push_str(length);
    }

    if style == NhxStyle::Plain {
        return;
    }

    let keys: Vec<&str> = tree
        .tag_names(node)
        .into_iter()
        .filter(|&key| key != NAME_TAG && key != LENGTH_TAG)
        .collect();
    if keys.is_empty() {
        return;
    }

    nhx.push_str(ANNOTATION_OPEN);
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            nhx.push(':');
        }
        nhx.push_str(key);
        nhx.push('=');
        if let Ok(value) = tree.tag(node, key) {
            nhx.push_str(value);
        }
    }
    nhx.push_str(ANNOTATION_CLOSE);
}
