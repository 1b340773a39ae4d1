//! Nhxtree is a library to parse phylogenetic trees in NHX notation.
//!
//! NHX (New Hampshire eXtended) extends the parenthesized Newick notation
//! with a bracketed `[&&NHX:key=value:...]` annotation block per node.
//! Core functionality provided:
//! - Tokenizer: skips whitespace and `[...]` comments, see [parser::lexer].
//! - Parser: an explicit grammar state machine building the tree left to
//!   right, see [nhx::NhxParser].
//! - Tree model: [NhxTree] uses the arena pattern with a parent array and
//!   ordered children lists; nodes carry string tags. Consumers query it
//!   through the read-only [AnnotatedTree] trait.
//! - Writer: serializes trees back to NHX, see [nhx::NhxWriter].
//! - Errors: [ParsingError] locates the offending token by character
//!   position and shows the surrounding input with a caret.
//!
//! Limitations:
//! - One tree per input; the text after the `;` may only hold whitespace
//!   and comments
//! - No quoted labels
//! - Branch lengths are kept as text, callers parse them if needed
//!
//! # Usage patterns
//! 1. Quick access with default settings via [parse_nhx_str] and
//!    [parse_nhx_reader].
//! 2. Configure an [NhxParser](crate::nhx::NhxParser) for control over
//!    pre-allocation and error context.
//!
//! ## Example
//! ```
//! use nhxtree::parse_nhx_str;
//! use nhxtree::model::AnnotatedTree;
//!
//! let tree = parse_nhx_str("(A:1,B:2)C:3;").unwrap();
//! assert_eq!(tree.nb_nodes(), 3);
//! assert_eq!(tree.children(tree.root()), &[1, 2]);
//! assert_eq!(tree.tag(1, "length").unwrap(), "1");
//! ```
//!
//! ## Example Error
//! ```
//! use nhxtree::parse_nhx_str;
//!
//! let error = parse_nhx_str("(A:1,B:2;").unwrap_err();
//! assert_eq!(error.position(), Some(8));
//! println!("{error}");
//! ```

pub mod model;
pub mod nhx;
pub mod parser;

pub use crate::model::{AnnotatedTree, MissingTagError, NhxTree, NodeIndex};
pub use crate::parser::parsing_error::ParsingError;
use std::io::Read;

// ============================================================================
// Quick NHX API
// ============================================================================
/// Parse an NHX string using default settings, returning an [NhxTree].
///
/// See [`nhx::parse_str`] for full documentation of this convenience function.
pub fn parse_nhx_str<S: AsRef<str>>(nhx: S) -> Result<NhxTree, ParsingError> {
    nhx::parse_str(nhx)
}

/// Parse an NHX tree from a character stream using default settings,
/// returning an [NhxTree].
///
/// See [`nhx::parse_reader`] for full documentation of this convenience function.
pub fn parse_nhx_reader<R: Read>(reader: R) -> Result<NhxTree, ParsingError> {
    nhx::parse_reader(reader)
}
