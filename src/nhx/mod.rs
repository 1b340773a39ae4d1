//! NHX format parser and writer for phylogenetic trees.
//!
//! This module provides [NhxParser] to parse a single NHX tree into an
//! [NhxTree], and [NhxWriter] / [to_nhx] to serialize it again.
//!
//! # Quick API
//! For simple use cases with default settings:
//! * [`parse_str`] - parses a single string, returns an [NhxTree]
//! * [`parse_reader`] - reads a character stream, returns an [NhxTree]
//!
//! # Full API
//! For more control, configure an [NhxParser]:
//! * [`NhxParser::parse_str`] - parse a tree from a string
//! * [`NhxParser::parse_reader`] - parse a tree from any [Read]
//!
//! # Format
//! NHX has the following grammar:
//! * `tree ::= clade ';'`
//! * `clade ::= '(' clade (',' clade)* ')' label? | label?`
//! * `label ::= name? (':' length)? annotations?`
//! * `annotations ::= '[&&NHX:' pair (':' pair)* ']'`
//! * `pair ::= key '=' value`
//!
//! Names, lengths, keys and values are runs of letters, digits, `.`, `_`
//! and `-`. Lengths are kept verbatim as the `length` tag, names as the
//! `name` tag, and annotation pairs as tags of their own.
//!
//! Furthermore:
//! * Whitespace can occur between any two tokens
//! * Comments are square brackets not starting with `[&&NHX:` and can
//!   occur wherever whitespace can; they do not nest
//!
//! For example:
//! * `(ADH2:0.1[&&NHX:S=human:E=1.1.1.1],ADH1:0.11[&&NHX:S=human])[&&NHX:D=N];`

pub mod defs;
pub mod parser;
pub mod writer;

pub use parser::{NhxParser, ParseContext, State};
pub use writer::{NhxStyle, NhxWriter, TreeWriter, to_nhx, write_nhx};

use crate::model::NhxTree;
use crate::parser::ParsingError;
use crate::parser::parsing_error::{DEFAULT_CONTEXT_RADIUS, decode_utf8};
use std::io::Read;

// ============================================================================
// QUICK PARSING API (pub)
// ============================================================================
/// Parses a single NHX string to obtain an [NhxTree].
///
/// This is a convenience function for quick parsing of a single NHX string
/// using default settings and thus not requiring configuration of a parser.
///
/// # Arguments
/// * `nhx` - The NHX format string to parse
///
/// # Returns
/// * [NhxTree] - Tree parsed from the string
/// * [ParsingError] - If the string is not valid NHX
///
/// # Example
/// ```
/// use nhxtree::model::AnnotatedTree;
/// use nhxtree::nhx::parse_str;
///
/// let tree = parse_str("(A[&&NHX:S=x:E=y],B);")?;
/// assert_eq!(tree.tag(1, "S")?, "x");
/// assert!(tree.tag(2, "S").is_err());
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_str<S: AsRef<str>>(nhx: S) -> Result<NhxTree, ParsingError> {
    NhxParser::new().parse_to_tree(nhx.as_ref())
}

/// Reads a character stream to its end and parses it as a single NHX tree.
///
/// # Returns
/// * [NhxTree] - Tree parsed from the stream
/// * [ParsingError] - If reading fails, the stream is not valid UTF-8,
///   or the text is not valid NHX
pub fn parse_reader<R: Read>(mut reader: R) -> Result<NhxTree, ParsingError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_str(decode_utf8(bytes, DEFAULT_CONTEXT_RADIUS)?)
}
