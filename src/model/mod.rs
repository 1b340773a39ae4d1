//! Data model for annotated NHX trees.
//!
//! # Tree representation
//! Trees are represented by [NhxTree], which uses the arena pattern: nodes
//! are referenced by [NodeIndex] and the structure is kept in two parallel
//! tables, a parent array and ordered children lists. Each node carries a
//! flat string-to-string [Tags] map, holding the reserved tags `name` and
//! `length` as well as any key/value pairs from its `[&&NHX:...]` block.
//!
//! # Querying trees
//! Consumers should program against the [AnnotatedTree] trait, which only
//! exposes read operations (children, parent, root, node count, tags).
//! Tag lookup returns a [MissingTagError] for absent tags.

pub mod tree;

pub use tree::AnnotatedTree;
pub use tree::MissingTagError;
pub use tree::NhxTree;
pub use tree::NodeIndex;
pub use tree::Tags;
