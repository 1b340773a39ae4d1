//! Constants and definitions for the NHX parser and writer.

/// Reserved tag holding the label of a leaf or clade
pub const NAME_TAG: &str = "name";

/// Reserved tag holding the branch length, verbatim as written
pub const LENGTH_TAG: &str = "length";

/// Marker opening a key/value annotation block
pub const ANNOTATION_OPEN: &str = "[&&NHX:";

/// Marker closing a key/value annotation block
pub const ANNOTATION_CLOSE: &str = "]";

/// Default guess for number of nodes, when unknown
pub(crate) const DEFAULT_NODE_CAPACITY: usize = 16;

/// Estimated characters per node when writing (label, length, punctuation)
pub(crate) const ESTIMATED_CHARS_PER_NODE: usize = 12;
