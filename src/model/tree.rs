//! Provides the annotated tree representation.
//!
//! Provides core data structures for representing NHX trees:
//! * [AnnotatedTree] - Read-only query interface shared by all consumers
//!   (writer, downstream statistics, ...)
//! * [NhxTree] - Tree store using the arena pattern, realizing [AnnotatedTree]
//! * [NodeIndex] as type used to index nodes in tree
//! * [MissingTagError] returned when a node does not carry a requested tag

use crate::nhx::defs::{LENGTH_TAG, NAME_TAG};
use std::collections::HashMap;
use std::ops::Index;

/// Index of a node in a tree (arena).
pub type NodeIndex = usize;

/// Tag storage of a single node, mapping tag names to their verbatim values.
pub type Tags = HashMap<String, String>;

/// Sentinel stored in the parent array for the root.
const NO_PARENT: NodeIndex = usize::MAX;

/// *During construction only*, index for unset root.
const NO_ROOT_SET_INDEX: NodeIndex = usize::MAX;

// =#========================================================================#=
// MISSING TAG ERROR
// =#========================================================================$=
/// Returned by [AnnotatedTree::tag] if a node does not carry the requested tag.
///
/// This is a caller-side condition and does not affect validity of the tree:
/// all tags, including `name` and `length`, are optional in NHX.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("node {node} has no tag '{name}'")]
pub struct MissingTagError {
    /// Node that was queried
    pub node: NodeIndex,
    /// Name of the missing tag
    pub name: String,
}

// =#========================================================================#=
// ANNOTATED TREE (Trait)
// =#========================================================================T=
/// Read-only query interface over an annotated tree.
///
/// Node indices are stable for the lifetime of the tree, so callers may
/// cache by index.
pub trait AnnotatedTree {
    /// Returns the children of `node` in left-to-right textual order.
    fn children(&self, node: NodeIndex) -> &[NodeIndex];

    /// Returns the parent of `node`, or `None` for the root.
    fn parent(&self, node: NodeIndex) -> Option<NodeIndex>;

    /// Returns the index of the root.
    fn root(&self) -> NodeIndex;

    /// Returns the number of nodes in the tree.
    fn nb_nodes(&self) -> usize;

    /// Returns the value of tag `name` on `node`.
    ///
    /// # Errors
    /// [MissingTagError] if the node does not carry this tag.
    fn tag(&self, node: NodeIndex, name: &str) -> Result<&str, MissingTagError>;

    /// Returns the names of all tags of `node`, sorted.
    fn tag_names(&self, node: NodeIndex) -> Vec<&str>;
}

// =$========================================================================$=
// NHX TREE
// =$========================================================================$=
/// A tree with string-tagged nodes, represented using the arena pattern.
///
/// Nodes are stored in contiguous vectors and referenced by [NodeIndex],
/// with parent links and ordered children lists kept side by side.
///
/// # Structure
/// - Nodes are indexed `0..n` in the order they were opened while parsing;
///   the store only ever grows, nodes are never removed or reordered.
/// - `parent[i]` is the parent of `i`, or a sentinel for the root.
/// - `children[i]` lists the children of `i` in textual order and is
///   consistent with `parent`.
/// - Exactly one node (the root) has no parent.
///
/// Trees are built by [NhxParser](crate::nhx::NhxParser) and immutable
/// afterward. Check the invariants with [`NhxTree::is_valid()`].
#[derive(Debug, Clone, PartialEq)]
pub struct NhxTree {
    /// Tags of each node (arena pattern)
    nodes: Vec<Tags>,

    /// Parent of each node, [NO_PARENT] for the root
    parent: Vec<NodeIndex>,

    /// Children of each node, in textual order
    children: Vec<Vec<NodeIndex>>,

    /// Index of the root of this tree
    root: NodeIndex,
}

// ============================================================================
// Construction (crate)
// ============================================================================
impl NhxTree {
    /// Creates a new empty tree with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        NhxTree {
            nodes: Vec::with_capacity(capacity),
            parent: Vec::with_capacity(capacity),
            children: Vec::with_capacity(capacity),
            root: NO_ROOT_SET_INDEX,
        }
    }

    /// Appends a node under `parent` (or as root if `None`),
    /// assigning the next index, which gets returned.
    ///
    /// # Panics
    /// Panics if a second root is added or `parent` is out of bounds.
    pub(crate) fn add_node(&mut self, parent: Option<NodeIndex>) -> NodeIndex {
        let index = self.nodes.len();
        self.nodes.push(Tags::new());
        self.children.push(Vec::new());

        match parent {
            Some(parent) => {
                self.parent.push(parent);
                self.children[parent].push(index);
            }
            None => {
                assert_eq!(self.root, NO_ROOT_SET_INDEX, "tree already has a root");
                self.parent.push(NO_PARENT);
                self.root = index;
            }
        }

        index
    }

    /// Sets tag `name` of `node` to `value`, overwriting any previous value.
    pub(crate) fn set_tag(&mut self, node: NodeIndex, name: &str, value: &str) {
        self.nodes[node].insert(name.to_string(), value.to_string());
    }
}

// ============================================================================
// Getters / Accessors, etc. (pub)
// ============================================================================
impl NhxTree {
    /// Returns all tags of `node`.
    ///
    /// # Panics
    /// Panics if `node` is out of bounds.
    pub fn tags(&self, node: NodeIndex) -> &Tags {
        &self.nodes[node]
    }

    /// Returns the `name` tag of `node`, if any.
    pub fn name(&self, node: NodeIndex) -> Option<&str> {
        self.nodes[node].get(NAME_TAG).map(String::as_str)
    }

    /// Returns the `length` tag of `node` (verbatim, not parsed), if any.
    pub fn length(&self, node: NodeIndex) -> Option<&str> {
        self.nodes[node].get(LENGTH_TAG).map(String::as_str)
    }

    /// Returns whether `node` has no children.
    pub fn is_leaf(&self, node: NodeIndex) -> bool {
        self.children[node].is_empty()
    }

    /// Returns the number of leaves in this tree.
    pub fn num_leaves(&self) -> usize {
        self.children.iter().filter(|c| c.is_empty()).count()
    }

    /// Returns whether the root of the tree has been set.
    pub fn is_root_set(&self) -> bool {
        self.root != NO_ROOT_SET_INDEX
    }

    /// Validates the tree structure and all index references in linear time.
    ///
    /// Checks:
    /// - Node, parent and children tables have the same length
    /// - Root index is set and the root is the only node without parent
    /// - Every child reference is in bounds and points back to its parent
    /// - Children are stored in strictly increasing index (i.e. textual) order
    /// - Children lists hold `n - 1` entries in total
    ///
    /// Together, the last three imply every non-root node is listed exactly
    /// once, as a child of its own parent.
    ///
    /// # Returns
    /// `true` if tree is valid, `false` otherwise
    pub fn is_valid(&self) -> bool {
        let n = self.nodes.len();
        if self.parent.len() != n || self.children.len() != n {
            return false;
        }

        if self.root >= n || self.parent[self.root] != NO_PARENT {
            return false;
        }

        for (index, &parent) in self.parent.iter().enumerate() {
            if parent == NO_PARENT && index != self.root {
                return false;
            }
            if parent != NO_PARENT && parent >= n {
                return false;
            }
        }

        let mut nb_child_entries = 0;
        for (index, children) in self.children.iter().enumerate() {
            if children.iter().any(|&c| c >= n || self.parent[c] != index) {
                return false;
            }

            if children.windows(2).any(|pair| pair[0] >= pair[1]) {
                return false;
            }
            nb_child_entries += children.len();
        }

        nb_child_entries == n - 1
    }
}

impl AnnotatedTree for NhxTree {
    /// # Panics
    /// Panics if `node` is out of bounds.
    fn children(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.children[node]
    }

    /// # Panics
    /// Panics if `node` is out of bounds.
    fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        match self.parent[node] {
            NO_PARENT => None,
            parent => Some(parent),
        }
    }

    fn root(&self) -> NodeIndex {
        self.root
    }

    fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// # Panics
    /// Panics if `node` is out of bounds.
    fn tag(&self, node: NodeIndex, name: &str) -> Result<&str, MissingTagError> {
        self.nodes[node]
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| MissingTagError {
                node,
                name: name.to_string(),
            })
    }

    fn tag_names(&self, node: NodeIndex) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes[node].keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Index<NodeIndex> for NhxTree {
    type Output = Tags;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index]
    }
}
