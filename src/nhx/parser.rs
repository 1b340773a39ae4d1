//! Structs and logic to parse NHX strings.
//!
//! The grammar is implemented as an explicit state machine: each [State]
//! names what has been read of the current node, and [step] consumes at
//! most a few tokens from the [ParseContext] before returning the next state.
//! A driver loop runs the machine until [State::Done], so the call stack does
//! not grow with the nesting depth of the input. The open clades are kept in
//! an explicit stack inside the context instead.

use crate::model::{AnnotatedTree, NhxTree, NodeIndex};
use crate::nhx::defs::{DEFAULT_NODE_CAPACITY, LENGTH_TAG, NAME_TAG};
use crate::parser::lexer::{Lexeme, Lexer, Token};
use crate::parser::parsing_error::{
    DEFAULT_CONTEXT_RADIUS, ParsingError, ParsingErrorType, decode_utf8,
};
use log::{debug, trace};
use std::io::Read;

// =#========================================================================#=
// GRAMMAR STATE
// =#========================================================================$=
/// States of the NHX grammar.
///
/// Node-level states carry the index of the node being read; `NodeStart`
/// and `NodeEnd` also carry the parent (`None` at top level).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Node `node` is registered under `parent`, nothing of it read yet
    NodeStart {
        node: NodeIndex,
        parent: Option<NodeIndex>,
    },
    /// Current token is the name of `node`
    NodeNamed { node: NodeIndex },
    /// A `:` was read, the branch length of `node` follows
    NodeLength { node: NodeIndex },
    /// Inside the `[&&NHX:...]` block of `node`
    NodeAnnotations { node: NodeIndex },
    /// The `)` closing clade `node` was read, its own label may follow
    CladeClosed { node: NodeIndex },
    /// A node below `parent` is complete, current token decides what follows
    NodeEnd { parent: Option<NodeIndex> },
    /// The terminating `;` was read
    Done,
}

// =#========================================================================#=
// PARSE CONTEXT
// =#========================================================================$=
/// All mutable state of one parse: token stream, current token,
/// the tree under construction, and the stack of open clades.
pub struct ParseContext<'src> {
    lexer: Lexer<'src>,
    /// Most recently read token
    current: Lexeme<'src>,
    tree: NhxTree,
    /// Clades whose `(` was read but not yet their `)`, innermost last
    open_clades: Vec<NodeIndex>,
    /// Index handed out to the next opened node
    next_node: NodeIndex,
}

impl<'src> ParseContext<'src> {
    /// Creates a context over `input` with default settings.
    pub fn new(input: &'src str) -> Self {
        Self::with_lexer(Lexer::new(input), DEFAULT_NODE_CAPACITY)
    }

    /// Creates a context reading from `lexer`, reserving room for
    /// `node_capacity` nodes.
    pub fn with_lexer(lexer: Lexer<'src>, node_capacity: usize) -> Self {
        Self {
            lexer,
            // placeholder, nothing read yet
            current: Lexeme {
                token: Token::EndOfInput,
                text: "",
                span: 0..0,
            },
            tree: NhxTree::with_capacity(node_capacity),
            open_clades: Vec::new(),
            next_node: 0,
        }
    }

    /// Returns the initial state, allocating the root on the first call.
    ///
    /// Further calls return the same state without allocating again.
    pub fn start(&mut self) -> State {
        if self.next_node == 0 {
            self.allocate_node();
        }
        State::NodeStart {
            node: 0,
            parent: None,
        }
    }

    /// Returns the most recently read token.
    pub fn current(&self) -> &Lexeme<'src> {
        &self.current
    }

    /// Returns the tree built so far.
    pub fn tree(&self) -> &NhxTree {
        &self.tree
    }

    /// Returns the clades opened but not yet closed, innermost last.
    pub fn open_clades(&self) -> &[NodeIndex] {
        &self.open_clades
    }

    /// Consumes the context, returning the tree built so far.
    pub fn into_tree(self) -> NhxTree {
        self.tree
    }

    fn advance(&mut self) -> Result<(), ParsingError> {
        self.current = self.lexer.next_lexeme()?;
        Ok(())
    }

    fn allocate_node(&mut self) -> NodeIndex {
        let node = self.next_node;
        self.next_node += 1;
        node
    }

    fn current_clade(&self) -> Option<NodeIndex> {
        self.open_clades.last().copied()
    }

    /// Error for a current token that does not fit `expected`.
    ///
    /// Running out of input is lexical, anything else a grammar error.
    fn unexpected(&self, expected: &str) -> ParsingError {
        let at = self.current.span.start;
        if self.current.token == Token::EndOfInput {
            self.lexer
                .lexical_error(format!("unexpected end of input, expected {expected}"), at)
        } else {
            let found = self.current.describe();
            self.lexer
                .grammar_error(format!("expected {expected} but found {found}"), at)
        }
    }
}

// =#========================================================================#=
// TRANSITIONS
// =#========================================================================$=
/// Performs one transition of the grammar from `state`.
///
/// `state` must be the state last returned for `ctx`, by
/// [`ParseContext::start`] or by `step` itself.
///
/// # Returns
/// * `Ok(State)` - The next state; [State::Done] is returned unchanged
/// * `Err(ParsingError)` - If the input does not fit the grammar
///
/// # Panics
/// Panics if `state` refers to a node `ctx` has not allocated, or if
/// `ctx` already registered the node a [State::NodeStart] asks to register.
pub fn step(ctx: &mut ParseContext<'_>, state: State) -> Result<State, ParsingError> {
    match state {
        State::NodeStart { node, parent } => node_start(ctx, node, parent),
        State::NodeNamed { node } => node_named(ctx, node),
        State::NodeLength { node } => node_length(ctx, node),
        State::NodeAnnotations { node } => node_annotations(ctx, node),
        State::CladeClosed { node } => clade_closed(ctx, node),
        State::NodeEnd { parent } => node_end(ctx, parent),
        State::Done => Ok(State::Done),
    }
}

/// Registers `node` and dispatches on its first token:
/// name, `:`, annotations, `(` (first child) or end of an empty node.
fn node_start(
    ctx: &mut ParseContext<'_>,
    node: NodeIndex,
    parent: Option<NodeIndex>,
) -> Result<State, ParsingError> {
    assert_eq!(
        node,
        ctx.tree.nb_nodes(),
        "node {node} is not the next node to register"
    );
    ctx.tree.add_node(parent);

    ctx.advance()?;
    let next = match ctx.current.token {
        Token::Identifier => State::NodeNamed { node },
        Token::Colon => State::NodeLength { node },
        Token::AnnotationOpen => State::NodeAnnotations { node },
        Token::OpenParen => {
            ctx.open_clades.push(node);
            State::NodeStart {
                node: ctx.allocate_node(),
                parent: Some(node),
            }
        }
        _ => State::NodeEnd { parent },
    };
    Ok(next)
}

fn node_named(ctx: &mut ParseContext<'_>, node: NodeIndex) -> Result<State, ParsingError> {
    ctx.tree.set_tag(node, NAME_TAG, ctx.current.text);

    ctx.advance()?;
    let next = match ctx.current.token {
        Token::Colon => State::NodeLength { node },
        Token::AnnotationOpen => State::NodeAnnotations { node },
        _ => State::NodeEnd {
            parent: ctx.current_clade(),
        },
    };
    Ok(next)
}

fn node_length(ctx: &mut ParseContext<'_>, node: NodeIndex) -> Result<State, ParsingError> {
    ctx.advance()?;
    if ctx.current.token != Token::Identifier {
        return Err(ctx.unexpected("branch length after ':'"));
    }
    ctx.tree.set_tag(node, LENGTH_TAG, ctx.current.text);

    ctx.advance()?;
    let next = match ctx.current.token {
        Token::AnnotationOpen => State::NodeAnnotations { node },
        _ => State::NodeEnd {
            parent: ctx.current_clade(),
        },
    };
    Ok(next)
}

/// Reads one element of an annotation block: `]`, a `key=value` pair,
/// or a `:` separating pairs.
fn node_annotations(ctx: &mut ParseContext<'_>, node: NodeIndex) -> Result<State, ParsingError> {
    ctx.advance()?;
    match ctx.current.token {
        Token::AnnotationClose => {
            ctx.advance()?;
            Ok(State::NodeEnd {
                parent: ctx.current_clade(),
            })
        }
        Token::Identifier => {
            let key = ctx.current.text;

            ctx.advance()?;
            if ctx.current.token != Token::Equal {
                return Err(ctx.unexpected(&format!("'=' after annotation key '{key}'")));
            }

            ctx.advance()?;
            if ctx.current.token != Token::Identifier {
                return Err(ctx.unexpected(&format!("value for annotation key '{key}'")));
            }
            ctx.tree.set_tag(node, key, ctx.current.text);

            Ok(State::NodeAnnotations { node })
        }
        Token::Colon => Ok(State::NodeAnnotations { node }),
        _ => Err(ctx.unexpected("annotation key or ']'")),
    }
}

/// Reads the optional label following the `)` of clade `node`.
fn clade_closed(ctx: &mut ParseContext<'_>, node: NodeIndex) -> Result<State, ParsingError> {
    ctx.advance()?;
    let next = match ctx.current.token {
        Token::Identifier => State::NodeNamed { node },
        Token::Colon => State::NodeLength { node },
        Token::AnnotationOpen => State::NodeAnnotations { node },
        _ => State::NodeEnd {
            parent: ctx.current_clade(),
        },
    };
    Ok(next)
}

/// Decides what follows a complete node: a sibling, the end of the
/// enclosing clade, or the end of the tree.
fn node_end(ctx: &mut ParseContext<'_>, parent: Option<NodeIndex>) -> Result<State, ParsingError> {
    let at = ctx.current.span.start;
    match ctx.current.token {
        Token::Comma => match parent {
            Some(parent) => Ok(State::NodeStart {
                node: ctx.allocate_node(),
                parent: Some(parent),
            }),
            None => Err(ctx
                .lexer
                .grammar_error("found ',' outside of any clade".to_string(), at)),
        },
        Token::CloseParen => match ctx.open_clades.pop() {
            Some(clade) => {
                debug_assert_eq!(Some(clade), parent);
                Ok(State::CladeClosed { node: clade })
            }
            None => Err(ctx
                .lexer
                .grammar_error("found ')' without matching '('".to_string(), at)),
        },
        Token::Semicolon => {
            if !ctx.open_clades.is_empty() {
                return Err(ctx.lexer.grammar_error(
                    format!(
                        "expected ',' or ')' but found ';' ({} unclosed '(')",
                        ctx.open_clades.len()
                    ),
                    at,
                ));
            }

            ctx.advance()?;
            if ctx.current.token != Token::EndOfInput {
                return Err(ctx.unexpected("end of input after ';'"));
            }
            Ok(State::Done)
        }
        _ => Err(ctx.unexpected("',', ')' or ';'")),
    }
}

// =#========================================================================#=
// NHX PARSER
// =#========================================================================$=
/// Parser (configuration) for a single NHX tree.
///
/// # Construction & Configuration
/// * [`new()`](Self::new) - default settings
/// * [`with_node_capacity(n)`](Self::with_node_capacity)
///     - Pre-allocates the tree store for `n` nodes.
/// * [`with_context_radius(n)`](Self::with_context_radius)
///     - Number of characters of input shown on each side of an error.
///
/// # Parsing
/// * [`parse_str`](Self::parse_str) - Parse a tree from a string
/// * [`parse_reader`](Self::parse_reader) - Parse a tree from a character stream
///
/// A parser is single-use: it holds the tree of its one parse, and a
/// second parse fails with [ParsingErrorType::ParserExhausted] until
/// [`reset()`](Self::reset) is called, which discards the previous tree.
///
/// # Example
/// ```
/// use nhxtree::model::AnnotatedTree;
/// use nhxtree::nhx::NhxParser;
///
/// let mut parser = NhxParser::new();
/// let tree = parser.parse_str("(A:1,B:2)C:3;").unwrap();
/// assert_eq!(tree.nb_nodes(), 3);
/// assert_eq!(tree.tag(tree.root(), "name").unwrap(), "C");
/// ```
#[derive(Debug, Clone)]
pub struct NhxParser {
    node_capacity: usize,
    context_radius: usize,
    tree: Option<NhxTree>,
    used: bool,
}

// ============================================================================
// Construction & Configuration, Deconstruction (pub)
// ============================================================================
impl NhxParser {
    /// Creates a new [NhxParser] with default settings.
    pub fn new() -> Self {
        Self {
            node_capacity: DEFAULT_NODE_CAPACITY,
            context_radius: DEFAULT_CONTEXT_RADIUS,
            tree: None,
            used: false,
        }
    }

    /// Sets the expected number of nodes, to pre-allocate the tree store.
    pub fn with_node_capacity(mut self, node_capacity: usize) -> Self {
        self.node_capacity = node_capacity;
        self
    }

    /// Sets the number of characters shown on each side of an error position.
    pub fn with_context_radius(mut self, context_radius: usize) -> Self {
        self.context_radius = context_radius;
        self
    }

    /// Discards the parsed tree (if any) so the parser can be used again.
    pub fn reset(&mut self) {
        self.tree = None;
        self.used = false;
    }

    /// Returns whether this parser was used since creation or the last reset.
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Returns the tree of the last successful parse.
    pub fn tree(&self) -> Option<&NhxTree> {
        self.tree.as_ref()
    }

    /// Consumes the parser and returns the tree of the last successful parse.
    pub fn into_tree(self) -> Option<NhxTree> {
        self.tree
    }
}

impl Default for NhxParser {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// API Parsing (pub)
// ============================================================================
impl NhxParser {
    /// Parses a single NHX tree from `input`.
    ///
    /// # Returns
    /// * `Ok(&NhxTree)` - The parsed tree, held by the parser until [`reset()`](Self::reset)
    /// * `Err(ParsingError)` - If the input is not a valid NHX tree (no tree
    ///   is kept), or if the parser was already used
    pub fn parse_str(&mut self, input: &str) -> Result<&NhxTree, ParsingError> {
        if self.used {
            return Err(ParsingError::without_context(ParsingErrorType::ParserExhausted));
        }
        self.used = true;

        let tree = self.parse_to_tree(input)?;
        Ok(self.tree.insert(tree))
    }

    /// Reads `reader` to its end and parses the text as a single NHX tree.
    ///
    /// # Returns
    /// * `Ok(&NhxTree)` - The parsed tree
    /// * `Err(ParsingError)` - If reading fails (parser stays unused), the
    ///   stream is not valid UTF-8 (a lexical error at the first invalid
    ///   byte), the text is not a valid NHX tree, or the parser was already used
    pub fn parse_reader<R: Read>(&mut self, mut reader: R) -> Result<&NhxTree, ParsingError> {
        if self.used {
            return Err(ParsingError::without_context(ParsingErrorType::ParserExhausted));
        }

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let input = match decode_utf8(bytes, self.context_radius) {
            Ok(input) => input,
            Err(err) => {
                self.used = true;
                return Err(err);
            }
        };
        self.parse_str(&input)
    }

    /// Runs the grammar over `input` and returns the finished tree.
    pub(crate) fn parse_to_tree(&self, input: &str) -> Result<NhxTree, ParsingError> {
        debug!("Parsing NHX tree from {} bytes", input.len());
        let lexer = Lexer::new(input).with_context_radius(self.context_radius);
        let mut ctx = ParseContext::with_lexer(lexer, self.node_capacity);

        let mut state = ctx.start();
        while state != State::Done {
            trace!("{state:?}");
            state = step(&mut ctx, state).inspect_err(|e| debug!("Parsing failed: {e}"))?;
        }

        let tree = ctx.into_tree();
        debug_assert!(tree.is_valid());
        debug!("Parsed NHX tree with {} nodes", tree.nb_nodes());
        Ok(tree)
    }
}
