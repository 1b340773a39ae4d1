//! Tokenizer for NHX text.
//!
//! Token rules are derived with `logos`. Whitespace and bracketed comments
//! are skipped inside the lexer, so the grammar never sees them. Punctuation
//! and identifier characters are disjoint, and `[&&NHX:` beats a plain `[`
//! by longest match, so no priority tie-breaks are needed.

use crate::parser::parsing_error::{DEFAULT_CONTEXT_RADIUS, ParsingError, preview};
use logos::{FilterResult, Logos};
use std::ops::Range;

// =#========================================================================#=
// TOKEN
// =#========================================================================$=
/// Lexing failures, reported as [LexicalError](crate::parser::ParsingErrorType::LexicalError).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LexError {
    /// No token rule matches at this position
    #[default]
    UnexpectedCharacter,
    /// A `[` comment was opened but never closed
    UnclosedComment,
}

/// All kinds of tokens of the NHX notation.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token("=")]
    Equal,

    /// Opens a key/value annotation block
    #[token("[&&NHX:")]
    AnnotationOpen,

    /// Closes a key/value annotation block
    #[token("]")]
    AnnotationClose,

    /// Never emitted: `[...]` comments are skipped by the lexer.
    #[doc(hidden)]
    #[token("[", skip_comment)]
    Comment,

    /// Name, branch length, annotation key or value
    #[regex(r"[a-zA-Z0-9._-]+")]
    Identifier,

    /// Produced once all input has been consumed
    EndOfInput,
}

/// Skips a comment up to and including the next `]` (comments do not nest).
fn skip_comment(lex: &mut logos::Lexer<Token>) -> FilterResult<(), LexError> {
    match lex.remainder().find(']') {
        Some(end) => {
            lex.bump(end + 1);
            FilterResult::Skip
        }
        None => FilterResult::Error(LexError::UnclosedComment),
    }
}

// =#========================================================================#=
// LEXEME
// =#========================================================================$=
/// A token together with its text and byte span in the input.
///
/// `token` is never `Token::Comment`; comments are skipped while lexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme<'src> {
    pub token: Token,
    pub text: &'src str,
    pub span: Range<usize>,
}

impl Lexeme<'_> {
    /// Describes this lexeme for error messages.
    pub fn describe(&self) -> String {
        match self.token {
            Token::EndOfInput => "end of input".to_string(),
            _ => preview(self.text),
        }
    }
}

// =#========================================================================#=
// LEXER
// =#========================================================================$=
/// Pull-based tokenizer producing one [Lexeme] per call.
///
/// After the input is exhausted, every further call yields
/// [Token::EndOfInput] located at the end of the input.
///
/// # Example
/// ```
/// use nhxtree::parser::lexer::{Lexer, Token};
///
/// let mut lexer = Lexer::new("(A [a comment] :0.1);");
/// assert_eq!(lexer.next_lexeme().unwrap().token, Token::OpenParen);
/// assert_eq!(lexer.next_lexeme().unwrap().text, "A");
/// assert_eq!(lexer.next_lexeme().unwrap().token, Token::Colon);
/// ```
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, Token>,
    context_radius: usize,
}

impl<'src> Lexer<'src> {
    /// Creates a new [Lexer] over `input`.
    pub fn new(input: &'src str) -> Self {
        Self {
            inner: Token::lexer(input),
            context_radius: DEFAULT_CONTEXT_RADIUS,
        }
    }

    /// Sets the number of characters of context shown around error positions.
    pub fn with_context_radius(mut self, radius: usize) -> Self {
        self.context_radius = radius;
        self
    }

    /// Returns the full input of this lexer.
    pub fn input(&self) -> &'src str {
        self.inner.source()
    }

    /// Returns the number of context characters used for errors.
    pub fn context_radius(&self) -> usize {
        self.context_radius
    }

    /// Reads the next token, skipping whitespace and comments.
    ///
    /// # Returns
    /// * `Ok(Lexeme)` - The next token, or [Token::EndOfInput] if exhausted
    /// * `Err(ParsingError)` - If no token rule matches at the current position
    pub fn next_lexeme(&mut self) -> Result<Lexeme<'src>, ParsingError> {
        let input = self.inner.source();
        match self.inner.next() {
            Some(Ok(token)) => Ok(Lexeme {
                token,
                text: self.inner.slice(),
                span: self.inner.span(),
            }),
            Some(Err(LexError::UnexpectedCharacter)) => {
                let start = self.inner.span().start;
                let msg = match input[start..].chars().next() {
                    Some(c) => format!("token starting with {c:?}"),
                    None => "end of input".to_string(),
                };
                Err(ParsingError::lexical(msg, input, start, self.context_radius))
            }
            Some(Err(LexError::UnclosedComment)) => Err(ParsingError::lexical(
                "unclosed comment".to_string(),
                input,
                self.inner.span().start,
                self.context_radius,
            )),
            None => Ok(Lexeme {
                token: Token::EndOfInput,
                text: "",
                span: input.len()..input.len(),
            }),
        }
    }

    /// Builds a lexical error at the byte offset `at` of the input.
    pub(crate) fn lexical_error(&self, msg: String, at: usize) -> ParsingError {
        ParsingError::lexical(msg, self.input(), at, self.context_radius)
    }

    /// Builds a grammar error at the byte offset `at` of the input.
    pub(crate) fn grammar_error(&self, msg: String, at: usize) -> ParsingError {
        ParsingError::grammar(msg, self.input(), at, self.context_radius)
    }
}

/// Tokenizes all of `input`, excluding the final [Token::EndOfInput].
///
/// # Errors
/// Returns the first lexical error encountered.
pub fn tokenize(input: &str) -> Result<Vec<Lexeme<'_>>, ParsingError> {
    let mut lexer = Lexer::new(input);
    let mut lexemes = Vec::new();
    loop {
        let lexeme = lexer.next_lexeme()?;
        if lexeme.token == Token::EndOfInput {
            return Ok(lexemes);
        }
        lexemes.push(lexeme);
    }
}
