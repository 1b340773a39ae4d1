//! Error types for the NHX parser.
//!
//! This module provides [ParsingError] and [ParsingErrorType] for representing
//! and reporting errors that occur while parsing an NHX tree. Positional
//! errors render a window of the input around the offending character with
//! a caret underneath it.

use std::fmt;

/// Default number of characters shown on each side of the error position
pub(crate) const DEFAULT_CONTEXT_RADIUS: usize = 20;

/// Maximum number of characters of an offending token shown in a message
const TOKEN_PREVIEW_LENGTH: usize = 20;

// =#========================================================================#=
// PARSING ERROR TYPE
// =#========================================================================$=
/// Error types that can occur during NHX parsing.
#[derive(PartialEq, Eq, Debug, Clone, thiserror::Error)]
pub enum ParsingErrorType {
    /// Input at the current position matches no token rule,
    /// including running off the end of input while a token was expected.
    #[error("Lexical error - {0}")]
    LexicalError(String),
    /// A token was read that the current grammar state does not accept.
    #[error("Grammar error - {0}")]
    GrammarError(String),
    /// Reading the input stream failed.
    #[error("IO error - {0}")]
    IoError(String),
    /// The parser was already used; call `reset()` before parsing again.
    #[error("Parser already used, reset it before parsing again")]
    ParserExhausted,
}

// =#========================================================================#=
// ERROR CONTEXT
// =#========================================================================$=
/// Window of input around an error position, rendered with a caret marker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Surrounding input, with line breaks and tabs flattened to spaces
    window: String,
    /// Character column of the error position within `window`
    caret: usize,
}

impl ErrorContext {
    /// Cuts a window of `radius` characters on each side of the character
    /// at `char_position` out of `input`.
    fn around(input: &str, char_position: usize, radius: usize) -> Self {
        let start = char_position.saturating_sub(radius);
        let window = input
            .chars()
            .skip(start)
            .take(char_position - start + radius + 1)
            .map(|c| if c.is_whitespace() { ' ' } else { c })
            .collect();

        Self {
            window,
            caret: char_position - start,
        }
    }

    /// Returns the rendered input window.
    pub fn window(&self) -> &str {
        &self.window
    }

    /// Returns the column of the caret within the window.
    pub fn caret(&self) -> usize {
        self.caret
    }

    fn is_empty(&self) -> bool {
        self.window.is_empty() && self.caret == 0
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "\n  {}\n  {}^", self.window, " ".repeat(self.caret))
    }
}

// =#========================================================================#=
// PARSING ERROR
// =#========================================================================$=
/// Parsing error with contextual information
/// (character position and surrounding input).
///
/// Errors not tied to the input text, such as [ParsingErrorType::IoError]
/// and [ParsingErrorType::ParserExhausted], carry no position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}{}", location(.position, .context))]
pub struct ParsingError {
    kind: ParsingErrorType,
    position: Option<usize>,
    context: ErrorContext,
}

/// Renders the position suffix of an error message, if there is a position.
fn location(position: &Option<usize>, context: &ErrorContext) -> String {
    match position {
        Some(position) => format!(" at position {position}{context}"),
        None => String::new(),
    }
}

impl ParsingError {
    /// Create a ParsingError located at byte offset `byte_offset` of `input`.
    ///
    /// The offset is converted to a character position; the context shows
    /// `radius` characters on each side of it.
    pub(crate) fn at(
        kind: ParsingErrorType,
        input: &str,
        byte_offset: usize,
        radius: usize,
    ) -> Self {
        let byte_offset = byte_offset.min(input.len());
        let position = input
            .char_indices()
            .take_while(|&(i, _)| i < byte_offset)
            .count();

        Self {
            kind,
            position: Some(position),
            context: ErrorContext::around(input, position, radius),
        }
    }

    /// Convenience constructor for LexicalError
    pub(crate) fn lexical(msg: String, input: &str, byte_offset: usize, radius: usize) -> Self {
        Self::at(ParsingErrorType::LexicalError(msg), input, byte_offset, radius)
    }

    /// Convenience constructor for GrammarError
    pub(crate) fn grammar(msg: String, input: &str, byte_offset: usize, radius: usize) -> Self {
        Self::at(ParsingErrorType::GrammarError(msg), input, byte_offset, radius)
    }

    /// Create a ParsingError without position and input context
    pub fn without_context(kind: ParsingErrorType) -> Self {
        Self {
            kind,
            position: None,
            context: ErrorContext::default(),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> &ParsingErrorType {
        &self.kind
    }

    /// Get the (0-based, character) position where the error occurred,
    /// `None` for errors not tied to the input text
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Get the input window around the error position
    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Returns whether this error stems from the tokenizer.
    pub fn is_lexical(&self) -> bool {
        matches!(self.kind, ParsingErrorType::LexicalError(_))
    }

    /// Returns whether this error stems from the grammar.
    pub fn is_grammar(&self) -> bool {
        matches!(self.kind, ParsingErrorType::GrammarError(_))
    }
}

/// Decodes `bytes` as UTF-8 text.
///
/// # Errors
/// Returns a [ParsingErrorType::LexicalError] located at the character
/// offset of the first invalid byte.
pub(crate) fn decode_utf8(bytes: Vec<u8>, radius: usize) -> Result<String, ParsingError> {
    String::from_utf8(bytes).map_err(|err| {
        let valid_up_to = err.utf8_error().valid_up_to();
        let msg = match err.as_bytes().get(valid_up_to) {
            Some(byte) => format!("invalid UTF-8 byte 0x{byte:02X}"),
            None => "invalid UTF-8".to_string(),
        };
        // Identical to the input up to the first invalid byte
        let lossy = String::from_utf8_lossy(err.as_bytes());
        ParsingError::lexical(msg, &lossy, valid_up_to, radius)
    })
}

impl From<std::io::Error> for ParsingError {
    fn from(err: std::io::Error) -> Self {
        Self::without_context(ParsingErrorType::IoError(err.to_string()))
    }
}

/// Quotes `text` for an error message, truncated to a bounded preview.
pub(crate) fn preview(text: &str) -> String {
    if text.chars().count() > TOKEN_PREVIEW_LENGTH {
        let truncated: String = text.chars().take(TOKEN_PREVIEW_LENGTH).collect();
        format!("'{truncated}...'")
    } else {
        format!("'{text}'")
    }
}

// =#========================================================================#=
// TESTS - PARSING ERROR
// =#========================================================================$=
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_window_and_caret() {
        let error = ParsingError::grammar("oops".to_string(), "(A:1,B:2)C:3;", 5, 3);
        assert_eq!(error.position(), Some(5));
        assert_eq!(error.context().window(), ":1,B:2)");
        assert_eq!(error.context().caret(), 3);
        assert_eq!(
            error.to_string(),
            "Grammar error - oops at position 5\n  :1,B:2)\n     ^"
        );
    }

    #[test]
    fn test_position_counts_characters() {
        let input = "(Å,ö)€";
        let error = ParsingError::lexical("bad".to_string(), input, input.find('€').unwrap(), 20);
        assert_eq!(error.position(), Some(5));
        assert_eq!(error.context().caret(), 5);
    }

    #[test]
    fn test_error_at_end_of_input() {
        let error = ParsingError::lexical("end".to_string(), "(A,\nB", 5, 2);
        assert_eq!(error.position(), Some(5));
        assert_eq!(error.context().window(), " B");
        assert_eq!(error.context().caret(), 2);
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("ADH2"), "'ADH2'");
        assert_eq!(preview(&"x".repeat(30)), format!("'{}...'", "x".repeat(20)));
    }

    #[test]
    fn test_without_context_has_no_position() {
        let error = ParsingError::without_context(ParsingErrorType::ParserExhausted);
        assert_eq!(error.position(), None);
        assert_eq!(error.to_string(), "Parser already used, reset it before parsing again");
    }

    #[test]
    fn test_invalid_utf8_is_located() {
        let error = decode_utf8(b"(\xC3\xA4,B\xFF);".to_vec(), 20).unwrap_err();
        assert!(error.is_lexical());
        assert_eq!(error.position(), Some(4));
        assert_eq!(error.context().caret(), 4);
        assert!(
            error
                .to_string()
                .starts_with("Lexical error - invalid UTF-8 byte 0xFF at position 4")
        );

        assert_eq!(decode_utf8(b"(A,B);".to_vec(), 20).unwrap(), "(A,B);");
    }
}
