//! Low-level NHX tokenizer and error reporting.
//!
//! The [Lexer] turns raw text into [Token]s, the grammar in
//! [crate::nhx::parser] pulls them one at a time. All failures are reported
//! as [ParsingError], located by character position.

pub mod lexer;
pub mod parsing_error;

pub use lexer::{Lexeme, Lexer, Token};
pub use parsing_error::{ErrorContext, ParsingError, ParsingErrorType};
