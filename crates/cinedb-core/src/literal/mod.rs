//! Decoder for nested literal cells such as `[{'id': 18, 'name': 'Drama'}]`.

mod lexer;
mod parser;

pub use parser::Parser;

use thiserror::Error;

/// Error while decoding a literal cell.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    /// The error message.
    pub message: String,
    /// Byte offset in the source.
    pub offset: usize,
}

impl LiteralError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Parse a JSON or Python-style literal into a JSON value.
pub fn parse(source: &str) -> Result<serde_json::Value, LiteralError> {
    Parser::new(source)?.parse_document()
}
