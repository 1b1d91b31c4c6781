//! Forgiving HTML lexer.
//!
//! Splits raw markup into start tags, end tags, text, comments, and raw
//! script/style sections. Never fails: malformed markup degrades to text.

/// Lexer implementation.
pub mod core;
/// Token types produced by the lexer.
pub mod token;

pub use self::core::{Tokenizer, TokenizerOutput};
pub use token::Token;
