//! Token types produced by the tokenizer.

use broom_dom::AttrMap;

/// One lexical unit of the input markup.
///
/// Tag names are already lowercased and attribute values entity-decoded;
/// the cleaner never touches the original source text again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An opening tag, e.g. `<td colspan="2">`.
    StartTag {
        /// Lowercased tag name.
        name: String,
        /// Attributes in source order.
        attrs: AttrMap,
        /// Whether the tag carried a `/>` terminator.
        self_closing: bool,
    },
    /// A closing tag, e.g. `</td>`.
    EndTag {
        /// Lowercased tag name.
        name: String,
    },
    /// A run of document text, entities decoded.
    Text(String),
    /// A comment body (without the `<!--` / `-->` delimiters).
    Comment(String),
    /// The verbatim content of a `script` or `style` section.
    Raw(String),
}

impl Token {
    /// The tag name for start and end tags, `None` otherwise.
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Self::StartTag { name, .. } | Self::EndTag { name } => Some(name),
            _ => None,
        }
    }

    /// Whether this is a text token consisting only of whitespace.
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text(t) if t.chars().all(char::is_whitespace))
    }
}
