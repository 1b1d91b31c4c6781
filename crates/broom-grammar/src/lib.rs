//! Tag grammar for the broom HTML cleaner.
//!
//! Maps a tag name to the static rules the tree-construction engine
//! consults for every token: what the tag may contain, which open tags it
//! force-closes, which ancestors it cannot live without, and where it
//! belongs in the document envelope. Lookup is pure and side-effect-free.

/// Rule table construction.
pub mod rule;
/// Default HTML rule set.
pub mod table;

pub use rule::{ChildKind, ContentKind, Placement, TagRule};
pub use table::HtmlTagProvider;

/// Supplies the per-tag-name rules driving tree construction.
///
/// Implementations must be pure: the engine queries the same name many
/// times and may cache the returned reference for the duration of a call.
pub trait TagProvider {
    /// Rule for a (lowercased) tag name, or `None` for unknown tags.
    fn rule(&self, name: &str) -> Option<&TagRule>;
}
