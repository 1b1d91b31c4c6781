//! Forgiving HTML cleaner.
//!
//! Takes real-world markup - unclosed tags, mis-nested tables, stray end
//! tags, duplicated uniques - and repairs it into a well-formed tree that
//! can be serialized back out as XML.
//!
//! # Pipeline
//!
//! 1. **Tokenizer** ([`tokenizer`]): lexes the input into start tags, end
//!    tags, text, comments, and raw script/style sections. It never
//!    fails; malformed markup degrades to text.
//! 2. **Engine** ([`cleaner`]): a single pass over the token list,
//!    driven by the per-tag rules in `broom-grammar`. Misplaced tags are
//!    closed, relocated, or dropped; missing structure (like a `tbody`
//!    between `table` and `tr`) is synthesized.
//! 3. **Assembly**: everything hangs under a synthetic
//!    `html`/`head`/`body` envelope, head-only tags migrate into `head`,
//!    and optional prune/allow conditions strip the finished tree.
//!
//! # Example
//!
//! ```
//! use broom_html::{CleanOptions, Cleaner, XmlWriter};
//!
//! let cleaner = Cleaner::new(CleanOptions::default());
//! let result = cleaner.clean("<b>bold<i>both</b>italic");
//! let xml = XmlWriter::new(false)
//!     .write_document(&result.tree, result.root)
//!     .unwrap();
//! assert!(xml.contains("<b>bold<i>both</i></b>"));
//! ```

/// The tree-construction engine.
pub mod cleaner;
/// Options, node conditions, and repair notifications.
pub mod options;
/// XML output.
pub mod serialize;
/// The lexer.
pub mod tokenizer;

pub use cleaner::{CleanResult, Cleaner};
pub use options::{
    CleanOptions, HasAttributeCondition, NodeCondition, Notification, NotificationKind,
    TagNameCondition,
};
pub use serialize::XmlWriter;
pub use tokenizer::{Token, Tokenizer, TokenizerOutput};

use broom_dom::NodeId;
use thiserror::Error;

/// Errors from operations on an already-cleaned tree.
///
/// Cleaning itself never fails; these only arise when callers hand a
/// stale or foreign [`NodeId`] to the serializer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CleanError {
    /// The node id does not exist in this tree.
    #[error("node {0:?} does not exist in the tree")]
    MissingNode(NodeId),
    /// The node exists but cannot carry children.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
}
