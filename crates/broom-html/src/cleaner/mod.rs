//! The forgiving tree-construction engine.
//!
//! Turns a flat token stream into a well-formed tree: matching tags
//! close normally, mismatched ones are repaired in place, and a final
//! assembly step hangs everything under a synthetic document envelope.

/// The engine itself.
pub mod core;
/// Open-tag ledger and child-break bookkeeping.
pub mod open_tags;
/// The in-place working list.
pub mod stream;

pub use self::core::{CleanResult, Cleaner};
pub use stream::{Slot, TokenStream};
