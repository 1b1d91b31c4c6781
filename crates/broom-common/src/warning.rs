//! Deduplicated advisory output for markup repairs.
//!
//! The engine drops and relocates markup as it repairs a document; these
//! advisories surface those decisions on stderr without repeating the
//! same note for every occurrence in the input.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, OnceLock};

const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

static SEEN: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();

fn seen() -> MutexGuard<'static, HashSet<String>> {
    let lock = SEEN.get_or_init(|| Mutex::new(HashSet::new()));
    match lock.lock() {
        Ok(guard) => guard,
        // a panic while holding the lock leaves the set usable
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Print an advisory on stderr, once per unique topic and message.
pub fn warn_once(topic: &str, message: &str) {
    let fresh = seen().insert(format!("{topic}: {message}"));
    if fresh {
        eprintln!("{YELLOW}broom {topic}: {message}{RESET}");
    }
}

/// Forget every advisory printed so far. The engine calls this at the
/// start of each document so repeated cleans report afresh.
pub fn clear_warnings() {
    seen().clear();
}
