//! Bookkeeping for tags that are open while the working list is walked:
//! the open-tag ledger, the child-break stack, and the saved nesting
//! levels used when relocated content is rebuilt.

use std::collections::HashSet;

use broom_grammar::TagRule;

/// One open tag: where its start slot sits and which rule governs it.
#[derive(Debug, Clone)]
pub struct OpenTagRecord<'p> {
    /// Index of the start slot in the working list.
    pub position: usize,
    /// Lowercased tag name.
    pub name: String,
    /// Cached grammar rule, `None` for unknown tags.
    pub rule: Option<&'p TagRule>,
}

/// Stack of currently open tags, innermost last.
///
/// Also remembers every name ever opened on this level, which is what the
/// uniqueness check looks at: a unique tag stays "encountered" after it
/// closes.
#[derive(Debug, Default)]
pub struct OpenTags<'p> {
    list: Vec<OpenTagRecord<'p>>,
    seen: HashSet<String>,
}

impl<'p> OpenTags<'p> {
    /// Fresh, empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly opened tag.
    pub fn add_tag(&mut self, name: &str, position: usize, rule: Option<&'p TagRule>) {
        self.list.push(OpenTagRecord {
            position,
            name: name.to_string(),
            rule,
        });
        let _ = self.seen.insert(name.to_string());
    }

    /// Remove the innermost record with this name, if any.
    pub fn remove_tag(&mut self, name: &str) {
        if let Some(idx) = self.list.iter().rposition(|r| r.name == name) {
            let _ = self.list.remove(idx);
        }
    }

    /// Whether no tags are open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// The innermost open tag.
    #[must_use]
    pub fn last(&self) -> Option<&OpenTagRecord<'p>> {
        self.list.last()
    }

    /// The outermost open tag.
    #[must_use]
    pub fn first(&self) -> Option<&OpenTagRecord<'p>> {
        self.list.first()
    }

    /// All records, outermost first.
    #[must_use]
    pub fn records(&self) -> &[OpenTagRecord<'p>] {
        &self.list
    }

    /// Whether a tag with this name is currently open.
    #[must_use]
    pub fn is_open(&self, name: &str) -> bool {
        self.list.iter().any(|r| r.name == name)
    }

    /// Whether this name was ever opened on this level.
    #[must_use]
    pub fn tag_encountered(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    /// Whether any of the given names is currently open.
    #[must_use]
    pub fn some_already_open(&self, names: &HashSet<String>) -> bool {
        self.list.iter().any(|r| names.contains(&r.name))
    }

    /// Position of the innermost open tag matching `name`, searching from
    /// the top of the stack. The search stops short at a fatal ancestor
    /// of the searched tag: an end tag never closes across one.
    #[must_use]
    pub fn find_tag(&self, name: &str, rule: Option<&TagRule>) -> Option<usize> {
        for rec in self.list.iter().rev() {
            if rec.name == name {
                return Some(rec.position);
            }
            if rule.is_some_and(|r| r.fatal_ancestors().contains(&rec.name)) {
                return None;
            }
        }
        None
    }

    /// The open tag whose start slot should buffer relocated content.
    ///
    /// Walking down from the innermost tag, the first permissive record
    /// (unknown or unrestricted) yields the record just above it;
    /// otherwise the outermost record wins.
    #[must_use]
    pub fn find_rubbish_slot(&self) -> Option<usize> {
        let mut prev: Option<&OpenTagRecord<'p>> = None;
        let mut result = None;
        for rec in self.list.iter().rev() {
            result = Some(rec);
            if rec.rule.is_none_or(TagRule::allows_anything) {
                if let Some(above) = prev {
                    return Some(above.position);
                }
            }
            prev = Some(rec);
        }
        result.map(|r| r.position)
    }
}

/// A tag name together with its slot position.
#[derive(Debug, Clone)]
pub struct ChildBreak {
    /// Slot index in the working list.
    pub position: usize,
    /// Lowercased tag name.
    pub name: String,
}

/// Paired stacks tracking tags that were closed early because a child
/// forced them shut (`<table><tr><td>a<tr>`: the second `tr` breaks the
/// first). When the breaking tag's end token arrives, the broken tag is
/// reopened after it.
#[derive(Debug, Default)]
pub struct ChildBreaks {
    closed: Vec<ChildBreak>,
    breaking: Vec<ChildBreak>,
}

impl ChildBreaks {
    /// Record that `breaking` forced `closed` shut.
    pub fn add_break(&mut self, closed: ChildBreak, breaking: ChildBreak) {
        self.closed.push(closed);
        self.breaking.push(breaking);
    }

    /// Drop the top break pair, returning the closed tag's record.
    pub fn pop(&mut self) -> Option<ChildBreak> {
        let _ = self.breaking.pop();
        self.closed.pop()
    }

    /// Whether no breaks are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty()
    }

    /// Name of the most recent breaking tag.
    #[must_use]
    pub fn last_breaking_tag(&self) -> Option<&str> {
        self.breaking.last().map(|b| b.name.as_str())
    }

    /// Position of the most recent breaking tag.
    #[must_use]
    pub fn last_breaking_position(&self) -> Option<usize> {
        self.breaking.last().map(|b| b.position)
    }

    /// Position of the most recently broken (closed) tag.
    #[must_use]
    pub fn last_closed_position(&self) -> Option<usize> {
        self.closed.last().map(|b| b.position)
    }
}

/// Ledger state saved while a relocation buffer is rebuilt as its own
/// sub-list; the buffer must not see the outer document's open tags.
#[derive(Debug, Default)]
pub struct NestingState<'p> {
    /// The outer level's open tags.
    pub open_tags: OpenTags<'p>,
    /// The outer level's child breaks.
    pub child_breaks: ChildBreaks,
}
