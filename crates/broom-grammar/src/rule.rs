//! The per-tag rule record and its builder.

use std::collections::HashSet;

use strum_macros::Display;

/// What a tag may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ContentKind {
    /// Ordinary content model: child elements and text.
    All,
    /// Empty tag (`br`, `img`, ...): never holds a body; an end tag is
    /// meaningless for it.
    None,
}

/// Where a tag belongs in the document envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Placement {
    /// Body content.
    Body,
    /// Always moved under `head` (e.g. `title`, `meta`).
    Head,
    /// Moved under `head` only while the head section is still open
    /// (e.g. `style`, `script`).
    HeadAndBody,
}

/// The kind of child the engine is asking about when it checks whether a
/// token is allowed inside the innermost open tag.
#[derive(Debug, Clone, Copy)]
pub enum ChildKind<'a> {
    /// A child element with this tag name.
    Element(&'a str),
    /// Document text.
    Text,
    /// A comment.
    Comment,
    /// A raw script/style section.
    Raw,
}

/// Static nesting rules for one tag name.
///
/// Built with the chained `define_*` methods; all name lists are
/// comma-separated, mirroring how the table in [`crate::table`] reads.
#[derive(Debug, Clone)]
pub struct TagRule {
    name: String,
    content: ContentKind,
    placement: Placement,
    deprecated: bool,
    unique: bool,
    ignore_permitted: bool,
    child_tags: HashSet<String>,
    higher_tags: HashSet<String>,
    must_close: HashSet<String>,
    copy_tags: HashSet<String>,
    continue_after: HashSet<String>,
    permitted_siblings: HashSet<String>,
    required_parent: Option<String>,
    fatal_ancestors: HashSet<String>,
}

fn name_set(list: &str) -> HashSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl TagRule {
    /// Create a rule with the given content model and placement.
    #[must_use]
    pub fn new(name: &str, content: ContentKind, placement: Placement) -> Self {
        Self {
            name: name.to_string(),
            content,
            placement,
            deprecated: false,
            unique: false,
            ignore_permitted: false,
            child_tags: HashSet::new(),
            higher_tags: HashSet::new(),
            must_close: HashSet::new(),
            copy_tags: HashSet::new(),
            continue_after: HashSet::new(),
            permitted_siblings: HashSet::new(),
            required_parent: None,
            fatal_ancestors: HashSet::new(),
        }
    }

    /// Mark the tag deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Mark the tag unique: a second occurrence while one was already
    /// seen open is dropped.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Content that is not permitted inside this tag is silently dropped
    /// instead of being relocated.
    #[must_use]
    pub fn ignore_permitted(mut self) -> Self {
        self.ignore_permitted = true;
        self
    }

    /// Restrict the tag's element children to this list. Tags with an
    /// explicit child list also reject raw text.
    #[must_use]
    pub fn define_children(mut self, list: &str) -> Self {
        self.child_tags = name_set(list);
        self
    }

    /// Tags of higher closing precedence than this one (its structural
    /// ancestors), consulted for required-parent synthesis.
    #[must_use]
    pub fn define_higher(mut self, list: &str) -> Self {
        self.higher_tags = name_set(list);
        self
    }

    /// Open tags this tag force-closes when one of them is innermost.
    #[must_use]
    pub fn define_close_before(mut self, list: &str) -> Self {
        self.must_close.extend(name_set(list));
        self
    }

    /// Like [`Self::define_close_before`], but the closed tag's start
    /// token is also duplicated inside this tag so its effect continues
    /// after the split (inline formatting interrupted by a cell break).
    #[must_use]
    pub fn define_close_before_copy_inside(mut self, list: &str) -> Self {
        let set = name_set(list);
        self.must_close.extend(set.iter().cloned());
        self.copy_tags.extend(set);
        self
    }

    /// Inner tags that are resumed (cloned back in) after this tag's end
    /// token closes over them.
    #[must_use]
    pub fn define_continue_after(mut self, list: &str) -> Self {
        self.continue_after = name_set(list);
        self
    }

    /// A mutually exclusive family: if any of these tags is already open,
    /// this tag is dropped.
    #[must_use]
    pub fn define_permitted_siblings(mut self, list: &str) -> Self {
        self.permitted_siblings = name_set(list);
        self
    }

    /// The parent tag synthesized when this tag appears without it at the
    /// correct nesting depth.
    #[must_use]
    pub fn define_required_parent(mut self, name: &str) -> Self {
        self.required_parent = Some(name.to_string());
        self
    }

    /// Ancestors without any of which this tag is void. The check passes
    /// as soon as one member of the list is open.
    #[must_use]
    pub fn define_fatal(mut self, list: &str) -> Self {
        self.fatal_ancestors = name_set(list);
        self
    }

    // ---- queries ----

    /// Tag name this rule is keyed by.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the tag can hold content at all.
    #[must_use]
    pub fn allows_body(&self) -> bool {
        self.content != ContentKind::None
    }

    /// Whether this is an empty tag.
    #[must_use]
    pub fn is_empty_tag(&self) -> bool {
        self.content == ContentKind::None
    }

    /// Whether the tag accepts arbitrary content (no child restriction).
    #[must_use]
    pub fn allows_anything(&self) -> bool {
        self.content == ContentKind::All && self.child_tags.is_empty()
    }

    /// Whether the tag is deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Whether the tag must not occur twice.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether disallowed content is dropped rather than relocated.
    #[must_use]
    pub fn is_ignore_permitted(&self) -> bool {
        self.ignore_permitted
    }

    /// Whether `other` has higher closing precedence than this tag.
    #[must_use]
    pub fn is_higher(&self, other: &str) -> bool {
        self.higher_tags.contains(other)
    }

    /// Whether this tag force-closes an innermost open tag named `last`.
    #[must_use]
    pub fn must_close(&self, last: &str) -> bool {
        self.must_close.contains(last)
    }

    /// Whether any copy-on-close tags are defined.
    #[must_use]
    pub fn has_copy_tags(&self) -> bool {
        !self.copy_tags.is_empty()
    }

    /// Whether `name` is duplicated inside this tag after a forced close.
    #[must_use]
    pub fn is_copy(&self, name: &str) -> bool {
        self.copy_tags.contains(name)
    }

    /// Whether `name` is resumed after this tag's end token closes it.
    #[must_use]
    pub fn continues_after(&self, name: &str) -> bool {
        self.continue_after.contains(name)
    }

    /// Whether a mutually exclusive family is defined.
    #[must_use]
    pub fn has_permitted_siblings(&self) -> bool {
        !self.permitted_siblings.is_empty()
    }

    /// The mutually exclusive family.
    #[must_use]
    pub fn permitted_siblings(&self) -> &HashSet<String> {
        &self.permitted_siblings
    }

    /// The parent to synthesize when absent.
    #[must_use]
    pub fn required_parent(&self) -> Option<&str> {
        self.required_parent.as_deref()
    }

    /// The fatal-ancestor list (empty when unconstrained).
    #[must_use]
    pub fn fatal_ancestors(&self) -> &HashSet<String> {
        &self.fatal_ancestors
    }

    /// Whether the tag always belongs in the head section.
    #[must_use]
    pub fn is_head_tag(&self) -> bool {
        self.placement == Placement::Head
    }

    /// Whether the tag belongs in the head only while head is still open.
    #[must_use]
    pub fn is_head_and_body_tag(&self) -> bool {
        self.placement == Placement::HeadAndBody
    }

    /// Whether the given child may appear as direct content of this tag.
    ///
    /// Scripts are always accepted. Elements are checked against the
    /// explicit child list when one exists, otherwise against the
    /// higher-precedence exclusion list. Text and raw sections are
    /// rejected by tags with an explicit child list; comments pass
    /// everywhere.
    #[must_use]
    pub fn allows_child(&self, child: ChildKind<'_>) -> bool {
        if !self.allows_body() {
            return false;
        }
        match child {
            ChildKind::Element(name) => {
                if name == "script" {
                    true
                } else if !self.child_tags.is_empty() {
                    self.child_tags.contains(name)
                } else if !self.higher_tags.is_empty() {
                    !self.higher_tags.contains(name)
                } else {
                    true
                }
            }
            ChildKind::Text | ChildKind::Raw => self.child_tags.is_empty(),
            ChildKind::Comment => true,
        }
    }
}
