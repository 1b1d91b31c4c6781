//! Cleaning options, node conditions, and repair notifications.

use std::collections::HashSet;

use broom_dom::{NodeId, NodeTree};
use strum_macros::Display;

/// A predicate over a node in the finished tree, used by the pruning
/// sweep. Conditions see the whole tree so they can look at ancestors.
pub trait NodeCondition {
    /// Whether `node` matches.
    fn satisfied(&self, tree: &NodeTree, node: NodeId) -> bool;
}

/// Matches elements by tag name (comma-separated list).
pub struct TagNameCondition {
    names: HashSet<String>,
}

impl TagNameCondition {
    /// Condition matching any of the comma-separated tag names.
    #[must_use]
    pub fn new(list: &str) -> Self {
        Self {
            names: list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_ascii_lowercase)
                .collect(),
        }
    }
}

impl NodeCondition for TagNameCondition {
    fn satisfied(&self, tree: &NodeTree, node: NodeId) -> bool {
        tree.element_name(node)
            .is_some_and(|name| self.names.contains(name))
    }
}

/// Matches elements carrying a given attribute, regardless of value.
pub struct HasAttributeCondition {
    name: String,
}

impl HasAttributeCondition {
    /// Condition matching elements with attribute `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
        }
    }
}

impl NodeCondition for HasAttributeCondition {
    fn satisfied(&self, tree: &NodeTree, node: NodeId) -> bool {
        tree.as_element(node)
            .is_some_and(|el| el.attrs.contains_key(&self.name))
    }
}

/// What to keep, drop, and synthesize while cleaning.
pub struct CleanOptions {
    /// Drop start tags with no rule in the grammar.
    pub omit_unknown_tags: bool,
    /// Drop start tags whose rule is marked deprecated.
    pub omit_deprecated_tags: bool,
    /// Return the body content wrapped in a fragment instead of the
    /// `html`/`head`/`body` envelope.
    pub omit_envelope: bool,
    /// Keep comments and trailing whitespace that precede the body as
    /// head content instead of discarding them.
    pub keep_whitespace_and_comments_in_head: bool,
    /// Recognize `xmlns:*` declarations and keep namespace-prefixed
    /// markup; when off, prefixed names are treated as plain names.
    pub namespaces_aware: bool,
    /// Subtrees rooted at a matching node are removed after assembly.
    pub prune_conditions: Vec<Box<dyn NodeCondition>>,
    /// When non-empty, the subtree of every element matching no condition
    /// is removed. Text and comments are never filtered this way.
    pub allow_conditions: Vec<Box<dyn NodeCondition>>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            omit_unknown_tags: false,
            omit_deprecated_tags: false,
            omit_envelope: false,
            keep_whitespace_and_comments_in_head: true,
            namespaces_aware: false,
            prune_conditions: Vec::new(),
            allow_conditions: Vec::new(),
        }
    }
}

/// Why the cleaner altered or dropped a piece of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum NotificationKind {
    /// Start tag with no grammar rule was dropped.
    Unknown,
    /// Deprecated start tag was dropped.
    Deprecated,
    /// A child forced its parent closed early.
    UnpermittedChild,
    /// Tag dropped because none of its fatal ancestors was open.
    FatalAncestorMissing,
    /// Tag dropped because a mutually exclusive sibling was open.
    NotAllowed,
    /// A missing structural parent was synthesized.
    RequiredParentMissing,
    /// Second occurrence of a unique tag was dropped.
    UniqueDuplicated,
    /// An open tag reached the end of input and was closed forcibly.
    UnclosedTag,
}

/// One repair the cleaner performed, tied to the node it concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    /// What happened.
    pub kind: NotificationKind,
    /// The element the repair concerned. For dropped tags this node does
    /// not appear in the finished tree.
    pub node: NodeId,
    /// Whether the repair is certainly what the author meant. Heuristic
    /// repairs (e.g. closing a tag that carries an `id`) report `false`.
    pub certain: bool,
}
