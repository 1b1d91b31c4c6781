//! The mutable working list the tree-construction pass walks.
//!
//! Every token becomes one slot. Slots are cleared in place rather than
//! removed, so positions recorded in the open-tag ledger stay valid for
//! the whole pass; only insertions at or after the cursor are allowed.

use broom_dom::{NodeId, NodeTree};

use crate::tokenizer::Token;

/// One position in the working list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Logically deleted.
    Empty,
    /// A node in the arena: an element (formed or still a start token),
    /// text, a comment, or a raw section.
    Node(NodeId),
    /// An end-tag token, by name.
    End(String),
    /// Several finished nodes sharing one position: a closed element
    /// together with content that was relocated out of it.
    Group(Vec<NodeId>),
}

/// The working list itself.
#[derive(Debug, Default)]
pub struct TokenStream {
    slots: Vec<Slot>,
}

impl TokenStream {
    /// Turn lexed tokens into slots, allocating an arena node for every
    /// token that can end up in the tree.
    ///
    /// `needs_end_tag` decides whether a self-closing start tag is
    /// expanded into a start/end pair; empty tags close themselves.
    pub fn from_tokens<F>(tokens: Vec<Token>, tree: &mut NodeTree, needs_end_tag: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let mut slots = Vec::with_capacity(tokens.len());
        for token in tokens {
            match token {
                Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                } => {
                    slots.push(Slot::Node(tree.new_element(&name, attrs)));
                    if self_closing && needs_end_tag(&name) {
                        slots.push(Slot::End(name));
                    }
                }
                Token::EndTag { name } => slots.push(Slot::End(name)),
                Token::Text(t) => slots.push(Slot::Node(tree.new_text(t))),
                Token::Comment(c) => slots.push(Slot::Node(tree.new_comment(c))),
                Token::Raw(r) => slots.push(Slot::Node(tree.new_raw(r))),
            }
        }
        Self { slots }
    }

    /// Wrap already-built slots, used when content relocated into a
    /// holding buffer is rebuilt as its own sub-list.
    #[must_use]
    pub fn from_slots(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    /// Number of slots, cleared ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the list has no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The slot at `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&Slot> {
        self.slots.get(idx)
    }

    /// Overwrite the slot at `idx`.
    pub fn set(&mut self, idx: usize, slot: Slot) {
        if let Some(s) = self.slots.get_mut(idx) {
            *s = slot;
        }
    }

    /// Logically delete the slot at `idx`.
    pub fn clear(&mut self, idx: usize) {
        self.set(idx, Slot::Empty);
    }

    /// Take the slot at `idx`, leaving it cleared.
    pub fn take(&mut self, idx: usize) -> Slot {
        match self.slots.get_mut(idx) {
            Some(s) => std::mem::replace(s, Slot::Empty),
            None => Slot::Empty,
        }
    }

    /// Insert a slot, shifting everything at and after `idx`. Callers
    /// only insert at or after their cursor so ledger positions before
    /// it keep pointing at the right slots.
    pub fn insert(&mut self, idx: usize, slot: Slot) {
        if idx <= self.slots.len() {
            self.slots.insert(idx, slot);
        }
    }

    /// The node occupying `idx`, if the slot holds exactly one.
    #[must_use]
    pub fn node_at(&self, idx: usize) -> Option<NodeId> {
        match self.slots.get(idx) {
            Some(Slot::Node(id)) => Some(*id),
            _ => None,
        }
    }

    /// Consume the list, yielding the surviving nodes in order.
    #[must_use]
    pub fn into_node_ids(self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for slot in self.slots {
            match slot {
                Slot::Node(id) => ids.push(id),
                Slot::Group(group) => ids.extend(group),
                Slot::Empty | Slot::End(_) => {}
            }
        }
        ids
    }

    /// Consume the list, yielding the raw slots.
    #[must_use]
    pub fn into_slots(self) -> Vec<Slot> {
        self.slots
    }
}
