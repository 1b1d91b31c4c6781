//! Node tree for the broom HTML cleaner.
//!
//! This crate provides the arena-based tree that the tree-construction
//! engine repairs malformed markup into.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all
//! relationships. A node's parent link is a plain index back into the same
//! arena - a non-owning relation, so the child list stays the single owner
//! of every subtree and ancestor walks need no reference counting.
//! Node equality is by identity ([`NodeId`]), never by value.

/// Ordered attribute map for an element.
///
/// Keys are unique and keep their insertion order, which matters when the
/// finished tree is serialized back out. The map is Vec-backed with linear
/// lookup; real-world elements carry a handful of attributes at most.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrMap {
    entries: Vec<(String, String)>,
}

impl AttrMap {
    /// Create an empty attribute map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no attributes are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an attribute value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// True when an attribute with this name is present.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Insert an attribute. An existing attribute with the same name keeps
    /// its position but gets the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Insert only attributes whose names are not present yet;
    /// existing values are preserved.
    pub fn insert_missing(&mut self, other: &Self) {
        for (k, v) in other.iter() {
            if !self.contains_key(k) {
                self.insert(k, v);
            }
        }
    }

    /// Remove an attribute by name, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for AttrMap {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut map = Self::new();
        for (k, v) in pairs {
            map.insert(k, v);
        }
        map
    }
}

/// Document-type declaration captured from the input, attached to the
/// root element of the finished tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Doctype {
    /// Root element name from the declaration (usually `html`).
    pub name: String,
    /// `PUBLIC` identifier, if declared.
    pub public_id: Option<String>,
    /// `SYSTEM` identifier, if declared.
    pub system_id: Option<String>,
}

/// A type-safe index into the node arena.
///
/// `NodeId` provides O(1) access to any node in the tree without borrowing
/// issues, and doubles as node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Element-specific data.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercased tag name (may carry a namespace prefix, e.g. `svg:rect`).
    pub name: String,
    /// Ordered attribute list.
    pub attrs: AttrMap,
    /// An unformed element is still a start-tag token waiting in the
    /// stream; a formed one has been materialized into the tree.
    pub formed: bool,
    /// Set on elements the cleaner synthesized or duplicated itself
    /// (required parents, reopened broken tags, continuation clones).
    pub auto_generated: bool,
    /// Set once the element lands in the prune set.
    pub pruned: bool,
    /// Document-type record; only ever set on the root element.
    pub doctype: Option<Doctype>,
}

impl ElementData {
    /// Create element data for a start tag.
    #[must_use]
    pub fn new(name: impl Into<String>, attrs: AttrMap) -> Self {
        Self {
            name: name.into(),
            attrs,
            formed: false,
            auto_generated: false,
            pruned: false,
            doctype: None,
        }
    }

    /// Returns the element's id attribute value if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id")
    }
}

/// Document-level data carried by a fragment root. The envelope element
/// it replaces is discarded, but the declarations that lived on it are
/// not.
#[derive(Debug, Clone, Default)]
pub struct FragmentData {
    /// Attributes that would have sat on the root element, such as
    /// namespace declarations. A fragment has no tag of its own, so
    /// these never serialize; they stay inspectable.
    pub attrs: AttrMap,
    /// Document-type record.
    pub doctype: Option<Doctype>,
}

/// The kinds of node the cleaner produces.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A tag element.
    Element(ElementData),
    /// A run of document text.
    Text(String),
    /// A `<!-- -->` comment.
    Comment(String),
    /// Verbatim content of a raw-text section (script/style body).
    Raw(String),
    /// Parentless wrapper used as the root when the `html` envelope is
    /// omitted; holds what would have been the body's children.
    Fragment(FragmentData),
}

/// A single node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    /// What this node is.
    pub kind: NodeKind,
    /// Non-owning back-reference to the parent, if attached.
    pub parent: Option<NodeId>,
    /// Owned, ordered child list.
    pub children: Vec<NodeId>,
}

/// Arena-based node tree with O(1) node access.
///
/// All nodes live in a contiguous vector; parent and child relationships
/// are indices. Detached nodes stay allocated (ids remain valid) so
/// callers can inspect pruned nodes after cleaning.
#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    nodes: Vec<Node>,
}

impl NodeTree {
    /// Create an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of nodes ever allocated (attached or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no node has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by its id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its id.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Allocate a new detached node and return its id.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Allocate an unformed element with the given name and attributes.
    pub fn new_element(&mut self, name: impl Into<String>, attrs: AttrMap) -> NodeId {
        self.alloc(NodeKind::Element(ElementData::new(name, attrs)))
    }

    /// Allocate a text node.
    pub fn new_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(content.into()))
    }

    /// Allocate a comment node.
    pub fn new_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Comment(content.into()))
    }

    /// Allocate a raw-section node.
    pub fn new_raw(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Raw(content.into()))
    }

    /// Allocate an empty fragment root.
    pub fn new_fragment(&mut self) -> NodeId {
        self.alloc(NodeKind::Fragment(FragmentData::default()))
    }

    /// Append `child` as the last child of `parent`, setting the child's
    /// parent back-reference.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child {
            return;
        }
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Detach a node from its parent, clearing the back-reference.
    /// The node (and its subtree) stays allocated.
    pub fn remove_from_parent(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != id);
    }

    /// Replace a node's child list. Old children are detached first.
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for child in std::mem::take(&mut self.nodes[parent.0].children) {
            self.nodes[child.0].parent = None;
        }
        for child in children {
            self.append_child(parent, child);
        }
    }

    /// Shallow-copy an element: name and attributes only, no children,
    /// flags reset. Returns `None` for non-element nodes.
    ///
    /// Used when a broken tag must be synthetically reopened.
    pub fn shallow_copy(&mut self, id: NodeId) -> Option<NodeId> {
        let data = self.as_element(id)?;
        let copy = ElementData::new(data.name.clone(), data.attrs.clone());
        Some(self.alloc(NodeKind::Element(copy)))
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Find the first descendant (depth-first, pre-order, excluding `from`
    /// itself) matching the predicate.
    pub fn find_descendant<F>(&self, from: NodeId, mut pred: F) -> Option<NodeId>
    where
        F: FnMut(&Self, NodeId) -> bool,
    {
        let mut stack: Vec<NodeId> = self.children(from).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if pred(self, id) {
                return Some(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        None
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get fragment data if this node is a fragment root.
    #[must_use]
    pub fn as_fragment(&self, id: NodeId) -> Option<&FragmentData> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Fragment(data) => Some(data),
            _ => None,
        })
    }

    /// Get mutable fragment data if this node is a fragment root.
    pub fn as_fragment_mut(&mut self, id: NodeId) -> Option<&mut FragmentData> {
        self.get_mut(id).and_then(|n| match &mut n.kind {
            NodeKind::Fragment(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.kind {
            NodeKind::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Tag name if this node is an element.
    #[must_use]
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).map(|e| e.name.as_str())
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a NodeTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}
