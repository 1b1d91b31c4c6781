//! The tree-construction engine.
//!
//! A single pass walks the working list left to right and mutates it in
//! place: matched tags close into finished nodes, misplaced tags force
//! their parents shut or get relocated, and missing structure is
//! synthesized. Slots are cleared rather than removed so every position
//! recorded in the open-tag ledger stays valid; reprocessing only ever
//! moves the cursor backwards to the current token, never before it.

use std::collections::{BTreeSet, HashMap, HashSet};

use broom_common::warning::{clear_warnings, warn_once};
use broom_dom::{AttrMap, Doctype, NodeId, NodeKind, NodeTree};
use broom_grammar::{ChildKind, HtmlTagProvider, TagProvider, TagRule};

use super::open_tags::{ChildBreak, ChildBreaks, NestingState, OpenTags};
use super::stream::{Slot, TokenStream};
use crate::options::{CleanOptions, Notification, NotificationKind};
use crate::tokenizer::{Token, Tokenizer, TokenizerOutput};

/// The finished product of one cleaning run.
pub struct CleanResult {
    /// Arena holding every node, the dropped ones included.
    pub tree: NodeTree,
    /// Document root: the `html` element, or a fragment when the
    /// envelope is omitted.
    pub root: NodeId,
    /// Every tag name seen in the input, in sorted order.
    pub all_tags: BTreeSet<String>,
    /// Subtree roots removed by the pruning sweep.
    pub pruned: Vec<NodeId>,
    /// Repairs performed, in the order they happened.
    pub notifications: Vec<Notification>,
}

/// Per-run working state. Lives for one `clean` call; `'p` ties cached
/// rule references to the cleaner's grammar.
struct CleanState<'p> {
    tree: NodeTree,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    head_opened: bool,
    body_opened: bool,
    all_tags: BTreeSet<String>,
    head_candidates: Vec<NodeId>,
    head_candidate_set: HashSet<NodeId>,
    /// Relocated slots, buffered per target start-tag node until that
    /// tag closes.
    rubbish: HashMap<NodeId, Vec<Slot>>,
    open_tags: OpenTags<'p>,
    child_breaks: ChildBreaks,
    saved_nesting: Vec<NestingState<'p>>,
    notifications: Vec<Notification>,
}

impl<'p> CleanState<'p> {
    /// Enter a nested build with a fresh ledger.
    fn push_nesting(&mut self) {
        self.saved_nesting.push(NestingState {
            open_tags: std::mem::take(&mut self.open_tags),
            child_breaks: std::mem::take(&mut self.child_breaks),
        });
    }

    /// Restore the enclosing build's ledger.
    fn pop_nesting(&mut self) {
        if let Some(outer) = self.saved_nesting.pop() {
            self.open_tags = outer.open_tags;
            self.child_breaks = outer.child_breaks;
        }
    }

    fn notify(&mut self, kind: NotificationKind, node: NodeId, certain: bool) {
        self.notifications.push(Notification {
            kind,
            node,
            certain,
        });
    }

    fn add_head_candidate(&mut self, id: NodeId) {
        if self.head_candidate_set.insert(id) {
            self.head_candidates.push(id);
        }
    }
}

/// An element closed by a forced-close sweep, in document order.
struct ClosedTag {
    id: NodeId,
    name: String,
}

/// The cleaner: a tag grammar plus options.
///
/// Stateless between runs; one instance can clean any number of
/// documents.
pub struct Cleaner {
    provider: Box<dyn TagProvider>,
    options: CleanOptions,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new(CleanOptions::default())
    }
}

impl Cleaner {
    /// Cleaner with the default HTML grammar.
    #[must_use]
    pub fn new(options: CleanOptions) -> Self {
        Self::with_provider(Box::new(HtmlTagProvider::new()), options)
    }

    /// Cleaner with a custom grammar.
    #[must_use]
    pub fn with_provider(provider: Box<dyn TagProvider>, options: CleanOptions) -> Self {
        Self { provider, options }
    }

    /// The options this cleaner runs with.
    #[must_use]
    pub fn options(&self) -> &CleanOptions {
        &self.options
    }

    /// Clean a document from raw markup.
    #[must_use]
    pub fn clean(&self, input: &str) -> CleanResult {
        let TokenizerOutput { tokens, doctype } = Tokenizer::new(input).run();
        self.build(tokens, doctype)
    }

    /// Clean an already-tokenized document.
    #[must_use]
    pub fn clean_tokens(&self, tokens: Vec<Token>) -> CleanResult {
        self.build(tokens, None)
    }

    fn build<'p>(&'p self, tokens: Vec<Token>, doctype: Option<Doctype>) -> CleanResult {
        clear_warnings();
        let mut prefixes = BTreeSet::new();
        if self.options.namespaces_aware {
            for token in &tokens {
                if let Token::StartTag { name, .. } = token {
                    if let Some(colon) = name.find(':') {
                        let _ = prefixes.insert(name[..colon].to_string());
                    }
                }
            }
        }

        let mut tree = NodeTree::new();
        let html = tree.new_element("html", AttrMap::new());
        let head = tree.new_element("head", AttrMap::new());
        let body = tree.new_element("body", AttrMap::new());
        for id in [html, head, body] {
            if let Some(el) = tree.as_element_mut(id) {
                el.formed = true;
            }
        }
        tree.append_child(html, head);
        tree.append_child(html, body);
        if let Some(d) = doctype {
            if let Some(el) = tree.as_element_mut(html) {
                el.doctype = Some(d);
            }
        }

        let provider = self.provider.as_ref();
        let mut stream = TokenStream::from_tokens(tokens, &mut tree, |name| {
            provider.rule(name).is_none_or(TagRule::allows_body)
        });

        let mut state = CleanState {
            tree,
            html,
            head,
            body,
            head_opened: false,
            body_opened: false,
            all_tags: BTreeSet::new(),
            head_candidates: Vec::new(),
            head_candidate_set: HashSet::new(),
            rubbish: HashMap::new(),
            open_tags: OpenTags::new(),
            child_breaks: ChildBreaks::default(),
            saved_nesting: Vec::new(),
            notifications: Vec::new(),
        };

        self.make_tree(&mut stream, 0, &mut state);
        self.close_all(&mut stream, &mut state);
        self.create_document_nodes(stream, &mut state);
        let root = self.calculate_root_node(&mut state, &prefixes);
        let pruned = self.prune(&mut state);

        CleanResult {
            tree: state.tree,
            root,
            all_tags: state.all_tags,
            pruned,
            notifications: state.notifications,
        }
    }

    /// Walk the working list from `from`, folding tokens into the tree.
    fn make_tree<'p>(&'p self, stream: &mut TokenStream, from: usize, state: &mut CleanState<'p>) {
        let mut i = from;
        while i < stream.len() {
            let p = i;
            match stream.get(p) {
                Some(Slot::End(_)) => {
                    i = self.handle_end_tag(stream, p, state);
                }
                Some(Slot::Node(id)) => {
                    let id = *id;
                    let unformed = state
                        .tree
                        .as_element(id)
                        .is_some_and(|el| !el.formed);
                    if unformed {
                        i = self.handle_start_tag(stream, p, state);
                    } else {
                        self.handle_other(stream, p, state);
                        i = p + 1;
                    }
                }
                _ => {
                    i = p + 1;
                }
            }
        }
    }

    fn handle_end_tag<'p>(
        &'p self,
        stream: &mut TokenStream,
        p: usize,
        state: &mut CleanState<'p>,
    ) -> usize {
        let mut i = p + 1;
        let Some(Slot::End(name)) = stream.get(p) else {
            return i;
        };
        let name = name.clone();
        let rule = self.provider.rule(&name);

        let omitted = (rule.is_none() && self.options.omit_unknown_tags)
            || rule.is_some_and(|r| r.is_deprecated() && self.options.omit_deprecated_tags);
        if omitted || rule.is_some_and(|r| !r.allows_body()) {
            // empty tags need no end token, omitted tags lose theirs
            stream.clear(p);
            return i;
        }

        let Some(match_pos) = state.open_tags.find_tag(&name, rule) else {
            // stray end tag with nothing to close
            stream.clear(p);
            return i;
        };

        let closed = self.close_snippet(stream, match_pos, Some(p), state);
        stream.clear(p);

        // inner tags the grammar resumes after this close get cloned
        // back in right after the end token, in document order
        for k in (1..closed.len()).rev() {
            if rule.is_some_and(|r| r.continues_after(&closed[k].name)) {
                if let Some(clone) = state.tree.shallow_copy(closed[k].id) {
                    if let Some(el) = state.tree.as_element_mut(clone) {
                        el.auto_generated = true;
                    }
                    stream.insert(i, Slot::Node(clone));
                }
            }
        }

        // break records for tags enclosed by this close are stale now
        while state
            .child_breaks
            .last_breaking_position()
            .is_some_and(|bp| match_pos < bp)
        {
            let _ = state.child_breaks.pop();
        }

        // this end tag belongs to a tag that broke its parent: reopen
        // the broken tag after it
        while state.child_breaks.last_breaking_tag() == Some(name.as_str())
            && state.child_breaks.last_breaking_position() == Some(match_pos)
        {
            let Some(closed_pos) = state.child_breaks.last_closed_position() else {
                break;
            };
            match stream.get(closed_pos) {
                Some(Slot::Node(broken)) => {
                    let broken = *broken;
                    let _ = state.child_breaks.pop();
                    i = self.reopen_broken_node(stream, i, broken, state);
                }
                Some(Slot::Group(_)) => {
                    let _ = state.child_breaks.pop();
                    let Slot::Group(ids) = stream.take(closed_pos) else {
                        continue;
                    };
                    // the broken tag already closed into a node group
                    // (its slot absorbed relocated content); splice the
                    // nodes in and let each settle into the open tag
                    for id in ids {
                        stream.insert(i, Slot::Node(id));
                        i += 1;
                        let last = stream.len() - 1;
                        self.make_tree(stream, last, state);
                    }
                }
                _ => {
                    // the broken tag's slot was consumed by an outer
                    // close; nothing left to reopen
                    let _ = state.child_breaks.pop();
                }
            }
        }
        i
    }

    /// Clone a broken tag after the cursor and register it open again.
    /// The copy drops any `id` attribute; duplicated ids would be worse
    /// than a lost anchor.
    fn reopen_broken_node<'p>(
        &'p self,
        stream: &mut TokenStream,
        i: usize,
        broken: NodeId,
        state: &mut CleanState<'p>,
    ) -> usize {
        let Some(copy) = state.tree.shallow_copy(broken) else {
            return i;
        };
        let mut name = String::new();
        if let Some(el) = state.tree.as_element_mut(copy) {
            el.auto_generated = true;
            let _ = el.attrs.remove("id");
            name = el.name.clone();
        }
        stream.insert(i, Slot::Node(copy));
        state.open_tags.add_tag(&name, i, self.provider.rule(&name));
        i + 1
    }

    fn handle_start_tag<'p>(
        &'p self,
        stream: &mut TokenStream,
        p: usize,
        state: &mut CleanState<'p>,
    ) -> usize {
        let mut i = p + 1;
        let Some(node) = stream.node_at(p) else {
            return i;
        };
        let (name, has_id) = match state.tree.as_element(node) {
            Some(el) => (el.name.clone(), el.attrs.contains_key("id")),
            None => return i,
        };
        let rule = self.provider.rule(&name);
        let last = state
            .open_tags
            .last()
            .map(|r| (r.position, r.name.clone(), r.rule));

        let _ = state.all_tags.insert(name.clone());

        if name == "html" {
            merge_envelope_attrs(state, state.html, node);
            stream.clear(p);
        } else if name == "body" {
            state.body_opened = true;
            merge_envelope_attrs(state, state.body, node);
            stream.clear(p);
        } else if name == "head" {
            state.head_opened = true;
            merge_envelope_attrs(state, state.head, node);
            stream.clear(p);
        } else if rule.is_none() && self.options.omit_unknown_tags {
            warn_once("cleaner", &format!("dropped unknown tag <{name}>"));
            stream.clear(p);
            state.notify(NotificationKind::Unknown, node, true);
        } else if rule.is_some_and(TagRule::is_deprecated) && self.options.omit_deprecated_tags {
            warn_once("cleaner", &format!("dropped deprecated tag <{name}>"));
            stream.clear(p);
            state.notify(NotificationKind::Deprecated, node, true);
        } else if rule.is_none()
            && last
                .as_ref()
                .is_some_and(|(_, _, lr)| lr.is_some_and(|lr| !lr.allows_anything()))
        {
            // unknown tag inside a tag with a fixed child list closes it
            // and is then looked at again
            if let Some((last_pos, _, _)) = last {
                let _ = self.close_snippet(stream, last_pos, Some(p), state);
            }
            i = p;
        } else if rule.is_some_and(|r| {
            r.has_permitted_siblings() && state.open_tags.some_already_open(r.permitted_siblings())
        }) {
            stream.clear(p);
            state.notify(NotificationKind::NotAllowed, node, true);
        } else if rule.is_some_and(TagRule::is_unique) && state.open_tags.tag_encountered(&name) {
            stream.clear(p);
            state.notify(NotificationKind::UniqueDuplicated, node, true);
        } else if !fatal_satisfied(rule, state) {
            stream.clear(p);
            state.notify(NotificationKind::FatalAncestorMissing, node, true);
        } else if let Some(parent_name) = self.required_parent_to_add(rule, state) {
            let parent = state.tree.new_element(&parent_name, AttrMap::new());
            if let Some(el) = state.tree.as_element_mut(parent) {
                el.auto_generated = true;
            }
            stream.insert(p, Slot::Node(parent));
            state.notify(NotificationKind::RequiredParentMissing, node, true);
            i = p;
        } else if let Some((last_pos, last_name, Some(_))) = last.clone() {
            if rule.is_some_and(|r| r.must_close(&last_name)) {
                self.break_parent(stream, p, has_id, last_pos, &last_name, &name, rule, state);
                i = p;
            } else {
                i = place_start_tag(stream, p, node, &name, rule, state);
            }
        } else {
            i = place_start_tag(stream, p, node, &name, rule, state);
        }
        i
    }

    /// `node` at `p` force-closes the innermost open tag. Record the
    /// break so the parent can reopen later, close it, and re-copy any
    /// interrupted formatting tags in front of the breaker.
    #[allow(clippy::too_many_arguments)]
    fn break_parent<'p>(
        &'p self,
        stream: &mut TokenStream,
        p: usize,
        has_id: bool,
        last_pos: usize,
        last_name: &str,
        name: &str,
        rule: Option<&'p TagRule>,
        state: &mut CleanState<'p>,
    ) {
        state.child_breaks.add_break(
            ChildBreak {
                position: last_pos,
                name: last_name.to_string(),
            },
            ChildBreak {
                position: p,
                name: name.to_string(),
            },
        );
        if let Some(parent_node) = stream.node_at(last_pos) {
            // a breaker carrying an id smells like markup the author
            // meant literally
            state.notify(NotificationKind::UnpermittedChild, parent_node, !has_id);
        }
        let closed = self.close_snippet(stream, last_pos, Some(p), state);

        if rule.is_some_and(TagRule::has_copy_tags) && !closed.is_empty() {
            // the contiguous tail of copy-over tags gets re-opened
            // inside the breaker
            let mut tail_start = closed.len();
            while tail_start > 0
                && rule.is_some_and(|r| r.is_copy(&closed[tail_start - 1].name))
            {
                tail_start -= 1;
            }
            let mut insert_at = p + 1;
            for tag in &closed[tail_start..] {
                if let Some(copy) = state.tree.shallow_copy(tag.id) {
                    stream.insert(insert_at, Slot::Node(copy));
                    insert_at += 1;
                }
            }
        }
    }

    /// Text, comments, raw sections, and already-finished elements.
    fn handle_other<'p>(
        &'p self,
        stream: &mut TokenStream,
        p: usize,
        state: &mut CleanState<'p>,
    ) {
        let Some(id) = stream.node_at(p) else {
            return;
        };
        let in_head_window = state.head_opened
            && !state.body_opened
            && self.options.keep_whitespace_and_comments_in_head;
        if in_head_window {
            match state.tree.get(id).map(|n| &n.kind) {
                Some(NodeKind::Comment(_)) if state.open_tags.last().is_none() => {
                    state.add_head_candidate(id);
                }
                Some(NodeKind::Text(t))
                    if t.chars().all(char::is_whitespace) && p == stream.len() - 1 =>
                {
                    state.add_head_candidate(id);
                }
                _ => {}
            }
        }

        let name_buf;
        let child = match state.tree.get(id).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => {
                name_buf = el.name.clone();
                ChildKind::Element(&name_buf)
            }
            Some(NodeKind::Text(_)) => ChildKind::Text,
            Some(NodeKind::Raw(_)) => ChildKind::Raw,
            _ => ChildKind::Comment,
        };
        if !allowed_in_last_open(child, state) {
            relocate(stream, p, state);
        }
    }

    /// Force-close the snippet starting at `from` up to (not including)
    /// `to`, or to the end of the list. Returns the tags closed, in
    /// document order; the first one is the tag the caller asked about.
    fn close_snippet<'p>(
        &'p self,
        stream: &mut TokenStream,
        from: usize,
        to: Option<usize>,
        state: &mut CleanState<'p>,
    ) -> Vec<ClosedTag> {
        let mut closed = Vec::new();
        let mut current: Option<NodeId> = None;
        let mut idx = from;
        loop {
            if to == Some(idx) || idx >= stream.len() {
                break;
            }
            let start = match stream.get(idx) {
                Some(Slot::Node(id)) => state
                    .tree
                    .as_element(*id)
                    .and_then(|el| (!el.formed).then(|| (*id, el.name.clone()))),
                _ => None,
            };
            if let Some((id, name)) = start {
                closed.push(ClosedTag {
                    id,
                    name: name.clone(),
                });

                // content that was relocated into this tag's buffer is
                // rebuilt as a tree of its own first
                let moved = state.rubbish.remove(&id).map(|buffer| {
                    let mut sub = TokenStream::from_slots(buffer);
                    state.push_nesting();
                    self.make_tree(&mut sub, 0, state);
                    self.close_all(&mut sub, state);
                    state.pop_nesting();
                    sub.into_node_ids()
                });

                if let Some(el) = state.tree.as_element_mut(id) {
                    el.formed = true;
                }
                note_head_candidate(self.provider.rule(&name), id, state);

                if let Some(parent) = current {
                    if let Some(ids) = &moved {
                        for &m in ids {
                            state.tree.append_child(parent, m);
                        }
                    }
                    state.tree.append_child(parent, id);
                    stream.clear(idx);
                } else if let Some(mut ids) = moved {
                    // no enclosing node in the snippet: the buffered
                    // content surfaces right before the tag itself
                    ids.push(id);
                    stream.set(idx, Slot::Group(ids));
                }

                state.open_tags.remove_tag(&name);
                current = Some(id);
            } else if let Some(parent) = current {
                match stream.take(idx) {
                    Slot::Node(id) => state.tree.append_child(parent, id),
                    Slot::Group(ids) => {
                        for id in ids {
                            state.tree.append_child(parent, id);
                        }
                    }
                    Slot::Empty | Slot::End(_) => {}
                }
            }
            idx += 1;
        }
        closed
    }

    /// Close everything still open at the end of a list.
    fn close_all<'p>(&'p self, stream: &mut TokenStream, state: &mut CleanState<'p>) {
        for rec in state.open_tags.records() {
            if let Some(node) = stream.node_at(rec.position) {
                state.notifications.push(Notification {
                    kind: NotificationKind::UnclosedTag,
                    node,
                    certain: true,
                });
            }
        }
        if let Some(first) = state.open_tags.first().map(|r| r.position) {
            let _ = self.close_snippet(stream, first, None, state);
        }
    }

    /// Attach every surviving top-level node under `body`, then move the
    /// collected head candidates under `head`. A candidate nested inside
    /// another candidate stays where it is.
    fn create_document_nodes(&self, stream: TokenStream, state: &mut CleanState<'_>) {
        for slot in stream.into_slots() {
            match slot {
                Slot::Empty | Slot::End(_) => {}
                Slot::Node(id) => {
                    if let Some(name) = state.tree.element_name(id).map(str::to_string) {
                        note_head_candidate(self.provider.rule(&name), id, state);
                    } else if state.tree.as_text(id).is_some_and(str::is_empty) {
                        continue;
                    }
                    state.tree.append_child(state.body, id);
                }
                Slot::Group(ids) => {
                    for id in ids {
                        state.tree.append_child(state.body, id);
                    }
                }
            }
        }

        let candidates = state.head_candidates.clone();
        for cand in candidates {
            let nested = state
                .tree
                .ancestors(cand)
                .any(|a| state.head_candidate_set.contains(&a));
            if !nested {
                state.tree.remove_from_parent(cand);
                state.tree.append_child(state.head, cand);
            }
        }
    }

    /// Pick the tree root and finish namespace bookkeeping. When the
    /// envelope is dropped, the document-level data it carried moves to
    /// the fragment root instead of vanishing with it.
    fn calculate_root_node(
        &self,
        state: &mut CleanState<'_>,
        prefixes: &BTreeSet<String>,
    ) -> NodeId {
        let root = if self.options.omit_envelope {
            let fragment = state.tree.new_fragment();
            let kids = state.tree.children(state.body).to_vec();
            state.tree.set_children(state.body, Vec::new());
            state.tree.set_children(fragment, kids);
            let doctype = state
                .tree
                .as_element_mut(state.html)
                .and_then(|el| el.doctype.take());
            if let Some(frag) = state.tree.as_fragment_mut(fragment) {
                frag.doctype = doctype;
            }
            fragment
        } else {
            state.html
        };
        if self.options.namespaces_aware {
            if let Some(attrs) = root_attrs_mut(&mut state.tree, root) {
                for prefix in prefixes {
                    // the xml prefix is implicitly declared
                    if prefix == "xml" {
                        continue;
                    }
                    let attr = format!("xmlns:{prefix}");
                    if attrs.get(&attr).is_none() {
                        attrs.insert(attr, prefix.clone());
                    }
                }
            }
        }
        root
    }

    /// Fixed-point pruning sweep over the assembled tree. Matched
    /// subtrees come out whole; with an allow list in force, everything
    /// unlisted goes too.
    fn prune(&self, state: &mut CleanState<'_>) -> Vec<NodeId> {
        if self.options.prune_conditions.is_empty() && self.options.allow_conditions.is_empty() {
            return Vec::new();
        }
        let mut pruned = Vec::new();
        let mut pruned_set = HashSet::new();
        loop {
            let roots: Vec<NodeId> = state
                .tree
                .children(state.head)
                .iter()
                .chain(state.tree.children(state.body).iter())
                .copied()
                .collect();
            let before = pruned.len();
            let changed = self.mark_walk(
                &state.tree,
                &roots,
                &mut pruned,
                &mut pruned_set,
                &mut state.notifications,
            );
            if !changed {
                break;
            }
            // Detach every node marked this round so the next round's
            // conditions see the shrunken tree.
            for i in before..pruned.len() {
                let id = pruned[i];
                if let Some(el) = state.tree.as_element_mut(id) {
                    el.pruned = true;
                }
                state.tree.remove_from_parent(id);
            }
        }
        pruned
    }

    fn mark_walk(
        &self,
        tree: &NodeTree,
        nodes: &[NodeId],
        pruned: &mut Vec<NodeId>,
        pruned_set: &mut HashSet<NodeId>,
        notes: &mut Vec<Notification>,
    ) -> bool {
        let mut changed = false;
        for &id in nodes {
            if tree.as_element(id).is_none() || pruned_set.contains(&id) {
                continue;
            }
            if self.should_prune(tree, id, notes) {
                if pruned_set.insert(id) {
                    pruned.push(id);
                    changed = true;
                }
            } else {
                let kids = tree.children(id).to_vec();
                if self.mark_walk(tree, &kids, pruned, pruned_set, notes) {
                    changed = true;
                }
            }
        }
        changed
    }

    fn should_prune(&self, tree: &NodeTree, id: NodeId, notes: &mut Vec<Notification>) -> bool {
        if self
            .options
            .prune_conditions
            .iter()
            .any(|c| c.satisfied(tree, id))
        {
            return true;
        }
        if self.options.allow_conditions.is_empty() {
            return false;
        }
        if self
            .options
            .allow_conditions
            .iter()
            .any(|c| c.satisfied(tree, id))
        {
            return false;
        }
        let auto = tree.as_element(id).is_some_and(|el| el.auto_generated);
        if !auto {
            notes.push(Notification {
                kind: NotificationKind::NotAllowed,
                node: id,
                certain: true,
            });
        }
        true
    }

    /// When a tag requires a structural parent, decide whether it must
    /// be synthesized here: the nearest open tag of higher precedence
    /// must sit above (at or before) the innermost fatal ancestor,
    /// meaning the parent level in between is missing.
    fn required_parent_to_add<'p>(
        &'p self,
        rule: Option<&'p TagRule>,
        state: &CleanState<'p>,
    ) -> Option<String> {
        let rule = rule?;
        let parent = rule.required_parent()?;
        let mut fatal_pos: Option<usize> = None;
        for name in rule.fatal_ancestors() {
            if let Some(pos) = state.open_tags.find_tag(name, self.provider.rule(name)) {
                fatal_pos = Some(fatal_pos.map_or(pos, |fp| fp.max(pos)));
            }
        }
        for rec in state.open_tags.records().iter().rev() {
            if rule.is_higher(&rec.name) {
                return if fatal_pos.is_some_and(|fp| rec.position <= fp) {
                    Some(parent.to_string())
                } else {
                    None
                };
            }
        }
        Some(parent.to_string())
    }

}

/// The tail of the start-tag decision chain: relocate, close
/// immediately, or open.
fn place_start_tag<'p>(
    stream: &mut TokenStream,
    p: usize,
    node: NodeId,
    name: &str,
    rule: Option<&'p TagRule>,
    state: &mut CleanState<'p>,
) -> usize {
    let i = p + 1;
    if !allowed_in_last_open(ChildKind::Element(name), state) {
        relocate(stream, p, state);
    } else if rule.is_some_and(|r| !r.allows_body()) {
        // empty tag: finished the moment it appears
        if let Some(el) = state.tree.as_element_mut(node) {
            el.formed = true;
        }
        note_head_candidate(rule, node, state);
    } else {
        state.open_tags.add_tag(name, p, rule);
    }
    i
}

fn allowed_in_last_open(child: ChildKind<'_>, state: &CleanState<'_>) -> bool {
    state
        .open_tags
        .last()
        .and_then(|r| r.rule)
        .is_none_or(|rule| rule.allows_child(child))
}

/// A tag with fatal ancestors needs at least one of them open.
fn fatal_satisfied(rule: Option<&TagRule>, state: &CleanState<'_>) -> bool {
    rule.is_none_or(|r| {
        r.fatal_ancestors().is_empty()
            || r.fatal_ancestors()
                .iter()
                .any(|n| state.open_tags.is_open(n))
    })
}

fn note_head_candidate(rule: Option<&TagRule>, id: NodeId, state: &mut CleanState<'_>) {
    let Some(rule) = rule else {
        return;
    };
    if rule.is_head_tag()
        || (rule.is_head_and_body_tag() && state.head_opened && !state.body_opened)
    {
        state.add_head_candidate(id);
    }
}

/// Move the token at `p` into the holding buffer of the open tag best
/// suited to carry it, or drop it when the innermost tag says disallowed
/// content is to be ignored.
fn relocate(stream: &mut TokenStream, p: usize, state: &mut CleanState<'_>) {
    let ignore = state
        .open_tags
        .last()
        .and_then(|r| r.rule)
        .is_some_and(TagRule::is_ignore_permitted);
    if !ignore {
        if let Some(pos) = state.open_tags.find_rubbish_slot() {
            if let Some(target) = stream.node_at(pos) {
                let slot = stream.take(p);
                state.rubbish.entry(target).or_default().push(slot);
                return;
            }
        }
    }
    stream.clear(p);
}

/// Fold a repeated envelope tag's attributes into the synthetic envelope
/// element; attributes already present win.
fn merge_envelope_attrs(state: &mut CleanState<'_>, target: NodeId, source: NodeId) {
    let attrs = state.tree.as_element(source).map(|el| el.attrs.clone());
    if let (Some(attrs), Some(el)) = (attrs, state.tree.as_element_mut(target)) {
        el.attrs.insert_missing(&attrs);
    }
}

/// Attribute map of the chosen root, whether it is an element or a
/// fragment.
fn root_attrs_mut(tree: &mut NodeTree, root: NodeId) -> Option<&mut AttrMap> {
    if tree.as_element(root).is_some() {
        tree.as_element_mut(root).map(|el| &mut el.attrs)
    } else {
        tree.as_fragment_mut(root).map(|frag| &mut frag.attrs)
    }
}
