//! Tests for node tree mutation: append_child, remove_from_parent,
//! set_children, shallow_copy, and traversal helpers.

use broom_dom::{AttrMap, NodeId, NodeTree};

/// Helper to create an element node and return its NodeId.
fn alloc_element(tree: &mut NodeTree, tag: &str) -> NodeId {
    tree.new_element(tag, AttrMap::new())
}

// ========== append_child / remove_from_parent ==========

#[test]
fn test_append_sets_parent_and_order() {
    let mut tree = NodeTree::new();
    let parent = alloc_element(&mut tree, "div");
    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    tree.append_child(parent, a);
    tree.append_child(parent, b);

    assert_eq!(tree.children(parent), &[a, b]);
    assert_eq!(tree.parent(a), Some(parent));
    assert_eq!(tree.parent(b), Some(parent));
}

#[test]
fn test_remove_from_parent_detaches() {
    let mut tree = NodeTree::new();
    let parent = alloc_element(&mut tree, "div");
    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    let c = alloc_element(&mut tree, "c");
    tree.append_child(parent, a);
    tree.append_child(parent, b);
    tree.append_child(parent, c);

    tree.remove_from_parent(b);

    assert_eq!(tree.children(parent), &[a, c]);
    assert_eq!(tree.parent(b), None);
    // removed node keeps its own subtree and stays addressable
    assert!(tree.as_element(b).is_some());
}

#[test]
fn test_remove_from_parent_on_detached_node_is_noop() {
    let mut tree = NodeTree::new();
    let lone = alloc_element(&mut tree, "p");
    tree.remove_from_parent(lone);
    assert_eq!(tree.parent(lone), None);
}

// ========== set_children ==========

#[test]
fn test_set_children_replaces_and_detaches_old() {
    let mut tree = NodeTree::new();
    let parent = alloc_element(&mut tree, "div");
    let old = alloc_element(&mut tree, "span");
    tree.append_child(parent, old);

    let n1 = tree.new_text("x");
    let n2 = alloc_element(&mut tree, "em");
    tree.set_children(parent, vec![n1, n2]);

    assert_eq!(tree.children(parent), &[n1, n2]);
    assert_eq!(tree.parent(old), None);
    assert_eq!(tree.parent(n2), Some(parent));
}

// ========== shallow_copy ==========

#[test]
fn test_shallow_copy_duplicates_name_and_attrs_only() {
    let mut tree = NodeTree::new();
    let orig = tree.new_element("b", AttrMap::from([("id", "x"), ("class", "bold")]));
    let child = tree.new_text("inner");
    tree.append_child(orig, child);

    let copy = tree.shallow_copy(orig).unwrap();

    let data = tree.as_element(copy).unwrap();
    assert_eq!(data.name, "b");
    assert_eq!(data.attrs.get("id"), Some("x"));
    assert_eq!(data.attrs.get("class"), Some("bold"));
    assert!(!data.formed);
    assert!(!data.auto_generated);
    assert!(tree.children(copy).is_empty());
}

#[test]
fn test_shallow_copy_of_text_node_is_none() {
    let mut tree = NodeTree::new();
    let text = tree.new_text("hello");
    assert!(tree.shallow_copy(text).is_none());
}

// ========== traversal ==========

#[test]
fn test_ancestors_walk() {
    let mut tree = NodeTree::new();
    let root = alloc_element(&mut tree, "html");
    let body = alloc_element(&mut tree, "body");
    let div = alloc_element(&mut tree, "div");
    let p = alloc_element(&mut tree, "p");
    tree.append_child(root, body);
    tree.append_child(body, div);
    tree.append_child(div, p);

    let chain: Vec<NodeId> = tree.ancestors(p).collect();
    assert_eq!(chain, vec![div, body, root]);
}

#[test]
fn test_find_descendant_preorder() {
    let mut tree = NodeTree::new();
    let root = alloc_element(&mut tree, "body");
    let first = alloc_element(&mut tree, "div");
    let nested = alloc_element(&mut tree, "span");
    let second = alloc_element(&mut tree, "span");
    tree.append_child(root, first);
    tree.append_child(first, nested);
    tree.append_child(root, second);

    // pre-order finds the nested span before the later sibling
    let found = tree.find_descendant(root, |t, id| t.element_name(id) == Some("span"));
    assert_eq!(found, Some(nested));
}

// ========== attributes ==========

#[test]
fn test_attr_map_keeps_insertion_order() {
    let mut attrs = AttrMap::new();
    attrs.insert("href", "/a");
    attrs.insert("title", "t");
    attrs.insert("href", "/b");

    let pairs: Vec<(&str, &str)> = attrs.iter().collect();
    assert_eq!(pairs, vec![("href", "/b"), ("title", "t")]);
}

#[test]
fn test_attr_insert_missing_preserves_existing() {
    let mut attrs = AttrMap::from([("id", "keep")]);
    attrs.insert_missing(&AttrMap::from([("id", "clobber"), ("lang", "en")]));
    assert_eq!(attrs.get("id"), Some("keep"));
    assert_eq!(attrs.get("lang"), Some("en"));
}

#[test]
fn test_doctype_storage_on_root_element() {
    let mut tree = NodeTree::new();
    let html = alloc_element(&mut tree, "html");
    tree.as_element_mut(html).unwrap().doctype = Some(broom_dom::Doctype {
        name: "html".to_string(),
        public_id: None,
        system_id: None,
    });
    assert_eq!(
        tree.as_element(html).unwrap().doctype.as_ref().unwrap().name,
        "html"
    );
}

#[test]
fn test_fragment_root_carries_document_data() {
    let mut tree = NodeTree::new();
    let frag = tree.new_fragment();
    let child = alloc_element(&mut tree, "p");
    tree.append_child(frag, child);
    assert!(tree.as_element(frag).is_none());
    assert_eq!(tree.children(frag), &[child]);

    tree.as_fragment_mut(frag).unwrap().attrs.insert("xmlns:v", "v");
    assert_eq!(tree.as_fragment(frag).unwrap().attrs.get("xmlns:v"), Some("v"));
}
