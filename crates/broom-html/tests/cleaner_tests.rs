//! Integration tests for the tree-construction engine.

use std::collections::HashMap;

use broom_dom::{NodeId, NodeKind, NodeTree};
use broom_html::{
    CleanOptions, CleanResult, Cleaner, NodeCondition, NotificationKind, TagNameCondition,
    XmlWriter,
};

/// Helper to clean markup with default options
fn clean(html: &str) -> CleanResult {
    Cleaner::new(CleanOptions::default()).clean(html)
}

/// Helper to get element by tag name (first match, depth-first)
fn find_element(tree: &NodeTree, from: NodeId, tag: &str) -> Option<NodeId> {
    if tree.element_name(from) == Some(tag) {
        return Some(from);
    }
    for &child_id in tree.children(from) {
        if let Some(found) = find_element(tree, child_id, tag) {
            return Some(found);
        }
    }
    None
}

/// Helper to get text content of a node (concatenated)
fn text_content(tree: &NodeTree, id: NodeId) -> String {
    let mut result = String::new();
    if let Some(node) = tree.get(id) {
        match &node.kind {
            NodeKind::Text(data) => result.push_str(data),
            _ => {
                for &child_id in tree.children(id) {
                    result.push_str(&text_content(tree, child_id));
                }
            }
        }
    }
    result
}

/// Helper to serialize the body's content
fn body_xml(result: &CleanResult) -> String {
    let body = find_element(&result.tree, result.root, "body").expect("body missing");
    XmlWriter::new(false)
        .inner_xml(&result.tree, body)
        .expect("serialization failed")
}

fn has_notification(result: &CleanResult, kind: NotificationKind) -> bool {
    result.notifications.iter().any(|n| n.kind == kind)
}

#[test]
fn test_document_envelope_always_present() {
    let result = clean("plain text");
    let html = find_element(&result.tree, result.root, "html").unwrap();
    assert_eq!(html, result.root);
    assert!(find_element(&result.tree, result.root, "head").is_some());
    assert_eq!(body_xml(&result), "plain text");
}

#[test]
fn test_self_closing_div_becomes_sibling() {
    let result = clean("<div id=\"y\"/><div id=\"z\">something</div>");
    assert_eq!(
        body_xml(&result),
        "<div id=\"y\" /><div id=\"z\">something</div>"
    );
}

#[test]
fn test_unclosed_tags_closed_at_end_of_input() {
    let result = clean("<b>bold");
    assert_eq!(body_xml(&result), "<b>bold</b>");
    assert!(has_notification(&result, NotificationKind::UnclosedTag));
}

#[test]
fn test_formatting_resumes_after_enclosing_close() {
    let result = clean("<b>one<i>two</b>three");
    assert_eq!(body_xml(&result), "<b>one<i>two</i></b><i>three</i>");
    // the resumed italic is synthetic
    let body = find_element(&result.tree, result.root, "body").unwrap();
    let resumed = *result.tree.children(body).last().unwrap();
    let el = result.tree.as_element(resumed).unwrap();
    assert!(el.auto_generated);
}

#[test]
fn test_table_synthesizes_tbody() {
    let result = clean("<table><tr><td>stuff</td></tr></table>");
    assert_eq!(
        body_xml(&result),
        "<table><tbody><tr><td>stuff</td></tr></tbody></table>"
    );
    assert!(has_notification(
        &result,
        NotificationKind::RequiredParentMissing
    ));
}

#[test]
fn test_repeated_tr_breaks_and_reopens_row() {
    let result = clean("<table><tr><tr><td>stuff</td></tr>");
    assert_eq!(
        body_xml(&result),
        "<table><tbody><tr /><tr><td>stuff</td></tr><tr /></tbody></table>"
    );
    assert!(has_notification(
        &result,
        NotificationKind::UnpermittedChild
    ));
}

#[test]
fn test_option_needs_select_or_datalist() {
    let result = clean("<select><option>a<option>b</select><option>x");
    assert_eq!(
        body_xml(&result),
        "<select><option>a</option><option>b</option></select>x"
    );
    assert!(has_notification(
        &result,
        NotificationKind::FatalAncestorMissing
    ));

    let in_datalist = clean("<datalist><option>x</option></datalist>");
    assert_eq!(body_xml(&in_datalist), "<datalist><option>x</option></datalist>");
}

#[test]
fn test_second_title_dropped() {
    let result = clean("<head><title>one</title><title>two</title>");
    let title = find_element(&result.tree, result.root, "title").unwrap();
    assert_eq!(text_content(&result.tree, title), "one");
    assert!(has_notification(&result, NotificationKind::UniqueDuplicated));
    // only one title in the whole tree
    let head = find_element(&result.tree, result.root, "head").unwrap();
    let titles = result
        .tree
        .children(head)
        .iter()
        .filter(|&&c| result.tree.element_name(c) == Some("title"))
        .count();
    assert_eq!(titles, 1);
}

#[test]
fn test_title_moves_to_head() {
    let result = clean("<html><head><title>t</title></head><body><p>x</p>");
    let head = find_element(&result.tree, result.root, "head").unwrap();
    let title = find_element(&result.tree, head, "title").unwrap();
    assert_eq!(result.tree.parent(title), Some(head));
    assert_eq!(body_xml(&result), "<p>x</p>");
}

#[test]
fn test_comment_before_body_stays_in_head() {
    let result = clean("<head><!-- note --><body>x");
    let head = find_element(&result.tree, result.root, "head").unwrap();
    let has_comment = result
        .tree
        .children(head)
        .iter()
        .any(|&c| matches!(result.tree.get(c).map(|n| &n.kind), Some(NodeKind::Comment(_))));
    assert!(has_comment);
    assert_eq!(body_xml(&result), "x");
}

#[test]
fn test_style_after_body_stays_in_body() {
    let result = clean("<head></head><body><style>s { }</style>");
    assert_eq!(body_xml(&result), "<style>s { }</style>");
}

#[test]
fn test_table_rubbish_surfaces_before_it() {
    let result = clean("<html><body><table><fieldset><legend>x</legend></table>");
    let body = find_element(&result.tree, result.root, "body").unwrap();
    let names: Vec<_> = result
        .tree
        .children(body)
        .iter()
        .filter_map(|&c| result.tree.element_name(c).map(str::to_string))
        .collect();
    assert_eq!(names, ["fieldset", "table"]);
    let legend = find_element(&result.tree, body, "legend").unwrap();
    assert_eq!(text_content(&result.tree, legend), "x");
}

#[test]
fn test_paragraph_closes_paragraph() {
    let result = clean("<p>one<p>two");
    assert_eq!(body_xml(&result), "<p>one</p><p>two</p>");
}

#[test]
fn test_heading_closes_paragraph() {
    let result = clean("<p>intro<h2>title</h2>");
    assert_eq!(body_xml(&result), "<p>intro</p><h2>title</h2>");
}

#[test]
fn test_list_items_close_each_other() {
    let result = clean("<ul><li>a<li>b</ul>");
    assert_eq!(body_xml(&result), "<ul><li>a</li><li>b</li></ul>");
}

#[test]
fn test_anchor_closes_anchor() {
    let result = clean("<a href=\"#1\">x<a href=\"#2\">y");
    assert_eq!(
        body_xml(&result),
        "<a href=\"#1\">x</a><a href=\"#2\">y</a>"
    );
}

#[test]
fn test_formatting_copied_into_next_cell() {
    let result = clean("<table><tr><td><b>bold<td>next");
    let body = find_element(&result.tree, result.root, "body").unwrap();
    let tr = find_element(&result.tree, body, "tr").unwrap();
    let cells: Vec<NodeId> = result
        .tree
        .children(tr)
        .iter()
        .filter(|&&c| result.tree.element_name(c) == Some("td"))
        .copied()
        .collect();
    assert_eq!(cells.len(), 2);
    // the bold carries over into the second cell
    let second_b = find_element(&result.tree, cells[1], "b").unwrap();
    assert_eq!(text_content(&result.tree, second_b), "next");
}

#[test]
fn test_hr_closes_paragraph_and_self_closes() {
    let result = clean("<p>a<hr>b");
    assert_eq!(body_xml(&result), "<p>a</p><hr />b");
}

#[test]
fn test_omit_unknown_tags() {
    let options = CleanOptions {
        omit_unknown_tags: true,
        ..CleanOptions::default()
    };
    let result = Cleaner::new(options).clean("<div><blink>x</blink></div>");
    assert_eq!(body_xml(&result), "<div>x</div>");
    assert!(has_notification(&result, NotificationKind::Unknown));
}

#[test]
fn test_omitted_tags_advise_once_per_document() {
    // the dedup ledger resets between documents, so cleaning twice
    // must not poison or accumulate state
    let options = CleanOptions {
        omit_unknown_tags: true,
        omit_deprecated_tags: true,
        ..CleanOptions::default()
    };
    let cleaner = Cleaner::new(options);
    for _ in 0..2 {
        let result = cleaner.clean("<blink>a</blink><blink>b</blink><center>c</center>");
        assert_eq!(body_xml(&result), "abc");
        assert!(has_notification(&result, NotificationKind::Unknown));
        assert!(has_notification(&result, NotificationKind::Deprecated));
    }
}

#[test]
fn test_unknown_tags_kept_by_default() {
    let result = clean("<blink>x</blink>");
    assert_eq!(body_xml(&result), "<blink>x</blink>");
    assert!(result.all_tags.contains("blink"));
}

#[test]
fn test_omit_deprecated_tags() {
    let options = CleanOptions {
        omit_deprecated_tags: true,
        ..CleanOptions::default()
    };
    let result = Cleaner::new(options).clean("<center>x</center>");
    assert_eq!(body_xml(&result), "x");
    assert!(has_notification(&result, NotificationKind::Deprecated));
}

#[test]
fn test_second_form_dropped_while_first_open() {
    let result = clean("<form><form>x");
    assert_eq!(body_xml(&result), "<form>x</form>");
    assert!(has_notification(&result, NotificationKind::NotAllowed));
}

#[test]
fn test_envelope_attributes_merge() {
    let result = clean("<html lang=\"en\"><body class=\"c\">x");
    let html = result.tree.as_element(result.root).unwrap();
    assert_eq!(html.attrs.get("lang"), Some("en"));
    let body = find_element(&result.tree, result.root, "body").unwrap();
    let body_el = result.tree.as_element(body).unwrap();
    assert_eq!(body_el.attrs.get("class"), Some("c"));
}

#[test]
fn test_doctype_survives_to_output() {
    let result = clean("<!DOCTYPE html><p>x</p>");
    let xml = XmlWriter::new(false)
        .write_document(&result.tree, result.root)
        .unwrap();
    assert!(xml.starts_with("<!DOCTYPE html>\n<html"));
}

#[test]
fn test_omit_envelope_yields_fragment() {
    let options = CleanOptions {
        omit_envelope: true,
        ..CleanOptions::default()
    };
    let result = Cleaner::new(options).clean("x<b>y</b>");
    let xml = XmlWriter::new(false)
        .write_document(&result.tree, result.root)
        .unwrap();
    assert_eq!(xml, "x<b>y</b>");
}

#[test]
fn test_omit_envelope_keeps_document_level_data() {
    let options = CleanOptions {
        omit_envelope: true,
        namespaces_aware: true,
        ..CleanOptions::default()
    };
    let result = Cleaner::new(options).clean("<!DOCTYPE html><o:p>x</o:p>");
    let frag = result.tree.as_fragment(result.root).unwrap();
    assert_eq!(frag.attrs.get("xmlns:o"), Some("o"));
    assert_eq!(frag.doctype.as_ref().map(|d| d.name.as_str()), Some("html"));
    let xml = XmlWriter::new(true)
        .write_document(&result.tree, result.root)
        .unwrap();
    assert_eq!(xml, "<!DOCTYPE html>\n<o:p>x</o:p>");
}

#[test]
fn test_prune_conditions_remove_subtrees() {
    let options = CleanOptions {
        prune_conditions: vec![Box::new(TagNameCondition::new("script"))],
        ..CleanOptions::default()
    };
    let result = Cleaner::new(options).clean("<div>keep<script>gone()</script></div>");
    assert_eq!(body_xml(&result), "<div>keep</div>");
    assert_eq!(result.pruned.len(), 1);
}

#[test]
fn test_allow_conditions_keep_only_listed_tags() {
    let options = CleanOptions {
        allow_conditions: vec![Box::new(TagNameCondition::new("b"))],
        ..CleanOptions::default()
    };
    let result = Cleaner::new(options).clean("x<b>y</b><i>z</i>");
    assert_eq!(body_xml(&result), "x<b>y</b>");
    assert!(has_notification(&result, NotificationKind::NotAllowed));
}

#[test]
fn test_namespace_prefix_declared_on_root() {
    let options = CleanOptions {
        namespaces_aware: true,
        ..CleanOptions::default()
    };
    let result = Cleaner::new(options).clean("<o:p>x</o:p>");
    let html = result.tree.as_element(result.root).unwrap();
    assert_eq!(html.attrs.get("xmlns:o"), Some("o"));
    assert_eq!(body_xml(&result), "<o:p>x</o:p>");
}

#[test]
fn test_stray_end_tags_disappear() {
    let result = clean("a</div>b</p>c");
    assert_eq!(body_xml(&result), "abc");
}

#[test]
fn test_all_tags_collects_every_name() {
    let result = clean("<div><span>x</span></div><p>y</p>");
    assert!(result.all_tags.contains("div"));
    assert!(result.all_tags.contains("span"));
    assert!(result.all_tags.contains("p"));
}

#[test]
fn test_recleaning_the_output_is_stable() {
    let first = clean("<b>one<i>two</b>three<p>four<p>five");
    let once = body_xml(&first);
    let second = clean(&once);
    assert_eq!(body_xml(&second), once);
}

#[test]
fn test_balanced_input_closes_nothing_forcibly() {
    let result = clean("<div><p>done</p></div>");
    assert!(!has_notification(&result, NotificationKind::UnclosedTag));
    let once = body_xml(&result);
    assert_eq!(once, "<div><p>done</p></div>");
    // with nothing left open, a second pass has nothing to force shut
    let again = clean(&once);
    assert!(!has_notification(&again, NotificationKind::UnclosedTag));
    assert_eq!(body_xml(&again), once);
}

#[test]
fn test_every_node_has_at_most_one_parent() {
    // continuation copies and relocations must never leave a node in
    // two child lists or with a stale parent link
    let result = clean("<table><tr><td><b>a<tr><td>b</td></tr></table><p>c<p>d");
    let tree = &result.tree;
    let mut owner: HashMap<NodeId, NodeId> = HashMap::new();
    for idx in 0..tree.len() {
        let id = NodeId(idx);
        for &child in tree.children(id) {
            assert_eq!(tree.parent(child), Some(id), "stale parent link");
            assert!(
                owner.insert(child, id).is_none(),
                "node appears in two child lists"
            );
        }
    }
}

#[test]
fn test_prune_reaches_a_fixed_point() {
    struct ChildlessElements;
    impl NodeCondition for ChildlessElements {
        fn satisfied(&self, tree: &NodeTree, node: NodeId) -> bool {
            tree.as_element(node).is_some() && tree.children(node).is_empty()
        }
    }
    let options = CleanOptions {
        prune_conditions: vec![
            Box::new(TagNameCondition::new("span")),
            Box::new(ChildlessElements),
        ],
        ..CleanOptions::default()
    };
    // removing the span leaves the div empty, which a later round must
    // also remove
    let result = Cleaner::new(options).clean("<div><span>x</span></div><p>keep</p>");
    assert_eq!(body_xml(&result), "<p>keep</p>");
    assert_eq!(result.pruned.len(), 2);
}

#[test]
fn test_text_inside_table_moves_out() {
    let result = clean("<table>loose<tr><td>kept</td></tr></table>");
    let body = find_element(&result.tree, result.root, "body").unwrap();
    // the loose text surfaces before the table
    let first = result.tree.children(body)[0];
    assert_eq!(text_content(&result.tree, first), "loose");
    let td = find_element(&result.tree, body, "td").unwrap();
    assert_eq!(text_content(&result.tree, td), "kept");
}
