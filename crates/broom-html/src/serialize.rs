//! XML output for cleaned trees.

use std::fmt::Write as _;

use broom_dom::{Doctype, NodeId, NodeKind, NodeTree};

use crate::CleanError;

/// Writes a cleaned tree back out as well-formed XML.
///
/// Childless elements minimize to `<name />`. Text and attribute values
/// are re-escaped; raw script/style content goes out verbatim.
pub struct XmlWriter {
    namespaces_aware: bool,
}

impl XmlWriter {
    /// `namespaces_aware` controls whether `xmlns` declarations survive
    /// into the output.
    #[must_use]
    pub fn new(namespaces_aware: bool) -> Self {
        Self { namespaces_aware }
    }

    /// Serialize a whole document from its root, doctype included.
    ///
    /// # Errors
    ///
    /// Returns [`CleanError::MissingNode`] if `root` or one of its
    /// descendants is not in the tree.
    pub fn write_document(&self, tree: &NodeTree, root: NodeId) -> Result<String, CleanError> {
        let mut out = String::new();
        let doctype = tree
            .as_element(root)
            .and_then(|el| el.doctype.as_ref())
            .or_else(|| tree.as_fragment(root).and_then(|f| f.doctype.as_ref()));
        if let Some(doctype) = doctype {
            write_doctype(doctype, &mut out);
        }
        self.write_node(tree, root, &mut out)?;
        Ok(out)
    }

    /// Serialize only the children of a node.
    ///
    /// # Errors
    ///
    /// Returns [`CleanError::MissingNode`] if `node` is unknown, or
    /// [`CleanError::NotAnElement`] if it cannot carry children.
    pub fn inner_xml(&self, tree: &NodeTree, node: NodeId) -> Result<String, CleanError> {
        let n = tree.get(node).ok_or(CleanError::MissingNode(node))?;
        if !matches!(n.kind, NodeKind::Element(_) | NodeKind::Fragment(_)) {
            return Err(CleanError::NotAnElement(node));
        }
        let mut out = String::new();
        for &child in &n.children {
            self.write_node(tree, child, &mut out)?;
        }
        Ok(out)
    }

    fn write_node(&self, tree: &NodeTree, id: NodeId, out: &mut String) -> Result<(), CleanError> {
        let node = tree.get(id).ok_or(CleanError::MissingNode(id))?;
        match &node.kind {
            NodeKind::Fragment(_) => {
                for &child in &node.children {
                    self.write_node(tree, child, out)?;
                }
            }
            NodeKind::Text(text) => escape_into(text, false, out),
            NodeKind::Raw(raw) => out.push_str(raw),
            NodeKind::Comment(comment) => {
                let _ = write!(out, "<!--{comment}-->");
            }
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (name, value) in el.attrs.iter() {
                    if !self.namespaces_aware
                        && (name == "xmlns" || name.starts_with("xmlns:"))
                    {
                        continue;
                    }
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                if node.children.is_empty() {
                    out.push_str(" />");
                } else {
                    out.push('>');
                    for &child in &node.children {
                        self.write_node(tree, child, out)?;
                    }
                    let _ = write!(out, "</{}>", el.name);
                }
            }
        }
        Ok(())
    }
}

fn write_doctype(doctype: &Doctype, out: &mut String) {
    let _ = write!(out, "<!DOCTYPE {}", doctype.name);
    if let Some(public_id) = &doctype.public_id {
        let _ = write!(out, " PUBLIC \"{public_id}\"");
        if let Some(system_id) = &doctype.system_id {
            let _ = write!(out, " \"{system_id}\"");
        }
    } else if let Some(system_id) = &doctype.system_id {
        let _ = write!(out, " SYSTEM \"{system_id}\"");
    }
    out.push_str(">\n");
}

fn escape_into(raw: &str, in_attribute: bool, out: &mut String) {
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
