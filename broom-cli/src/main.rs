//! Broom CLI
//!
//! Cleans an HTML file (or an inline snippet) and prints the repaired
//! document as XML.

use std::env;
use std::fs;

use anyhow::Result;
use broom_html::{CleanOptions, Cleaner, XmlWriter};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut options = CleanOptions::default();
    let mut inline_html: Option<String> = None;
    let mut file: Option<String> = None;
    let mut verbose = false;

    let mut idx = 1;
    while idx < args.len() {
        match args[idx].as_str() {
            "--html" => {
                idx += 1;
                inline_html = args.get(idx).cloned();
                if inline_html.is_none() {
                    eprintln!("Error: --html requires an HTML string argument");
                    std::process::exit(1);
                }
            }
            "--omit-unknown-tags" => options.omit_unknown_tags = true,
            "--omit-deprecated-tags" => options.omit_deprecated_tags = true,
            "--omit-envelope" => options.omit_envelope = true,
            "--namespaces" => options.namespaces_aware = true,
            "--verbose" => verbose = true,
            other => file = Some(other.to_string()),
        }
        idx += 1;
    }

    let html = match (inline_html, file) {
        (Some(html), _) => html,
        (None, Some(path)) => fs::read_to_string(path)?,
        (None, None) => {
            eprintln!("Usage: broom [options] <file.html>");
            eprintln!("       broom [options] --html '<div>...</div>'");
            eprintln!();
            eprintln!("Options:");
            eprintln!("  --omit-unknown-tags     drop tags with no grammar rule");
            eprintln!("  --omit-deprecated-tags  drop deprecated tags");
            eprintln!("  --omit-envelope         print body content without html/head/body");
            eprintln!("  --namespaces            keep namespace-prefixed markup");
            eprintln!("  --verbose               report every repair on stderr");
            std::process::exit(1);
        }
    };

    let namespaces_aware = options.namespaces_aware;
    let cleaner = Cleaner::new(options);
    let result = cleaner.clean(&html);

    if verbose {
        for note in &result.notifications {
            let name = result
                .tree
                .element_name(note.node)
                .unwrap_or("?");
            eprintln!(
                "{}: <{}>{}",
                note.kind,
                name,
                if note.certain { "" } else { " (uncertain)" }
            );
        }
    }

    let xml = XmlWriter::new(namespaces_aware).write_document(&result.tree, result.root)?;
    println!("{xml}");

    Ok(())
}
