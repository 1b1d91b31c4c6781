//! Integration tests for the HTML lexer.

use broom_html::{Token, Tokenizer};

/// Helper to lex markup into tokens
fn lex(html: &str) -> Vec<Token> {
    Tokenizer::new(html).run().tokens
}

fn start_tag(token: &Token) -> (&str, bool) {
    match token {
        Token::StartTag {
            name, self_closing, ..
        } => (name, *self_closing),
        other => panic!("expected start tag, got {other:?}"),
    }
}

fn attr<'a>(token: &'a Token, key: &str) -> Option<&'a str> {
    match token {
        Token::StartTag { attrs, .. } => attrs.get(key),
        other => panic!("expected start tag, got {other:?}"),
    }
}

#[test]
fn test_start_and_end_tags() {
    let tokens = lex("<div>x</div>");
    assert_eq!(tokens.len(), 3);
    assert_eq!(start_tag(&tokens[0]), ("div", false));
    assert!(matches!(&tokens[1], Token::Text(t) if t == "x"));
    assert!(matches!(&tokens[2], Token::EndTag { name } if name == "div"));
}

#[test]
fn test_tag_names_are_lowercased() {
    let tokens = lex("<DIV CLASS=\"a\"></DiV>");
    assert_eq!(start_tag(&tokens[0]).0, "div");
    assert_eq!(attr(&tokens[0], "class"), Some("a"));
    assert!(matches!(&tokens[1], Token::EndTag { name } if name == "div"));
}

#[test]
fn test_attribute_quoting_styles() {
    let tokens = lex("<a href=\"x\" title='y' rel=z>");
    assert_eq!(attr(&tokens[0], "href"), Some("x"));
    assert_eq!(attr(&tokens[0], "title"), Some("y"));
    assert_eq!(attr(&tokens[0], "rel"), Some("z"));
}

#[test]
fn test_bare_attribute_gets_its_own_name_as_value() {
    let tokens = lex("<input disabled>");
    assert_eq!(attr(&tokens[0], "disabled"), Some("disabled"));
}

#[test]
fn test_self_closing_flag() {
    let tokens = lex("<br/><div />");
    assert_eq!(start_tag(&tokens[0]), ("br", true));
    assert_eq!(start_tag(&tokens[1]), ("div", true));
}

#[test]
fn test_entities_decoded_in_text_and_attributes() {
    let tokens = lex("<a title=\"a&amp;b\">x &lt; y &#65; &#x42;</a>");
    assert_eq!(attr(&tokens[0], "title"), Some("a&b"));
    assert!(matches!(&tokens[1], Token::Text(t) if t == "x < y A B"));
}

#[test]
fn test_unknown_entity_left_verbatim() {
    let tokens = lex("a &nosuch; b");
    assert!(matches!(&tokens[0], Token::Text(t) if t == "a &nosuch; b"));
}

#[test]
fn test_comments() {
    let tokens = lex("a<!-- note -->b");
    assert!(matches!(&tokens[1], Token::Comment(c) if c == " note "));
}

#[test]
fn test_doctype_with_public_identifier() {
    let out = Tokenizer::new(
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0//EN\" \
         \"http://www.w3.org/TR/xhtml1/DTD/xhtml1.dtd\"><html>",
    )
    .run();
    let doctype = out.doctype.expect("doctype missing");
    assert_eq!(doctype.name, "html");
    assert_eq!(doctype.public_id.as_deref(), Some("-//W3C//DTD XHTML 1.0//EN"));
    assert_eq!(
        doctype.system_id.as_deref(),
        Some("http://www.w3.org/TR/xhtml1/DTD/xhtml1.dtd")
    );
}

#[test]
fn test_plain_doctype() {
    let out = Tokenizer::new("<!doctype html>").run();
    let doctype = out.doctype.expect("doctype missing");
    assert_eq!(doctype.name, "html");
    assert!(doctype.public_id.is_none());
    assert!(doctype.system_id.is_none());
}

#[test]
fn test_script_body_is_raw() {
    let tokens = lex("<script>if (a < b) { x = \"</div>\"; }</script>");
    assert_eq!(start_tag(&tokens[0]).0, "script");
    assert!(matches!(&tokens[1], Token::Raw(r) if r.contains("a < b")));
    assert!(matches!(&tokens[2], Token::EndTag { name } if name == "script"));
}

#[test]
fn test_style_body_is_raw() {
    let tokens = lex("<style>p > a { }</style>");
    assert!(matches!(&tokens[1], Token::Raw(r) if r == "p > a { }"));
}

#[test]
fn test_lone_angle_bracket_is_text() {
    let tokens = lex("2 < 3");
    assert_eq!(tokens.len(), 1);
    assert!(matches!(&tokens[0], Token::Text(t) if t == "2 < 3"));
}

#[test]
fn test_processing_instruction_skipped() {
    let tokens = lex("a<?php echo 1; ?>b");
    assert_eq!(tokens.len(), 1);
    assert!(matches!(&tokens[0], Token::Text(t) if t == "ab"));
}

#[test]
fn test_bogus_declaration_with_multibyte_content_is_skipped() {
    // shorter than the doctype keyword, with a non-ASCII char at the
    // ninth byte
    let tokens = lex("<!abcdefé>x");
    assert_eq!(tokens.len(), 1);
    assert!(matches!(&tokens[0], Token::Text(t) if t == "x"));
}

#[test]
fn test_adjacent_text_merges() {
    let tokens = lex("a<!--c-->b");
    assert_eq!(tokens.len(), 3);
    let tokens = lex("a&amp;b");
    assert_eq!(tokens.len(), 1);
    assert!(matches!(&tokens[0], Token::Text(t) if t == "a&b"));
}
