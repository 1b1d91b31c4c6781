//! Hand-written HTML lexer.
//!
//! Deliberately forgiving: there is no error state. Anything that does not
//! scan as markup falls back to text, unterminated constructs run to the
//! end of input, and the tree-construction stage deals with the rest.

use broom_common::warning::warn_once;
use broom_dom::{AttrMap, Doctype};

use super::token::Token;

/// Result of lexing one document: the token list plus the doctype
/// declaration, which is lifted out of the stream entirely.
#[derive(Debug, Default)]
pub struct TokenizerOutput {
    /// Tokens in source order.
    pub tokens: Vec<Token>,
    /// The first doctype declaration found, if any.
    pub doctype: Option<Doctype>,
}

/// Single-pass lexer over one input string.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    out: TokenizerOutput,
}

impl<'a> Tokenizer<'a> {
    /// Prepare a lexer over `input`.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            out: TokenizerOutput::default(),
        }
    }

    /// Consume the whole input and return the token stream.
    #[must_use]
    pub fn run(mut self) -> TokenizerOutput {
        while self.pos < self.input.len() {
            let rest = self.rest();
            match rest.find('<') {
                Some(0) => self.lex_markup(),
                Some(lt) => {
                    self.push_text(&rest[..lt]);
                    self.pos += lt;
                }
                None => {
                    self.push_text(rest);
                    self.pos = self.input.len();
                }
            }
        }
        self.out
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn push_text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        // adjacent text runs merge so the cleaner sees one token
        if let Some(Token::Text(prev)) = self.out.tokens.last_mut() {
            prev.push_str(&decode_entities(raw));
        } else {
            self.out.tokens.push(Token::Text(decode_entities(raw)));
        }
    }

    /// Dispatch on the character after a `<` at the current position.
    fn lex_markup(&mut self) {
        let rest = self.rest();
        if let Some(comment) = rest.strip_prefix("<!--") {
            match comment.find("-->") {
                Some(end) => {
                    self.out.tokens.push(Token::Comment(comment[..end].to_string()));
                    self.pos += 4 + end + 3;
                }
                None => {
                    warn_once("tokenizer", "unterminated comment runs to end of input");
                    self.out.tokens.push(Token::Comment(comment.to_string()));
                    self.pos = self.input.len();
                }
            }
        } else if rest
            .as_bytes()
            .get(..9)
            .is_some_and(|b| b.eq_ignore_ascii_case(b"<!doctype"))
        {
            self.lex_doctype();
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            // processing instructions and bogus declarations are dropped
            self.skip_past_gt(2);
        } else if rest.starts_with("</") && starts_with_name(&rest[2..]) {
            self.lex_end_tag();
        } else if starts_with_name(&rest[1..]) {
            self.lex_start_tag();
        } else {
            // a lone '<' is just text
            self.push_text("<");
            self.pos += 1;
        }
    }

    fn skip_past_gt(&mut self, offset: usize) {
        match self.rest()[offset..].find('>') {
            Some(gt) => self.pos += offset + gt + 1,
            None => self.pos = self.input.len(),
        }
    }

    fn lex_doctype(&mut self) {
        let body_start = self.pos + 9;
        let body = match self.input[body_start..].find('>') {
            Some(gt) => {
                let b = &self.input[body_start..body_start + gt];
                self.pos = body_start + gt + 1;
                b
            }
            None => {
                let b = &self.input[body_start..];
                self.pos = self.input.len();
                b
            }
        };
        if self.out.doctype.is_none() {
            self.out.doctype = Some(parse_doctype(body));
        }
    }

    fn lex_end_tag(&mut self) {
        self.pos += 2;
        let name = self.lex_name();
        self.skip_past_gt(0);
        self.out.tokens.push(Token::EndTag { name });
    }

    fn lex_start_tag(&mut self) {
        self.pos += 1;
        let name = self.lex_name();
        let (attrs, self_closing) = self.lex_attrs();
        let raw_section = !self_closing && (name == "script" || name == "style");
        self.out.tokens.push(Token::StartTag {
            name: name.clone(),
            attrs,
            self_closing,
        });
        if raw_section {
            self.lex_raw_section(&name);
        }
    }

    /// Everything up to the matching `</name` is one opaque raw token;
    /// the close tag itself is lexed normally afterwards.
    fn lex_raw_section(&mut self, name: &str) {
        let rest = self.rest();
        let needle = format!("</{name}");
        let lower = rest.to_ascii_lowercase();
        match lower.find(&needle) {
            Some(end) => {
                if end > 0 {
                    self.out.tokens.push(Token::Raw(rest[..end].to_string()));
                }
                self.pos += end;
            }
            None => {
                warn_once(
                    "tokenizer",
                    &format!("unterminated {name} section runs to end of input"),
                );
                if !rest.is_empty() {
                    self.out.tokens.push(Token::Raw(rest.to_string()));
                }
                self.pos = self.input.len();
            }
        }
    }

    fn lex_name(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !is_name_char(c))
            .unwrap_or(rest.len());
        let name = rest[..end].to_ascii_lowercase();
        self.pos += end;
        name
    }

    fn lex_attrs(&mut self) -> (AttrMap, bool) {
        let mut attrs = AttrMap::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return (attrs, false);
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return (attrs, false);
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                return (attrs, true);
            }
            if rest.starts_with('/') || rest.starts_with('=') {
                // stray punctuation between attributes
                self.pos += 1;
                continue;
            }
            let name = self.lex_attr_name();
            if name.is_empty() {
                // not a name character; swallow one char and retry
                self.pos += self.rest().chars().next().map_or(0, char::len_utf8);
                continue;
            }
            self.skip_whitespace();
            if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                let value = self.lex_attr_value();
                attrs.insert(name, decode_entities(&value));
            } else {
                // bare attribute: value defaults to its own name
                let value = name.clone();
                attrs.insert(name, value);
            }
        }
    }

    fn lex_attr_name(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
            .unwrap_or(rest.len());
        let name = rest[..end].to_ascii_lowercase();
        self.pos += end;
        name
    }

    fn lex_attr_value(&mut self) -> String {
        let rest = self.rest();
        let mut chars = rest.chars();
        match chars.next() {
            Some(quote @ ('"' | '\'')) => {
                let inner = &rest[1..];
                match inner.find(quote) {
                    Some(end) => {
                        self.pos += 1 + end + 1;
                        inner[..end].to_string()
                    }
                    None => {
                        self.pos = self.input.len();
                        inner.to_string()
                    }
                }
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                self.pos += end;
                rest[..end].to_string()
            }
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(rest.len());
        self.pos += end;
    }
}

fn starts_with_name(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')
}

fn parse_doctype(body: &str) -> Doctype {
    let mut words = body.split_whitespace();
    let name = words.next().unwrap_or("html").to_ascii_lowercase();
    let quoted = quoted_parts(body);
    let keyword = words.next().map(str::to_ascii_uppercase);
    let (public_id, system_id) = match keyword.as_deref() {
        Some("PUBLIC") => (
            quoted.first().cloned(),
            quoted.get(1).cloned(),
        ),
        Some("SYSTEM") => (None, quoted.first().cloned()),
        _ => (None, None),
    };
    Doctype {
        name,
        public_id,
        system_id,
    }
}

/// Quoted substrings of a doctype body, in order.
fn quoted_parts(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find(['"', '\'']) {
        let quote = rest.as_bytes()[start] as char;
        let inner = &rest[start + 1..];
        match inner.find(quote) {
            Some(end) => {
                parts.push(inner[..end].to_string());
                rest = &inner[end + 1..];
            }
            None => break,
        }
    }
    parts
}

/// Resolve the basic named entities and numeric character references.
/// Unknown entities are left verbatim.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail
            .find(';')
            .filter(|&semi| (1..=10).contains(&semi))
            .and_then(|semi| decode_entity(&tail[..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let digits = entity.strip_prefix('#')?;
            let code = if let Some(hex) =
                digits.strip_prefix('x').or_else(|| digits.strip_prefix('X'))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                digits.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
