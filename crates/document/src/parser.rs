//! Lenient markup parser
//!
//! Builds nodes under an existing parent. Text and attribute values are kept
//! verbatim (no entity decoding) so that serializing a parsed tree reproduces
//! its input. Stray end tags are ignored, a small set of implied end tags is
//! honoured and a `<tr>` opened directly inside `<table>` gets the implied
//! `<tbody>`. Anything fancier from the HTML tree-construction algorithm
//! (foster parenting, adoption agency, implied `<html>`/`<head>`) is out of
//! scope.

use crate::tree::{Attribute, ElementData, NodeData, NodeId, Tree};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Block-level starts that implicitly close an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "div",
    "dl",
    "fieldset",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "ul",
];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Text(String),
    Comment(String),
    Doctype(String),
    ProcessingInstruction(String),
    StartTag {
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag(String),
}

/// Parse `input` and append the resulting nodes to `parent`.
pub(crate) fn parse_into(tree: &mut Tree, parent: NodeId, input: &str) {
    let mut open: Vec<NodeId> = vec![parent];

    for token in Tokenizer::new(input) {
        let current = *open.last().unwrap_or(&parent);
        match token {
            Token::Text(text) => {
                let node = tree.create(NodeData::Text(text));
                tree.append(current, node);
            }
            Token::Comment(text) => {
                let node = tree.create(NodeData::Comment(text));
                tree.append(current, node);
            }
            Token::Doctype(text) => {
                let node = tree.create(NodeData::Doctype(text));
                tree.append(current, node);
            }
            Token::ProcessingInstruction(text) => {
                let node = tree.create(NodeData::ProcessingInstruction(text));
                tree.append(current, node);
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                while open.len() > 1 {
                    let top = open[open.len() - 1];
                    let closes = tree
                        .element(top)
                        .is_some_and(|element| implicitly_closed_by(&element.name, &name));
                    if !closes {
                        break;
                    }
                    open.pop();
                }
                let mut current = *open.last().unwrap_or(&parent);
                if name == "tr" && tree.is_element_named(current, "table") {
                    let tbody = tree.create(NodeData::Element(ElementData {
                        name: "tbody".to_string(),
                        attrs: Vec::new(),
                    }));
                    tree.append(current, tbody);
                    open.push(tbody);
                    current = tbody;
                }
                let keep_open = !self_closing && !is_void(&name);
                let node = tree.create(NodeData::Element(ElementData { name, attrs }));
                tree.append(current, node);
                if keep_open {
                    open.push(node);
                }
            }
            Token::EndTag(name) => {
                // The base parent (index 0) is never closed by markup.
                if let Some(index) = open
                    .iter()
                    .rposition(|node| tree.is_element_named(*node, &name))
                    .filter(|index| *index > 0)
                {
                    open.truncate(index);
                }
            }
        }
    }
}

fn implicitly_closed_by(open: &str, incoming: &str) -> bool {
    match open {
        "p" => CLOSES_PARAGRAPH.contains(&incoming),
        "li" => incoming == "li",
        "option" => matches!(incoming, "option" | "optgroup"),
        "dt" | "dd" => matches!(incoming, "dt" | "dd"),
        "tr" => incoming == "tr",
        "td" | "th" => matches!(incoming, "td" | "th" | "tr"),
        _ => false,
    }
}

struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Set after a raw-text start tag; the next token is its verbatim content.
    raw_text_for: Option<String>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_text_for: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&keep) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    /// Whether a `<` at byte offset `at` opens markup rather than being text.
    fn opens_markup(&self, at: usize) -> bool {
        let mut chars = self.input[at..].chars();
        if chars.next() != Some('<') {
            return false;
        }
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() => true,
            Some('!') | Some('?') => true,
            Some('/') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
            _ => false,
        }
    }

    fn text(&mut self) -> Token {
        let start = self.pos;
        let mut cursor = self.pos;
        loop {
            match self.input[cursor..].find('<') {
                Some(offset) => {
                    let at = cursor + offset;
                    if self.opens_markup(at) {
                        self.pos = at;
                        break;
                    }
                    cursor = at + 1;
                }
                None => {
                    self.pos = self.input.len();
                    break;
                }
            }
        }
        Token::Text(self.input[start..self.pos].to_string())
    }

    fn raw_text(&mut self, name: &str) -> Option<Token> {
        let rest = self.rest();
        let needle = format!("</{}", name);
        let end = rest
            .to_ascii_lowercase()
            .find(&needle)
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        let content = rest[..end].to_string();
        self.pos += end;
        Some(Token::Text(content))
    }

    fn comment(&mut self) -> Token {
        self.pos += "<!--".len();
        let rest = self.rest();
        match rest.find("-->") {
            Some(end) => {
                let content = rest[..end].to_string();
                self.pos += end + "-->".len();
                Token::Comment(content)
            }
            None => {
                self.pos = self.input.len();
                Token::Comment(rest.to_string())
            }
        }
    }

    fn declaration(&mut self) -> Token {
        let is_processing = self.rest().starts_with("<?");
        self.pos += 2;
        let rest = self.rest();
        let end = rest.find('>').unwrap_or(rest.len());
        let content = rest[..end].to_string();
        self.pos = (self.pos + end + 1).min(self.input.len());
        if is_processing {
            Token::ProcessingInstruction(content)
        } else {
            Token::Doctype(content)
        }
    }

    fn end_tag(&mut self) -> Token {
        self.pos += 2;
        let name = self
            .take_while(|c| !c.is_whitespace() && c != '/' && c != '>')
            .to_ascii_lowercase();
        self.take_while(|c| c != '>');
        self.bump();
        Token::EndTag(name)
    }

    fn start_tag(&mut self) -> Token {
        self.bump();
        let name = self
            .take_while(|c| !c.is_whitespace() && c != '/' && c != '>')
            .to_ascii_lowercase();
        let mut attrs: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('>') => {
                    self.bump();
                    break;
                }
                Some('/') => {
                    self.bump();
                    if self.peek() == Some('>') {
                        self.bump();
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    let attr_name = self
                        .take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
                        .to_ascii_lowercase();
                    if attr_name.is_empty() {
                        // Lone '=' or similar garbage; skip it.
                        self.bump();
                        continue;
                    }
                    self.skip_whitespace();
                    let value = if self.peek() == Some('=') {
                        self.bump();
                        self.skip_whitespace();
                        Some(self.attribute_value())
                    } else {
                        None
                    };
                    if !attrs.iter().any(|attr| attr.name == attr_name) {
                        attrs.push(Attribute {
                            name: attr_name,
                            value,
                        });
                    }
                }
            }
        }

        if !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text_for = Some(name.clone());
        }

        Token::StartTag {
            name,
            attrs,
            self_closing,
        }
    }

    fn attribute_value(&mut self) -> String {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let value = self.take_while(|c| c != quote).to_string();
                self.bump();
                value
            }
            _ => self
                .take_while(|c| !c.is_whitespace() && c != '>')
                .to_string(),
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(name) = self.raw_text_for.take() {
            if let Some(token) = self.raw_text(&name) {
                return Some(token);
            }
        }

        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }
        if !self.opens_markup(self.pos) {
            return Some(self.text());
        }
        if rest.starts_with("<!--") {
            Some(self.comment())
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            Some(self.declaration())
        } else if rest.starts_with("</") {
            Some(self.end_tag())
        } else {
            Some(self.start_tag())
        }
    }
}
