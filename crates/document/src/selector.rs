//! CSS selector parsing and matching
//!
//! Supported:
//! - type and universal selectors, `#id`, `.class`
//! - attribute selectors with `= ~= ^= $= *= |=` and the `i`/`s` flags
//! - `:first-child` `:last-child` `:only-child` and their `-of-type` forms
//! - `:nth-child` `:nth-last-child` `:nth-of-type` `:nth-last-of-type` with
//!   `An+B`, `odd` and `even`
//! - `:empty`, `:root`, `:not()`, `:is()`, `:where()` and `:has()`
//! - the four combinators and comma-separated groups
//!
//! Interactive and state pseudo-classes never match a static tree and are
//! reported as unsupported.

use crate::errors::DocumentError;
use crate::tree::{NodeData, NodeId, Tree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    pseudos: Vec<Pseudo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    matcher: Option<(AttrOp, String)>,
    /// `[attr=value i]`: ASCII case-insensitive value comparison
    ignore_case: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
    DashMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pseudo {
    Nth {
        formula: Nth,
        /// Count only siblings with the same tag name
        of_type: bool,
        /// Count from the last sibling backwards
        from_end: bool,
    },
    Only {
        of_type: bool,
    },
    Empty,
    Root,
    Not(Vec<ComplexSelector>),
    /// `:is()` and `:where()`
    Is(Vec<ComplexSelector>),
    Has(Vec<RelativeSelector>),
}

/// `An+B`: matches 1-based index `a * n + b` for some n >= 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Nth {
    a: i64,
    b: i64,
}

impl Nth {
    const FIRST: Nth = Nth { a: 0, b: 1 };

    fn matches(&self, index: i64) -> bool {
        if self.a == 0 {
            return index == self.b;
        }
        let delta = index - self.b;
        delta % self.a == 0 && delta / self.a >= 0
    }
}

/// Argument of `:has()`, anchored at the element being tested
#[derive(Debug, Clone, PartialEq, Eq)]
struct RelativeSelector {
    leading: Combinator,
    selector: ComplexSelector,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, DocumentError> {
        let mut parser = Parser::new(input);
        let selectors = parser.selector_list()?;
        if let Some(c) = parser.peek() {
            return Err(parser.error(format!("unexpected '{}'", c)));
        }
        Ok(Self { selectors })
    }

    pub(crate) fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        tree.element(node).is_some()
            && self
                .selectors
                .iter()
                .any(|selector| selector.matches(tree, node))
    }
}

impl ComplexSelector {
    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        self.matches_from(tree, node, self.compounds.len() - 1, None)
    }

    /// Match where the leftmost compound must stand in `leading` relation to `anchor`.
    fn matches_relative(
        &self,
        tree: &Tree,
        node: NodeId,
        anchor: NodeId,
        leading: Combinator,
    ) -> bool {
        self.matches_from(tree, node, self.compounds.len() - 1, Some((anchor, leading)))
    }

    /// Right-to-left match of `compounds[..=index]` ending at `node`.
    fn matches_from(
        &self,
        tree: &Tree,
        node: NodeId,
        index: usize,
        anchor: Option<(NodeId, Combinator)>,
    ) -> bool {
        if !self.compounds[index].matches(tree, node) {
            return false;
        }
        if index == 0 {
            return anchor.map_or(true, |(anchor, leading)| {
                related(tree, anchor, node, leading)
            });
        }
        let next = index - 1;
        match self.combinators[next] {
            Combinator::Child => tree
                .parent(node)
                .filter(|parent| tree.element(*parent).is_some())
                .is_some_and(|parent| self.matches_from(tree, parent, next, anchor)),
            Combinator::Descendant => tree
                .element_ancestors(node)
                .any(|ancestor| self.matches_from(tree, ancestor, next, anchor)),
            Combinator::NextSibling => tree
                .preceding_element_siblings(node)
                .first()
                .is_some_and(|sibling| self.matches_from(tree, *sibling, next, anchor)),
            Combinator::SubsequentSibling => tree
                .preceding_element_siblings(node)
                .into_iter()
                .any(|sibling| self.matches_from(tree, sibling, next, anchor)),
        }
    }
}

/// Whether `node` stands in `combinator` relation to `anchor` (anchor on the left).
fn related(tree: &Tree, anchor: NodeId, node: NodeId, combinator: Combinator) -> bool {
    match combinator {
        Combinator::Child => tree.parent(node) == Some(anchor),
        Combinator::Descendant => tree.element_ancestors(node).any(|a| a == anchor),
        Combinator::NextSibling => tree.preceding_element_siblings(node).first() == Some(&anchor),
        Combinator::SubsequentSibling => tree.preceding_element_siblings(node).contains(&anchor),
    }
}

impl RelativeSelector {
    fn matches(&self, tree: &Tree, anchor: NodeId) -> bool {
        let candidates = match self.leading {
            Combinator::Descendant | Combinator::Child => tree.descendants(anchor),
            Combinator::NextSibling | Combinator::SubsequentSibling => {
                let Some(parent) = tree.parent(anchor) else {
                    return false;
                };
                let siblings = tree.children(parent);
                let index = siblings.iter().position(|s| *s == anchor).unwrap_or(0);
                siblings[index + 1..]
                    .iter()
                    .flat_map(|sibling| {
                        std::iter::once(*sibling).chain(tree.descendants(*sibling))
                    })
                    .collect()
            }
        };
        candidates.into_iter().any(|candidate| {
            tree.element(candidate).is_some()
                && self
                    .selector
                    .matches_relative(tree, candidate, anchor, self.leading)
        })
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudos.is_empty()
    }

    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        let Some(element) = tree.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if element.name != *tag {
                return false;
            }
        }
        if !self
            .ids
            .iter()
            .all(|id| element.attr("id") == Some(id.as_str()))
        {
            return false;
        }
        if !self.classes.is_empty() {
            let classes: Vec<&str> = element
                .attr("class")
                .map(|value| value.split_whitespace().collect())
                .unwrap_or_default();
            if !self
                .classes
                .iter()
                .all(|class| classes.contains(&class.as_str()))
            {
                return false;
            }
        }
        if !self.attrs.iter().all(|attr| attr.matches(element.attr(&attr.name))) {
            return false;
        }
        self.pseudos.iter().all(|pseudo| pseudo.matches(tree, node))
    }
}

impl AttrSelector {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        let Some((op, expected)) = &self.matcher else {
            return true;
        };
        let (actual, expected) = if self.ignore_case {
            (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
        } else {
            (actual.to_string(), expected.clone())
        };
        let (actual, expected) = (actual.as_str(), expected.as_str());
        match op {
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => actual.split_whitespace().any(|word| word == expected),
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttrOp::Substring => !expected.is_empty() && actual.contains(expected),
            AttrOp::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
        }
    }
}

impl Pseudo {
    fn matches(&self, tree: &Tree, node: NodeId) -> bool {
        match self {
            Pseudo::Nth {
                formula,
                of_type,
                from_end,
            } => {
                let (index, count) = sibling_position(tree, node, *of_type);
                let index = if *from_end { count - index + 1 } else { index };
                formula.matches(index as i64)
            }
            Pseudo::Only { of_type } => sibling_position(tree, node, *of_type).1 == 1,
            Pseudo::Empty => tree.children(node).iter().all(|child| match tree.data(*child) {
                NodeData::Comment(_) | NodeData::ProcessingInstruction(_) => true,
                NodeData::Text(text) => text.is_empty(),
                _ => false,
            }),
            Pseudo::Root => tree
                .parent(node)
                .is_some_and(|parent| matches!(tree.data(parent), NodeData::Document)),
            Pseudo::Not(selectors) => !selectors.iter().any(|s| s.matches(tree, node)),
            Pseudo::Is(selectors) => selectors.iter().any(|s| s.matches(tree, node)),
            Pseudo::Has(relative) => relative.iter().any(|r| r.matches(tree, node)),
        }
    }
}

/// 1-based index of `node` among its element siblings, and the sibling count.
fn sibling_position(tree: &Tree, node: NodeId, of_type: bool) -> (usize, usize) {
    let Some(parent) = tree.parent(node) else {
        return (1, 1);
    };
    let name = tree.element(node).map(|element| element.name.as_str());
    let siblings: Vec<NodeId> = tree
        .element_children(parent)
        .filter(|sibling| !of_type || tree.element(*sibling).map(|e| e.name.as_str()) == name)
        .collect();
    let index = siblings.iter().position(|s| *s == node).unwrap_or(0);
    (index + 1, siblings.len())
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> DocumentError {
        DocumentError::invalid_selector(self.source, reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn selector_list(&mut self) -> Result<Vec<ComplexSelector>, DocumentError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.complex()?);
            self.skip_whitespace();
            if !self.eat(',') {
                break;
            }
        }
        Ok(selectors)
    }

    fn complex(&mut self) -> Result<ComplexSelector, DocumentError> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') | Some(')') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_space => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Result<Compound, DocumentError> {
        let mut compound = Compound::default();
        let mut universal = false;

        if self.eat('*') {
            universal = true;
        } else if self.peek().is_some_and(is_ident_start) {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.attribute()?);
                }
                Some(':') => {
                    self.bump();
                    compound.pseudos.push(self.pseudo()?);
                }
                _ => break,
            }
        }

        if compound.is_empty() && !universal {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected selector, found '{}'", c)),
                None => self.error("expected selector"),
            });
        }
        Ok(compound)
    }

    fn ident(&mut self) -> Result<String, DocumentError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                match self.bump() {
                    Some(escaped) => out.push(escaped),
                    None => return Err(self.error("dangling escape")),
                }
            } else if is_ident_char(c) {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(self.error("expected identifier"));
        }
        Ok(out)
    }

    fn attribute(&mut self) -> Result<AttrSelector, DocumentError> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        if self.eat(']') {
            return Ok(AttrSelector {
                name,
                matcher: None,
                ignore_case: false,
            });
        }
        let op = match self.bump() {
            Some('=') => AttrOp::Equals,
            Some(prefix @ ('~' | '^' | '$' | '*' | '|')) => {
                if !self.eat('=') {
                    return Err(self.error("expected '=' in attribute selector"));
                }
                match prefix {
                    '~' => AttrOp::Includes,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    '*' => AttrOp::Substring,
                    _ => AttrOp::DashMatch,
                }
            }
            _ => return Err(self.error("malformed attribute selector")),
        };
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some('\\') => match self.bump() {
                            Some(escaped) => value.push(escaped),
                            None => return Err(self.error("unterminated string")),
                        },
                        Some(c) => value.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                value
            }
            _ => self.ident()?,
        };
        self.skip_whitespace();
        let ignore_case = match self.peek() {
            Some('i' | 'I') => {
                self.bump();
                true
            }
            Some('s' | 'S') => {
                self.bump();
                false
            }
            _ => false,
        };
        self.skip_whitespace();
        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }
        Ok(AttrSelector {
            name,
            matcher: Some((op, value)),
            ignore_case,
        })
    }

    fn pseudo(&mut self) -> Result<Pseudo, DocumentError> {
        if self.peek() == Some(':') {
            return Err(DocumentError::unsupported_selector(
                self.source,
                "pseudo-elements",
            ));
        }
        let name = self.ident()?.to_ascii_lowercase();
        let edge = |of_type, from_end| Pseudo::Nth {
            formula: Nth::FIRST,
            of_type,
            from_end,
        };
        match name.as_str() {
            "first-child" => Ok(edge(false, false)),
            "last-child" => Ok(edge(false, true)),
            "first-of-type" => Ok(edge(true, false)),
            "last-of-type" => Ok(edge(true, true)),
            "only-child" => Ok(Pseudo::Only { of_type: false }),
            "only-of-type" => Ok(Pseudo::Only { of_type: true }),
            "empty" => Ok(Pseudo::Empty),
            "root" => Ok(Pseudo::Root),
            "nth-child" | "nth-last-child" | "nth-of-type" | "nth-last-of-type" => {
                self.expect_open_paren()?;
                let argument = self.take_until_close_paren()?;
                let formula = nth_argument(&argument).ok_or_else(|| {
                    self.error(format!("invalid :{} argument '{}'", name, argument))
                })?;
                Ok(Pseudo::Nth {
                    formula,
                    of_type: name.ends_with("of-type"),
                    from_end: name.starts_with("nth-last"),
                })
            }
            "not" | "is" | "where" => {
                self.expect_open_paren()?;
                let inner = self.selector_list()?;
                self.expect_close_paren()?;
                Ok(if name == "not" {
                    Pseudo::Not(inner)
                } else {
                    Pseudo::Is(inner)
                })
            }
            "has" => {
                self.expect_open_paren()?;
                let inner = self.relative_selector_list()?;
                self.expect_close_paren()?;
                Ok(Pseudo::Has(inner))
            }
            other => Err(DocumentError::unsupported_selector(
                self.source,
                format!(":{}", other),
            )),
        }
    }

    fn relative_selector_list(&mut self) -> Result<Vec<RelativeSelector>, DocumentError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            let leading = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                _ => Combinator::Descendant,
            };
            if leading != Combinator::Descendant {
                self.bump();
                self.skip_whitespace();
            }
            selectors.push(RelativeSelector {
                leading,
                selector: self.complex()?,
            });
            self.skip_whitespace();
            if !self.eat(',') {
                break;
            }
        }
        Ok(selectors)
    }

    fn expect_close_paren(&mut self) -> Result<(), DocumentError> {
        self.skip_whitespace();
        if self.eat(')') {
            Ok(())
        } else {
            Err(self.error("expected ')'"))
        }
    }

    fn expect_open_paren(&mut self) -> Result<(), DocumentError> {
        if self.eat('(') {
            Ok(())
        } else {
            Err(self.error("expected '('"))
        }
    }

    fn take_until_close_paren(&mut self) -> Result<String, DocumentError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(')') => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.error("expected ')'")),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

/// Parse `odd`, `even` or `An+B` (`3`, `n`, `-n+3`, `2n + 1`, ...).
fn nth_argument(argument: &str) -> Option<Nth> {
    let compact: String = argument
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match compact.as_str() {
        "odd" => return Some(Nth { a: 2, b: 1 }),
        "even" => return Some(Nth { a: 2, b: 0 }),
        "" => return None,
        _ => {}
    }
    let Some((a, b)) = compact.split_once('n') else {
        return compact.parse().ok().map(|b| Nth { a: 0, b });
    };
    let a = match a {
        "" | "+" => 1,
        "-" => -1,
        digits => digits.parse().ok()?,
    };
    let b = match b {
        "" => 0,
        signed if signed.starts_with(['+', '-']) => signed.parse().ok()?,
        _ => return None,
    };
    Some(Nth { a, b })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_groups_and_combinators() {
        let list = SelectorList::parse("div > p.note, ul li + li ~ li").unwrap();
        assert_eq!(list.selectors.len(), 2);
        assert_eq!(
            list.selectors[0].combinators,
            vec![Combinator::Child]
        );
        assert_eq!(
            list.selectors[1].combinators,
            vec![
                Combinator::Descendant,
                Combinator::NextSibling,
                Combinator::SubsequentSibling
            ]
        );
    }

    #[test]
    fn parses_attribute_operators() {
        let list = SelectorList::parse(r#"a[href^="https"][rel~=nofollow][data-x]"#).unwrap();
        let attrs = &list.selectors[0].compounds[0].attrs;
        assert_eq!(attrs.len(), 3);
        assert_eq!(
            attrs[0].matcher,
            Some((AttrOp::Prefix, "https".to_string()))
        );
        assert_eq!(attrs[2].matcher, None);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "   ", "div >", ",p", "p,", "[x", "a[b=", "#", ".", "p )"] {
            assert!(
                matches!(
                    SelectorList::parse(bad),
                    Err(DocumentError::InvalidSelector { .. })
                ),
                "expected error for {:?}",
                bad
            );
        }
    }

    #[test]
    fn reports_unsupported_features() {
        assert!(matches!(
            SelectorList::parse("p::before"),
            Err(DocumentError::UnsupportedSelector { .. })
        ));
        assert!(matches!(
            SelectorList::parse("a:hover"),
            Err(DocumentError::UnsupportedSelector { .. })
        ));
        assert!(matches!(
            SelectorList::parse("li:nth-child(2n+1 of .x)"),
            Err(DocumentError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn nth_argument_forms() {
        assert_eq!(nth_argument("odd"), Some(Nth { a: 2, b: 1 }));
        assert_eq!(nth_argument(" EVEN "), Some(Nth { a: 2, b: 0 }));
        assert_eq!(nth_argument("3"), Some(Nth { a: 0, b: 3 }));
        assert_eq!(nth_argument("0"), Some(Nth { a: 0, b: 0 }));
        assert_eq!(nth_argument("2n+1"), Some(Nth { a: 2, b: 1 }));
        assert_eq!(nth_argument("2n + 1"), Some(Nth { a: 2, b: 1 }));
        assert_eq!(nth_argument("-n+3"), Some(Nth { a: -1, b: 3 }));
        assert_eq!(nth_argument("n"), Some(Nth { a: 1, b: 0 }));
        assert_eq!(nth_argument("3n-2"), Some(Nth { a: 3, b: -2 }));
        assert_eq!(nth_argument("2n1"), None);
        assert_eq!(nth_argument("x"), None);
        assert_eq!(nth_argument(""), None);
    }

    #[test]
    fn nth_formula_matching() {
        let odd = Nth { a: 2, b: 1 };
        assert!(odd.matches(1) && odd.matches(3) && !odd.matches(2));
        let first_three = Nth { a: -1, b: 3 };
        assert!(first_three.matches(1) && first_three.matches(3));
        assert!(!first_three.matches(4));
        let none = Nth { a: 0, b: 0 };
        assert!(!none.matches(1));
    }
}
