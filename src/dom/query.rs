//! Selector parsing and matching against a [`Document`].
//!
//! Covers the subset of CSS that stored locators use: type/universal, `#id`,
//! `.class`, attribute presence and equality, `:nth-of-type`, `:nth-child`,
//! `:first-child`, `:first-of-type`, the descendant and child combinators,
//! and selector lists.

use thiserror::Error;

use crate::dom::dom_model::{Document, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SimpleSelector {
    Id(String),
    Class(String),
    AttrExists(String),
    AttrEquals(String, String),
    NthOfType(usize),
    NthChild(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    parts: Vec<SimpleSelector>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One complex selector; each compound carries the combinator linking it to
/// the previous one (ignored for the first).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<(Combinator, Compound)>,
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Complex>,
}

pub fn parse_selector(source: &str) -> Result<SelectorList, QueryError> {
    Parser::new(source).parse_list()
}

/// First matching element in tree order.
pub fn query_selector(doc: &Document, selector: &str) -> Result<Option<NodeId>, QueryError> {
    let list = parse_selector(selector)?;
    Ok(doc.elements().into_iter().find(|&id| list.matches(doc, id)))
}

pub fn query_selector_all(doc: &Document, selector: &str) -> Result<Vec<NodeId>, QueryError> {
    let list = parse_selector(selector)?;
    Ok(doc
        .elements()
        .into_iter()
        .filter(|&id| list.matches(doc, id))
        .collect())
}

impl SelectorList {
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|complex| complex.matches_from(doc, id, complex.compounds.len() - 1))
    }
}

impl Complex {
    fn matches_from(&self, doc: &Document, id: NodeId, idx: usize) -> bool {
        let (combinator, compound) = &self.compounds[idx];
        if !compound.matches(doc, id) {
            return false;
        }
        if idx == 0 {
            return true;
        }

        match combinator {
            Combinator::Child => doc
                .parent_element(id)
                .map(|p| self.matches_from(doc, p, idx - 1))
                .unwrap_or(false),
            Combinator::Descendant => {
                let mut ancestor = doc.parent_element(id);
                while let Some(a) = ancestor {
                    if self.matches_from(doc, a, idx - 1) {
                        return true;
                    }
                    ancestor = doc.parent_element(a);
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(el) = doc.element(id) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if tag != "*" && *tag != el.tag {
                return false;
            }
        }

        self.parts.iter().all(|part| match part {
            SimpleSelector::Id(v) => el.attr("id") == Some(v.as_str()),
            SimpleSelector::Class(c) => el.has_class(c),
            SimpleSelector::AttrExists(name) => el.attr(name).is_some(),
            SimpleSelector::AttrEquals(name, v) => el.attr(name) == Some(v.as_str()),
            SimpleSelector::NthOfType(n) => sibling_position(doc, id, true) == Some(*n),
            SimpleSelector::NthChild(n) => sibling_position(doc, id, false) == Some(*n),
        })
    }
}

/// 1-based position among element siblings (optionally only same-tag ones).
fn sibling_position(doc: &Document, id: NodeId, same_tag: bool) -> Option<usize> {
    let parent = doc.parent(id)?;
    let tag = doc.tag(id)?;
    doc.element_children(parent)
        .into_iter()
        .filter(|&s| !same_tag || doc.tag(s) == Some(tag))
        .position(|s| s == id)
        .map(|p| p + 1)
}

// =========================================================================
// Parser
// =========================================================================

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> QueryError {
        QueryError::InvalidSelector {
            selector: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, expected: char) -> Result<(), QueryError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn parse_list(mut self) -> Result<SelectorList, QueryError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            selectors.push(self.parse_complex()?);
            self.skip_ws();
            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<Complex, QueryError> {
        let mut compounds = vec![(Combinator::Descendant, self.parse_compound()?)];

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            };
            compounds.push((combinator, self.parse_compound()?));
        }

        Ok(Complex { compounds })
    }

    fn parse_compound(&mut self) -> Result<Compound, QueryError> {
        let mut compound = Compound {
            tag: None,
            parts: Vec::new(),
        };

        if self.peek() == Some('*') {
            self.bump();
            compound.tag = Some("*".into());
        } else if self.at_ident_start() {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.parts.push(SimpleSelector::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.bump();
                    compound.parts.push(SimpleSelector::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.bump();
                    compound.parts.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.bump();
                    compound.parts.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }

        if compound.tag.is_none() && compound.parts.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.error(format!("unexpected '{}'", c)),
                None => self.error("empty selector"),
            });
        }
        Ok(compound)
    }

    fn parse_attribute(&mut self) -> Result<SimpleSelector, QueryError> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();

        match self.bump() {
            Some(']') => Ok(SimpleSelector::AttrExists(name)),
            Some('=') => {
                self.skip_ws();
                let value = match self.peek() {
                    Some(q @ ('"' | '\'')) => {
                        self.bump();
                        self.parse_string(q)?
                    }
                    _ => self.parse_ident()?,
                };
                self.skip_ws();
                self.expect(']')?;
                Ok(SimpleSelector::AttrEquals(name, value))
            }
            Some(c) => Err(self.error(format!("unsupported attribute operator '{}'", c))),
            None => Err(self.error("unterminated attribute selector")),
        }
    }

    fn parse_pseudo(&mut self) -> Result<SimpleSelector, QueryError> {
        let name = self.parse_ident()?.to_ascii_lowercase();
        match name.as_str() {
            "first-child" => Ok(SimpleSelector::NthChild(1)),
            "first-of-type" => Ok(SimpleSelector::NthOfType(1)),
            "nth-child" | "nth-of-type" => {
                self.expect('(')?;
                self.skip_ws();
                let mut digits = String::new();
                while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                    digits.push(c);
                    self.bump();
                }
                self.skip_ws();
                self.expect(')')?;
                let n: usize = digits
                    .parse()
                    .map_err(|_| self.error(format!(":{}() needs a positive integer", name)))?;
                if n == 0 {
                    return Err(self.error(format!(":{}() is 1-based", name)));
                }
                Ok(if name == "nth-child" {
                    SimpleSelector::NthChild(n)
                } else {
                    SimpleSelector::NthOfType(n)
                })
            }
            other => Err(self.error(format!("unsupported pseudo-class ':{}'", other))),
        }
    }

    fn at_ident_start(&self) -> bool {
        match self.peek() {
            Some('-') => matches!(
                self.peek_at(1),
                Some(c) if is_name_start(c) || c == '\\' || c == '-'
            ),
            Some('\\') => true,
            Some(c) => is_name_start(c),
            None => false,
        }
    }

    fn parse_ident(&mut self) -> Result<String, QueryError> {
        if !self.at_ident_start() {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected identifier, found '{}'", c)),
                None => self.error("expected identifier, found end of input"),
            });
        }

        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                out.push(self.parse_escape()?);
            } else if is_name_start(c) || c == '-' || c.is_ascii_digit() {
                self.bump();
                out.push(c);
            } else {
                break;
            }
        }
        Ok(out)
    }

    fn parse_string(&mut self, quote: char) -> Result<String, QueryError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated string")),
                Some('\\') => out.push(self.parse_escape()?),
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    /// Called after the backslash.
    fn parse_escape(&mut self) -> Result<char, QueryError> {
        let mut hex = String::new();
        while hex.len() < 6 {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.bump();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            return match self.bump() {
                None | Some('\n') => Err(self.error("invalid escape")),
                Some(c) => Ok(c),
            };
        }

        if self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
        let code = u32::from_str_radix(&hex, 16).map_err(|_| self.error("invalid escape"))?;
        Ok(match char::from_u32(code) {
            Some(c) if code != 0 => c,
            _ => '\u{FFFD}',
        })
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || (c as u32) >= 0x80
}
