use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use crate::validate::{self, StringRules, ValidationError};

/// One parsed node: a markup tag or a raw text run.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }
}

/// A parsed markup tag with a name, attribute map, and ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    /// Attribute keys are unique; insertion order is irrelevant.
    pub attrs: HashMap<String, String>,
    pub child_nodes: Vec<Node>,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
}

impl Element {
    /// Element children in document order (text runs filtered out).
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.child_nodes.iter().filter_map(Node::as_element)
    }

    /// Concatenation of direct text-run children (non-recursive).
    pub fn data(&self) -> String {
        let mut s = String::new();
        for node in &self.child_nodes {
            if let Node::Text(t) = node {
                s.push_str(t);
            }
        }
        s
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Wrap a validation failure with this element's tag name and the
    /// attribute name, for diagnostics.
    pub fn attr_error(&self, attr: &str, source: ValidationError) -> AttrError {
        AttrError {
            element: self.name.clone(),
            attr: attr.to_string(),
            source,
        }
    }

    // Typed attribute accessors. Every failure is re-wrapped with the owning
    // element and attribute names. The `require_*` forms have no default:
    // an absent attribute is an error.

    pub fn float(&self, name: &str, min: Option<f64>, max: Option<f64>, default: f64) -> Result<f64, AttrError> {
        validate::float(self.attr(name), min, max, Some(default))
            .map_err(|e| self.attr_error(name, e))
    }

    pub fn require_float(&self, name: &str, min: Option<f64>, max: Option<f64>) -> Result<f64, AttrError> {
        validate::float(self.attr(name), min, max, None).map_err(|e| self.attr_error(name, e))
    }

    pub fn int(&self, name: &str, min: Option<i64>, max: Option<i64>, default: i64) -> Result<i64, AttrError> {
        validate::int(self.attr(name), min, max, Some(default))
            .map_err(|e| self.attr_error(name, e))
    }

    pub fn require_int(&self, name: &str, min: Option<i64>, max: Option<i64>) -> Result<i64, AttrError> {
        validate::int(self.attr(name), min, max, None).map_err(|e| self.attr_error(name, e))
    }

    pub fn word(&self, name: &str, rules: &StringRules, default: &str) -> Result<String, AttrError> {
        validate::word(self.attr(name), rules, Some(default))
            .map_err(|e| self.attr_error(name, e))
    }

    pub fn require_word(&self, name: &str, rules: &StringRules) -> Result<String, AttrError> {
        validate::word(self.attr(name), rules, None).map_err(|e| self.attr_error(name, e))
    }

    pub fn bool(&self, name: &str, default: bool) -> Result<bool, AttrError> {
        validate::bool(self.attr(name), Some(default)).map_err(|e| self.attr_error(name, e))
    }

    pub fn require_bool(&self, name: &str) -> Result<bool, AttrError> {
        validate::bool(self.attr(name), None).map_err(|e| self.attr_error(name, e))
    }

    /// Split the raw attribute value on single spaces; exactly `count`
    /// tokens must result. An absent attribute yields an empty sequence.
    pub fn split(&self, name: &str, count: usize) -> Result<Vec<String>, AttrError> {
        let Some(raw) = self.attr(name) else {
            return Ok(Vec::new());
        };
        let tokens: Vec<String> = raw.split(' ').map(str::to_string).collect();
        if tokens.len() != count {
            return Err(self.attr_error(
                name,
                ValidationError::WrongArity {
                    expected: count,
                    got: tokens.len(),
                },
            ));
        }
        Ok(tokens)
    }

    /// Validate the element's text content as an integer. Content that is
    /// empty after trimming counts as absent.
    pub fn int_content(&self, min: Option<i64>, max: Option<i64>, default: Option<i64>) -> Result<i64, AttrError> {
        let data = self.data();
        let t = data.trim();
        let raw = if t.is_empty() { None } else { Some(t) };
        validate::int(raw, min, max, default).map_err(|e| self.attr_error("content", e))
    }

    /// Validate the element's text content as a boolean.
    pub fn bool_content(&self, default: Option<bool>) -> Result<bool, AttrError> {
        let data = self.data();
        let t = data.trim();
        let raw = if t.is_empty() { None } else { Some(t) };
        validate::bool(raw, default).map_err(|e| self.attr_error("content", e))
    }
}

/// A validation failure tagged with the owning element and attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrError {
    pub element: String,
    pub attr: String,
    pub source: ValidationError,
}

impl fmt::Display for AttrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "elem {}, attr {}: {}", self.element, self.attr, self.source)
    }
}

impl std::error::Error for AttrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
