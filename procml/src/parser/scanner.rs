use std::collections::HashMap;
use std::ops::Range;

use crate::element::{Element, Node};
use crate::parser::error::ParseError;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Scan markup text into a list of top-level nodes, accumulating every
/// structural error found along the way.
pub(crate) fn scan_nodes(source: &str, file_id: usize) -> Result<Vec<Node>, Vec<ParseError>> {
    let mut scanner = Scanner::new(source, file_id);
    let nodes = scanner.scan_children("");
    if scanner.errors.is_empty() {
        Ok(nodes)
    } else {
        Err(scanner.errors)
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Bytes that terminate a tag or attribute name.
const NAME_SPACERS: &[u8] = b"\n\r\t>/= ";

struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    file_id: usize,
    errors: Vec<ParseError>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str, file_id: usize) -> Self {
        Scanner {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            file_id,
            errors: Vec::new(),
        }
    }

    /// Scan a list of nodes until the parent's closing tag or end of input.
    fn scan_children(&mut self, parent_name: &str) -> Vec<Node> {
        let mut children = Vec::new();

        while !self.is_eof() {
            if self.cur() == Some(b'<') {
                self.pos += 1;

                // closing tag
                if self.cur() == Some(b'/') {
                    self.pos += 1;
                    let start = self.pos;
                    self.seek_to(b'>');
                    let name = &self.source[start..self.pos];
                    if name != parent_name {
                        self.push_error(
                            format!(
                                "tag names mismatch, open='{}', close='{}'",
                                parent_name, name
                            ),
                            start..self.pos,
                        );
                    }
                    return children;
                }

                // Comment or doctype. Shallow prefix check only: `<!--`
                // opens a comment, but either way the whole construct is
                // discarded up to the next '>'.
                if self.cur() == Some(b'!') {
                    self.pos += 1;
                    self.seek_to(b'>');
                    self.pos += 1;
                    continue;
                }

                // opening tag
                let element = self.scan_element();
                children.push(Node::Element(element));
                self.pos += 1;
            } else if parent_name == "script" {
                // Embedded host-language snippet: everything up to the
                // literal `</script>` passes through verbatim.
                children.push(Node::Text(self.scan_script().to_string()));
            } else {
                let text = self.scan_text();
                if !text.is_empty() {
                    children.push(Node::Text(text.to_string()));
                }
            }
        }
        children
    }

    fn scan_element(&mut self) -> Element {
        let span_start = self.pos;
        let name = self.scan_name().to_string();
        if name.is_empty() {
            let start = self.pos;
            self.seek_to(b'>');
            self.push_error(
                format!(
                    "invalid or empty tag name in string '{}'",
                    &self.source[start..self.pos]
                ),
                start..self.pos,
            );
        }

        self.skip_spaces();

        let mut attrs: HashMap<String, String> = HashMap::new();
        while !matches!(self.cur(), Some(b'>') | Some(b'/') | None) {
            let attr = self.scan_name().to_string();
            if attr.is_empty() {
                self.push_error(
                    format!("invalid or empty attr name of element '{}'", name),
                    self.pos..self.pos,
                );
                self.seek_to(b'>');
                break;
            }

            if self.cur() != Some(b'=') {
                self.push_error(
                    format!("attr must be followed by '=' in element '{}'", name),
                    self.pos..self.pos,
                );
                self.seek_to(b'>');
                break;
            }
            self.pos += 1;

            if !matches!(self.cur(), Some(b'\'') | Some(b'"')) {
                self.push_error(
                    format!("attr value must be wrapped by ' or \" in element '{}'", name),
                    self.pos..self.pos,
                );
                continue;
            }

            let value = self.scan_quote().to_string();
            attrs.insert(attr, value);
            self.pos += 1;

            self.skip_spaces();
        }

        let mut child_nodes = Vec::new();
        if self.cur() == Some(b'>') {
            self.pos += 1;
            child_nodes = self.scan_children(&name);
        } else if self.cur() == Some(b'/') {
            // self-closing tag
            self.seek_to(b'>');
        }

        Element {
            name,
            attrs,
            child_nodes,
            span: span_start..self.pos,
        }
    }

    fn scan_text(&mut self) -> &'a str {
        let start = self.pos;
        self.seek_to(b'<');
        &self.source[start..self.pos]
    }

    fn scan_script(&mut self) -> &'a str {
        let start = self.pos;
        match self.source[self.pos..].find("</script>") {
            Some(offset) => self.pos += offset,
            None => self.pos = self.source.len(),
        }
        &self.source[start..self.pos]
    }

    fn scan_name(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.cur() {
            if NAME_SPACERS.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        &self.source[start..self.pos]
    }

    fn scan_quote(&mut self) -> &'a str {
        let quote = self.bytes[self.pos];
        self.pos += 1;
        let start = self.pos;
        self.seek_to(quote);
        &self.source[start..self.pos]
    }

    // helper functions

    fn cur(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn seek_to(&mut self, byte: u8) {
        match self.bytes[self.pos..].iter().position(|&b| b == byte) {
            Some(offset) => self.pos += offset,
            None => self.pos = self.bytes.len(),
        }
    }

    fn skip_spaces(&mut self) {
        while self.cur() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn push_error(&mut self, message: String, span: Range<usize>) {
        self.errors.push(ParseError::new(message, span, self.file_id));
    }
}
