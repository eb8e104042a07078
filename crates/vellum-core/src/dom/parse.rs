//! Small HTML parser producing [`DomNode`] trees.
//!
//! Covers the subset the editor emits and accepts: elements, attributes
//! (double-, single-, and unquoted), character entities, comments, doctype,
//! void and self-closing tags. Tag and attribute names are lowercased.
//! Whitespace in text is kept verbatim; collapsing is a schema-level
//! decision, not a codec one.

use thiserror::Error;

use super::{DomElement, DomNode};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomParseError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),
    #[error("malformed tag at byte {0}")]
    MalformedTag(usize),
    #[error("unexpected closing tag `{tag}` at byte {pos}")]
    UnexpectedCloseTag { tag: String, pos: usize },
    #[error("unclosed element `{tag}` at end of input")]
    UnclosedElement { tag: String },
}

/// Parse an HTML fragment into a sequence of sibling nodes.
pub fn parse_html(html: &str) -> Result<Vec<DomNode>, DomParseError> {
    let mut parser = Parser {
        data: html.as_bytes(),
        x: 0,
    };
    parser.read_nodes(None)
}

struct Parser<'a> {
    data: &'a [u8],
    x: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.data.get(self.x).copied()
    }

    fn starts_with(&self, s: &[u8]) -> bool {
        self.data[self.x..].starts_with(s)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.x += 1;
        }
    }

    /// Read siblings until end of input (`close_for` = `None`) or until the
    /// matching closing tag is consumed.
    fn read_nodes(&mut self, close_for: Option<&str>) -> Result<Vec<DomNode>, DomParseError> {
        let mut nodes = Vec::new();
        loop {
            if self.x >= self.data.len() {
                return match close_for {
                    Some(tag) => Err(DomParseError::UnclosedElement {
                        tag: tag.to_owned(),
                    }),
                    None => Ok(nodes),
                };
            }
            if self.starts_with(b"</") {
                let pos = self.x;
                let tag = self.read_close_tag()?;
                return match close_for {
                    Some(open) if open == tag => Ok(nodes),
                    _ => Err(DomParseError::UnexpectedCloseTag { tag, pos }),
                };
            }
            if self.starts_with(b"<!--") {
                self.skip_comment()?;
                continue;
            }
            if self.starts_with(b"<!") || self.starts_with(b"<?") {
                self.skip_until(b'>')?;
                continue;
            }
            if self.peek() == Some(b'<') {
                nodes.push(DomNode::Element(self.read_element()?));
                continue;
            }
            nodes.push(DomNode::Text(self.read_text()));
        }
    }

    fn read_text(&mut self) -> String {
        let start = self.x;
        while self.x < self.data.len() && self.data[self.x] != b'<' {
            self.x += 1;
        }
        let raw = std::str::from_utf8(&self.data[start..self.x]).unwrap_or_default();
        decode_entities(raw)
    }

    fn read_element(&mut self) -> Result<DomElement, DomParseError> {
        self.x += 1; // consume '<'
        let tag = self.read_name()?;
        let mut element = DomElement::new(tag.clone());

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(DomParseError::UnexpectedEof(self.x)),
                Some(b'>') => {
                    self.x += 1;
                    break;
                }
                Some(b'/') => {
                    // self-closing: "/>"
                    self.x += 1;
                    if self.peek() != Some(b'>') {
                        return Err(DomParseError::MalformedTag(self.x));
                    }
                    self.x += 1;
                    return Ok(element);
                }
                Some(_) => {
                    let (name, value) = self.read_attr()?;
                    element.attrs.push((name, value));
                }
            }
        }

        if super::is_void(&element.tag) {
            return Ok(element);
        }
        element.children = self.read_nodes(Some(&tag))?;
        Ok(element)
    }

    fn read_close_tag(&mut self) -> Result<String, DomParseError> {
        self.x += 2; // consume "</"
        let tag = self.read_name()?;
        self.skip_whitespace();
        if self.peek() != Some(b'>') {
            return Err(DomParseError::MalformedTag(self.x));
        }
        self.x += 1;
        Ok(tag)
    }

    fn read_name(&mut self) -> Result<String, DomParseError> {
        let start = self.x;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':' {
                self.x += 1;
            } else {
                break;
            }
        }
        if self.x == start {
            return Err(DomParseError::MalformedTag(start));
        }
        let raw = std::str::from_utf8(&self.data[start..self.x])
            .map_err(|_| DomParseError::MalformedTag(start))?;
        Ok(raw.to_ascii_lowercase())
    }

    fn read_attr(&mut self) -> Result<(String, String), DomParseError> {
        let name = self.read_name()?;
        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            // boolean attribute, e.g. <input disabled>
            return Ok((name, String::new()));
        }
        self.x += 1;
        self.skip_whitespace();
        let value = match self.peek() {
            Some(q @ (b'"' | b'\'')) => {
                self.x += 1;
                let start = self.x;
                while self.x < self.data.len() && self.data[self.x] != q {
                    self.x += 1;
                }
                if self.x >= self.data.len() {
                    return Err(DomParseError::UnexpectedEof(start));
                }
                let raw = std::str::from_utf8(&self.data[start..self.x]).unwrap_or_default();
                self.x += 1; // closing quote
                decode_entities(raw)
            }
            Some(_) => {
                let start = self.x;
                while let Some(c) = self.peek() {
                    if c.is_ascii_whitespace() || c == b'>' || c == b'/' {
                        break;
                    }
                    self.x += 1;
                }
                let raw = std::str::from_utf8(&self.data[start..self.x]).unwrap_or_default();
                decode_entities(raw)
            }
            None => return Err(DomParseError::UnexpectedEof(self.x)),
        };
        Ok((name, value))
    }

    fn skip_comment(&mut self) -> Result<(), DomParseError> {
        let start = self.x;
        self.x += 4; // "<!--"
        while self.x < self.data.len() {
            if self.starts_with(b"-->") {
                self.x += 3;
                return Ok(());
            }
            self.x += 1;
        }
        Err(DomParseError::UnexpectedEof(start))
    }

    fn skip_until(&mut self, byte: u8) -> Result<(), DomParseError> {
        let start = self.x;
        while self.x < self.data.len() {
            if self.data[self.x] == byte {
                self.x += 1;
                return Ok(());
            }
            self.x += 1;
        }
        Err(DomParseError::UnexpectedEof(start))
    }
}

// ── Entities ───────────────────────────────────────────────────────────────

/// Decode character entities. Unknown entities are kept literally, which is
/// what browsers do.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        // entity names are short; anything else is a bare ampersand
        let semi = match rest.find(';') {
            Some(i) if i <= 12 => i,
            _ => {
                out.push('&');
                rest = &rest[1..];
                continue;
            }
        };
        let entity = &rest[1..semi];
        match decode_one_entity(entity) {
            Some(ch) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_one_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let digits = entity.strip_prefix('#')?;
            let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                digits.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}
