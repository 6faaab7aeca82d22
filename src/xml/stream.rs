//! Forward-only XML cursor over `quick_xml::Reader`.
//!
//! The cursor only ever stops on element boundaries (start tag, end tag, end
//! of document). Namespace prefixes are resolved against the in-scope
//! `xmlns` declarations, so callers compare (namespace, local name) pairs.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{GmlError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEvent {
    /// No event read yet.
    Initial,
    Start,
    End,
    Eof,
}

#[derive(Debug, Clone)]
struct Attribute {
    namespace: String,
    local: String,
    value: String,
}

pub struct XmlStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    event: XmlEvent,
    namespace: String,
    local: String,
    attributes: Vec<Attribute>,
    scopes: Vec<Vec<(String, String)>>,
    depth: usize,
}

impl<'a> XmlStream<&'a [u8]> {
    pub fn from_str(xml: &'a str) -> Self {
        XmlStream::new(xml.as_bytes())
    }
}

impl<R: BufRead> XmlStream<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.trim_text(true);
        reader.expand_empty_elements(true);
        XmlStream {
            reader,
            buf: Vec::new(),
            event: XmlEvent::Initial,
            namespace: String::new(),
            local: String::new(),
            attributes: Vec::new(),
            scopes: Vec::new(),
            depth: 0,
        }
    }

    pub fn event(&self) -> XmlEvent {
        self.event
    }

    pub fn is_start(&self) -> bool {
        self.event == XmlEvent::Start
    }

    pub fn is_end(&self) -> bool {
        self.event == XmlEvent::End
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn is_element(&self, namespace: &str, local: &str) -> bool {
        self.namespace == namespace && self.local == local
    }

    /// Depth of the current element (root element is 1).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Unqualified attribute of the current start tag.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attribute_ns("", local)
    }

    pub fn attribute_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace == namespace && a.local == local)
            .map(|a| a.value.as_str())
    }

    /// Advances to the next start tag, end tag or end of document.
    ///
    /// Text between elements is skipped.
    pub fn next_event(&mut self) -> Result<XmlEvent> {
        self.advance(false)
    }

    /// Like [`next_event`](Self::next_event) but fails on non-whitespace text.
    pub fn next_tag(&mut self) -> Result<XmlEvent> {
        self.advance(true)
    }

    fn advance(&mut self, strict: bool) -> Result<XmlEvent> {
        if self.event == XmlEvent::End {
            self.scopes.pop();
            self.depth -= 1;
        }
        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf)?;
            match event {
                Event::Start(start) => {
                    let start = start.into_owned();
                    self.open(&start)?;
                    return Ok(self.event);
                }
                Event::End(end) => {
                    let (prefix, local) = split_qname(end.name().as_ref());
                    self.namespace = self.lookup(&prefix).unwrap_or_default();
                    self.local = local;
                    self.attributes.clear();
                    self.event = XmlEvent::End;
                    return Ok(self.event);
                }
                Event::Eof => {
                    self.event = XmlEvent::Eof;
                    self.local.clear();
                    self.namespace.clear();
                    self.attributes.clear();
                    return Ok(self.event);
                }
                Event::Text(text) if strict => {
                    let text = text.unescape()?;
                    if !text.trim().is_empty() {
                        return Err(GmlError::format(
                            self.local.clone(),
                            format!("unexpected text content '{}'", text.trim()),
                        ));
                    }
                }
                Event::CData(data) if strict => {
                    if !String::from_utf8_lossy(&data).trim().is_empty() {
                        return Err(GmlError::format(self.local.clone(), "unexpected CDATA content"));
                    }
                }
                _ => {}
            }
        }
    }

    /// Reads the text content of the current element.
    ///
    /// Precondition: cursor on a start tag. Postcondition: cursor on the
    /// matching end tag. Child elements are an error.
    pub fn element_text(&mut self) -> Result<String> {
        self.expect_start()?;
        let element = self.local.clone();
        let mut content = String::new();
        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf)?;
            match event {
                Event::Text(text) => {
                    if !content.is_empty() {
                        content.push(' ');
                    }
                    content.push_str(&text.unescape()?);
                }
                Event::CData(data) => {
                    content.push_str(&String::from_utf8_lossy(&data));
                }
                Event::Start(_) => {
                    return Err(GmlError::format(element, "expected text content, found a child element"));
                }
                Event::End(_) => {
                    self.event = XmlEvent::End;
                    self.attributes.clear();
                    return Ok(content);
                }
                Event::Eof => {
                    return Err(GmlError::format(element, "unexpected end of document"));
                }
                _ => {}
            }
        }
    }

    pub fn element_text_as_f64(&mut self) -> Result<f64> {
        let element = self.local.clone();
        let text = self.element_text()?;
        parse_f64(&element, text.trim())
    }

    pub fn element_text_as_usize(&mut self) -> Result<usize> {
        let element = self.local.clone();
        let text = self.element_text()?;
        text.trim()
            .parse::<usize>()
            .map_err(|_| GmlError::format(element, format!("'{}' is not a non-negative integer", text.trim())))
    }

    pub fn element_text_as_u32(&mut self) -> Result<u32> {
        let element = self.local.clone();
        let text = self.element_text()?;
        text.trim().parse::<u32>().map_err(|_| {
            GmlError::format(
                element,
                format!("'{}' is not a non-negative integer of at most {}", text.trim(), u32::MAX),
            )
        })
    }

    /// Skips the current element and all of its content.
    pub fn skip_element(&mut self) -> Result<()> {
        self.expect_start()?;
        let target = self.depth;
        loop {
            match self.next_event()? {
                XmlEvent::End if self.depth == target => return Ok(()),
                XmlEvent::Eof => {
                    return Err(GmlError::format(self.local.clone(), "unexpected end of document"));
                }
                _ => {}
            }
        }
    }

    pub fn expect_start(&self) -> Result<()> {
        if self.event != XmlEvent::Start {
            return Err(GmlError::format(
                self.local.clone(),
                format!("expected a start tag, cursor is at {:?}", self.event),
            ));
        }
        Ok(())
    }

    pub fn require_start(&self, namespace: &str, local: &str) -> Result<()> {
        if self.event != XmlEvent::Start || !self.is_element(namespace, local) {
            return Err(GmlError::format(
                self.local.clone(),
                format!("expected start of <{}> ({})", local, self.describe()),
            ));
        }
        Ok(())
    }

    pub fn require_end(&self, namespace: &str, local: &str) -> Result<()> {
        if self.event != XmlEvent::End || !self.is_element(namespace, local) {
            return Err(GmlError::format(
                self.local.clone(),
                format!("expected end of <{}> ({})", local, self.describe()),
            ));
        }
        Ok(())
    }

    /// Advances with [`next_tag`](Self::next_tag) and asserts the start of the given element.
    pub fn next_start(&mut self, namespace: &str, local: &str) -> Result<()> {
        self.next_tag()?;
        self.require_start(namespace, local)
    }

    /// Human-readable position for error messages.
    pub fn describe(&self) -> String {
        match self.event {
            XmlEvent::Start => format!("found <{}>", self.local),
            XmlEvent::End => format!("found </{}>", self.local),
            XmlEvent::Eof => "found end of document".to_string(),
            XmlEvent::Initial => "at start of document".to_string(),
        }
    }

    fn open(&mut self, start: &BytesStart<'_>) -> Result<()> {
        let mut declarations = Vec::new();
        let mut raw = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value()?.to_string();
            if key == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), value));
            } else {
                raw.push((key, value));
            }
        }
        self.scopes.push(declarations);
        self.depth += 1;

        let name = start.name();
        let (prefix, local) = split_qname(name.as_ref());
        self.namespace = self.lookup(&prefix).unwrap_or_default();
        self.local = local;

        self.attributes.clear();
        for (key, value) in raw {
            let (prefix, local) = split_qname(key.as_bytes());
            // unprefixed attributes are in no namespace
            let namespace = if prefix.is_empty() {
                String::new()
            } else {
                self.lookup(&prefix).unwrap_or_default()
            };
            self.attributes.push(Attribute {
                namespace,
                local,
                value,
            });
        }
        self.event = XmlEvent::Start;
        Ok(())
    }

    fn lookup(&self, prefix: &str) -> Option<String> {
        if prefix == "xml" {
            return Some("http://www.w3.org/XML/1998/namespace".to_string());
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
    }
}

fn split_qname(name: &[u8]) -> (String, String) {
    let name = String::from_utf8_lossy(name);
    match name.split_once(':') {
        Some((prefix, local)) => (prefix.to_string(), local.to_string()),
        None => (String::new(), name.to_string()),
    }
}

pub(crate) fn parse_f64(element: &str, token: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|_| GmlError::format(element, format!("'{}' is not a number", token)))
}
