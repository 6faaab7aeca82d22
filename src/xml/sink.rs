//! Streaming XML writer used by the geometry writers.

use std::io::{self, Write};

struct OpenElement {
    name: String,
    has_children: bool,
}

/// Writes elements as they are opened, tracking the start tag that is still
/// accepting attributes so childless elements collapse to `<x/>`.
pub struct XmlSink<W: Write> {
    writer: W,
    stack: Vec<OpenElement>,
    tag_open: bool,
    indent: bool,
}

impl<W: Write> XmlSink<W> {
    pub fn new(writer: W) -> Self {
        XmlSink {
            writer,
            stack: Vec::new(),
            tag_open: false,
            indent: false,
        }
    }

    /// Puts every element on its own line, two spaces per level.
    pub fn indented(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn start_element(&mut self, name: &str) -> io::Result<()> {
        self.close_start_tag()?;
        if let Some(parent) = self.stack.last_mut() {
            parent.has_children = true;
        }
        if self.indent && !self.stack.is_empty() {
            self.writer.write_all(b"\n")?;
            write_indent(&mut self.writer, self.stack.len())?;
        }
        self.writer.write_all(b"<")?;
        self.writer.write_all(name.as_bytes())?;
        self.stack.push(OpenElement {
            name: name.to_string(),
            has_children: false,
        });
        self.tag_open = true;
        Ok(())
    }

    pub fn attribute(&mut self, name: &str, value: &str) -> io::Result<()> {
        if !self.tag_open {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("attribute '{}' written outside of a start tag", name),
            ));
        }
        self.writer.write_all(b" ")?;
        self.writer.write_all(name.as_bytes())?;
        self.writer.write_all(b"=\"")?;
        write_escaped_attr(&mut self.writer, value)?;
        self.writer.write_all(b"\"")
    }

    pub fn text(&mut self, text: &str) -> io::Result<()> {
        self.close_start_tag()?;
        write_escaped_text(&mut self.writer, text)
    }

    pub fn end_element(&mut self) -> io::Result<()> {
        let Some(element) = self.stack.pop() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "no open element to close"));
        };
        if self.tag_open {
            self.tag_open = false;
            return self.writer.write_all(b"/>");
        }
        if self.indent && element.has_children {
            self.writer.write_all(b"\n")?;
            write_indent(&mut self.writer, self.stack.len())?;
        }
        self.writer.write_all(b"</")?;
        self.writer.write_all(element.name.as_bytes())?;
        self.writer.write_all(b">")
    }

    /// `<name>text</name>`
    pub fn text_element(&mut self, name: &str, text: &str) -> io::Result<()> {
        self.start_element(name)?;
        self.text(text)?;
        self.end_element()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn close_start_tag(&mut self) -> io::Result<()> {
        if self.tag_open {
            self.tag_open = false;
            self.writer.write_all(b">")?;
        }
        Ok(())
    }
}

fn write_indent<W: Write>(writer: &mut W, indent_level: usize) -> io::Result<()> {
    for _ in 0..indent_level {
        writer.write_all(b"  ")?;
    }
    Ok(())
}

fn write_escaped(writer: &mut impl Write, input: &str, quotes: bool) -> io::Result<()> {
    let mut last = 0;
    for (idx, ch) in input.char_indices() {
        let entity: Option<&[u8]> = match ch {
            '&' => Some(b"&amp;"),
            '<' => Some(b"&lt;"),
            '>' => Some(b"&gt;"),
            '"' if quotes => Some(b"&quot;"),
            '\'' if quotes => Some(b"&apos;"),
            _ => None,
        };

        if let Some(bytes) = entity {
            if last < idx {
                writer.write_all(input[last..idx].as_bytes())?;
            }
            writer.write_all(bytes)?;
            last = idx + ch.len_utf8();
        }
    }

    if last < input.len() {
        writer.write_all(input[last..].as_bytes())?;
    }
    Ok(())
}

fn write_escaped_attr<W: Write>(writer: &mut W, input: &str) -> io::Result<()> {
    write_escaped(writer, input, true)
}

fn write_escaped_text<W: Write>(writer: &mut W, input: &str) -> io::Result<()> {
    write_escaped(writer, input, false)
}
