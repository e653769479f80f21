use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::core::{VfdError, round_money};

pub(crate) fn xml_io(e: std::io::Error) -> VfdError {
    VfdError::Serialization(format!("XML write error: {e}"))
}

/// In-memory XML element. Leaf elements carry text, inner elements carry children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Leaf element with text content.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// First direct child with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Render without indentation and without an XML declaration.
    pub fn to_bytes(&self) -> Result<Vec<u8>, VfdError> {
        let mut writer = XmlWriter::new();
        writer.write_tree(self)?;
        Ok(writer.into_inner())
    }
}

/// Compact writer: no indentation, no declaration, `<A></A>` for empty leaves.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, VfdError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, VfdError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, VfdError> {
        check_xml_chars(name, text)?;
        self.start_element(name)?;
        if !text.is_empty() {
            self.writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_io)?;
        }
        self.end_element(name)
    }

    /// Pass an event through unchanged.
    pub fn write_event(&mut self, event: Event<'_>) -> Result<&mut Self, VfdError> {
        self.writer.write_event(event).map_err(xml_io)?;
        Ok(self)
    }

    pub fn write_tree(&mut self, element: &Element) -> Result<&mut Self, VfdError> {
        if element.children.is_empty() {
            return self.text_element(&element.name, &element.text);
        }
        self.start_element(&element.name)?;
        for child in &element.children {
            self.write_tree(child)?;
        }
        self.end_element(&element.name)
    }
}

/// Characters allowed by the XML 1.0 `Char` production.
pub fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Reject text that cannot be represented in XML 1.0.
pub fn check_xml_chars(element: &str, text: &str) -> Result<(), VfdError> {
    match text.chars().find(|c| !is_xml_char(*c)) {
        Some(c) => Err(VfdError::Serialization(format!(
            "element <{element}> contains character U+{:04X} which is not allowed in XML",
            c as u32
        ))),
        None => Ok(()),
    }
}

/// Monetary value with exactly two decimals (`5000.00`).
pub fn format_amount(d: Decimal) -> String {
    round_money(d).to_string()
}

/// Quantity without trailing zeros (`5`, `2.5`).
pub fn format_quantity(d: Decimal) -> String {
    d.normalize().to_string()
}
