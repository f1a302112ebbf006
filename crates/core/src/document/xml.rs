//! Thin streaming XML writer shared by the FA(3) and JPK_FA generators

use std::borrow::Cow;
use std::fmt::Display;

use ksef_domain::{KsefError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Escape the five XML-reserved characters (`& < > " '`).
pub fn escape_text(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Indented UTF-8 document under construction.
pub(crate) struct XmlDocument {
    writer: Writer<Vec<u8>>,
}

impl XmlDocument {
    /// Start a document with the `<?xml version="1.0" encoding="UTF-8"?>`
    /// declaration.
    pub(crate) fn new() -> Result<Self> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        Ok(Self { writer })
    }

    pub(crate) fn open(&mut self, name: &str) -> Result<()> {
        self.open_with(name, &[])
    }

    /// Open an element with attributes; attribute values are escaped.
    pub(crate) fn open_with(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Start(start)).map_err(write_error)
    }

    pub(crate) fn close(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name))).map_err(write_error)
    }

    /// `<name>text</name>` with the text escaped.
    pub(crate) fn text(&mut self, name: &str, value: &str) -> Result<()> {
        self.text_with(name, &[], value)
    }

    /// Same as [`Self::text`] for values that implement `Display` (dates,
    /// amounts, counters).
    pub(crate) fn value(&mut self, name: &str, value: impl Display) -> Result<()> {
        self.text(name, &value.to_string())
    }

    pub(crate) fn text_with(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        value: &str,
    ) -> Result<()> {
        self.open_with(name, attributes)?;
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(escape_text(value))))
            .map_err(write_error)?;
        self.close(name)
    }

    pub(crate) fn finish(self) -> Result<String> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes)
            .map_err(|err| KsefError::Internal(format!("generated XML is not UTF-8: {err}")))
    }
}

fn write_error(err: impl Display) -> KsefError {
    KsefError::Internal(format!("failed to write XML: {err}"))
}
