//! Thin layer over `quick_xml::Writer` that knows about the `xm` prefix,
//! CDATA splitting and diagnostic comments.

use std::io::Write;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{NAMESPACE, PREFIX, SCHEMA_LOCATION, XSI_NAMESPACE};
use crate::encoding::xmlchars;
use crate::error::{ConvertError, Result};
use crate::report::Diagnostic;

fn qualified(local: &str) -> String {
    format!("{PREFIX}:{local}")
}

fn tag(local: &str, attributes: &[(&str, &str)]) -> BytesStart<'static> {
    let mut start = BytesStart::new(qualified(local));
    for (key, value) in attributes {
        start.push_attribute((*key, xmlchars::sanitize(value).as_ref()));
    }
    start
}

pub struct EaxsWriter<W: Write> {
    inner: Writer<W>,
}

impl<W: Write> EaxsWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Writer::new_with_indent(inner, b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.inner.write_event(event).map_err(ConvertError::xml)
    }

    pub fn declaration(&mut self) -> Result<()> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
    }

    /// `<?name value?>`
    pub fn processing_instruction(&mut self, name: &str, value: &str) -> Result<()> {
        let content = format!("{name} {}", xmlchars::sanitize(value).replace("?>", "? >"));
        self.event(Event::PI(BytesPI::new(content)))
    }

    /// Root element carrying the namespace and schema location declarations.
    pub fn start_root(&mut self, local: &str) -> Result<()> {
        let schema_location = format!("{NAMESPACE} {SCHEMA_LOCATION}");
        let xmlns = format!("xmlns:{PREFIX}");
        let start = BytesStart::new(qualified(local)).with_attributes([
            (xmlns.as_str(), NAMESPACE),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", schema_location.as_str()),
        ]);
        self.event(Event::Start(start))
    }

    pub fn start(&mut self, local: &str) -> Result<()> {
        self.event(Event::Start(BytesStart::new(qualified(local))))
    }

    pub fn start_with(&mut self, local: &str, attributes: &[(&str, &str)]) -> Result<()> {
        self.event(Event::Start(tag(local, attributes)))
    }

    pub fn end(&mut self, local: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(qualified(local))))
    }

    /// Element with no content and optional attributes.
    pub fn empty(&mut self, local: &str, attributes: &[(&str, &str)]) -> Result<()> {
        self.event(Event::Empty(tag(local, attributes)))
    }

    /// Simple text element. Characters not allowed in XML become U+FFFD.
    pub fn element(&mut self, local: &str, text: &str) -> Result<()> {
        self.start(local)?;
        self.event(Event::Text(BytesText::new(&xmlchars::sanitize(text))))?;
        self.end(local)
    }

    pub fn optional(&mut self, local: &str, text: Option<&str>) -> Result<()> {
        match text {
            Some(text) => self.element(local, text),
            None => Ok(()),
        }
    }

    /// Text element written as one or more adjacent CDATA sections, so the
    /// payload is reproduced byte for byte.
    pub fn cdata_element(&mut self, local: &str, text: &str) -> Result<()> {
        self.start(local)?;
        let text = xmlchars::sanitize(text);
        for chunk in xmlchars::cdata_chunks(&text) {
            self.event(Event::CData(BytesCData::new(chunk)))?;
        }
        self.end(local)
    }

    /// `<!--SEVERITY: message-->`
    pub fn comment(&mut self, diagnostic: &Diagnostic) -> Result<()> {
        let text = xmlchars::sanitize_comment(&diagnostic.to_string());
        self.event(Event::Comment(BytesText::from_escaped(text)))
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}
