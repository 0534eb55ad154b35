//! Minimal structured view of an OME-XML document
//!
//! Keeps element names, attributes and nesting; text content, comments and
//! processing instructions are dropped. This is all the loader and the
//! version detector need.

use crate::error::{MetadataError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::path::Path;

/// An XML element with its attributes and child elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    /// Create an element with no attributes or children
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute (builder style)
    #[must_use]
    pub fn with_attribute<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Qualified name, including any namespace prefix
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Namespace prefix, if the name is qualified
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Value of the attribute with the given qualified name
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first attribute whose local name matches
    #[must_use]
    pub fn attribute_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.rsplit(':').next() == Some(local) && !k.starts_with("xmlns"))
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Child elements in document order
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Child elements with the given local name
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.local_name() == local)
    }

    /// First child element with the given local name
    #[must_use]
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local_name() == local)
    }

    /// Namespace URI bound to this element's prefix, as declared on the
    /// element itself
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        match self.prefix() {
            Some(prefix) => self.attribute(&format!("xmlns:{prefix}")),
            None => self.attribute("xmlns"),
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut element = Self::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }
}

/// A parsed document: a single root element tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OmeDocument {
    root: Element,
}

impl OmeDocument {
    /// Wrap an already built element tree
    #[must_use]
    pub fn from_root(root: Element) -> Self {
        Self { root }
    }

    /// Parse a complete document from XML text
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    if root.is_some() {
                        return Err(MetadataError::malformed("content after root element"));
                    }
                    stack.push(Element::from_start(&start)?);
                },
                Event::Empty(start) => {
                    let element = Element::from_start(&start)?;
                    Self::attach(&mut stack, &mut root, element)?;
                },
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| MetadataError::malformed("unbalanced end tag"))?;
                    Self::attach(&mut stack, &mut root, element)?;
                },
                Event::Eof => break,
                _ => {},
            }
        }

        if !stack.is_empty() {
            return Err(MetadataError::malformed(format!(
                "unexpected end of document inside <{}>",
                stack.last().map_or("", Element::name)
            )));
        }

        root.map(Self::from_root)
            .ok_or_else(|| MetadataError::malformed("document has no root element"))
    }

    /// Read and parse a document from a file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let _span = crate::tracing_config::spans::document_load(path).entered();
        let xml = std::fs::read_to_string(path)
            .map_err(|e| MetadataError::file_io_error("read", path, e))?;
        Self::parse(&xml)
    }

    /// Parse only the root element's start tag, without its children.
    ///
    /// Stops reading as soon as the root is seen, so the rest of the text
    /// need not be well formed.
    pub fn parse_root(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event()? {
                Event::Start(start) | Event::Empty(start) => return Element::from_start(&start),
                Event::Eof => return Err(MetadataError::malformed("document has no root element")),
                _ => {},
            }
        }
    }

    /// Root element
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(element);
            Ok(())
        } else if root.is_none() {
            *root = Some(element);
            Ok(())
        } else {
            Err(MetadataError::malformed("multiple root elements"))
        }
    }
}
