//! Schema version detection
//!
//! OME-XML documents declare their schema revision through the namespace of
//! the root element, e.g. `http://www.openmicroscopy.org/Schemas/OME/2013-06`.

use crate::document::{Element, OmeDocument};
use crate::error::{MetadataError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Schema version this crate's model targets
pub const MODEL_VERSION: &str = "2016-06";

/// Token reported for documents in the original 2003 schema
pub const LEGACY_MODEL_VERSION: &str = "2003-FC";

static SCHEMA_VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"openmicroscopy\.org/Schemas/[A-Za-z]+/(\d{4}-\d{2})(?:/|\s|$)").unwrap()
});

static LEGACY_SCHEMA_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"openmicroscopy\.org/XMLschemas/OME/FC/ome\.xsd").unwrap());

/// Something a schema version can be read from
pub trait VersionSource {
    /// Root element to inspect
    fn version_root(&self) -> Result<Element>;
}

impl VersionSource for str {
    fn version_root(&self) -> Result<Element> {
        OmeDocument::parse_root(self)
    }
}

impl VersionSource for String {
    fn version_root(&self) -> Result<Element> {
        self.as_str().version_root()
    }
}

impl VersionSource for OmeDocument {
    fn version_root(&self) -> Result<Element> {
        let root = self.root();
        // Only the root's own attributes are inspected; drop the subtree.
        let mut shallow = Element::new(root.name());
        for (key, value) in root.attributes() {
            shallow = shallow.with_attribute(key, value);
        }
        Ok(shallow)
    }
}

/// Built-in target schema version, independent of any document
#[must_use]
pub fn model_version() -> &'static str {
    MODEL_VERSION
}

/// Schema version declared by a document or raw XML text
pub fn get_model_version<S: VersionSource + ?Sized>(source: &S) -> Result<String> {
    let root = source.version_root()?;
    version_from_root(&root)
}

/// Schema version declared by raw XML text
pub fn model_version_from_str(xml: &str) -> Result<String> {
    get_model_version(xml)
}

/// Schema version declared by a parsed document
pub fn model_version_from_document(doc: &OmeDocument) -> Result<String> {
    get_model_version(doc)
}

fn version_from_root(root: &Element) -> Result<String> {
    let candidates = root
        .namespace()
        .into_iter()
        .chain(root.attribute_local("schemaLocation"));

    for candidate in candidates {
        if let Some(captures) = SCHEMA_VERSION_REGEX.captures(candidate) {
            if let Some(token) = captures.get(1) {
                tracing::debug!(version = %token.as_str(), "Detected model version");
                return Ok(token.as_str().to_string());
            }
        }
        if LEGACY_SCHEMA_REGEX.is_match(candidate) {
            return Ok(LEGACY_MODEL_VERSION.to_string());
        }
    }

    Err(MetadataError::unrecognized_version(format!(
        "no OME schema version declared on root element <{}>",
        root.name()
    )))
}
