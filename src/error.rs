//! Error types for metadata validation operations

use thiserror::Error;

/// Result type alias for metadata operations
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Error types raised by the metadata tools
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The axis-order string violates the required `X`, `Y` prefix
    #[error("Invalid dimension order specification: {0}")]
    InvalidOrderSpecification(String),

    /// No schema version marker was found where one was required
    #[error("Unrecognized model version: {0}")]
    UnrecognizedVersionToken(String),

    /// Correction was requested but no repair path exists
    #[error("Uncorrectable metadata for image {image}: {reason}")]
    UncorrectableMetadataState {
        /// Index of the offending image
        image: usize,
        /// Human readable description of the broken state
        reason: String,
    },

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML tokenizer errors
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Document is well-formed XML but lacks required structure
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Image index does not address an image of the model
    #[error("Image index {index} out of range (model has {count} images)")]
    ImageIndexOutOfRange { index: usize, count: usize },

    /// Channel index does not address a channel of the image
    #[error("Channel index {channel} out of range for image {image} ({count} channels)")]
    ChannelIndexOutOfRange {
        image: usize,
        channel: usize,
        count: usize,
    },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be deserialized
    #[error("Configuration parse error: {0}")]
    Config(#[from] toml::de::Error),
}

impl MetadataError {
    /// Create a new invalid order specification error
    pub fn invalid_order<S: Into<String>>(msg: S) -> Self {
        Self::InvalidOrderSpecification(msg.into())
    }

    /// Create a new unrecognized version error
    pub fn unrecognized_version<S: Into<String>>(msg: S) -> Self {
        Self::UnrecognizedVersionToken(msg.into())
    }

    /// Create a new uncorrectable state error for an image
    pub fn uncorrectable<S: Into<String>>(image: usize, reason: S) -> Self {
        Self::UncorrectableMetadataState {
            image,
            reason: reason.into(),
        }
    }

    /// Create a new malformed document error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedDocument(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a malformed document error naming the offending element and attribute
    pub fn attribute_error(element: &str, attribute: &str, details: &str) -> Self {
        Self::MalformedDocument(format!(
            "{} attribute '{}': {}",
            element, attribute, details
        ))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Whether this error marks an image that cannot be repaired
    #[must_use]
    pub fn is_uncorrectable(&self) -> bool {
        matches!(self, Self::UncorrectableMetadataState { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = MetadataError::invalid_order("CXY");
        assert!(matches!(err, MetadataError::InvalidOrderSpecification(_)));

        let err = MetadataError::unrecognized_version("no namespace");
        assert!(matches!(err, MetadataError::UnrecognizedVersionToken(_)));

        let err = MetadataError::uncorrectable(3, "no channels");
        assert!(err.is_uncorrectable());
        assert!(!MetadataError::malformed("x").is_uncorrectable());
    }

    #[test]
    fn test_error_display() {
        let err = MetadataError::uncorrectable(2, "SizeC is 0 and no channels are present");
        assert_eq!(
            err.to_string(),
            "Uncorrectable metadata for image 2: SizeC is 0 and no channels are present"
        );

        let err = MetadataError::ImageIndexOutOfRange { index: 4, count: 1 };
        assert_eq!(err.to_string(), "Image index 4 out of range (model has 1 images)");
    }

    #[test]
    fn test_contextual_errors() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = MetadataError::file_io_error("read", Path::new("/data/sample.ome.xml"), io_error);
        let error_string = err.to_string();
        assert!(error_string.contains("read"));
        assert!(error_string.contains("/data/sample.ome.xml"));

        let err = MetadataError::attribute_error("Pixels", "SizeC", "expected an integer");
        let error_string = err.to_string();
        assert!(error_string.contains("Pixels"));
        assert!(error_string.contains("SizeC"));
    }
}
