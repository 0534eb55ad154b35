#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

//! # OME Metadata Tools
//!
//! Helpers for OME image metadata: canonical object identifiers, dimension
//! order completion, schema version detection, and a channel consistency
//! validator that can repair inconsistent images in place.
//!
//! ## Features
//!
//! - **Identifiers**: `Image:0`, `Channel:0:2` style ids from a kind and indices
//! - **Dimension orders**: partial axis orders such as `"XYC"` completed to `XYCZT`
//! - **Schema versions**: detected from the root namespace or `schemaLocation`
//! - **Validation**: `SizeC` and per-channel `SamplesPerPixel` checked for agreement
//! - **Correction**: missing channels, unspecified samples and wrong `SizeC` repaired
//! - **CLI Integration**: `ome-validate` binary (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use ome_metatools::{validate_image, MetadataModel, ValidationOutcome};
//!
//! # fn example() -> ome_metatools::Result<()> {
//! let xml = r#"<OME xmlns="http://www.openmicroscopy.org/Schemas/OME/2016-06">
//!   <Image ID="Image:0">
//!     <Pixels ID="Pixels:0" SizeC="7" DimensionOrder="XYZCT">
//!       <Channel ID="Channel:0:0" SamplesPerPixel="3"/>
//!     </Pixels>
//!   </Image>
//! </OME>"#;
//!
//! let mut model = MetadataModel::from_xml_str(xml)?;
//! assert_eq!(model.schema_version.as_deref(), Some("2016-06"));
//!
//! let outcome = validate_image(&mut model, 0, true)?;
//! assert!(matches!(outcome, ValidationOutcome::Corrected(_)));
//! assert_eq!(model.images[0].pixels.size_c, 3);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Library vs CLI Usage
//!
//! ### Feature Flags
//!
//! - `cli` (default): `ome-validate` command-line interface and tracing setup
//! - `tracing-json`: JSON log output for the CLI
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! ome-metatools = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dimension_order;
pub mod document;
pub mod error;
pub mod identifier;
pub mod loader;
pub mod model;
pub mod tracing_config;
pub mod utils;
pub mod validation;
pub mod version;

// Public API exports
pub use config::{ValidationConfig, ValidationConfigBuilder};
pub use dimension_order::{create_dimension_order, DimensionOrder};
pub use document::{Element, OmeDocument};
pub use error::{MetadataError, Result};
pub use identifier::create_id;
pub use model::{
    Channel, ChannelMetadata, Image, MetadataModel, Pixels, DEFAULT_SAMPLES_PER_PIXEL,
};
pub use utils::{NumericValidator, MAX_SIZE_C};
pub use validation::{
    check_image, classify_image, validate_image, validate_model, ConsistencyValidator,
    Correction, ImageReport, ImageState, Inconsistency, ModelValidationReport,
    UncorrectableReason, ValidationOutcome,
};
pub use version::{
    get_model_version, model_version, model_version_from_document, model_version_from_str,
    VersionSource, LEGACY_MODEL_VERSION, MODEL_VERSION,
};

#[cfg(feature = "cli")]
pub use tracing_config::init_cli_tracing;
pub use tracing_config::{events, spans, TracingConfig, TracingFormat};

/// Load an OME-XML file and validate every image in it
///
/// Convenience wrapper around [`MetadataModel::from_path`] and
/// [`validate_model`]. With `config.correct` the returned model is the
/// repaired one.
///
/// ```rust,no_run
/// use ome_metatools::{validate_file, ValidationConfig};
///
/// # fn example() -> ome_metatools::Result<()> {
/// let (model, report) = validate_file("sample.ome.xml", &ValidationConfig::correcting())?;
/// println!("{} image(s), valid: {}", model.images.len(), report.is_valid());
/// # Ok(())
/// # }
/// ```
pub fn validate_file<P: AsRef<std::path::Path>>(
    path: P,
    config: &ValidationConfig,
) -> Result<(MetadataModel, ModelValidationReport)> {
    let mut model = MetadataModel::from_path(path)?;
    let report = validate_model(&mut model, config)?;
    Ok((model, report))
}
