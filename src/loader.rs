//! Building the metadata model from an OME-XML document
//!
//! Only `Image` → `Pixels` → `Channel` and the attributes the validator
//! uses are read; everything else in the document is ignored.

use crate::dimension_order::create_dimension_order;
use crate::document::{Element, OmeDocument};
use crate::error::{MetadataError, Result};
use crate::identifier::create_id;
use crate::model::{Channel, Image, MetadataModel, Pixels};
use crate::utils::NumericValidator;
use crate::version::get_model_version;
use std::path::Path;

impl MetadataModel {
    /// Build a model from a parsed document
    pub fn from_document(doc: &OmeDocument) -> Result<Self> {
        let schema_version = match get_model_version(doc) {
            Ok(version) => Some(version),
            Err(e) => {
                tracing::debug!(error = %e, "Document declares no schema version");
                None
            },
        };

        let images = doc
            .root()
            .children_named("Image")
            .enumerate()
            .map(|(index, element)| read_image(index, element))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            image_count = images.len(),
            schema_version = schema_version.as_deref().unwrap_or("unknown"),
            "Loaded metadata model"
        );

        Ok(Self {
            schema_version,
            images,
        })
    }

    /// Parse XML text and build a model from it
    pub fn from_xml_str(xml: &str) -> Result<Self> {
        Self::from_document(&OmeDocument::parse(xml)?)
    }

    /// Read an OME-XML file and build a model from it
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_document(&OmeDocument::from_path(path)?)
    }
}

fn read_image(index: usize, element: &Element) -> Result<Image> {
    let pixels_element = element.child("Pixels").ok_or_else(|| {
        MetadataError::malformed(format!("Image #{} has no Pixels element", index))
    })?;

    Ok(Image {
        id: id_or_default(element, "Image", &[index]),
        name: element.attribute("Name").map(str::to_string),
        pixels: read_pixels(index, pixels_element)?,
    })
}

fn read_pixels(image: usize, element: &Element) -> Result<Pixels> {
    let size_c = element
        .attribute("SizeC")
        .ok_or_else(|| MetadataError::attribute_error("Pixels", "SizeC", "missing"))?;
    // Stored as declared, so that a zero extent reaches the validator.
    let size_c = NumericValidator::parse_non_negative_integer("Pixels", "SizeC", size_c)
        .and_then(NumericValidator::validate_size_c)?;

    let dimension_order = create_dimension_order(element.attribute("DimensionOrder").unwrap_or(""))?;

    let channels = element
        .children_named("Channel")
        .enumerate()
        .map(|(c, channel)| read_channel(image, c, channel))
        .collect::<Result<Vec<_>>>()?;

    Ok(Pixels {
        id: id_or_default(element, "Pixels", &[image]),
        size_c,
        dimension_order,
        channels,
    })
}

fn read_channel(image: usize, channel: usize, element: &Element) -> Result<Channel> {
    let samples_per_pixel = element
        .attribute("SamplesPerPixel")
        .map(|value| NumericValidator::parse_positive_integer("Channel", "SamplesPerPixel", value))
        .transpose()?;

    Ok(Channel {
        id: id_or_default(element, "Channel", &[image, channel]),
        samples_per_pixel,
    })
}

fn id_or_default(element: &Element, kind: &str, indices: &[usize]) -> String {
    element
        .attribute("ID")
        .map_or_else(|| create_id(kind, indices), str::to_string)
}
