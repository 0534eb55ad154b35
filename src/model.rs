//! Image metadata model
//!
//! The model is an arena of plain records: images are addressed by their
//! insertion index, channels by their index within the image's pixels. Only
//! the fields the consistency validator needs are represented.

use crate::dimension_order::DimensionOrder;
use crate::error::{MetadataError, Result};
use crate::identifier::create_id;
use serde::{Deserialize, Serialize};

/// Samples per pixel given to channels created without an explicit value
pub const DEFAULT_SAMPLES_PER_PIXEL: u32 = 1;

/// A single channel of an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Object identifier, e.g. `Channel:0:1`
    pub id: String,
    /// Samples per pixel; `None` when the document leaves it unspecified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples_per_pixel: Option<u32>,
}

impl Channel {
    /// Create a channel with unspecified samples per pixel
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            samples_per_pixel: None,
        }
    }

    /// Create a channel with the given samples per pixel
    pub fn with_samples<S: Into<String>>(id: S, samples: u32) -> Self {
        Self {
            id: id.into(),
            samples_per_pixel: Some(samples),
        }
    }
}

/// Pixel block of an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixels {
    /// Object identifier, e.g. `Pixels:0`
    pub id: String,
    /// Declared total extent of the channel axis
    pub size_c: u32,
    /// Axis traversal order
    #[serde(default)]
    pub dimension_order: DimensionOrder,
    /// Channels in document order
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// An image and its pixels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Object identifier, e.g. `Image:0`
    pub id: String,
    /// Optional human readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub pixels: Pixels,
}

/// Root of the metadata model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataModel {
    /// Schema version of the source document, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl MetadataModel {
    /// Create an empty model
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image with the given `SizeC` and channel samples, assigning
    /// canonical identifiers. Returns the new image index.
    pub fn push_image(&mut self, size_c: u32, samples: &[Option<u32>]) -> usize {
        let index = self.images.len();
        let channels = samples
            .iter()
            .enumerate()
            .map(|(c, &samples_per_pixel)| Channel {
                id: create_id("Channel", &[index, c]),
                samples_per_pixel,
            })
            .collect();
        self.images.push(Image {
            id: create_id("Image", &[index]),
            name: None,
            pixels: Pixels {
                id: create_id("Pixels", &[index]),
                size_c,
                dimension_order: DimensionOrder::default(),
                channels,
            },
        });
        index
    }

    /// Image at `index`
    #[must_use]
    pub fn image(&self, index: usize) -> Option<&Image> {
        self.images.get(index)
    }

    fn pixels(&self, image: usize) -> Result<&Pixels> {
        self.images
            .get(image)
            .map(|i| &i.pixels)
            .ok_or(MetadataError::ImageIndexOutOfRange {
                index: image,
                count: self.images.len(),
            })
    }

    fn pixels_mut(&mut self, image: usize) -> Result<&mut Pixels> {
        let count = self.images.len();
        self.images
            .get_mut(image)
            .map(|i| &mut i.pixels)
            .ok_or(MetadataError::ImageIndexOutOfRange {
                index: image,
                count,
            })
    }
}

/// Narrow accessor surface the consistency validator works through.
///
/// Getters return `None` for an index that does not exist; mutators report
/// it as an error.
pub trait ChannelMetadata {
    /// Number of images in the model
    fn image_count(&self) -> usize;

    /// Declared `SizeC` of an image
    fn pixels_size_c(&self, image: usize) -> Option<u32>;

    /// Overwrite the declared `SizeC` of an image
    fn set_pixels_size_c(&mut self, image: usize, size_c: u32) -> Result<()>;

    /// Number of channels present for an image
    fn channel_count(&self, image: usize) -> Option<usize>;

    /// Append a channel with [`DEFAULT_SAMPLES_PER_PIXEL`]; returns its index
    fn add_channel(&mut self, image: usize) -> Result<usize>;

    /// Remove the last channel of an image
    fn remove_last_channel(&mut self, image: usize) -> Result<()>;

    /// Samples per pixel of a channel. The outer `None` means the channel
    /// does not exist, the inner one that the value is unspecified.
    fn channel_samples_per_pixel(&self, image: usize, channel: usize) -> Option<Option<u32>>;

    /// Set the samples per pixel of a channel
    fn set_channel_samples_per_pixel(
        &mut self,
        image: usize,
        channel: usize,
        samples: u32,
    ) -> Result<()>;
}

impl ChannelMetadata for MetadataModel {
    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn pixels_size_c(&self, image: usize) -> Option<u32> {
        self.images.get(image).map(|i| i.pixels.size_c)
    }

    fn set_pixels_size_c(&mut self, image: usize, size_c: u32) -> Result<()> {
        self.pixels_mut(image)?.size_c = size_c;
        Ok(())
    }

    fn channel_count(&self, image: usize) -> Option<usize> {
        self.images.get(image).map(|i| i.pixels.channels.len())
    }

    fn add_channel(&mut self, image: usize) -> Result<usize> {
        let pixels = self.pixels_mut(image)?;
        let channel = pixels.channels.len();
        pixels.channels.push(Channel::with_samples(
            create_id("Channel", &[image, channel]),
            DEFAULT_SAMPLES_PER_PIXEL,
        ));
        Ok(channel)
    }

    fn remove_last_channel(&mut self, image: usize) -> Result<()> {
        let pixels = self.pixels_mut(image)?;
        if pixels.channels.pop().is_none() {
            return Err(MetadataError::ChannelIndexOutOfRange {
                image,
                channel: 0,
                count: 0,
            });
        }
        Ok(())
    }

    fn channel_samples_per_pixel(&self, image: usize, channel: usize) -> Option<Option<u32>> {
        self.pixels(image)
            .ok()?
            .channels
            .get(channel)
            .map(|c| c.samples_per_pixel)
    }

    fn set_channel_samples_per_pixel(
        &mut self,
        image: usize,
        channel: usize,
        samples: u32,
    ) -> Result<()> {
        let pixels = self.pixels_mut(image)?;
        let count = pixels.channels.len();
        let target = pixels
            .channels
            .get_mut(channel)
            .ok_or(MetadataError::ChannelIndexOutOfRange {
                image,
                channel,
                count,
            })?;
        target.samples_per_pixel = Some(samples);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_image_assigns_ids() {
        let mut model = MetadataModel::new();
        model.push_image(1, &[Some(1)]);
        let index = model.push_image(4, &[Some(1), None]);
        assert_eq!(index, 1);

        let image = model.image(1).unwrap();
        assert_eq!(image.id, "Image:1");
        assert_eq!(image.pixels.id, "Pixels:1");
        assert_eq!(image.pixels.channels[1].id, "Channel:1:1");
        assert_eq!(image.pixels.channels[1].samples_per_pixel, None);
    }

    #[test]
    fn test_channel_accessors() {
        let mut model = MetadataModel::new();
        model.push_image(3, &[Some(2)]);

        assert_eq!(model.image_count(), 1);
        assert_eq!(model.pixels_size_c(0), Some(3));
        assert_eq!(model.channel_count(0), Some(1));
        assert_eq!(model.channel_samples_per_pixel(0, 0), Some(Some(2)));

        let added = model.add_channel(0).unwrap();
        assert_eq!(added, 1);
        assert_eq!(model.channel_samples_per_pixel(0, 1), Some(Some(1)));
        assert_eq!(model.images[0].pixels.channels[1].id, "Channel:0:1");

        model.set_channel_samples_per_pixel(0, 1, 4).unwrap();
        model.set_pixels_size_c(0, 6).unwrap();
        assert_eq!(model.channel_samples_per_pixel(0, 1), Some(Some(4)));
        assert_eq!(model.pixels_size_c(0), Some(6));

        model.remove_last_channel(0).unwrap();
        model.remove_last_channel(0).unwrap();
        assert_eq!(model.channel_count(0), Some(0));
        assert!(model.remove_last_channel(0).is_err());
    }

    #[test]
    fn test_out_of_range_access() {
        let mut model = MetadataModel::new();
        model.push_image(1, &[]);

        assert_eq!(model.pixels_size_c(5), None);
        assert_eq!(model.channel_samples_per_pixel(0, 0), None);
        assert!(matches!(
            model.set_pixels_size_c(5, 1),
            Err(MetadataError::ImageIndexOutOfRange { index: 5, count: 1 })
        ));
        assert!(matches!(
            model.set_channel_samples_per_pixel(0, 2, 1),
            Err(MetadataError::ChannelIndexOutOfRange { channel: 2, .. })
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut model = MetadataModel::new();
        model.push_image(2, &[Some(1), None]);
        model.images[0].pixels.dimension_order = DimensionOrder::XYCZT;

        let json = serde_json::to_string(&model).unwrap();
        assert!(json.contains("\"XYCZT\""));
        let parsed: MetadataModel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, model);
    }
}
