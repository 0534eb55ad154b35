//! Results of validating and correcting images

use crate::error::{MetadataError, Result};
use serde::Serialize;
use std::fmt;

/// Consistency state of a single image, derived from its current data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageState {
    /// All invariants hold
    Valid,
    /// Invalid, but a repair sequence reaches validity
    Correctable,
    /// Invalid and no repair sequence exists
    Fatal,
}

/// A single violated invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    /// The image has no channels although at least one is required
    MissingChannels { size_c: u32 },
    /// A channel does not specify its samples per pixel
    UnspecifiedSamples { channel: usize },
    /// Declared `SizeC` differs from the sum of channel samples
    SizeMismatch { declared: u32, total: u32 },
    /// The sum of channel samples does not fit the `SizeC` range
    SampleOverflow,
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChannels { size_c } => {
                write!(f, "no channels present (SizeC={size_c})")
            },
            Self::UnspecifiedSamples { channel } => {
                write!(f, "channel {channel} has no SamplesPerPixel")
            },
            Self::SizeMismatch { declared, total } => {
                write!(f, "SizeC={declared} but channels provide {total} samples")
            },
            Self::SampleOverflow => f.write_str("channel samples overflow SizeC"),
        }
    }
}

/// A single change made while correcting an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correction {
    /// Channels appended with the default samples per pixel
    ChannelsAdded { count: usize },
    /// An unspecified samples per pixel was filled in
    SamplesAssigned { channel: usize, samples: u32 },
    /// Declared `SizeC` rewritten to match the channels
    SizeCRewritten { from: u32, to: u32 },
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelsAdded { count } => write!(f, "added {count} channel(s)"),
            Self::SamplesAssigned { channel, samples } => {
                write!(f, "set channel {channel} SamplesPerPixel={samples}")
            },
            Self::SizeCRewritten { from, to } => write!(f, "rewrote SizeC {from} -> {to}"),
        }
    }
}

/// Why an image cannot be repaired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UncorrectableReason {
    /// No channels and `SizeC` of zero: nothing to rebuild channels from
    NoChannelData,
    /// Channel samples sum past the representable `SizeC` range
    SampleOverflow,
    /// No channels, and `SizeC` asks for more channels than may be created
    TooManyChannels { size_c: u32, limit: u32 },
}

impl fmt::Display for UncorrectableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChannelData => {
                f.write_str("SizeC is 0 and no channels are present, but at least one channel is required")
            },
            Self::SampleOverflow => f.write_str("channel samples per pixel sum overflows SizeC"),
            Self::TooManyChannels { size_c, limit } => write!(
                f,
                "no channels are present and SizeC {size_c} exceeds the limit of {limit} channels"
            ),
        }
    }
}

/// Outcome of validating one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "details", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// Already consistent; nothing was changed
    Valid,
    /// Inconsistent and left untouched (read-only validation)
    Invalid(Vec<Inconsistency>),
    /// Was inconsistent and has been repaired in place
    Corrected(Vec<Correction>),
    /// Inconsistent with no repair path; nothing was changed
    Uncorrectable(UncorrectableReason),
}

impl ValidationOutcome {
    /// Whether the image is consistent after this operation
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid | Self::Corrected(_))
    }

    /// Whether the image was consistent before this operation
    #[must_use]
    pub fn was_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Changes made, if any
    #[must_use]
    pub fn corrections(&self) -> &[Correction] {
        match self {
            Self::Corrected(corrections) => corrections,
            _ => &[],
        }
    }

    /// Turn an `Uncorrectable` outcome for `image` into an error
    pub fn into_result(self, image: usize) -> Result<Self> {
        match self {
            Self::Uncorrectable(reason) => Err(MetadataError::uncorrectable(image, reason.to_string())),
            outcome => Ok(outcome),
        }
    }
}

/// Outcome for one image of a model-wide run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReport {
    /// Image index within the model
    pub image: usize,
    #[serde(flatten)]
    pub outcome: ValidationOutcome,
}

/// Outcomes for every image of a model, in image order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelValidationReport {
    pub images: Vec<ImageReport>,
}

impl ModelValidationReport {
    /// Whether every image is consistent after the run
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.images.iter().all(|r| r.outcome.is_valid())
    }

    /// Whether every image was consistent before the run
    #[must_use]
    pub fn was_valid(&self) -> bool {
        self.images.iter().all(|r| r.outcome.was_valid())
    }

    /// Number of images repaired in place
    #[must_use]
    pub fn corrected_count(&self) -> usize {
        self.images
            .iter()
            .filter(|r| matches!(r.outcome, ValidationOutcome::Corrected(_)))
            .count()
    }

    /// Indices of images that could not be repaired
    #[must_use]
    pub fn uncorrectable_images(&self) -> Vec<usize> {
        self.images
            .iter()
            .filter(|r| matches!(r.outcome, ValidationOutcome::Uncorrectable(_)))
            .map(|r| r.image)
            .collect()
    }

    /// Fail with the first uncorrectable image, if any
    pub fn into_result(self) -> Result<Self> {
        let first = self.images.iter().find_map(|r| match r.outcome {
            ValidationOutcome::Uncorrectable(reason) => Some((r.image, reason)),
            _ => None,
        });
        match first {
            Some((image, reason)) => Err(MetadataError::uncorrectable(image, reason.to_string())),
            None => Ok(self),
        }
    }
}
