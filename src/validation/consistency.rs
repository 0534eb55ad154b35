//! Consistency validation and auto-correction of per-image channel metadata
//!
//! An image is consistent when every channel specifies `SamplesPerPixel ≥ 1`,
//! `SizeC` equals the sum of those values, and (when required) at least one
//! channel exists.
//!
//! Correction is a single deterministic pass:
//!
//! 1. An image with no channels and `SizeC = 0` cannot be rebuilt and is left
//!    untouched.
//! 2. An image with no channels gets `SizeC` channels of one sample each, up
//!    to [`MAX_SIZE_C`] channels; a larger `SizeC` is left untouched.
//! 3. Unspecified samples are filled with the even share of the remaining
//!    `SizeC` deficit when there is one, and with 1 otherwise.
//! 4. `SizeC` is rewritten to the channel total; channel data wins over the
//!    declared size.

use super::outcome::{
    Correction, ImageReport, ImageState, Inconsistency, ModelValidationReport,
    UncorrectableReason, ValidationOutcome,
};
use crate::config::ValidationConfig;
use crate::error::{MetadataError, Result};
use crate::model::{ChannelMetadata, DEFAULT_SAMPLES_PER_PIXEL};
use crate::tracing_config::{events, spans};
use crate::utils::{NumericValidator, MAX_SIZE_C};

/// Channel data of one image as seen through [`ChannelMetadata`]
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChannelSnapshot {
    size_c: u32,
    /// `None` for unspecified (or zero) samples per pixel
    samples: Vec<Option<u32>>,
}

impl ChannelSnapshot {
    fn read<M: ChannelMetadata + ?Sized>(store: &M, image: usize) -> Option<Self> {
        let size_c = store.pixels_size_c(image)?;
        let count = store.channel_count(image)?;
        let samples = (0..count)
            .map(|c| {
                store
                    .channel_samples_per_pixel(image, c)
                    .map(|s| s.filter(|&v| v >= 1))
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self { size_c, samples })
    }

    fn specified(&self) -> impl Iterator<Item = u32> + '_ {
        self.samples.iter().filter_map(|s| *s)
    }

    fn unspecified(&self) -> impl Iterator<Item = usize> + '_ {
        self.samples
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(c, _)| c)
    }
}

/// Changes needed to bring an image into a consistent state
#[derive(Debug, Default)]
struct RepairPlan {
    append: usize,
    assign: Vec<(usize, u32)>,
    size_c: Option<(u32, u32)>,
}

impl RepairPlan {
    fn is_empty(&self) -> bool {
        self.append == 0 && self.assign.is_empty() && self.size_c.is_none()
    }
}

/// Validates and optionally repairs the channel metadata of images
#[derive(Debug, Clone, Default)]
pub struct ConsistencyValidator {
    config: ValidationConfig,
}

impl ConsistencyValidator {
    /// Create a validator with the given configuration
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Violated invariants of an image; empty when it is consistent.
    /// `None` when the image does not exist.
    pub fn inconsistencies<M: ChannelMetadata + ?Sized>(
        &self,
        store: &M,
        image: usize,
    ) -> Option<Vec<Inconsistency>> {
        ChannelSnapshot::read(store, image).map(|snapshot| self.find_inconsistencies(&snapshot))
    }

    /// Whether an image is consistent. Never mutates; a missing image is
    /// not consistent.
    pub fn check_image<M: ChannelMetadata + ?Sized>(&self, store: &M, image: usize) -> bool {
        self.inconsistencies(store, image)
            .is_some_and(|issues| issues.is_empty())
    }

    /// State of an image: valid, correctable or fatal
    pub fn classify_image<M: ChannelMetadata + ?Sized>(
        &self,
        store: &M,
        image: usize,
    ) -> Result<ImageState> {
        let snapshot = Self::snapshot(store, image)?;
        if self.find_inconsistencies(&snapshot).is_empty() {
            return Ok(ImageState::Valid);
        }
        Ok(match self.plan(&snapshot) {
            Ok(_) => ImageState::Correctable,
            Err(_) => ImageState::Fatal,
        })
    }

    /// Validate one image, repairing it in place when `correct` is set.
    ///
    /// With `correct = false` the image is never modified and the outcome is
    /// `Valid` or `Invalid`. With `correct = true` the outcome is `Valid`,
    /// `Corrected` (the image is now consistent) or `Uncorrectable` (the
    /// image is unchanged).
    pub fn validate_image<M: ChannelMetadata + ?Sized>(
        &self,
        store: &mut M,
        image: usize,
        correct: bool,
    ) -> Result<ValidationOutcome> {
        let _span = spans::image_validation(image, correct).entered();

        let snapshot = Self::snapshot(&*store, image)?;
        let issues = self.find_inconsistencies(&snapshot);
        if issues.is_empty() {
            tracing::trace!(image, "Image metadata is consistent");
            return Ok(ValidationOutcome::Valid);
        }

        for issue in &issues {
            tracing::debug!(image, issue = %issue, "Inconsistent image metadata");
        }

        if !correct {
            return Ok(ValidationOutcome::Invalid(issues));
        }

        let plan = match self.plan(&snapshot) {
            Ok(plan) => plan,
            Err(reason) => {
                events::uncorrectable(image, &reason);
                return Ok(ValidationOutcome::Uncorrectable(reason));
            },
        };

        let corrections = Self::apply(store, image, &plan)?;
        for correction in &corrections {
            events::correction_applied(image, correction);
        }

        if !self.check_image(&*store, image) {
            return Err(MetadataError::uncorrectable(
                image,
                "metadata store did not retain the applied corrections",
            ));
        }

        Ok(ValidationOutcome::Corrected(corrections))
    }

    /// Validate every image of a model in order, using the configured
    /// `correct` and `fail_fast` settings
    pub fn validate_model<M: ChannelMetadata + ?Sized>(
        &self,
        store: &mut M,
    ) -> Result<ModelValidationReport> {
        let image_count = store.image_count();
        let _span = spans::validation_run(image_count, self.config.correct).entered();

        let mut report = ModelValidationReport::default();
        for image in 0..image_count {
            let outcome = self.validate_image(store, image, self.config.correct)?;
            let outcome = if self.config.fail_fast {
                outcome.into_result(image)?
            } else {
                outcome
            };
            report.images.push(ImageReport { image, outcome });
        }

        tracing::info!(
            images = image_count,
            corrected = report.corrected_count(),
            uncorrectable = report.uncorrectable_images().len(),
            valid = report.is_valid(),
            "Validation run finished"
        );
        Ok(report)
    }

    fn snapshot<M: ChannelMetadata + ?Sized>(store: &M, image: usize) -> Result<ChannelSnapshot> {
        ChannelSnapshot::read(store, image).ok_or(MetadataError::ImageIndexOutOfRange {
            index: image,
            count: store.image_count(),
        })
    }

    fn find_inconsistencies(&self, snapshot: &ChannelSnapshot) -> Vec<Inconsistency> {
        let mut issues = Vec::new();

        if snapshot.samples.is_empty() && self.config.require_channel {
            issues.push(Inconsistency::MissingChannels {
                size_c: snapshot.size_c,
            });
        }

        issues.extend(
            snapshot
                .unspecified()
                .map(|channel| Inconsistency::UnspecifiedSamples { channel }),
        );

        // The total is only meaningful once every channel is specified.
        if issues.is_empty() {
            match NumericValidator::checked_sum(snapshot.specified()) {
                Some(total) if total != snapshot.size_c => {
                    issues.push(Inconsistency::SizeMismatch {
                        declared: snapshot.size_c,
                        total,
                    });
                },
                Some(_) => {},
                None => issues.push(Inconsistency::SampleOverflow),
            }
        }

        issues
    }

    fn plan(&self, snapshot: &ChannelSnapshot) -> std::result::Result<RepairPlan, UncorrectableReason> {
        let mut plan = RepairPlan::default();

        if snapshot.samples.is_empty() {
            if snapshot.size_c == 0 && self.config.require_channel {
                return Err(UncorrectableReason::NoChannelData);
            }
            if snapshot.size_c > MAX_SIZE_C {
                return Err(UncorrectableReason::TooManyChannels {
                    size_c: snapshot.size_c,
                    limit: MAX_SIZE_C,
                });
            }
            // One single-sample channel per unit of SizeC; the total then
            // matches SizeC already.
            plan.append = snapshot.size_c as usize;
            return Ok(plan);
        }

        let known = NumericValidator::checked_sum(snapshot.specified())
            .ok_or(UncorrectableReason::SampleOverflow)?;
        let unspecified: Vec<usize> = snapshot.unspecified().collect();

        let mut total = known;
        if !unspecified.is_empty() {
            let count = NumericValidator::count_to_u32(unspecified.len())
                .ok_or(UncorrectableReason::SampleOverflow)?;
            let deficit = snapshot.size_c.saturating_sub(known);
            let fill = if deficit > 0 && deficit % count == 0 {
                deficit / count
            } else {
                DEFAULT_SAMPLES_PER_PIXEL
            };
            total = fill
                .checked_mul(count)
                .and_then(|filled| filled.checked_add(known))
                .ok_or(UncorrectableReason::SampleOverflow)?;
            plan.assign = unspecified.into_iter().map(|c| (c, fill)).collect();
        }

        if total != snapshot.size_c {
            plan.size_c = Some((snapshot.size_c, total));
        }

        Ok(plan)
    }

    fn apply<M: ChannelMetadata + ?Sized>(
        store: &mut M,
        image: usize,
        plan: &RepairPlan,
    ) -> Result<Vec<Correction>> {
        let mut corrections = Vec::new();
        if plan.is_empty() {
            return Ok(corrections);
        }

        if plan.append > 0 {
            for _ in 0..plan.append {
                let channel = store.add_channel(image)?;
                store.set_channel_samples_per_pixel(image, channel, DEFAULT_SAMPLES_PER_PIXEL)?;
            }
            corrections.push(Correction::ChannelsAdded { count: plan.append });
        }

        for &(channel, samples) in &plan.assign {
            store.set_channel_samples_per_pixel(image, channel, samples)?;
            corrections.push(Correction::SamplesAssigned { channel, samples });
        }

        if let Some((from, to)) = plan.size_c {
            store.set_pixels_size_c(image, to)?;
            corrections.push(Correction::SizeCRewritten { from, to });
        }

        Ok(corrections)
    }
}

/// Whether an image is consistent, using the default configuration
pub fn check_image<M: ChannelMetadata + ?Sized>(store: &M, image: usize) -> bool {
    ConsistencyValidator::default().check_image(store, image)
}

/// State of an image, using the default configuration
pub fn classify_image<M: ChannelMetadata + ?Sized>(store: &M, image: usize) -> Result<ImageState> {
    ConsistencyValidator::default().classify_image(store, image)
}

/// Validate (and with `correct`, repair) one image using the default
/// configuration
pub fn validate_image<M: ChannelMetadata + ?Sized>(
    store: &mut M,
    image: usize,
    correct: bool,
) -> Result<ValidationOutcome> {
    ConsistencyValidator::default().validate_image(store, image, correct)
}

/// Validate every image of a model with the given configuration
pub fn validate_model<M: ChannelMetadata + ?Sized>(
    store: &mut M,
    config: &ValidationConfig,
) -> Result<ModelValidationReport> {
    ConsistencyValidator::new(config.clone()).validate_model(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MetadataModel;

    fn model_with(size_c: u32, samples: &[Option<u32>]) -> MetadataModel {
        let mut model = MetadataModel::new();
        model.push_image(size_c, samples);
        model
    }

    fn samples(model: &MetadataModel) -> Vec<Option<u32>> {
        model.images[0]
            .pixels
            .channels
            .iter()
            .map(|c| c.samples_per_pixel)
            .collect()
    }

    #[test]
    fn test_valid_image_untouched() {
        let mut model = model_with(4, &[Some(1), Some(3)]);
        let before = model.clone();
        assert!(check_image(&model, 0));
        assert_eq!(
            validate_image(&mut model, 0, true).unwrap(),
            ValidationOutcome::Valid
        );
        assert_eq!(model, before);
    }

    #[test]
    fn test_read_only_reports_issues() {
        let mut model = model_with(4, &[Some(1), None]);
        let before = model.clone();
        let outcome = validate_image(&mut model, 0, false).unwrap();
        assert_eq!(
            outcome,
            ValidationOutcome::Invalid(vec![Inconsistency::UnspecifiedSamples { channel: 1 }])
        );
        assert_eq!(model, before);
    }

    #[test]
    fn test_zero_channels_appended() {
        let mut model = model_with(1, &[]);
        let outcome = validate_image(&mut model, 0, true).unwrap();
        assert_eq!(
            outcome,
            ValidationOutcome::Corrected(vec![Correction::ChannelsAdded { count: 1 }])
        );
        assert_eq!(samples(&model), vec![Some(1)]);
        assert_eq!(model.images[0].pixels.size_c, 1);
        assert_eq!(model.images[0].pixels.channels[0].id, "Channel:0:0");
    }

    #[test]
    fn test_even_share_of_deficit() {
        let mut model = model_with(6, &[Some(3), None]);
        validate_image(&mut model, 0, true).unwrap();
        assert_eq!(samples(&model), vec![Some(3), Some(3)]);
        assert_eq!(model.images[0].pixels.size_c, 6);

        let mut model = model_with(4, &[None, None]);
        validate_image(&mut model, 0, true).unwrap();
        assert_eq!(samples(&model), vec![Some(2), Some(2)]);
    }

    #[test]
    fn test_size_rewritten_from_channels() {
        let mut model = model_with(7, &[Some(1); 4]);
        let outcome = validate_image(&mut model, 0, true).unwrap();
        assert_eq!(
            outcome.corrections(),
            &[Correction::SizeCRewritten { from: 7, to: 4 }]
        );
        assert_eq!(model.images[0].pixels.size_c, 4);
        assert_eq!(model.images[0].pixels.channels.len(), 4);
    }

    #[test]
    fn test_uneven_deficit_defaults_to_one() {
        let mut model = model_with(4, &[Some(1), None, None]);
        assert_eq!(
            classify_image(&model, 0).unwrap(),
            ImageState::Correctable
        );
        validate_image(&mut model, 0, true).unwrap();
        assert_eq!(samples(&model), vec![Some(1), Some(1), Some(1)]);
        assert_eq!(model.images[0].pixels.size_c, 3);
    }

    #[test]
    fn test_fatal_image_left_untouched() {
        let mut model = model_with(0, &[]);
        let before = model.clone();
        assert!(!check_image(&model, 0));
        assert_eq!(classify_image(&model, 0).unwrap(), ImageState::Fatal);
        assert_eq!(
            validate_image(&mut model, 0, true).unwrap(),
            ValidationOutcome::Uncorrectable(UncorrectableReason::NoChannelData)
        );
        assert_eq!(model, before);
    }

    #[test]
    fn test_channels_optional() {
        let config = ValidationConfig::builder()
            .require_channel(false)
            .build()
            .unwrap();
        let validator = ConsistencyValidator::new(config);
        let mut model = model_with(0, &[]);
        assert!(validator.check_image(&model, 0));
        assert_eq!(
            validator.validate_image(&mut model, 0, true).unwrap(),
            ValidationOutcome::Valid
        );
    }

    #[test]
    fn test_zero_samples_treated_as_unspecified() {
        let mut model = model_with(2, &[Some(0)]);
        assert!(!check_image(&model, 0));
        validate_image(&mut model, 0, true).unwrap();
        assert_eq!(samples(&model), vec![Some(2)]);
    }

    #[test]
    fn test_overflow_is_uncorrectable() {
        let mut model = model_with(1, &[Some(u32::MAX), Some(1)]);
        assert_eq!(
            validate_image(&mut model, 0, false).unwrap(),
            ValidationOutcome::Invalid(vec![Inconsistency::SampleOverflow])
        );
        assert_eq!(
            validate_image(&mut model, 0, true).unwrap(),
            ValidationOutcome::Uncorrectable(UncorrectableReason::SampleOverflow)
        );
    }

    #[test]
    fn test_channel_limit_is_uncorrectable() {
        let mut model = model_with(u32::MAX, &[]);
        let before = model.clone();
        assert_eq!(classify_image(&model, 0).unwrap(), ImageState::Fatal);
        assert_eq!(
            validate_image(&mut model, 0, true).unwrap(),
            ValidationOutcome::Uncorrectable(UncorrectableReason::TooManyChannels {
                size_c: u32::MAX,
                limit: MAX_SIZE_C,
            })
        );
        assert_eq!(model, before);

        let mut model = model_with(MAX_SIZE_C, &[]);
        validate_image(&mut model, 0, true).unwrap();
        assert_eq!(model.images[0].pixels.channels.len(), MAX_SIZE_C as usize);
        assert!(check_image(&model, 0));
    }

    #[test]
    fn test_large_deficit() {
        // Odd deficit over two channels: no even share.
        let mut model = model_with(u32::MAX, &[None, None]);
        let outcome = validate_image(&mut model, 0, true).unwrap();
        assert_eq!(samples(&model), vec![Some(1), Some(1)]);
        assert_eq!(
            outcome.corrections().last(),
            Some(&Correction::SizeCRewritten { from: u32::MAX, to: 2 })
        );

        let mut model = model_with(u32::MAX - 1, &[None, None]);
        validate_image(&mut model, 0, true).unwrap();
        let half = (u32::MAX - 1) / 2;
        assert_eq!(samples(&model), vec![Some(half), Some(half)]);
        assert_eq!(model.images[0].pixels.size_c, u32::MAX - 1);

        // Defaulting the unspecified channel to one overflows the total.
        let mut model = model_with(1, &[Some(u32::MAX), None]);
        let before = model.clone();
        assert_eq!(
            validate_image(&mut model, 0, true).unwrap(),
            ValidationOutcome::Uncorrectable(UncorrectableReason::SampleOverflow)
        );
        assert_eq!(model, before);
    }

    #[test]
    fn test_missing_image() {
        let mut model = MetadataModel::new();
        assert!(!check_image(&model, 0));
        assert!(matches!(
            validate_image(&mut model, 0, true),
            Err(MetadataError::ImageIndexOutOfRange { index: 0, count: 0 })
        ));
    }

    #[test]
    fn test_model_run_continues_past_fatal_image() {
        let mut model = MetadataModel::new();
        model.push_image(0, &[]);
        model.push_image(7, &[Some(1); 4]);

        let report = validate_model(&mut model, &ValidationConfig::correcting()).unwrap();
        assert_eq!(report.uncorrectable_images(), vec![0]);
        assert_eq!(report.corrected_count(), 1);
        assert_eq!(model.images[1].pixels.size_c, 4);
    }

    #[test]
    fn test_model_run_fail_fast() {
        let mut model = MetadataModel::new();
        model.push_image(0, &[]);
        model.push_image(7, &[Some(1); 4]);

        let config = ValidationConfig::builder()
            .correct(true)
            .fail_fast(true)
            .build()
            .unwrap();
        let err = validate_model(&mut model, &config).unwrap_err();
        assert!(matches!(
            err,
            MetadataError::UncorrectableMetadataState { image: 0, .. }
        ));
        // Images after the failing one are not visited.
        assert_eq!(model.images[1].pixels.size_c, 7);
    }
}
