//! Property tests for the channel consistency validator

use ome_metatools::{
    check_image, classify_image, validate_image, ImageState, MetadataModel,
    UncorrectableReason, ValidationOutcome, MAX_SIZE_C,
};
use proptest::prelude::*;

/// Small images: SizeC up to 16, up to 6 channels, samples unspecified or 1..=4
fn arb_image() -> impl Strategy<Value = (u32, Vec<Option<u32>>)> {
    (
        0u32..=16,
        prop::collection::vec(prop::option::of(1u32..=4), 0..=6),
    )
}

/// SizeC past the channel limit, with the same channel shapes as `arb_image`
fn arb_large_image() -> impl Strategy<Value = (u32, Vec<Option<u32>>)> {
    (
        (MAX_SIZE_C + 1)..=u32::MAX,
        prop::collection::vec(prop::option::of(1u32..=4), 0..=6),
    )
}

fn model_of(size_c: u32, samples: &[Option<u32>]) -> MetadataModel {
    let mut model = MetadataModel::new();
    model.push_image(size_c, samples);
    model
}

// ── Read-only validation never mutates ─────────────────────────────────────

proptest! {
    #[test]
    fn read_only_validation_is_pure((size_c, samples) in arb_image()) {
        let mut model = model_of(size_c, &samples);
        let before = model.clone();

        let valid = check_image(&model, 0);
        let outcome = validate_image(&mut model, 0, false).unwrap();

        prop_assert_eq!(&model, &before);
        prop_assert_eq!(outcome.is_valid(), valid);
        prop_assert!(matches!(
            outcome,
            ValidationOutcome::Valid | ValidationOutcome::Invalid(_)
        ));
    }
}

// ── Correction converges ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn correction_lands_in_valid_or_uncorrectable((size_c, samples) in arb_image()) {
        let mut model = model_of(size_c, &samples);
        let before = model.clone();
        let state = classify_image(&model, 0).unwrap();

        match validate_image(&mut model, 0, true).unwrap() {
            ValidationOutcome::Valid => {
                prop_assert_eq!(state, ImageState::Valid);
                prop_assert_eq!(&model, &before);
            },
            ValidationOutcome::Corrected(corrections) => {
                prop_assert_eq!(state, ImageState::Correctable);
                prop_assert!(!corrections.is_empty());
                prop_assert!(check_image(&model, 0));
            },
            ValidationOutcome::Uncorrectable(_) => {
                prop_assert_eq!(state, ImageState::Fatal);
                prop_assert_eq!(&model, &before);
            },
            ValidationOutcome::Invalid(_) => prop_assert!(false, "correction returned Invalid"),
        }
    }

    #[test]
    fn second_correction_is_a_no_op((size_c, samples) in arb_image()) {
        let mut model = model_of(size_c, &samples);
        let first = validate_image(&mut model, 0, true).unwrap();
        let after_first = model.clone();

        let second = validate_image(&mut model, 0, true).unwrap();
        prop_assert_eq!(&model, &after_first);
        if first.is_valid() {
            prop_assert_eq!(second, ValidationOutcome::Valid);
        } else {
            prop_assert_eq!(second, first);
        }
    }

    #[test]
    fn channels_are_never_removed((size_c, samples) in arb_image()) {
        let mut model = model_of(size_c, &samples);
        validate_image(&mut model, 0, true).unwrap();

        let channels = &model.images[0].pixels.channels;
        prop_assert!(channels.len() >= samples.len());
        for (channel, original) in channels.iter().zip(&samples) {
            if let Some(value) = original {
                prop_assert_eq!(channel.samples_per_pixel, Some(*value));
            }
        }
    }
}

// ── Oversized SizeC ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn oversized_size_c_never_adds_channels((size_c, samples) in arb_large_image()) {
        let mut model = model_of(size_c, &samples);
        let before = model.clone();

        let outcome = validate_image(&mut model, 0, true).unwrap();
        prop_assert_eq!(model.images[0].pixels.channels.len(), samples.len());

        if samples.is_empty() {
            prop_assert_eq!(
                outcome,
                ValidationOutcome::Uncorrectable(UncorrectableReason::TooManyChannels {
                    size_c,
                    limit: MAX_SIZE_C,
                })
            );
            prop_assert_eq!(&model, &before);
        } else {
            prop_assert!(outcome.is_valid());
            prop_assert!(check_image(&model, 0));
        }
    }
}
