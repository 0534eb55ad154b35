//! Channel consistency validation and correction

pub mod consistency;
pub mod outcome;

pub use consistency::{
    check_image, classify_image, validate_image, validate_model, ConsistencyValidator,
};
pub use outcome::{
    Correction, ImageReport, ImageState, Inconsistency, ModelValidationReport,
    UncorrectableReason, ValidationOutcome,
};
