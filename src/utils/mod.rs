//! Utility modules for common operations

pub mod numeric;

pub use numeric::{NumericValidator, MAX_SIZE_C};
