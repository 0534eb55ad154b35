//! Numeric validation utilities
//!
//! Parsing of the schema's integer primitives and overflow-checked sums of
//! per-channel sample counts.

use crate::error::{MetadataError, Result};

/// Largest `SizeC` accepted from a document, and the most channels the
/// corrector will create for an image
pub const MAX_SIZE_C: u32 = 1 << 16;

/// Validator for numeric attribute values and conversions
pub struct NumericValidator;

impl NumericValidator {
    /// Parse a `PositiveInteger` attribute value (1 or more)
    pub fn parse_positive_integer(element: &str, attribute: &str, value: &str) -> Result<u32> {
        let parsed = Self::parse_non_negative_integer(element, attribute, value)?;
        Self::validate_positive(parsed, element, attribute)
    }

    /// Parse a `NonNegativeInteger` attribute value (0 or more)
    pub fn parse_non_negative_integer(element: &str, attribute: &str, value: &str) -> Result<u32> {
        value.trim().parse::<u32>().map_err(|e| {
            MetadataError::attribute_error(
                element,
                attribute,
                &format!("'{}' is not a non-negative integer ({})", value, e),
            )
        })
    }

    /// Validate that a value is positive
    pub fn validate_positive(value: u32, element: &str, attribute: &str) -> Result<u32> {
        if value == 0 {
            return Err(MetadataError::attribute_error(
                element,
                attribute,
                "must be positive, got 0",
            ));
        }
        Ok(value)
    }

    /// Validate that a `SizeC` value is within [`MAX_SIZE_C`]
    pub fn validate_size_c(value: u32) -> Result<u32> {
        if value > MAX_SIZE_C {
            return Err(MetadataError::attribute_error(
                "Pixels",
                "SizeC",
                &format!("{} exceeds the limit of {} channels", value, MAX_SIZE_C),
            ));
        }
        Ok(value)
    }

    /// Sum sample counts without overflowing
    pub fn checked_sum<I>(values: I) -> Option<u32>
    where
        I: IntoIterator<Item = u32>,
    {
        values
            .into_iter()
            .try_fold(0u32, |total, value| total.checked_add(value))
    }

    /// Safely convert a count to `u32`
    pub fn count_to_u32(value: usize) -> Option<u32> {
        u32::try_from(value).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_integer() {
        assert_eq!(
            NumericValidator::parse_positive_integer("Pixels", "SizeC", "3").unwrap(),
            3
        );
        assert_eq!(
            NumericValidator::parse_positive_integer("Pixels", "SizeC", " 12 ").unwrap(),
            12
        );
        assert!(NumericValidator::parse_positive_integer("Pixels", "SizeC", "0").is_err());
        assert!(NumericValidator::parse_positive_integer("Pixels", "SizeC", "-1").is_err());
        assert!(NumericValidator::parse_positive_integer("Pixels", "SizeC", "two").is_err());
    }

    #[test]
    fn test_parse_non_negative_integer() {
        assert_eq!(
            NumericValidator::parse_non_negative_integer("Pixels", "SizeC", "0").unwrap(),
            0
        );
        let err = NumericValidator::parse_non_negative_integer("Channel", "SamplesPerPixel", "")
            .unwrap_err();
        assert!(err.to_string().contains("SamplesPerPixel"));
    }

    #[test]
    fn test_validate_size_c() {
        assert_eq!(NumericValidator::validate_size_c(0).unwrap(), 0);
        assert_eq!(NumericValidator::validate_size_c(MAX_SIZE_C).unwrap(), MAX_SIZE_C);

        let err = NumericValidator::validate_size_c(u32::MAX).unwrap_err();
        assert!(matches!(err, MetadataError::MalformedDocument(_)));
        assert!(err.to_string().contains(&MAX_SIZE_C.to_string()));
    }

    #[test]
    fn test_checked_sum() {
        assert_eq!(NumericValidator::checked_sum([1, 2, 3]), Some(6));
        assert_eq!(NumericValidator::checked_sum(Vec::<u32>::new()), Some(0));
        assert_eq!(NumericValidator::checked_sum([u32::MAX, 1]), None);
    }

    #[test]
    fn test_count_to_u32() {
        assert_eq!(NumericValidator::count_to_u32(7), Some(7));
    }
}
