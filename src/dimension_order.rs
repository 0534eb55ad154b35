//! Canonical acquisition axis order
//!
//! Pixel data is traversed over five axes. `X` and `Y` always come first;
//! the remaining three (`Z`, `T`, `C`) may appear in any order, giving six
//! canonical permutations.

use crate::error::{MetadataError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order in which the five acquisition axes are traversed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionOrder {
    #[serde(rename = "XYZCT")]
    XYZCT,
    #[serde(rename = "XYZTC")]
    XYZTC,
    #[serde(rename = "XYCTZ")]
    XYCTZ,
    #[serde(rename = "XYCZT")]
    XYCZT,
    #[serde(rename = "XYTCZ")]
    XYTCZ,
    #[serde(rename = "XYTZC")]
    XYTZC,
}

impl Default for DimensionOrder {
    fn default() -> Self {
        Self::XYZTC
    }
}

impl DimensionOrder {
    /// All canonical orders
    pub const ALL: [Self; 6] = [
        Self::XYZCT,
        Self::XYZTC,
        Self::XYCTZ,
        Self::XYCZT,
        Self::XYTCZ,
        Self::XYTZC,
    ];

    /// Canonical five letter name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::XYZCT => "XYZCT",
            Self::XYZTC => "XYZTC",
            Self::XYCTZ => "XYCTZ",
            Self::XYCZT => "XYCZT",
            Self::XYTCZ => "XYTCZ",
            Self::XYTZC => "XYTZC",
        }
    }
}

impl fmt::Display for DimensionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DimensionOrder {
    type Err = MetadataError;

    /// Exact match against the canonical names; use
    /// [`create_dimension_order`] for partial specifications.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == s)
            .ok_or_else(|| {
                MetadataError::invalid_order(format!("'{}' is not a canonical dimension order", s))
            })
    }
}

const TAIL_AXES: [char; 3] = ['Z', 'T', 'C'];

/// Resolve a partial or redundant axis-order specification.
///
/// Recognized axes are deduplicated keeping their first occurrence, the
/// result must start with `X` then `Y`, and any of `Z`, `T`, `C` that are
/// missing are appended in that order.
///
/// ```rust
/// use ome_metatools::{create_dimension_order, DimensionOrder};
///
/// assert_eq!(create_dimension_order("").unwrap(), DimensionOrder::XYZTC);
/// assert_eq!(create_dimension_order("XYC").unwrap(), DimensionOrder::XYCZT);
/// assert!(create_dimension_order("CXY").is_err());
/// ```
pub fn create_dimension_order(spec: &str) -> Result<DimensionOrder> {
    let mut axes: Vec<char> = Vec::with_capacity(5);
    for axis in spec.chars() {
        if matches!(axis, 'X' | 'Y' | 'Z' | 'T' | 'C') && !axes.contains(&axis) {
            axes.push(axis);
        }
    }

    if axes.first().is_some_and(|&axis| axis != 'X') {
        return Err(MetadataError::invalid_order(format!(
            "'{}' must begin with X",
            spec
        )));
    }
    if axes.get(1).is_some_and(|&axis| axis != 'Y') {
        return Err(MetadataError::invalid_order(format!(
            "'{}' must have Y as its second axis",
            spec
        )));
    }

    if axes.is_empty() {
        axes.push('X');
    }
    if axes.len() == 1 {
        axes.push('Y');
    }
    for axis in TAIL_AXES {
        if !axes.contains(&axis) {
            axes.push(axis);
        }
    }

    let resolved: String = axes.into_iter().collect();
    tracing::trace!(spec = %spec, resolved = %resolved, "Resolved dimension order");
    resolved.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_examples() {
        assert_eq!(create_dimension_order("").unwrap(), DimensionOrder::XYZTC);
        assert_eq!(
            create_dimension_order("XYXYZTCZ").unwrap(),
            DimensionOrder::XYZTC
        );
        assert_eq!(create_dimension_order("XYC").unwrap(), DimensionOrder::XYCZT);
        assert_eq!(create_dimension_order("XYTZ").unwrap(), DimensionOrder::XYTZC);
    }

    #[test]
    fn test_short_prefixes() {
        assert_eq!(create_dimension_order("X").unwrap(), DimensionOrder::XYZTC);
        assert_eq!(create_dimension_order("XY").unwrap(), DimensionOrder::XYZTC);
        assert_eq!(create_dimension_order("XYCT").unwrap(), DimensionOrder::XYCTZ);
    }

    #[test]
    fn test_unrecognized_characters_ignored() {
        assert_eq!(
            create_dimension_order("xX-Y?T").unwrap(),
            DimensionOrder::XYTZC
        );
    }

    #[test]
    fn test_prefix_violations() {
        for spec in ["CXY", "Y", "YC", "XZ", "XCY"] {
            let err = create_dimension_order(spec).unwrap_err();
            assert!(
                matches!(err, MetadataError::InvalidOrderSpecification(_)),
                "{spec} should be rejected"
            );
        }
    }

    #[test]
    fn test_canonical_round_trip_through_resolver() {
        for order in DimensionOrder::ALL {
            assert_eq!(create_dimension_order(order.as_str()).unwrap(), order);
            assert_eq!(order.as_str().parse::<DimensionOrder>().unwrap(), order);
        }
    }

    #[test]
    fn test_from_str_is_exact() {
        assert!("XYC".parse::<DimensionOrder>().is_err());
        assert!("xyztc".parse::<DimensionOrder>().is_err());
    }
}
