//! Canonical object identifiers
//!
//! Model objects are named `Kind:i:j:...`, one index per level of nesting
//! (`Image:0`, `Channel:0:2`, `Mask:3:5:6`, ...).

use std::fmt::Write;

/// Build the identifier for an object of `kind` at the given nesting indices.
///
/// ```rust
/// use ome_metatools::create_id;
///
/// assert_eq!(create_id("Instrument", &[2]), "Instrument:2");
/// assert_eq!(create_id("Mask", &[92, 329, 892]), "Mask:92:329:892");
/// ```
#[must_use]
pub fn create_id(kind: &str, indices: &[usize]) -> String {
    let mut id = String::with_capacity(kind.len() + indices.len() * 4);
    id.push_str(kind);
    for index in indices {
        // Writing into a String cannot fail.
        let _ = write!(id, ":{index}");
    }
    id
}
