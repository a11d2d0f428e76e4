//! Geographic extent codes accepted in `geographic_extents`.
//!
//! Reference only: extents are passed to the provider as given and are not
//! checked against this table.

/// Recognized extent codes and the geography they name.
pub const GEOGRAPHIC_EXTENT_OPTIONS: &[(&str, &str)] = &[
    ("010", "Nation"),
    ("020", "Region"),
    ("030", "Division"),
    ("040", "State"),
    ("050", "State-County"),
    ("140", "State-County-Census Tract"),
    ("155", "State-Place-County"),
    ("160", "State-Place"),
    (
        "250",
        "American Indian Area/Alaska Native Area Hawaiian Home Land",
    ),
    (
        "310",
        "Metropolitan Statistical Area/Micropolitan Statistical Area",
    ),
    ("500", "State-Congressional District"),
];

/// Look up the geography named by an extent code.
///
/// # Examples
/// ```
/// use nhgis_extract::geography::extent_name;
///
/// assert_eq!(extent_name("040"), Some("State"));
/// assert_eq!(extent_name("999"), None);
/// ```
#[must_use]
pub fn extent_name(code: &str) -> Option<&'static str> {
    GEOGRAPHIC_EXTENT_OPTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_three_digits_and_unique() {
        let mut codes: Vec<&str> = GEOGRAPHIC_EXTENT_OPTIONS.iter().map(|(c, _)| *c).collect();
        assert!(codes.iter().all(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_digit())));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), GEOGRAPHIC_EXTENT_OPTIONS.len());
    }

    #[test]
    fn test_extent_name() {
        assert_eq!(extent_name("010"), Some("Nation"));
        assert_eq!(extent_name("140"), Some("State-County-Census Tract"));
        assert_eq!(extent_name("*"), None);
    }
}
