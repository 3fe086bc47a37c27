//! Numeric normalization utilities.

/// Parses a string as a finite f64.
///
/// Returns `None` for empty strings, non-numeric text, infinities, and NaN.
pub fn parse_finite(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
}
