//! Geopoint answers: `"lat lon [alt [precision]]"`.

use crate::normalization::numeric::parse_finite;

/// The four positional parts of a geopoint answer; missing parts are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpsParts {
    pub latitude: String,
    pub longitude: String,
    pub altitude: String,
    pub precision: String,
}

/// Split a raw geopoint on whitespace, keeping at most four tokens.
pub fn split_gps(raw: &str) -> GpsParts {
    let mut tokens = raw.split_whitespace().map(str::to_string);
    GpsParts {
        latitude: tokens.next().unwrap_or_default(),
        longitude: tokens.next().unwrap_or_default(),
        altitude: tokens.next().unwrap_or_default(),
        precision: tokens.next().unwrap_or_default(),
    }
}

/// GeoJSON position for a geopoint: `[lon, lat]` or `[lon, lat, alt]`.
///
/// Returns `None` unless latitude and longitude are both numeric. A
/// non-numeric altitude is dropped.
pub fn gps_coordinates(raw: &str) -> Option<Vec<f64>> {
    let parts = split_gps(raw);
    let latitude = parse_finite(&parts.latitude)?;
    let longitude = parse_finite(&parts.longitude)?;
    let mut position = vec![longitude, latitude];
    if let Some(altitude) = parse_finite(&parts.altitude) {
        position.push(altitude);
    }
    Some(position)
}
