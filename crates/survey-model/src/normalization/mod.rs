//! Value normalization for typed output.
//!
//! - **numeric**: finite number parsing
//! - **datetime**: date and datetime parsing
//! - **gps**: splitting geopoint answers and reordering them for GeoJSON
//!
//! Every parser returns `None` on failure; callers keep the raw string.

pub mod datetime;
pub mod gps;
pub mod numeric;

pub use datetime::{parse_date, parse_datetime};
pub use gps::{GpsParts, gps_coordinates, split_gps};
pub use numeric::parse_finite;
