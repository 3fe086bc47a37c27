//! Survey export engine.
//!
//! - **reconcile**: merging several form versions into one field superset
//! - **flatten**: turning nested submissions into linked table rows
//! - **export**: configuration checks and export passes
//! - **table**: the format-agnostic output handed to writers

pub mod error;
pub mod export;
pub mod flatten;
pub mod reconcile;
pub mod table;

pub use error::{ExportError, Result};
pub use export::{Export, ExportSummary, TAG_COLUMNS, TableLayout, VersionMatch};
pub use flatten::{FlattenContext, FlattenState, flatten_submission, meta_columns};
pub use reconcile::{reconcile_fields, reconcile_sections};
pub use survey_model::normalization::gps_coordinates;
pub use table::{Row, Table, TableSet};
