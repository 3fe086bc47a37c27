use indexmap::IndexMap;
use serde::Serialize;
use survey_core::{ExportSummary, Row, TableSet};

/// The JSON document written by `survey export`.
#[derive(Debug, Serialize)]
pub struct ExportDocument {
    pub tables: TableSet,
    pub summary: ExportSummary,
    /// Root rows grouped by the `split_by` column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splits: Option<IndexMap<String, Vec<Row>>>,
}

/// Outcome of `survey export`, kept for the summary printout.
#[derive(Debug)]
pub struct ExportResult {
    pub summary: ExportSummary,
    /// Where the document was written; `None` for stdout.
    pub output: Option<std::path::PathBuf>,
    pub split_groups: Option<usize>,
}
