//! Format-agnostic export output handed to writers.

use indexmap::IndexMap;
use serde::Serialize;
use survey_model::Cell;

/// One row: a cell per column of its table.
pub type Row = Vec<Cell>;

/// Name of the generated row index column.
pub const INDEX_COLUMN: &str = "_index";
/// Name of the column holding the parent table name on child rows.
pub const PARENT_TABLE_COLUMN: &str = "_parent_table_name";
/// Name of the column holding the parent row's `_index`.
pub const PARENT_INDEX_COLUMN: &str = "_parent_index";
/// Prefix of copy values repeated on child rows.
pub const SUBMISSION_PREFIX: &str = "_submission_";

/// One exported table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag_rows: Vec<Vec<String>>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// Cell of `column` in row `row`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    /// Every cell of `column`, top to bottom.
    pub fn column_values(&self, column: &str) -> Vec<&Cell> {
        match self.column_index(column) {
            Some(index) => self.rows.iter().filter_map(|row| row.get(index)).collect(),
            None => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every table of one export pass, root table first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TableSet {
    pub tables: Vec<Table>,
}

impl TableSet {
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Row count per table.
    pub fn row_counts(&self) -> IndexMap<String, usize> {
        self.tables
            .iter()
            .map(|table| (table.name.clone(), table.rows.len()))
            .collect()
    }
}
