use thiserror::Error;

/// Structural problems found while building a form version from its schema.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("row {row}: `{kind}` is missing a name")]
    MissingName { row: usize, kind: String },

    #[error("row {row}: `{kind}` does not close an open {expected}")]
    UnbalancedGroup {
        row: usize,
        kind: String,
        expected: &'static str,
    },

    #[error("{count} group(s) or repeat(s) left open at end of survey")]
    UnclosedGroup { count: usize },

    #[error("duplicate field `{name}` in section `{section}`")]
    DuplicateField { section: String, name: String },

    #[error("duplicate section `{name}`")]
    DuplicateSection { name: String },

    #[error("unknown section `{name}`")]
    UnknownSection { name: String },

    #[error("field `{field}` has no choice list")]
    MissingChoiceList { field: String },

    #[error("field `{field}` references unknown choice list `{list}`")]
    UnknownChoiceList { field: String, list: String },

    #[error("analysis field `{field}` references unknown source `{source_path}`")]
    UnknownAnalysisSource { field: String, source_path: String },

    #[error("row {row}: {actual} labels given but only {expected} translations declared")]
    LabelCountMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
