use survey_model::ModelError;
use thiserror::Error;

/// Errors raised while configuring an export, before any row is produced.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no form versions supplied")]
    NoVersions,

    #[error("duplicate version identifier `{version}`")]
    DuplicateVersion { version: String },

    #[error("requested version `{version}` does not exist")]
    UnknownVersion { version: String },

    #[error("split_by `{path}` does not name a field of the root table")]
    UnknownSplitField { path: String },

    #[error("`{tag}` is not a known tag column")]
    UnknownTagColumn { tag: String },

    #[error("duplicate column `{column}` in table `{table}`")]
    DuplicateColumn { table: String, column: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, ExportError>;
