//! Loading schema documents and submission files from disk.

pub mod discovery;
pub mod error;
pub mod schema;
pub mod submissions;

pub use discovery::{SUBMISSION_EXTENSIONS, list_submission_files};
pub use error::{IngestError, Result};
pub use schema::{load_schema, load_versions, parse_schema};
pub use submissions::{
    NdjsonReader, ReadOptions, SubmissionFormat, SubmissionStream, parse_submissions,
    read_submission_path, read_submissions, submission_stream,
};
