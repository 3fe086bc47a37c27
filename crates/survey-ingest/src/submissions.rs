//! Reading submission files.
//!
//! A submission file is either a JSON document (an array of submissions, or
//! a single submission object) or newline-delimited JSON with one submission
//! per line. The format comes from [`ReadOptions`], then the file extension,
//! then the first non-blank character of the content.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use survey_model::Submission;
use tracing::{debug, warn};

use crate::discovery::list_submission_files;
use crate::error::{IngestError, Result};

/// On-disk layout of a submission file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionFormat {
    /// A JSON array of objects, or one object.
    Json,
    /// One JSON object per line.
    Ndjson,
}

impl SubmissionFormat {
    /// Format implied by a file extension. Plain `.json` is ambiguous and
    /// yields `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("ndjson") || ext.eq_ignore_ascii_case("jsonl") {
            Some(SubmissionFormat::Ndjson)
        } else {
            None
        }
    }

    /// Guess the format from content.
    pub fn sniff(text: &str) -> Self {
        match text.trim_start().chars().next() {
            Some('[') => SubmissionFormat::Json,
            _ if text.trim().lines().count() <= 1 => SubmissionFormat::Json,
            _ if looks_like_ndjson(text) => SubmissionFormat::Ndjson,
            _ => SubmissionFormat::Json,
        }
    }
}

/// Multi-line content whose first line is a complete JSON value.
fn looks_like_ndjson(text: &str) -> bool {
    text.lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| serde_json::from_str::<Value>(line).is_ok())
}

/// Options for reading submission files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Force a format instead of detecting it.
    pub format: Option<SubmissionFormat>,
    /// Skip malformed lines and non-object items with a warning.
    pub skip_invalid: bool,
}

impl ReadOptions {
    pub fn with_format(mut self, format: SubmissionFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }
}

/// Streaming reader over newline-delimited JSON submissions.
pub struct NdjsonReader<R> {
    lines: std::io::Lines<R>,
    path: PathBuf,
    line: usize,
    skip_invalid: bool,
}

impl<R: BufRead> NdjsonReader<R> {
    pub fn new(reader: R, path: impl Into<PathBuf>, skip_invalid: bool) -> Self {
        Self {
            lines: reader.lines(),
            path: path.into(),
            line: 0,
            skip_invalid,
        }
    }
}

impl<R: BufRead> Iterator for NdjsonReader<R> {
    type Item = Result<Submission>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(source) => {
                    return Some(Err(IngestError::Read {
                        path: self.path.clone(),
                        source,
                    }));
                }
            };
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(submission)) => return Some(Ok(submission)),
                Ok(_) if self.skip_invalid => {
                    warn!(path = %self.path.display(), line = self.line, "skipping non-object line");
                }
                Ok(_) => {
                    return Some(Err(IngestError::NotAnObject {
                        path: self.path.clone(),
                        index: self.line,
                    }));
                }
                Err(error) if self.skip_invalid => {
                    warn!(path = %self.path.display(), line = self.line, %error, "skipping malformed line");
                }
                Err(source) => {
                    return Some(Err(IngestError::Submission {
                        path: self.path.clone(),
                        line: self.line,
                        source,
                    }));
                }
            }
        }
    }
}

fn parse_json_document(text: &str, path: &Path, options: &ReadOptions) -> Result<Vec<Submission>> {
    let value: Value = serde_json::from_str(text).map_err(|source| IngestError::Submission {
        path: path.to_path_buf(),
        line: source.line(),
        source,
    })?;
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    let mut submissions = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(submission) => submissions.push(submission),
            _ if options.skip_invalid => {
                warn!(path = %path.display(), index, "skipping non-object submission");
            }
            _ => {
                return Err(IngestError::NotAnObject {
                    path: path.to_path_buf(),
                    index,
                });
            }
        }
    }
    Ok(submissions)
}

/// Parse submissions from file content.
pub fn parse_submissions(text: &str, path: &Path, options: &ReadOptions) -> Result<Vec<Submission>> {
    let format = options
        .format
        .or_else(|| SubmissionFormat::from_path(path))
        .unwrap_or_else(|| SubmissionFormat::sniff(text));
    debug!(path = %path.display(), ?format, "parsing submissions");
    match format {
        SubmissionFormat::Json => parse_json_document(text, path, options),
        SubmissionFormat::Ndjson => {
            NdjsonReader::new(BufReader::new(text.as_bytes()), path, options.skip_invalid).collect()
        }
    }
}

/// Read every submission in one file.
pub fn read_submissions(path: &Path, options: &ReadOptions) -> Result<Vec<Submission>> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    open_file(path, options)?.collect()
}

/// Read a submission file, or every submission file of a directory in
/// filename order.
pub fn read_submission_path(path: &Path, options: &ReadOptions) -> Result<Vec<Submission>> {
    submission_stream(path, options)?.collect()
}

type FileSubmissions = Box<dyn Iterator<Item = Result<Submission>>>;

/// Submissions of a file or directory, yielded one at a time.
///
/// NDJSON files are read line by line and never held in memory whole. JSON
/// documents are parsed as a unit when their file is reached.
pub struct SubmissionStream {
    files: std::vec::IntoIter<PathBuf>,
    current: Option<FileSubmissions>,
    options: ReadOptions,
}

impl Iterator for SubmissionStream {
    type Item = Result<Submission>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = self.current.as_mut() {
                match current.next() {
                    Some(item) => return Some(item),
                    None => self.current = None,
                }
            }
            let path = self.files.next()?;
            match open_file(&path, &self.options) {
                Ok(submissions) => self.current = Some(submissions),
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

/// Stream the submissions stored at `path`: one file, or every submission
/// file of a directory in filename order.
pub fn submission_stream(path: &Path, options: &ReadOptions) -> Result<SubmissionStream> {
    let files = if path.is_dir() {
        list_submission_files(path)?
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    };
    Ok(SubmissionStream {
        files: files.into_iter(),
        current: None,
        options: options.clone(),
    })
}

fn open_file(path: &Path, options: &ReadOptions) -> Result<FileSubmissions> {
    let read_error = |source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    };
    let format = options.format.or_else(|| SubmissionFormat::from_path(path));
    if format == Some(SubmissionFormat::Ndjson) {
        debug!(path = %path.display(), "streaming ndjson submissions");
        let file = File::open(path).map_err(read_error)?;
        return Ok(Box::new(NdjsonReader::new(
            BufReader::new(file),
            path,
            options.skip_invalid,
        )));
    }
    let text = std::fs::read_to_string(path).map_err(read_error)?;
    let submissions = parse_submissions(&text, path, options)?;
    Ok(Box::new(submissions.into_iter().map(Ok)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_arrays_and_lines() {
        assert_eq!(SubmissionFormat::sniff("  [{\"a\": 1}]"), SubmissionFormat::Json);
        assert_eq!(
            SubmissionFormat::sniff("{\"a\": 1}\n{\"a\": 2}\n"),
            SubmissionFormat::Ndjson
        );
        assert_eq!(
            SubmissionFormat::sniff("{\n  \"a\": 1\n}\n"),
            SubmissionFormat::Json
        );
        assert_eq!(SubmissionFormat::sniff("{\"a\": 1}"), SubmissionFormat::Json);
    }

    #[test]
    fn ndjson_reports_the_failing_line() {
        let text = "{\"a\": 1}\n\n{broken\n";
        let error = parse_submissions(text, Path::new("x.ndjson"), &ReadOptions::default())
            .unwrap_err();
        assert!(matches!(error, IngestError::Submission { line: 3, .. }));

        let lenient = ReadOptions::default().with_skip_invalid(true);
        let submissions = parse_submissions(text, Path::new("x.ndjson"), &lenient).unwrap();
        assert_eq!(submissions.len(), 1);
    }

    #[test]
    fn single_object_document_is_one_submission() {
        let submissions =
            parse_submissions("{\"q\": \"a\"}", Path::new("one.json"), &ReadOptions::default())
                .unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0]["q"], "a");
    }

    #[test]
    fn non_objects_are_rejected_unless_skipped() {
        let text = "[{\"q\": 1}, 5]";
        let error =
            parse_submissions(text, Path::new("a.json"), &ReadOptions::default()).unwrap_err();
        assert!(matches!(error, IngestError::NotAnObject { index: 1, .. }));
        let lenient = ReadOptions::default().with_skip_invalid(true);
        assert_eq!(parse_submissions(text, Path::new("a.json"), &lenient).unwrap().len(), 1);
    }
}
