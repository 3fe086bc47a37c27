//! Survey form data model.
//!
//! This crate holds everything the export engine knows about a form:
//!
//! - **field**: the closed set of question kinds, their columns and value formatting
//! - **choice**: option lists referenced by select questions
//! - **section**: the table tree (root table plus one table per repeat)
//! - **version**: one immutable form version built from a normalized schema
//! - **source**: the normalized schema input format
//! - **normalization**: numeric, date, and GPS value parsing
//! - **options**: export configuration

pub mod cell;
pub mod choice;
pub mod error;
pub mod field;
pub mod labels;
pub mod normalization;
pub mod options;
pub mod section;
pub mod source;
pub mod submission;
pub mod version;

pub use cell::Cell;
pub use choice::Choice;
pub use error::{ModelError, Result};
pub use field::{AnalysisTarget, Column, CopyField, Field, FieldKind, HierarchyNode};
pub use labels::{Labels, Language};
pub use options::{ExportOptions, FieldOptions, MultipleSelectMode};
pub use section::{ROOT_SECTION, Section, SectionTree};
pub use source::{ChoiceSource, FieldSource, SchemaDocument, VersionSource};
pub use submission::{Attachment, Submission};
pub use version::FormVersion;
