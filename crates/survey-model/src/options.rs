//! Configuration options for survey export.

use serde::{Deserialize, Serialize};

use crate::field::CopyField;
use crate::labels::Language;

/// How select-multiple answers are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultipleSelectMode {
    /// One column with the translated selected options, space separated.
    Summary,
    /// One `0`/`1` column per option.
    Details,
    /// The summary column followed by the detail columns.
    #[default]
    Both,
}

impl MultipleSelectMode {
    pub fn has_summary(self) -> bool {
        matches!(self, Self::Summary | Self::Both)
    }

    pub fn has_details(self) -> bool {
        matches!(self, Self::Details | Self::Both)
    }
}

/// The subset of [`ExportOptions`] that affects individual field columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldOptions {
    pub multiple_select: MultipleSelectMode,
    /// Parse numbers and dates instead of keeping the raw text.
    pub typed_values: bool,
    /// Add a `_URL` column to media questions.
    pub include_media_url: bool,
}

/// Options controlling one export pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Label language. `None` picks the first translation of the newest
    /// selected version.
    pub lang: Option<Language>,

    /// Separator used when group names are inlined into labels.
    pub group_sep: String,

    /// Prefix labels with the labels of their enclosing groups.
    pub hierarchy_in_labels: bool,

    /// Version identifiers to include. `None` includes every version.
    pub versions: Option<Vec<String>>,

    pub multiple_select: MultipleSelectMode,

    /// Emit `_index` on tables without child tables too.
    pub force_index: bool,

    /// Synthetic submission columns appended after the schema fields.
    pub copy_fields: Vec<CopyField>,

    /// Allow-list of field paths. Empty keeps every field.
    pub filter_fields: Vec<String>,

    /// Parse numbers and dates instead of keeping the raw text.
    pub typed_values: bool,

    /// Add a `_URL` column to media questions.
    pub include_media_url: bool,

    /// Tag columns (e.g. `hxl`) to emit as extra header rows.
    pub tag_cols_for_header: Vec<String>,

    /// Field path whose values partition root rows.
    pub split_by: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            lang: None,
            group_sep: "/".to_string(),
            hierarchy_in_labels: false,
            versions: None,
            multiple_select: MultipleSelectMode::default(),
            force_index: false,
            copy_fields: Vec::new(),
            filter_fields: Vec::new(),
            typed_values: false,
            include_media_url: false,
            tag_cols_for_header: Vec::new(),
            split_by: None,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lang(mut self, lang: Language) -> Self {
        self.lang = Some(lang);
        self
    }

    pub fn with_group_sep(mut self, sep: impl Into<String>) -> Self {
        self.group_sep = sep.into();
        self
    }

    pub fn with_hierarchy_in_labels(mut self, enable: bool) -> Self {
        self.hierarchy_in_labels = enable;
        self
    }

    pub fn with_versions(mut self, versions: Vec<String>) -> Self {
        self.versions = Some(versions);
        self
    }

    pub fn with_multiple_select(mut self, mode: MultipleSelectMode) -> Self {
        self.multiple_select = mode;
        self
    }

    pub fn with_force_index(mut self, enable: bool) -> Self {
        self.force_index = enable;
        self
    }

    pub fn with_copy_fields(mut self, fields: Vec<CopyField>) -> Self {
        self.copy_fields = fields;
        self
    }

    pub fn with_filter_fields(mut self, paths: Vec<String>) -> Self {
        self.filter_fields = paths;
        self
    }

    pub fn with_typed_values(mut self, enable: bool) -> Self {
        self.typed_values = enable;
        self
    }

    pub fn with_media_url(mut self, enable: bool) -> Self {
        self.include_media_url = enable;
        self
    }

    pub fn with_tag_cols_for_header(mut self, tags: Vec<String>) -> Self {
        self.tag_cols_for_header = tags;
        self
    }

    pub fn with_split_by(mut self, path: impl Into<String>) -> Self {
        self.split_by = Some(path.into());
        self
    }

    pub fn field_options(&self) -> FieldOptions {
        FieldOptions {
            multiple_select: self.multiple_select,
            typed_values: self.typed_values,
            include_media_url: self.include_media_url,
        }
    }
}
