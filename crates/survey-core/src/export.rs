//! The export façade.
//!
//! [`Export::new`] checks the configuration and the reconciled structure up
//! front, so an export pass itself cannot fail: submissions of unknown
//! versions are counted and skipped, and unparsable values stay text.

use std::borrow::Borrow;
use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use survey_model::submission::declared_version;
use survey_model::{
    Column, ExportOptions, Field, FieldOptions, FormVersion, Language, ROOT_SECTION, Section,
    SectionTree, Submission,
};
use tracing::{debug, info, info_span, warn};

use crate::error::{ExportError, Result};
use crate::flatten::{FlattenContext, FlattenState, flatten_submission, meta_columns};
use crate::reconcile::{reconcile_fields, reconcile_sections};
use crate::table::{Row, Table, TableSet};

/// Tag columns that may be emitted as header rows.
pub const TAG_COLUMNS: [&str; 1] = ["hxl"];

/// Columns and header rows of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub name: String,
    pub columns: Vec<Column>,
    /// One row per requested tag column, aligned with `columns`.
    pub tag_rows: Vec<Vec<String>>,
}

impl TableLayout {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.label.clone()).collect()
    }
}

/// Counts reported at the end of an export pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// Submissions that produced rows.
    pub processed: usize,
    /// Submissions declaring a version nobody knows.
    pub unmatched: usize,
    /// Submissions of a known version that was not selected.
    pub filtered: usize,
    /// Row count per table.
    pub rows: IndexMap<String, usize>,
}

/// How a submission's declared version resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionMatch<'a> {
    Selected(&'a FormVersion),
    Filtered(String),
    Unmatched(String),
}

/// A configured export over one or more versions of a form.
#[derive(Debug)]
pub struct Export {
    /// Selected versions, oldest first.
    selected: Vec<FormVersion>,
    /// Supplied but not selected.
    others: Vec<FormVersion>,
    options: ExportOptions,
    language: Language,
    fields: Vec<Field>,
    tree: SectionTree,
    layouts: Vec<TableLayout>,
}

impl Export {
    /// Configure an export over `versions`, given oldest first.
    ///
    /// # Errors
    ///
    /// Fails on duplicate version identifiers, unknown requested versions,
    /// unknown tag columns, a `split_by` that names no root field, and
    /// column name collisions within a reconciled table.
    pub fn new(versions: Vec<FormVersion>, options: ExportOptions) -> Result<Self> {
        if versions.is_empty() {
            return Err(ExportError::NoVersions);
        }
        // A declared version must resolve to one version: ids and alternate
        // ids share a namespace.
        let mut seen = HashSet::new();
        for version in &versions {
            let alternate = version
                .version_id
                .as_deref()
                .filter(|alternate| *alternate != version.id);
            for identifier in std::iter::once(version.id.as_str()).chain(alternate) {
                if !seen.insert(identifier) {
                    return Err(ExportError::DuplicateVersion {
                        version: identifier.to_string(),
                    });
                }
            }
        }
        for tag in &options.tag_cols_for_header {
            if !TAG_COLUMNS.contains(&tag.as_str()) {
                return Err(ExportError::UnknownTagColumn { tag: tag.clone() });
            }
        }

        let wanted = selected_positions(&versions, options.versions.as_deref())?;
        let (selected, others): (Vec<(usize, FormVersion)>, Vec<(usize, FormVersion)>) = versions
            .into_iter()
            .enumerate()
            .partition(|(position, _)| wanted.contains(position));
        let selected: Vec<FormVersion> = selected.into_iter().map(|(_, version)| version).collect();
        let others: Vec<FormVersion> = others.into_iter().map(|(_, version)| version).collect();

        let language = match (&options.lang, selected.last()) {
            (Some(language), _) => language.clone(),
            (None, Some(newest)) => newest.default_language(),
            (None, None) => Language::default(),
        };

        let (fields, tree) = {
            let refs: Vec<&FormVersion> = selected.iter().collect();
            let allowed: HashSet<&str> = options.filter_fields.iter().map(String::as_str).collect();
            let fields = reconcile_fields(
                &refs,
                |field| allowed.is_empty() || allowed.contains(field.path.as_str()),
                &options.copy_fields,
            );
            let tree = reconcile_sections(&refs, &fields)?;
            (fields, tree)
        };

        if let Some(path) = &options.split_by {
            if !tree.root().fields.values().any(|field| &field.path == path) {
                return Err(ExportError::UnknownSplitField { path: path.clone() });
            }
        }

        let layouts = tree
            .sections()
            .map(|section| table_layout(section, &language, &options))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            versions = selected.len(),
            fields = fields.len(),
            tables = layouts.len(),
            language = %language,
            "configured export"
        );
        Ok(Self {
            selected,
            others,
            options,
            language,
            fields,
            tree,
            layouts,
        })
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Label language in effect.
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Reconciled fields, copy fields last.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn sections(&self) -> &SectionTree {
        &self.tree
    }

    /// Selected versions, oldest first.
    pub fn versions(&self) -> &[FormVersion] {
        &self.selected
    }

    pub fn layouts(&self) -> &[TableLayout] {
        &self.layouts
    }

    /// Column labels per table.
    pub fn labels(&self) -> IndexMap<String, Vec<String>> {
        self.layouts
            .iter()
            .map(|layout| (layout.name.clone(), layout.labels()))
            .collect()
    }

    /// Tag header rows per table.
    pub fn tag_rows(&self) -> IndexMap<String, Vec<Vec<String>>> {
        self.layouts
            .iter()
            .map(|layout| (layout.name.clone(), layout.tag_rows.clone()))
            .collect()
    }

    /// Column names per table.
    pub fn column_names(&self) -> IndexMap<String, Vec<String>> {
        self.layouts
            .iter()
            .map(|layout| (layout.name.clone(), layout.column_names()))
            .collect()
    }

    fn field_options(&self) -> FieldOptions {
        self.options.field_options()
    }

    /// Flattener inputs for a pass over this export.
    pub fn flatten_context(&self) -> FlattenContext<'_> {
        FlattenContext::new(
            &self.tree,
            &self.language,
            self.field_options(),
            self.options.force_index,
            &self.options.copy_fields,
        )
    }

    /// Resolve the version `submission` declares.
    ///
    /// A submission without a declared version belongs to the newest
    /// selected version.
    pub fn match_version(&self, submission: &Submission) -> VersionMatch<'_> {
        let Some(declared) = declared_version(submission) else {
            return match self.selected.last() {
                Some(newest) => VersionMatch::Selected(newest),
                None => VersionMatch::Unmatched(String::new()),
            };
        };
        if let Some(version) = self.selected.iter().find(|version| version.matches(&declared)) {
            return VersionMatch::Selected(version);
        }
        if self.others.iter().any(|version| version.matches(&declared)) {
            VersionMatch::Filtered(declared)
        } else {
            VersionMatch::Unmatched(declared)
        }
    }

    /// Run one export pass over `submissions`, in order.
    pub fn run<I>(&self, submissions: I) -> (TableSet, ExportSummary)
    where
        I: IntoIterator,
        I::Item: Borrow<Submission>,
    {
        let span = info_span!(
            "export",
            versions = self.selected.len(),
            tables = self.layouts.len()
        );
        let _guard = span.enter();

        let context = self.flatten_context();
        let mut state = FlattenState::new();
        let mut rows: IndexMap<String, Vec<Row>> = IndexMap::new();
        let mut summary = ExportSummary::default();

        for submission in submissions {
            let submission = submission.borrow();
            match self.match_version(submission) {
                VersionMatch::Selected(_) => {}
                VersionMatch::Filtered(version) => {
                    debug!(%version, "skipping submission of an unselected version");
                    summary.filtered += 1;
                    continue;
                }
                VersionMatch::Unmatched(version) => {
                    warn!(%version, id = ?submission.get("_id"), "skipping submission of an unknown version");
                    summary.unmatched += 1;
                    continue;
                }
            }
            for (table, table_rows) in flatten_submission(&context, &mut state, submission) {
                rows.entry(table).or_default().extend(table_rows);
            }
            summary.processed += 1;
        }

        let tables = TableSet {
            tables: self
                .layouts
                .iter()
                .map(|layout| Table {
                    name: layout.name.clone(),
                    columns: layout.column_names(),
                    labels: layout.labels(),
                    tag_rows: layout.tag_rows.clone(),
                    rows: rows.swap_remove(&layout.name).unwrap_or_default(),
                })
                .collect(),
        };
        summary.rows = tables.row_counts();
        info!(
            processed = summary.processed,
            unmatched = summary.unmatched,
            filtered = summary.filtered,
            "export finished"
        );
        (tables, summary)
    }

    /// Root rows grouped by the value of the `split_by` column, in order of
    /// first appearance. `None` when no split was configured.
    pub fn split_root_rows(&self, tables: &TableSet) -> Option<IndexMap<String, Vec<Row>>> {
        let path = self.options.split_by.as_deref()?;
        let field = self.tree.root().fields.values().find(|field| field.path == path)?;
        let column = field.value_names(&self.field_options()).into_iter().next()?;
        let table = tables.get(ROOT_SECTION)?;
        let index = table.column_index(&column)?;

        let mut groups: IndexMap<String, Vec<Row>> = IndexMap::new();
        for row in &table.rows {
            let key = row.get(index).map(ToString::to_string).unwrap_or_default();
            groups.entry(key).or_default().push(row.clone());
        }
        Some(groups)
    }
}

fn selected_positions(versions: &[FormVersion], requested: Option<&[String]>) -> Result<HashSet<usize>> {
    let Some(requested) = requested.filter(|requested| !requested.is_empty()) else {
        return Ok((0..versions.len()).collect());
    };
    requested
        .iter()
        .map(|wanted| {
            versions
                .iter()
                .position(|version| version.matches(wanted))
                .ok_or_else(|| ExportError::UnknownVersion {
                    version: wanted.clone(),
                })
        })
        .collect()
}

fn tag_value(field: &Field, tag_column: &str) -> String {
    let prefix = format!("{tag_column}:");
    field
        .tags
        .iter()
        .find_map(|tag| tag.strip_prefix(&prefix))
        .unwrap_or_default()
        .to_string()
}

fn table_layout(section: &Section, language: &Language, options: &ExportOptions) -> Result<TableLayout> {
    let field_options = options.field_options();
    let mut columns = Vec::new();
    let mut tag_rows: Vec<Vec<String>> = vec![Vec::new(); options.tag_cols_for_header.len()];

    for field in section.fields.values() {
        let field_columns = field.columns(
            language,
            &options.group_sep,
            options.hierarchy_in_labels,
            &field_options,
        );
        for (row, tag_column) in tag_rows.iter_mut().zip(&options.tag_cols_for_header) {
            let value = tag_value(field, tag_column);
            row.extend(std::iter::repeat_n(value, field_columns.len()));
        }
        columns.extend(field_columns);
    }

    let meta = meta_columns(section, options.force_index, &options.copy_fields);
    for row in &mut tag_rows {
        row.extend(std::iter::repeat_n(String::new(), meta.len()));
    }
    columns.extend(meta.into_iter().map(|name| Column {
        label: name.clone(),
        name,
    }));

    let mut names = HashSet::new();
    for column in &columns {
        if !names.insert(column.name.as_str()) {
            return Err(ExportError::DuplicateColumn {
                table: section.name.clone(),
                column: column.name.clone(),
            });
        }
    }

    Ok(TableLayout {
        name: section.name.clone(),
        columns,
        tag_rows,
    })
}
