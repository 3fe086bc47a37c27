//! Turning one nested submission into one row set per table.
//!
//! Rows are built depth first. Every table with child tables numbers its rows
//! with `_index`; child rows point back with `_parent_table_name` and
//! `_parent_index`, and repeat the submission's copy values as
//! `_submission_<copy>`. The counters live in a [`FlattenState`] that spans a
//! whole export pass, so submissions must be fed in a fixed order for the
//! indices to be reproducible.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;
use survey_model::submission::SUPPLEMENTAL_KEY;
use survey_model::{
    Attachment, Cell, CopyField, Field, FieldKind, FieldOptions, Language, Section, SectionTree,
    Submission,
};
use tracing::debug;

use crate::table::{INDEX_COLUMN, PARENT_INDEX_COLUMN, PARENT_TABLE_COLUMN, Row, SUBMISSION_PREFIX};

/// Counters and caches for one export pass.
#[derive(Debug, Default)]
pub struct FlattenState {
    next_index: HashMap<String, u64>,
    copy_values: HashMap<String, IndexMap<CopyField, Cell>>,
}

impl FlattenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next row of `table` will receive. Indices start at 1.
    pub fn next_index(&self, table: &str) -> u64 {
        self.next_index.get(table).copied().unwrap_or(1)
    }

    /// Index of the most recent row of `table`, if it has numbered any.
    pub fn last_index(&self, table: &str) -> Option<u64> {
        self.next_index.get(table).map(|next| next - 1)
    }

    fn take_index(&mut self, table: &str) -> u64 {
        let next = self.next_index.entry(table.to_string()).or_insert(1);
        let index = *next;
        *next += 1;
        index
    }
}

/// Column names generated next to the field columns of `section`.
pub fn meta_columns(section: &Section, force_index: bool, copy_fields: &[CopyField]) -> Vec<String> {
    let mut columns = Vec::new();
    if section.has_children() || force_index {
        columns.push(INDEX_COLUMN.to_string());
    }
    if !section.is_root() {
        columns.push(PARENT_TABLE_COLUMN.to_string());
        columns.push(PARENT_INDEX_COLUMN.to_string());
        columns.extend(
            copy_fields
                .iter()
                .map(|copy| format!("{SUBMISSION_PREFIX}{}", copy.name())),
        );
    }
    columns
}

/// Read-only inputs of the flattener.
#[derive(Debug)]
pub struct FlattenContext<'a> {
    pub tree: &'a SectionTree,
    pub language: &'a Language,
    pub field_options: FieldOptions,
    pub force_index: bool,
    pub copy_fields: &'a [CopyField],
    /// Column names per table, in output order.
    pub columns: IndexMap<String, Vec<String>>,
}

impl<'a> FlattenContext<'a> {
    pub fn new(
        tree: &'a SectionTree,
        language: &'a Language,
        field_options: FieldOptions,
        force_index: bool,
        copy_fields: &'a [CopyField],
    ) -> Self {
        let columns = tree
            .sections()
            .map(|section| {
                let mut names: Vec<String> = section
                    .fields
                    .values()
                    .flat_map(|field| field.value_names(&field_options))
                    .collect();
                names.extend(meta_columns(section, force_index, copy_fields));
                (section.name.clone(), names)
            })
            .collect();
        Self {
            tree,
            language,
            field_options,
            force_index,
            copy_fields,
            columns,
        }
    }
}

/// What an entry inherits from its enclosing entry.
#[derive(Debug, Clone, Default)]
struct EntryScope<'s> {
    attachments: Vec<Attachment>,
    supplemental: Option<&'s Submission>,
}

impl<'s> EntryScope<'s> {
    fn for_entry(entry: &'s Submission, parent: &EntryScope<'s>) -> Self {
        let attachments = match Attachment::from_entry(entry) {
            own if own.is_empty() => parent.attachments.clone(),
            own => own,
        };
        let supplemental = match entry.get(SUPPLEMENTAL_KEY) {
            Some(Value::Object(details)) => Some(details),
            _ => parent.supplemental,
        };
        Self {
            attachments,
            supplemental,
        }
    }
}

/// Flatten one submission into rows per table name.
///
/// Tables appear in the order their first row was produced.
pub fn flatten_submission(
    context: &FlattenContext<'_>,
    state: &mut FlattenState,
    submission: &Submission,
) -> IndexMap<String, Vec<Row>> {
    let mut tables = IndexMap::new();
    flatten_entries(
        context,
        state,
        context.tree.root(),
        &[submission],
        &EntryScope::default(),
        &mut tables,
    );
    tables
}

fn flatten_entries<'s>(
    context: &FlattenContext<'_>,
    state: &mut FlattenState,
    section: &Section,
    entries: &[&'s Submission],
    parent: &EntryScope<'s>,
    tables: &mut IndexMap<String, Vec<Row>>,
) {
    for &entry in entries {
        let scope = EntryScope::for_entry(entry, parent);
        let row = build_row(context, state, section, entry, &scope);
        tables.entry(section.name.clone()).or_default().push(row);

        for child_name in &section.children {
            let Some(child) = context.tree.get(child_name) else {
                continue;
            };
            let Some(path) = child.path.as_deref() else {
                continue;
            };
            match entry.get(path) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    let nested: Vec<&Submission> = items.iter().filter_map(Value::as_object).collect();
                    if nested.len() < items.len() {
                        debug!(
                            table = %child.name,
                            skipped = items.len() - nested.len(),
                            "skipping repeat entries that are not objects"
                        );
                    }
                    flatten_entries(context, state, child, &nested, &scope, tables);
                }
                Some(_) => {
                    debug!(table = %child.name, path, "ignoring repeat value that is not a list");
                }
            }
        }
    }
}

fn raw_value<'s>(field: &Field, entry: &'s Submission, scope: &EntryScope<'s>) -> Option<&'s Value> {
    match &field.kind {
        FieldKind::Analysis { source, target } => scope
            .supplemental
            .and_then(|details| details.get(source))
            .and_then(|details| target.read(details)),
        _ => entry.get(&field.path),
    }
}

fn set(cells: &mut IndexMap<&str, Cell>, column: &str, cell: Cell) {
    if let Some(slot) = cells.get_mut(column) {
        *slot = cell;
    }
}

fn build_row(
    context: &FlattenContext<'_>,
    state: &mut FlattenState,
    section: &Section,
    entry: &Submission,
    scope: &EntryScope<'_>,
) -> Row {
    let mut cells: IndexMap<&str, Cell> = context
        .columns
        .get(&section.name)
        .into_iter()
        .flatten()
        .map(|column| (column.as_str(), Cell::blank()))
        .collect();

    let mut copies = IndexMap::new();
    for field in section.fields.values() {
        let raw = raw_value(field, entry, scope);
        let formatted = field.format(raw, context.language, &context.field_options, &scope.attachments);
        if let FieldKind::Copy(copy) = field.kind {
            if let Some(cell) = formatted.get(&field.name) {
                copies.insert(copy, cell.clone());
            }
        }
        for (name, cell) in formatted {
            set(&mut cells, &name, cell);
        }
    }
    if !copies.is_empty() {
        state.copy_values.insert(section.name.clone(), copies);
    }

    if section.has_children() || context.force_index {
        let index = state.take_index(&section.name);
        set(&mut cells, INDEX_COLUMN, Cell::Text(index.to_string()));
    }

    if let Some(parent) = &section.parent {
        set(&mut cells, PARENT_TABLE_COLUMN, Cell::text(parent.as_str()));
        let parent_index = state
            .last_index(parent)
            .map(|index| index.to_string())
            .unwrap_or_default();
        set(&mut cells, PARENT_INDEX_COLUMN, Cell::Text(parent_index));

        let ancestors = context.tree.ancestors(&section.name);
        for copy in context.copy_fields {
            let value = ancestors
                .iter()
                .find_map(|ancestor| state.copy_values.get(&ancestor.name)?.get(copy))
                .cloned()
                .unwrap_or_default();
            set(&mut cells, &format!("{SUBMISSION_PREFIX}{}", copy.name()), value);
        }
    }

    cells.into_values().collect()
}
