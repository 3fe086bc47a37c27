//! Merging the fields of several form versions into one canonical superset.
//!
//! The newest version decides the order. Fields that only older versions
//! know are slotted next to the position they held in their own version, so
//! a removed question stays close to its former neighbours.

use std::collections::HashMap;
use std::sync::Arc;

use survey_model::{CopyField, Field, FormVersion, SectionTree};
use tracing::debug;

use crate::error::Result;

type FieldKey = (String, String);

fn key(field: &Field) -> FieldKey {
    (field.section.clone(), field.name.clone())
}

/// Reconcile the fields of `versions`, given oldest first.
///
/// Fields rejected by `keep` are dropped; `copy_fields` are appended last,
/// unfiltered, in the order given.
pub fn reconcile_fields<F>(versions: &[&FormVersion], keep: F, copy_fields: &[CopyField]) -> Vec<Field>
where
    F: Fn(&Field) -> bool,
{
    let mut rows: Vec<Vec<Field>> = Vec::new();
    let mut positions: HashMap<FieldKey, (usize, usize)> = HashMap::new();
    // Non-leading entries in the order they were first seen.
    let mut extras: Vec<(usize, usize)> = Vec::new();

    let mut newest_first = versions.iter().rev();
    if let Some(newest) = newest_first.next() {
        for field in newest.fields().filter(|field| !field.is_copy()) {
            positions.insert(key(field), (rows.len(), 0));
            rows.push(vec![field.clone()]);
        }
    }

    for version in newest_first {
        for (index, field) in version.fields().filter(|field| !field.is_copy()).enumerate() {
            if let Some(&(row, column)) = positions.get(&key(field)) {
                merge_choices(&mut rows[row][column], field);
                continue;
            }
            debug!(version = %version.id, field = %field.path, "keeping field removed in a newer version");
            if index < rows.len() {
                rows[index].push(field.clone());
                let position = (index, rows[index].len() - 1);
                positions.insert(key(field), position);
                extras.push(position);
            } else {
                positions.insert(key(field), (rows.len(), 0));
                rows.push(vec![field.clone()]);
            }
        }
    }

    let mut fields: Vec<Field> = rows
        .iter()
        .filter_map(|row| row.first())
        .filter(|field| keep(field))
        .cloned()
        .collect();
    fields.extend(
        extras
            .iter()
            .map(|&(row, column)| &rows[row][column])
            .filter(|field| keep(field))
            .cloned(),
    );
    fields.extend(copy_fields.iter().map(|copy| Field::copy(*copy)));
    fields
}

/// Give `kept` the union of its options and those of `older`.
fn merge_choices(kept: &mut Field, older: &Field) {
    let (Some(newer), Some(older)) = (kept.kind.choice(), older.kind.choice()) else {
        return;
    };
    if Arc::ptr_eq(newer, older) {
        return;
    }
    let merged = newer.merged_with_older(older);
    if merged != **newer {
        *kept = kept.with_choice(Arc::new(merged));
    }
}

/// Group reconciled `fields` into a section tree.
///
/// The section set is the union over all versions; sections are created
/// newest version first, so child order follows the newest version.
pub fn reconcile_sections(versions: &[&FormVersion], fields: &[Field]) -> Result<SectionTree> {
    let mut tree = SectionTree::new();
    for version in versions.iter().rev() {
        for section in version.sections.sections() {
            if section.is_root() || tree.contains(&section.name) {
                continue;
            }
            let parent = section.parent.as_deref().unwrap_or(survey_model::ROOT_SECTION);
            let path = section.path.as_deref().unwrap_or(&section.name);
            tree.add_child(parent, &section.name, path)?;
        }
    }
    for field in fields {
        tree.add_field(field.clone())?;
    }
    Ok(tree)
}
