//! Invariants of export passes over generated submissions.

use proptest::prelude::*;
use serde_json::{Value, json};
use survey_core::Export;
use survey_model::{ExportOptions, FormVersion, Submission, VersionSource};

fn nested_form() -> FormVersion {
    let source: VersionSource = serde_json::from_value(json!({
        "version": "v1",
        "survey": [
            {"type": "text", "name": "q"},
            {"type": "begin_repeat", "name": "outer"},
            {"type": "integer", "name": "n"},
            {"type": "begin_repeat", "name": "inner"},
            {"type": "text", "name": "leaf"},
            {"type": "end_repeat"},
            {"type": "end_repeat"}
        ]
    }))
    .expect("schema");
    FormVersion::from_source(&source).expect("version")
}

/// A submission with `shape[i]` inner entries under the i-th outer entry.
fn submission(shape: &[usize]) -> Submission {
    let outer: Vec<Value> = shape
        .iter()
        .enumerate()
        .map(|(i, inner)| {
            let leaves: Vec<Value> = (0..*inner)
                .map(|j| json!({"outer/inner/leaf": format!("{i}-{j}")}))
                .collect();
            json!({"outer/n": i, "outer/inner": leaves})
        })
        .collect();
    let mut map = Submission::new();
    map.insert("q".to_string(), json!("x"));
    map.insert("outer".to_string(), Value::Array(outer));
    map
}

fn numbers(values: Vec<&survey_model::Cell>) -> Vec<u64> {
    values
        .into_iter()
        .map(|cell| cell.to_string().parse().expect("index"))
        .collect()
}

proptest! {
    #[test]
    fn indices_increase_and_parents_exist(
        shapes in prop::collection::vec(prop::collection::vec(0usize..4, 0..4), 0..6)
    ) {
        let export = Export::new(vec![nested_form()], ExportOptions::default()).expect("export");
        let data: Vec<Submission> = shapes.iter().map(|shape| submission(shape)).collect();
        let (tables, summary) = export.run(&data);
        prop_assert_eq!(summary.processed, shapes.len());

        let root = tables.get("submissions").expect("root");
        let outer = tables.get("outer").expect("outer");
        let inner = tables.get("inner").expect("inner");

        let root_index = numbers(root.column_values("_index"));
        prop_assert_eq!(root_index, (1..=shapes.len() as u64).collect::<Vec<_>>());

        let outer_count: usize = shapes.iter().map(Vec::len).sum();
        let outer_index = numbers(outer.column_values("_index"));
        prop_assert_eq!(outer_index.clone(), (1..=outer_count as u64).collect::<Vec<_>>());

        let inner_count: usize = shapes.iter().flatten().sum();
        prop_assert_eq!(inner.rows.len(), inner_count);

        // Every child row points at an existing parent row, never backwards.
        let outer_parents = numbers(outer.column_values("_parent_index"));
        prop_assert!(outer_parents.windows(2).all(|pair| pair[0] <= pair[1]));
        prop_assert!(outer_parents.iter().all(|parent| (1..=shapes.len() as u64).contains(parent)));
        let inner_parents = numbers(inner.column_values("_parent_index"));
        prop_assert!(inner_parents.windows(2).all(|pair| pair[0] <= pair[1]));
        prop_assert!(inner_parents.iter().all(|parent| outer_index.contains(parent)));
    }
}
