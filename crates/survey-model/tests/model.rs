#![allow(missing_docs)]

use serde_json::json;
use survey_model::{
    FieldKind, FieldOptions, FormVersion, Language, ModelError, MultipleSelectMode, ROOT_SECTION,
    SchemaDocument,
};

fn document() -> SchemaDocument {
    serde_json::from_value(json!({
        "versions": [
            {
                "version": "v1",
                "version_id": "vA1",
                "title": "Reading assessment",
                "translations": ["English (en)", "Swahili (sw)"],
                "survey": [
                    {"type": "start", "name": "start"},
                    {"type": "select_one yn", "name": "consent", "label": ["Consent?", "Ridhaa?"]},
                    {"type": "begin group", "name": "test", "label": ["Test", "Jaribio"]},
                    {"type": "literacy", "select_from": "words", "name": "reading"},
                    {"type": "select_multiple words", "name": "known", "or_other": true},
                    {"type": "end group"},
                    {"type": "calculate", "name": "score"}
                ],
                "choices": [
                    {"list_name": "yn", "name": "yes", "label": ["Yes", "Ndiyo"]},
                    {"list_name": "yn", "name": "no", "label": ["No", "Hapana"]},
                    {"list_name": "words", "name": "w1", "label": ["cat"]},
                    {"list_name": "words", "name": "w2", "label": ["dog"]}
                ]
            }
        ]
    }))
    .expect("document")
}

#[test]
fn builds_fields_from_a_schema_document() {
    let sources = document().into_versions();
    let version = FormVersion::from_source(&sources[0]).expect("version");

    assert!(version.matches("v1"));
    assert!(version.matches("vA1"));
    assert!(!version.matches("v2"));
    assert_eq!(
        version.default_language(),
        Language::Named("English (en)".to_string())
    );

    let kinds: Vec<(&str, &str)> = version
        .fields()
        .map(|field| (field.path.as_str(), field.data_type.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("start", "start"),
            ("consent", "select_one"),
            ("test/reading", "literacy"),
            ("test/known", "select_multiple"),
            ("score", "calculate"),
        ]
    );

    let score = version.sections.field(ROOT_SECTION, "score").expect("score");
    assert_eq!(score.kind, FieldKind::Text);
    let start = version.sections.field(ROOT_SECTION, "start").expect("start");
    assert_eq!(start.kind, FieldKind::DateTime);
}

#[test]
fn literacy_and_or_other_columns() {
    let sources = document().into_versions();
    let version = FormVersion::from_source(&sources[0]).expect("version");
    let options = FieldOptions {
        multiple_select: MultipleSelectMode::Details,
        ..FieldOptions::default()
    };

    let reading = version.sections.field(ROOT_SECTION, "reading").expect("reading");
    assert_eq!(
        reading.value_names(&options),
        vec![
            "reading_word_at_flash",
            "reading_duration",
            "reading_total_attempted",
            "reading_reserved",
            "reading/w1",
            "reading/w2",
        ]
    );

    let known = version.sections.field(ROOT_SECTION, "known").expect("known");
    let language = Language::Named("English (en)".to_string());
    let columns = known.columns(&language, "/", true, &options);
    let labels: Vec<&str> = columns.iter().map(|column| column.label.as_str()).collect();
    assert_eq!(labels, vec!["Test/known/cat", "Test/known/dog", "Test/known/Other"]);
}

#[test]
fn select_labels_switch_language() {
    let sources = document().into_versions();
    let version = FormVersion::from_source(&sources[0]).expect("version");
    let consent = version.sections.field(ROOT_SECTION, "consent").expect("consent");
    let options = FieldOptions::default();
    let raw = json!("no");

    let swahili = Language::Named("Swahili (sw)".to_string());
    assert_eq!(consent.format(Some(&raw), &swahili, &options, &[])["consent"], "Hapana");
    assert_eq!(consent.format(Some(&raw), &Language::Xml, &options, &[])["consent"], "no");
    assert_eq!(
        consent.labels(&swahili, "/", false, &options),
        vec!["Ridhaa?"]
    );
}

#[test]
fn too_many_labels_is_a_structural_error() {
    let source = serde_json::from_value(json!({
        "version": "v1",
        "survey": [{"type": "text", "name": "q", "label": ["one", "two"]}]
    }))
    .expect("source");
    assert!(matches!(
        FormVersion::from_source(&source),
        Err(ModelError::LabelCountMismatch { expected: 1, actual: 2, .. })
    ));
}

#[test]
fn duplicate_names_in_one_section_fail() {
    let source = serde_json::from_value(json!({
        "version": "v1",
        "survey": [
            {"type": "text", "name": "q"},
            {"type": "begin_group", "name": "g"},
            {"type": "integer", "name": "q"},
            {"type": "end_group"}
        ]
    }))
    .expect("source");
    assert!(matches!(
        FormVersion::from_source(&source),
        Err(ModelError::DuplicateField { .. })
    ));
}
