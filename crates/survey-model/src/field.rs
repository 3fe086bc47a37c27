//! Survey fields: the columns a question produces and how its answers are formatted.
//!
//! The set of question kinds is closed. Every kind answers three questions
//! through one column layout so names and labels always line up:
//!
//! - which columns (value names) it owns,
//! - which label each column carries in a given language,
//! - how a raw answer becomes one cell per column.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cell::Cell;
use crate::choice::Choice;
use crate::labels::{Labels, Language};
use crate::normalization::{parse_date, parse_datetime, parse_finite, split_gps};
use crate::options::FieldOptions;
use crate::section::ROOT_SECTION;
use crate::submission::{Attachment, value_to_text};

/// Value written to a media `_URL` column when the attachment was deleted.
pub const DELETED_ATTACHMENT: &str = "Deleted";

/// Attachment name holding the audit log of a submission.
pub const AUDIT_FILENAME: &str = "audit.csv";

/// Positional parameters leading a literacy test answer.
pub const LITERACY_PARAMETERS: [&str; 4] =
    ["word_at_flash", "duration", "total_attempted", "reserved"];

/// One element of a field's hierarchy: the root section, a group or repeat, or the field itself.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    pub name: String,
    pub labels: Labels,
}

impl HierarchyNode {
    pub fn new(name: impl Into<String>, labels: Labels) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }
}

/// Synthetic submission metadata columns not declared in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CopyField {
    #[serde(rename = "_id")]
    Id,
    #[serde(rename = "_uuid")]
    Uuid,
    #[serde(rename = "_submission_time")]
    SubmissionTime,
    #[serde(rename = "_validation_status")]
    ValidationStatus,
    #[serde(rename = "_notes")]
    Notes,
    #[serde(rename = "_tags")]
    Tags,
    #[serde(rename = "_submitted_by")]
    SubmittedBy,
    #[serde(rename = "__version__")]
    Version,
    #[serde(rename = "_status")]
    Status,
}

impl CopyField {
    pub const ALL: [CopyField; 9] = [
        CopyField::Id,
        CopyField::Uuid,
        CopyField::SubmissionTime,
        CopyField::ValidationStatus,
        CopyField::Notes,
        CopyField::Tags,
        CopyField::SubmittedBy,
        CopyField::Version,
        CopyField::Status,
    ];

    /// Column name, which is also the submission key the value is read from.
    pub fn name(self) -> &'static str {
        match self {
            CopyField::Id => "_id",
            CopyField::Uuid => "_uuid",
            CopyField::SubmissionTime => "_submission_time",
            CopyField::ValidationStatus => "_validation_status",
            CopyField::Notes => "_notes",
            CopyField::Tags => "_tags",
            CopyField::SubmittedBy => "_submitted_by",
            CopyField::Version => "__version__",
            CopyField::Status => "_status",
        }
    }

    fn format(self, raw: &Value, language: &Language, options: &FieldOptions) -> Cell {
        match self {
            CopyField::Id
            | CopyField::Uuid
            | CopyField::SubmittedBy
            | CopyField::Version
            | CopyField::Status => Cell::Text(value_to_text(raw)),
            CopyField::SubmissionTime => {
                let text = value_to_text(raw);
                match parse_datetime(&text).filter(|_| options.typed_values) {
                    Some(datetime) => Cell::DateTime(datetime),
                    None => Cell::Text(text),
                }
            }
            CopyField::ValidationStatus => match raw {
                Value::Object(status) => {
                    let uid = status.get("uid").map(value_to_text).unwrap_or_default();
                    if language.is_xml() {
                        return Cell::Text(uid);
                    }
                    let label = status.get("label").map(value_to_text).unwrap_or_default();
                    Cell::Text(if label.is_empty() { uid } else { label })
                }
                other => Cell::Text(value_to_text(other)),
            },
            CopyField::Notes => match raw {
                Value::Array(notes) => Cell::Text(
                    notes
                        .iter()
                        .map(|note| match note {
                            Value::Object(object) => {
                                object.get("note").map(value_to_text).unwrap_or_default()
                            }
                            other => value_to_text(other),
                        })
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                other => Cell::Text(value_to_text(other)),
            },
            CopyField::Tags => match raw {
                Value::Array(tags) => Cell::Text(
                    tags.iter()
                        .map(value_to_text)
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                other => Cell::Text(value_to_text(other)),
            },
        }
    }
}

impl fmt::Display for CopyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CopyField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        CopyField::ALL
            .into_iter()
            .find(|field| field.name() == trimmed || field.name().trim_start_matches('_') == trimmed)
            .ok_or_else(|| format!("Unknown copy field: {s}"))
    }
}

/// What an analysis column reads from the supplemental details of its source question.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisTarget {
    /// `transcript.value`
    Transcript,
    /// `translation.<language>.value`
    Translation { language: String },
    /// The `val` of the `qual` response whose `uuid` matches.
    Qualitative {
        response_id: String,
        choices: Option<Arc<Choice>>,
    },
}

impl AnalysisTarget {
    /// Locate this target inside the details recorded for one source question.
    pub fn read<'a>(&self, details: &'a Value) -> Option<&'a Value> {
        match self {
            AnalysisTarget::Transcript => details.get("transcript")?.get("value"),
            AnalysisTarget::Translation { language } => {
                details.get("translation")?.get(language)?.get("value")
            }
            AnalysisTarget::Qualitative { response_id, .. } => details
                .get("qual")?
                .as_array()?
                .iter()
                .find(|response| {
                    response.get("uuid").and_then(Value::as_str) == Some(response_id.as_str())
                })?
                .get("val"),
        }
    }
}

/// The closed set of question kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Numeric,
    Date,
    DateTime,
    Gps,
    SelectOne {
        choice: Arc<Choice>,
    },
    SelectMultiple {
        choice: Arc<Choice>,
        or_other: bool,
    },
    Media,
    Audit,
    LiteracyTest {
        choice: Arc<Choice>,
    },
    Analysis {
        source: String,
        target: AnalysisTarget,
    },
    Copy(CopyField),
}

impl FieldKind {
    /// Option list of select-like kinds.
    pub fn choice(&self) -> Option<&Arc<Choice>> {
        match self {
            FieldKind::SelectOne { choice }
            | FieldKind::SelectMultiple { choice, .. }
            | FieldKind::LiteracyTest { choice } => Some(choice),
            FieldKind::Analysis {
                target: AnalysisTarget::Qualitative { choices, .. },
                ..
            } => choices.as_ref(),
            _ => None,
        }
    }

    /// Same kind with its option list replaced.
    pub fn with_choice(&self, replacement: Arc<Choice>) -> FieldKind {
        let mut kind = self.clone();
        match &mut kind {
            FieldKind::SelectOne { choice }
            | FieldKind::SelectMultiple { choice, .. }
            | FieldKind::LiteracyTest { choice } => *choice = replacement,
            FieldKind::Analysis {
                target: AnalysisTarget::Qualitative { choices, .. },
                ..
            } => *choices = Some(replacement),
            _ => {}
        }
        kind
    }
}

/// One output column: its identifier and display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub label: String,
}

/// How a column label derives from the field's base label.
enum LabelPart {
    Base,
    Suffix(&'static str),
    Option(String),
    Other,
}

/// A survey question, or a synthetic copy column.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Names of `hierarchy[1..]` joined with `/`.
    pub path: String,
    /// Source type tag, e.g. `select_multiple`.
    pub data_type: String,
    pub labels: Labels,
    pub tags: Vec<String>,
    /// Name of the owning section.
    pub section: String,
    /// Root section, enclosing groups and repeats, then the field itself.
    pub hierarchy: Vec<HierarchyNode>,
    pub kind: FieldKind,
}

impl Field {
    /// Build a field below `ancestors` (root first, enclosing group last).
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<String>,
        kind: FieldKind,
        labels: Labels,
        ancestors: &[HierarchyNode],
        section: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let mut hierarchy = ancestors.to_vec();
        hierarchy.push(HierarchyNode::new(name.clone(), labels.clone()));
        let path = hierarchy
            .iter()
            .skip(1)
            .map(|node| node.name.as_str())
            .collect::<Vec<_>>()
            .join("/");
        Self {
            name,
            path,
            data_type: data_type.into(),
            labels,
            tags: Vec::new(),
            section: section.into(),
            hierarchy,
            kind,
        }
    }

    /// Synthetic copy column owned by the root section.
    pub fn copy(copy: CopyField) -> Self {
        let root = HierarchyNode::new(ROOT_SECTION, Labels::new());
        Field::new(
            copy.name(),
            copy.name(),
            FieldKind::Copy(copy),
            Labels::new(),
            &[root],
            ROOT_SECTION,
        )
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn is_copy(&self) -> bool {
        matches!(self.kind, FieldKind::Copy(_))
    }

    /// Same field with a different option list; everything else is kept.
    pub fn with_choice(&self, choice: Arc<Choice>) -> Field {
        Field {
            kind: self.kind.with_choice(choice),
            ..self.clone()
        }
    }

    fn layout(&self, options: &FieldOptions) -> Vec<(String, LabelPart)> {
        let name = &self.name;
        match &self.kind {
            FieldKind::Gps => vec![
                (name.clone(), LabelPart::Base),
                (format!("{name}_lat"), LabelPart::Suffix("_lat")),
                (format!("{name}_lon"), LabelPart::Suffix("_lon")),
                (format!("{name}_alt"), LabelPart::Suffix("_alt")),
                (format!("{name}_precision"), LabelPart::Suffix("_precision")),
            ],
            FieldKind::SelectMultiple { choice, or_other } => {
                self.multiple_layout(choice, *or_other, options)
            }
            FieldKind::LiteracyTest { choice } => {
                let mut layout = vec![
                    (format!("{name}_word_at_flash"), LabelPart::Suffix("_word_at_flash")),
                    (format!("{name}_duration"), LabelPart::Suffix("_duration")),
                    (format!("{name}_total_attempted"), LabelPart::Suffix("_total_attempted")),
                    (format!("{name}_reserved"), LabelPart::Suffix("_reserved")),
                ];
                layout.extend(self.multiple_layout(choice, false, options));
                layout
            }
            FieldKind::Media if options.include_media_url => vec![
                (name.clone(), LabelPart::Base),
                (format!("{name}_URL"), LabelPart::Suffix("_URL")),
            ],
            _ => vec![(name.clone(), LabelPart::Base)],
        }
    }

    fn multiple_layout(
        &self,
        choice: &Choice,
        or_other: bool,
        options: &FieldOptions,
    ) -> Vec<(String, LabelPart)> {
        let name = &self.name;
        let mut layout = Vec::new();
        if options.multiple_select.has_summary() {
            layout.push((name.clone(), LabelPart::Base));
        }
        if options.multiple_select.has_details() {
            for option in choice.option_names() {
                layout.push((format!("{name}/{option}"), LabelPart::Option(option.to_string())));
            }
            if or_other && !choice.contains("other") {
                layout.push((format!("{name}/other"), LabelPart::Other));
            }
        }
        layout
    }

    /// Column identifiers this field owns, in output order.
    pub fn value_names(&self, options: &FieldOptions) -> Vec<String> {
        self.layout(options).into_iter().map(|(name, _)| name).collect()
    }

    /// Label of the field itself, optionally prefixed by its group labels.
    pub fn base_label(&self, language: &Language, group_sep: &str, hierarchy_in_labels: bool) -> String {
        if hierarchy_in_labels {
            self.hierarchy
                .iter()
                .skip(1)
                .map(|node| node.labels.resolve(language, &node.name))
                .collect::<Vec<_>>()
                .join(group_sep)
        } else {
            self.labels.resolve(language, &self.name).to_string()
        }
    }

    /// Value names paired with their labels.
    pub fn columns(
        &self,
        language: &Language,
        group_sep: &str,
        hierarchy_in_labels: bool,
        options: &FieldOptions,
    ) -> Vec<Column> {
        let base = self.base_label(language, group_sep, hierarchy_in_labels);
        let choice = self.kind.choice();
        self.layout(options)
            .into_iter()
            .map(|(name, part)| {
                let label = match part {
                    LabelPart::Base => base.clone(),
                    LabelPart::Suffix(suffix) => format!("{base}{suffix}"),
                    LabelPart::Option(option) => {
                        let option_label = choice
                            .map(|choice| choice.display(&option, language).to_string())
                            .unwrap_or(option);
                        format!("{base}{group_sep}{option_label}")
                    }
                    LabelPart::Other => format!("{base}{group_sep}Other"),
                };
                Column { name, label }
            })
            .collect()
    }

    /// Column labels, aligned with [`Field::value_names`].
    pub fn labels(
        &self,
        language: &Language,
        group_sep: &str,
        hierarchy_in_labels: bool,
        options: &FieldOptions,
    ) -> Vec<String> {
        self.columns(language, group_sep, hierarchy_in_labels, options)
            .into_iter()
            .map(|column| column.label)
            .collect()
    }

    /// Format one raw answer into a cell per value name.
    ///
    /// Never fails: values that do not parse are kept as text, and an absent
    /// answer yields blanks for every column.
    pub fn format(
        &self,
        raw: Option<&Value>,
        language: &Language,
        options: &FieldOptions,
        attachments: &[Attachment],
    ) -> IndexMap<String, Cell> {
        let mut cells: IndexMap<String, Cell> = self
            .value_names(options)
            .into_iter()
            .map(|name| (name, Cell::blank()))
            .collect();

        let raw = raw.filter(|value| !value.is_null());
        let Some(raw) = raw else {
            if matches!(self.kind, FieldKind::Audit) {
                if let Some(url) = audit_url(attachments) {
                    cells.insert(self.name.clone(), Cell::Text(url));
                }
            }
            return cells;
        };

        let name = &self.name;
        match &self.kind {
            FieldKind::Text => {
                cells.insert(name.clone(), Cell::Text(value_to_text(raw)));
            }
            FieldKind::Numeric => {
                let text = value_to_text(raw);
                let cell = match parse_finite(&text).filter(|_| options.typed_values) {
                    Some(number) => Cell::Number(number),
                    None => Cell::Text(text),
                };
                cells.insert(name.clone(), cell);
            }
            FieldKind::Date => {
                let text = value_to_text(raw);
                let cell = match parse_date(&text).filter(|_| options.typed_values) {
                    Some(date) => Cell::Date(date),
                    None => Cell::Text(text),
                };
                cells.insert(name.clone(), cell);
            }
            FieldKind::DateTime => {
                let text = value_to_text(raw);
                let cell = match parse_datetime(&text).filter(|_| options.typed_values) {
                    Some(datetime) => Cell::DateTime(datetime),
                    None => Cell::Text(text),
                };
                cells.insert(name.clone(), cell);
            }
            FieldKind::Gps => {
                let text = value_to_text(raw);
                let parts = split_gps(&text);
                cells.insert(format!("{name}_lat"), Cell::Text(parts.latitude));
                cells.insert(format!("{name}_lon"), Cell::Text(parts.longitude));
                cells.insert(format!("{name}_alt"), Cell::Text(parts.altitude));
                cells.insert(format!("{name}_precision"), Cell::Text(parts.precision));
                cells.insert(name.clone(), Cell::Text(text));
            }
            FieldKind::SelectOne { choice } => {
                let text = value_to_text(raw);
                let option = text.trim();
                cells.insert(name.clone(), Cell::text(choice.display(option, language)));
            }
            FieldKind::SelectMultiple { choice, or_other } => {
                let text = value_to_text(raw);
                let tokens: Vec<&str> = text.split_whitespace().collect();
                self.format_multiple(&tokens, choice, *or_other, language, options, &mut cells);
            }
            FieldKind::LiteracyTest { choice } => {
                let text = value_to_text(raw);
                let tokens: Vec<&str> = text.split_whitespace().collect();
                let split = tokens.len().min(LITERACY_PARAMETERS.len());
                for (parameter, token) in LITERACY_PARAMETERS.iter().zip(&tokens[..split]) {
                    cells.insert(format!("{name}_{parameter}"), Cell::text(*token));
                }
                self.format_multiple(&tokens[split..], choice, false, language, options, &mut cells);
            }
            FieldKind::Media => {
                let text = value_to_text(raw);
                if options.include_media_url {
                    let url = attachments
                        .iter()
                        .find(|attachment| attachment.matches(&text))
                        .map(attachment_url)
                        .unwrap_or_default();
                    cells.insert(format!("{name}_URL"), Cell::Text(url));
                }
                cells.insert(name.clone(), Cell::Text(text));
            }
            FieldKind::Audit => {
                let text = value_to_text(raw);
                let value = if text.is_empty() {
                    audit_url(attachments).unwrap_or_default()
                } else {
                    text
                };
                cells.insert(name.clone(), Cell::Text(value));
            }
            FieldKind::Analysis { target, .. } => {
                let choices = match target {
                    AnalysisTarget::Qualitative { choices, .. } => choices.as_deref(),
                    _ => None,
                };
                cells.insert(name.clone(), Cell::Text(analysis_text(raw, choices, language)));
            }
            FieldKind::Copy(copy) => {
                cells.insert(name.clone(), copy.format(raw, language, options));
            }
        }
        cells
    }

    fn format_multiple(
        &self,
        tokens: &[&str],
        choice: &Choice,
        or_other: bool,
        language: &Language,
        options: &FieldOptions,
        cells: &mut IndexMap<String, Cell>,
    ) {
        let name = &self.name;
        if options.multiple_select.has_summary() {
            let summary = tokens
                .iter()
                .map(|token| choice.display(token, language))
                .collect::<Vec<_>>()
                .join(" ");
            cells.insert(name.clone(), Cell::Text(summary));
        }
        if options.multiple_select.has_details() {
            for option in choice.option_names() {
                let flag = if tokens.contains(&option) { "1" } else { "0" };
                cells.insert(format!("{name}/{option}"), Cell::text(flag));
            }
            if or_other && !choice.contains("other") {
                let flag = if tokens.contains(&"other") { "1" } else { "0" };
                cells.insert(format!("{name}/other"), Cell::text(flag));
            }
        }
    }
}

fn attachment_url(attachment: &Attachment) -> String {
    if attachment.is_deleted {
        DELETED_ATTACHMENT.to_string()
    } else {
        attachment.download_url.clone()
    }
}

fn audit_url(attachments: &[Attachment]) -> Option<String> {
    attachments
        .iter()
        .find(|attachment| attachment.basename() == AUDIT_FILENAME)
        .map(attachment_url)
}

fn analysis_text(raw: &Value, choices: Option<&Choice>, language: &Language) -> String {
    let render = |value: &Value| match (value, choices) {
        (Value::String(option), Some(choice)) => choice.display(option, language).to_string(),
        (other, _) => value_to_text(other),
    };
    match raw {
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        other => render(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MultipleSelectMode;
    use serde_json::json;

    fn root() -> Vec<HierarchyNode> {
        vec![HierarchyNode::new(ROOT_SECTION, Labels::new())]
    }

    fn choice(options: &[(&str, &str)]) -> Arc<Choice> {
        let mut choice = Choice::new("list");
        for (name, label) in options {
            choice.add_option(*name, Labels::untranslated(*label));
        }
        Arc::new(choice)
    }

    fn field(name: &str, kind: FieldKind) -> Field {
        Field::new(name, "test", kind, Labels::untranslated(name.to_uppercase()), &root(), ROOT_SECTION)
    }

    fn texts(cells: &IndexMap<String, Cell>) -> Vec<(String, String)> {
        cells
            .iter()
            .map(|(name, cell)| (name.clone(), cell.to_string()))
            .collect()
    }

    #[test]
    fn gps_splits_into_five_columns() {
        let gps = field("loc", FieldKind::Gps);
        let options = FieldOptions::default();
        let cells = gps.format(Some(&json!("1 2 3 4")), &Language::Untranslated, &options, &[]);
        assert_eq!(
            texts(&cells),
            vec![
                ("loc".to_string(), "1 2 3 4".to_string()),
                ("loc_lat".to_string(), "1".to_string()),
                ("loc_lon".to_string(), "2".to_string()),
                ("loc_alt".to_string(), "3".to_string()),
                ("loc_precision".to_string(), "4".to_string()),
            ]
        );

        let cells = gps.format(Some(&json!("1 2")), &Language::Untranslated, &options, &[]);
        assert_eq!(cells["loc_alt"], "");
        assert_eq!(cells["loc_precision"], "");
        assert_eq!(cells.len(), 5);
    }

    #[test]
    fn multiple_select_both_mode() {
        let select = field(
            "name",
            FieldKind::SelectMultiple {
                choice: choice(&[("a", "Apple"), ("b", "Banana")]),
                or_other: false,
            },
        );
        let options = FieldOptions {
            multiple_select: MultipleSelectMode::Both,
            ..FieldOptions::default()
        };
        let cells = select.format(Some(&json!("a")), &Language::Xml, &options, &[]);
        assert_eq!(
            texts(&cells),
            vec![
                ("name".to_string(), "a".to_string()),
                ("name/a".to_string(), "1".to_string()),
                ("name/b".to_string(), "0".to_string()),
            ]
        );

        let translated = select.format(Some(&json!("a b")), &Language::Untranslated, &options, &[]);
        assert_eq!(translated["name"], "Apple Banana");
    }

    #[test]
    fn multiple_select_missing_differs_from_empty() {
        let select = field(
            "fruit",
            FieldKind::SelectMultiple {
                choice: choice(&[("a", "Apple"), ("b", "Banana")]),
                or_other: true,
            },
        );
        let options = FieldOptions {
            multiple_select: MultipleSelectMode::Details,
            ..FieldOptions::default()
        };
        let missing = select.format(None, &Language::Untranslated, &options, &[]);
        assert!(missing.values().all(Cell::is_blank));
        assert_eq!(missing.len(), 3);

        let none_selected = select.format(Some(&json!("")), &Language::Untranslated, &options, &[]);
        assert_eq!(
            texts(&none_selected),
            vec![
                ("fruit/a".to_string(), "0".to_string()),
                ("fruit/b".to_string(), "0".to_string()),
                ("fruit/other".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn multiple_select_summary_mode_has_one_column() {
        let select = field(
            "fruit",
            FieldKind::SelectMultiple {
                choice: choice(&[("a", "Apple"), ("b", "Banana")]),
                or_other: true,
            },
        );
        let options = FieldOptions {
            multiple_select: MultipleSelectMode::Summary,
            ..FieldOptions::default()
        };
        assert_eq!(select.value_names(&options), vec!["fruit"]);
        assert_eq!(
            select.labels(&Language::Untranslated, "/", false, &options),
            vec!["FRUIT"]
        );

        let cells = select.format(Some(&json!("b a")), &Language::Untranslated, &options, &[]);
        assert_eq!(
            texts(&cells),
            vec![("fruit".to_string(), "Banana Apple".to_string())]
        );
        let names = select.format(Some(&json!("b a")), &Language::Xml, &options, &[]);
        assert_eq!(names["fruit"], "b a");
    }

    #[test]
    fn labels_align_with_value_names() {
        let select = field(
            "fruit",
            FieldKind::SelectMultiple {
                choice: choice(&[("a", "Apple")]),
                or_other: true,
            },
        );
        let options = FieldOptions::default();
        let names = select.value_names(&options);
        let labels = select.labels(&Language::Untranslated, "/", false, &options);
        assert_eq!(names, vec!["fruit", "fruit/a", "fruit/other"]);
        assert_eq!(labels, vec!["FRUIT", "FRUIT/Apple", "FRUIT/Other"]);
    }

    #[test]
    fn hierarchy_labels_fall_back_per_ancestor() {
        let mut ancestors = root();
        ancestors.push(HierarchyNode::new("household", Labels::untranslated("Household")));
        ancestors.push(HierarchyNode::new("member", Labels::new()));
        let age = Field::new(
            "age",
            "integer",
            FieldKind::Numeric,
            Labels::untranslated("Age"),
            &ancestors,
            "member",
        );
        assert_eq!(age.path, "household/member/age");
        assert_eq!(
            age.base_label(&Language::Untranslated, " > ", true),
            "Household > member > Age"
        );
        assert_eq!(age.base_label(&Language::Untranslated, " > ", false), "Age");
        assert_eq!(age.base_label(&Language::Xml, "/", true), "household/member/age");
    }

    #[test]
    fn numeric_degrades_to_raw_text() {
        let number = field("n", FieldKind::Numeric);
        let typed = FieldOptions {
            typed_values: true,
            ..FieldOptions::default()
        };
        let lang = Language::Untranslated;
        assert_eq!(number.format(Some(&json!("12.5")), &lang, &typed, &[])["n"], Cell::Number(12.5));
        assert_eq!(number.format(Some(&json!("twelve")), &lang, &typed, &[])["n"], "twelve");
        assert_eq!(number.format(Some(&json!("inf")), &lang, &typed, &[])["n"], "inf");
        let untyped = FieldOptions::default();
        assert_eq!(number.format(Some(&json!("12.5")), &lang, &untyped, &[])["n"], "12.5");
    }

    #[test]
    fn select_one_translates_known_options() {
        let select = field("color", FieldKind::SelectOne { choice: choice(&[("r", "Red")]) });
        let options = FieldOptions::default();
        let lang = Language::Untranslated;
        assert_eq!(select.format(Some(&json!("r")), &lang, &options, &[])["color"], "Red");
        assert_eq!(select.format(Some(&json!("g")), &lang, &options, &[])["color"], "g");
    }

    #[test]
    fn media_url_lookup() {
        let photo = field("photo", FieldKind::Media);
        let options = FieldOptions {
            include_media_url: true,
            ..FieldOptions::default()
        };
        let attachments = vec![
            Attachment {
                filename: "u/attachments/1/cat.jpg".to_string(),
                download_url: "https://files/cat.jpg".to_string(),
                is_deleted: false,
            },
            Attachment {
                filename: "u/attachments/1/dog.jpg".to_string(),
                download_url: "https://files/dog.jpg".to_string(),
                is_deleted: true,
            },
        ];
        let lang = Language::Untranslated;
        let cat = photo.format(Some(&json!("cat.jpg")), &lang, &options, &attachments);
        assert_eq!(cat["photo_URL"], "https://files/cat.jpg");
        let dog = photo.format(Some(&json!("dog.jpg")), &lang, &options, &attachments);
        assert_eq!(dog["photo_URL"], DELETED_ATTACHMENT);
        let fish = photo.format(Some(&json!("fish.jpg")), &lang, &options, &attachments);
        assert_eq!(fish["photo_URL"], "");
    }

    #[test]
    fn literacy_test_parameters_then_options() {
        let test = field(
            "reading",
            FieldKind::LiteracyTest {
                choice: choice(&[("w1", "the"), ("w2", "cat")]),
            },
        );
        let options = FieldOptions {
            multiple_select: MultipleSelectMode::Details,
            ..FieldOptions::default()
        };
        let cells = test.format(Some(&json!("2 60 12 0 w2")), &Language::Xml, &options, &[]);
        assert_eq!(
            texts(&cells),
            vec![
                ("reading_word_at_flash".to_string(), "2".to_string()),
                ("reading_duration".to_string(), "60".to_string()),
                ("reading_total_attempted".to_string(), "12".to_string()),
                ("reading_reserved".to_string(), "0".to_string()),
                ("reading/w1".to_string(), "0".to_string()),
                ("reading/w2".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn validation_status_follows_language_mode() {
        let status = Field::copy(CopyField::ValidationStatus);
        let raw = json!({"uid": "validation_status_approved", "label": "Approved"});
        let options = FieldOptions::default();
        assert_eq!(
            status.format(Some(&raw), &Language::Xml, &options, &[])["_validation_status"],
            "validation_status_approved"
        );
        assert_eq!(
            status.format(Some(&raw), &Language::Untranslated, &options, &[])["_validation_status"],
            "Approved"
        );
    }

    #[test]
    fn copy_fields_parse_from_names() {
        assert_eq!("_uuid".parse::<CopyField>().unwrap(), CopyField::Uuid);
        assert_eq!("tags".parse::<CopyField>().unwrap(), CopyField::Tags);
        assert!("_nope".parse::<CopyField>().is_err());
        let tags = Field::copy(CopyField::Tags);
        let cells = tags.format(Some(&json!(["a", "b"])), &Language::Untranslated, &FieldOptions::default(), &[]);
        assert_eq!(cells["_tags"], "a, b");
    }

    #[test]
    fn audit_falls_back_to_attachment() {
        let audit = field("audit", FieldKind::Audit);
        let attachments = vec![Attachment {
            filename: "x/audit.csv".to_string(),
            download_url: "https://files/audit.csv".to_string(),
            is_deleted: false,
        }];
        let cells = audit.format(None, &Language::Untranslated, &FieldOptions::default(), &attachments);
        assert_eq!(cells["audit"], "https://files/audit.csv");
    }

    #[test]
    fn qualitative_analysis_reads_matching_response() {
        let details = json!({
            "transcript": {"value": "hello"},
            "qual": [
                {"uuid": "q-1", "val": "first"},
                {"uuid": "q-2", "val": ["t1", "t2"]}
            ]
        });
        let target = AnalysisTarget::Qualitative {
            response_id: "q-2".to_string(),
            choices: Some(choice(&[("t1", "Theme one")])),
        };
        let raw = target.read(&details);
        assert_eq!(raw, Some(&json!(["t1", "t2"])));
        assert_eq!(AnalysisTarget::Transcript.read(&details), Some(&json!("hello")));

        let analysis = field(
            "themes",
            FieldKind::Analysis {
                source: "q".to_string(),
                target,
            },
        );
        let cells = analysis.format(raw, &Language::Untranslated, &FieldOptions::default(), &[]);
        assert_eq!(cells["themes"], "Theme one, t2");
    }
}
