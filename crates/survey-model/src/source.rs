//! Normalized schema input.
//!
//! This is the shape the form parser hands over: a flat survey row list with
//! group markers, a flat choice row list, and label arrays aligned with the
//! declared translations.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One schema version. Only `version` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionSource {
    /// Version identifier.
    pub version: String,
    /// Alternate id string a submission may declare instead of `version`.
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Declared translations; `null` is the untranslated slot.
    #[serde(default)]
    pub translations: Vec<Option<String>>,
    #[serde(default)]
    pub survey: Vec<FieldSource>,
    #[serde(default)]
    pub choices: Vec<ChoiceSource>,
}

impl VersionSource {
    /// Translations, defaulting to the single untranslated slot.
    pub fn effective_translations(&self) -> Vec<Option<String>> {
        if self.translations.is_empty() {
            vec![None]
        } else {
            self.translations.clone()
        }
    }
}

/// One survey row: a question or a group/repeat marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSource {
    /// Type tag, e.g. `text`, `select_one`, `begin_repeat`.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: Option<String>,
    /// Labels aligned with the version's translations.
    pub label: Vec<Option<String>>,
    /// Choice list name for select questions.
    pub select_from: Option<String>,
    pub tags: Vec<String>,
    pub disabled: bool,
    /// Select-multiple question with a free "other" option.
    pub or_other: bool,
    /// Question path an analysis row annotates.
    pub source: Option<String>,
    /// Qualitative analysis response identifier.
    pub response_id: Option<String>,
    /// Language of a translation analysis row.
    pub language: Option<String>,
}

impl FieldSource {
    /// The type tag without its inline list name (`select_one colors` → `select_one`).
    pub fn type_tag(&self) -> &str {
        self.kind.split_whitespace().next().unwrap_or("")
    }

    /// Choice list: `select_from`, or the list named inline in the type tag.
    pub fn list_name(&self) -> Option<&str> {
        self.select_from
            .as_deref()
            .or_else(|| self.kind.split_whitespace().nth(1))
    }
}

/// One choice row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceSource {
    pub list_name: String,
    pub name: String,
    pub label: Vec<Option<String>>,
}

/// A schema file: one version, or several under `versions`.
///
/// The shape is chosen by the presence of a `versions` key, so an invalid
/// inner version is reported instead of being read as a single version.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaDocument {
    Many { versions: Vec<VersionSource> },
    One(VersionSource),
}

#[derive(Deserialize)]
struct ManyVersions {
    versions: Vec<VersionSource>,
}

impl<'de> Deserialize<'de> for SchemaDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.get("versions").is_some() {
            ManyVersions::deserialize(value)
                .map(|many| SchemaDocument::Many {
                    versions: many.versions,
                })
                .map_err(D::Error::custom)
        } else {
            VersionSource::deserialize(value)
                .map(SchemaDocument::One)
                .map_err(D::Error::custom)
        }
    }
}

impl SchemaDocument {
    pub fn into_versions(self) -> Vec<VersionSource> {
        match self {
            SchemaDocument::Many { versions } => versions,
            SchemaDocument::One(version) => vec![version],
        }
    }
}
