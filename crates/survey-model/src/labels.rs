//! Multi-language label storage and resolution.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Sentinel accepted on the command line and in options files for [`Language::Untranslated`].
pub const UNTRANSLATED: &str = "_default";
/// Sentinel for [`Language::Xml`].
pub const XML_NAMES: &str = "_xml";

/// The language labels are requested in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    /// The reserved "no language" translation slot.
    #[default]
    Untranslated,
    /// Use question and option names instead of labels.
    Xml,
    /// A declared translation, e.g. `"English (en)"`.
    Named(String),
}

impl Language {
    /// The translation key this language reads from, `None` for the untranslated slot.
    ///
    /// Returns `None` for [`Language::Xml`] as well; callers check [`Language::is_xml`]
    /// before reading labels.
    pub fn key(&self) -> Option<&str> {
        match self {
            Language::Named(name) => Some(name.as_str()),
            Language::Untranslated | Language::Xml => None,
        }
    }

    pub fn is_xml(&self) -> bool {
        matches!(self, Language::Xml)
    }

    /// Language matching a declared translation slot.
    pub fn from_translation(translation: Option<&str>) -> Self {
        match translation {
            Some(name) => Language::Named(name.to_string()),
            None => Language::Untranslated,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Untranslated => write!(f, "{UNTRANSLATED}"),
            Language::Xml => write!(f, "{XML_NAMES}"),
            Language::Named(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            UNTRANSLATED | "" => Language::Untranslated,
            XML_NAMES => Language::Xml,
            other => Language::Named(other.to_string()),
        })
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(language) => language,
            Err(never) => match never {},
        }
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.to_string()
    }
}

/// Labels keyed by translation, `None` being the untranslated slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels(IndexMap<Option<String>, String>);

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build labels from a translation list and a positionally aligned label list.
    ///
    /// Missing or empty entries are left out so they fall back at resolution time.
    pub fn from_translations(translations: &[Option<String>], labels: &[Option<String>]) -> Self {
        let mut map = IndexMap::new();
        for (translation, label) in translations.iter().zip(labels) {
            if let Some(text) = label.as_deref().filter(|text| !text.is_empty()) {
                map.insert(translation.clone(), text.to_string());
            }
        }
        Self(map)
    }

    /// Single untranslated label.
    pub fn untranslated(text: impl Into<String>) -> Self {
        let mut map = IndexMap::new();
        map.insert(None, text.into());
        Self(map)
    }

    pub fn insert(&mut self, translation: Option<String>, text: impl Into<String>) {
        self.0.insert(translation, text.into());
    }

    pub fn get(&self, translation: Option<&str>) -> Option<&str> {
        self.0
            .get(&translation.map(str::to_string))
            .map(String::as_str)
    }

    /// Label text for `language`, or `None` when it has no non-empty label there.
    pub fn lookup(&self, language: &Language) -> Option<&str> {
        if language.is_xml() {
            return None;
        }
        self.get(language.key()).filter(|text| !text.is_empty())
    }

    /// Label text for `language`, falling back to `fallback` (the name) when absent.
    pub fn resolve<'a>(&'a self, language: &Language, fallback: &'a str) -> &'a str {
        self.lookup(language).unwrap_or(fallback)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
