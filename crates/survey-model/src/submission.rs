//! Reserved submission keys and raw value helpers.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Attachments of a submission entry.
pub const ATTACHMENTS_KEY: &str = "_attachments";
/// Transcripts, translations, and qualitative analysis keyed by source path.
pub const SUPPLEMENTAL_KEY: &str = "_supplementalDetails";
/// Keys a submission may declare its form version under, in lookup order.
pub const VERSION_KEYS: [&str; 2] = ["__version__", "_version_"];

/// One submission, or one entry of a repeat: answers keyed by question path.
pub type Submission = Map<String, Value>;

/// One uploaded file referenced by a media question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub filename: String,
    pub download_url: String,
    pub is_deleted: bool,
}

impl Attachment {
    /// Attachments listed on an entry; malformed items are skipped.
    pub fn from_entry(entry: &Map<String, Value>) -> Vec<Attachment> {
        let Some(Value::Array(items)) = entry.get(ATTACHMENTS_KEY) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| Attachment::deserialize(item).ok())
            .collect()
    }

    /// File name without any directory prefix.
    pub fn basename(&self) -> &str {
        basename(&self.filename)
    }

    /// Whether this attachment stores the file an answer names.
    pub fn matches(&self, answer: &str) -> bool {
        let wanted = basename(answer);
        !wanted.is_empty() && self.basename() == wanted
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Text rendering of a raw answer. `null` renders as an empty string.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// The version a submission declares, if any.
pub fn declared_version(entry: &Map<String, Value>) -> Option<String> {
    VERSION_KEYS
        .iter()
        .find_map(|key| entry.get(*key))
        .map(value_to_text)
        .filter(|version| !version.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attachments_are_read_leniently() {
        let entry = json!({
            "_attachments": [
                {"filename": "user/attachments/abc/photo.jpg", "download_url": "https://x/photo.jpg"},
                "garbage",
                {"filename": "old.png", "is_deleted": true}
            ]
        });
        let attachments = Attachment::from_entry(entry.as_object().unwrap());
        assert_eq!(attachments.len(), 2);
        assert!(attachments[0].matches("photo.jpg"));
        assert!(!attachments[0].matches(""));
        assert!(attachments[1].is_deleted);
    }

    #[test]
    fn declared_version_prefers_double_underscore() {
        let entry = json!({"_version_": "v1", "__version__": "v2"});
        assert_eq!(declared_version(entry.as_object().unwrap()), Some("v2".to_string()));
        let entry = json!({"_version_": 3});
        assert_eq!(declared_version(entry.as_object().unwrap()), Some("3".to_string()));
        let entry = json!({"q": "a"});
        assert_eq!(declared_version(entry.as_object().unwrap()), None);
    }

    #[test]
    fn value_text_rendering() {
        assert_eq!(value_to_text(&json!(null)), "");
        assert_eq!(value_to_text(&json!(12)), "12");
        assert_eq!(value_to_text(&json!(true)), "true");
        assert_eq!(value_to_text(&json!("x")), "x");
    }
}
