use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One output cell.
///
/// Values stay [`Cell::Text`] unless typed output was requested and the raw
/// value parsed cleanly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn blank() -> Self {
        Cell::Text(String::new())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Text(text) if text.is_empty())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::blank()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => write!(f, "{text}"),
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Cell::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl PartialEq<&str> for Cell {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_untagged() {
        let cells = vec![
            Cell::text("a"),
            Cell::Number(2.5),
            Cell::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"["a",2.5,"2024-01-15"]"#);
    }

    #[test]
    fn blank_is_empty_text() {
        assert!(Cell::blank().is_blank());
        assert!(!Cell::Number(0.0).is_blank());
        assert_eq!(Cell::default(), "");
    }
}
