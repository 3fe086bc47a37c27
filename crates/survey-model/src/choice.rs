use indexmap::IndexMap;

use crate::labels::{Labels, Language};

/// A named option list shared by select questions.
///
/// Option order is insertion order and drives the order of per-option columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Choice {
    pub name: String,
    pub options: IndexMap<String, Labels>,
}

impl Choice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: IndexMap::new(),
        }
    }

    /// Adds an option; a repeated option name keeps its first labels.
    pub fn add_option(&mut self, name: impl Into<String>, labels: Labels) {
        self.options.entry(name.into()).or_insert(labels);
    }

    pub fn contains(&self, option: &str) -> bool {
        self.options.contains_key(option)
    }

    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    /// Translated label of `option`, or `None` when unknown or untranslated.
    pub fn label(&self, option: &str, language: &Language) -> Option<&str> {
        self.options.get(option)?.lookup(language)
    }

    /// Label of `option` with the raw option name as fallback.
    pub fn display<'a>(&'a self, option: &'a str, language: &Language) -> &'a str {
        self.label(option, language).unwrap_or(option)
    }

    /// Union of this (newer) list with an older one.
    ///
    /// Options of `self` come first and keep their labels; options only the
    /// older list knows are appended in the older list's order.
    pub fn merged_with_older(&self, older: &Choice) -> Choice {
        let mut merged = self.clone();
        for (name, labels) in &older.options {
            if !merged.options.contains_key(name) {
                merged.options.insert(name.clone(), labels.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(name: &str, options: &[(&str, &str)]) -> Choice {
        let mut choice = Choice::new(name);
        for (option, label) in options {
            choice.add_option(*option, Labels::untranslated(*label));
        }
        choice
    }

    #[test]
    fn newer_labels_win_on_merge() {
        let older = choice("colors", &[("x", "X old"), ("y", "Y old")]);
        let newer = choice("colors", &[("y", "Y new"), ("z", "Z new")]);

        let merged = newer.merged_with_older(&older);

        let names: Vec<&str> = merged.option_names().collect();
        assert_eq!(names, vec!["y", "z", "x"]);
        assert_eq!(merged.label("y", &Language::Untranslated), Some("Y new"));
        assert_eq!(merged.label("x", &Language::Untranslated), Some("X old"));
    }

    #[test]
    fn display_falls_back_to_option_name() {
        let colors = choice("colors", &[("r", "Red")]);
        assert_eq!(colors.display("r", &Language::Untranslated), "Red");
        assert_eq!(colors.display("r", &Language::Xml), "r");
        assert_eq!(colors.display("q", &Language::Untranslated), "q");
    }

    #[test]
    fn duplicate_option_keeps_first() {
        let colors = choice("colors", &[("r", "Red"), ("r", "Rouge")]);
        assert_eq!(colors.options.len(), 1);
        assert_eq!(colors.label("r", &Language::Untranslated), Some("Red"));
    }
}
