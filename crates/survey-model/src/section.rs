//! Table structure: the root section plus one section per repeat.

use indexmap::IndexMap;

use crate::error::{ModelError, Result};
use crate::field::Field;

/// Name of the root table every submission produces one row in.
pub const ROOT_SECTION: &str = "submissions";

/// One exportable table.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    /// Full path of the repeat this section was created for; `None` for the root.
    pub path: Option<String>,
    /// Fields in schema order, keyed by name.
    pub fields: IndexMap<String, Field>,
    pub parent: Option<String>,
    pub children: Vec<String>,
}

impl Section {
    pub fn root() -> Self {
        Self {
            name: ROOT_SECTION.to_string(),
            path: None,
            fields: IndexMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn repeat(name: impl Into<String>, path: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
            fields: IndexMap::new(),
            parent: Some(parent.into()),
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Appends a field; names are unique within a section.
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        if self.fields.contains_key(&field.name) {
            return Err(ModelError::DuplicateField {
                section: self.name.clone(),
                name: field.name,
            });
        }
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }
}

/// Sections of one form, keyed by name, in creation order (root first).
#[derive(Debug, Clone, PartialEq)]
pub struct SectionTree {
    sections: IndexMap<String, Section>,
}

impl Default for SectionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionTree {
    /// A tree holding only the empty root section.
    pub fn new() -> Self {
        let mut sections = IndexMap::new();
        sections.insert(ROOT_SECTION.to_string(), Section::root());
        Self { sections }
    }

    pub fn root(&self) -> &Section {
        &self.sections[0]
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Creates a child section for a repeat under `parent`.
    pub fn add_child(&mut self, parent: &str, name: &str, path: &str) -> Result<()> {
        if !self.sections.contains_key(parent) {
            return Err(ModelError::UnknownSection {
                name: parent.to_string(),
            });
        }
        if self.sections.contains_key(name) {
            return Err(ModelError::DuplicateSection {
                name: name.to_string(),
            });
        }
        self.sections
            .insert(name.to_string(), Section::repeat(name, path, parent));
        if let Some(parent) = self.sections.get_mut(parent) {
            parent.children.push(name.to_string());
        }
        Ok(())
    }

    /// Appends `field` to the section it names.
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        let Some(section) = self.sections.get_mut(&field.section) else {
            return Err(ModelError::UnknownSection {
                name: field.section,
            });
        };
        section.add_field(field)
    }

    /// Every field, section by section.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.values().flat_map(|section| section.fields.values())
    }

    pub fn field(&self, section: &str, name: &str) -> Option<&Field> {
        self.sections.get(section)?.fields.get(name)
    }

    /// Parent chain of `name`, nearest first, excluding the section itself.
    pub fn ancestors(&self, name: &str) -> Vec<&Section> {
        let mut chain = Vec::new();
        let mut current = self.sections.get(name).and_then(|section| section.parent.as_deref());
        while let Some(parent_name) = current {
            let Some(parent) = self.sections.get(parent_name) else {
                break;
            };
            chain.push(parent);
            current = parent.parent.as_deref();
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldKind, HierarchyNode};
    use crate::labels::Labels;

    fn text_field(name: &str, section: &str) -> Field {
        Field::new(
            name,
            "text",
            FieldKind::Text,
            Labels::new(),
            &[HierarchyNode::new(ROOT_SECTION, Labels::new())],
            section,
        )
    }

    #[test]
    fn child_sections_link_both_ways() {
        let mut tree = SectionTree::new();
        tree.add_child(ROOT_SECTION, "household", "household").unwrap();
        tree.add_child("household", "member", "household/member").unwrap();

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.root().children, vec!["household"]);
        assert_eq!(tree.get("member").unwrap().parent.as_deref(), Some("household"));
        let ancestors: Vec<&str> = tree.ancestors("member").iter().map(|s| s.name.as_str()).collect();
        assert_eq!(ancestors, vec!["household", ROOT_SECTION]);
        assert!(tree.ancestors(ROOT_SECTION).is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut tree = SectionTree::new();
        tree.add_child(ROOT_SECTION, "rep", "rep").unwrap();
        assert!(matches!(
            tree.add_child(ROOT_SECTION, "rep", "other/rep"),
            Err(ModelError::DuplicateSection { .. })
        ));

        tree.add_field(text_field("q1", ROOT_SECTION)).unwrap();
        assert!(matches!(
            tree.add_field(text_field("q1", ROOT_SECTION)),
            Err(ModelError::DuplicateField { .. })
        ));
        tree.add_field(text_field("q1", "rep")).unwrap();
        assert_eq!(tree.fields().count(), 2);
    }
}
