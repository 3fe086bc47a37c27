//! Form versions built from normalized schema input.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::choice::Choice;
use crate::error::{ModelError, Result};
use crate::field::{AnalysisTarget, Field, FieldKind, HierarchyNode};
use crate::labels::{Labels, Language};
use crate::section::{ROOT_SECTION, SectionTree};
use crate::source::{FieldSource, VersionSource};

/// One immutable version of a form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormVersion {
    pub id: String,
    /// Alternate identifier submissions may declare.
    pub version_id: Option<String>,
    pub title: Option<String>,
    pub translations: Vec<Option<String>>,
    pub choices: IndexMap<String, Arc<Choice>>,
    pub sections: SectionTree,
}

impl FormVersion {
    /// Build a version, walking the survey rows with a group/repeat stack.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] for unbalanced group markers, duplicate field
    /// or repeat names, unresolvable choice lists, and label arrays longer
    /// than the translation list.
    pub fn from_source(source: &VersionSource) -> Result<Self> {
        let translations = source.effective_translations();
        let choices = build_choices(source, &translations);
        let mut builder = SectionBuilder::new(&translations, &choices);
        for (row_index, row) in source.survey.iter().enumerate() {
            builder.visit(row_index, row)?;
        }
        let sections = builder.finish()?;
        Ok(Self {
            id: source.version.clone(),
            version_id: source.version_id.clone(),
            title: source.title.clone(),
            translations,
            choices,
            sections,
        })
    }

    /// Whether a submission declaring `declared` belongs to this version.
    pub fn matches(&self, declared: &str) -> bool {
        self.id == declared || self.version_id.as_deref() == Some(declared)
    }

    /// Every field, section by section, in schema order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.fields()
    }

    /// The first declared translation.
    pub fn default_language(&self) -> Language {
        Language::from_translation(self.translations.first().and_then(Option::as_deref))
    }
}

fn build_choices(
    source: &VersionSource,
    translations: &[Option<String>],
) -> IndexMap<String, Arc<Choice>> {
    let mut lists: IndexMap<String, Choice> = IndexMap::new();
    for row in &source.choices {
        lists
            .entry(row.list_name.clone())
            .or_insert_with(|| Choice::new(row.list_name.clone()))
            .add_option(row.name.clone(), Labels::from_translations(translations, &row.label));
    }
    lists
        .into_iter()
        .map(|(name, choice)| (name, Arc::new(choice)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    BeginGroup,
    EndGroup,
    BeginRepeat,
    EndRepeat,
}

impl Marker {
    fn parse(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().replace(' ', "_").as_str() {
            "begin_group" | "begin_kobomatrix" => Some(Marker::BeginGroup),
            "end_group" | "end_kobomatrix" => Some(Marker::EndGroup),
            "begin_repeat" => Some(Marker::BeginRepeat),
            "end_repeat" => Some(Marker::EndRepeat),
            _ => None,
        }
    }

    fn is_begin(self) -> bool {
        matches!(self, Marker::BeginGroup | Marker::BeginRepeat)
    }
}

struct OpenFrame {
    repeat: bool,
    node: HierarchyNode,
    section: String,
}

struct SectionBuilder<'a> {
    translations: &'a [Option<String>],
    choices: &'a IndexMap<String, Arc<Choice>>,
    tree: SectionTree,
    root: HierarchyNode,
    stack: Vec<OpenFrame>,
    /// Depth inside a disabled group; rows are dropped while non-zero.
    skipped: usize,
    /// Hierarchy and section of built fields by path, for analysis rows.
    built: HashMap<String, (Vec<HierarchyNode>, String)>,
}

impl<'a> SectionBuilder<'a> {
    fn new(translations: &'a [Option<String>], choices: &'a IndexMap<String, Arc<Choice>>) -> Self {
        Self {
            translations,
            choices,
            tree: SectionTree::new(),
            root: HierarchyNode::new(ROOT_SECTION, Labels::new()),
            stack: Vec::new(),
            skipped: 0,
            built: HashMap::new(),
        }
    }

    fn current_section(&self) -> &str {
        self.stack
            .last()
            .map(|frame| frame.section.as_str())
            .unwrap_or(ROOT_SECTION)
    }

    fn ancestors(&self) -> Vec<HierarchyNode> {
        let mut ancestors = vec![self.root.clone()];
        ancestors.extend(self.stack.iter().map(|frame| frame.node.clone()));
        ancestors
    }

    fn visit(&mut self, row_index: usize, row: &FieldSource) -> Result<()> {
        if row.label.len() > self.translations.len() {
            return Err(ModelError::LabelCountMismatch {
                row: row_index,
                expected: self.translations.len(),
                actual: row.label.len(),
            });
        }
        let marker = Marker::parse(&row.kind);

        if self.skipped > 0 {
            match marker {
                Some(marker) if marker.is_begin() => self.skipped += 1,
                Some(_) => self.skipped -= 1,
                None => {}
            }
            return Ok(());
        }

        match marker {
            Some(marker) if marker.is_begin() => {
                if row.disabled {
                    debug!(row = row_index, kind = %row.kind, "skipping disabled group");
                    self.skipped = 1;
                    return Ok(());
                }
                self.open(row_index, row, marker == Marker::BeginRepeat)
            }
            Some(marker) => self.close(row_index, row, marker == Marker::EndRepeat),
            None if row.disabled => {
                debug!(row = row_index, name = ?row.name, "skipping disabled field");
                Ok(())
            }
            None => self.add_field(row_index, row),
        }
    }

    fn open(&mut self, row_index: usize, row: &FieldSource, repeat: bool) -> Result<()> {
        let name = required_name(row_index, row)?;
        let node = HierarchyNode::new(name, Labels::from_translations(self.translations, &row.label));
        let section = if repeat {
            let mut path: Vec<&str> = self.stack.iter().map(|frame| frame.node.name.as_str()).collect();
            path.push(name);
            let path = path.join("/");
            let parent = self.current_section().to_string();
            self.tree.add_child(&parent, name, &path)?;
            name.to_string()
        } else {
            self.current_section().to_string()
        };
        self.stack.push(OpenFrame {
            repeat,
            node,
            section,
        });
        Ok(())
    }

    fn close(&mut self, row_index: usize, row: &FieldSource, repeat: bool) -> Result<()> {
        let expected = if repeat { "repeat" } else { "group" };
        match self.stack.pop() {
            Some(frame) if frame.repeat == repeat => Ok(()),
            _ => Err(ModelError::UnbalancedGroup {
                row: row_index,
                kind: row.kind.clone(),
                expected,
            }),
        }
    }

    fn add_field(&mut self, row_index: usize, row: &FieldSource) -> Result<()> {
        let tag = row.type_tag().to_ascii_lowercase();
        if tag == "note" {
            return Ok(());
        }
        let name = required_name(row_index, row)?;
        let labels = Labels::from_translations(self.translations, &row.label);

        if is_analysis(&tag) {
            return self.add_analysis_field(&tag, name, labels, row);
        }

        let kind = match tag.as_str() {
            "integer" | "decimal" | "range" => FieldKind::Numeric,
            "date" | "today" => FieldKind::Date,
            "datetime" | "start" | "end" => FieldKind::DateTime,
            "geopoint" | "gps" => FieldKind::Gps,
            "select_one" | "select1" => FieldKind::SelectOne {
                choice: self.choice_for(name, row)?,
            },
            "select_multiple" | "select_all_that_apply" => FieldKind::SelectMultiple {
                choice: self.choice_for(name, row)?,
                or_other: row.or_other,
            },
            "literacy" | "literacy_test" => FieldKind::LiteracyTest {
                choice: self.choice_for(name, row)?,
            },
            "image" | "photo" | "audio" | "video" | "file" | "background-audio"
            | "background_audio" => FieldKind::Media,
            "audit" => FieldKind::Audit,
            _ => FieldKind::Text,
        };

        let ancestors = self.ancestors();
        let section = self.current_section().to_string();
        let field = Field::new(name, row.type_tag(), kind, labels, &ancestors, section.clone())
            .with_tags(row.tags.clone());
        self.built
            .insert(field.path.clone(), (field.hierarchy.clone(), section));
        self.tree.add_field(field)
    }

    fn add_analysis_field(
        &mut self,
        tag: &str,
        name: &str,
        labels: Labels,
        row: &FieldSource,
    ) -> Result<()> {
        let source = row.source.clone().unwrap_or_default();
        let Some((hierarchy, section)) = self.built.get(&source).cloned() else {
            return Err(ModelError::UnknownAnalysisSource {
                field: name.to_string(),
                source_path: source,
            });
        };
        let target = match tag {
            "transcript" => AnalysisTarget::Transcript,
            "translation" => AnalysisTarget::Translation {
                language: row.language.clone().unwrap_or_default(),
            },
            _ => AnalysisTarget::Qualitative {
                response_id: row.response_id.clone().unwrap_or_else(|| name.to_string()),
                choices: match row.list_name() {
                    Some(_) => Some(self.choice_for(name, row)?),
                    None => None,
                },
            },
        };
        let kind = FieldKind::Analysis {
            source: source.clone(),
            target,
        };
        let field = Field::new(name, tag, kind, labels, &hierarchy, section)
            .with_tags(row.tags.clone());
        self.tree.add_field(field)
    }

    fn choice_for(&self, name: &str, row: &FieldSource) -> Result<Arc<Choice>> {
        let Some(list) = row.list_name() else {
            return Err(ModelError::MissingChoiceList {
                field: name.to_string(),
            });
        };
        self.choices
            .get(list)
            .cloned()
            .ok_or_else(|| ModelError::UnknownChoiceList {
                field: name.to_string(),
                list: list.to_string(),
            })
    }

    fn finish(self) -> Result<SectionTree> {
        if !self.stack.is_empty() {
            return Err(ModelError::UnclosedGroup {
                count: self.stack.len(),
            });
        }
        Ok(self.tree)
    }
}

fn is_analysis(tag: &str) -> bool {
    tag == "transcript" || tag == "translation" || tag.starts_with("qual_")
}

fn required_name<'r>(row_index: usize, row: &'r FieldSource) -> Result<&'r str> {
    row.name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ModelError::MissingName {
            row: row_index,
            kind: row.kind.clone(),
        })
}
