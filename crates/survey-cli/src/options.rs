//! Resolving export options from an options file and command-line flags.

use std::path::Path;

use anyhow::{Context, Result};
use survey_model::{CopyField, ExportOptions, Language, MultipleSelectMode};
use tracing::debug;

use crate::cli::{MultipleSelectArg, OptionArgs};

/// Read an options file. Missing keys take their defaults.
pub fn load_options_file(path: &Path) -> Result<ExportOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read options file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse options file {}", path.display()))
}

/// Options from `--options`, with every flag given on the command line
/// taking precedence.
pub fn resolve_options(args: &OptionArgs) -> Result<ExportOptions> {
    let mut options = match &args.options_file {
        Some(path) => load_options_file(path)?,
        None => ExportOptions::default(),
    };
    apply_flags(&mut options, args)?;
    debug!(?options, "resolved export options");
    Ok(options)
}

fn apply_flags(options: &mut ExportOptions, args: &OptionArgs) -> Result<()> {
    if let Some(lang) = &args.lang {
        options.lang = Some(lang.parse::<Language>()?);
    }
    if let Some(sep) = &args.group_sep {
        options.group_sep.clone_from(sep);
    }
    if args.hierarchy_in_labels {
        options.hierarchy_in_labels = true;
    }
    if !args.versions.is_empty() {
        options.versions = Some(args.versions.clone());
    }
    if let Some(mode) = args.multiple_select {
        options.multiple_select = match mode {
            MultipleSelectArg::Summary => MultipleSelectMode::Summary,
            MultipleSelectArg::Details => MultipleSelectMode::Details,
            MultipleSelectArg::Both => MultipleSelectMode::Both,
        };
    }
    if args.force_index {
        options.force_index = true;
    }
    if !args.copy_fields.is_empty() {
        options.copy_fields = args
            .copy_fields
            .iter()
            .map(|name| name.parse::<CopyField>().map_err(anyhow::Error::msg))
            .collect::<Result<Vec<_>>>()
            .context("parse --copy-field")?;
    }
    if !args.fields.is_empty() {
        options.filter_fields = args.fields.clone();
    }
    if args.typed_values {
        options.typed_values = true;
    }
    if args.media_urls {
        options.include_media_url = true;
    }
    if !args.tag_cols.is_empty() {
        options.tag_cols_for_header = args.tag_cols.clone();
    }
    if let Some(path) = &args.split_by {
        options.split_by = Some(path.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = OptionArgs {
            lang: Some("_xml".to_string()),
            multiple_select: Some(MultipleSelectArg::Summary),
            copy_fields: vec!["uuid".to_string(), "_id".to_string()],
            force_index: true,
            ..OptionArgs::default()
        };
        let options = resolve_options(&args).unwrap();
        assert_eq!(options.lang, Some(Language::Xml));
        assert_eq!(options.multiple_select, MultipleSelectMode::Summary);
        assert_eq!(options.copy_fields, vec![CopyField::Uuid, CopyField::Id]);
        assert!(options.force_index);
        assert_eq!(options.group_sep, "/");
        assert_eq!(options.versions, None);
    }

    #[test]
    fn unknown_copy_field_is_rejected() {
        let args = OptionArgs {
            copy_fields: vec!["_weather".to_string()],
            ..OptionArgs::default()
        };
        let error = resolve_options(&args).unwrap_err();
        assert!(format!("{error:#}").contains("Unknown copy field: _weather"));
    }
}
