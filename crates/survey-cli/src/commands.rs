use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{info, info_span};

use survey_core::Export;
use survey_ingest::{IngestError, ReadOptions, load_versions, submission_stream};
use survey_model::FormVersion;

use crate::cli::{ColumnsArgs, ExportArgs, SchemaArgs, VersionsArgs};
use crate::options::resolve_options;
use crate::summary::{apply_table_style, header_cell};
use crate::types::{ExportDocument, ExportResult};

/// Load the schema and configure an export from the option flags.
pub fn build_export(args: &SchemaArgs) -> Result<Export> {
    let versions = load_versions(&args.schema)
        .with_context(|| format!("load schema {}", args.schema.display()))?;
    let options = resolve_options(&args.options)?;
    Export::new(versions, options).context("configure export")
}

/// Run a full export and write the JSON document.
pub fn run_export(args: &ExportArgs) -> Result<ExportResult> {
    let span = info_span!("export_command", submissions = %args.submissions.display());
    let _guard = span.enter();
    let start = Instant::now();

    let export = build_export(&args.schema)?;
    let read_options = ReadOptions::default().with_skip_invalid(args.skip_invalid);
    let stream = submission_stream(&args.submissions, &read_options)
        .with_context(|| format!("read submissions {}", args.submissions.display()))?;

    // The pass pulls submissions one at a time and stops at the first read error.
    let mut read_failure: Option<IngestError> = None;
    let submissions = stream.map_while(|item| match item {
        Ok(submission) => Some(submission),
        Err(error) => {
            read_failure = Some(error);
            None
        }
    });
    let (tables, summary) = export.run(submissions);
    if let Some(error) = read_failure {
        return Err(error)
            .with_context(|| format!("read submissions {}", args.submissions.display()));
    }

    let splits = export.split_root_rows(&tables);
    let split_groups = splits.as_ref().map(|groups| groups.len());
    let document = ExportDocument {
        tables,
        summary,
        splits,
    };

    match &args.output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("create {}", path.display()))?;
            write_document(BufWriter::new(file), &document, args.pretty)
                .with_context(|| format!("write {}", path.display()))?;
        }
        None => write_document(io::stdout().lock(), &document, args.pretty)
            .context("write to stdout")?,
    }
    info!(
        submissions = summary_total(&document),
        duration_ms = start.elapsed().as_millis(),
        "export command complete"
    );

    Ok(ExportResult {
        summary: document.summary,
        output: args.output.clone(),
        split_groups,
    })
}

fn summary_total(document: &ExportDocument) -> usize {
    let summary = &document.summary;
    summary.processed + summary.unmatched + summary.filtered
}

fn write_document<W: Write>(mut writer: W, document: &ExportDocument, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, document)?;
    } else {
        serde_json::to_writer(&mut writer, document)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Print every table's columns with their labels.
pub fn run_columns(args: &ColumnsArgs) -> Result<()> {
    let export = build_export(&args.schema)?;
    println!("Language: {}", export.language());
    for layout in export.layouts() {
        let mut table = Table::new();
        table.set_header(vec![header_cell("Column"), header_cell("Label")]);
        apply_table_style(&mut table);
        for column in &layout.columns {
            table.add_row(vec![column.name.clone(), column.label.clone()]);
        }
        println!();
        println!("{}", layout.name);
        println!("{table}");
    }
    Ok(())
}

/// Print the versions stored in a schema file.
pub fn run_versions(args: &VersionsArgs) -> Result<()> {
    let versions = load_versions(&args.schema)
        .with_context(|| format!("load schema {}", args.schema.display()))?;
    println!("{}", versions_table(&versions));
    Ok(())
}

pub fn versions_table(versions: &[FormVersion]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Version"),
        header_cell("Version ID"),
        header_cell("Title"),
        header_cell("Fields"),
        header_cell("Translations"),
    ]);
    apply_table_style(&mut table);
    for version in versions {
        let translations = version
            .translations
            .iter()
            .map(|translation| translation.as_deref().unwrap_or("-"))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            version.id.clone(),
            version.version_id.clone().unwrap_or_else(|| "-".to_string()),
            version.title.clone().unwrap_or_default(),
            version.fields().count().to_string(),
            translations,
        ]);
    }
    table
}

