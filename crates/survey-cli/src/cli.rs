//! CLI argument definitions for the survey exporter.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "survey",
    version,
    about = "Flatten survey submissions into linked tables",
    long_about = "Flatten survey submissions into linked tables.\n\n\
                  Reads a normalized form schema (one or more versions) and a stream of\n\
                  submissions, reconciles the versions, and writes one table per repeat\n\
                  group as JSON."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export submissions to JSON tables.
    Export(ExportArgs),

    /// List the columns and labels each table would have.
    Columns(ColumnsArgs),

    /// List the versions stored in a schema file.
    Versions(VersionsArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Submission file (JSON array or NDJSON) or a directory of them.
    #[arg(value_name = "SUBMISSIONS")]
    pub submissions: PathBuf,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Write the tables to this file instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Skip malformed submissions instead of failing.
    #[arg(long = "skip-invalid")]
    pub skip_invalid: bool,

    /// Print a row count summary to stderr.
    #[arg(long = "summary")]
    pub summary: bool,
}

#[derive(Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub schema: SchemaArgs,
}

#[derive(Args)]
pub struct VersionsArgs {
    /// Normalized schema file.
    #[arg(long = "schema", short = 's', value_name = "FILE")]
    pub schema: PathBuf,
}

/// Schema file plus export options shared by `export` and `columns`.
#[derive(Args)]
pub struct SchemaArgs {
    /// Normalized schema file (one version or `{"versions": [...]}`).
    #[arg(long = "schema", short = 's', value_name = "FILE")]
    pub schema: PathBuf,

    #[command(flatten)]
    pub options: OptionArgs,
}

/// Export option flags. Flags override values from `--options`.
#[derive(Args, Default)]
pub struct OptionArgs {
    /// JSON file with export options.
    #[arg(long = "options", value_name = "FILE")]
    pub options_file: Option<PathBuf>,

    /// Label language (`_default` for untranslated labels, `_xml` for names).
    #[arg(long = "lang", value_name = "LANG")]
    pub lang: Option<String>,

    /// Separator between group labels.
    #[arg(long = "group-sep", value_name = "SEP")]
    pub group_sep: Option<String>,

    /// Prefix labels with their group labels.
    #[arg(long = "hierarchy-in-labels")]
    pub hierarchy_in_labels: bool,

    /// Version to include (repeatable; default: all).
    #[arg(long = "form-version", value_name = "ID")]
    pub versions: Vec<String>,

    /// Layout of select-multiple questions.
    #[arg(long = "multiple-select", value_enum)]
    pub multiple_select: Option<MultipleSelectArg>,

    /// Emit `_index` on every table.
    #[arg(long = "force-index")]
    pub force_index: bool,

    /// Submission metadata column to copy (repeatable, e.g. `_uuid`).
    #[arg(long = "copy-field", value_name = "NAME")]
    pub copy_fields: Vec<String>,

    /// Field path to keep (repeatable; default: all fields).
    #[arg(long = "field", value_name = "PATH")]
    pub fields: Vec<String>,

    /// Parse numbers and dates instead of keeping text.
    #[arg(long = "typed-values")]
    pub typed_values: bool,

    /// Add `_URL` columns to media questions.
    #[arg(long = "media-urls")]
    pub media_urls: bool,

    /// Tag column to emit as a header row (repeatable, e.g. `hxl`).
    #[arg(long = "tag-col", value_name = "TAG")]
    pub tag_cols: Vec<String>,

    /// Field path whose values partition root rows.
    #[arg(long = "split-by", value_name = "PATH")]
    pub split_by: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MultipleSelectArg {
    Summary,
    Details,
    Both,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
