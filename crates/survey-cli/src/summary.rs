use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use survey_core::ExportSummary;

use crate::types::ExportResult;

/// Print the row counts of an export to stderr, keeping stdout for the
/// JSON document.
pub fn print_summary(result: &ExportResult) {
    match &result.output {
        Some(path) => eprintln!("Output: {}", path.display()),
        None => eprintln!("Output: <stdout>"),
    }
    eprintln!("{}", summary_table(&result.summary));
    if let Some(groups) = result.split_groups {
        eprintln!("Split groups: {groups}");
    }
    if result.summary.unmatched > 0 {
        eprintln!(
            "Skipped {} submission(s) of unknown versions",
            result.summary.unmatched
        );
    }
}

pub fn summary_table(summary: &ExportSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Table"), header_cell("Rows")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let mut total_rows = 0usize;
    for (name, rows) in &summary.rows {
        total_rows += rows;
        table.add_row(vec![table_cell(name), count_cell(*rows, Color::White)]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![dim_cell("submissions processed"), Cell::new(summary.processed)]);
    table.add_row(vec![
        dim_cell("unknown version"),
        count_cell(summary.unmatched, Color::Yellow),
    ]);
    table.add_row(vec![
        dim_cell("version not selected"),
        count_cell(summary.filtered, Color::Yellow),
    ]);
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn table_cell(name: &str) -> Cell {
    Cell::new(name)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_every_table_and_a_total() {
        let mut summary = ExportSummary {
            processed: 3,
            unmatched: 1,
            ..ExportSummary::default()
        };
        summary.rows.insert("submissions".to_string(), 3);
        summary.rows.insert("household".to_string(), 5);
        let mut table = summary_table(&summary);
        table.force_no_tty();
        let rendered = table.to_string();
        assert!(rendered.contains("submissions"));
        assert!(rendered.contains("household"));
        assert!(rendered.contains("TOTAL"));
        assert!(rendered.contains('8'));
    }
}
