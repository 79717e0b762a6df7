use remap_protocol::{ResultRecord, RowReference, HEADER_ROWS};
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SourceError};

pub const COLUMNS: [&str; 12] = [
    "old_url",
    "old_segment",
    "best_new_url",
    "new_segment",
    "is_category_page",
    "confidence",
    "low_confidence",
    "rationale",
    "candidates",
    "source_dup_of",
    "dest_dup_of",
    "highlight",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    /// Excel for `.xlsx`, JSON for `.json`, CSV otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => Self::Xlsx,
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

enum Cell {
    Text(String),
    Number(f64),
    Flag(bool),
}

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(flatten)]
    record: &'a ResultRecord,
    highlight: Option<&'static str>,
}

/// Writes the result table to `path`, creating parent directories.
pub fn write_results(path: &Path, records: &[ResultRecord]) -> Result<ExportFormat> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let format = ExportFormat::from_path(path);
    match format {
        ExportFormat::Xlsx => write_xlsx(path, records)?,
        ExportFormat::Csv => write_csv(BufWriter::new(File::create(path)?), records)?,
        ExportFormat::Json => write_json(BufWriter::new(File::create(path)?), records)?,
    }
    log::info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(format)
}

/// One header row, then one row per record. `candidates` is a JSON array,
/// duplicate references are display row numbers, `highlight` is a color name.
pub fn write_csv<W: Write>(writer: W, records: &[ResultRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(COLUMNS)?;
    for record in records {
        wtr.write_record(csv_row(record)?)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(mut writer: W, records: &[ResultRecord]) -> Result<()> {
    let rows: Vec<ExportRow<'_>> = records
        .iter()
        .map(|record| ExportRow {
            record,
            highlight: record.highlight().map(|h| h.color()),
        })
        .collect();
    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Single-sheet workbook with a bold header. Flagged rows get a solid fill
/// in their highlight color across every column.
pub fn write_xlsx(path: &Path, records: &[ResultRecord]) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let header = Format::new().set_bold();
    for (col, name) in (0u16..).zip(COLUMNS) {
        sheet.write_string_with_format(0, col, name, &header)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    for (idx, record) in records.iter().enumerate() {
        let row = u32::try_from(idx + HEADER_ROWS)
            .map_err(|_| SourceError::Other(format!("row {idx} exceeds the sheet size")))?;
        let fill = match record.highlight() {
            Some(highlight) => Format::new()
                .set_background_color(Color::RGB(highlight.fill_rgb()))
                .set_pattern(FormatPattern::Solid),
            None => Format::new(),
        };
        for (col, cell) in (0u16..).zip(xlsx_row(record)?) {
            write_cell(sheet, row, col, cell, &fill)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: Cell, format: &Format) -> Result<()> {
    match cell {
        Cell::Text(text) if text.is_empty() => sheet.write_blank(row, col, format)?,
        Cell::Text(text) => sheet.write_string_with_format(row, col, text, format)?,
        Cell::Number(value) => sheet.write_number_with_format(row, col, value, format)?,
        Cell::Flag(value) => sheet.write_boolean_with_format(row, col, value, format)?,
    };
    Ok(())
}

fn xlsx_row(record: &ResultRecord) -> Result<[Cell; 12]> {
    let reference = |r: Option<RowReference>| match r {
        Some(r) => Cell::Number(r.display_row() as f64),
        None => Cell::Text(String::new()),
    };
    Ok([
        Cell::Text(record.old_url.clone()),
        Cell::Text(record.old_segment.clone()),
        Cell::Text(record.best_new_url.clone()),
        Cell::Text(record.new_segment.clone()),
        Cell::Flag(record.is_category_page),
        Cell::Number(record.confidence),
        Cell::Flag(record.low_confidence),
        Cell::Text(record.rationale.clone()),
        Cell::Text(serde_json::to_string(&record.candidates)?),
        reference(record.source_dup_of),
        reference(record.dest_dup_of),
        Cell::Text(
            record
                .highlight()
                .map(|h| h.color().to_string())
                .unwrap_or_default(),
        ),
    ])
}

fn csv_row(record: &ResultRecord) -> Result<[String; 12]> {
    Ok([
        record.old_url.clone(),
        record.old_segment.clone(),
        record.best_new_url.clone(),
        record.new_segment.clone(),
        record.is_category_page.to_string(),
        record.confidence.to_string(),
        record.low_confidence.to_string(),
        record.rationale.clone(),
        serde_json::to_string(&record.candidates)?,
        row_cell(record.source_dup_of),
        row_cell(record.dest_dup_of),
        record
            .highlight()
            .map(|h| h.color().to_string())
            .unwrap_or_default(),
    ])
}

fn row_cell(reference: Option<RowReference>) -> String {
    reference.map(|r| r.to_string()).unwrap_or_default()
}
