use std::path::Path;

use rust_xlsxwriter::{Color, Format, Workbook, XlsxError};

use crate::domain::report::Report;
use crate::error::{AppError, AppResult};

pub const SHEET_NAME: &str = "Invalid Issues";

const HEADERS: [&str; 4] = ["Issue Key", "Summary", "Status", "Missing Fields"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub missing: String,
}

/// One row per issue with at least one missing mandatory field, in
/// report order.
pub fn invalid_rows(report: &Report) -> Vec<SheetRow> {
    report
        .rows()
        .filter(|row| !row.result.missing.is_empty())
        .map(|row| SheetRow {
            key: row.issue.key.clone(),
            summary: row.issue.summary.clone(),
            status: row.issue.status.clone(),
            missing: row.result.missing_labels(),
        })
        .collect()
}

/// Writes a single worksheet: bold header row, one data row per entry,
/// the missing-fields column filled red.
pub fn write_workbook(rows: &[SheetRow], path: &Path) -> AppResult<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let alert_format = Format::new().set_background_color(Color::Red);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME).map_err(render_error)?;
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(render_error)?;
    }
    for (index, row) in rows.iter().enumerate() {
        let r = (index + 1) as u32;
        worksheet
            .write_string(r, 0, row.key.as_str())
            .map_err(render_error)?;
        worksheet
            .write_string(r, 1, row.summary.as_str())
            .map_err(render_error)?;
        worksheet
            .write_string(r, 2, row.status.as_str())
            .map_err(render_error)?;
        worksheet
            .write_string_with_format(r, 3, row.missing.as_str(), &alert_format)
            .map_err(render_error)?;
    }

    workbook.save(path).map_err(render_error)?;
    Ok(())
}

fn render_error(err: XlsxError) -> AppError {
    AppError::Render(err.to_string())
}
