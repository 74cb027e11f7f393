//! Write a [`Table`] to an `.xlsx` workbook.

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{Cell, Table};

/// Name of the single worksheet in every output workbook.
pub const OUTPUT_SHEET_NAME: &str = "Sheet1";

/// MIME type of the output workbook.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Save `table` to `path` as a one-sheet workbook: header row, then data rows.
///
/// Empty cells, empty strings and non-finite numbers are left blank.
pub fn write_table(table: &Table, path: &Path) -> PipelineResult<()> {
    let mut workbook = build_workbook(table).map_err(|e| PipelineError::write(path, e))?;
    workbook.save(path).map_err(|e| PipelineError::write(path, e))
}

/// Serialize `table` to in-memory `.xlsx` bytes.
pub fn table_to_bytes(table: &Table) -> Result<Vec<u8>, XlsxError> {
    build_workbook(table)?.save_to_buffer()
}

fn build_workbook(table: &Table) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET_NAME)?;

    for (col_idx, column) in table.columns().iter().enumerate() {
        let col = u16::try_from(col_idx).map_err(|_| XlsxError::RowColumnLimitError)?;
        worksheet.write_string(0, col, &column.name)?;

        for (row_idx, cell) in column.cells.iter().enumerate() {
            let row = u32::try_from(row_idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
            write_cell(worksheet, row, col, cell)?;
        }
    }

    Ok(workbook)
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<(), XlsxError> {
    match cell {
        Cell::Empty => {}
        Cell::Text(s) if s.is_empty() => {}
        Cell::Text(s) => {
            ws.write_string(row, col, s)?;
        }
        Cell::Number(n) if !n.is_finite() => {}
        Cell::Number(n) => {
            ws.write_number(row, col, *n)?;
        }
    }
    Ok(())
}
