use super::{CellValue, ColumnMapping, SheetRow, SpreadsheetError};
use crate::models::{Invoice, LedgerRecord, Transaction};
use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook, Worksheet};
use std::path::Path;

const HEADER_FILL: u32 = 0xB3E5FC;
const COLUMN_WIDTH: f64 = 22.0;

/// One worksheet of an export: a name, its columns, and the rows to write.
#[derive(Debug, Clone)]
pub struct SheetData {
    pub name: String,
    pub columns: &'static [ColumnMapping],
    pub rows: Vec<SheetRow>,
}

impl SheetData {
    pub fn new(name: impl Into<String>, columns: &'static [ColumnMapping]) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<SheetRow>) -> Self {
        self.rows = rows;
        self
    }

    /// Builds the sheet from stored records; row numbers follow write order.
    pub fn from_records<R: SheetRecord>(
        name: impl Into<String>,
        columns: &'static [ColumnMapping],
        records: &[R],
    ) -> Self {
        let rows = records
            .iter()
            .enumerate()
            .map(|(i, record)| record.to_sheet_row(i as u32 + 2))
            .collect();
        Self::new(name, columns).with_rows(rows)
    }
}

/// Conversion from a stored record into export cells.
pub trait SheetRecord {
    fn to_sheet_row(&self, row_number: u32) -> SheetRow;
}

impl SheetRecord for Invoice {
    fn to_sheet_row(&self, row_number: u32) -> SheetRow {
        SheetRow::new(row_number)
            .with("invoiceId", CellValue::Text(self.invoice_id.clone()))
            .with("customerId", CellValue::Text(self.customer_id.clone()))
            .with("invoiceDate", CellValue::DateTime(self.invoice_date.naive_utc()))
            .with("amount", CellValue::Number(self.amount))
            .with("status", CellValue::Text(self.status_label().to_string()))
    }
}

impl SheetRecord for Transaction {
    fn to_sheet_row(&self, row_number: u32) -> SheetRow {
        SheetRow::new(row_number)
            .with("transactionId", CellValue::Text(self.transaction_id.clone()))
            .with("paymentMethod", CellValue::Text(self.payment_method.clone()))
            .with("paymentDate", CellValue::DateTime(self.payment_date.naive_utc()))
            .with("amount", CellValue::Number(self.amount))
            .with("status", CellValue::Text(self.status_label().to_string()))
    }
}

/// Render every sheet into a single in-memory `.xlsx` document.
pub fn workbook_to_buffer(sheets: &[SheetData]) -> Result<Vec<u8>, SpreadsheetError> {
    let mut workbook = build_workbook(sheets)?;
    Ok(workbook.save_to_buffer()?)
}

/// Render every sheet and save the workbook at `path`.
///
/// Blocking: call from `spawn_blocking` inside async code.
pub fn write_workbook(path: &Path, sheets: &[SheetData]) -> Result<(), SpreadsheetError> {
    let mut workbook = build_workbook(sheets)?;
    workbook.save(path)?;
    tracing::debug!(path = %path.display(), sheets = sheets.len(), "Workbook written");
    Ok(())
}

fn build_workbook(sheets: &[SheetData]) -> Result<Workbook, SpreadsheetError> {
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin);
    let cell_format = Format::new().set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet().set_name(&sheet.name)?;
        write_sheet(worksheet, sheet, &header_format, &cell_format)?;
    }
    Ok(workbook)
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &SheetData,
    header_format: &Format,
    cell_format: &Format,
) -> Result<(), SpreadsheetError> {
    for (col, column) in sheet.columns.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, column.header, header_format)?;
        worksheet.set_column_width(col, COLUMN_WIDTH)?;
    }

    for (offset, row) in sheet.rows.iter().enumerate() {
        let row_idx = offset as u32 + 1;
        for (col, column) in sheet.columns.iter().enumerate() {
            let col = col as u16;
            match row.get(column.key) {
                CellValue::Empty => {
                    worksheet.write_blank(row_idx, col, cell_format)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string_with_format(row_idx, col, s, cell_format)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number_with_format(row_idx, col, *n, cell_format)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean_with_format(row_idx, col, *b, cell_format)?;
                }
                CellValue::DateTime(dt) => {
                    let text = dt.format("%Y-%m-%d").to_string();
                    worksheet.write_string_with_format(row_idx, col, &text, cell_format)?;
                }
            }
        }
    }

    Ok(())
}
