//! Workbook I/O: typed cells, header mappings, reading uploads and writing
//! styled multi-sheet exports.

pub mod headers;
pub mod reader;
pub mod writer;

pub use headers::ColumnMapping;
pub use reader::{read_sheet, rows_from_range};
pub use writer::{workbook_to_buffer, write_workbook, SheetData, SheetRecord};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use thiserror::Error;

/// Content type of `.xlsx` uploads and attachments.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("Failed to open spreadsheet: {0}")]
    Open(String),

    #[error("Sheet \"{0}\" not found in the Excel file.")]
    SheetNotFound(String),

    #[error("Unexpected header in Excel: \"{0}\"")]
    UnexpectedHeader(String),

    #[error(
        "Excel headers do not match expected headers. Expected: {}. Missing: {}",
        .expected.join(", "),
        .missing.join(", ")
    )]
    MissingHeaders {
        expected: Vec<String>,
        missing: Vec<String>,
    },

    #[error(
        "Excel headers do not match expected headers. Expected {} columns ({}), found {found}",
        .expected.len(),
        .expected.join(", ")
    )]
    HeaderCountMismatch { expected: Vec<String>, found: usize },

    #[error("Failed to write spreadsheet: {0}")]
    Write(String),
}

impl SpreadsheetError {
    /// True when the workbook opened fine but its layout does not match the
    /// declared mapping.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(
            self,
            Self::SheetNotFound(_)
                | Self::UnexpectedHeader(_)
                | Self::MissingHeaders { .. }
                | Self::HeaderCountMismatch { .. }
        )
    }
}

impl From<rust_xlsxwriter::XlsxError> for SpreadsheetError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        SpreadsheetError::Write(err.to_string())
    }
}

/// A single cell, decoupled from the codec that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%d %b %Y"];

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Trimmed textual form. Integral numbers drop their fraction so an ID
    /// typed as `1001` reads back as `"1001"`, not `"1001.0"`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::DateTime(dt) => Some(dt.date().format("%Y-%m-%d").to_string()),
        }
    }

    /// Only genuinely numeric cells count; `"100"` typed as text does not.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::DateTime(dt) => Some(dt.date()),
            CellValue::Number(serial) => excel_serial_to_datetime(*serial).map(|dt| dt.date()),
            CellValue::Text(s) => parse_text_date(s.trim()),
            CellValue::Empty | CellValue::Bool(_) => None,
        }
    }
}

impl From<&calamine::Data> for CellValue {
    fn from(cell: &calamine::Data) -> Self {
        use calamine::Data;

        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) if s.trim().is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(n) => CellValue::Number(*n),
            Data::Int(n) => CellValue::Number(*n as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
            Data::DateTime(dt) => {
                let serial = dt.as_f64();
                excel_serial_to_datetime(serial)
                    .map(CellValue::DateTime)
                    .unwrap_or(CellValue::Number(serial))
            }
            Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .map(|d| d.and_time(chrono::NaiveTime::MIN))
                })
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

/// One record read from (or destined for) a sheet, keyed by field key.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 1-indexed row in the sheet; the first data row under an A1 header is 2.
    pub row_number: u32,
    cells: HashMap<String, CellValue>,
}

impl SheetRow {
    pub fn new(row_number: u32) -> Self {
        Self {
            row_number,
            cells: HashMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: CellValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: CellValue) {
        self.cells.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> &CellValue {
        self.cells.get(key).unwrap_or(&EMPTY_CELL)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(CellValue::is_empty)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Convert an Excel 1900-system serial (days since 1899-12-30) to a timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(chrono::NaiveTime::MIN);
    let days = serial.trunc() as i64;
    let seconds = (serial.fract() * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::days(days) + Duration::seconds(seconds))
}

fn parse_text_date(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    TEXT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}
