use super::{CellValue, ColumnMapping, SheetRow, SpreadsheetError};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

/// Read `sheet_name` from the workbook at `path`, validating its header row
/// against `mapping` before any data row is touched.
///
/// Blocking: call from `spawn_blocking` inside async code.
pub fn read_sheet(
    path: &Path,
    mapping: &[ColumnMapping],
    sheet_name: &str,
) -> Result<Vec<SheetRow>, SpreadsheetError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| SpreadsheetError::Open(e.to_string()))?;

    if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
        return Err(SpreadsheetError::SheetNotFound(sheet_name.to_string()));
    }

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| SpreadsheetError::Open(format!("sheet '{}': {}", sheet_name, e)))?;

    let rows = rows_from_range(&range, mapping)?;

    tracing::debug!(
        sheet = %sheet_name,
        rows = rows.len(),
        "Parsed spreadsheet rows"
    );

    Ok(rows)
}

/// Map a sheet's used range into records. The first row of the range is the
/// header row; rows with no value in any mapped column are skipped.
pub fn rows_from_range(
    range: &Range<Data>,
    mapping: &[ColumnMapping],
) -> Result<Vec<SheetRow>, SpreadsheetError> {
    let mut rows = range.rows();
    let header_row: &[Data] = rows.next().unwrap_or(&[]);

    let mut columns: Vec<(usize, &ColumnMapping)> = Vec::with_capacity(mapping.len());
    for (idx, cell) in header_row.iter().enumerate() {
        let Some(header) = CellValue::from(cell).as_text() else {
            continue;
        };
        let column = mapping
            .iter()
            .find(|col| col.header == header)
            .ok_or(SpreadsheetError::UnexpectedHeader(header))?;
        columns.push((idx, column));
    }

    let missing: Vec<String> = mapping
        .iter()
        .filter(|col| !columns.iter().any(|(_, seen)| seen.header == col.header))
        .map(|col| col.header.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(SpreadsheetError::MissingHeaders {
            expected: expected_headers(mapping),
            missing,
        });
    }

    if columns.len() != mapping.len() {
        return Err(SpreadsheetError::HeaderCountMismatch {
            expected: expected_headers(mapping),
            found: columns.len(),
        });
    }

    let first_row = range.start().map(|(row, _)| row).unwrap_or(0);

    let mut records = Vec::new();
    for (offset, row) in rows.enumerate() {
        // +1 for 1-indexing, +1 for the header row above.
        let row_number = first_row + offset as u32 + 2;
        let mut record = SheetRow::new(row_number);
        for (idx, column) in &columns {
            let value = row.get(*idx).map(CellValue::from).unwrap_or(CellValue::Empty);
            record.insert(column.key, value);
        }
        if !record.is_empty() {
            records.push(record);
        }
    }

    Ok(records)
}

fn expected_headers(mapping: &[ColumnMapping]) -> Vec<String> {
    mapping.iter().map(|col| col.header.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::headers::INVOICE_HEADERS;

    fn range_from(rows: &[Vec<Data>]) -> Range<Data> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    fn invoice_header() -> Vec<Data> {
        vec![
            text("Invoice ID"),
            text("Customer ID"),
            text("Invoice Date"),
            text("Amount"),
        ]
    }

    #[test]
    fn maps_each_data_row_by_header() {
        let range = range_from(&[
            invoice_header(),
            vec![text("INV001"), text("CUS001"), text("2024-01-15"), Data::Float(100.0)],
            vec![text("INV002"), text("CUS002"), text("2024-01-16"), Data::Int(50)],
        ]);

        let rows = rows_from_range(&range, INVOICE_HEADERS).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].get("invoiceId"), &CellValue::Text("INV001".into()));
        assert_eq!(rows[0].get("amount"), &CellValue::Number(100.0));
        assert_eq!(rows[1].row_number, 3);
        assert_eq!(rows[1].get("customerId"), &CellValue::Text("CUS002".into()));
        assert_eq!(rows[1].get("amount"), &CellValue::Number(50.0));
    }

    #[test]
    fn header_order_does_not_matter() {
        let range = range_from(&[
            vec![
                text("Amount"),
                text("Invoice Date"),
                text("Customer ID"),
                text("Invoice ID"),
            ],
            vec![Data::Float(75.0), text("2024-01-15"), text("C1"), text("I1")],
        ]);

        let rows = rows_from_range(&range, INVOICE_HEADERS).unwrap();

        assert_eq!(rows[0].get("invoiceId"), &CellValue::Text("I1".into()));
        assert_eq!(rows[0].get("amount"), &CellValue::Number(75.0));
    }

    #[test]
    fn header_only_sheet_yields_no_rows() {
        let range = range_from(&[invoice_header()]);
        let rows = rows_from_range(&range, INVOICE_HEADERS).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_header_is_a_schema_mismatch() {
        let range = range_from(&[
            vec![text("Invoice ID"), text("Customer ID"), text("Invoice Date")],
            vec![text("INV001"), text("CUS001"), text("2024-01-15")],
        ]);

        let err = rows_from_range(&range, INVOICE_HEADERS).unwrap_err();

        assert!(err.is_schema_mismatch());
        match err {
            SpreadsheetError::MissingHeaders { missing, .. } => {
                assert_eq!(missing, vec!["Amount".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unexpected_header_names_the_offender() {
        let mut header = invoice_header();
        header.push(text("Notes"));
        let range = range_from(&[header]);

        let err = rows_from_range(&range, INVOICE_HEADERS).unwrap_err();

        assert!(matches!(err, SpreadsheetError::UnexpectedHeader(ref h) if h == "Notes"));
    }

    #[test]
    fn renamed_header_is_rejected() {
        let range = range_from(&[vec![
            text("Invoice Number"),
            text("Customer ID"),
            text("Invoice Date"),
            text("Amount"),
        ]]);

        let err = rows_from_range(&range, INVOICE_HEADERS).unwrap_err();

        assert!(matches!(err, SpreadsheetError::UnexpectedHeader(ref h) if h == "Invoice Number"));
    }

    #[test]
    fn duplicated_header_fails_the_count_check() {
        let mut header = invoice_header();
        header.push(text("Amount"));
        let range = range_from(&[header]);

        let err = rows_from_range(&range, INVOICE_HEADERS).unwrap_err();

        assert!(matches!(
            err,
            SpreadsheetError::HeaderCountMismatch { found: 5, .. }
        ));
    }

    #[test]
    fn blank_rows_are_skipped_but_numbering_follows_the_sheet() {
        let range = range_from(&[
            invoice_header(),
            vec![text("INV001"), text("CUS001"), text("2024-01-15"), Data::Float(10.0)],
            vec![Data::Empty, Data::Empty, Data::Empty, Data::Empty],
            vec![text("INV003"), text("CUS003"), text("2024-01-17"), Data::Float(30.0)],
        ]);

        let rows = rows_from_range(&range, INVOICE_HEADERS).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row_number, 4);
    }

    #[test]
    fn empty_sheet_reports_every_header_missing() {
        let range: Range<Data> = Range::empty();
        let err = rows_from_range(&range, INVOICE_HEADERS).unwrap_err();

        match err {
            SpreadsheetError::MissingHeaders { missing, .. } => assert_eq!(missing.len(), 4),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
