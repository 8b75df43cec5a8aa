//! CSV export of a result table.

use std::io::Write;

use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::ResultTable;

/// Header of the leading identifier column.
pub const ID_COLUMN: &str = "id";

/// Write `table` as CSV: an `id` column, then the union of all record
/// fields in first-seen order. Missing fields become empty cells.
pub fn write_csv<W: Write>(table: &ResultTable, writer: W) -> Result<(), AppError> {
    let columns: Vec<&str> = table
        .columns()
        .into_iter()
        .filter(|c| *c != ID_COLUMN)
        .collect();
    let mut csv = csv::Writer::from_writer(writer);

    csv.write_record(std::iter::once(ID_COLUMN).chain(columns.iter().copied()))?;
    for (id, record) in table.rows() {
        let cells = columns.iter().map(|c| record.get(c).unwrap_or_default());
        csv.write_record(std::iter::once(id.as_str()).chain(cells))?;
    }

    csv.flush()
        .map_err(|e| AppError::ExportError(format!("Failed to flush CSV: {e}")))
}

/// Render `table` to an in-memory CSV document.
pub fn to_csv_string(table: &ResultTable) -> Result<String, AppError> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    String::from_utf8(buf).map_err(|e| AppError::ExportError(e.to_string()))
}

/// `jobs-export-YYYY-MM-DD.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("jobs-export-{}.csv", date.format("%Y-%m-%d"))
}

/// Attachment disposition value for serving an export download.
pub fn content_disposition(filename: &str) -> String {
    format!("attachment; filename=\"{filename}\"")
}
