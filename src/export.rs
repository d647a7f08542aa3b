// CSV rendering of a row set - the table widget's export surface

use anyhow::Result;
use std::io::Write;

use crate::model::CallRecord;

/// Write rows as CSV under the given column schema, header row first.
pub fn write_csv<W: Write>(columns: &[String], rows: &[CallRecord], writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    out.write_record(columns)?;
    for row in rows {
        out.write_record(columns.iter().map(|column| row.column_value(column)))?;
    }
    out.flush()?;

    Ok(())
}
