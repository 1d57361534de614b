//! CSV export

use csv::{QuoteStyle, WriterBuilder};
use std::io::Write;

use crate::parser::DEFAULT_DELIMITER;
use crate::record::Record;

/// Write a header row and one row per record, quoting only where needed
pub fn write_csv<'a, W, T, I>(records: I, writer: W) -> csv::Result<()>
where
    W: Write,
    T: Record + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut out = WriterBuilder::new()
        .delimiter(DEFAULT_DELIMITER)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(writer);

    out.write_record(T::schema().header())?;

    let mut rows = 0usize;
    for record in records {
        out.write_record(record.to_row())?;
        rows += 1;
    }
    out.flush()?;

    tracing::debug!(rows, "CSV export written");
    Ok(())
}

/// Convenience wrapper returning the export as bytes
pub fn to_csv_bytes<'a, T, I>(records: I) -> csv::Result<Vec<u8>>
where
    T: Record + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    Ok(buffer)
}
