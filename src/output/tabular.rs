//! Flat CSV rendering of records
//!
//! The header is the record's field names; image links are joined into one
//! cell. Fields containing the separator, a quote, CR or LF are quoted with
//! inner quotes doubled.

use crate::record::Record;
use std::io::{self, Write};

const SEPARATOR: char = ',';

fn needs_quotes(field: &str) -> bool {
    field.contains(SEPARATOR) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Writes one CSV row to any writer
pub fn write_row<W: Write, T: AsRef<str>>(mut w: W, row: &[T]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{}", SEPARATOR)?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Renders `records` as CSV, header first, in the given order
pub fn render_csv(records: &[Record]) -> String {
    let mut buf: Vec<u8> = Vec::new();

    // writes into a Vec cannot fail
    let _ = write_row(&mut buf, &Record::FIELD_NAMES);
    for record in records {
        let _ = write_row(&mut buf, &record.flat_values());
    }

    match String::from_utf8(buf) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(&e.into_bytes()).into_owned(),
    }
}
