use std::io::Write;

use anyhow::Result;
use csv::Writer;
use serde::Serialize;

use cuadrante::dataset::RejectedRow;
use cuadrante::RangeError;

#[derive(Debug, Serialize)]
struct ReportLine<'a> {
    line: usize,
    street_id: i64,
    kind: &'static str,
    message: String,
    conflicting_range: Option<u64>,
    source: &'a str,
}

fn kind(error: &RangeError) -> &'static str {
    match error {
        RangeError::Validation(_) => "validation",
        RangeError::Conflict(_) => "conflict",
        RangeError::NotFound(_) => "not-found",
    }
}

fn conflicting_range(error: &RangeError) -> Option<u64> {
    use cuadrante::ConflictError::*;
    match error {
        RangeError::Conflict(
            RangeOverlap { existing, .. }
            | DuplicateRange { existing, .. }
            | DuplicateBlock { existing, .. },
        ) => Some(existing.0),
        _ => None,
    }
}

/// Write rejected rows as CSV, one line per row
pub fn write_report<W: Write>(out: W, source: &str, rejected: &[RejectedRow]) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    for row in rejected {
        writer.serialize(ReportLine {
            line: row.line,
            street_id: row.street_id.0,
            kind: kind(&row.error),
            message: row.error.to_string(),
            conflicting_range: conflicting_range(&row.error),
            source,
        })?;
    }
    writer.flush()?;
    Ok(())
}
