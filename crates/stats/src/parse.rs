use std::io::Read;

use csv::StringRecord;
use thiserror::Error;
use tracing::debug;

use crate::{EquipmentRow, Result, Summary, SummaryBuilder, SummaryError, REQUIRED_COLUMNS};

/// Why a single row was left out of the summary.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("{column} is not a finite number: {value:?}")]
    NotNumeric { column: &'static str, value: String },

    #[error("{column} value {value} overflows the column total")]
    OutOfRange { column: &'static str, value: String },

    #[error("unreadable record: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkippedRow {
    pub line: u64, // 1-based, header is line 1
    pub error: ParseError,
}

#[derive(Clone, Debug)]
pub struct Aggregation {
    pub summary: Summary,
    pub skipped: Vec<SkippedRow>,
}

/// Summary only; see [`aggregate`] for the skipped-row report.
pub fn compute_summary<R: Read>(input: R) -> Result<Summary> {
    aggregate(input).map(|a| a.summary)
}

/// Parse CSV from `input` and aggregate every well-formed row.
///
/// Only the header is fatal: it must equal [`REQUIRED_COLUMNS`] after
/// trimming. Rows with the wrong field count or a non-numeric measurement are
/// skipped and reported.
pub fn aggregate<R: Read>(input: R) -> Result<Aggregation> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| SummaryError::Csv(e.to_string()))?
        .clone();
    check_header(&headers)?;

    let mut builder = SummaryBuilder::new();
    let mut skipped = Vec::new();

    for (i, result) in reader.records().enumerate() {
        // fallback when the reader has no position (header = line 1)
        let fallback_line = i as u64 + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(fallback_line);
                skipped.push(SkippedRow { line, error: ParseError::Malformed(e.to_string()) });
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(fallback_line);

        if let Err(error) = parse_row(&record).and_then(|row| builder.push(&row)) {
            debug!(line, %error, "skipping csv row");
            skipped.push(SkippedRow { line, error });
        }
    }

    match builder.finish() {
        Some(summary) => Ok(Aggregation { summary, skipped }),
        None => Err(SummaryError::NoValidRows { skipped: skipped.len() }),
    }
}

fn check_header(headers: &StringRecord) -> Result<()> {
    let found: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if found.len() != REQUIRED_COLUMNS.len()
        || found.iter().zip(REQUIRED_COLUMNS).any(|(f, r)| f != r)
    {
        return Err(SummaryError::Schema { found });
    }
    Ok(())
}

fn parse_row(record: &StringRecord) -> std::result::Result<EquipmentRow, ParseError> {
    if record.len() != REQUIRED_COLUMNS.len() {
        return Err(ParseError::FieldCount { expected: REQUIRED_COLUMNS.len(), found: record.len() });
    }

    Ok(EquipmentRow {
        name: record[0].to_string(),
        equipment_type: record[1].to_string(),
        flowrate: measure(&record[2], REQUIRED_COLUMNS[2])?,
        pressure: measure(&record[3], REQUIRED_COLUMNS[3])?,
        temperature: measure(&record[4], REQUIRED_COLUMNS[4])?,
    })
}

fn measure(field: &str, column: &'static str) -> std::result::Result<f64, ParseError> {
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::NotNumeric { column, value: field.to_string() }),
    }
}
