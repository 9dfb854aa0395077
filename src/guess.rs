//! Header and type guessing over a bounded row sample.
//!
//! Header detection scores each row in the leading sample window on three
//! signals: the share of cells that do not look like data (numbers, dates),
//! the uniqueness of values within the row, and how close the row's cell
//! lengths sit to the rows below it. The weights are 0.6 / 0.25 / 0.15 and a
//! candidate must score above [`HEADER_SCORE_THRESHOLD`] (0.5) to be
//! accepted; a file of purely numeric rows therefore fails with a
//! [`StructingError::HeaderGuess`] instead of promoting a data row. The
//! exact weighting is a usability heuristic, not a correctness contract.
//!
//! Type guessing is strict: a column's type is the first entry of the fixed
//! precedence (integer, float, decimal, boolean, date, datetime) under which
//! every sampled non-blank value parses, with string as the fallback. Blank
//! cells never vote.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::{
    data::{
        ColumnType, DATE_FORMATS, DATETIME_FORMATS, detect_date_format, detect_datetime_format,
    },
    error::StructingError,
};

/// Rows of the sample examined when locating the header row.
pub const HEADER_SAMPLE_ROWS: usize = 25;
/// Minimum weighted score a row must reach to be accepted as the header.
pub const HEADER_SCORE_THRESHOLD: f64 = 0.5;

const TEXT_WEIGHT: f64 = 0.6;
const UNIQUENESS_WEIGHT: f64 = 0.25;
const LENGTH_WEIGHT: f64 = 0.15;

/// Picks the most header-like row from the leading sample.
///
/// Returns the zero-based row index of the chosen row and its trimmed cell
/// values.
pub fn guess_header(sample: &[Vec<String>]) -> Result<(usize, Vec<String>), StructingError> {
    if sample.is_empty() {
        return Err(StructingError::HeaderGuess {
            reason: "sample contains no rows".to_string(),
        });
    }

    let window = &sample[..sample.len().min(HEADER_SAMPLE_ROWS)];
    let mut best: Option<(usize, f64)> = None;
    for (idx, row) in window.iter().enumerate() {
        let score = score_header_candidate(row, &window[idx + 1..]);
        log::debug!("Header candidate row {idx} scored {score:.3}");
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((idx, score));
        }
    }

    match best {
        Some((offset, score)) if score > HEADER_SCORE_THRESHOLD => {
            let headers = sample[offset]
                .iter()
                .map(|cell| cell.trim().to_string())
                .collect();
            Ok((offset, headers))
        }
        _ => Err(StructingError::HeaderGuess {
            reason: format!(
                "no row in the first {} sampled row(s) scored above {}",
                window.len(),
                HEADER_SCORE_THRESHOLD
            ),
        }),
    }
}

fn score_header_candidate(row: &[String], following: &[Vec<String>]) -> f64 {
    let cells: Vec<&str> = row
        .iter()
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .collect();
    if cells.is_empty() {
        return 0.0;
    }

    let text_cells = cells.iter().filter(|cell| !value_is_data_like(cell)).count();
    let text_score = text_cells as f64 / cells.len() as f64;

    let mut distinct: Vec<&str> = cells.clone();
    distinct.sort_unstable();
    distinct.dedup();
    let uniqueness_score = distinct.len() as f64 / cells.len() as f64;

    TEXT_WEIGHT * text_score
        + UNIQUENESS_WEIGHT * uniqueness_score
        + LENGTH_WEIGHT * length_affinity(&cells, following)
}

/// Closeness of the candidate's mean cell length to the mean cell length of
/// the rows below it, on a 0..=1 scale. Rows with nothing below them get a
/// neutral 0.5.
fn length_affinity(cells: &[&str], following: &[Vec<String>]) -> f64 {
    let candidate_mean = mean_length(cells.iter().copied());
    let data_cells: Vec<&str> = following
        .iter()
        .flat_map(|row| row.iter().map(|cell| cell.trim()))
        .filter(|cell| !cell.is_empty())
        .collect();
    if data_cells.is_empty() {
        return 0.5;
    }
    let data_mean = mean_length(data_cells.iter().copied());
    let larger = candidate_mean.max(data_mean);
    if larger == 0.0 {
        return 0.5;
    }
    1.0 - ((candidate_mean - data_mean).abs() / larger)
}

fn mean_length<'a, I>(cells: I) -> f64
where
    I: IntoIterator<Item = &'a str>,
{
    let mut total = 0usize;
    let mut count = 0usize;
    for cell in cells {
        total += cell.chars().count();
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

fn value_is_data_like(value: &str) -> bool {
    if value.parse::<f64>().is_ok() || value.parse::<Decimal>().is_ok() {
        return true;
    }
    if DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
    {
        return true;
    }
    DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
}

/// Infers one [`ColumnType`] per column of the header row at
/// `headers_offset`, examining every sampled row below it.
pub fn guess_types(sample: &[Vec<String>], headers_offset: usize) -> Vec<ColumnType> {
    let Some(header_row) = sample.get(headers_offset) else {
        return Vec::new();
    };
    let data_rows = &sample[headers_offset + 1..];

    (0..header_row.len())
        .map(|idx| {
            let values: Vec<&str> = data_rows
                .iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .collect();
            decide_column_type(&values)
        })
        .collect()
}

fn decide_column_type(values: &[&str]) -> ColumnType {
    if values.is_empty() {
        return ColumnType::String;
    }
    if values.iter().all(|v| v.parse::<i64>().is_ok()) {
        return ColumnType::Integer;
    }
    if values.iter().all(|v| v.parse::<f64>().is_ok()) {
        return ColumnType::Float;
    }
    if values.iter().all(|v| v.parse::<Decimal>().is_ok()) {
        return ColumnType::Decimal;
    }
    if values.iter().all(|v| is_boolean_token(v)) {
        return ColumnType::Boolean;
    }
    if let Some(format) = detect_date_format(values.iter().copied()) {
        return ColumnType::Date {
            format: format.to_string(),
        };
    }
    if let Some(format) = detect_datetime_format(values.iter().copied()) {
        return ColumnType::DateTime {
            format: format.to_string(),
        };
    }
    ColumnType::String
}

fn is_boolean_token(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "false" | "t" | "f" | "yes" | "no" | "y" | "n" | "1" | "0"
    )
}
