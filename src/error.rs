//! Error kinds surfaced by the inference and transformation core.
//!
//! Commands wrap these in `anyhow` context at the orchestration layer;
//! the variants here exist so callers can tell a bad header sample apart
//! from a cell that refuses to coerce.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructingError {
    /// The leading sample of a file contained no row that looked like
    /// column headers.
    #[error("no plausible header row found: {reason}")]
    HeaderGuess { reason: String },

    /// A header or file name did not normalize into a legal database
    /// identifier.
    #[error("'{original}' does not normalize to a usable identifier: {reason}")]
    InvalidIdentifier { original: String, reason: String },

    /// A non-blank cell failed to parse under its column's inferred type.
    /// Fatal for that row under strict coercion.
    #[error("{file:?}: row {row}, column '{column}': cannot parse '{value}' as {datatype}")]
    TypeCoercion {
        file: PathBuf,
        row: usize,
        column: String,
        value: String,
        datatype: String,
    },

    /// A cell's bytes could not be decoded with the configured encoding.
    #[error("{file:?}: row {row}: undecodable bytes for encoding {encoding}")]
    Decode {
        file: PathBuf,
        row: usize,
        encoding: &'static str,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
