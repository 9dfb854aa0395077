//! Database identifier normalization for headers and table names.
//!
//! A raw header becomes a legal identifier by prepending a prefix when the
//! name starts with a digit, collapsing every whitespace run into a single
//! underscore, and lower-casing the result. Anything left over that is not
//! an ASCII alphanumeric or underscore is rejected rather than repaired.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::StructingError;

/// Prefix applied to digit-leading column names.
pub const COLUMN_PREFIX: &str = "C";
/// Prefix applied to digit-leading table names.
pub const TABLE_PREFIX: &str = "T";

static LEADING_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d").expect("valid leading-digit pattern"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static LEGAL_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("valid identifier pattern"));

/// Normalizes `name` into a database-legal identifier.
///
/// `prefix` is prepended only when the name starts with a decimal digit, so
/// `3rd Quarter` becomes `c3rd_quarter` as a column but `t3rd_quarter` as a
/// table name.
pub fn normalize(name: &str, prefix: &str) -> Result<String, StructingError> {
    let prefixed = if LEADING_DIGIT.is_match(name) {
        format!("{prefix}{name}")
    } else {
        name.to_string()
    };
    let collapsed = WHITESPACE_RUN
        .replace_all(prefixed.trim(), "_")
        .to_lowercase();

    if collapsed.is_empty() {
        return Err(StructingError::InvalidIdentifier {
            original: name.to_string(),
            reason: "empty after normalization".to_string(),
        });
    }
    if !LEGAL_IDENTIFIER.is_match(&collapsed) {
        return Err(StructingError::InvalidIdentifier {
            original: name.to_string(),
            reason: format!("'{collapsed}' contains characters illegal in database identifiers"),
        });
    }
    Ok(collapsed)
}
