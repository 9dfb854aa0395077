//! Column types and typed cell values.
//!
//! [`ColumnType`] is the closed set of types the guesser can infer. Date and
//! date-time variants carry the concrete `chrono` format string that matched
//! during inference, so a persisted descriptor reproduces the exact parsing
//! behavior of the original run. [`parse_typed_value`] is the single coercion
//! point used by both the type guesser and the transformation pipeline: blank
//! input yields `None`, unparsable input yields an error.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail, ensure};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Decimal,
    Boolean,
    Date { format: String },
    DateTime { format: String },
    String,
}

impl ColumnType {
    pub fn date() -> Self {
        ColumnType::Date {
            format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn datetime() -> Self {
        ColumnType::DateTime {
            format: DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Decimal => "decimal",
            ColumnType::Boolean => "boolean",
            ColumnType::Date { .. } => "date",
            ColumnType::DateTime { .. } => "datetime",
            ColumnType::String => "string",
        }
    }

    /// Token form persisted in specification files, e.g. `date(%Y-%m-%d)`.
    pub fn signature(&self) -> String {
        match self {
            ColumnType::Date { format } => format!("date({format})"),
            ColumnType::DateTime { format } => format!("datetime({format})"),
            _ => self.as_str().to_string(),
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &[
            "integer",
            "float",
            "decimal",
            "boolean",
            "date(format)",
            "datetime(format)",
            "string",
        ]
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature())
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let lowered = trimmed.to_ascii_lowercase();
        match lowered.as_str() {
            "integer" | "int" => Ok(ColumnType::Integer),
            "float" | "double" => Ok(ColumnType::Float),
            "decimal" | "numeric" => Ok(ColumnType::Decimal),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "date" => Ok(ColumnType::date()),
            "datetime" | "timestamp" => Ok(ColumnType::datetime()),
            "string" => Ok(ColumnType::String),
            _ if lowered.starts_with("date(") || lowered.starts_with("datetime(") => {
                parse_temporal_type(trimmed)
            }
            _ => Err(anyhow!(
                "Unknown column type '{value}'. Supported types: {}",
                ColumnType::variants().join(", ")
            )),
        }
    }
}

fn parse_temporal_type(value: &str) -> Result<ColumnType> {
    let start = value
        .find('(')
        .ok_or_else(|| anyhow!("Temporal type must carry a format, e.g. date(%Y-%m-%d)"))?;
    ensure!(
        value.ends_with(')'),
        "Temporal type must close with ')', e.g. date(%Y-%m-%d)"
    );
    let keyword = value[..start].trim().to_ascii_lowercase();
    let format = value[start + 1..value.len() - 1].trim();
    ensure!(!format.is_empty(), "Temporal type format cannot be empty");
    match keyword.as_str() {
        "date" => Ok(ColumnType::Date {
            format: format.to_string(),
        }),
        "datetime" => Ok(ColumnType::DateTime {
            format: format.to_string(),
        }),
        other => Err(anyhow!("Unknown temporal type keyword '{other}'")),
    }
}

impl Serialize for ColumnType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.signature())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        ColumnType::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format(DEFAULT_DATE_FORMAT).to_string(),
            Value::DateTime(dt) => dt.format(DEFAULT_DATETIME_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn parse_naive_date(value: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, format)
        .with_context(|| format!("Failed to parse '{value}' as date with format '{format}'"))
}

pub fn parse_naive_datetime(value: &str, format: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, format)
        .with_context(|| format!("Failed to parse '{value}' as datetime with format '{format}'"))
}

/// Returns the first format under which every value parses as a date, or
/// `None` when no single format covers them all.
pub fn detect_date_format<'a, I>(values: I) -> Option<&'static str>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    DATE_FORMATS.iter().copied().find(|fmt| {
        values
            .clone()
            .into_iter()
            .all(|v| NaiveDate::parse_from_str(v, fmt).is_ok())
    })
}

pub fn detect_datetime_format<'a, I>(values: I) -> Option<&'static str>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    DATETIME_FORMATS.iter().copied().find(|fmt| {
        values
            .clone()
            .into_iter()
            .all(|v| NaiveDateTime::parse_from_str(v, fmt).is_ok())
    })
}

/// Coerces a raw cell into a typed value. Blank input (after trimming)
/// yields `None` regardless of the target type.
pub fn parse_typed_value(value: &str, ty: &ColumnType) -> Result<Option<Value>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed = match ty {
        ColumnType::String => Value::String(trimmed.to_string()),
        ColumnType::Integer => {
            let parsed: i64 = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as integer"))?;
            Value::Integer(parsed)
        }
        ColumnType::Float => {
            let parsed: f64 = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as float"))?;
            Value::Float(parsed)
        }
        ColumnType::Decimal => {
            let parsed: Decimal = trimmed
                .parse()
                .with_context(|| format!("Failed to parse '{trimmed}' as decimal"))?;
            Value::Decimal(parsed)
        }
        ColumnType::Boolean => {
            let lowered = trimmed.to_ascii_lowercase();
            let parsed = match lowered.as_str() {
                "true" | "t" | "yes" | "y" | "1" => true,
                "false" | "f" | "no" | "n" | "0" => false,
                _ => bail!("Failed to parse '{trimmed}' as boolean"),
            };
            Value::Boolean(parsed)
        }
        ColumnType::Date { format } => Value::Date(parse_naive_date(trimmed, format)?),
        ColumnType::DateTime { format } => Value::DateTime(parse_naive_datetime(trimmed, format)?),
    };
    Ok(Some(parsed))
}
