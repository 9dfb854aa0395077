//! Table and column definitions, and the rendered specification artifact.
//!
//! A [`Specification`] is the reusable output of schema generation: an
//! ordered list of table definitions followed by the file descriptors they
//! came from, so the load step reconstructs identical parsing behavior
//! without re-running inference. It persists as plain data (YAML or JSON by
//! output extension), never as executable code, and rendering is
//! deterministic: tables and columns keep insertion order, and the same
//! specification always renders to byte-identical text.

use std::{collections::HashSet, fmt, fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    data::ColumnType,
    descriptor::FileDescriptor,
    error::StructingError,
    identifier::{self, COLUMN_PREFIX, TABLE_PREFIX},
};

/// Database column types a [`ColumnType`] maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Integer,
    Float,
    Numeric,
    Boolean,
    Date,
    DateTime,
    String,
}

impl DbType {
    pub fn from_column_type(ty: &ColumnType) -> Self {
        match ty {
            ColumnType::Integer => DbType::Integer,
            ColumnType::Float => DbType::Float,
            ColumnType::Decimal => DbType::Numeric,
            ColumnType::Boolean => DbType::Boolean,
            ColumnType::Date { .. } => DbType::Date,
            ColumnType::DateTime { .. } => DbType::DateTime,
            ColumnType::String => DbType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Integer => "integer",
            DbType::Float => "float",
            DbType::Numeric => "numeric",
            DbType::Boolean => "boolean",
            DbType::Date => "date",
            DbType::DateTime => "datetime",
            DbType::String => "string",
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDef {
    /// The header exactly as it appears in the source file.
    pub header: String,
    /// Normalized identifier, unique within its table.
    pub name: String,
    pub datatype: DbType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub file: FileDescriptor,
}

impl TableDef {
    /// Builds a table definition from an inferred descriptor. The table name
    /// comes from the file's base name; column identifiers that collide
    /// after normalization are disambiguated with a numeric suffix.
    pub fn from_descriptor(descriptor: FileDescriptor) -> Result<Self, StructingError> {
        let stem = descriptor
            .file_name
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let name = identifier::normalize(stem, TABLE_PREFIX)?;

        let mut used = HashSet::new();
        let mut columns = Vec::with_capacity(descriptor.column_count());
        for (header, ty) in descriptor.headers.iter().zip(descriptor.types.iter()) {
            let base = identifier::normalize(header, COLUMN_PREFIX)?;
            let unique = disambiguate(base, &mut used);
            columns.push(ColumnDef {
                header: header.clone(),
                name: unique,
                datatype: DbType::from_column_type(ty),
            });
        }

        Ok(Self {
            name,
            columns,
            file: descriptor,
        })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Descriptor re-keyed with normalized column identifiers, so the row
    /// records produced for loading match the table's column names.
    pub fn load_descriptor(&self) -> Result<FileDescriptor> {
        self.file.with_headers(self.column_names())
    }
}

fn disambiguate(base: String, used: &mut HashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut suffix = 2usize;
    loop {
        let candidate = format!("{base}_{suffix}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Persistence format, resolved from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Yaml,
    Json,
}

pub fn resolve_spec_format(path: &Path) -> SpecFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => SpecFormat::Json,
        _ => SpecFormat::Yaml,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Specification {
    pub tables: Vec<TableDef>,
}

/// On-disk shape: table declarations first, then the parallel list of
/// originating file descriptors in the same order.
#[derive(Debug, Serialize, Deserialize)]
struct SpecDocument {
    tables: Vec<TableDocument>,
    files: Vec<FileDescriptor>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TableDocument {
    name: String,
    columns: Vec<ColumnDef>,
}

impl Specification {
    pub fn new(tables: Vec<TableDef>) -> Self {
        Self { tables }
    }

    fn to_document(&self) -> SpecDocument {
        SpecDocument {
            tables: self
                .tables
                .iter()
                .map(|table| TableDocument {
                    name: table.name.clone(),
                    columns: table.columns.clone(),
                })
                .collect(),
            files: self.tables.iter().map(|table| table.file.clone()).collect(),
        }
    }

    fn from_document(document: SpecDocument) -> Result<Self> {
        ensure!(
            document.tables.len() == document.files.len(),
            "Specification lists {} table(s) but {} file(s)",
            document.tables.len(),
            document.files.len()
        );
        let tables = document
            .tables
            .into_iter()
            .zip(document.files)
            .map(|(table, file)| {
                ensure!(
                    table.columns.len() == file.column_count(),
                    "Table '{}' defines {} column(s) but its file descriptor has {}",
                    table.name,
                    table.columns.len(),
                    file.column_count()
                );
                Ok(TableDef {
                    name: table.name,
                    columns: table.columns,
                    file,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tables })
    }

    /// Renders the specification to text. Byte-identical for equal inputs.
    pub fn render(&self, format: SpecFormat) -> Result<String> {
        let document = self.to_document();
        match format {
            SpecFormat::Yaml => {
                serde_yaml::to_string(&document).context("Rendering specification as YAML")
            }
            SpecFormat::Json => {
                let mut rendered = serde_json::to_string_pretty(&document)
                    .context("Rendering specification as JSON")?;
                rendered.push('\n');
                Ok(rendered)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let rendered = self.render(resolve_spec_format(path))?;
        fs::write(path, rendered).with_context(|| format!("Writing specification to {path:?}"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Reading specification from {path:?}"))?;
        let document: SpecDocument = match resolve_spec_format(path) {
            SpecFormat::Yaml => serde_yaml::from_str(&text)
                .with_context(|| format!("Parsing YAML specification {path:?}"))?,
            SpecFormat::Json => serde_json::from_str(&text)
                .with_context(|| format!("Parsing JSON specification {path:?}"))?,
        };
        Self::from_document(document)
            .with_context(|| format!("Validating specification {path:?}"))
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TryFrom<FileDescriptor> for TableDef {
    type Error = StructingError;

    fn try_from(descriptor: FileDescriptor) -> Result<Self, Self::Error> {
        Self::from_descriptor(descriptor)
    }
}
