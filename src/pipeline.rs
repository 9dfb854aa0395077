//! Lazy transformation of raw CSV rows into typed row records.
//!
//! [`transform`] opens the descriptor's file and returns a forward-only
//! iterator. Every row passes through three fixed stages: the first
//! `offset + 1` physical rows are discarded (pre-header rows plus the header
//! itself), remaining cells are zipped positionally with the descriptor's
//! headers, and each cell is coerced with its column's type. Blank cells
//! become `None`; a non-blank cell that refuses to parse is a
//! [`StructingError::TypeCoercion`] carrying the file, 1-based physical row
//! number, column header, and offending text. Dropping the stream closes the
//! underlying file handle, which is the only cancellation primitive.

use std::{io::Read, sync::Arc};

use anyhow::{Context, Result};
use log::warn;

use crate::{
    data::{Value, parse_typed_value},
    descriptor::FileDescriptor,
    error::StructingError,
    io_utils::{self, ReadOptions},
};

/// Policy for cells that fail to parse under their inferred type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionMode {
    /// Unparsable non-blank cells are hard errors.
    #[default]
    Strict,
    /// Unparsable cells are substituted with null and logged. Explicit
    /// opt-in only.
    Lenient,
}

/// One transformed row: typed values keyed positionally by the descriptor's
/// headers.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    headers: Arc<[String]>,
    values: Vec<Option<Value>>,
}

impl RowRecord {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn get(&self, header: &str) -> Option<&Option<Value>> {
        self.headers
            .iter()
            .position(|h| h == header)
            .map(|idx| &self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Option<Value>)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Opens the descriptor's file and returns the typed row stream. The stream
/// is restartable only by calling `transform` again.
pub fn transform(
    descriptor: &FileDescriptor,
    options: &ReadOptions,
    mode: CoercionMode,
) -> Result<RowStream> {
    let mut reader = io_utils::open_raw_csv_reader(&descriptor.file_name, options.delimiter)
        .with_context(|| format!("Opening {:?} for transformation", descriptor.file_name))?;

    // Offset skip: the header row itself plus any rows above it.
    let mut record = csv::ByteRecord::new();
    let mut skipped = 0usize;
    while skipped < descriptor.offset + 1 {
        if !reader
            .read_byte_record(&mut record)
            .with_context(|| format!("Skipping leading rows of {:?}", descriptor.file_name))?
        {
            break;
        }
        skipped += 1;
    }

    Ok(RowStream {
        reader,
        record,
        descriptor: descriptor.clone(),
        headers: descriptor.headers.clone().into(),
        options: *options,
        mode,
        next_row: skipped + 1,
    })
}

pub struct RowStream {
    reader: csv::Reader<Box<dyn Read>>,
    record: csv::ByteRecord,
    descriptor: FileDescriptor,
    headers: Arc<[String]>,
    options: ReadOptions,
    mode: CoercionMode,
    /// 1-based physical row number of the next record to be read.
    next_row: usize,
}

impl RowStream {
    fn coerce_record(&self, row_number: usize) -> Result<RowRecord, StructingError> {
        let mut values = Vec::with_capacity(self.descriptor.column_count());
        for (idx, (header, datatype)) in self
            .descriptor
            .headers
            .iter()
            .zip(self.descriptor.types.iter())
            .enumerate()
        {
            // Rows shorter than the header set read as blank cells; extra
            // trailing cells are ignored.
            let raw = match self.record.get(idx) {
                Some(bytes) if !bytes.is_empty() => {
                    io_utils::decode_bytes(bytes, self.options.encoding).map_err(|_| {
                        StructingError::Decode {
                            file: self.descriptor.file_name.clone(),
                            row: row_number,
                            encoding: self.options.encoding.name(),
                        }
                    })?
                }
                _ => String::new(),
            };

            match parse_typed_value(&raw, datatype) {
                Ok(value) => values.push(value),
                Err(_) if self.mode == CoercionMode::Lenient => {
                    warn!(
                        "{:?}: row {row_number}, column '{header}': substituting null for '{}'",
                        self.descriptor.file_name,
                        raw.trim()
                    );
                    values.push(None);
                }
                Err(_) => {
                    return Err(StructingError::TypeCoercion {
                        file: self.descriptor.file_name.clone(),
                        row: row_number,
                        column: header.clone(),
                        value: raw.trim().to_string(),
                        datatype: datatype.signature(),
                    });
                }
            }
        }
        Ok(RowRecord {
            headers: Arc::clone(&self.headers),
            values,
        })
    }
}

impl Iterator for RowStream {
    type Item = Result<RowRecord, StructingError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_byte_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                let row_number = self.next_row;
                self.next_row += 1;
                Some(self.coerce_record(row_number))
            }
            Err(err) => Some(Err(StructingError::Csv(err))),
        }
    }
}
