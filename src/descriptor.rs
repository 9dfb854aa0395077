//! File descriptors: the serializable unit of inference.
//!
//! A [`FileDescriptor`] records everything needed to re-read a delimited
//! file the same way twice: its path, the guessed header names, the row
//! offset where data begins, and one inferred column type per header.
//! Inference runs once in [`FileDescriptor::from_file`]; afterwards the
//! descriptor is immutable and round-trips through serde verbatim.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::ColumnType,
    guess,
    io_utils::{self, ReadOptions},
};

/// Rows sampled for type inference when the caller does not override it.
/// Zero means a full scan.
pub const DEFAULT_SAMPLE_ROWS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileDescriptor {
    pub file_name: PathBuf,
    pub headers: Vec<String>,
    pub offset: usize,
    pub types: Vec<ColumnType>,
}

impl FileDescriptor {
    pub fn new(
        file_name: PathBuf,
        headers: Vec<String>,
        offset: usize,
        types: Vec<ColumnType>,
    ) -> Result<Self> {
        ensure!(
            headers.len() == types.len(),
            "Descriptor for {file_name:?} has {} header(s) but {} type(s)",
            headers.len(),
            types.len()
        );
        let duplicates: Vec<&String> = headers.iter().duplicates().collect();
        ensure!(
            duplicates.is_empty(),
            "Descriptor for {file_name:?} has duplicate header(s): {}",
            duplicates.iter().join(", ")
        );
        Ok(Self {
            file_name,
            headers,
            offset,
            types,
        })
    }

    /// Samples `path` and guesses its header row, data offset, and column
    /// types.
    pub fn from_file(path: &Path, options: &ReadOptions, sample_rows: usize) -> Result<Self> {
        let sample = io_utils::read_sample(path, options, sample_rows)
            .with_context(|| format!("Sampling {path:?}"))?;
        let (offset, headers) =
            guess::guess_header(&sample).with_context(|| format!("Guessing headers of {path:?}"))?;
        let types = guess::guess_types(&sample, offset);
        debug!("File: {path:?}");
        debug!("Headers: {headers:?} (offset {offset})");
        debug!("Types: {}", types.iter().join(", "));
        Self::new(path.to_path_buf(), headers, offset, types)
    }

    /// Copy of this descriptor keyed by replacement header names. Used by
    /// the schema layer to re-key row records with normalized identifiers.
    pub fn with_headers(&self, headers: Vec<String>) -> Result<Self> {
        Self::new(
            self.file_name.clone(),
            headers,
            self.offset,
            self.types.clone(),
        )
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

#[cfg(test)]
mod tests {
    use encoding_rs::UTF_8;
    use tempfile::tempdir;

    use super::*;
    use crate::data::ColumnType;

    fn options() -> ReadOptions {
        ReadOptions {
            delimiter: b',',
            encoding: UTF_8,
        }
    }

    #[test]
    fn from_file_infers_headers_offset_and_types() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("people.csv");
        std::fs::write(
            &path,
            "Name,Age,Joined\nAlice,30,2020-01-02\nBob,41,2019-11-20\n",
        )
        .expect("write fixture");

        let descriptor =
            FileDescriptor::from_file(&path, &options(), DEFAULT_SAMPLE_ROWS).expect("infer");
        assert_eq!(descriptor.offset, 0);
        assert_eq!(descriptor.headers, vec!["Name", "Age", "Joined"]);
        assert_eq!(
            descriptor.types,
            vec![
                ColumnType::String,
                ColumnType::Integer,
                ColumnType::Date {
                    format: "%Y-%m-%d".to_string()
                },
            ]
        );
    }

    #[test]
    fn new_rejects_header_type_length_mismatch() {
        let result = FileDescriptor::new(
            PathBuf::from("a.csv"),
            vec!["a".to_string(), "b".to_string()],
            0,
            vec![ColumnType::String],
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_rejects_duplicate_headers() {
        let result = FileDescriptor::new(
            PathBuf::from("a.csv"),
            vec!["id".to_string(), "id".to_string()],
            0,
            vec![ColumnType::Integer, ColumnType::Integer],
        );
        assert!(result.is_err());
    }

    #[test]
    fn descriptor_round_trips_through_yaml() {
        let descriptor = FileDescriptor::new(
            PathBuf::from("people.csv"),
            vec!["Name".to_string(), "Joined".to_string()],
            1,
            vec![ColumnType::String, ColumnType::date()],
        )
        .expect("descriptor");

        let rendered = serde_yaml::to_string(&descriptor).expect("serialize");
        let reparsed: FileDescriptor = serde_yaml::from_str(&rendered).expect("parse");
        assert_eq!(reparsed, descriptor);
    }
}
