//! CSV reading, encoding, and delimiter resolution.
//!
//! Delimiters resolve from the file extension (`.tsv` maps to tab) unless
//! overridden. Input bytes decode through `encoding_rs`, defaulting to
//! UTF-8. Readers are built without the `csv` crate's own header handling:
//! header and offset discovery belong to the guesser, so every record is
//! read raw, and readers stay flexible because rows above the data offset
//! are often ragged.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Per-file read configuration shared by sampling and transformation.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
}

impl ReadOptions {
    pub fn resolve(
        path: &Path,
        delimiter: Option<u8>,
        encoding_label: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            delimiter: resolve_input_delimiter(path, delimiter),
            encoding: resolve_encoding(encoding_label)?,
        })
    }
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_raw_csv_reader(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let file: Box<dyn Read> = Box::new(BufReader::new(
        File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
    ));
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    Ok(builder.from_reader(file))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads up to `max_rows` leading records of `path`, decoded into strings.
/// `max_rows` of zero means the whole file.
pub fn read_sample(path: &Path, options: &ReadOptions, max_rows: usize) -> Result<Vec<Vec<String>>> {
    let mut reader = open_raw_csv_reader(path, options.delimiter)?;
    let mut record = csv::ByteRecord::new();
    let mut rows = Vec::new();
    while reader.read_byte_record(&mut record)? {
        rows.push(decode_record(&record, options.encoding).with_context(|| {
            format!("Decoding row {} of {path:?}", rows.len() + 1)
        })?);
        if max_rows > 0 && rows.len() >= max_rows {
            break;
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use encoding_rs::WINDOWS_1252;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn tsv_extension_switches_default_delimiter() {
        assert_eq!(
            resolve_input_delimiter(Path::new("data.tsv"), None),
            DEFAULT_TSV_DELIMITER
        );
        assert_eq!(
            resolve_input_delimiter(Path::new("data.csv"), None),
            DEFAULT_CSV_DELIMITER
        );
        assert_eq!(resolve_input_delimiter(Path::new("data.tsv"), Some(b';')), b';');
    }

    #[test]
    fn resolve_encoding_accepts_known_labels() {
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
        assert_eq!(
            resolve_encoding(Some("windows-1252")).unwrap(),
            WINDOWS_1252
        );
        assert!(resolve_encoding(Some("martian")).is_err());
    }

    #[test]
    fn read_sample_decodes_non_utf8_input() {
        let content = "id,name\n1,Caf\u{e9}\n";
        let (encoded, _, _) = WINDOWS_1252.encode(content);
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(&encoded).expect("write sample");

        let options = ReadOptions {
            delimiter: b',',
            encoding: WINDOWS_1252,
        };
        let rows = read_sample(file.path(), &options, 0).expect("sample");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], "Caf\u{e9}");
    }

    #[test]
    fn read_sample_honors_row_limit_and_ragged_rows() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"report title\na,b,c\n1,2,3\n4,5,6\n")
            .expect("write sample");

        let options = ReadOptions {
            delimiter: b',',
            encoding: UTF_8,
        };
        let rows = read_sample(file.path(), &options, 3).expect("sample");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["report title".to_string()]);
        assert_eq!(rows[1].len(), 3);
    }
}
