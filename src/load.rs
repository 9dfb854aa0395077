//! Batch loading: groups the typed row stream into fixed-size batches and
//! drives them through a [`RowSink`].
//!
//! The database executor itself lives outside this crate; callers implement
//! [`RowSink`] over their insert machinery. The built-in [`CountingSink`]
//! consumes and counts rows, which makes `load` usable as a full-file
//! coercion check without a database attached. Progress lines go through a
//! [`Throttle`] so long loads report at most once per interval.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;

use crate::{
    error::StructingError,
    io_utils::ReadOptions,
    pipeline::{self, CoercionMode, RowRecord},
    schema::{Specification, TableDef},
};

pub const DEFAULT_BATCH_SIZE: usize = 10_000;
pub const PROGRESS_MIN_INTERVAL: Duration = Duration::from_secs(10);

/// Receives typed row batches, one table at a time.
pub trait RowSink {
    /// Called before the first batch of a table. A database-backed sink
    /// would create or truncate the target table here.
    fn begin_table(&mut self, table: &TableDef) -> Result<()>;

    fn write_batch(&mut self, table: &TableDef, batch: &[RowRecord]) -> Result<()>;

    /// Called once per table after the last batch, with the total row count.
    fn finish_table(&mut self, table: &TableDef, rows: usize) -> Result<()>;
}

/// Sink that only counts rows. Used for dry-run loads and coercion checks.
#[derive(Debug, Default)]
pub struct CountingSink {
    total_rows: usize,
    tables: usize,
}

impl CountingSink {
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn tables(&self) -> usize {
        self.tables
    }
}

impl RowSink for CountingSink {
    fn begin_table(&mut self, _table: &TableDef) -> Result<()> {
        self.tables += 1;
        Ok(())
    }

    fn write_batch(&mut self, _table: &TableDef, batch: &[RowRecord]) -> Result<()> {
        self.total_rows += batch.len();
        Ok(())
    }

    fn finish_table(&mut self, _table: &TableDef, _rows: usize) -> Result<()> {
        Ok(())
    }
}

/// Suppresses repeated progress reports within a minimum interval. The
/// first call is always ready.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Groups a fallible row stream into `Vec`s of `size` rows; the final batch
/// may be shorter. A stream error is yielded immediately and any partially
/// accumulated batch is dropped with it.
pub fn batches<I>(rows: I, size: usize) -> Batches<I>
where
    I: Iterator<Item = Result<RowRecord, StructingError>>,
{
    Batches {
        rows,
        size: size.max(1),
    }
}

pub struct Batches<I> {
    rows: I,
    size: usize,
}

impl<I> Iterator for Batches<I>
where
    I: Iterator<Item = Result<RowRecord, StructingError>>,
{
    type Item = Result<Vec<RowRecord>, StructingError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.rows.next() {
                Some(Ok(row)) => batch.push(row),
                Some(Err(err)) => return Some(Err(err)),
                None => break,
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

/// Streams every table of `spec` through `sink` in batches of `batch_size`.
pub fn run(
    spec: &Specification,
    options: &ReadOptions,
    mode: CoercionMode,
    batch_size: usize,
    sink: &mut dyn RowSink,
) -> Result<()> {
    for table in &spec.tables {
        sink.begin_table(table)
            .with_context(|| format!("Beginning table '{}'", table.name))?;

        let descriptor = table.load_descriptor()?;
        let rows = pipeline::transform(&descriptor, options, mode)?;
        let mut throttle = Throttle::new(PROGRESS_MIN_INTERVAL);
        let mut loaded = 0usize;

        for batch in batches(rows, batch_size) {
            let batch =
                batch.with_context(|| format!("Transforming rows for table '{}'", table.name))?;
            sink.write_batch(table, &batch)
                .with_context(|| format!("Writing batch for table '{}'", table.name))?;
            loaded += batch.len();
            if throttle.ready() {
                info!("{loaded} row(s) loaded from {:?}", table.file.file_name);
            }
        }

        sink.finish_table(table, loaded)
            .with_context(|| format!("Finishing table '{}'", table.name))?;
        info!(
            "FINISHED: {loaded} row(s) loaded from {:?}",
            table.file.file_name
        );
    }
    Ok(())
}
