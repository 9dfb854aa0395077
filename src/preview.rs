//! Inference preview: shows the first rows of a file as they would load.
//!
//! Runs the full inference path (sample, header guess, type guess,
//! identifier normalization), transforms the leading rows, and prints them
//! as an elastic table with normalized column names and type signatures.

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::PreviewArgs,
    descriptor::FileDescriptor,
    io_utils::ReadOptions,
    pipeline::{self, CoercionMode},
    schema::TableDef,
    table,
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let options = ReadOptions::resolve(
        &args.input,
        args.delimiter,
        args.input_encoding.as_deref(),
    )?;
    let descriptor = FileDescriptor::from_file(&args.input, &options, args.sample_rows)
        .with_context(|| format!("Inferring structure of {:?}", args.input))?;
    let table_def = TableDef::from_descriptor(descriptor)
        .with_context(|| format!("Building table definition for {:?}", args.input))?;

    let headers: Vec<String> = table_def
        .columns
        .iter()
        .zip(table_def.file.types.iter())
        .map(|(column, ty)| format!("{} ({})", column.name, ty.as_str()))
        .collect();

    let descriptor = table_def.load_descriptor()?;
    let mut rows = Vec::with_capacity(args.rows);
    for record in pipeline::transform(&descriptor, &options, CoercionMode::Strict)?.take(args.rows)
    {
        let record =
            record.with_context(|| format!("Transforming preview rows of {:?}", args.input))?;
        rows.push(
            record
                .values()
                .iter()
                .map(|value| {
                    value
                        .as_ref()
                        .map(|v| v.as_display())
                        .unwrap_or_default()
                })
                .collect(),
        );
    }

    table::print_table(&headers, &rows);
    info!(
        "Previewed {} row(s) of table '{}' from {:?}",
        rows.len(),
        table_def.name,
        args.input
    );
    Ok(())
}
