pub mod cli;
pub mod data;
pub mod descriptor;
pub mod error;
pub mod guess;
pub mod identifier;
pub mod io_utils;
pub mod load;
pub mod pipeline;
pub mod preview;
pub mod schema;
pub mod table;

use std::{env, path::PathBuf, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use itertools::Itertools;
use log::{LevelFilter, error, info};

use crate::{
    cli::{Cli, Commands},
    descriptor::FileDescriptor,
    io_utils::ReadOptions,
    load::CountingSink,
    pipeline::CoercionMode,
    schema::{Specification, TableDef},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_structing", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Schema(args) => handle_schema(&args),
        Commands::Load(args) => handle_load(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}

/// Infers every input file independently: one file's failure never aborts
/// its siblings. All failures are collected, logged, and reported together
/// at the end; the specification is still written when at least one file
/// succeeded.
fn handle_schema(args: &cli::SchemaArgs) -> Result<()> {
    let mut tables = Vec::with_capacity(args.inputs.len());
    let mut failures: Vec<(PathBuf, anyhow::Error)> = Vec::new();

    for input in &args.inputs {
        match infer_table(input, args) {
            Ok(table) => {
                info!(
                    "Inferred table '{}' with {} column(s) from {:?}",
                    table.name,
                    table.columns.len(),
                    input
                );
                tables.push(table);
            }
            Err(err) => {
                error!("Skipping {input:?}: {err:#}");
                failures.push((input.clone(), err));
            }
        }
    }

    if !tables.is_empty() {
        let spec = Specification::new(tables);
        spec.save(&args.output)
            .with_context(|| format!("Writing specification to {:?}", args.output))?;
        info!(
            "Specification for {} table(s) written to {:?}",
            spec.tables.len(),
            args.output
        );
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(anyhow!(
            "Schema inference failed for {} of {} file(s): {}",
            failures.len(),
            args.inputs.len(),
            failures
                .iter()
                .map(|(path, _)| format!("{path:?}"))
                .join(", ")
        ))
    }
}

fn infer_table(input: &PathBuf, args: &cli::SchemaArgs) -> Result<TableDef> {
    let options = ReadOptions::resolve(input, args.delimiter, args.input_encoding.as_deref())?;
    info!(
        "Probing '{}' with delimiter '{}'",
        input.display(),
        printable_delimiter(options.delimiter)
    );
    let descriptor = FileDescriptor::from_file(input, &options, args.sample_rows)?;
    Ok(TableDef::from_descriptor(descriptor)?)
}

fn handle_load(args: &cli::LoadArgs) -> Result<()> {
    let spec = Specification::load(&args.spec)?;
    if spec.is_empty() {
        return Err(anyhow!(
            "Specification {:?} does not define any tables",
            args.spec
        ));
    }

    let mode = if args.lenient {
        CoercionMode::Lenient
    } else {
        CoercionMode::Strict
    };
    let mut sink = CountingSink::default();

    // Per-table delimiter/encoding resolution, since tables may mix .csv
    // and .tsv sources.
    for table in &spec.tables {
        let options = ReadOptions::resolve(
            &table.file.file_name,
            args.delimiter,
            args.input_encoding.as_deref(),
        )?;
        let single = Specification::new(vec![table.clone()]);
        load::run(&single, &options, mode, args.batch_size, &mut sink)
            .with_context(|| format!("Loading table '{}'", table.name))?;
    }

    info!(
        "Loaded {} row(s) across {} table(s) from {:?}",
        sink.total_rows(),
        sink.tables(),
        args.spec
    );
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
