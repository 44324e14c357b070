//! Load both inputs, run the pipeline, write the projected table.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use arrow::record_batch::RecordBatch;
use trainprep_core::RunMetadata;
use trainprep_pipeline::PrepareOptions;

pub struct PrepareArgs {
    pub evaluations: String,
    pub outcomes: String,
    pub output: PathBuf,
    pub options: PrepareOptions,
}

pub struct PrepareReport {
    pub path: PathBuf,
    pub batch: RecordBatch,
    pub metadata: RunMetadata,
    pub elapsed_secs: f64,
}

/// Run the full preparation: read Parquet → join and project → write Parquet.
///
/// Nothing is written unless every stage succeeds.
pub fn run_prepare(args: &PrepareArgs) -> anyhow::Result<PrepareReport> {
    let start = Instant::now();

    // 1. Read both inputs fully.
    let evaluations =
        trainprep_store::load_table(&args.evaluations).context("reading risk_evaluations")?;
    let outcomes = trainprep_store::load_table(&args.outcomes).context("reading ml_outcomes")?;

    // 2. Join, derive targets, filter, project.
    let prepared = trainprep_pipeline::run(&evaluations, outcomes, &args.options)?;

    // 3. Write once.
    let path = trainprep_store::write_partitioned(
        &args.output,
        args.options.partition_date.as_deref(),
        &prepared.batch,
    )
    .context("writing training table")?;

    Ok(PrepareReport {
        path,
        batch: prepared.batch,
        metadata: prepared.metadata,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
