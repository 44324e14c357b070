//! Human-readable run summary on stderr and optional table preview on stdout.

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::prepare::PrepareReport;

pub fn print_report(report: &PrepareReport) {
    let meta = &report.metadata;
    eprintln!(
        "Wrote {} rows to {} (model_id={}) in {:.2}s",
        meta.rows,
        report.path.display(),
        meta.model_id,
        report.elapsed_secs
    );
    if meta.uses_placeholders() {
        eprintln!(
            "WARNING: placeholder values used for: {}",
            meta.placeholder_features.join(", ")
        );
        eprintln!("         Enrich features before training production models.");
    }
}

/// Print the first `rows` rows as a table.
pub fn print_preview(batch: &RecordBatch, rows: usize) -> anyhow::Result<()> {
    let head = batch.slice(0, rows.min(batch.num_rows()));
    println!("{}", pretty_format_batches(&[head])?);
    Ok(())
}
