use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;
use trainprep_core::ModelId;
use trainprep_pipeline::PrepareOptions;

mod display;
mod prepare;

/// Join risk_evaluations with ml_outcomes into /ml_training/{model_id}/ Parquet.
///
/// outcome_joined = base join + targets, for downstream enrichment.
/// risk_scoring | win_probability = + placeholder feature columns so the trainers
/// can consume the file; enrich before training production models.
#[derive(Parser, Debug)]
#[command(name = "trainprep", version, about)]
struct Cli {
    /// risk_evaluations Parquet: file, directory, glob, or abfs:// URI
    #[arg(long, env = "TRAINPREP_RISK_EVALUATIONS_PATH")]
    risk_evaluations_path: String,

    /// ml_outcomes Parquet: file, directory, glob, or abfs:// URI
    #[arg(long, env = "TRAINPREP_ML_OUTCOMES_PATH")]
    ml_outcomes_path: String,

    /// Output Parquet file or directory (e.g. /ml_training/risk_scoring/out.parquet)
    #[arg(long, env = "TRAINPREP_OUTPUT_PATH")]
    output_path: PathBuf,

    /// outcome_joined, risk_scoring or win_probability
    #[arg(long, default_value_t = ModelId::OutcomeJoined)]
    model_id: ModelId,

    /// Keep only rows of this tenant
    #[arg(long)]
    tenant_id: Option<String>,

    /// Partition as YYYY-MM-DD, inserted into the output path (not written into data)
    #[arg(long, value_parser = parse_partition_date)]
    partition_date: Option<String>,

    /// Print the first ROWS rows of the written table
    #[arg(long, value_name = "ROWS")]
    preview: Option<usize>,
}

fn parse_partition_date(s: &str) -> Result<String, String> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|_| s.to_string())
        .map_err(|e| format!("expected YYYY-MM-DD ({e})"))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!("trainprep v{}", env!("CARGO_PKG_VERSION"));

    let args = prepare::PrepareArgs {
        evaluations: cli.risk_evaluations_path,
        outcomes: cli.ml_outcomes_path,
        output: cli.output_path,
        options: PrepareOptions {
            model_id: cli.model_id,
            tenant_id: cli.tenant_id,
            partition_date: cli.partition_date,
        },
    };

    match prepare::run_prepare(&args).and_then(|report| {
        display::print_report(&report);
        if let Some(rows) = cli.preview {
            display::print_preview(&report.batch, rows)?;
        }
        Ok(())
    }) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
