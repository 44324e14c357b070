use std::fmt;

use arrow::error::ArrowError;
use thiserror::Error;
use trainprep_core::ModelId;

/// Which table a schema or emptiness check failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTable {
    Evaluations,
    Outcomes,
    Merged,
}

impl fmt::Display for InputTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Evaluations => "risk_evaluations",
            Self::Outcomes => "ml_outcomes",
            Self::Merged => "joined table",
        })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{table} is empty")]
    EmptyInput { table: InputTable },

    #[error("{table} missing required column: {column}")]
    Schema {
        table: InputTable,
        column: &'static str,
    },

    #[error("no trainable rows for {mode}: {reason}")]
    NoTrainableRows {
        mode: ModelId,
        reason: &'static str,
    },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}
