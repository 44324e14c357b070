//! Supervised targets derived from the joined outcome and risk score.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array};
use arrow::compute::filter_record_batch;
use arrow::datatypes::{DataType, Field, Float64Type};
use arrow::record_batch::RecordBatch;
use tracing::{debug, info};
use trainprep_core::columns::{
    IS_CLOSED, OUTCOME, OUTCOME_LOST, OUTCOME_WON, RISK_SCORE, TARGET_RISK, TARGET_WIN, TENANT_ID,
};

use crate::PipelineError;
use crate::array::{f64_column, upsert_columns, utf8_column};

/// Targets for one joined row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Targets {
    /// 1 won, 0 lost, `None` while open or unknown.
    pub target_win: Option<i64>,
    /// Clamped risk score when present, otherwise 1.0 lost / 0.0 won.
    pub target_risk: Option<f64>,
    /// 1 when any outcome has been recorded.
    pub is_closed: i64,
}

impl Targets {
    /// Derive targets from a row's outcome label and risk score.
    ///
    /// A present risk score always decides `target_risk`, even when the outcome
    /// points the other way. NaN scores count as absent. Scores outside [0, 1] are
    /// clamped, never rejected. Any non-null outcome closes the row, including
    /// labels other than `won`/`lost`.
    pub fn derive(outcome: Option<&str>, risk_score: Option<f64>) -> Self {
        let target_win = match outcome {
            Some(OUTCOME_WON) => Some(1),
            Some(OUTCOME_LOST) => Some(0),
            _ => None,
        };
        let target_risk = match risk_score.filter(|s| !s.is_nan()) {
            Some(score) => Some(score.clamp(0.0, 1.0)),
            None => match outcome {
                Some(OUTCOME_LOST) => Some(1.0),
                Some(OUTCOME_WON) => Some(0.0),
                _ => None,
            },
        };
        Self {
            target_win,
            target_risk,
            is_closed: i64::from(outcome.is_some()),
        }
    }
}

/// Append (or overwrite) `target_win`, `target_risk` and `is_closed`.
///
/// A table with no `outcome` column treats every row as open; one with no
/// `riskScore` column falls back to outcome-derived risk for every row.
pub fn derive_targets(merged: &RecordBatch) -> Result<RecordBatch, PipelineError> {
    let rows = merged.num_rows();
    let outcome = utf8_column(merged, OUTCOME)?;
    let risk = f64_column(merged, RISK_SCORE)?;
    if outcome.is_none() {
        debug!("no outcome column; all rows treated as open");
    }

    let outcome = outcome.as_ref().map(|c| c.as_string::<i32>());
    let risk = risk.as_ref().map(|c| c.as_primitive::<Float64Type>());

    let mut win = Vec::with_capacity(rows);
    let mut target_risk = Vec::with_capacity(rows);
    let mut closed = Vec::with_capacity(rows);
    for row in 0..rows {
        let label = outcome.and_then(|c| c.is_valid(row).then(|| c.value(row)));
        let score = risk.and_then(|c| c.is_valid(row).then(|| c.value(row)));
        let t = Targets::derive(label, score);
        win.push(t.target_win);
        target_risk.push(t.target_risk);
        closed.push(t.is_closed);
    }

    let closed_rows: i64 = closed.iter().sum();
    let win = Int64Array::from(win);
    let target_risk = Float64Array::from(target_risk);
    info!(
        rows,
        closed = closed_rows,
        with_target_win = rows - win.null_count(),
        with_target_risk = rows - target_risk.null_count(),
        "derived targets"
    );

    Ok(upsert_columns(
        merged,
        vec![
            (
                Field::new(TARGET_WIN, DataType::Int64, true),
                Arc::new(win) as ArrayRef,
            ),
            (
                Field::new(TARGET_RISK, DataType::Float64, true),
                Arc::new(target_risk) as ArrayRef,
            ),
            (
                Field::new(IS_CLOSED, DataType::Int64, false),
                Arc::new(Int64Array::from(closed)) as ArrayRef,
            ),
        ],
    )?)
}

/// Keep only rows whose `tenantId` equals `tenant` exactly.
///
/// A table without `tenantId` is returned unchanged.
pub fn filter_tenant(batch: &RecordBatch, tenant: &str) -> Result<RecordBatch, PipelineError> {
    let Some(tenants) = utf8_column(batch, TENANT_ID)? else {
        return Ok(batch.clone());
    };
    let keep: BooleanArray = tenants
        .as_string::<i32>()
        .iter()
        .map(|t| Some(t == Some(tenant)))
        .collect();
    let filtered = filter_record_batch(batch, &keep)?;
    info!(
        tenant,
        kept = filtered.num_rows(),
        dropped = batch.num_rows() - filtered.num_rows(),
        "applied tenant filter"
    );
    Ok(filtered)
}
