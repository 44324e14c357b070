//! Join key validation and outcome tenant back-fill.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use tracing::warn;
use trainprep_core::columns::{OPPORTUNITY_ID, TENANT_ID};

use crate::array::upsert_columns;
use crate::{InputTable, PipelineError};

/// Validate both inputs and guarantee the outcome table carries a `tenantId`.
///
/// The evaluation table must be non-empty and hold both key columns; the outcome
/// table must hold `opportunityId`. An outcome table without `tenantId` (exports
/// that are not tenant-scoped) gets a constant column copied from the first
/// evaluation row, so every outcome is attributed to that tenant. This is an
/// approximation and is only sound for single-tenant inputs.
pub fn normalize_keys(
    evaluations: &RecordBatch,
    outcomes: RecordBatch,
) -> Result<RecordBatch, PipelineError> {
    if evaluations.num_rows() == 0 {
        return Err(PipelineError::EmptyInput {
            table: InputTable::Evaluations,
        });
    }
    for column in [TENANT_ID, OPPORTUNITY_ID] {
        if evaluations.column_by_name(column).is_none() {
            return Err(PipelineError::Schema {
                table: InputTable::Evaluations,
                column,
            });
        }
    }
    if outcomes.column_by_name(OPPORTUNITY_ID).is_none() {
        return Err(PipelineError::Schema {
            table: InputTable::Outcomes,
            column: OPPORTUNITY_ID,
        });
    }
    if outcomes.column_by_name(TENANT_ID).is_some() {
        return Ok(outcomes);
    }

    let (field, column) = backfilled_tenant(evaluations, outcomes.num_rows())?;
    warn!(
        rows = outcomes.num_rows(),
        "ml_outcomes has no tenantId; attributing all outcomes to the first evaluation tenant"
    );
    Ok(upsert_columns(&outcomes, vec![(field, column)])?)
}

/// A `len`-row column repeating the first evaluation tenant, in the evaluation's type.
fn backfilled_tenant(
    evaluations: &RecordBatch,
    len: usize,
) -> Result<(Field, ArrayRef), PipelineError> {
    match evaluations.column_by_name(TENANT_ID) {
        Some(tenants) if !tenants.is_empty() => {
            let first = UInt32Array::from(vec![0u32; len]);
            let column = take(tenants.as_ref(), &first, None)?;
            let field = Field::new(TENANT_ID, tenants.data_type().clone(), true);
            Ok((field, column))
        }
        _ => Ok((
            Field::new(TENANT_ID, DataType::Utf8, true),
            Arc::new(StringArray::from(vec![""; len])) as ArrayRef,
        )),
    }
}
