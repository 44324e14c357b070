//! Mode projection: row filters, column selection, and placeholder features.

use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, BooleanArray, Int64Array, new_null_array};
use arrow::compute::kernels::cmp::eq;
use arrow::compute::{and, filter_record_batch, is_not_null};
use arrow::datatypes::{DataType, Field, Int64Type};
use arrow::record_batch::RecordBatch;
use tracing::{debug, info, warn};
use trainprep_core::columns::{
    AMOUNT, IS_CLOSED, OPPORTUNITY_ID, RISK_SCORE, RISK_SCORE_LATEST, TARGET_RISK, TARGET_WIN,
    TENANT_ID,
};
use trainprep_core::schema::training;
use trainprep_core::{ModelId, PLACEHOLDER_FEATURES, PlaceholderValue};

use crate::array::{assemble, coalesce, field_of, required};
use crate::{InputTable, PipelineError};

const AMOUNT_DEFAULT: PlaceholderValue = PlaceholderValue::Float(0.0);
const RISK_SCORE_DEFAULT: PlaceholderValue = PlaceholderValue::Float(0.5);

/// A projected training table.
#[derive(Debug, Clone)]
pub struct Projection {
    pub batch: RecordBatch,
    /// Feature columns filled (wholly or partly) with placeholder values.
    pub placeholder_features: Vec<&'static str>,
}

/// Shape a joined, target-annotated table into the layout `mode` requires.
///
/// - `outcome_joined`: the fixed informational and target columns; absent source
///   columns become typed null columns. No placeholder features.
/// - `risk_scoring`: rows with a defined `target_risk`, the trainer's feature
///   columns, `target_risk` and `risk_score_latest`.
/// - `win_probability`: closed rows with a defined `target_win`, the trainer's
///   feature columns, `target_win` and `is_closed`.
///
/// Fails with [`PipelineError::NoTrainableRows`] when the mode's row filter
/// leaves nothing.
pub fn project(mode: ModelId, merged: &RecordBatch) -> Result<Projection, PipelineError> {
    let projection = match mode {
        ModelId::OutcomeJoined => project_outcome_joined(merged)?,
        ModelId::RiskScoring => project_risk_scoring(merged)?,
        ModelId::WinProbability => project_win_probability(merged)?,
    };

    if !projection.placeholder_features.is_empty() {
        warn!(
            mode = %mode,
            columns = ?projection.placeholder_features,
            "placeholder feature values injected; models trained on this table are for pipeline testing only"
        );
    }
    info!(
        mode = %mode,
        rows = projection.batch.num_rows(),
        columns = projection.batch.num_columns(),
        "projected training table"
    );
    Ok(projection)
}

fn project_outcome_joined(merged: &RecordBatch) -> Result<Projection, PipelineError> {
    if merged.num_rows() == 0 {
        return Err(PipelineError::NoTrainableRows {
            mode: ModelId::OutcomeJoined,
            reason: "no rows left after tenant filter",
        });
    }

    let rows = merged.num_rows();
    let layout = training::outcome_joined_schema();
    let mut columns = Vec::with_capacity(layout.fields().len());
    for field in layout.fields() {
        let name = field.name();
        match merged.column_by_name(name) {
            Some(column) => columns.push((field_of(merged, name, column), Arc::clone(column))),
            None => {
                debug!(column = %name, "absent from joined table; writing nulls");
                columns.push((
                    field.as_ref().clone().with_nullable(true),
                    new_null_array(field.data_type(), rows),
                ));
            }
        }
    }
    Ok(Projection {
        batch: assemble(columns, rows)?,
        placeholder_features: Vec::new(),
    })
}

fn project_risk_scoring(merged: &RecordBatch) -> Result<Projection, PipelineError> {
    let target_risk = required(merged, InputTable::Merged, TARGET_RISK)?;
    let rows = filter_record_batch(merged, &is_not_null(target_risk.as_ref())?)?;
    if rows.num_rows() == 0 {
        return Err(PipelineError::NoTrainableRows {
            mode: ModelId::RiskScoring,
            reason: "no rows with target_risk after join",
        });
    }

    let mut placeholders = Vec::new();
    let mut columns = identifiers(&rows)?;
    columns.extend(features(&rows, &mut placeholders)?);
    columns.push(passthrough(&rows, TARGET_RISK)?);
    let (latest, _) = coalesce(
        rows.column_by_name(RISK_SCORE),
        RISK_SCORE_DEFAULT,
        rows.num_rows(),
    )?;
    columns.push((Field::new(RISK_SCORE_LATEST, DataType::Float64, false), latest));

    Ok(Projection {
        batch: assemble(columns, rows.num_rows())?,
        placeholder_features: placeholders,
    })
}

fn project_win_probability(merged: &RecordBatch) -> Result<Projection, PipelineError> {
    let is_closed = required(merged, InputTable::Merged, IS_CLOSED)?;
    let target_win = required(merged, InputTable::Merged, TARGET_WIN)?;
    let closed: BooleanArray = eq(
        is_closed.as_primitive::<Int64Type>(),
        &Int64Array::new_scalar(1),
    )?;
    let keep = and(&closed, &is_not_null(target_win.as_ref())?)?;
    let rows = filter_record_batch(merged, &keep)?;
    if rows.num_rows() == 0 {
        return Err(PipelineError::NoTrainableRows {
            mode: ModelId::WinProbability,
            reason: "no closed rows with target_win after join",
        });
    }

    let mut placeholders = Vec::new();
    let mut columns = identifiers(&rows)?;
    columns.extend(features(&rows, &mut placeholders)?);
    columns.push(passthrough(&rows, TARGET_WIN)?);
    columns.push(passthrough(&rows, IS_CLOSED)?);

    Ok(Projection {
        batch: assemble(columns, rows.num_rows())?,
        placeholder_features: placeholders,
    })
}

fn identifiers(rows: &RecordBatch) -> Result<Vec<(Field, ArrayRef)>, PipelineError> {
    Ok(vec![passthrough(rows, TENANT_ID)?, passthrough(rows, OPPORTUNITY_ID)?])
}

fn passthrough(rows: &RecordBatch, name: &'static str) -> Result<(Field, ArrayRef), PipelineError> {
    let column = required(rows, InputTable::Merged, name)?;
    Ok((field_of(rows, name, column), Arc::clone(column)))
}

/// `amount` followed by the placeholder-backed features, in trainer column order.
///
/// Enriched values already present in the table are kept; only missing columns and
/// null cells take the placeholder, and such columns are recorded in `placeholders`.
/// Never overwrite a non-null feature value here: an enriched table must reach the
/// trainer unchanged, and a filled column must always show up in the run metadata.
fn features(
    rows: &RecordBatch,
    placeholders: &mut Vec<&'static str>,
) -> Result<Vec<(Field, ArrayRef)>, PipelineError> {
    let len = rows.num_rows();
    let mut columns = Vec::with_capacity(training::FEATURE_COLUMNS.len());

    let (amount, filled) = coalesce(rows.column_by_name(AMOUNT), AMOUNT_DEFAULT, len)?;
    if filled > 0 {
        debug!(filled, "amount defaulted to 0");
    }
    columns.push((Field::new(AMOUNT, DataType::Float64, false), amount));

    for feature in PLACEHOLDER_FEATURES {
        let (array, filled) = coalesce(rows.column_by_name(feature.column), feature.value, len)?;
        if filled > 0 {
            placeholders.push(feature.column);
        }
        columns.push((
            Field::new(feature.column, feature.value.data_type(), false),
            array,
        ));
    }
    Ok(columns)
}
