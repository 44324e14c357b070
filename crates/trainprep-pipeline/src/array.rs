//! Small Arrow helpers shared by the join, target and projection stages.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use trainprep_core::PlaceholderValue;

use crate::{InputTable, PipelineError};

/// A column rendered as Utf8, or `None` if the batch lacks it.
///
/// Keys and categorical values are compared by their string form, so an `Int64`
/// opportunity id on one side matches a `Utf8` id on the other.
pub(crate) fn utf8_column(batch: &RecordBatch, name: &str) -> Result<Option<ArrayRef>, ArrowError> {
    batch
        .column_by_name(name)
        .map(|col| match col.data_type() {
            DataType::Utf8 => Ok(Arc::clone(col)),
            _ => cast(col, &DataType::Utf8),
        })
        .transpose()
}

/// A Float64 rendering of a numeric column, or `None` if the batch lacks it.
pub(crate) fn f64_column(batch: &RecordBatch, name: &str) -> Result<Option<ArrayRef>, ArrowError> {
    batch
        .column_by_name(name)
        .map(|col| cast(col, &DataType::Float64))
        .transpose()
}

/// Look up a column that an earlier stage guarantees, reporting its absence as a schema error.
pub(crate) fn required<'a>(
    batch: &'a RecordBatch,
    table: InputTable,
    column: &'static str,
) -> Result<&'a ArrayRef, PipelineError> {
    batch
        .column_by_name(column)
        .ok_or(PipelineError::Schema { table, column })
}

/// The source field for `name`, or a nullable field of the column's type.
pub(crate) fn field_of(batch: &RecordBatch, name: &str, column: &ArrayRef) -> Field {
    batch
        .schema_ref()
        .field_with_name(name)
        .cloned()
        .unwrap_or_else(|_| Field::new(name, column.data_type().clone(), true))
}

/// Build a batch from named columns, keeping the row count even with zero columns.
pub(crate) fn assemble(
    columns: Vec<(Field, ArrayRef)>,
    rows: usize,
) -> Result<RecordBatch, ArrowError> {
    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns.into_iter().unzip();
    RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        arrays,
        &RecordBatchOptions::new().with_row_count(Some(rows)),
    )
}

/// Replace same-named columns in place and append the rest, in order.
pub(crate) fn upsert_columns(
    batch: &RecordBatch,
    new: Vec<(Field, ArrayRef)>,
) -> Result<RecordBatch, ArrowError> {
    let schema = batch.schema();
    let mut columns: Vec<(Field, ArrayRef)> = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(f, c)| (f.as_ref().clone(), Arc::clone(c)))
        .collect();
    for (field, array) in new {
        match columns.iter().position(|(f, _)| f.name() == field.name()) {
            Some(i) => columns[i] = (field, array),
            None => columns.push((field, array)),
        }
    }
    assemble(columns, batch.num_rows())
}

/// Cast a column to the value's type and replace nulls (and float NaN) with the value.
///
/// A missing column becomes a constant column. Returns the array and the number of
/// cells that were filled.
pub(crate) fn coalesce(
    column: Option<&ArrayRef>,
    value: PlaceholderValue,
    len: usize,
) -> Result<(ArrayRef, usize), ArrowError> {
    let Some(column) = column else {
        return Ok((value.fill(len), len));
    };
    let typed = cast(column, &value.data_type())?;

    let (array, filled): (ArrayRef, usize) = match value {
        PlaceholderValue::Float(default) => {
            let mut filled = 0;
            let values: Float64Array = typed
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| match v {
                    Some(x) if !x.is_nan() => Some(x),
                    _ => {
                        filled += 1;
                        Some(default)
                    }
                })
                .collect();
            (Arc::new(values) as ArrayRef, filled)
        }
        PlaceholderValue::Int(default) => {
            let filled = typed.null_count();
            if filled == 0 {
                return Ok((typed, 0));
            }
            let values: Int64Array = typed
                .as_primitive::<Int64Type>()
                .iter()
                .map(|v| Some(v.unwrap_or(default)))
                .collect();
            (Arc::new(values) as ArrayRef, filled)
        }
    };
    Ok((array, filled))
}
