//! Left join of evaluation snapshots onto realized outcomes.
//!
//! Two policies here are fixed for compatibility with existing training tables and
//! must not be changed silently:
//!
//! - Duplicate outcome keys collapse to the **first** row in input order. Callers
//!   who want latest-wins must sort the outcome input first.
//! - A column present on both sides keeps the **evaluation** value; the outcome copy
//!   is discarded.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, StringArray, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::Field;
use arrow::record_batch::RecordBatch;
use tracing::{debug, info};
use trainprep_core::columns::{JOIN_KEY, OPPORTUNITY_ID, TENANT_ID};

use crate::array::{assemble, utf8_column};
use crate::{InputTable, PipelineError};

/// `(tenantId, opportunityId)` in string form. Null components compare equal to
/// each other, matching pandas merge semantics.
type Key<'a> = (Option<&'a str>, Option<&'a str>);

struct KeyColumns {
    tenant: ArrayRef,
    opportunity: ArrayRef,
}

impl KeyColumns {
    fn of(batch: &RecordBatch, table: InputTable) -> Result<Self, PipelineError> {
        let tenant = utf8_column(batch, TENANT_ID)?.ok_or(PipelineError::Schema {
            table,
            column: TENANT_ID,
        })?;
        let opportunity = utf8_column(batch, OPPORTUNITY_ID)?.ok_or(PipelineError::Schema {
            table,
            column: OPPORTUNITY_ID,
        })?;
        Ok(Self {
            tenant,
            opportunity,
        })
    }

    fn key(&self, row: usize) -> Key<'_> {
        (
            value_at(self.tenant.as_string::<i32>(), row),
            value_at(self.opportunity.as_string::<i32>(), row),
        )
    }
}

fn value_at(array: &StringArray, row: usize) -> Option<&str> {
    array.is_valid(row).then(|| array.value(row))
}

/// Join outcomes onto evaluations on `(tenantId, opportunityId)`.
///
/// Both inputs must already carry the key columns (see
/// [`normalize_keys`](crate::normalize_keys)). The result has exactly one row per
/// evaluation row, in evaluation order: the evaluation columns followed by the
/// non-key outcome columns the evaluation table does not already have. Unmatched
/// rows hold nulls in the outcome columns.
pub fn left_join_first_wins(
    evaluations: &RecordBatch,
    outcomes: &RecordBatch,
) -> Result<RecordBatch, PipelineError> {
    let outcome_keys = KeyColumns::of(outcomes, InputTable::Outcomes)?;
    let mut first_seen: HashMap<Key<'_>, u32> = HashMap::with_capacity(outcomes.num_rows());
    let mut duplicates = 0usize;
    for row in 0..outcomes.num_rows() {
        match first_seen.entry(outcome_keys.key(row)) {
            Entry::Vacant(slot) => {
                slot.insert(row as u32);
            }
            Entry::Occupied(_) => duplicates += 1,
        }
    }

    let eval_keys = KeyColumns::of(evaluations, InputTable::Evaluations)?;
    let indices: UInt32Array = (0..evaluations.num_rows())
        .map(|row| first_seen.get(&eval_keys.key(row)).copied())
        .collect();
    let matched = indices.len() - indices.null_count();

    let eval_schema = evaluations.schema();
    let mut columns: Vec<(Field, ArrayRef)> = eval_schema
        .fields()
        .iter()
        .zip(evaluations.columns())
        .map(|(f, c)| (f.as_ref().clone(), Arc::clone(c)))
        .collect();

    let mut shadowed = Vec::new();
    let outcome_schema = outcomes.schema();
    for (field, column) in outcome_schema.fields().iter().zip(outcomes.columns()) {
        let name = field.name().as_str();
        if JOIN_KEY.contains(&name) {
            continue;
        }
        if eval_schema.column_with_name(name).is_some() {
            shadowed.push(name);
            continue;
        }
        let joined = take(column.as_ref(), &indices, None)?;
        columns.push((field.as_ref().clone().with_nullable(true), joined));
    }

    if !shadowed.is_empty() {
        debug!(?shadowed, "outcome columns shadowed by evaluation columns");
    }
    info!(
        rows = evaluations.num_rows(),
        matched,
        outcome_rows = outcomes.num_rows(),
        duplicate_outcomes = duplicates,
        "joined outcomes onto evaluations"
    );
    Ok(assemble(columns, evaluations.num_rows())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{batch, f64_col, int_col, str_col};

    fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
        batch
            .column_by_name(name)
            .unwrap()
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn first_outcome_wins_on_duplicate_key() {
        let evals = batch(vec![
            ("tenantId", str_col(&[Some("t1"), Some("t1"), Some("t1")])),
            ("opportunityId", int_col(&[Some(1), Some(1), Some(2)])),
        ]);
        let outcomes = batch(vec![
            ("tenantId", str_col(&[Some("t1"), Some("t1")])),
            ("opportunityId", int_col(&[Some(1), Some(1)])),
            ("outcome", str_col(&[Some("won"), Some("lost")])),
        ]);
        let joined = left_join_first_wins(&evals, &outcomes).unwrap();
        assert_eq!(joined.num_rows(), 3);
        assert_eq!(
            strings(&joined, "outcome"),
            vec![Some("won".into()), Some("won".into()), None]
        );
    }

    #[test]
    fn row_count_equals_evaluations_without_matches() {
        let evals = batch(vec![
            ("tenantId", str_col(&[Some("t1"), Some("t2")])),
            ("opportunityId", int_col(&[Some(1), Some(2)])),
        ]);
        let outcomes = batch(vec![
            ("tenantId", str_col(&[])),
            ("opportunityId", int_col(&[])),
            ("outcome", str_col(&[])),
        ]);
        let joined = left_join_first_wins(&evals, &outcomes).unwrap();
        assert_eq!(joined.num_rows(), 2);
        assert_eq!(joined.column_by_name("outcome").unwrap().null_count(), 2);
    }

    #[test]
    fn key_is_tenant_scoped() {
        let evals = batch(vec![
            ("tenantId", str_col(&[Some("t1"), Some("t2")])),
            ("opportunityId", int_col(&[Some(1), Some(1)])),
        ]);
        let outcomes = batch(vec![
            ("tenantId", str_col(&[Some("t2")])),
            ("opportunityId", int_col(&[Some(1)])),
            ("outcome", str_col(&[Some("lost")])),
        ]);
        let joined = left_join_first_wins(&evals, &outcomes).unwrap();
        assert_eq!(strings(&joined, "outcome"), vec![None, Some("lost".into())]);
    }

    #[test]
    fn evaluation_column_wins_collision() {
        let evals = batch(vec![
            ("tenantId", str_col(&[Some("t1")])),
            ("opportunityId", int_col(&[Some(1)])),
            ("amount", f64_col(&[Some(100.0)])),
        ]);
        let outcomes = batch(vec![
            ("tenantId", str_col(&[Some("t1")])),
            ("opportunityId", int_col(&[Some(1)])),
            ("amount", f64_col(&[Some(999.0)])),
            ("closeDate", str_col(&[Some("2024-04-30")])),
        ]);
        let joined = left_join_first_wins(&evals, &outcomes).unwrap();
        let names: Vec<_> = joined.schema().fields().iter().map(|f| f.name().clone()).collect();
        assert_eq!(names, vec!["tenantId", "opportunityId", "amount", "closeDate"]);
        let amount = joined
            .column_by_name("amount")
            .unwrap()
            .as_primitive::<arrow::datatypes::Float64Type>();
        assert_eq!(amount.value(0), 100.0);
    }

    #[test]
    fn integer_and_string_ids_match() {
        let evals = batch(vec![
            ("tenantId", str_col(&[Some("t1")])),
            ("opportunityId", int_col(&[Some(42)])),
        ]);
        let outcomes = batch(vec![
            ("tenantId", str_col(&[Some("t1")])),
            ("opportunityId", str_col(&[Some("42")])),
            ("outcome", str_col(&[Some("won")])),
        ]);
        let joined = left_join_first_wins(&evals, &outcomes).unwrap();
        assert_eq!(strings(&joined, "outcome"), vec![Some("won".into())]);
        // Evaluation key type is kept.
        assert_eq!(
            joined.schema().field_with_name("opportunityId").unwrap().data_type(),
            &arrow::datatypes::DataType::Int64
        );
    }

    #[test]
    fn preserves_evaluation_order() {
        let evals = batch(vec![
            ("tenantId", str_col(&[Some("t1"), Some("t1"), Some("t1")])),
            ("opportunityId", int_col(&[Some(3), Some(1), Some(2)])),
        ]);
        let outcomes = batch(vec![
            ("tenantId", str_col(&[Some("t1"), Some("t1"), Some("t1")])),
            ("opportunityId", int_col(&[Some(1), Some(2), Some(3)])),
            ("outcome", str_col(&[Some("won"), Some("lost"), Some("won")])),
        ]);
        let joined = left_join_first_wins(&evals, &outcomes).unwrap();
        assert_eq!(
            strings(&joined, "outcome"),
            vec![Some("won".into()), Some("won".into()), Some("lost".into())]
        );
    }
}
