//! Join-and-project pipeline: evaluation snapshots + realized outcomes → training tables.
//!
//! Stages run in a fixed order, each a pure function over Arrow record batches:
//! [`normalize_keys`] → [`left_join_first_wins`] → [`derive_targets`] →
//! [`filter_tenant`] (optional) → [`project`].

mod array;
mod error;
mod join;
mod keys;
mod project;
mod targets;

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use tracing::info;
use trainprep_core::{ModelId, RunMetadata};

pub use error::{InputTable, PipelineError};
pub use join::left_join_first_wins;
pub use keys::normalize_keys;
pub use project::{Projection, project};
pub use targets::{Targets, derive_targets, filter_tenant};

/// Caller-selected options for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PrepareOptions {
    pub model_id: ModelId,
    /// Keep only rows of this tenant (exact match).
    pub tenant_id: Option<String>,
    /// Output partition label, recorded in the run metadata only.
    pub partition_date: Option<String>,
}

/// A projected table with its run metadata attached to the schema.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub batch: RecordBatch,
    pub metadata: RunMetadata,
}

/// Run every stage and return the table to write.
pub fn run(
    evaluations: &RecordBatch,
    outcomes: RecordBatch,
    options: &PrepareOptions,
) -> Result<Prepared, PipelineError> {
    info!(
        model_id = %options.model_id,
        evaluations = evaluations.num_rows(),
        outcomes = outcomes.num_rows(),
        "preparing training table"
    );

    let outcomes = normalize_keys(evaluations, outcomes)?;
    let merged = left_join_first_wins(evaluations, &outcomes)?;
    let mut annotated = derive_targets(&merged)?;
    if let Some(tenant) = options.tenant_id.as_deref() {
        annotated = filter_tenant(&annotated, tenant)?;
    }
    let projection = project(options.model_id, &annotated)?;

    let metadata = RunMetadata {
        model_id: options.model_id,
        tenant_id: options.tenant_id.clone(),
        partition_date: options.partition_date.clone(),
        rows: projection.batch.num_rows(),
        placeholder_features: projection
            .placeholder_features
            .iter()
            .map(|c| c.to_string())
            .collect(),
    };
    let schema = Arc::new(
        projection
            .batch
            .schema()
            .as_ref()
            .clone()
            .with_metadata(metadata.to_schema_metadata()),
    );
    let batch = projection.batch.with_schema(schema)?;
    Ok(Prepared { batch, metadata })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{batch, f64_col, int_col, str_col};
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::{Float64Type, Int64Type};
    use trainprep_core::metadata::{MODEL_ID_KEY, PLACEHOLDER_FEATURES_KEY};

    fn options(model_id: ModelId) -> PrepareOptions {
        PrepareOptions {
            model_id,
            ..PrepareOptions::default()
        }
    }

    /// Two evaluations of opportunity 1 and one of opportunity 2; outcome 1 is
    /// recorded twice, "won" first.
    fn duplicate_outcome_inputs() -> (RecordBatch, RecordBatch) {
        let evals = batch(vec![
            ("tenantId", str_col(&[Some("t1"), Some("t1"), Some("t1")])),
            ("opportunityId", int_col(&[Some(1), Some(1), Some(2)])),
        ]);
        let outcomes = batch(vec![
            ("tenantId", str_col(&[Some("t1"), Some("t1")])),
            ("opportunityId", int_col(&[Some(1), Some(1)])),
            ("outcome", str_col(&[Some("won"), Some("lost")])),
        ]);
        (evals, outcomes)
    }

    #[test]
    fn duplicate_outcome_first_seen_wins_end_to_end() {
        let (evals, outcomes) = duplicate_outcome_inputs();
        let prepared = run(&evals, outcomes, &options(ModelId::OutcomeJoined)).unwrap();
        let b = &prepared.batch;
        assert_eq!(b.num_rows(), 3);

        let closed = b.column_by_name("is_closed").unwrap().as_primitive::<Int64Type>();
        assert_eq!(closed.values().to_vec(), vec![1, 1, 0]);
        let win = b.column_by_name("target_win").unwrap().as_primitive::<Int64Type>();
        assert_eq!(win.value(0), 1);
        assert_eq!(win.value(1), 1);
        assert!(win.is_null(2));
    }

    #[test]
    fn left_join_cardinality_holds_for_every_mode_input() {
        let (evals, outcomes) = duplicate_outcome_inputs();
        let normalized = normalize_keys(&evals, outcomes).unwrap();
        let merged = left_join_first_wins(&evals, &normalized).unwrap();
        assert_eq!(merged.num_rows(), evals.num_rows());
    }

    #[test]
    fn risk_scoring_with_no_signal_fails() {
        let evals = batch(vec![
            ("tenantId", str_col(&[Some("t1"), Some("t1")])),
            ("opportunityId", int_col(&[Some(1), Some(2)])),
            ("riskScore", f64_col(&[None, None])),
        ]);
        let outcomes = batch(vec![
            ("opportunityId", int_col(&[Some(1)])),
            ("outcome", str_col(&[None])),
        ]);
        let err = run(&evals, outcomes, &options(ModelId::RiskScoring)).unwrap_err();
        assert!(matches!(err, PipelineError::NoTrainableRows { .. }));
    }

    #[test]
    fn tenant_filter_applies_before_projection() {
        let evals = batch(vec![
            ("tenantId", str_col(&[Some("t1"), Some("t2")])),
            ("opportunityId", int_col(&[Some(1), Some(2)])),
            ("riskScore", f64_col(&[Some(0.2), Some(0.9)])),
        ]);
        let outcomes = batch(vec![
            ("tenantId", str_col(&[Some("t2")])),
            ("opportunityId", int_col(&[Some(2)])),
            ("outcome", str_col(&[Some("lost")])),
        ]);
        let opts = PrepareOptions {
            model_id: ModelId::RiskScoring,
            tenant_id: Some("t2".into()),
            partition_date: Some("2024-05-01".into()),
        };
        let prepared = run(&evals, outcomes, &opts).unwrap();
        assert_eq!(prepared.batch.num_rows(), 1);
        let risk = prepared
            .batch
            .column_by_name("target_risk")
            .unwrap()
            .as_primitive::<Float64Type>();
        assert_eq!(risk.value(0), 0.9);
        assert_eq!(prepared.metadata.tenant_id.as_deref(), Some("t2"));
        assert_eq!(prepared.metadata.partition_date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn metadata_flags_placeholder_use() {
        let (evals, outcomes) = duplicate_outcome_inputs();
        let prepared = run(&evals, outcomes, &options(ModelId::WinProbability)).unwrap();
        assert_eq!(prepared.batch.num_rows(), 2);
        assert!(prepared.metadata.uses_placeholders());

        let schema = prepared.batch.schema();
        let meta = schema.metadata();
        assert_eq!(meta[MODEL_ID_KEY], "win_probability");
        assert!(meta[PLACEHOLDER_FEATURES_KEY].contains("days_since_last_activity"));
        assert_eq!(RunMetadata::from_schema_metadata(meta), Some(prepared.metadata));
    }

    #[test]
    fn outcome_joined_carries_no_placeholders() {
        let (evals, outcomes) = duplicate_outcome_inputs();
        let prepared = run(&evals, outcomes, &options(ModelId::OutcomeJoined)).unwrap();
        assert!(!prepared.metadata.uses_placeholders());
        assert!(prepared.batch.column_by_name("probability").is_none());
    }

    #[test]
    fn identical_inputs_give_identical_tables() {
        let (evals, outcomes) = duplicate_outcome_inputs();
        let a = run(&evals, outcomes.clone(), &options(ModelId::RiskScoring)).unwrap();
        let b = run(&evals, outcomes, &options(ModelId::RiskScoring)).unwrap();
        assert_eq!(a.batch, b.batch);
        assert_eq!(a.metadata, b.metadata);
    }
}
