/// Output layouts for the `/ml_training/{model_id}/` tables.
pub mod training {
    use arrow::datatypes::{DataType, Field, Schema};

    use crate::columns::*;

    /// Feature columns the risk and win-probability trainers require, in trainer order.
    pub const FEATURE_COLUMNS: [&str; 8] = [
        AMOUNT,
        "probability",
        "days_to_close",
        "stage_encoded",
        "industry_encoded",
        "days_since_last_activity",
        "activity_count_30d",
        "stakeholder_count",
    ];

    /// Columns of the `outcome_joined` table with the type used when the source lacks them.
    ///
    /// Columns present in the source keep their source type. Key columns are always
    /// present (validated before the join), so their declared type is only nominal.
    pub fn outcome_joined_schema() -> Schema {
        Schema::new(vec![
            Field::new(TENANT_ID, DataType::Utf8, true),
            Field::new(OPPORTUNITY_ID, DataType::Utf8, true),
            Field::new(RISK_SCORE, DataType::Float64, true),
            Field::new(CATEGORY_SCORES, DataType::Utf8, true),
            Field::new(TIMESTAMP, DataType::Utf8, true),
            Field::new(EVALUATION_ID, DataType::Utf8, true),
            Field::new(OUTCOME, DataType::Utf8, true),
            Field::new(AMOUNT, DataType::Float64, true),
            Field::new(CLOSE_DATE, DataType::Utf8, true),
            Field::new(RECORDED_AT, DataType::Utf8, true),
            Field::new(TARGET_RISK, DataType::Float64, true),
            Field::new(TARGET_WIN, DataType::Int64, true),
            Field::new(IS_CLOSED, DataType::Int64, false),
        ])
    }

    /// Column order of the `risk_scoring` table.
    pub fn risk_scoring_columns() -> Vec<&'static str> {
        let mut cols = vec![TENANT_ID, OPPORTUNITY_ID];
        cols.extend(FEATURE_COLUMNS);
        cols.push(TARGET_RISK);
        cols.push(RISK_SCORE_LATEST);
        cols
    }

    /// Column order of the `win_probability` table.
    pub fn win_probability_columns() -> Vec<&'static str> {
        let mut cols = vec![TENANT_ID, OPPORTUNITY_ID];
        cols.extend(FEATURE_COLUMNS);
        cols.push(TARGET_WIN);
        cols.push(IS_CLOSED);
        cols
    }
}
