//! Column names shared by the evaluation, outcome, and training tables.
//!
//! Source tables use camelCase (as exported by the risk evaluation and
//! outcome services); derived columns use snake_case.

// ── Join key ──

pub const TENANT_ID: &str = "tenantId";
pub const OPPORTUNITY_ID: &str = "opportunityId";

/// Composite join key, in join order.
pub const JOIN_KEY: [&str; 2] = [TENANT_ID, OPPORTUNITY_ID];

// ── Evaluation snapshot ──

pub const RISK_SCORE: &str = "riskScore";
pub const CATEGORY_SCORES: &str = "categoryScores";
pub const TIMESTAMP: &str = "timestamp";
pub const EVALUATION_ID: &str = "evaluationId";
pub const AMOUNT: &str = "amount";
pub const CLOSE_DATE: &str = "closeDate";
pub const RECORDED_AT: &str = "recordedAt";

// ── Outcome ──

pub const OUTCOME: &str = "outcome";
pub const OUTCOME_WON: &str = "won";
pub const OUTCOME_LOST: &str = "lost";

// ── Derived ──

pub const TARGET_WIN: &str = "target_win";
pub const TARGET_RISK: &str = "target_risk";
pub const IS_CLOSED: &str = "is_closed";
pub const RISK_SCORE_LATEST: &str = "risk_score_latest";
