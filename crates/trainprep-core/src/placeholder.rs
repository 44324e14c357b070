//! Placeholder feature values for training tables that have not been enriched.
//!
//! The risk and win-probability trainers require these columns. Real values come
//! from the feature enrichment step; until it has run, the projector fills them with
//! the constants below. Models trained on placeholder values are for pipeline
//! testing only and must not be promoted.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::DataType;

/// A constant substitute for one enrichment feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaceholderValue {
    Float(f64),
    Int(i64),
}

impl PlaceholderValue {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Float(_) => DataType::Float64,
            Self::Int(_) => DataType::Int64,
        }
    }

    /// A non-null column of `len` copies of this value.
    pub fn fill(&self, len: usize) -> ArrayRef {
        match *self {
            Self::Float(v) => Arc::new(Float64Array::from(vec![v; len])),
            Self::Int(v) => Arc::new(Int64Array::from(vec![v; len])),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlaceholderFeature {
    pub column: &'static str,
    pub value: PlaceholderValue,
}

pub const PLACEHOLDER_FEATURES: [PlaceholderFeature; 7] = [
    PlaceholderFeature {
        column: "probability",
        value: PlaceholderValue::Float(0.5),
    },
    PlaceholderFeature {
        column: "days_to_close",
        value: PlaceholderValue::Int(0),
    },
    PlaceholderFeature {
        column: "stage_encoded",
        value: PlaceholderValue::Int(0),
    },
    PlaceholderFeature {
        column: "industry_encoded",
        value: PlaceholderValue::Int(0),
    },
    PlaceholderFeature {
        column: "days_since_last_activity",
        value: PlaceholderValue::Int(999),
    },
    PlaceholderFeature {
        column: "activity_count_30d",
        value: PlaceholderValue::Int(0),
    },
    PlaceholderFeature {
        column: "stakeholder_count",
        value: PlaceholderValue::Int(0),
    },
];
