//! Run metadata embedded in the output file's schema metadata.
//!
//! Carries no wall-clock values so that identical runs produce identical files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ModelId;

pub const MODEL_ID_KEY: &str = "trainprep.model_id";
pub const PLACEHOLDER_FEATURES_KEY: &str = "trainprep.placeholder_features";
pub const RUN_KEY: &str = "trainprep.run";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub model_id: ModelId,
    pub tenant_id: Option<String>,
    /// `YYYY-MM-DD` label of the `date=` output partition, when one was requested.
    #[serde(default)]
    pub partition_date: Option<String>,
    pub rows: usize,
    /// Feature columns filled (wholly or partly) with placeholder values.
    /// Non-empty means the table is not fit for production training.
    pub placeholder_features: Vec<String>,
}

impl RunMetadata {
    pub fn uses_placeholders(&self) -> bool {
        !self.placeholder_features.is_empty()
    }

    /// Key/value pairs for an Arrow schema's metadata map.
    pub fn to_schema_metadata(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(MODEL_ID_KEY.to_string(), self.model_id.to_string());
        map.insert(
            PLACEHOLDER_FEATURES_KEY.to_string(),
            self.placeholder_features.join(","),
        );
        // Serialising a plain struct of strings and integers cannot fail.
        if let Ok(json) = serde_json::to_string(self) {
            map.insert(RUN_KEY.to_string(), json);
        }
        map
    }

    /// Recover the metadata written by [`to_schema_metadata`](Self::to_schema_metadata).
    pub fn from_schema_metadata(map: &HashMap<String, String>) -> Option<Self> {
        let json = map.get(RUN_KEY)?;
        serde_json::from_str(json).ok()
    }
}
