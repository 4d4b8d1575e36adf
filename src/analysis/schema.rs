use serde_json::Value;

use crate::core::{errors::AppResult, types::AnalysisResult};

/// JSON Schema for a normalized analysis, for consumers reading stored
/// payloads outside this tool.
pub fn analysis_schema() -> AppResult<Value> {
    let schema = schemars::schema_for!(AnalysisResult);
    Ok(serde_json::to_value(&schema)?)
}
