//! Turns a model completion into an [`AnalysisResult`].
//!
//! The completion is expected to be a JSON object with `summary`,
//! `key_insights`, `key_statistics` and `action_items` (older prompts asked
//! for `takeaways`). Models wrap that object in prose or code fences often
//! enough that the whole text is tried first, then the span from the first
//! `{` to the last `}`.
//!
//! Under [`NormalizePolicy::Lenient`] the result is always a well-formed
//! record: absent or malformed fields fall back to empty lists and the
//! sentinel summary. [`NormalizePolicy::Strict`] reports the same gaps as an
//! [`AppError::Normalization`] instead.

use serde_json::{Map, Value};

use crate::core::{
    config::NormalizePolicy,
    errors::{AppError, AppResult},
    types::{ActionItem, AnalysisResult, KeyInsight, KeyStatistic, SummaryItem},
};

/// Version written into persisted payloads by [`encode_stored`].
pub const STORED_SCHEMA_VERSION: u64 = 2;

const SUMMARY: &str = "summary";
const KEY_INSIGHTS: &str = "key_insights";
const KEY_STATISTICS: &str = "key_statistics";
const ACTION_ITEMS: &str = "action_items";
const TAKEAWAYS: &str = "takeaways";

pub fn normalize(raw: &str, policy: NormalizePolicy) -> AppResult<AnalysisResult> {
    match policy {
        NormalizePolicy::Lenient => Ok(normalize_lenient(raw)),
        NormalizePolicy::Strict => normalize_strict(raw),
    }
}

/// Total over all inputs.
pub fn normalize_lenient(raw: &str) -> AnalysisResult {
    match locate_payload(raw) {
        Some(value) => coerce(&value).result,
        None => AnalysisResult::default(),
    }
}

pub fn normalize_strict(raw: &str) -> AppResult<AnalysisResult> {
    let value = locate_payload(raw).ok_or_else(|| {
        AppError::Normalization("no JSON object found in model output".to_string())
    })?;
    if !value.is_object() {
        return Err(AppError::Normalization(
            "model output is JSON but not an object".to_string(),
        ));
    }
    let coerced = coerce(&value);
    if !coerced.missing.is_empty() {
        return Err(AppError::Normalization(format!(
            "missing or malformed fields: {}",
            coerced.missing.join(", ")
        )));
    }
    Ok(coerced.result)
}

/// Returns the span from the first `{` to the last `}`, if any.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn locate_payload(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        return Some(value);
    }
    let span = extract_json_object(raw)?;
    match serde_json::from_str::<Value>(span) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(error = %err, "embedded JSON span did not parse");
            None
        }
    }
}

struct Coerced {
    result: AnalysisResult,
    missing: Vec<&'static str>,
}

fn coerce(value: &Value) -> Coerced {
    let empty = Map::new();
    let fields = value.as_object().unwrap_or(&empty);
    let mut missing = Vec::new();

    let summary = match fields.get(SUMMARY).and_then(Value::as_object) {
        Some(map) => match map.get("text").and_then(scalar_text) {
            Some(text) => SummaryItem {
                text,
                page: page_field(map),
            },
            None => {
                missing.push(SUMMARY);
                SummaryItem::default()
            }
        },
        None => {
            missing.push(SUMMARY);
            SummaryItem::default()
        }
    };

    let key_insights = match list_field(fields, &[KEY_INSIGHTS]) {
        Some(items) => items
            .map(|item| KeyInsight {
                title: text_field(item, "title"),
                explanation: text_field(item, "explanation"),
                page: page_field(item),
            })
            .collect(),
        None => {
            missing.push(KEY_INSIGHTS);
            Vec::new()
        }
    };

    let key_statistics = match list_field(fields, &[KEY_STATISTICS]) {
        Some(items) => items
            .map(|item| KeyStatistic {
                label: text_field(item, "label"),
                value: text_field(item, "value"),
                page: page_field(item),
            })
            .collect(),
        None => {
            missing.push(KEY_STATISTICS);
            Vec::new()
        }
    };

    let action_items = match list_field(fields, &[ACTION_ITEMS, TAKEAWAYS]) {
        Some(items) => items
            .map(|item| ActionItem {
                text: text_field(item, "text"),
                page: page_field(item),
            })
            .collect(),
        None => {
            missing.push(ACTION_ITEMS);
            Vec::new()
        }
    };

    Coerced {
        result: AnalysisResult {
            summary,
            key_insights,
            key_statistics,
            action_items,
        },
        missing,
    }
}

/// First of `keys` holding an array; yields its object elements and skips
/// anything else.
fn list_field<'a>(
    fields: &'a Map<String, Value>,
    keys: &[&str],
) -> Option<impl Iterator<Item = &'a Map<String, Value>>> {
    keys.iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_array))
        .map(|items| items.iter().filter_map(Value::as_object))
}

/// Strings as-is; numbers and bools in their JSON spelling.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key).and_then(scalar_text).unwrap_or_default()
}

/// Resolves `page` to a non-negative page number; anything unusable is 0.
fn page_field(map: &Map<String, Value>) -> u32 {
    match map.get("page") {
        Some(Value::Number(number)) => match number.as_u64() {
            Some(page) => u32::try_from(page).unwrap_or(u32::MAX),
            None => number.as_f64().map_or(0, float_page),
        },
        Some(Value::String(raw)) => {
            let raw = raw.trim();
            match raw.parse::<u32>() {
                Ok(page) => page,
                Err(_) => raw.parse::<f64>().map_or(0, float_page),
            }
        }
        _ => 0,
    }
}

fn float_page(page: f64) -> u32 {
    if page.is_finite() && page >= 1.0 {
        page.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Wraps a result in the versioned envelope used for persistence.
pub fn encode_stored(result: &AnalysisResult) -> Value {
    serde_json::json!({
        "schema_version": STORED_SCHEMA_VERSION,
        "result": result,
    })
}

/// Reads a persisted payload: the versioned envelope, a bare legacy result
/// object, or a JSON string holding either.
pub fn decode_stored(value: &Value) -> AnalysisResult {
    match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(inner) if !inner.is_string() => decode_stored(&inner),
            _ => normalize_lenient(raw),
        },
        Value::Object(fields) => match (fields.get("schema_version"), fields.get("result")) {
            (Some(version), Some(result)) => {
                if version.as_u64().map_or(true, |v| v > STORED_SCHEMA_VERSION) {
                    tracing::warn!(%version, "unknown analysis payload schema version");
                }
                coerce(result).result
            }
            _ => coerce(value).result,
        },
        _ => AnalysisResult::default(),
    }
}
