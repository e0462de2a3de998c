//! Normalization of loosely-shaped analyzer responses into the canonical result.

use serde_json::Value;

use crate::scanner::{AnalysisResult, MAX_SCORE};

/// Label used when the response carries no usable label.
pub const MISSING_LABEL: &str = "(no label provided)";

/// Ordered key sequence into a JSON object, e.g. `result.score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static [&'static str]);

impl FieldPath {
    /// Value at this path, treating `null` as absent.
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let value = self.0.iter().try_fold(root, |node, key| node.get(key))?;
        (!value.is_null()).then_some(value)
    }
}

pub const SCORE_FIELDS: &[FieldPath] = &[
    FieldPath(&["score"]),
    FieldPath(&["riskScore"]),
    FieldPath(&["result", "score"]),
];

pub const LABEL_FIELDS: &[FieldPath] = &[FieldPath(&["label"]), FieldPath(&["result", "label"])];

pub const BULLET_FIELDS: &[FieldPath] = &[
    FieldPath(&["bullets"]),
    FieldPath(&["issues"]),
    FieldPath(&["result", "bullets"]),
];

fn first_present<'a>(root: &'a Value, candidates: &[FieldPath]) -> Option<&'a Value> {
    candidates.iter().find_map(|path| path.lookup(root))
}

/// Normalize a parsed response body into the canonical result shape.
pub fn normalize_response(body: &Value) -> AnalysisResult {
    AnalysisResult {
        score: normalize_score(first_present(body, SCORE_FIELDS)),
        label: normalize_label(body),
        bullets: normalize_bullets(first_present(body, BULLET_FIELDS)),
    }
}

/// Parse a raw body, degrading to an empty object when it is not valid JSON.
pub fn parse_body(raw: &[u8]) -> Value {
    serde_json::from_slice(raw).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "analyzer response is not JSON; treating as empty object");
        Value::Object(Default::default())
    })
}

/// Numeric scores are clamped and rounded half away from zero: 57.9 becomes 58,
/// 57.5 becomes 58, 57.4 becomes 57. Anything else scores 0.
fn normalize_score(value: Option<&Value>) -> u8 {
    let raw = value.and_then(Value::as_f64).unwrap_or(0.0);
    if !raw.is_finite() {
        return 0;
    }
    raw.clamp(0.0, f64::from(MAX_SCORE)).round() as u8
}

fn normalize_label(body: &Value) -> String {
    LABEL_FIELDS
        .iter()
        .filter_map(|path| path.lookup(body))
        .filter_map(Value::as_str)
        .find(|label| !label.trim().is_empty())
        .unwrap_or(MISSING_LABEL)
        .to_string()
}

fn normalize_bullets(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        })
        .collect()
}
