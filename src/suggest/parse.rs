use serde_json::Value;
use tracing::debug;

use crate::suggest::error::SuggestionError;
use crate::suggest::suggestion_model::Suggestion;

/// Why a single response entry was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryRejection {
    NotAnObject,
    MissingField(&'static str),
    IndexOutOfRange(u64),
    ConfidenceOutOfRange(f64),
}

/// Turn a model response into validated suggestions.
///
/// Entry-level problems drop the entry and keep going. Only a response with
/// no recognizable JSON array is an error. Duplicate indices are kept here;
/// the assembler resolves them.
pub fn parse_suggestions(response: &str, action_count: usize) -> Result<Vec<Suggestion>, SuggestionError> {
    let entries = extract_entries(response)?;
    let total = entries.len();

    let suggestions: Vec<Suggestion> = entries
        .iter()
        .enumerate()
        .filter_map(|(pos, entry)| match validate_entry(entry, action_count) {
            Ok(s) => Some(s),
            Err(rejection) => {
                debug!(position = pos, ?rejection, "dropping model entry");
                None
            }
        })
        .collect();

    debug!(total, kept = suggestions.len(), "parsed model response");
    Ok(suggestions)
}

/// Locate the suggestion array in a response.
///
/// Accepts a bare array, an object with a `suggestions` array, either one
/// wrapped in a markdown code fence, or an array embedded in prose (the
/// first one that parses, ignoring bracketed asides before it).
pub fn extract_entries(response: &str) -> Result<Vec<Value>, SuggestionError> {
    let trimmed = strip_code_fence(response.trim());

    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(v) => v,
        Err(first_err) => {
            embedded_array(trimmed).ok_or_else(|| SuggestionError::Parse(first_err.to_string()))?
        }
    };

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("suggestions") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(SuggestionError::Parse(
                "expected a JSON array or an object with a 'suggestions' array".into(),
            )),
        },
        other => Err(SuggestionError::Parse(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
    }
}

/// Check one entry against the scan's index range.
pub fn validate_entry(entry: &Value, action_count: usize) -> Result<Suggestion, EntryRejection> {
    let obj = entry.as_object().ok_or(EntryRejection::NotAnObject)?;

    let index = obj
        .get("index")
        .and_then(Value::as_u64)
        .ok_or(EntryRejection::MissingField("index"))?;
    if index >= action_count as u64 {
        return Err(EntryRejection::IndexOutOfRange(index));
    }

    let suggested_label = obj
        .get("suggestedLabel")
        .or_else(|| obj.get("suggested_label"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(EntryRejection::MissingField("suggestedLabel"))?;

    let reason = obj
        .get("reason")
        .and_then(Value::as_str)
        .ok_or(EntryRejection::MissingField("reason"))?;

    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or(EntryRejection::MissingField("confidence"))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(EntryRejection::ConfidenceOutOfRange(confidence));
    }

    Ok(Suggestion {
        index: index as usize,
        suggested_label: suggested_label.to_string(),
        reason: reason.trim().to_string(),
        confidence: confidence as f32,
    })
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    // Drop the info string ("json") up to the first newline
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// First array in `s` that parses and could hold entries: empty, or with at
/// least one object. Skips bracketed prose like "[0]" or "[see above]".
fn embedded_array(s: &str) -> Option<Value> {
    s.match_indices('[').find_map(|(start, _)| {
        let mut values = serde_json::Deserializer::from_str(&s[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Array(items))) if items.is_empty() || items.iter().any(Value::is_object) => {
                Some(Value::Array(items))
            }
            _ => None,
        }
    })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
