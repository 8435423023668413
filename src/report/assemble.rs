use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::report::report_model::{LabelImprovementResult, MergedAction, SuggestionStatus};
use crate::scanner::action_model::Action;
use crate::suggest::suggestion_model::Suggestion;

/// Merge actions and suggestions by index.
///
/// One record per action, in scan order. When several suggestions share an
/// index the last one wins. Suggestions for unknown indices are ignored.
/// Screenshot paths and a degraded status are attached by the caller.
pub fn assemble(
    url: &str,
    page_title: &str,
    timestamp: DateTime<Utc>,
    actions: &[Action],
    suggestions: &[Suggestion],
) -> LabelImprovementResult {
    let by_index: HashMap<usize, &Suggestion> = suggestions.iter().map(|s| (s.index, s)).collect();

    let merged: Vec<MergedAction> = actions
        .iter()
        .map(|action| {
            let suggestion = by_index.get(&action.index);
            MergedAction {
                index: action.index,
                id: action.id.clone(),
                kind: action.kind,
                selector: action.selector.clone(),
                original_label: action.label.clone(),
                suggested_label: suggestion.map(|s| s.suggested_label.clone()),
                reason: suggestion.map(|s| s.reason.clone()),
                confidence: suggestion.map(|s| s.confidence),
            }
        })
        .collect();

    let improved_count = merged.iter().filter(|m| m.is_improved()).count();

    LabelImprovementResult {
        url: url.to_string(),
        page_title: page_title.to_string(),
        timestamp,
        total_actions: merged.len(),
        improved_count,
        suggestion_status: SuggestionStatus::Ok,
        actions: merged,
        screenshot_path: None,
        raw_screenshot_path: None,
    }
}
