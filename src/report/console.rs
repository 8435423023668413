use std::path::Path;

use crate::report::report_model::{LabelImprovementResult, SuggestionStatus};

// ============================================================================
// Console summary: printed after a successful run
// ============================================================================

/// Format a run summary for the terminal.
///
/// Produces output like:
/// ```text
/// === Results ===
/// Total actions: 3
/// Improved labels: 1
/// Output: output/2025-01-15T10-00-00-000Z-example-com.json
///
/// Suggested improvements:
///   [1] "" -> "Close dialog" (0.90)
///       Reason: icon-only button lacks text
/// ```
pub fn format_summary(result: &LabelImprovementResult, report_path: &Path) -> String {
    let mut out = String::new();

    out.push_str("\n=== Results ===\n");
    out.push_str(&format!("Total actions: {}\n", result.total_actions));
    out.push_str(&format!("Improved labels: {}\n", result.improved_count));
    if result.suggestion_status != SuggestionStatus::Ok {
        out.push_str(&format!(
            "Suggestions: {} (report lists no suggestions from this run)\n",
            status_text(result.suggestion_status)
        ));
    }
    out.push_str(&format!("Output: {}\n", report_path.display()));

    if result.improved_count > 0 {
        out.push_str("\nSuggested improvements:\n");
        for action in result.improved() {
            let suggested = action.suggested_label.as_deref().unwrap_or_default();
            out.push_str(&format!(
                "  [{}] \"{}\" -> \"{}\"",
                action.index, action.original_label, suggested
            ));
            if let Some(confidence) = action.confidence {
                out.push_str(&format!(" ({:.2})", confidence));
            }
            out.push('\n');
            if let Some(reason) = action.reason.as_deref() {
                out.push_str(&format!("      Reason: {}\n", reason));
            }
        }
    }

    out
}

pub fn status_text(status: SuggestionStatus) -> &'static str {
    match status {
        SuggestionStatus::Ok => "ok",
        SuggestionStatus::RateLimited => "rate limited",
        SuggestionStatus::AuthFailed => "authentication failed",
        SuggestionStatus::TransportFailed => "model unreachable",
        SuggestionStatus::Rejected => "request rejected",
        SuggestionStatus::ParseFailed => "unparseable model response",
    }
}
