use crate::scanner::action_model::Action;

/// Build the instruction sent alongside the annotated screenshot.
///
/// Each action is listed under the same number that is painted on the image,
/// so the model can cross-reference what it sees with what the page reports.
pub fn build_label_prompt(actions: &[Action]) -> String {
    let listing = actions
        .iter()
        .map(|a| {
            let label = if a.label.is_empty() {
                "(no label)".to_string()
            } else {
                format!("\"{}\"", a.label.replace('"', "'"))
            };
            format!("[{}] {} {}", a.index, a.kind.as_str(), label)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an accessibility reviewer. The attached screenshot shows a web page.
Every interactive element is outlined and tagged with a numbered badge.
The same elements are listed below as [number] type "current label".

ELEMENTS ({count}):
{listing}

For each element whose current label is missing, vague, misleading, or does not
describe what the element does as seen in the screenshot, propose a better
accessible label. Skip elements whose label is already good.

Return ONLY a JSON array, no explanation:
[
  {{"index": 0, "suggestedLabel": "...", "reason": "...", "confidence": 0.0}}
]

Rules:
- "index" must be one of the numbers listed above.
- "suggestedLabel" is short (at most 6 words) and describes the action.
- "reason" is one short sentence.
- "confidence" is a number between 0 and 1.
- Return [] if no label needs improvement."#,
        count = actions.len(),
        listing = listing,
    )
}
