use serde::{Deserialize, Serialize};

/// A model-proposed replacement label for one action, already validated
/// against the scan it refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub index: usize,
    pub suggested_label: String,
    pub reason: String,
    /// Self-reported certainty in `[0.0, 1.0]`.
    pub confidence: f32,
}
