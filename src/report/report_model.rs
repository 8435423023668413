use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scanner::action_model::ActionKind;
use crate::suggest::error::SuggestionError;

// ============================================================================
// Label improvement report: one per pipeline run
// ============================================================================

/// How the suggestion phase ended. Anything but `Ok` means the report covers
/// fewer actions than the model was asked about (possibly none).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuggestionStatus {
    Ok,
    RateLimited,
    AuthFailed,
    TransportFailed,
    Rejected,
    ParseFailed,
}

impl From<&SuggestionError> for SuggestionStatus {
    fn from(e: &SuggestionError) -> Self {
        match e {
            SuggestionError::Transport(_) => SuggestionStatus::TransportFailed,
            SuggestionError::Auth { .. } => SuggestionStatus::AuthFailed,
            SuggestionError::RateLimited { .. } => SuggestionStatus::RateLimited,
            SuggestionError::Rejected { .. } => SuggestionStatus::Rejected,
            SuggestionError::Parse(_) => SuggestionStatus::ParseFailed,
        }
    }
}

/// One action joined with its suggestion, if it got one.
///
/// `None` in the suggestion fields means the model proposed no change; it is
/// never backfilled with the original label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedAction {
    pub index: usize,
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub selector: String,
    pub original_label: String,
    pub suggested_label: Option<String>,
    pub reason: Option<String>,
    pub confidence: Option<f32>,
}

impl MergedAction {
    pub fn is_improved(&self) -> bool {
        self.suggested_label.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelImprovementResult {
    pub url: String,
    pub page_title: String,
    pub timestamp: DateTime<Utc>,
    pub total_actions: usize,
    pub improved_count: usize,
    pub suggestion_status: SuggestionStatus,
    /// In scan order.
    pub actions: Vec<MergedAction>,
    pub screenshot_path: Option<PathBuf>,
    pub raw_screenshot_path: Option<PathBuf>,
}

impl LabelImprovementResult {
    pub fn with_screenshots(mut self, raw: PathBuf, annotated: PathBuf) -> Self {
        self.raw_screenshot_path = Some(raw);
        self.screenshot_path = Some(annotated);
        self
    }

    pub fn with_status(mut self, status: SuggestionStatus) -> Self {
        self.suggestion_status = status;
        self
    }

    pub fn improved(&self) -> impl Iterator<Item = &MergedAction> {
        self.actions.iter().filter(|a| a.is_improved())
    }
}
