use serde::Serialize;

use chrono::Utc;

/// Pipeline phase a trace event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Scan,
    Screenshots,
    Suggest,
    Assemble,
    Report,
}

/// One line of the JSONL run trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: i64,
    pub url: String,
    pub phase: Phase,
    pub ok: bool,

    pub action_count: Option<usize>,
    pub suggestion_count: Option<usize>,
    pub path: Option<String>,
    pub error: Option<String>,
}

impl TraceEvent {
    pub fn now(url: &str, phase: Phase) -> Self {
        Self {
            timestamp_ms: Utc::now().timestamp_millis(),
            url: url.to_string(),
            phase,
            ok: true,
            action_count: None,
            suggestion_count: None,
            path: None,
            error: None,
        }
    }

    pub fn with_actions(mut self, count: usize) -> Self {
        self.action_count = Some(count);
        self
    }

    pub fn with_suggestions(mut self, count: usize) -> Self {
        self.suggestion_count = Some(count);
        self
    }

    pub fn with_path(mut self, path: impl ToString) -> Self {
        self.path = Some(path.to_string());
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.ok = false;
        self.error = Some(error.to_string());
        self
    }
}
