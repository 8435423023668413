use thiserror::Error;

/// Why a suggestion request produced no suggestions.
///
/// None of these are fatal to a run: the pipeline records the kind in the
/// report and carries on with an empty suggestion list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SuggestionError {
    /// Connection, timeout or body-read failure before a status was seen
    #[error("model transport failed: {0}")]
    Transport(String),

    /// 401/403 from the model service
    #[error("model service rejected credentials ({status}): {message}")]
    Auth { status: u16, message: String },

    /// 429 / RESOURCE_EXHAUSTED. Back off before retrying.
    #[error("model service rate limited the request: {message}")]
    RateLimited { message: String },

    /// Any other non-success status, e.g. a malformed request
    #[error("model service returned {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The response could not be turned into suggestions
    #[error("could not parse model response: {0}")]
    Parse(String),
}

impl SuggestionError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SuggestionError::RateLimited { .. })
    }

    /// Map an HTTP failure to its error kind.
    ///
    /// `api_status` is the service's symbolic status (e.g. `RESOURCE_EXHAUSTED`)
    /// when the error body carried one.
    pub fn from_http(status: u16, api_status: Option<&str>, message: String) -> Self {
        match (status, api_status) {
            (429, _) | (_, Some("RESOURCE_EXHAUSTED")) => SuggestionError::RateLimited { message },
            (401 | 403, _) | (_, Some("UNAUTHENTICATED" | "PERMISSION_DENIED")) => {
                SuggestionError::Auth { status, message }
            }
            _ => SuggestionError::Rejected { status, message },
        }
    }
}
