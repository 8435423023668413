use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use crate::scanner::action_model::Action;
use crate::suggest::error::SuggestionError;
use crate::suggest::parse::parse_suggestions;
use crate::suggest::prompt::build_label_prompt;
use crate::suggest::suggestion_model::Suggestion;

// ============================================================================
// VisionModel trait: the generative model capability
// ============================================================================

/// A single request/response call to a vision-language model.
pub trait VisionModel {
    fn model_name(&self) -> &str;

    /// Send `prompt` with an optional PNG attached and return the response text.
    fn generate(&self, prompt: &str, image_png: Option<&[u8]>) -> Result<String, SuggestionError>;
}

// ============================================================================
// Retry policy
// ============================================================================

/// Backoff applied to rate-limited requests only. Other failures are returned
/// on the first attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Retry without sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): base, 2×base, 4×base, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Call the model, backing off and re-sending while it reports a rate limit.
pub fn generate_with_retry(
    model: &dyn VisionModel,
    prompt: &str,
    image_png: Option<&[u8]>,
    policy: &RetryPolicy,
) -> Result<String, SuggestionError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match model.generate(prompt, image_png) {
            Err(e) if e.is_rate_limited() && attempt < attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    model = model.model_name(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, backing off"
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            other => return other,
        }
    }
}

// ============================================================================
// Suggestion request
// ============================================================================

/// Ask the model for better labels for `actions`, given the annotated capture.
///
/// Returned suggestions only reference indices present in `actions`.
pub fn get_suggestions(
    model: &dyn VisionModel,
    annotated_png: &[u8],
    actions: &[Action],
    policy: &RetryPolicy,
) -> Result<Vec<Suggestion>, SuggestionError> {
    if actions.is_empty() {
        info!("no actions to review, skipping model call");
        return Ok(Vec::new());
    }

    let prompt = build_label_prompt(actions);
    let response = generate_with_retry(model, &prompt, Some(annotated_png), policy)?;
    let suggestions = parse_suggestions(&response, actions.len())?;

    info!(
        model = model.model_name(),
        suggestions = suggestions.len(),
        "received label suggestions"
    );
    Ok(suggestions)
}

// ============================================================================
// Mock model (for testing without network access)
// ============================================================================

/// Replays scripted responses in order. Once the script runs out every call
/// fails with a transport error.
pub struct MockVisionModel {
    responses: Mutex<VecDeque<Result<String, SuggestionError>>>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockVisionModel {
    pub fn new(responses: Vec<Result<String, SuggestionError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn with_response(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl VisionModel for MockVisionModel {
    fn model_name(&self) -> &str {
        "mock"
    }

    fn generate(&self, prompt: &str, _image_png: Option<&[u8]>) -> Result<String, SuggestionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap_or_else(|e| e.into_inner()) = Some(prompt.to_string());
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(SuggestionError::Transport("mock script exhausted".into())))
    }
}
