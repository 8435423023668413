use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::suggest::error::SuggestionError;
use crate::suggest::requester::VisionModel;

/// Outcome of one availability check.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub model: String,
    pub success: bool,
    pub latency_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeAttempt {
    pub request: usize,
    pub success: bool,
    pub rate_limited: bool,
    pub latency_ms: u128,
}

/// Sequential-request probe. Stops at the first rate limit.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitProbe {
    pub model: String,
    pub attempts: Vec<ProbeAttempt>,
    /// 1-based request number that hit the limit.
    pub rate_limited_at: Option<usize>,
}

impl RateLimitProbe {
    pub fn successes(&self) -> usize {
        self.attempts.iter().filter(|a| a.success).count()
    }

    pub fn average_latency_ms(&self) -> u128 {
        let ok: Vec<_> = self.attempts.iter().filter(|a| a.success).collect();
        if ok.is_empty() {
            return 0;
        }
        ok.iter().map(|a| a.latency_ms).sum::<u128>() / ok.len() as u128
    }
}

/// Send one tiny prompt to `model` and time it.
pub fn probe_model(model: &dyn VisionModel) -> ProbeResult {
    let start = Instant::now();
    let outcome = model.generate("Say 'hello' in one word.", None);
    ProbeResult {
        model: model.model_name().to_string(),
        success: outcome.is_ok(),
        latency_ms: start.elapsed().as_millis(),
        error: outcome.err().map(|e| e.to_string()),
    }
}

/// Probe each model name, building a client per model with `build`.
pub fn probe_models<F>(models: &[String], build: F) -> Vec<ProbeResult>
where
    F: Fn(&str) -> Result<Box<dyn VisionModel>, SuggestionError>,
{
    models
        .iter()
        .map(|name| match build(name.as_str()) {
            Ok(model) => probe_model(model.as_ref()),
            Err(e) => ProbeResult {
                model: name.clone(),
                success: false,
                latency_ms: 0,
                error: Some(e.to_string()),
            },
        })
        .collect()
}

/// Fire up to `requests` sequential prompts without backoff.
pub fn probe_rate_limit(model: &dyn VisionModel, requests: usize) -> RateLimitProbe {
    let mut attempts = Vec::new();
    let mut rate_limited_at = None;

    for i in 1..=requests {
        let start = Instant::now();
        let outcome = model.generate(&format!("Say the number {} in one word.", i), None);
        let latency_ms = start.elapsed().as_millis();
        let rate_limited = matches!(&outcome, Err(e) if e.is_rate_limited());

        info!(request = i, ok = outcome.is_ok(), rate_limited, latency_ms = latency_ms as u64, "probe request");
        attempts.push(ProbeAttempt {
            request: i,
            success: outcome.is_ok(),
            rate_limited,
            latency_ms,
        });

        if rate_limited {
            rate_limited_at = Some(i);
            break;
        }
    }

    RateLimitProbe {
        model: model.model_name().to_string(),
        attempts,
        rate_limited_at,
    }
}
