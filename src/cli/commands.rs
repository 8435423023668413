use crate::browser::session::BrowserSession;
use crate::cli::config::{
    API_KEY_ENV, AppConfig, build_gemini_options, build_retry_policy, build_scan_options,
    build_session_options, resolve_api_key, resolve_model_name,
};
use crate::pipeline::{Pipeline, PipelineError};
use crate::report::console::{format_summary, status_text};
use crate::report::persist::ArtifactStore;
use crate::suggest::gemini::GeminiBackend;
use crate::suggest::probe::{probe_models, probe_rate_limit};
use crate::suggest::requester::VisionModel;
use crate::trace::logger::TraceLogger;

// ============================================================================
// analyze subcommand
// ============================================================================

pub fn cmd_analyze(
    url: &str,
    output_dir: Option<&str>,
    settle_ms: Option<u64>,
    max_attempts: Option<u32>,
    cli_model: Option<&str>,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = require_api_key(config)?;
    let model_name = resolve_model_name(cli_model, &config.model);
    let model = GeminiBackend::new(build_gemini_options(&config.model, &model_name, api_key))?;

    let tracer = match config.output.trace_file.as_deref() {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };
    if let Some(path) = config.output.trace_file.as_deref().filter(|_| tracer.is_enabled()) {
        println!("Tracing pipeline phases to {}", path);
    }
    let pipeline = Pipeline {
        model: &model,
        retry: build_retry_policy(&config.model, max_attempts),
        scan_options: build_scan_options(&config.scanner, settle_ms),
        store: ArtifactStore::new(output_dir.unwrap_or(&config.output.dir)),
        tracer: &tracer,
    };

    println!("Analyzing: {}", url);
    println!("Scanning page and taking screenshots...");
    let mut session = BrowserSession::launch(&build_session_options(&config.scanner))?;
    let outcome = pipeline.run(&mut session, url);
    session.quit()?;

    let outcome = match outcome {
        Ok(o) => o,
        Err(PipelineError::Report { source, partial }) => {
            // Screenshots are on disk; show what would have been in the report
            eprintln!("{}", format_summary(&partial, std::path::Path::new("(not written)")));
            return Err(Box::new(source));
        }
        Err(e) => return Err(Box::new(e)),
    };

    println!("Found {} actions", outcome.result.total_actions);
    println!("Screenshots saved to {}/", pipeline.store.output_dir().display());
    match &outcome.suggestion_error {
        None => println!("Received {} improvement suggestions", outcome.result.improved_count),
        Some(e) => println!(
            "No suggestions ({}): {}",
            status_text(outcome.result.suggestion_status),
            e
        ),
    }
    print!("{}", format_summary(&outcome.result, &outcome.paths.report));

    Ok(())
}

// ============================================================================
// probe subcommand
// ============================================================================

pub fn cmd_probe(models: &[String], requests: usize, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = require_api_key(config)?;

    println!("=== Model API Probe ===\n");
    println!("API Key: {}", mask_key(&api_key));
    println!("\n--- Model Availability ---\n");

    let build = |name: &str| -> Result<Box<dyn VisionModel>, crate::suggest::error::SuggestionError> {
        let options = build_gemini_options(&config.model, name, api_key.clone());
        Ok(Box::new(GeminiBackend::new(options)?))
    };

    let results = probe_models(models, &build);
    for r in &results {
        match &r.error {
            None => println!("\u{2713} {}: OK ({}ms)", r.model, r.latency_ms),
            Some(e) => {
                println!("\u{2717} {}: FAILED", r.model);
                println!("  Error: {}", truncate(e, 100));
            }
        }
    }

    let Some(working) = results.iter().find(|r| r.success) else {
        println!("\nNo model responded; skipping rate limit test.");
        return Ok(());
    };

    println!("\n--- Rate Limit Test ---");
    println!(
        "\nTesting rate limits for {} with {} sequential requests...",
        working.model, requests
    );
    let model = build(working.model.as_str())?;
    let probe = probe_rate_limit(model.as_ref(), requests);
    for attempt in &probe.attempts {
        let state = if attempt.success {
            "OK"
        } else if attempt.rate_limited {
            "RATE_LIMITED"
        } else {
            "FAILED"
        };
        println!("  Request {}: {} ({}ms)", attempt.request, state, attempt.latency_ms);
    }

    println!("\nResults for {}:", probe.model);
    println!("  Successful: {}/{}", probe.successes(), probe.attempts.len());
    println!("  Avg latency: {}ms", probe.average_latency_ms());
    if let Some(at) = probe.rate_limited_at {
        println!("  Rate limit hit: YES (request {})", at);
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn require_api_key(config: &AppConfig) -> Result<String, String> {
    resolve_api_key(&config.model).ok_or_else(|| {
        format!(
            "{} is not set (or set model.api_key in the config file)",
            API_KEY_ENV
        )
    })
}

/// First 8 and last 4 characters of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
