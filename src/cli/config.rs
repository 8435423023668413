use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::browser::session::SessionOptions;
use crate::scanner::scanner::ScanOptions;
use crate::suggest::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL, GeminiOptions};
use crate::suggest::requester::RetryPolicy;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_CONFIG_FILE: &str = "label-improver.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "label-improver",
    version,
    about = "Suggest better accessible labels for a page's interactive elements"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Model name, e.g. gemini-2.5-flash
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Path to config file (default: label-improver.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a page, annotate it and ask the model for better labels
    Analyze {
        /// Absolute URL of the page to analyze
        url: String,

        /// Directory for screenshots and the JSON report
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Extra wait after page load, in milliseconds
        #[arg(long)]
        settle_ms: Option<u64>,

        /// Attempts per model request when rate limited
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Check model availability and how soon it rate limits
    Probe {
        /// Sequential requests for the rate-limit test
        #[arg(long, default_value_t = 5)]
        requests: usize,

        /// Models to check, comma separated
        #[arg(long, value_delimiter = ',', default_value = "gemini-2.5-flash,gemini-2.0-flash")]
        models: Vec<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `label-improver.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: Option<String>,
    pub endpoint: Option<String>,
    /// Falls back to the GEMINI_API_KEY environment variable.
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: None,
            endpoint: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_script")]
    pub script: String,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            script: default_script(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            settle_ms: default_settle_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// JSONL trace of pipeline phases; off when unset
    pub trace_file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            trace_file: None,
        }
    }
}

// Serde default helpers
fn default_timeout_secs() -> u64 { 120 }
fn default_connect_timeout_secs() -> u64 { 10 }
fn default_max_attempts() -> u32 { 3 }
fn default_backoff_ms() -> u64 { 2000 }
fn default_script() -> String { "node/browser_server.js".to_string() }
fn default_viewport_width() -> u32 { 1280 }
fn default_viewport_height() -> u32 { 800 }
fn default_settle_ms() -> u64 { 1000 }
fn default_output_dir() -> String { "output".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing;
/// a malformed file is reported and ignored.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "ignoring malformed config file");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// API key from the config file, else from the environment.
pub fn resolve_api_key(config: &ModelConfig) -> Option<String> {
    config
        .api_key
        .clone()
        .or_else(|| std::env::var(API_KEY_ENV).ok())
        .filter(|k| !k.trim().is_empty())
}

/// Model name: CLI > config > default.
pub fn resolve_model_name(cli_model: Option<&str>, config: &ModelConfig) -> String {
    cli_model
        .map(str::to_string)
        .or_else(|| config.name.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

pub fn build_gemini_options(config: &ModelConfig, model: &str, api_key: String) -> GeminiOptions {
    GeminiOptions {
        endpoint: config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        model: model.to_string(),
        api_key,
        connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        request_timeout: Duration::from_secs(config.timeout_secs),
    }
}

pub fn build_retry_policy(config: &ModelConfig, max_attempts: Option<u32>) -> RetryPolicy {
    RetryPolicy {
        max_attempts: max_attempts.unwrap_or(config.max_attempts).max(1),
        base_delay: Duration::from_millis(config.backoff_ms),
        max_delay: Duration::from_millis(config.backoff_ms.saturating_mul(16)),
    }
}

pub fn build_session_options(config: &ScannerConfig) -> SessionOptions {
    SessionOptions {
        script: config.script.clone(),
        viewport_width: config.viewport_width,
        viewport_height: config.viewport_height,
    }
}

pub fn build_scan_options(config: &ScannerConfig, settle_ms: Option<u64>) -> ScanOptions {
    ScanOptions {
        settle_ms: settle_ms.unwrap_or(config.settle_ms),
    }
}
