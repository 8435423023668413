use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::report::report_model::LabelImprovementResult;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File locations for one run: `{timestamp}-{domain}-raw.png`,
/// `{timestamp}-{domain}-annotated.png` and `{timestamp}-{domain}.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub base_name: String,
    pub raw_screenshot: PathBuf,
    pub annotated_screenshot: PathBuf,
    pub report: PathBuf,
}

impl ArtifactPaths {
    pub fn for_run(output_dir: &Path, started_at: DateTime<Utc>, url: &str) -> Self {
        let base_name = format!("{}-{}", file_timestamp(started_at), domain_slug(url));
        Self {
            raw_screenshot: output_dir.join(format!("{}-raw.png", base_name)),
            annotated_screenshot: output_dir.join(format!("{}-annotated.png", base_name)),
            report: output_dir.join(format!("{}.json", base_name)),
            base_name,
        }
    }
}

/// RFC 3339 UTC with milliseconds, made filename-safe: `2025-01-15T10-00-00-000Z`.
pub fn file_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// URL host with dots replaced: `www.example.com` -> `www-example-com`.
/// URLs without a host (e.g. `file://`) map to `local`.
pub fn domain_slug(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .filter(|h| !h.is_empty())
        .map(|h| h.replace('.', "-"))
        .unwrap_or_else(|| "local".to_string())
}

/// Writes run artifacts under one output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn paths_for(&self, started_at: DateTime<Utc>, url: &str) -> ArtifactPaths {
        ArtifactPaths::for_run(&self.output_dir, started_at, url)
    }

    pub fn write_screenshots(&self, paths: &ArtifactPaths, raw: &[u8], annotated: &[u8]) -> Result<(), PersistError> {
        self.ensure_dir()?;
        write_file(&paths.raw_screenshot, raw)?;
        write_file(&paths.annotated_screenshot, annotated)?;
        Ok(())
    }

    pub fn write_report(&self, paths: &ArtifactPaths, result: &LabelImprovementResult) -> Result<(), PersistError> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(result)?;
        write_file(&paths.report, json.as_bytes())
    }

    fn ensure_dir(&self) -> Result<(), PersistError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| PersistError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    std::fs::write(path, bytes).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
    Ok(())
}

/// Read a persisted report back.
pub fn load_report(path: &Path) -> Result<LabelImprovementResult, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
