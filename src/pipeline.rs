use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::browser::page::PageDriver;
use crate::report::assemble::assemble;
use crate::report::persist::{ArtifactPaths, ArtifactStore, PersistError};
use crate::report::report_model::{LabelImprovementResult, SuggestionStatus};
use crate::scanner::error::ScanError;
use crate::scanner::scanner::{ScanOptions, scan};
use crate::suggest::error::SuggestionError;
use crate::suggest::requester::{RetryPolicy, VisionModel, get_suggestions};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{Phase, TraceEvent};

/// Failures that end a run. Suggestion failures are not among them.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("screenshots could not be saved: {0}")]
    Screenshots(#[source] PersistError),

    /// The report was assembled but not written; `partial` holds it.
    #[error("report could not be saved: {source}")]
    Report {
        #[source]
        source: PersistError,
        partial: Box<LabelImprovementResult>,
    },
}

#[derive(Debug)]
pub struct RunOutcome {
    pub result: LabelImprovementResult,
    pub paths: ArtifactPaths,
    /// Set when the suggestion phase degraded to an empty list.
    pub suggestion_error: Option<SuggestionError>,
}

/// Scan → save screenshots → request suggestions → assemble → save report.
pub struct Pipeline<'a> {
    pub model: &'a dyn VisionModel,
    pub retry: RetryPolicy,
    pub scan_options: ScanOptions,
    pub store: ArtifactStore,
    pub tracer: &'a TraceLogger,
}

impl Pipeline<'_> {
    pub fn run(&self, driver: &mut dyn PageDriver, url: &str) -> Result<RunOutcome, PipelineError> {
        let started_at = Utc::now();
        let paths = self.store.paths_for(started_at, url);

        // ---- Scan ----
        let scanned = scan(driver, url, &self.scan_options).map_err(|e| {
            self.tracer.log(&TraceEvent::now(url, Phase::Scan).with_error(&e));
            e
        })?;
        self.tracer
            .log(&TraceEvent::now(url, Phase::Scan).with_actions(scanned.actions.len()));

        // ---- Screenshots are kept even if the model call fails ----
        self.store
            .write_screenshots(&paths, &scanned.raw_screenshot, &scanned.annotated_screenshot)
            .map_err(|e| {
                self.tracer.log(&TraceEvent::now(url, Phase::Screenshots).with_error(&e));
                PipelineError::Screenshots(e)
            })?;
        self.tracer.log(
            &TraceEvent::now(url, Phase::Screenshots).with_path(paths.annotated_screenshot.display()),
        );
        info!(dir = %self.store.output_dir().display(), "screenshots saved");

        // ---- Suggestions (degrade, never abort) ----
        let (suggestions, suggestion_error) =
            match get_suggestions(self.model, &scanned.annotated_screenshot, &scanned.actions, &self.retry) {
                Ok(s) => {
                    self.tracer
                        .log(&TraceEvent::now(url, Phase::Suggest).with_suggestions(s.len()));
                    (s, None)
                }
                Err(e) => {
                    warn!(error = %e, "continuing without suggestions");
                    self.tracer.log(&TraceEvent::now(url, Phase::Suggest).with_error(&e));
                    (Vec::new(), Some(e))
                }
            };

        // ---- Assemble ----
        let status = suggestion_error
            .as_ref()
            .map(SuggestionStatus::from)
            .unwrap_or(SuggestionStatus::Ok);
        let result = assemble(url, &scanned.page_title, Utc::now(), &scanned.actions, &suggestions)
            .with_status(status)
            .with_screenshots(paths.raw_screenshot.clone(), paths.annotated_screenshot.clone());
        self.tracer.log(
            &TraceEvent::now(url, Phase::Assemble)
                .with_actions(result.total_actions)
                .with_suggestions(result.improved_count),
        );

        // ---- Report ----
        if let Err(e) = self.store.write_report(&paths, &result) {
            self.tracer.log(&TraceEvent::now(url, Phase::Report).with_error(&e));
            return Err(PipelineError::Report {
                source: e,
                partial: Box::new(result),
            });
        }
        self.tracer
            .log(&TraceEvent::now(url, Phase::Report).with_path(paths.report.display()));

        Ok(RunOutcome {
            result,
            paths,
            suggestion_error,
        })
    }
}
