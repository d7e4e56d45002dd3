use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::task::JoinError;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{CaptureError, ExtractError, ReportError};
use crate::pipeline::services::capture::{self, Capturer};
use crate::pipeline::services::{MarkerExtractor, ReportWriter};
use crate::pipeline::types::{MarkerCandidate, MarkerReport};

/// What happened in one capture, extract, write cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Written { markers: usize },
    CaptureFailed(CaptureError),
    DecodeFailed(ExtractError),
    /// The extraction task itself died, e.g. a panic in the scan.
    ExtractFailed(ExtractError),
    WriteFailed(ReportError),
}

impl CycleOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, CycleOutcome::Written { .. })
    }
}

/// Capture, extract and write, one cycle at a time.
///
/// Per-cycle failures are reported through [`CycleOutcome`] and never leave
/// the pipeline unusable. Only a successful extraction replaces the shared
/// report; capture and decode failures keep the previous file.
pub struct MarkerPipeline {
    capturer: Capturer,
    extractor: Arc<MarkerExtractor>,
    writer: ReportWriter,
}

impl MarkerPipeline {
    pub fn new(capturer: Capturer, extractor: MarkerExtractor, writer: ReportWriter) -> Self {
        Self {
            capturer,
            extractor: Arc::new(extractor),
            writer,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let capturer = Capturer::new(
            capture::source_from_settings(&settings.capture),
            settings.capture.timeout(),
        );
        let extraction = &settings.extraction;
        let extractor = MarkerExtractor::new(
            extraction.profile(),
            extraction.bounds,
            extraction.tunables(),
        );
        Self::new(
            capturer,
            extractor,
            ReportWriter::new(settings.report.report_path()),
        )
    }

    pub fn writer(&self) -> &ReportWriter {
        &self.writer
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let run_id = Uuid::new_v4();
        let start_time = Instant::now();
        tracing::info!("[{}] Marker cycle {} started", Utc::now(), run_id);

        let outcome = self.process().await;
        match &outcome {
            CycleOutcome::Written { markers } => tracing::info!(
                "Marker cycle {} wrote {} markers in {}ms",
                run_id,
                markers,
                start_time.elapsed().as_millis()
            ),
            CycleOutcome::CaptureFailed(e) => {
                tracing::error!("Marker cycle {} capture failed: {}", run_id, e)
            }
            CycleOutcome::DecodeFailed(e) => tracing::warn!(
                "Marker cycle {} could not decode the capture, keeping previous report: {}",
                run_id,
                e
            ),
            CycleOutcome::ExtractFailed(e) => tracing::error!(
                "Marker cycle {} extraction aborted, keeping previous report: {}",
                run_id,
                e
            ),
            CycleOutcome::WriteFailed(e) => {
                tracing::error!("Marker cycle {} report write failed: {}", run_id, e)
            }
        }
        outcome
    }

    async fn process(&mut self) -> CycleOutcome {
        let frame = match self.capturer.capture().await {
            Ok(frame) => frame,
            Err(e) => return CycleOutcome::CaptureFailed(e),
        };
        tracing::debug!(
            "Captured frame {} ({} bytes) from {} at {}",
            frame.frame_id(),
            frame.bytes().len(),
            frame.source(),
            frame.captured_at()
        );

        let extractor = Arc::clone(&self.extractor);
        let bytes = frame.shared_bytes();
        let joined = tokio::task::spawn_blocking(move || extractor.extract_png(&bytes)).await;
        let candidates = match extraction_result(joined) {
            Ok(candidates) => candidates,
            Err(outcome) => return outcome,
        };

        let report = MarkerReport::from_candidates(&candidates);
        let markers = report.len();
        let writer = self.writer.clone();
        let path = writer.path().to_path_buf();
        match tokio::task::spawn_blocking(move || writer.write(&report)).await {
            Ok(Ok(())) => CycleOutcome::Written { markers },
            Ok(Err(e)) => CycleOutcome::WriteFailed(e),
            Err(e) => CycleOutcome::WriteFailed(ReportError::Write(std::io::Error::other(e), path)),
        }
    }
}

fn extraction_result(
    joined: Result<Result<Vec<MarkerCandidate>, ExtractError>, JoinError>,
) -> Result<Vec<MarkerCandidate>, CycleOutcome> {
    match joined {
        Ok(Ok(candidates)) => Ok(candidates),
        Ok(Err(e)) => Err(CycleOutcome::DecodeFailed(e)),
        Err(e) => Err(CycleOutcome::ExtractFailed(ExtractError::Task(e.to_string()))),
    }
}
