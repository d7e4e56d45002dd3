use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::ReportError;
use crate::pipeline::types::MarkerReport;

/// Replaces the shared marker file with a new report.
///
/// The report is written to a temporary file next to the target and renamed
/// over it, so readers see either the old or the new array.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, report: &MarkerReport) -> Result<(), ReportError> {
        let mut json = serde_json::to_vec_pretty(report)?;
        json.push(b'\n');

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |e: std::io::Error| ReportError::Write(e, self.path.clone());

        std::fs::create_dir_all(&dir).map_err(io_err)?;
        let mut file = NamedTempFile::new_in(&dir).map_err(io_err)?;
        file.write_all(&json).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        file.persist(&self.path).map_err(|e| io_err(e.error))?;

        tracing::info!("Wrote {} markers to {}", report.len(), self.path.display());
        Ok(())
    }
}
