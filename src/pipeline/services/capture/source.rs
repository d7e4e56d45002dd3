use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::CaptureError;

/// Produces one encoded map image per call.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn capture(&self) -> Result<Vec<u8>, CaptureError>;
    fn name(&self) -> &'static str;
}

async fn read_image(path: &Path) -> Result<Vec<u8>, CaptureError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CaptureError::ReadFile(e, path.to_path_buf()))?;
    if bytes.is_empty() {
        return Err(CaptureError::Empty);
    }
    Ok(bytes)
}

/// Reads a screenshot that some other job keeps refreshing on disk.
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CaptureSource for FileCapture {
    async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        tracing::debug!("Reading map image from {}", self.path.display());
        read_image(&self.path).await
    }

    fn name(&self) -> &'static str {
        "FileCapture"
    }
}

/// Runs an external program, typically a headless browser, for each capture.
///
/// With `output` set the program is expected to write the PNG there;
/// otherwise its stdout is taken as the image. Any file already at `output`
/// is removed before the program starts, so a run that writes nothing fails
/// instead of returning the previous screenshot.
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
    output: Option<PathBuf>,
}

impl CommandCapture {
    pub fn new(program: impl Into<String>, args: Vec<String>, output: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            output,
        }
    }

    async fn clear_output(&self) -> Result<(), CaptureError> {
        let Some(path) = &self.output else {
            return Ok(());
        };
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CaptureError::ClearOutput(e, path.clone())),
        }
    }
}

#[async_trait]
impl CaptureSource for CommandCapture {
    async fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        self.clear_output().await?;
        tracing::debug!("Running capture command {} {:?}", self.program, self.args);
        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CaptureError::Spawn(e, self.program.clone()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                tracing::warn!("Capture command stderr: {}", stderr.trim());
            }
            return Err(CaptureError::CommandFailed(
                self.program.clone(),
                output.status.to_string(),
            ));
        }

        match &self.output {
            Some(path) => read_image(path).await,
            None if output.stdout.is_empty() => Err(CaptureError::Empty),
            None => Ok(output.stdout),
        }
    }

    fn name(&self) -> &'static str {
        "CommandCapture"
    }
}
