use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Capture Error: {0}")]
    Capture(#[from] CaptureError),
    #[error("Extraction Error: {0}")]
    Extract(#[from] ExtractError),
    #[error("Report Error: {0}")]
    Report(#[from] ReportError),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

// Capture Error Type
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to read capture file {1}: {0}")]
    ReadFile(std::io::Error, PathBuf),
    #[error("Failed to spawn capture command '{1}': {0}")]
    Spawn(std::io::Error, String),
    #[error("Capture command '{0}' exited with status {1}")]
    CommandFailed(String, String),
    #[error("Failed to clear previous capture output {1}: {0}")]
    ClearOutput(std::io::Error, PathBuf),
    #[error("Capture produced no image data")]
    Empty,
    #[error("Capture timed out after {0:?}")]
    Timeout(Duration),
    #[error("Capture service failed: {0}")]
    Service(String),
}

/// Raised when image bytes cannot be turned into a raster. Distinct from a
/// successful scan that found nothing.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has no pixels ({0}x{1})")]
    EmptyImage(u32, u32),
    #[error("Extraction task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write report to {1}: {0}")]
    Write(std::io::Error, PathBuf),
}
