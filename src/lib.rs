pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod grid;
pub mod pipeline;

pub use config::Settings;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::{AppError, CaptureError, ConfigError, ExtractError, ReportError};

pub use pipeline::{
    CycleOutcome, Marker, MarkerExtractor, MarkerPipeline, MarkerReport, RasterImage,
    ReportWriter,
};
