pub mod pipeline;
pub mod services;
pub mod types;

pub use pipeline::{CycleOutcome, MarkerPipeline};
pub use services::{MarkerExtractor, ReportWriter};
pub use types::{Marker, MarkerCandidate, MarkerReport, RasterImage};
