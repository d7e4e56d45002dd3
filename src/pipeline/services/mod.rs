pub mod capture;
pub mod extraction;
pub mod report;

pub use capture::{CaptureSource, Capturer};
pub use extraction::MarkerExtractor;
pub use report::ReportWriter;
