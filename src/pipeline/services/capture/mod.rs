pub mod capture_service;
pub mod source;

pub use capture_service::{CaptureService, Capturer};
pub use source::{CaptureSource, CommandCapture, FileCapture};

use crate::config::{CaptureMethod, CaptureSettings};

pub fn source_from_settings(settings: &CaptureSettings) -> Box<dyn CaptureSource> {
    match &settings.source {
        CaptureMethod::File { path } => Box::new(FileCapture::new(path.clone())),
        CaptureMethod::Command {
            program,
            args,
            output,
        } => Box::new(CommandCapture::new(
            program.clone(),
            args.clone(),
            output.clone(),
        )),
    }
}
