pub mod color;
pub mod extractor;
pub mod geo;
mod verified;

pub use color::{ColorProfile, ColorTarget};
pub use extractor::{MarkerExtractor, ScanTunables};
pub use geo::{GeoBounds, GeoPoint};
