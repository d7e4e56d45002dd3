mod marker;
mod raster;

pub use marker::{Marker, MarkerCandidate, MarkerReport};
pub use raster::RasterImage;
