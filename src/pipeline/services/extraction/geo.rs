use serde::Deserialize;

const COORDINATE_SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Geographic position of the raster's top-left and bottom-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoBounds {
    pub top_left: GeoPoint,
    pub bottom_right: GeoPoint,
}

impl Default for GeoBounds {
    /// Framing of the Korean peninsula used by the fire status map canvas.
    fn default() -> Self {
        Self {
            top_left: GeoPoint::new(38.7, 124.5),
            bottom_right: GeoPoint::new(33.0, 131.0),
        }
    }
}

impl GeoBounds {
    pub fn new(top_left: GeoPoint, bottom_right: GeoPoint) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    pub fn lon_span(&self) -> f64 {
        self.bottom_right.lon - self.top_left.lon
    }

    pub fn lat_span(&self) -> f64 {
        self.top_left.lat - self.bottom_right.lat
    }

    /// Linear pixel to coordinate mapping, rounded to 6 decimals.
    ///
    /// Positions are fractions of the full raster extent, so `(0, 0)` is the
    /// top-left corner and `(width, height)` the bottom-right one.
    pub fn pixel_to_geo(&self, x: f64, y: f64, width: u32, height: u32) -> GeoPoint {
        let lon = self.top_left.lon + (x / f64::from(width)) * self.lon_span();
        let lat = self.top_left.lat - (y / f64::from(height)) * self.lat_span();
        GeoPoint::new(round_coordinate(lat), round_coordinate(lon))
    }
}

pub fn round_coordinate(value: f64) -> f64 {
    (value * COORDINATE_SCALE).round() / COORDINATE_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn corners_map_to_bounds() {
        let bounds = GeoBounds::default();

        let top_left = bounds.pixel_to_geo(0.0, 0.0, 100, 100);
        assert_close(top_left.lat, 38.7);
        assert_close(top_left.lon, 124.5);

        let bottom_right = bounds.pixel_to_geo(100.0, 100.0, 100, 100);
        assert_close(bottom_right.lat, 33.0);
        assert_close(bottom_right.lon, 131.0);
    }

    #[test]
    fn last_pixel_is_one_step_short_of_the_corner() {
        let bounds = GeoBounds::default();
        let point = bounds.pixel_to_geo(99.0, 99.0, 100, 100);
        assert_close(point.lat, 33.057);
        assert_close(point.lon, 130.935);
    }

    #[test]
    fn rounds_to_six_decimals() {
        assert_close(round_coordinate(37.123_456_789), 37.123_457);
        assert_close(round_coordinate(-0.000_000_4), 0.0);
    }
}
