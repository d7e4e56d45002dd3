//! Brute-force marker scan over a rendered map image.
use std::time::Instant;

use super::color::{ColorProfile, ColorTarget};
use super::geo::GeoBounds;
use super::verified::VerifiedMask;
use crate::error::ExtractError;
use crate::pipeline::types::{MarkerCandidate, RasterImage};

/// Scan parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTunables {
    /// Sampling interval in pixels along both axes.
    pub stride: u32,
    /// Side of the odd-sized square used for cluster validation and suppression.
    pub neighborhood: u32,
    /// Matching pixels required inside the neighborhood, center included.
    pub cluster_threshold: u32,
    /// Accepted markers must be at least this far apart (squared pixels).
    pub min_distance_sq: u64,
}

impl Default for ScanTunables {
    fn default() -> Self {
        Self {
            stride: 5,
            neighborhood: 9,
            cluster_threshold: 10,
            min_distance_sq: 50 * 50,
        }
    }
}

impl ScanTunables {
    fn radius(&self) -> u32 {
        self.neighborhood / 2
    }
}

pub struct MarkerExtractor {
    profile: ColorProfile,
    bounds: GeoBounds,
    tunables: ScanTunables,
}

impl MarkerExtractor {
    pub fn new(profile: ColorProfile, bounds: GeoBounds, tunables: ScanTunables) -> Self {
        Self {
            profile,
            bounds,
            tunables,
        }
    }

    pub fn tunables(&self) -> &ScanTunables {
        &self.tunables
    }

    /// Decodes `bytes` and scans them. A decode failure is an error, never an
    /// empty result.
    pub fn extract_png(&self, bytes: &[u8]) -> Result<Vec<MarkerCandidate>, ExtractError> {
        let raster = RasterImage::decode(bytes)?;
        Ok(self.extract(&raster))
    }

    /// Scans `raster` row by row and returns markers in discovery order.
    pub fn extract(&self, raster: &RasterImage) -> Vec<MarkerCandidate> {
        let start_time = Instant::now();
        let (width, height) = raster.dimensions();
        let stride = self.tunables.stride.max(1) as usize;
        let radius = self.tunables.radius();

        let mut verified = VerifiedMask::new(width, height);
        let mut found: Vec<MarkerCandidate> = Vec::new();

        for y in (0..height).step_by(stride) {
            for x in (0..width).step_by(stride) {
                if verified.contains(x, y) {
                    continue;
                }

                let pixel = raster.pixel(x, y);
                for target in self.profile.iter() {
                    if !target.matches(pixel) {
                        continue;
                    }

                    // Isolated pixels are anti-aliasing or compression noise.
                    if self.cluster_count(raster, x, y, target) < self.tunables.cluster_threshold {
                        continue;
                    }

                    if found
                        .iter()
                        .any(|m| m.distance_sq(x, y) < self.tunables.min_distance_sq)
                    {
                        continue;
                    }

                    let point = self
                        .bounds
                        .pixel_to_geo(f64::from(x), f64::from(y), width, height);
                    tracing::debug!(
                        "Marker '{}' at pixel ({}, {}) -> ({}, {})",
                        target.label,
                        x,
                        y,
                        point.lat,
                        point.lon
                    );
                    found.push(MarkerCandidate {
                        x,
                        y,
                        lat: point.lat,
                        lon: point.lon,
                        color: target.label.clone(),
                    });
                    verified.mark_square(x, y, radius);
                    break;
                }
            }
        }

        tracing::info!(
            "Extracted {} markers from {}x{} image in {}us",
            found.len(),
            width,
            height,
            start_time.elapsed().as_micros()
        );
        found
    }

    fn cluster_count(&self, raster: &RasterImage, cx: u32, cy: u32, target: &ColorTarget) -> u32 {
        let radius = self.tunables.radius();
        let (width, height) = raster.dimensions();
        let x0 = cx.saturating_sub(radius);
        let y0 = cy.saturating_sub(radius);
        let x1 = cx.saturating_add(radius).min(width - 1);
        let y1 = cy.saturating_add(radius).min(height - 1);

        let mut count = 0;
        for y in y0..=y1 {
            for x in x0..=x1 {
                if target.matches(raster.pixel(x, y)) {
                    count += 1;
                }
            }
        }
        count
    }
}

impl Default for MarkerExtractor {
    fn default() -> Self {
        Self::new(
            ColorProfile::default(),
            GeoBounds::default(),
            ScanTunables::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::extraction::geo::GeoPoint;
    use crate::pipeline::types::MarkerReport;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
    const RED: Rgb<u8> = Rgb([12, 88, 191]);
    const GREEN: Rgb<u8> = Rgb([16, 140, 0]);
    const GRAY: Rgb<u8> = Rgb([195, 195, 195]);

    fn blank(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_pixel(width, height, BACKGROUND)
    }

    fn paint_square(image: &mut RgbImage, x: u32, y: u32, size: u32, color: Rgb<u8>) {
        for py in y..y + size {
            for px in x..x + size {
                image.put_pixel(px, py, color);
            }
        }
    }

    fn raster(image: RgbImage) -> RasterImage {
        RasterImage::new(image).unwrap()
    }

    #[test]
    fn no_matching_pixels_yields_nothing() {
        let extractor = MarkerExtractor::default();
        assert!(extractor.extract(&raster(blank(200, 200))).is_empty());
    }

    #[test]
    fn single_cluster_yields_one_marker() {
        let mut image = blank(200, 200);
        paint_square(&mut image, 50, 50, 12, RED);

        let markers = MarkerExtractor::default().extract(&raster(image));
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].color, "red");
        assert_eq!((markers[0].x, markers[0].y), (50, 50));
    }

    #[test]
    fn isolated_pixel_is_noise() {
        let mut image = blank(200, 200);
        image.put_pixel(50, 50, RED);
        paint_square(&mut image, 100, 100, 2, GREEN);

        assert!(MarkerExtractor::default().extract(&raster(image)).is_empty());
    }

    // One sampled pixel at (50, 50) plus `extra` pixels on row 51, none of
    // which fall on the stride grid.
    fn sparse_cluster(extra: u32) -> RgbImage {
        let mut image = blank(100, 100);
        image.put_pixel(50, 50, RED);
        for x in 46..46 + extra {
            image.put_pixel(x, 51, RED);
        }
        image
    }

    #[test]
    fn cluster_threshold_is_inclusive() {
        let extractor = MarkerExtractor::default();

        let markers = extractor.extract(&raster(sparse_cluster(9)));
        assert_eq!(markers.len(), 1);
        assert_eq!((markers[0].x, markers[0].y), (50, 50));

        assert!(extractor.extract(&raster(sparse_cluster(8))).is_empty());
    }

    #[test]
    fn markers_exactly_min_distance_apart_are_both_kept() {
        let mut image = blank(200, 200);
        paint_square(&mut image, 20, 20, 12, RED);
        paint_square(&mut image, 70, 20, 12, RED);

        let markers = MarkerExtractor::default().extract(&raster(image));
        let positions: Vec<_> = markers.iter().map(|m| (m.x, m.y)).collect();
        assert_eq!(positions, [(20, 20), (70, 20)]);
        assert_eq!(markers[0].distance_sq(70, 20), 2500);
    }

    #[test]
    fn near_clusters_keep_only_the_first() {
        let mut image = blank(200, 200);
        paint_square(&mut image, 50, 50, 12, RED);
        paint_square(&mut image, 80, 50, 12, GRAY);

        let markers = MarkerExtractor::default().extract(&raster(image));
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].color, "red");
        assert_eq!((markers[0].x, markers[0].y), (50, 50));
    }

    #[test]
    fn distant_clusters_of_different_colors_are_both_kept() {
        let mut image = blank(200, 200);
        paint_square(&mut image, 20, 20, 12, RED);
        paint_square(&mut image, 120, 120, 12, GREEN);

        let markers = MarkerExtractor::default().extract(&raster(image));
        let colors: Vec<_> = markers.iter().map(|m| m.color.as_str()).collect();
        assert_eq!(colors, ["red", "green"]);
    }

    #[test]
    fn markers_come_out_in_row_major_order() {
        let mut image = blank(300, 300);
        paint_square(&mut image, 200, 20, 12, GREEN);
        paint_square(&mut image, 20, 200, 12, RED);
        paint_square(&mut image, 20, 20, 12, GRAY);

        let markers = MarkerExtractor::default().extract(&raster(image));
        let colors: Vec<_> = markers.iter().map(|m| m.color.as_str()).collect();
        assert_eq!(colors, ["gray", "green", "red"]);
    }

    #[test]
    fn first_profile_entry_wins_on_overlap() {
        let profile = ColorProfile::new(vec![
            ColorTarget::new("wide", [12, 88, 191], 60),
            ColorTarget::new("red", [12, 88, 191], 20),
        ]);
        let extractor =
            MarkerExtractor::new(profile, GeoBounds::default(), ScanTunables::default());

        let mut image = blank(100, 100);
        paint_square(&mut image, 40, 40, 12, RED);

        let markers = extractor.extract(&raster(image));
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].color, "wide");
    }

    #[test]
    fn later_entry_is_tried_when_first_cluster_is_too_small() {
        // The pixel matches both entries but only the second has enough support.
        let profile = ColorProfile::new(vec![
            ColorTarget::new("exact", [12, 88, 191], 1),
            ColorTarget::new("loose", [12, 88, 191], 30),
        ]);
        let extractor =
            MarkerExtractor::new(profile, GeoBounds::default(), ScanTunables::default());

        let mut image = blank(100, 100);
        paint_square(&mut image, 40, 40, 12, Rgb([20, 95, 200]));
        image.put_pixel(40, 40, RED);

        let markers = extractor.extract(&raster(image));
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].color, "loose");
    }

    #[test]
    fn neighborhood_is_suppressed_after_acceptance() {
        // With distance suppression off, only the verified mask keeps the
        // samples at x = 52 and x = 54 from becoming extra markers.
        let tunables = ScanTunables {
            stride: 2,
            min_distance_sq: 0,
            ..ScanTunables::default()
        };
        let extractor =
            MarkerExtractor::new(ColorProfile::default(), GeoBounds::default(), tunables);

        let mut image = blank(100, 100);
        paint_square(&mut image, 50, 50, 6, RED);

        let markers = extractor.extract(&raster(image));
        assert_eq!(markers.len(), 1);
    }

    #[test]
    fn coordinates_follow_bounds() {
        let bounds = GeoBounds::new(GeoPoint::new(38.7, 124.5), GeoPoint::new(33.0, 131.0));
        let tunables = ScanTunables {
            stride: 1,
            ..ScanTunables::default()
        };
        let extractor = MarkerExtractor::new(ColorProfile::default(), bounds, tunables);

        let mut image = blank(100, 100);
        paint_square(&mut image, 0, 0, 6, RED);
        paint_square(&mut image, 94, 94, 6, RED);

        let markers = extractor.extract(&raster(image));
        assert_eq!(markers.len(), 2);
        assert!((markers[0].lat - 38.7).abs() < 1e-9);
        assert!((markers[0].lon - 124.5).abs() < 1e-9);
        assert_eq!((markers[1].x, markers[1].y), (94, 94));
        assert!((markers[1].lat - 33.342).abs() < 1e-9);
        assert!((markers[1].lon - 130.61).abs() < 1e-9);
    }

    #[test]
    fn identical_input_gives_identical_report() {
        let mut image = blank(250, 250);
        paint_square(&mut image, 30, 30, 12, RED);
        paint_square(&mut image, 150, 60, 12, GREEN);
        paint_square(&mut image, 90, 200, 12, GRAY);

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let extractor = MarkerExtractor::default();
        let first = MarkerReport::from_candidates(&extractor.extract_png(&bytes).unwrap());
        let second = MarkerReport::from_candidates(&extractor.extract_png(&bytes).unwrap());

        assert_eq!(first.len(), 3);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn undecodable_bytes_are_not_an_empty_result() {
        let err = MarkerExtractor::default()
            .extract_png(&[0x89, b'P', b'N', b'G'])
            .unwrap_err();
        assert!(matches!(err, ExtractError::Decode(_)));
    }
}
