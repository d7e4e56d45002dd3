use image::RgbImage;

use crate::error::ExtractError;

/// Decoded RGB raster for one extraction pass. Never zero-sized.
#[derive(Debug, Clone)]
pub struct RasterImage {
    rgb: RgbImage,
}

impl RasterImage {
    pub fn new(rgb: RgbImage) -> Result<Self, ExtractError> {
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(ExtractError::EmptyImage(width, height));
        }
        Ok(Self { rgb })
    }

    /// Decodes PNG (or any format the `image` crate recognises) and drops alpha.
    pub fn decode(bytes: &[u8]) -> Result<Self, ExtractError> {
        let image = image::load_from_memory(bytes)?;
        Self::new(image.to_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgb.dimensions()
    }

    /// Caller guarantees `(x, y)` is in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.rgb.get_pixel(x, y).0
    }
}
