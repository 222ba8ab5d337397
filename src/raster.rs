//! Validated RGBA raster buffers.
//!
//! A [`RasterImage`] is the only pixel format the filter consumes and produces:
//! interleaved 8-bit `R, G, B, A` samples, row-major, 4 bytes per pixel.

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::error::{Error, Result};

/// Number of interleaved samples per pixel.
pub const CHANNELS: usize = 4;

/// An RGBA raster with a buffer length guaranteed to match its dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

impl RasterImage {
    /// Wrap an interleaved RGBA sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero, or
    /// [`Error::OutOfRange`] if `samples.len() != width * height * 4`.
    pub fn from_raw(width: u32, height: u32, samples: Vec<u8>) -> Result<Self> {
        let expected = expected_len(width, height)?;
        if samples.len() != expected {
            return Err(Error::OutOfRange {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Build a raster where every pixel has the same RGBA value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self> {
        let len = expected_len(width, height)?;
        let samples = rgba.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Convert an `image` RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for an empty image.
    pub fn from_rgba8(img: RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::from_raw(width, height, img.into_raw())
    }

    /// Convert an `image` RGB buffer, promoting every pixel to opaque.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for an empty image.
    pub fn from_rgb8(img: &RgbImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        let mut samples = Vec::with_capacity(expected_len(width, height)?);
        for px in img.pixels() {
            samples.extend_from_slice(&[px[0], px[1], px[2], u8::MAX]);
        }
        Self::from_raw(width, height, samples)
    }

    /// Convert any decoded image to RGBA.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for an empty image.
    pub fn from_dynamic(img: &DynamicImage) -> Result<Self> {
        Self::from_rgba8(img.to_rgba8())
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Interleaved RGBA samples, row-major.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.samples
    }

    /// Consume the raster and return its sample buffer.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.samples
    }

    /// RGBA value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the raster.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} raster",
            self.width,
            self.height
        );
        let idx = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [
            self.samples[idx],
            self.samples[idx + 1],
            self.samples[idx + 2],
            self.samples[idx + 3],
        ]
    }

    /// Bytes per row.
    pub(crate) fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// A raster with these dimensions and a replacement sample buffer.
    pub(crate) fn with_samples(&self, samples: Vec<u8>) -> Self {
        debug_assert_eq!(samples.len(), self.samples.len());
        Self {
            width: self.width,
            height: self.height,
            samples,
        }
    }

    /// Convert back to an `image` RGBA buffer.
    #[must_use]
    pub fn to_rgba8(&self) -> RgbaImage {
        // Length was validated at construction.
        RgbaImage::from_fn(self.width, self.height, |x, y| image::Rgba(self.pixel(x, y)))
    }

    /// Convert to an `image` RGB buffer, discarding alpha.
    #[must_use]
    pub fn to_rgb8(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let [r, g, b, _] = self.pixel(x, y);
            image::Rgb([r, g, b])
        })
    }
}

fn expected_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    Ok(width as usize * height as usize * CHANNELS)
}
