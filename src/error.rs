//! Error types for the bilateral-smoothing crate.

/// Errors that can occur while building rasters, filtering, or processing files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A filter parameter is zero, negative, or not finite.
    #[error("invalid parameter {name} = {value}: must be a positive finite number")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// The raster has no pixels.
    #[error("invalid raster dimensions {width}x{height}")]
    InvalidDimensions {
        /// Raster width in pixels.
        width: u32,
        /// Raster height in pixels.
        height: u32,
    },

    /// The sample buffer length does not match `width * height * 4`.
    #[error("sample buffer length {actual} out of range, expected {expected}")]
    OutOfRange {
        /// Expected number of samples.
        expected: usize,
        /// Actual number of samples.
        actual: usize,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("tiff".to_string());
        assert!(unsupported.to_string().contains("tiff"));

        let param = Error::InvalidParameter {
            name: "sigma_color",
            value: 0.0,
        };
        assert!(param.to_string().contains("sigma_color = 0"));

        let dims = Error::InvalidDimensions {
            width: 0,
            height: 20,
        };
        assert!(dims.to_string().contains("0x20"));

        let range = Error::OutOfRange {
            expected: 16,
            actual: 12,
        };
        let msg = range.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("16"));
    }
}
