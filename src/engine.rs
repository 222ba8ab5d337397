//! File and directory processing around the bilateral filter.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};
use crate::filter::{BilateralFilter, FilterParams};
use crate::pipeline::DEFAULT_SIZE;
use crate::raster::RasterImage;

/// Options controlling file processing.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Filter sigmas.
    pub params: FilterParams,
    /// Resize to a `size x size` square before filtering; `None` keeps the
    /// original dimensions.
    pub size: Option<u32>,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            params: FilterParams::default(),
            size: Some(DEFAULT_SIZE),
            verbose: false,
            quiet: false,
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Dimensions of the filtered output, when one was produced.
    pub dimensions: Option<(u32, u32)>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn failed(path: &Path, message: String) -> Self {
        log::warn!("{}: {message}", path.display());
        Self {
            path: path.to_path_buf(),
            success: false,
            dimensions: None,
            message,
        }
    }
}

/// Load, optionally resize, filter and save one image file.
///
/// Never panics on bad input; failures are reported in the returned
/// [`ProcessResult`].
#[must_use]
pub fn process_file(input: &Path, output: &Path, opts: &ProcessOptions) -> ProcessResult {
    let filter = match BilateralFilter::from_params(opts.params) {
        Ok(f) => f,
        Err(e) => return ProcessResult::failed(input, e.to_string()),
    };
    process_with(&filter, input, output, opts)
}

fn process_with(
    filter: &BilateralFilter,
    input: &Path,
    output: &Path,
    opts: &ProcessOptions,
) -> ProcessResult {
    let dyn_img = match image::open(input) {
        Ok(img) => img,
        Err(e) => return ProcessResult::failed(input, format!("Failed to load: {e}")),
    };

    let raster = match load_raster(&dyn_img, opts.size) {
        Ok(r) => r,
        Err(e) => return ProcessResult::failed(input, e.to_string()),
    };
    log::debug!(
        "{}: {}x{} -> {}x{}",
        input.display(),
        dyn_img.width(),
        dyn_img.height(),
        raster.width(),
        raster.height()
    );

    let filtered = filter.apply(&raster);

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                return ProcessResult::failed(
                    input,
                    format!("Failed to create output directory: {e}"),
                );
            }
        }
    }

    match save_image(&filtered, output) {
        Ok(()) => ProcessResult {
            path: input.to_path_buf(),
            success: true,
            dimensions: Some(filtered.dimensions()),
            message: format!("Filtered to {}", output.display()),
        },
        Err(e) => ProcessResult::failed(input, format!("Failed to save: {e}")),
    }
}

/// Process all supported images in a directory.
///
/// Uses parallel iteration when the `parallel` feature is enabled (via rayon).
/// Returns a [`ProcessResult`] for each image found, or a single failed result
/// if the directories cannot be read or created.
#[must_use]
pub fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    opts: &ProcessOptions,
) -> Vec<ProcessResult> {
    let filter = match BilateralFilter::from_params(opts.params) {
        Ok(f) => f,
        Err(e) => return vec![ProcessResult::failed(input_dir, e.to_string())],
    };

    let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
        Ok(rd) => rd
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect(),
        Err(e) => {
            return vec![ProcessResult::failed(
                input_dir,
                format!("Failed to read directory: {e}"),
            )];
        }
    };

    if !output_dir.exists() {
        if let Err(e) = std::fs::create_dir_all(output_dir) {
            return vec![ProcessResult::failed(
                output_dir,
                format!("Failed to create output directory: {e}"),
            )];
        }
    }

    log::debug!(
        "{} image(s) in {} -> {}",
        entries.len(),
        input_dir.display(),
        output_dir.display()
    );

    let run = |input_path: &PathBuf| match input_path.file_name() {
        Some(name) => process_with(&filter, input_path, &output_dir.join(name), opts),
        None => ProcessResult::failed(input_path, "Path has no file name".to_string()),
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        entries.par_iter().map(run).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        entries.iter().map(run).collect()
    }
}

/// Decode-side conversion: RGBA, optionally resized to a square.
fn load_raster(img: &DynamicImage, size: Option<u32>) -> Result<RasterImage> {
    match size {
        Some(0) => Err(Error::InvalidDimensions {
            width: 0,
            height: 0,
        }),
        Some(side) if (side, side) != (img.width(), img.height()) => {
            RasterImage::from_dynamic(&img.resize_exact(side, side, FilterType::Triangle))
        }
        _ => RasterImage::from_dynamic(img),
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save a raster with format-specific settings.
///
/// JPEG output drops alpha and uses quality 100.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RasterImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&DynamicImage::ImageRgb8(img.to_rgb8()))?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            DynamicImage::ImageRgba8(img.to_rgba8()).save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_bilateral.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_bilateral.{ext}"))
}
