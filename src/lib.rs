//! Edge-preserving bilateral smoothing of small RGBA rasters.
//!
//! Each output pixel is a weighted average over a fixed 7x7 window, weighted
//! by both spatial distance and grey-level similarity, so flat regions are
//! smoothed while edges survive. Alpha passes through unchanged.
//!
//! # Quick Start
//!
//! ```no_run
//! use bilateral_smoothing::{bilateral_filter, RasterImage};
//!
//! let img = image::open("photo.jpg").unwrap();
//! let raster = RasterImage::from_dynamic(&img).unwrap();
//! let smoothed = bilateral_filter(&raster, 25.0, 10.0).unwrap();
//! smoothed.to_rgba8().save("smoothed.png").unwrap();
//! ```
//!
//! # Classification pipeline
//!
//! [`Pipeline`] resizes a decoded image to a 128x128 raster, smooths a copy
//! of it, and hands the unfiltered raster to an injected [`Classifier`].
//!
//! ```no_run
//! use bilateral_smoothing::{Classifier, FilterParams, Pipeline, RasterImage};
//!
//! struct Brightest;
//!
//! impl Classifier for Brightest {
//!     fn classify(&self, image: &RasterImage) -> usize {
//!         let px = image.pixel(0, 0);
//!         usize::from(px[0].max(px[1]).max(px[2]))
//!     }
//! }
//!
//! let pipeline = Pipeline::new(Brightest);
//! let img = image::open("photo.jpg").unwrap();
//! let out = pipeline.run(&img, FilterParams::default()).unwrap();
//! println!("class {}", out.class_index);
//!
//! // Sigmas changed: filter the same prepared raster again.
//! let params = FilterParams::new(10.0, 3.0).unwrap();
//! let refreshed = pipeline.recompute(&out.prepared, params).unwrap();
//! # let _ = refreshed;
//! ```

#![deny(missing_docs)]

mod engine;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod raster;

pub use engine::{
    default_output_path, is_supported_image, process_directory, process_file, save_image,
    ProcessOptions, ProcessResult,
};
pub use error::{Error, Result};
pub use filter::{bilateral_filter, BilateralFilter, FilterParams, Neighbor, DIAMETER, RADIUS};
pub use pipeline::{Classifier, Pipeline, PipelineOutput, DEFAULT_SIZE};
pub use raster::RasterImage;
