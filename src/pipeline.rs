//! Resize, smooth and classify a decoded image.
//!
//! A decoded image is first resized to a small square raster. That prepared
//! raster feeds two independent branches: the bilateral filter, and an
//! injected [`Classifier`] that sees the unfiltered pixels.

use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::{Error, Result};
use crate::filter::{BilateralFilter, FilterParams};
use crate::raster::RasterImage;

/// Side length of the prepared square raster.
pub const DEFAULT_SIZE: u32 = 128;

/// An opaque image classification model.
pub trait Classifier {
    /// Return the index of the most likely class.
    fn classify(&self, image: &RasterImage) -> usize;

    /// Input size the model expects, if it needs a fixed one.
    ///
    /// The pipeline resizes with nearest-neighbor sampling before calling
    /// [`Classifier::classify`].
    fn input_size(&self) -> Option<(u32, u32)> {
        None
    }
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn classify(&self, image: &RasterImage) -> usize {
        (**self).classify(image)
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        (**self).input_size()
    }
}

/// Everything produced for one input image.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// The resized, unfiltered raster.
    pub prepared: RasterImage,
    /// The bilateral-filtered copy of `prepared`.
    pub filtered: RasterImage,
    /// Class index the classifier assigned to `prepared`.
    pub class_index: usize,
}

/// Resize, filter and classify pipeline around an injected classifier.
#[derive(Debug, Clone)]
pub struct Pipeline<C> {
    classifier: C,
    size: u32,
}

impl<C: Classifier> Pipeline<C> {
    /// Create a pipeline preparing [`DEFAULT_SIZE`] square rasters.
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            size: DEFAULT_SIZE,
        }
    }

    /// Use a different side length for prepared rasters.
    #[must_use]
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Side length of prepared rasters.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Resize a decoded image to the prepared square raster.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidDimensions`] if the image or the
    /// configured size is empty.
    pub fn prepare(&self, image: &DynamicImage) -> Result<RasterImage> {
        if self.size == 0 || image.width() == 0 || image.height() == 0 {
            return Err(Error::InvalidDimensions {
                width: image.width().min(self.size),
                height: image.height().min(self.size),
            });
        }
        let resized = image.resize_exact(self.size, self.size, FilterType::Triangle);
        RasterImage::from_dynamic(&resized)
    }

    /// Filter a prepared raster with new parameters.
    ///
    /// Hosts call this whenever the sigmas change; the prepared raster is
    /// never modified, so repeated calls always start from the same pixels.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidParameter`] if either sigma is invalid.
    pub fn recompute(&self, prepared: &RasterImage, params: FilterParams) -> Result<RasterImage> {
        Ok(BilateralFilter::from_params(params)?.apply(prepared))
    }

    /// Classify a prepared raster.
    #[must_use]
    pub fn classify(&self, prepared: &RasterImage) -> usize {
        match self.classifier.input_size() {
            Some((w, h)) if (w, h) != prepared.dimensions() && w > 0 && h > 0 => {
                let resized = image::imageops::resize(
                    &prepared.to_rgba8(),
                    w,
                    h,
                    FilterType::Nearest,
                );
                match RasterImage::from_rgba8(resized) {
                    Ok(input) => self.classifier.classify(&input),
                    Err(_) => self.classifier.classify(prepared),
                }
            }
            _ => self.classifier.classify(prepared),
        }
    }

    /// Run both branches for one decoded image.
    ///
    /// Parameters are validated before any resizing happens.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidParameter`] for bad sigmas, or
    /// [`crate::Error::InvalidDimensions`] for an empty image.
    pub fn run(&self, image: &DynamicImage, params: FilterParams) -> Result<PipelineOutput> {
        let filter = BilateralFilter::from_params(params)?;
        let prepared = self.prepare(image)?;
        let filtered = filter.apply(&prepared);
        let class_index = self.classify(&prepared);
        log::debug!(
            "pipeline: {}x{} -> {}x{}, class {class_index}",
            image.width(),
            image.height(),
            prepared.width(),
            prepared.height(),
        );
        Ok(PipelineOutput {
            prepared,
            filtered,
            class_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records what it was asked to classify; answers with the top-left red sample.
    struct Recorder {
        input_size: Option<(u32, u32)>,
        seen: RefCell<Vec<(u32, u32)>>,
    }

    impl Recorder {
        fn new(input_size: Option<(u32, u32)>) -> Self {
            Self {
                input_size,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Classifier for Recorder {
        fn classify(&self, image: &RasterImage) -> usize {
            self.seen.borrow_mut().push(image.dimensions());
            usize::from(image.pixel(0, 0)[0])
        }

        fn input_size(&self) -> Option<(u32, u32)> {
            self.input_size
        }
    }

    fn checker(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_fn(width, height, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                image::Rgb([220, 30, 30])
            } else {
                image::Rgb([20, 20, 20])
            }
        }))
    }

    #[test]
    fn prepare_resizes_to_square() {
        let pipeline = Pipeline::new(Recorder::new(None));
        let prepared = pipeline.prepare(&checker(300, 200)).unwrap();
        assert_eq!(prepared.dimensions(), (DEFAULT_SIZE, DEFAULT_SIZE));
        assert_eq!(prepared.pixel(0, 0)[3], 255);
    }

    #[test]
    fn with_size_overrides_default() {
        let pipeline = Pipeline::new(Recorder::new(None)).with_size(32);
        assert_eq!(pipeline.size(), 32);
        let prepared = pipeline.prepare(&checker(64, 64)).unwrap();
        assert_eq!(prepared.dimensions(), (32, 32));
    }

    #[test]
    fn classifier_sees_its_input_size() {
        let recorder = Recorder::new(Some((224, 224)));
        let pipeline = Pipeline::new(&recorder);
        let output = pipeline
            .run(&checker(128, 128), FilterParams::default())
            .unwrap();
        assert_eq!(recorder.seen.borrow().as_slice(), &[(224, 224)]);
        assert_eq!(output.prepared.dimensions(), (128, 128));
        assert_eq!(output.filtered.dimensions(), (128, 128));
    }

    #[test]
    fn classifier_sees_unfiltered_pixels() {
        let recorder = Recorder::new(None);
        let pipeline = Pipeline::new(&recorder).with_size(16);
        let output = pipeline
            .run(&checker(16, 16), FilterParams::new(50.0, 10.0).unwrap())
            .unwrap();
        assert_eq!(output.class_index, usize::from(output.prepared.pixel(0, 0)[0]));
        assert_eq!(recorder.seen.borrow().as_slice(), &[(16, 16)]);
    }

    #[test]
    fn recompute_starts_from_prepared_pixels() {
        let pipeline = Pipeline::new(Recorder::new(None)).with_size(24);
        let prepared = pipeline.prepare(&checker(24, 24)).unwrap();
        let snapshot = prepared.clone();

        let soft = FilterParams::new(40.0, 5.0).unwrap();
        let first = pipeline.recompute(&prepared, soft).unwrap();
        let _ = pipeline
            .recompute(&prepared, FilterParams::new(2.0, 1.0).unwrap())
            .unwrap();
        let again = pipeline.recompute(&prepared, soft).unwrap();

        assert_eq!(prepared, snapshot);
        assert_eq!(first, again);
    }

    #[test]
    fn run_rejects_bad_params_before_classifying() {
        let recorder = Recorder::new(None);
        let pipeline = Pipeline::new(&recorder);
        let params = FilterParams {
            sigma_color: 0.0,
            sigma_space: 5.0,
        };
        let err = pipeline.run(&checker(16, 16), params).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn prepare_rejects_zero_size() {
        let pipeline = Pipeline::new(Recorder::new(None)).with_size(0);
        assert!(matches!(
            pipeline.prepare(&checker(8, 8)),
            Err(Error::InvalidDimensions { .. })
        ));
    }
}
