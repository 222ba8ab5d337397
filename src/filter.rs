//! Bilateral filtering (edge-preserving smoothing).
//!
//! Every output pixel is a weighted average of the pixels in a 7x7 window
//! centred on it. Each neighbor's weight is the product of:
//! - a spatial Gaussian of its distance from the centre:
//!   `exp(-(dx² + dy²) / (2 * sigma_space²))`
//! - a range Gaussian of the difference in grey level:
//!   `exp(-(gray0 - grayN)² / (2 * sigma_color²))`, where grey is the plain
//!   `(r + g + b) / 3` average.
//!
//! Neighbors outside the raster are skipped, so the window shrinks at the
//! borders. Alpha is copied through untouched.

use crate::error::{Error, Result};
use crate::raster::{RasterImage, CHANNELS};

/// Window radius in pixels.
pub const RADIUS: usize = 3;

/// Window side length in pixels.
pub const DIAMETER: usize = 2 * RADIUS + 1;

/// Largest possible difference between two `r + g + b` sums.
const MAX_SUM_DIFF: usize = 3 * u8::MAX as usize;

/// The two Gaussian widths of the filter.
///
/// Fields are named so the colour and spatial sigmas cannot be swapped by
/// argument order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Standard deviation of the grey-level difference weight.
    pub sigma_color: f64,
    /// Standard deviation of the spatial distance weight, in pixels.
    pub sigma_space: f64,
}

impl FilterParams {
    /// Validated parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if either sigma is not a positive
    /// finite number.
    pub fn new(sigma_color: f64, sigma_space: f64) -> Result<Self> {
        let params = Self {
            sigma_color,
            sigma_space,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check both sigmas.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] naming the first bad sigma.
    pub fn validate(&self) -> Result<()> {
        check_sigma("sigma_color", self.sigma_color)?;
        check_sigma("sigma_space", self.sigma_space)?;
        Ok(())
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            sigma_color: 25.0,
            sigma_space: 25.0,
        }
    }
}

fn check_sigma(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}

/// One contributing cell of a pixel's window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Horizontal offset from the centre pixel.
    pub dx: i32,
    /// Vertical offset from the centre pixel.
    pub dy: i32,
    /// Combined spatial and colour weight.
    pub weight: f64,
}

/// A bilateral filter with its weight tables precomputed.
///
/// Build once with [`BilateralFilter::new`] and reuse across rasters.
#[derive(Debug, Clone)]
pub struct BilateralFilter {
    params: FilterParams,
    /// Spatial weights indexed by `ky * DIAMETER + kx`.
    spatial: [f64; DIAMETER * DIAMETER],
    /// Colour weights indexed by `|sum0 - sumN|` where `sum = r + g + b`.
    range: Vec<f64>,
}

impl BilateralFilter {
    /// Create a filter for the given sigmas.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if either sigma is not a positive
    /// finite number.
    pub fn new(sigma_color: f64, sigma_space: f64) -> Result<Self> {
        Self::from_params(FilterParams::new(sigma_color, sigma_space)?)
    }

    /// Create a filter from a parameter pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if either sigma is not a positive
    /// finite number.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_params(params: FilterParams) -> Result<Self> {
        params.validate()?;

        let space_denom = 2.0 * params.sigma_space * params.sigma_space;
        let spatial = std::array::from_fn(|i| {
            let dy = (i / DIAMETER) as f64 - RADIUS as f64;
            let dx = (i % DIAMETER) as f64 - RADIUS as f64;
            gaussian(dx * dx + dy * dy, space_denom)
        });

        // Grey levels are sums divided by 3, so a sum difference `d` is a grey
        // difference of `d / 3`.
        let color_denom = 2.0 * params.sigma_color * params.sigma_color;
        let range = (0..=MAX_SUM_DIFF)
            .map(|d| {
                let diff = d as f64 / 3.0;
                gaussian(diff * diff, color_denom)
            })
            .collect();

        Ok(Self {
            params,
            spatial,
            range,
        })
    }

    /// The sigmas this filter was built with.
    #[must_use]
    pub fn params(&self) -> FilterParams {
        self.params
    }

    /// Filter a raster, returning a new one of the same size.
    ///
    /// The input is only read; all neighbor reads see the unfiltered values.
    /// With the `parallel` feature rows are computed on the rayon pool.
    #[must_use = "the function does not modify the original raster"]
    pub fn apply(&self, image: &RasterImage) -> RasterImage {
        log::debug!(
            "bilateral pass over {}x{} raster (sigma_color={}, sigma_space={})",
            image.width(),
            image.height(),
            self.params.sigma_color,
            self.params.sigma_space,
        );

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            // Output starts as a copy so alpha is already in place.
            let mut out = image.as_raw().to_vec();
            out.par_chunks_mut(image.stride())
                .enumerate()
                .for_each(|(y, row)| self.filter_row(image, y, row));
            image.with_samples(out)
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.apply_sequential(image)
        }
    }

    /// Filter a raster on the calling thread only.
    #[must_use = "the function does not modify the original raster"]
    pub fn apply_sequential(&self, image: &RasterImage) -> RasterImage {
        let mut out = image.as_raw().to_vec();
        for (y, row) in out.chunks_mut(image.stride()).enumerate() {
            self.filter_row(image, y, row);
        }
        image.with_samples(out)
    }

    /// The in-bounds cells of the window around `(x, y)` with their weights.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the raster.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn neighborhood(&self, image: &RasterImage, x: u32, y: u32) -> Vec<Neighbor> {
        assert!(
            x < image.width() && y < image.height(),
            "pixel ({x}, {y}) outside {}x{} raster",
            image.width(),
            image.height()
        );
        let mut cells = Vec::with_capacity(DIAMETER * DIAMETER);
        self.visit_window(image, x as usize, y as usize, |kx, ky, _, weight| {
            cells.push(Neighbor {
                dx: kx as i32 - RADIUS as i32,
                dy: ky as i32 - RADIUS as i32,
                weight,
            });
        });
        cells
    }

    fn filter_row(&self, image: &RasterImage, y: usize, row: &mut [u8]) {
        for (x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
            let [r, g, b] = self.filter_pixel(image, x, y);
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }

    fn filter_pixel(&self, image: &RasterImage, x: usize, y: usize) -> [u8; 3] {
        let (mut sum_r, mut sum_g, mut sum_b, mut wsum) = (0.0, 0.0, 0.0, 0.0);
        self.visit_window(image, x, y, |_, _, px, w| {
            sum_r += f64::from(px[0]) * w;
            sum_g += f64::from(px[1]) * w;
            sum_b += f64::from(px[2]) * w;
            wsum += w;
        });
        // The centre always contributes weight 1, so wsum >= 1.
        [
            to_sample(sum_r / wsum),
            to_sample(sum_g / wsum),
            to_sample(sum_b / wsum),
        ]
    }

    /// Call `visit(kx, ky, neighbor_rgba, weight)` for every in-bounds cell,
    /// where `(kx, ky)` is the position inside the 7x7 window.
    fn visit_window<F>(&self, image: &RasterImage, x: usize, y: usize, mut visit: F)
    where
        F: FnMut(usize, usize, &[u8], f64),
    {
        let samples = image.as_raw();
        let stride = image.stride();
        let (w, h) = (image.width() as usize, image.height() as usize);

        let sum0 = channel_sum(&samples[y * stride + x * CHANNELS..]);

        let x_lo = x.saturating_sub(RADIUS);
        let x_hi = (x + RADIUS).min(w - 1);
        let y_lo = y.saturating_sub(RADIUS);
        let y_hi = (y + RADIUS).min(h - 1);

        for ny in y_lo..=y_hi {
            let ky = ny + RADIUS - y;
            let row = &samples[ny * stride..(ny + 1) * stride];
            for nx in x_lo..=x_hi {
                let kx = nx + RADIUS - x;
                let px = &row[nx * CHANNELS..(nx + 1) * CHANNELS];
                let weight =
                    self.spatial[ky * DIAMETER + kx] * self.range[sum0.abs_diff(channel_sum(px))];
                visit(kx, ky, px, weight);
            }
        }
    }
}

/// Bilateral-filter `image` with a 7x7 window.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if either sigma is not a positive
/// finite number. Nothing is allocated in that case.
///
/// # Examples
///
/// ```
/// use bilateral_smoothing::{bilateral_filter, RasterImage};
///
/// let image = RasterImage::filled(3, 3, [100, 100, 100, 255]).unwrap();
/// let filtered = bilateral_filter(&image, 25.0, 25.0).unwrap();
/// assert_eq!(filtered, image);
/// ```
pub fn bilateral_filter(
    image: &RasterImage,
    sigma_color: f64,
    sigma_space: f64,
) -> Result<RasterImage> {
    Ok(BilateralFilter::new(sigma_color, sigma_space)?.apply(image))
}

/// Un-normalized Gaussian weight of a squared distance.
fn gaussian(distance_squared: f64, two_sigma_squared: f64) -> f64 {
    (-distance_squared / two_sigma_squared).exp()
}

fn channel_sum(px: &[u8]) -> usize {
    usize::from(px[0]) + usize::from(px[1]) + usize::from(px[2])
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_sample(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::cast_possible_truncation)]
    fn gradient(width: u32, height: u32) -> RasterImage {
        let mut samples = Vec::new();
        for y in 0..height {
            for x in 0..width {
                samples.extend_from_slice(&[
                    (x * 40) as u8,
                    (y * 30) as u8,
                    ((x + y) * 10) as u8,
                    (200 + x + y) as u8,
                ]);
            }
        }
        RasterImage::from_raw(width, height, samples).unwrap()
    }

    #[test]
    fn rejects_non_positive_sigmas() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                BilateralFilter::new(bad, 10.0),
                Err(Error::InvalidParameter {
                    name: "sigma_color",
                    ..
                })
            ));
            assert!(matches!(
                BilateralFilter::new(10.0, bad),
                Err(Error::InvalidParameter {
                    name: "sigma_space",
                    ..
                })
            ));
        }
    }

    #[test]
    fn spatial_table_is_symmetric_and_peaks_at_centre() {
        let filter = BilateralFilter::new(10.0, 2.0).unwrap();
        let centre = RADIUS * DIAMETER + RADIUS;
        assert!((filter.spatial[centre] - 1.0).abs() < f64::EPSILON);
        for ky in 0..DIAMETER {
            for kx in 0..DIAMETER {
                let w = filter.spatial[ky * DIAMETER + kx];
                let mirrored = filter.spatial[(DIAMETER - 1 - ky) * DIAMETER + kx];
                let transposed = filter.spatial[kx * DIAMETER + ky];
                assert!((w - mirrored).abs() < 1e-15);
                assert!((w - transposed).abs() < 1e-15);
                assert!(w <= 1.0);
            }
        }
        // Corner: dx = dy = 3, so exp(-18 / 8).
        let corner = filter.spatial[0];
        assert!((corner - (-18.0f64 / 8.0).exp()).abs() < 1e-12);
    }

    #[test]
    fn range_table_matches_grey_difference() {
        let filter = BilateralFilter::new(5.0, 3.0).unwrap();
        assert_eq!(filter.range.len(), MAX_SUM_DIFF + 1);
        assert!((filter.range[0] - 1.0).abs() < f64::EPSILON);
        // Sum difference 30 is a grey difference of 10.
        let expected = (-100.0f64 / 50.0).exp();
        assert!((filter.range[30] - expected).abs() < 1e-12);
    }

    #[test]
    fn centre_weight_is_one() {
        let image = gradient(9, 9);
        let filter = BilateralFilter::new(3.0, 2.0).unwrap();
        let cells = filter.neighborhood(&image, 4, 4);
        let centre = cells.iter().find(|n| n.dx == 0 && n.dy == 0).unwrap();
        assert!((centre.weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn interior_window_is_full() {
        let image = gradient(9, 9);
        let filter = BilateralFilter::new(3.0, 2.0).unwrap();
        assert_eq!(filter.neighborhood(&image, 4, 4).len(), DIAMETER * DIAMETER);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let image = gradient(13, 6);
        let filter = BilateralFilter::new(12.0, 4.0).unwrap();
        assert_eq!(filter.apply(&image), filter.apply_sequential(&image));
    }

    #[test]
    fn output_is_rounded_weighted_mean() {
        // Two pixels: grey 0 and grey 30, one step apart.
        let image =
            RasterImage::from_raw(2, 1, vec![0, 0, 0, 255, 30, 30, 30, 255]).unwrap();
        let filter = BilateralFilter::new(20.0, 1.0).unwrap();
        let w = (-0.5f64).exp() * (-900.0f64 / 800.0).exp();
        let left = (30.0 * w / (1.0 + w)).round();
        let right = (30.0 / (1.0 + w)).round();
        let out = filter.apply(&image);
        assert_eq!(f64::from(out.pixel(0, 0)[0]), left);
        assert_eq!(f64::from(out.pixel(1, 0)[0]), right);
    }

    #[test]
    fn to_sample_rounds_and_clamps() {
        assert_eq!(to_sample(12.4), 12);
        assert_eq!(to_sample(12.5), 13);
        assert_eq!(to_sample(-3.0), 0);
        assert_eq!(to_sample(300.0), 255);
    }

    #[test]
    fn default_params_are_valid() {
        assert!(FilterParams::default().validate().is_ok());
    }
}
