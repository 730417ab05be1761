// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binarizer — grayscale, adaptive local-mean threshold, median denoise.

use image::{GrayImage, Luma};
use imageproc::filter::median_filter;
use scanlink_core::error::{Result, ScanlinkError};
use tracing::{debug, instrument};

use crate::raster::Raster;

/// Radius of the local-mean window (a 31×31 block).
pub const BLOCK_RADIUS: u32 = 15;

/// Constant subtracted from the local mean.
pub const OFFSET: i32 = 9;

/// Side of the square median-filter neighbourhood.
pub const MEDIAN_SIZE: u32 = 5;

/// Fixed three-step binarization pipeline.
///
/// 1. Convert to single-channel intensity
/// 2. Adaptive threshold: a pixel is black if it is darker than the mean of
///    its `block_radius` neighbourhood minus `offset`, white otherwise
/// 3. Median filter over a `median_size` × `median_size` window
///
/// The output is always a `Binary` raster of the input's dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binarizer {
    block_radius: u32,
    offset: i32,
    median_size: u32,
}

impl Default for Binarizer {
    fn default() -> Self {
        Self {
            block_radius: BLOCK_RADIUS,
            offset: OFFSET,
            median_size: MEDIAN_SIZE,
        }
    }
}

impl Binarizer {
    /// Build a binarizer with custom parameters. `median_size` must be odd.
    pub fn new(block_radius: u32, offset: i32, median_size: u32) -> Result<Self> {
        if median_size % 2 == 0 {
            return Err(ScanlinkError::PreprocessingFailed(format!(
                "median size must be odd, got {median_size}"
            )));
        }
        Ok(Self {
            block_radius,
            offset,
            median_size,
        })
    }

    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    pub fn binarize(&self, raster: &Raster) -> Result<Raster> {
        raster.ensure_not_empty("binarize")?;

        let gray = raster.to_gray()?;
        let thresholded = adaptive_threshold(&gray, self.block_radius, self.offset);

        let radius = self.median_size / 2;
        let denoised = median_filter(&thresholded, radius, radius);

        debug!(
            block_radius = self.block_radius,
            offset = self.offset,
            median_size = self.median_size,
            "Binarization complete"
        );
        Ok(Raster::binary_unchecked(denoised))
    }
}

/// Binarize with the default parameters.
pub fn binarize(raster: &Raster) -> Result<Raster> {
    Binarizer::default().binarize(raster)
}

/// Local-mean adaptive threshold producing values in {0, 255}.
///
/// A pixel is 0 when it is darker than the mean of its clipped
/// `(2 * block_radius + 1)`² window minus `offset`.
pub fn adaptive_threshold(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }

    let sums = SummedArea::new(gray);
    let radius = block_radius as usize;
    GrayImage::from_fn(width, height, |x, y| {
        let mean = sums.window_mean(x as usize, y as usize, radius);
        let cut = (mean as i32 - offset).clamp(0, 255);
        if i32::from(gray.get_pixel(x, y).0[0]) < cut {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

/// Summed-area table with a zero first row and column, so
/// `at(x, y)` is the sum of every pixel above and left of `(x, y)`.
struct SummedArea {
    width: usize,
    height: usize,
    table: Vec<u64>,
}

impl SummedArea {
    fn new(gray: &GrayImage) -> Self {
        let (width, height) = (gray.width() as usize, gray.height() as usize);
        let stride = width + 1;
        let mut table = vec![0u64; stride * (height + 1)];

        for (y, row) in gray.as_raw().chunks_exact(width).enumerate() {
            let mut running = 0u64;
            for (x, &value) in row.iter().enumerate() {
                running += u64::from(value);
                table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + running;
            }
        }

        Self {
            width,
            height,
            table,
        }
    }

    fn at(&self, x: usize, y: usize) -> u64 {
        self.table[y * (self.width + 1) + x]
    }

    /// Mean of the square of `radius` around `(x, y)`, clipped to the image.
    /// `(x, y)` must lie inside the image.
    fn window_mean(&self, x: usize, y: usize, radius: usize) -> f64 {
        let (left, top) = (x.saturating_sub(radius), y.saturating_sub(radius));
        let right = (x + radius + 1).min(self.width);
        let bottom = (y + radius + 1).min(self.height);

        let sum = self.at(right, bottom) + self.at(left, top)
            - self.at(right, top)
            - self.at(left, bottom);
        let area = (right - left) * (bottom - top);
        sum as f64 / area as f64
    }
}
