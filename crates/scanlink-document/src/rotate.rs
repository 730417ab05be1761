// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rotator — rotation about the image centre with a fixed output frame.

use image::{Luma, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use scanlink_core::error::{Result, ScanlinkError};
use scanlink_core::types::FillPolicy;
use tracing::{debug, instrument};

use crate::raster::{PixelFormat, Raster};

/// Angles (inclusive) handled by a plain transpose instead of resampling.
const TRANSPOSE_RANGE: std::ops::RangeInclusive<f64> = 92.0..=93.0;

/// Threshold used to bring interpolated binary pixels back to {0, 255}.
const BINARY_CUTOFF: u8 = 128;

/// Whether `degrees` takes the transpose path.
pub fn is_transpose_angle(degrees: f64) -> bool {
    TRANSPOSE_RANGE.contains(&degrees)
}

/// Rotates rasters about their centre. Positive angles are counter-clockwise.
///
/// The output always has the input's dimensions; pixels the rotation exposes
/// are painted with the configured [`FillPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rotator {
    fill: FillPolicy,
}

impl Rotator {
    pub fn new(fill: FillPolicy) -> Self {
        Self { fill }
    }

    pub fn fill(&self) -> FillPolicy {
        self.fill
    }

    #[instrument(skip(self, raster), fields(width = raster.width(), height = raster.height()))]
    pub fn rotate(&self, raster: &Raster, degrees: f64) -> Result<Raster> {
        raster.ensure_not_empty("rotate")?;
        if !degrees.is_finite() {
            return Err(ScanlinkError::PreprocessingFailed(format!(
                "rotation angle is not finite: {degrees}"
            )));
        }

        if is_transpose_angle(degrees) {
            debug!("Transpose path");
            return self.transpose(raster);
        }

        if degrees.abs() < 0.01 {
            return Ok(raster.clone());
        }

        // imageproc rotates clockwise for positive theta.
        let theta = -(degrees.to_radians()) as f32;
        let fill = self.fill.intensity();

        let rotated = match raster.format() {
            PixelFormat::Rgba => {
                let rgba = raster.to_rgba()?;
                let out: RgbaImage = rotate_about_center(
                    &rgba,
                    theta,
                    Interpolation::Bilinear,
                    Rgba([fill, fill, fill, 255]),
                );
                Raster::from_raw(out.width(), out.height(), PixelFormat::Rgba, out.into_raw())?
            }
            PixelFormat::Intensity => {
                let gray = raster.to_gray()?;
                let out = rotate_about_center(&gray, theta, Interpolation::Bilinear, Luma([fill]));
                Raster::from_gray(out)
            }
            PixelFormat::Binary => {
                let gray = raster.to_gray()?;
                let mut out =
                    rotate_about_center(&gray, theta, Interpolation::Bilinear, Luma([fill]));
                for px in out.pixels_mut() {
                    px.0[0] = if px.0[0] >= BINARY_CUTOFF { 255 } else { 0 };
                }
                Raster::from_binary(out)?
            }
        };

        debug!(degrees, "Affine rotation applied");
        Ok(rotated)
    }

    /// `out(x, y) = in(y, x)` inside a frame of the input's size.
    fn transpose(&self, raster: &Raster) -> Result<Raster> {
        let (width, height) = (raster.width() as usize, raster.height() as usize);
        let bpp = raster.format().bytes_per_pixel();
        let src = raster.as_bytes();

        let fill = self.fill.intensity();
        let mut data = match raster.format() {
            PixelFormat::Rgba => [fill, fill, fill, 255].repeat(width * height),
            PixelFormat::Intensity | PixelFormat::Binary => vec![fill; width * height],
        };

        // Source row is the output column and vice versa.
        for y in 0..height.min(width) {
            for x in 0..width.min(height) {
                let from = (x * width + y) * bpp;
                let to = (y * width + x) * bpp;
                data[to..to + bpp].copy_from_slice(&src[from..from + bpp]);
            }
        }

        Raster::from_raw(raster.width(), raster.height(), raster.format(), data)
    }
}

/// Rotate with a black fill.
pub fn rotate(raster: &Raster, degrees: f64) -> Result<Raster> {
    Rotator::default().rotate(raster, degrees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    fn dot(size: u32, x: u32, y: u32) -> Raster {
        let mut gray = GrayImage::new(size, size);
        gray.put_pixel(x, y, Luma([255u8]));
        Raster::from_gray(gray)
    }

    fn value_at(raster: &Raster, x: u32, y: u32) -> u8 {
        raster.to_gray().unwrap().get_pixel(x, y).0[0]
    }

    #[test]
    fn transpose_boundaries() {
        assert!(is_transpose_angle(92.0));
        assert!(is_transpose_angle(92.5));
        assert!(is_transpose_angle(93.0));
        assert!(!is_transpose_angle(91.9));
        assert!(!is_transpose_angle(93.1));
    }

    #[test]
    fn transpose_swaps_coordinates_at_both_ends() {
        let raster = dot(21, 15, 3);
        for degrees in [92.0, 93.0] {
            let out = rotate(&raster, degrees).unwrap();
            assert_eq!(value_at(&out, 3, 15), 255, "angle {degrees}");
            assert_eq!(value_at(&out, 15, 3), 0, "angle {degrees}");
        }
    }

    #[test]
    fn just_outside_range_resamples() {
        let raster = dot(21, 15, 3);
        for degrees in [91.9, 93.1] {
            let out = rotate(&raster, degrees).unwrap();
            assert_ne!(value_at(&out, 3, 15), 255, "angle {degrees}");
        }
    }

    #[test]
    fn dimensions_survive_round_trip() {
        let gray = GrayImage::from_fn(37, 23, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]));
        let raster = Raster::from_gray(gray);
        for degrees in [5.0, -12.5, 92.5, 45.0, 170.0] {
            let there = rotate(&raster, degrees).unwrap();
            let back = rotate(&there, -degrees).unwrap();
            assert_eq!((back.width(), back.height()), (37, 23));
        }
    }

    #[test]
    fn non_square_transpose_keeps_frame() {
        let gray = GrayImage::from_fn(6, 4, |x, y| Luma([(10 * y + x) as u8 + 1]));
        let raster = Raster::from_gray(gray);
        let out = Rotator::new(FillPolicy::White).rotate(&raster, 92.0).unwrap();

        assert_eq!((out.width(), out.height()), (6, 4));
        // in(1, 2) = 10 * 2 + 1 + 1 lands at out(2, 1).
        assert_eq!(value_at(&out, 2, 1), 22);
        assert_eq!(value_at(&out, 3, 0), 31);
        // Columns past the input height have no source pixel.
        assert_eq!(value_at(&out, 5, 0), 255);
        assert_eq!(value_at(&out, 4, 3), 255);
    }

    #[test]
    fn tall_transpose_keeps_frame() {
        let gray = GrayImage::from_fn(4, 6, |x, y| Luma([(10 * y + x) as u8 + 1]));
        let raster = Raster::from_gray(gray);
        let out = Rotator::new(FillPolicy::White).rotate(&raster, 92.5).unwrap();

        assert_eq!((out.width(), out.height()), (4, 6));
        // in(3, 1) = 10 * 1 + 3 + 1 lands at out(1, 3).
        assert_eq!(value_at(&out, 1, 3), 14);
        assert_eq!(value_at(&out, 0, 0), 1);
        // Rows past the input width have no source pixel and the
        // bottom of the input is cropped.
        assert_eq!(value_at(&out, 0, 4), 255);
        assert_eq!(value_at(&out, 3, 5), 255);
    }

    #[test]
    fn positive_angle_is_counter_clockwise() {
        let mut gray = GrayImage::new(20, 20);
        for y in 9..12 {
            for x in 14..17 {
                gray.put_pixel(x, y, Luma([255u8]));
            }
        }
        let out = rotate(&Raster::from_gray(gray), 90.0).unwrap();
        let out = out.to_gray().unwrap();

        let (mut sum, mut sx, mut sy) = (0.0f64, 0.0f64, 0.0f64);
        for (x, y, px) in out.enumerate_pixels() {
            let v = px.0[0] as f64;
            sum += v;
            sx += v * x as f64;
            sy += v * y as f64;
        }
        assert!(sum > 0.0);
        let (cx, cy) = (sx / sum, sy / sum);
        // A blob right of centre ends up above it.
        assert!(cy < 8.0, "centroid y = {cy}");
        assert!((cx - 10.0).abs() < 2.0, "centroid x = {cx}");
    }

    #[test]
    fn binary_stays_binary() {
        let gray = GrayImage::from_fn(40, 40, |x, _| if x > 20 { Luma([255]) } else { Luma([0]) });
        let raster = Raster::from_binary(gray).unwrap();
        let out = rotate(&raster, 7.0).unwrap();
        assert_eq!(out.format(), PixelFormat::Binary);
        assert!(out.as_bytes().iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn white_fill_paints_corners() {
        let raster = Raster::from_gray(GrayImage::from_pixel(50, 50, Luma([0u8])));
        let out = Rotator::new(FillPolicy::White).rotate(&raster, 30.0).unwrap();
        assert_eq!(value_at(&out, 0, 0), 255);
        assert_eq!(value_at(&out, 25, 25), 0);
    }

    #[test]
    fn tiny_angle_is_identity() {
        let raster = dot(9, 2, 2);
        assert_eq!(rotate(&raster, 0.001).unwrap(), raster);
    }

    #[test]
    fn rejects_empty_and_nan() {
        let empty = Raster::from_raw(0, 0, PixelFormat::Intensity, Vec::new()).unwrap();
        assert!(rotate(&empty, 5.0).is_err());
        assert!(rotate(&dot(5, 1, 1), f64::NAN).is_err());
    }
}
