// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contour strategy — fit a minimum-area rectangle around the ink pixels and
// read the skew off its orientation.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::geometry::min_area_rect;
use imageproc::morphology::erode;
use imageproc::point::Point;
use scanlink_core::error::{Result, ScanlinkError};
use tracing::{debug, instrument};

use super::SkewAngle;
use crate::raster::Raster;

/// Pixels at or below this intensity count as ink.
const INK_THRESHOLD: u8 = 200;

/// A rotated rectangle in image coordinates (y grows downwards).
///
/// `angle` is in [-90, 0) and is the direction of the side whose length is
/// `width`; `height` is the perpendicular side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRect {
    pub center: (f64, f64),
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

impl RotatedRect {
    /// Build from four corners in boundary order.
    pub fn from_corners(corners: &[Point<i32>; 4]) -> Self {
        let edge = |a: Point<i32>, b: Point<i32>| ((b.x - a.x) as f64, (b.y - a.y) as f64);
        let (e0x, e0y) = edge(corners[0], corners[1]);
        let (e1x, e1y) = edge(corners[1], corners[2]);
        let len0 = e0x.hypot(e0y);
        let len1 = e1x.hypot(e1y);

        // Side directions are only defined modulo 180.
        let mut angle = e0y.atan2(e0x).to_degrees();
        if angle >= 90.0 {
            angle -= 180.0;
        } else if angle < -90.0 {
            angle += 180.0;
        }

        let (angle, width, height) = if angle < 0.0 {
            (angle, len0, len1)
        } else {
            (angle - 90.0, len1, len0)
        };

        let cx = corners.iter().map(|p| p.x as f64).sum::<f64>() / 4.0;
        let cy = corners.iter().map(|p| p.y as f64).sum::<f64>() / 4.0;

        Self {
            center: (cx, cy),
            width,
            height,
            angle,
        }
    }

    /// Skew implied by the rectangle: a side running wider than tall is
    /// measured from the other axis.
    pub fn skew(&self) -> SkewAngle {
        if self.width > self.height {
            SkewAngle(self.angle + 90.0)
        } else {
            SkewAngle(self.angle)
        }
    }
}

/// Estimate skew from the bounding rectangle of all ink pixels.
#[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
pub fn estimate_angle_by_contour(raster: &Raster) -> Result<SkewAngle> {
    let rect = ink_bounding_rect(raster)?;
    let angle = rect.skew();
    debug!(
        rect_angle = rect.angle,
        rect_w = rect.width,
        rect_h = rect.height,
        angle = angle.degrees(),
        "Contour skew estimated"
    );
    Ok(angle)
}

/// Threshold, erode and fit the minimum-area rectangle.
pub fn ink_bounding_rect(raster: &Raster) -> Result<RotatedRect> {
    raster.ensure_not_empty("contour skew")?;
    let gray = raster.to_gray()?;

    let mut mask = GrayImage::new(gray.width(), gray.height());
    for (x, y, px) in gray.enumerate_pixels() {
        if px.0[0] <= INK_THRESHOLD {
            mask.put_pixel(x, y, Luma([255u8]));
        }
    }
    let mask = erode(&mask, Norm::LInf, 1);

    let points: Vec<Point<i32>> = mask
        .enumerate_pixels()
        .filter(|(_, _, px)| px.0[0] == 255)
        .map(|(x, y, _)| Point::new(x as i32, y as i32))
        .collect();

    if points.is_empty() {
        return Err(ScanlinkError::PreprocessingFailed(
            "no ink found for contour skew estimation".into(),
        ));
    }

    let corners = min_area_rect(&points);
    Ok(RotatedRect::from_corners(&corners))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanlink_core::types::FillPolicy;

    use crate::rotate::Rotator;

    /// White 200×200 page with a `bw`×`bh` ink block centred and turned
    /// `tilt` degrees counter-clockwise.
    fn page_with_block(bw: f64, bh: f64, tilt: f64) -> Raster {
        let (s, c) = tilt.to_radians().sin_cos();
        let gray = GrayImage::from_fn(200, 200, |x, y| {
            let dx = x as f64 - 100.0;
            let dy = y as f64 - 100.0;
            let bx = dx * c - dy * s;
            let by = dx * s + dy * c;
            if bx.abs() <= bw / 2.0 && by.abs() <= bh / 2.0 {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        });
        Raster::from_gray(gray)
    }

    #[test]
    fn wider_than_tall_adds_ninety() {
        let rect = RotatedRect {
            center: (0.0, 0.0),
            width: 50.0,
            height: 20.0,
            angle: -30.0,
        };
        assert_eq!(rect.skew(), SkewAngle(60.0));

        let tall = RotatedRect {
            width: 20.0,
            height: 50.0,
            ..rect
        };
        assert_eq!(tall.skew(), SkewAngle(-30.0));
    }

    #[test]
    fn corner_order_does_not_change_convention() {
        let a = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 40),
            Point::new(0, 40),
        ];
        let b = [a[1], a[2], a[3], a[0]];
        for corners in [a, b] {
            let rect = RotatedRect::from_corners(&corners);
            assert_eq!(rect.angle, -90.0);
            assert_eq!(rect.width, 40.0);
            assert_eq!(rect.height, 10.0);
            assert_eq!(rect.center, (5.0, 20.0));
        }
    }

    #[test]
    fn upright_tall_block_is_level() {
        let angle = estimate_angle_by_contour(&page_with_block(30.0, 120.0, 0.0)).unwrap();
        assert!(angle.degrees().abs() < 1.0, "got {angle}");
    }

    #[test]
    fn upright_wide_block_reads_minus_ninety() {
        let angle = estimate_angle_by_contour(&page_with_block(120.0, 30.0, 0.0)).unwrap();
        assert!((angle.degrees() + 90.0).abs() < 1.0, "got {angle}");
    }

    #[test]
    fn counter_clockwise_tilt_is_undone() {
        let page = page_with_block(30.0, 120.0, 10.0);
        let angle = estimate_angle_by_contour(&page).unwrap();
        assert!((angle.degrees() + 10.0).abs() < 1.5, "got {angle}");

        let level = Rotator::new(FillPolicy::White)
            .rotate(&page, angle.degrees())
            .unwrap();
        let residual = estimate_angle_by_contour(&level).unwrap();
        assert!(residual.degrees().abs() < 2.0, "residual {residual}");
    }

    #[test]
    fn clockwise_tilt_is_positive() {
        let angle = estimate_angle_by_contour(&page_with_block(30.0, 120.0, -8.0)).unwrap();
        assert!((angle.degrees() - 8.0).abs() < 1.5, "got {angle}");
    }

    #[test]
    fn blank_page_fails() {
        let page = Raster::from_gray(GrayImage::from_pixel(50, 50, Luma([255u8])));
        assert!(matches!(
            estimate_angle_by_contour(&page),
            Err(ScanlinkError::PreprocessingFailed(_))
        ));
    }

    #[test]
    fn single_pixel_speck_is_eroded_away() {
        let mut gray = GrayImage::from_pixel(50, 50, Luma([255u8]));
        gray.put_pixel(25, 25, Luma([0u8]));
        assert!(estimate_angle_by_contour(&Raster::from_gray(gray)).is_err());
    }
}
