// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SkewCorrector — binarize, estimate, rotate the input page.

use scanlink_core::config::PreprocessConfig;
use scanlink_core::error::{Result, ScanlinkError};
use scanlink_core::types::FillPolicy;
use tracing::{info, instrument};

use crate::binarize::Binarizer;
use crate::raster::Raster;
use crate::rotate::Rotator;
use crate::skew::{SkewAngle, SkewEstimationStrategy, strategy_for};

/// Output of one correction pass.
#[derive(Debug, Clone)]
pub struct Corrected {
    pub raster: Raster,
    pub angle: SkewAngle,
}

/// Runs exactly one estimation strategy and applies its angle.
///
/// The binarized mask is scratch state; the rotation is applied to the raster
/// handed in. There is no fallback to the other strategy.
pub struct SkewCorrector {
    binarizer: Binarizer,
    strategy: Box<dyn SkewEstimationStrategy>,
    rotator: Rotator,
}

impl SkewCorrector {
    pub fn new(strategy: Box<dyn SkewEstimationStrategy>, fill: FillPolicy) -> Self {
        Self {
            binarizer: Binarizer::default(),
            strategy,
            rotator: Rotator::new(fill),
        }
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self::new(strategy_for(config.skew_method), config.fill)
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    #[instrument(skip_all, fields(strategy = self.strategy.name()))]
    pub fn correct(&self, raster: &Raster) -> Result<Corrected> {
        let mask = if raster.is_binary() {
            raster.clone()
        } else {
            self.binarizer.binarize(raster)?
        };

        let angle = self.strategy.estimate(&mask).map_err(as_preprocessing)?;
        let rotated = self
            .rotator
            .rotate(raster, angle.degrees())
            .map_err(as_preprocessing)?;

        info!(angle = angle.degrees(), "Skew corrected");
        Ok(Corrected {
            raster: rotated,
            angle,
        })
    }
}

impl std::fmt::Debug for SkewCorrector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkewCorrector")
            .field("strategy", &self.strategy.name())
            .field("fill", &self.rotator.fill())
            .finish()
    }
}

fn as_preprocessing(err: ScanlinkError) -> ScanlinkError {
    match err {
        ScanlinkError::PreprocessingFailed(_) => err,
        other => ScanlinkError::PreprocessingFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::PixelFormat;
    use crate::skew::{ContourStrategy, ProjectionStrategy};
    use image::{GrayImage, Luma, Rgba, RgbaImage};
    use scanlink_core::types::SkewMethod;

    /// Tall ink block on white, turned counter-clockwise by `tilt`.
    fn tilted_column(tilt: f64) -> GrayImage {
        let (s, c) = tilt.to_radians().sin_cos();
        GrayImage::from_fn(200, 200, |x, y| {
            let dx = x as f64 - 100.0;
            let dy = y as f64 - 100.0;
            let bx = dx * c - dy * s;
            let by = dx * s + dy * c;
            if bx.abs() <= 15.0 && by.abs() <= 60.0 { Luma([20u8]) } else { Luma([235u8]) }
        })
    }

    fn threshold(mut gray: GrayImage) -> GrayImage {
        for px in gray.pixels_mut() {
            px.0[0] = if px.0[0] < 128 { 0 } else { 255 };
        }
        gray
    }

    #[test]
    fn rotates_the_input_not_the_mask() {
        let raster = Raster::from_gray(tilted_column(10.0));
        let corrector = SkewCorrector::new(Box::new(ContourStrategy), FillPolicy::White);
        let corrected = corrector.correct(&raster).unwrap();

        assert!((corrected.angle.degrees() + 10.0).abs() < 1.5);
        assert_eq!(corrected.raster.format(), PixelFormat::Intensity);
        assert_eq!(
            (corrected.raster.width(), corrected.raster.height()),
            (200, 200)
        );
        // Gray levels from the capture survive; a mask would only hold 0/255.
        assert!(corrected.raster.as_bytes().iter().any(|&v| v != 0 && v != 255));
    }

    #[test]
    fn colour_input_stays_colour() {
        let rgba = RgbaImage::from_fn(120, 120, |x, _| {
            if (50..70).contains(&x) { Rgba([30, 30, 30, 255]) } else { Rgba([250, 250, 250, 255]) }
        });
        let raster = Raster::from_dynamic(image::DynamicImage::ImageRgba8(rgba));
        let corrector = SkewCorrector::new(Box::new(ContourStrategy), FillPolicy::White);
        let corrected = corrector.correct(&raster).unwrap();
        assert_eq!(corrected.raster.format(), PixelFormat::Rgba);
    }

    #[test]
    fn binary_input_skips_binarizer() {
        let mask = Raster::from_binary(threshold(tilted_column(0.0))).unwrap();
        let corrector = SkewCorrector::new(Box::new(ContourStrategy), FillPolicy::White);
        let corrected = corrector.correct(&mask).unwrap();
        assert!(corrected.angle.degrees().abs() < 1.0);
        assert_eq!(corrected.raster.format(), PixelFormat::Binary);
    }

    #[test]
    fn blank_page_fails_without_fallback() {
        let raster = Raster::from_gray(GrayImage::from_pixel(60, 60, Luma([240u8])));
        let corrector = SkewCorrector::new(Box::new(ContourStrategy), FillPolicy::Black);
        assert!(matches!(
            corrector.correct(&raster),
            Err(ScanlinkError::PreprocessingFailed(_))
        ));
    }

    #[test]
    fn projection_corrector_reports_integer_angle() {
        let raster = Raster::from_gray(tilted_column(0.0));
        let corrector = SkewCorrector::new(Box::new(ProjectionStrategy), FillPolicy::White);
        let corrected = corrector.correct(&raster).unwrap();
        let degrees = corrected.angle.degrees();
        assert_eq!(degrees.fract(), 0.0);
        assert!((2.0..=15.0).contains(&degrees.abs()));
    }

    #[test]
    fn from_config_selects_strategy() {
        let config = PreprocessConfig {
            skew_method: SkewMethod::Projection,
            ..PreprocessConfig::default()
        };
        assert_eq!(SkewCorrector::from_config(&config).strategy_name(), "projection");
        assert_eq!(
            SkewCorrector::from_config(&PreprocessConfig::default()).strategy_name(),
            "contour"
        );
    }
}
