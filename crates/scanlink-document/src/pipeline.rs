// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page pipeline — capture to PNG payload.

use image::DynamicImage;
use scanlink_core::config::AppConfig;
use scanlink_core::error::Result;
use scanlink_core::types::Orientation;
use tracing::{info, instrument};

use crate::binarize::Binarizer;
use crate::capture;
use crate::correct::SkewCorrector;
use crate::encode;
use crate::raster::Raster;
use crate::skew::SkewAngle;

/// A page ready to hand to the transfer layer.
#[derive(Debug, Clone)]
pub struct PreparedPage {
    /// Final binary raster.
    pub raster: Raster,
    /// Angle applied by the corrector, `None` when deskew is disabled.
    pub angle: Option<SkewAngle>,
    /// PNG encoding of `raster`.
    pub png: Vec<u8>,
}

/// Normalize, binarize, optionally deskew, and encode one capture.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn prepare_page(
    image: DynamicImage,
    orientation: Orientation,
    config: &AppConfig,
) -> Result<PreparedPage> {
    let normalized = capture::normalize(image, &config.capture, orientation)?;
    let binary = Binarizer::default().binarize(&normalized)?;

    let (raster, angle) = if config.preprocess.deskew {
        let corrected = SkewCorrector::from_config(&config.preprocess).correct(&binary)?;
        (corrected.raster, Some(corrected.angle))
    } else {
        (binary, None)
    };

    let png = encode::encode_png(&raster)?;
    info!(
        width = raster.width(),
        height = raster.height(),
        angle = angle.map(|a| a.degrees()),
        png_bytes = png.len(),
        "Page prepared"
    );
    Ok(PreparedPage { raster, angle, png })
}
