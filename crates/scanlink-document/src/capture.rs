// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture normalization — orientation, power-of-two downsampling and the
// optional storage round trip, applied before any preprocessing stage.

use image::DynamicImage;
use image::imageops::FilterType;
use scanlink_core::config::CaptureConfig;
use scanlink_core::error::Result;
use scanlink_core::types::Orientation;
use tracing::{debug, info, instrument};

use crate::encode;
use crate::raster::Raster;

/// Largest power-of-two divisor that keeps both halved dimensions at or
/// above `target`.
pub fn sample_factor(width: u32, height: u32, target: u32) -> u32 {
    if target == 0 {
        return 1;
    }
    let half_width = width / 2;
    let half_height = height / 2;
    let mut sample = 1u32;
    while half_height / sample >= target && half_width / sample >= target {
        sample *= 2;
    }
    sample
}

/// Rotate clockwise by the quarter turns the hint asks for.
pub fn apply_orientation(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Up => image,
        Orientation::Right => image.rotate90(),
        Orientation::Down => image.rotate180(),
        Orientation::Left => image.rotate270(),
    }
}

/// Bring a raw capture into the shape the preprocessing stages expect.
#[instrument(skip(image, config), fields(width = image.width(), height = image.height()))]
pub fn normalize(
    image: DynamicImage,
    config: &CaptureConfig,
    orientation: Orientation,
) -> Result<Raster> {
    let image = if config.correct_orientation {
        debug!(
            degrees = orientation.correction_degrees(),
            "Applying orientation hint"
        );
        apply_orientation(image, orientation)
    } else {
        image
    };

    let sample = sample_factor(image.width(), image.height(), config.target_height);
    let image = if sample > 1 {
        let (w, h) = (image.width() / sample, image.height() / sample);
        debug!(sample, to_w = w, to_h = h, "Downsampling capture");
        image.resize_exact(w, h, FilterType::Triangle)
    } else {
        image
    };

    let image = if config.reencode {
        let bytes = encode::encode_image(&image, config.format, config.quality)?;
        debug!(bytes = bytes.len(), format = ?config.format, "Capture re-encoded");
        encode::decode(&bytes)?
    } else {
        image
    };

    info!(
        width = image.width(),
        height = image.height(),
        "Capture normalized"
    );
    Ok(Raster::from_dynamic(image))
}
