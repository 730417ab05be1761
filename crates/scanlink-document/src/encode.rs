// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image encoding for the wire payload and the capture round trip.

use image::{DynamicImage, ImageFormat};
use scanlink_core::error::{Result, ScanlinkError};
use scanlink_core::types::CaptureFormat;

use crate::raster::Raster;

/// Encode a raster as PNG. Single-channel rasters stay 8-bit grayscale.
pub fn encode_png(raster: &Raster) -> Result<Vec<u8>> {
    raster.ensure_not_empty("encode")?;
    encode_to_format(&raster.to_dynamic()?, ImageFormat::Png)
}

/// Encode a decoded image in the capture provider's storage format.
pub fn encode_image(image: &DynamicImage, format: CaptureFormat, quality: u8) -> Result<Vec<u8>> {
    match format {
        CaptureFormat::Png => encode_to_format(image, ImageFormat::Png),
        CaptureFormat::Jpeg => encode_jpeg(image, quality),
    }
}

/// Decode any format the `image` crate recognizes.
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(data).map_err(|err| {
        ScanlinkError::PreprocessingFailed(format!("failed to decode image: {}", err))
    })
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = image.to_rgb8();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)
        .map_err(|err| ScanlinkError::Encoding(format!("JPEG encoding failed: {}", err)))?;
    Ok(buffer)
}

fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| ScanlinkError::Encoding(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
