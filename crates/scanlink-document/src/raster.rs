// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory raster model shared by every preprocessing stage.
//
// Stages never mutate a `Raster` in place: each takes `&Raster` and returns a
// new one, so the capture survives every step unchanged.

use image::{DynamicImage, GrayImage, RgbaImage};
use scanlink_core::error::{Result, ScanlinkError};

/// Pixel layout of a `Raster` buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA, 4 bytes per pixel.
    Rgba,
    /// 8-bit single-channel intensity.
    Intensity,
    /// Single-channel, every value is 0 or 255.
    Binary,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgba => 4,
            Self::Intensity | Self::Binary => 1,
        }
    }
}

/// A width × height grid of pixels in a contiguous row-major buffer.
///
/// Invariant: `data.len() == width * height * format.bytes_per_pixel()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Raster {
    // -- Construction ---------------------------------------------------------

    /// Wrap a raw buffer, checking the length invariant (and the {0,255}
    /// domain for `Binary`).
    pub fn from_raw(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(ScanlinkError::PreprocessingFailed(format!(
                "buffer holds {} bytes, {}x{} {:?} needs {}",
                data.len(),
                width,
                height,
                format,
                expected
            )));
        }
        if format == PixelFormat::Binary && data.iter().any(|&v| v != 0 && v != 255) {
            return Err(ScanlinkError::PreprocessingFailed(
                "binary raster contains values other than 0 and 255".into(),
            ));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Wrap a decoded image. Single-channel 8-bit images become `Intensity`,
    /// everything else is converted to `Rgba`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => Self::from_gray(gray),
            other => {
                let rgba = other.to_rgba8();
                let (width, height) = rgba.dimensions();
                Self {
                    width,
                    height,
                    format: PixelFormat::Rgba,
                    data: rgba.into_raw(),
                }
            }
        }
    }

    /// Wrap a grayscale image as an `Intensity` raster.
    pub fn from_gray(gray: GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        Self {
            width,
            height,
            format: PixelFormat::Intensity,
            data: gray.into_raw(),
        }
    }

    /// Wrap a grayscale image as `Binary`, validating the value domain.
    pub fn from_binary(gray: GrayImage) -> Result<Self> {
        let (width, height) = gray.dimensions();
        Self::from_raw(width, height, PixelFormat::Binary, gray.into_raw())
    }

    /// Wrap the output of a stage that only ever writes 0 or 255.
    pub(crate) fn binary_unchecked(gray: GrayImage) -> Self {
        let (width, height) = gray.dimensions();
        Self {
            width,
            height,
            format: PixelFormat::Binary,
            data: gray.into_raw(),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn is_binary(&self) -> bool {
        self.format == PixelFormat::Binary
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Fail with `PreprocessingFailed` if the raster has no pixels.
    pub fn ensure_not_empty(&self, stage: &str) -> Result<()> {
        if self.is_empty() {
            return Err(ScanlinkError::PreprocessingFailed(format!(
                "{}: raster is empty ({}x{})",
                stage, self.width, self.height
            )));
        }
        Ok(())
    }

    // -- Conversions ----------------------------------------------------------

    /// Single-channel copy. RGBA is reduced with the standard luma weights.
    pub fn to_gray(&self) -> Result<GrayImage> {
        match self.format {
            PixelFormat::Intensity | PixelFormat::Binary => {
                GrayImage::from_raw(self.width, self.height, self.data.clone())
                    .ok_or_else(|| mismatch(self))
            }
            PixelFormat::Rgba => Ok(DynamicImage::ImageRgba8(self.to_rgba()?).to_luma8()),
        }
    }

    /// RGBA copy. Single-channel rasters are replicated into the colour channels.
    pub fn to_rgba(&self) -> Result<RgbaImage> {
        match self.format {
            PixelFormat::Rgba => RgbaImage::from_raw(self.width, self.height, self.data.clone())
                .ok_or_else(|| mismatch(self)),
            PixelFormat::Intensity | PixelFormat::Binary => {
                Ok(DynamicImage::ImageLuma8(self.to_gray()?).to_rgba8())
            }
        }
    }

    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        match self.format {
            PixelFormat::Rgba => Ok(DynamicImage::ImageRgba8(self.to_rgba()?)),
            PixelFormat::Intensity | PixelFormat::Binary => {
                Ok(DynamicImage::ImageLuma8(self.to_gray()?))
            }
        }
    }

    /// Photometric inverse. Alpha is left untouched for RGBA.
    pub fn inverted(&self) -> Self {
        let data = match self.format {
            PixelFormat::Rgba => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [255 - px[0], 255 - px[1], 255 - px[2], px[3]])
                .collect(),
            PixelFormat::Intensity | PixelFormat::Binary => {
                self.data.iter().map(|&v| 255 - v).collect()
            }
        };
        Self {
            width: self.width,
            height: self.height,
            format: self.format,
            data,
        }
    }
}

fn mismatch(raster: &Raster) -> ScanlinkError {
    ScanlinkError::PreprocessingFailed(format!(
        "buffer does not match {}x{} {:?}",
        raster.width, raster.height, raster.format
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgba};

    #[test]
    fn from_raw_checks_length() {
        assert!(Raster::from_raw(4, 3, PixelFormat::Intensity, vec![0; 12]).is_ok());
        assert!(Raster::from_raw(4, 3, PixelFormat::Rgba, vec![0; 12]).is_err());
        assert!(Raster::from_raw(4, 3, PixelFormat::Rgba, vec![0; 48]).is_ok());
    }

    #[test]
    fn binary_rejects_gray_levels() {
        let err = Raster::from_raw(2, 1, PixelFormat::Binary, vec![0, 128]).unwrap_err();
        assert!(matches!(err, ScanlinkError::PreprocessingFailed(_)));
        assert!(Raster::from_raw(2, 1, PixelFormat::Binary, vec![0, 255]).is_ok());
    }

    #[test]
    fn luma_image_stays_single_channel() {
        let gray = GrayImage::from_pixel(5, 2, Luma([42u8]));
        let raster = Raster::from_dynamic(DynamicImage::ImageLuma8(gray));
        assert_eq!(raster.format(), PixelFormat::Intensity);
        assert_eq!(raster.as_bytes().len(), 10);
    }

    #[test]
    fn rgba_to_gray_uses_luma() {
        let rgba = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 255]));
        let raster = Raster::from_dynamic(DynamicImage::ImageRgba8(rgba));
        assert_eq!(raster.format(), PixelFormat::Rgba);
        let gray = raster.to_gray().unwrap();
        assert!(gray.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn inverted_flips_values_but_not_alpha() {
        let raster = Raster::from_raw(1, 1, PixelFormat::Rgba, vec![10, 20, 30, 200]).unwrap();
        assert_eq!(raster.inverted().as_bytes(), &[245, 235, 225, 200]);

        let binary = Raster::from_raw(2, 1, PixelFormat::Binary, vec![0, 255]).unwrap();
        assert_eq!(binary.inverted().as_bytes(), &[255, 0]);
    }

    #[test]
    fn empty_raster_is_reported() {
        let raster = Raster::from_raw(0, 10, PixelFormat::Intensity, Vec::new()).unwrap();
        assert!(raster.is_empty());
        assert!(raster.ensure_not_empty("binarize").is_err());
    }
}
