// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Projection-profile strategy — brute-force search over integer angles for
// the rotation whose busiest row holds the most "on" pixels.

use std::collections::BTreeMap;

use image::{GrayImage, Luma};
use scanlink_core::error::Result;
use tracing::{debug, instrument, trace};

use crate::raster::Raster;
use crate::rotate::Rotator;

/// Search bound in degrees (inclusive, both directions).
pub const SEARCH_LIMIT: i32 = 15;

/// Candidates too close to level to be worth correcting.
const DEAD_ZONE: [i32; 3] = [-1, 0, 1];

/// Candidate degree → criterion value, in ascending degree order.
pub type CriterionTable = BTreeMap<i32, f64>;

/// Candidate angles in search order.
pub fn candidate_angles() -> impl Iterator<Item = i32> {
    (-SEARCH_LIMIT..=SEARCH_LIMIT).filter(|theta| !DEAD_ZONE.contains(theta))
}

/// Count of pixels equal to 255 in every row.
pub fn projection_profile(raster: &Raster) -> Vec<u32> {
    let width = raster.width() as usize;
    let bpp = raster.format().bytes_per_pixel();
    if width == 0 {
        return vec![0; raster.height() as usize];
    }
    raster
        .as_bytes()
        .chunks_exact(width * bpp)
        .map(|row| row.chunks_exact(bpp).filter(|px| px[0] == 255).count() as u32)
        .collect()
}

/// Criterion for one profile: the peak row count.
pub fn criterion(profile: &[u32]) -> f64 {
    profile.iter().copied().max().unwrap_or(0) as f64
}

/// Evaluate every candidate angle.
///
/// For each θ the raster is rotated by −θ and the row profile of 255-valued
/// pixels is scored. Non-binary input is thresholded at 128 first.
#[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
pub fn projection_criteria(raster: &Raster) -> Result<CriterionTable> {
    raster.ensure_not_empty("projection skew")?;
    let mask = binary_mask(raster)?;
    let rotator = Rotator::default();

    let mut table = CriterionTable::new();
    for theta in candidate_angles() {
        let rotated = rotator.rotate(&mask, -(theta as f64))?;
        let value = criterion(&projection_profile(&rotated));
        trace!(theta, value, "Candidate scored");
        table.insert(theta, value);
    }
    Ok(table)
}

/// Highest criterion wins; on a tie the earlier (smaller) angle is kept.
pub fn select_best(table: &CriterionTable) -> i32 {
    let mut best_angle = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (&theta, &value) in table {
        if value > best_value {
            best_value = value;
            best_angle = theta;
        }
    }
    best_angle
}

/// Estimate the tilt of 255-valued content on a 0 background.
///
/// The result is the tilt itself (positive counter-clockwise), always in
/// {−15…−2} ∪ {2…15}.
pub fn estimate_angle_by_projection(raster: &Raster) -> Result<i32> {
    let table = projection_criteria(raster)?;
    let angle = select_best(&table);
    debug!(
        angle,
        peak = table.get(&angle).copied().unwrap_or_default(),
        "Projection skew estimated"
    );
    Ok(angle)
}

fn binary_mask(raster: &Raster) -> Result<Raster> {
    if raster.is_binary() {
        return Ok(raster.clone());
    }
    let gray = raster.to_gray()?;
    let mut mask = GrayImage::new(gray.width(), gray.height());
    for (x, y, px) in gray.enumerate_pixels() {
        if px.0[0] >= 128 {
            mask.put_pixel(x, y, Luma([255u8]));
        }
    }
    Raster::from_binary(mask)
}
