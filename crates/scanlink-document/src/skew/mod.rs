// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Skew estimation — two independent strategies behind one trait.

pub mod contour;
pub mod projection;

use scanlink_core::error::Result;
use scanlink_core::types::SkewMethod;

use crate::raster::Raster;

pub use contour::{RotatedRect, estimate_angle_by_contour};
pub use projection::{CriterionTable, estimate_angle_by_projection, projection_criteria};

/// A rotation in degrees. Positive is counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct SkewAngle(pub f64);

impl SkewAngle {
    pub fn degrees(&self) -> f64 {
        self.0
    }
}

impl From<f64> for SkewAngle {
    fn from(degrees: f64) -> Self {
        Self(degrees)
    }
}

impl From<i32> for SkewAngle {
    fn from(degrees: i32) -> Self {
        Self(degrees as f64)
    }
}

impl std::fmt::Display for SkewAngle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}°", self.0)
    }
}

/// Estimates the rotation that levels a page.
///
/// Input is Binarizer output (dark ink on white). The returned angle is the
/// correction to hand to the Rotator.
pub trait SkewEstimationStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn estimate(&self, binary: &Raster) -> Result<SkewAngle>;
}

/// Minimum-area rectangle around the ink.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourStrategy;

impl SkewEstimationStrategy for ContourStrategy {
    fn name(&self) -> &'static str {
        "contour"
    }

    fn estimate(&self, binary: &Raster) -> Result<SkewAngle> {
        estimate_angle_by_contour(binary)
    }
}

/// Integer search over the row projection profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionStrategy;

impl SkewEstimationStrategy for ProjectionStrategy {
    fn name(&self) -> &'static str {
        "projection"
    }

    fn estimate(&self, binary: &Raster) -> Result<SkewAngle> {
        // Text is counted as the "on" value, so flip dark ink to 255.
        let ink_on = binary.inverted();
        let tilt = estimate_angle_by_projection(&ink_on)?;
        // The search finds the tilt itself; undoing it is the opposite turn.
        Ok(SkewAngle::from(-tilt))
    }
}

/// Strategy selected by configuration.
pub fn strategy_for(method: SkewMethod) -> Box<dyn SkewEstimationStrategy> {
    match method {
        SkewMethod::Contour => Box::new(ContourStrategy),
        SkewMethod::Projection => Box::new(ProjectionStrategy),
    }
}
