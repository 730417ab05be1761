// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanlink-document — Page preprocessing for the Scanlink recognizer hand-off.
//
// Provides the in-memory raster model, capture normalization (orientation,
// downsampling), adaptive binarization, two skew estimators, rotation, and the
// skew corrector that ties them together.

pub mod binarize;
pub mod capture;
pub mod correct;
pub mod encode;
pub mod pipeline;
pub mod raster;
pub mod rotate;
pub mod skew;

// Re-export the primary types so callers can use `scanlink_document::Raster` etc.
pub use binarize::{Binarizer, binarize};
pub use correct::{Corrected, SkewCorrector};
pub use pipeline::{PreparedPage, prepare_page};
pub use raster::{PixelFormat, Raster};
pub use rotate::{Rotator, rotate};
pub use skew::{
    ContourStrategy, CriterionTable, ProjectionStrategy, SkewAngle, SkewEstimationStrategy,
    estimate_angle_by_contour, estimate_angle_by_projection, projection_criteria, strategy_for,
};
