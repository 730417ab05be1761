// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanlink pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a transfer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of a transfer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Created, no socket yet.
    Idle,
    /// Connection attempt in flight.
    Connecting,
    /// Socket established, nothing written.
    Connected,
    /// Writing the payload.
    Sending,
    /// Reading the response until the peer closes.
    Receiving,
    /// Round trip finished and the socket is dropped.
    Closed,
    /// An I/O error ended the session.
    Failed,
}

/// Which gate flag a session is guarded by.
///
/// `Server` is an outbound connection as well; it only names the second,
/// independent session slot used by the alternate operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateRole {
    Client,
    Server,
}

impl GateRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }
}

impl std::fmt::Display for GateRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the connection gate arbitrates concurrent acquisitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// Atomic compare-and-swap; at most one holder per role.
    #[default]
    Strict,
    /// Check-only acquire; the flag is raised once the socket connects, so
    /// two acquisitions before that point both succeed.
    Legacy,
}

/// Recognition language requested from the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageSelector {
    /// The recognizer's default model. Nothing is sent on the wire.
    #[default]
    Default,
    /// English model, announced with a tag line before the payload.
    English,
}

impl LanguageSelector {
    /// Build from the boolean switch exposed in the UI.
    pub fn from_english_flag(english: bool) -> Self {
        if english { Self::English } else { Self::Default }
    }

    /// Bytes written ahead of the raster, if any.
    pub fn tag_line(&self) -> Option<&'static [u8]> {
        match self {
            Self::Default => None,
            Self::English => Some(b"ENGLISH\n"),
        }
    }
}

/// Which skew estimation strategy the corrector runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkewMethod {
    /// Minimum-area rectangle around the ink pixels.
    #[default]
    Contour,
    /// Brute-force search over integer angles maximising the row peak.
    Projection,
}

impl SkewMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "contour" | "rect" | "minarearect" => Some(Self::Contour),
            "projection" | "profile" => Some(Self::Projection),
            _ => None,
        }
    }
}

/// What to paint into the corners a rotation exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPolicy {
    #[default]
    Black,
    White,
}

impl FillPolicy {
    pub fn intensity(&self) -> u8 {
        match self {
            Self::Black => 0,
            Self::White => 255,
        }
    }
}

/// Orientation hint reported by the capture provider.
///
/// The variant names where the top of the page currently points; the
/// correction is a clockwise quarter turn count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Up,
    Right,
    Down,
    Left,
}

impl Orientation {
    /// Clockwise rotation in degrees that brings the page upright.
    pub fn correction_degrees(&self) -> u32 {
        match self {
            Self::Up => 0,
            Self::Right => 90,
            Self::Down => 180,
            Self::Left => 270,
        }
    }

    /// Map a clockwise rotation in degrees (0, 90, 180, 270) to a hint.
    /// Anything else is treated as upright.
    pub fn from_degrees(degrees: u32) -> Self {
        match degrees % 360 {
            90 => Self::Right,
            180 => Self::Down,
            270 => Self::Left,
            _ => Self::Up,
        }
    }
}

/// Encoding the capture provider stores the photo in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    #[default]
    Jpeg,
    Png,
}

impl CaptureFormat {
    /// Infer a format from a file extension (with or without the dot).
    /// Unknown extensions fall back to JPEG.
    pub fn from_extension(ext: &str) -> Self {
        let lower = ext.trim_start_matches('.').to_ascii_lowercase();
        if lower.contains("png") { Self::Png } else { Self::Jpeg }
    }
}
