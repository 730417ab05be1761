// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanlinkError};
use crate::types::{CaptureFormat, FillPolicy, GateMode, LanguageSelector, SkewMethod};

/// Well-known port of the recognition service.
pub const DEFAULT_SERVER_PORT: u16 = 10000;

/// Persistent application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub preprocess: PreprocessConfig,
    pub transfer: TransferConfig,
}

/// Input normalization applied before binarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Height the capture is downsampled towards (power-of-two steps only).
    pub target_height: u32,
    /// Encoding the capture provider stores the photo in.
    pub format: CaptureFormat,
    /// JPEG quality (1-100). Ignored for PNG.
    pub quality: u8,
    /// Apply the provider's orientation hint.
    pub correct_orientation: bool,
    /// Re-encode through `format` so the pipeline sees the stored pixels.
    pub reencode: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_height: 1000,
            format: CaptureFormat::Jpeg,
            quality: 75,
            correct_orientation: true,
            reencode: false,
        }
    }
}

/// Binarization and skew correction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Run skew correction after binarization.
    pub deskew: bool,
    /// Which estimator the corrector uses.
    pub skew_method: SkewMethod,
    /// Fill for corners exposed by the rotation.
    pub fill: FillPolicy,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            deskew: true,
            skew_method: SkewMethod::Contour,
            fill: FillPolicy::Black,
        }
    }
}

/// Connection settings for the recognition service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Host name or IP of the recognizer. Must be set before a session starts.
    pub server_host: String,
    pub server_port: u16,
    pub language: LanguageSelector,
    /// Shut down the write half after the payload so the peer sees EOF.
    pub half_close: bool,
    /// Connect timeout in seconds. `None` blocks until the OS gives up.
    pub connect_timeout_secs: Option<u64>,
    pub gate_mode: GateMode,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            server_host: String::new(),
            server_port: DEFAULT_SERVER_PORT,
            language: LanguageSelector::Default,
            half_close: true,
            connect_timeout_secs: None,
            gate_mode: GateMode::Strict,
        }
    }
}

impl TransferConfig {
    /// `host:port` string, or an error if no host is configured.
    pub fn server_address(&self) -> Result<String> {
        let host = self.server_host.trim();
        if host.is_empty() {
            return Err(ScanlinkError::Config("server host is not set".into()));
        }
        if host.contains(':') && !host.starts_with('[') {
            // Bare IPv6 literal.
            return Ok(format!("[{}]:{}", host, self.server_port));
        }
        Ok(format!("{}:{}", host, self.server_port))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ScanlinkError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}
