// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory and settings file resolution.

use std::path::{Path, PathBuf};

use scanlink_core::config::AppConfig;
use scanlink_core::error::Result;
use tracing::{debug, info};

/// Settings file name inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Conventional per-user data directory. Not created here.
pub fn data_dir() -> PathBuf {
    base_dir().join("scanlink")
}

/// Load settings from `explicit` if given (errors propagate), otherwise from
/// the data directory when a file exists there, otherwise defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        info!(path = %path.display(), "Loading settings");
        return AppConfig::load(path);
    }

    let path = data_dir().join(CONFIG_FILE);
    if path.is_file() {
        info!(path = %path.display(), "Loading settings");
        AppConfig::load(&path)
    } else {
        debug!(path = %path.display(), "No settings file; using defaults");
        Ok(AppConfig::default())
    }
}

fn base_dir() -> PathBuf {
    // XDG data dir, then home, then /tmp.
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from("/tmp")
}
