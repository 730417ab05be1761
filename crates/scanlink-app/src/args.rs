// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use scanlink_core::config::AppConfig;
use scanlink_core::types::{GateMode, LanguageSelector, Orientation, SkewMethod};

/// Prepare a page photo and hand it to the remote recognizer.
#[derive(Parser, Debug)]
#[command(name = "scanlink", version, about, long_about = None)]
pub struct Args {
    /// Photo of the page (JPEG or PNG)
    #[arg(required_unless_present = "listen")]
    pub image: Option<PathBuf>,

    /// JSON settings file (defaults to the data directory's config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Recognizer host name or IP
    #[arg(long)]
    pub host: Option<String>,

    /// Recognizer port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Ask for the English recognition model
    #[arg(long, default_value_t = false)]
    pub english: bool,

    /// Skew estimator (contour, projection)
    #[arg(long, value_parser = parse_skew)]
    pub skew: Option<SkewMethod>,

    /// Skip skew correction
    #[arg(long, default_value_t = false)]
    pub no_deskew: bool,

    /// Where the top of the page points (up, right, down, left or 0/90/180/270)
    #[arg(long, value_parser = parse_orientation, default_value = "up")]
    pub orientation: Orientation,

    /// Also write the processed page to this PNG file
    #[arg(long)]
    pub save_processed: Option<PathBuf>,

    /// Preprocess only, do not contact the recognizer
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Connect and print what the recognizer sends, without sending a page
    #[arg(long, default_value_t = false, conflicts_with_all = ["dry_run", "save_processed"])]
    pub listen: bool,

    /// Use the check-only connection gate
    #[arg(long, default_value_t = false)]
    pub legacy_gate: bool,

    /// Connect timeout in seconds (no timeout by default)
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: Option<Level>,
}

impl Args {
    pub fn new() -> Self {
        Self::parse()
    }

    /// Layer the command-line switches over the loaded settings.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.transfer.server_host = host.clone();
        }
        if let Some(port) = self.port {
            config.transfer.server_port = port;
        }
        if self.english {
            config.transfer.language = LanguageSelector::from_english_flag(true);
        }
        if let Some(method) = self.skew {
            config.preprocess.skew_method = method;
        }
        if self.no_deskew {
            config.preprocess.deskew = false;
        }
        if self.legacy_gate {
            config.transfer.gate_mode = GateMode::Legacy;
        }
        if let Some(secs) = self.connect_timeout {
            config.transfer.connect_timeout_secs = Some(secs);
        }
    }
}

fn parse_skew(value: &str) -> Result<SkewMethod, String> {
    SkewMethod::from_name(value)
        .ok_or_else(|| format!("unknown skew method '{value}' (expected contour or projection)"))
}

fn parse_orientation(value: &str) -> Result<Orientation, String> {
    if let Ok(degrees) = value.parse::<u32>() {
        return match degrees {
            0 | 90 | 180 | 270 => Ok(Orientation::from_degrees(degrees)),
            _ => Err(format!("orientation must be a quarter turn, got {degrees}")),
        };
    }
    match value.to_ascii_lowercase().as_str() {
        "up" => Ok(Orientation::Up),
        "right" => Ok(Orientation::Right),
        "down" => Ok(Orientation::Down),
        "left" => Ok(Orientation::Left),
        other => Err(format!("unknown orientation '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_invocation_keeps_config() {
        let args = Args::try_parse_from(["scanlink", "page.jpg"]).unwrap();
        assert_eq!(args.orientation, Orientation::Up);

        let mut config = AppConfig::default();
        config.transfer.server_host = "ocr.local".into();
        args.apply_to(&mut config);
        assert_eq!(config.transfer.server_host, "ocr.local");
        assert_eq!(config.transfer.language, LanguageSelector::Default);
        assert!(config.preprocess.deskew);
    }

    #[test]
    fn switches_override_config() {
        let args = Args::try_parse_from([
            "scanlink",
            "page.png",
            "--host",
            "10.1.1.5",
            "--port",
            "10001",
            "--english",
            "--skew",
            "projection",
            "--no-deskew",
            "--legacy-gate",
            "--connect-timeout",
            "5",
            "--orientation",
            "90",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        args.apply_to(&mut config);
        assert_eq!(config.transfer.server_address().unwrap(), "10.1.1.5:10001");
        assert_eq!(config.transfer.language, LanguageSelector::English);
        assert_eq!(config.preprocess.skew_method, SkewMethod::Projection);
        assert!(!config.preprocess.deskew);
        assert_eq!(config.transfer.gate_mode, GateMode::Legacy);
        assert_eq!(config.transfer.connect_timeout_secs, Some(5));
        assert_eq!(args.orientation, Orientation::Right);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(Args::try_parse_from(["scanlink", "p.jpg", "--skew", "hough"]).is_err());
        assert!(Args::try_parse_from(["scanlink", "p.jpg", "--orientation", "45"]).is_err());
        assert!(Args::try_parse_from(["scanlink"]).is_err());
        assert!(Args::try_parse_from(["scanlink", "p.jpg", "--orientation", "360"]).is_err());
    }

    #[test]
    fn listen_needs_no_image() {
        let args = Args::try_parse_from(["scanlink", "--listen"]).unwrap();
        assert!(args.listen);
        assert!(args.image.is_none());
        assert!(Args::try_parse_from(["scanlink", "--listen", "--dry-run"]).is_err());
    }

    #[test]
    fn orientation_accepts_names_and_degrees() {
        for (value, expected) in [
            ("left", Orientation::Left),
            ("DOWN", Orientation::Down),
            ("270", Orientation::Left),
            ("0", Orientation::Up),
        ] {
            assert_eq!(parse_orientation(value), Ok(expected), "{value}");
        }
    }
}
