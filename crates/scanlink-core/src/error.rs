// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanlink.

use thiserror::Error;

/// Top-level error type for all Scanlink operations.
///
/// None of these are retried automatically. The caller decides whether to
/// re-capture the page or re-run the transfer.
#[derive(Debug, Error)]
pub enum ScanlinkError {
    // -- Preprocessing --
    #[error("preprocessing failed: {0}")]
    PreprocessingFailed(String),

    #[error("image encoding failed: {0}")]
    Encoding(String),

    // -- Transfer --
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    #[error("a {0} session is already active")]
    SessionBusy(String),

    #[error("invalid session state: {0}")]
    InvalidState(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanlinkError>;
