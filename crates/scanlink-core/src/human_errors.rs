// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the capture/recognition flow.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Nothing here retries; `retriable` only tells the UI whether offering a
// "try again" button makes sense.

use crate::error::ScanlinkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip, busy recognizer — trying again may work.
    Transient,
    /// User must do something (re-take the photo, set the server address).
    ActionRequired,
    /// Cannot be fixed by trying again.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether a manual "try again" is worth offering.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `ScanlinkError` into a `HumanError`.
pub fn humanize_error(err: &ScanlinkError) -> HumanError {
    match err {
        ScanlinkError::PreprocessingFailed(_) => HumanError {
            message: "We couldn't prepare this photo for reading.".into(),
            suggestion: "Take the picture again with the whole page in view and good lighting.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanlinkError::Encoding(_) => HumanError {
            message: "The processed page couldn't be packaged for sending.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanlinkError::ConnectFailed(detail) => humanize_connect_error(detail),

        ScanlinkError::SendFailed(_) => HumanError {
            message: "The page was only partly sent.".into(),
            suggestion: "The connection dropped while sending. Check your network and send again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanlinkError::ReceiveFailed(_) => HumanError {
            message: "The recognized text didn't arrive.".into(),
            suggestion: "The connection dropped while the server was answering. Send the page again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanlinkError::SessionBusy(_) => HumanError {
            message: "A page is already being read.".into(),
            suggestion: "Wait for the current result before sending another page.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanlinkError::InvalidState(_) => HumanError {
            message: "The transfer was used out of order.".into(),
            suggestion: "Start a new transfer for this page.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanlinkError::Config(detail) => HumanError {
            message: "The settings aren't complete.".into(),
            suggestion: format!("Check the server address and other settings. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanlinkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        ScanlinkError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check that the settings file is valid JSON, or delete it to start from defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

/// Parse connect error details into human-readable messages.
fn humanize_connect_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("refused") {
        HumanError {
            message: "The recognition server refused the connection.".into(),
            suggestion: "The server may not be running. Check the address and port, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("timed out") {
        HumanError {
            message: "The recognition server didn't answer in time.".into(),
            suggestion: "The server may be busy or unreachable from this network.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("resolve") || lower.contains("lookup") || lower.contains("invalid") {
        HumanError {
            message: "The server address doesn't look right.".into(),
            suggestion: "Check the server address and try again. It should look like 192.168.1.100.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "We couldn't reach the recognition server.".into(),
            suggestion: format!("Check your network connection and try again. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_is_transient() {
        let err = ScanlinkError::ConnectFailed("10.0.0.1:10000: Connection refused".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn preprocessing_asks_for_recapture() {
        let human = humanize_error(&ScanlinkError::PreprocessingFailed("empty raster".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn bad_address_is_action_required() {
        let err = ScanlinkError::ConnectFailed("failed to resolve ocr.invalid".into());
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn missing_host_mentions_settings() {
        let human = humanize_error(&ScanlinkError::Config("server host is not set".into()));
        assert!(human.suggestion.contains("server host is not set"));
    }
}
