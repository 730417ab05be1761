// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture-to-text flow: load the photo, prepare the page off the async
// runtime, then hand it to the recognizer on a background session. The
// listen flow skips the page and only collects what the recognizer sends.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{info, instrument};

use scanlink_core::config::AppConfig;
use scanlink_core::error::{Result, ScanlinkError};
use scanlink_core::types::{CaptureFormat, GateRole, Orientation};
use scanlink_document::encode;
use scanlink_document::{PreparedPage, SkewAngle, prepare_page};
use scanlink_transfer::{
    ConnectionGate, EncodedPayload, OneshotSink, SessionResult, spawn_listen_session, spawn_session,
};

use crate::args::Args;
use crate::services::data_dir;

/// What one invocation produced.
#[derive(Debug)]
pub struct ScanOutcome {
    pub angle: Option<SkewAngle>,
    pub png_bytes: usize,
    /// `None` on a dry run.
    pub result: Option<SessionResult>,
}

/// Settings from file, with command-line switches applied on top.
pub fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = data_dir::load_config(args.config.as_deref())?;
    args.apply_to(&mut config);
    if let Some(ext) = args
        .image
        .as_deref()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
    {
        config.capture.format = CaptureFormat::from_extension(ext);
    }
    Ok(config)
}

/// Process-wide state for the capture-to-text flow.
///
/// One gate is shared by every session the service starts, so a second
/// request for a busy role is refused with `SessionBusy`.
#[derive(Debug)]
pub struct ScanService {
    config: AppConfig,
    gate: Arc<ConnectionGate>,
}

impl ScanService {
    pub fn new(config: AppConfig) -> Self {
        let gate = Arc::new(ConnectionGate::new(config.transfer.gate_mode));
        Self { config, gate }
    }

    /// Run whichever flow the arguments ask for.
    #[instrument(skip_all, fields(image = ?args.image, listen = args.listen))]
    pub async fn run(&self, args: &Args) -> Result<ScanOutcome> {
        if args.listen {
            let result = self.listen().await?;
            return Ok(ScanOutcome {
                angle: None,
                png_bytes: 0,
                result: Some(result),
            });
        }

        let image = args
            .image
            .as_deref()
            .ok_or_else(|| ScanlinkError::Config("no image given".into()))?;
        let page = prepare(image, args.orientation, &self.config).await?;

        if let Some(path) = &args.save_processed {
            tokio::fs::write(path, &page.png).await?;
            info!(path = %path.display(), "Processed page saved");
        }

        let outcome = ScanOutcome {
            angle: page.angle,
            png_bytes: page.png.len(),
            result: None,
        };
        if args.dry_run {
            info!("Dry run; recognizer not contacted");
            return Ok(outcome);
        }

        let result = self.recognize(&page).await?;
        Ok(ScanOutcome {
            result: Some(result),
            ..outcome
        })
    }

    /// Send the page and wait for the recognized text.
    pub async fn recognize(&self, page: &PreparedPage) -> Result<SessionResult> {
        let payload = EncodedPayload::new(self.config.transfer.language, &page.png);
        let (sink, rx) = OneshotSink::channel();

        spawn_session(
            Arc::clone(&self.gate),
            GateRole::Client,
            self.config.transfer.clone(),
            payload,
            sink,
        )
        .ok_or_else(|| ScanlinkError::SessionBusy(GateRole::Client.to_string()))?;

        await_result(rx).await
    }

    /// Connect and collect whatever the recognizer sends.
    pub async fn listen(&self) -> Result<SessionResult> {
        let (sink, rx) = OneshotSink::channel();
        spawn_listen_session(Arc::clone(&self.gate), self.config.transfer.clone(), sink)
            .ok_or_else(|| ScanlinkError::SessionBusy(GateRole::Server.to_string()))?;

        await_result(rx).await
    }
}

/// Decode and preprocess on the blocking pool.
pub async fn prepare(
    path: &Path,
    orientation: Orientation,
    config: &AppConfig,
) -> Result<PreparedPage> {
    let bytes = tokio::fs::read(path).await?;
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let image = encode::decode(&bytes)?;
        prepare_page(image, orientation, &config)
    })
    .await
    .map_err(|e| ScanlinkError::PreprocessingFailed(format!("preprocessing task: {e}")))?
}

async fn await_result(rx: oneshot::Receiver<Result<SessionResult>>) -> Result<SessionResult> {
    rx.await
        .map_err(|_| ScanlinkError::InvalidState("session ended without a result".into()))?
}
