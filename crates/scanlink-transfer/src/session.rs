// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transfer session — one raw TCP round trip with the recognizer.
//
// The protocol has no framing beyond the socket itself: the payload is
// written and the write half is shut down, then response lines are read
// until the peer closes. No retry happens here; a failed step leaves the
// session in `Failed` and the caller decides what to do.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, instrument, warn};

use scanlink_core::config::TransferConfig;
use scanlink_core::error::{Result, ScanlinkError};
use scanlink_core::types::{SessionId, SessionState};

use crate::payload::EncodedPayload;

/// Write chunk size, so progress can be logged on large pages.
const CHUNK_SIZE: usize = 8192;

/// Outcome of a completed round trip.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub session_id: SessionId,
    /// Response lines joined with `\n`, without a trailing newline.
    pub text: String,
    pub bytes_sent: usize,
    pub bytes_received: usize,
    pub lines: usize,
    pub completed_at: DateTime<Utc>,
}

/// State machine for a single page hand-off.
///
/// `Idle → Connecting → Connected → Sending → Receiving → Closed`, with
/// `Failed` reachable from the three I/O states. A listening session goes
/// straight from `Connected` to `Receiving`.
#[derive(Debug)]
pub struct TransferSession {
    id: SessionId,
    config: TransferConfig,
    state: SessionState,
    stream: Option<TcpStream>,
    payload_sent: bool,
    bytes_sent: usize,
    result: Option<SessionResult>,
}

impl TransferSession {
    pub fn new(config: &TransferConfig) -> Self {
        Self {
            id: SessionId::new(),
            config: config.clone(),
            state: SessionState::Idle,
            stream: None,
            payload_sent: false,
            bytes_sent: 0,
            result: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Open the socket to the configured recognizer.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn connect(&mut self) -> Result<()> {
        self.expect_state(SessionState::Idle, "connect")?;
        let addr = self.config.server_address()?;
        self.state = SessionState::Connecting;
        info!(addr = %addr, "Connecting to recognizer");

        match open_stream(&addr, self.config.connect_timeout()).await {
            Ok(stream) => {
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(error = %e, "set_nodelay failed");
                }
                self.stream = Some(stream);
                self.state = SessionState::Connected;
                debug!("Connected");
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Write the payload, flush, and half-close when configured.
    #[instrument(skip_all, fields(session = %self.id, bytes = payload.len()))]
    pub async fn send(&mut self, payload: &EncodedPayload) -> Result<()> {
        self.expect_state(SessionState::Connected, "send")?;
        self.state = SessionState::Sending;

        let Some(mut stream) = self.stream.take() else {
            return Err(self.fail(ScanlinkError::InvalidState("send without a socket".into())));
        };

        match write_payload(&mut stream, payload, self.config.half_close).await {
            Ok(sent) => {
                self.stream = Some(stream);
                self.bytes_sent = sent;
                self.payload_sent = true;
                info!(
                    sent,
                    digest = payload.digest(),
                    tagged = payload.has_tag(),
                    "Payload sent"
                );
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Read response lines until the peer closes the connection.
    ///
    /// Bytes are decoded lossily as UTF-8. On error the partial text is
    /// discarded.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn receive_all(&mut self) -> Result<String> {
        if self.state != SessionState::Sending || !self.payload_sent {
            return Err(ScanlinkError::InvalidState(format!(
                "receive in state {:?}; the payload was not sent",
                self.state
            )));
        }
        self.read_response().await
    }

    /// Read response lines without sending anything first.
    ///
    /// This is the receive-only mode: the recognizer pushes text on a
    /// connection the caller opened and closes it when done.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn listen(&mut self) -> Result<String> {
        self.expect_state(SessionState::Connected, "listen")?;
        self.read_response().await
    }

    /// Drop the socket. A failed session stays `Failed`.
    pub fn close(&mut self) {
        self.stream = None;
        if self.state != SessionState::Failed {
            self.state = SessionState::Closed;
        }
    }

    /// Summary of the completed round trip, if there was one.
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Connect, send, receive and close.
    pub async fn run(mut self, payload: &EncodedPayload) -> Result<SessionResult> {
        self.connect().await?;
        self.send(payload).await?;
        self.receive_all().await?;
        self.close();
        self.result
            .take()
            .ok_or_else(|| ScanlinkError::InvalidState("session closed without a result".into()))
    }

    /// Connect, listen until the peer closes, and close.
    pub async fn run_listen(mut self) -> Result<SessionResult> {
        self.connect().await?;
        self.listen().await?;
        self.close();
        self.result
            .take()
            .ok_or_else(|| ScanlinkError::InvalidState("session closed without a result".into()))
    }

    async fn read_response(&mut self) -> Result<String> {
        self.state = SessionState::Receiving;

        let Some(stream) = self.stream.take() else {
            return Err(self.fail(ScanlinkError::InvalidState("receive without a socket".into())));
        };

        match read_lines(stream).await {
            Ok((lines, bytes_received)) => {
                let text = lines.join("\n");
                info!(lines = lines.len(), bytes_received, "Response received");
                self.result = Some(SessionResult {
                    session_id: self.id,
                    text: text.clone(),
                    bytes_sent: self.bytes_sent,
                    bytes_received,
                    lines: lines.len(),
                    completed_at: Utc::now(),
                });
                self.state = SessionState::Closed;
                Ok(text)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn expect_state(&self, expected: SessionState, op: &str) -> Result<()> {
        if self.state != expected {
            return Err(ScanlinkError::InvalidState(format!(
                "{} requires {:?}, session is {:?}",
                op, expected, self.state
            )));
        }
        Ok(())
    }

    fn fail(&mut self, err: ScanlinkError) -> ScanlinkError {
        warn!(session = %self.id, state = ?self.state, error = %err, "Session failed");
        self.stream = None;
        self.state = SessionState::Failed;
        err
    }
}

async fn open_stream(addr: &str, timeout: Option<Duration>) -> Result<TcpStream> {
    let connect = TcpStream::connect(addr);
    let stream = match timeout {
        Some(limit) => tokio::time::timeout(limit, connect).await.map_err(|_| {
            ScanlinkError::ConnectFailed(format!(
                "connection to {} timed out after {}s",
                addr,
                limit.as_secs()
            ))
        })?,
        None => connect.await,
    };
    stream.map_err(|e| ScanlinkError::ConnectFailed(format!("{}: {}", addr, e)))
}

async fn write_payload(
    stream: &mut TcpStream,
    payload: &EncodedPayload,
    half_close: bool,
) -> Result<usize> {
    let mut sent = 0usize;
    for chunk in payload.as_bytes().chunks(CHUNK_SIZE) {
        stream.write_all(chunk).await.map_err(|e| {
            ScanlinkError::SendFailed(format!("write failed at byte {}: {}", sent, e))
        })?;
        sent += chunk.len();
        debug!(sent, total = payload.len(), "send progress");
    }

    stream
        .flush()
        .await
        .map_err(|e| ScanlinkError::SendFailed(format!("flush: {e}")))?;

    if half_close {
        stream
            .shutdown()
            .await
            .map_err(|e| ScanlinkError::SendFailed(format!("shutdown write half: {e}")))?;
    }
    Ok(sent)
}

async fn read_lines(stream: TcpStream) -> Result<(Vec<String>, usize)> {
    let mut reader = BufReader::new(stream);
    let mut lines = Vec::new();
    let mut received = 0usize;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| ScanlinkError::ReceiveFailed(format!("read after {} bytes: {}", received, e)))?;
        if n == 0 {
            break;
        }
        received += n;
        split_lines(&buf, &mut lines);
    }
    Ok((lines, received))
}

/// Split one `\n`-terminated chunk into lines. `\n`, `\r\n` and a lone
/// `\r` all end a line; an unterminated tail is a line of its own.
fn split_lines(chunk: &[u8], lines: &mut Vec<String>) {
    let mut start = 0;
    let mut i = 0;
    while i < chunk.len() {
        match chunk[i] {
            b'\n' => {
                lines.push(String::from_utf8_lossy(&chunk[start..i]).into_owned());
                start = i + 1;
            }
            b'\r' => {
                lines.push(String::from_utf8_lossy(&chunk[start..i]).into_owned());
                if chunk.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < chunk.len() {
        lines.push(String::from_utf8_lossy(&chunk[start..]).into_owned());
    }
}
