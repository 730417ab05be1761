// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background session runner — gate, session task, result delivery.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span, warn};

use scanlink_core::config::TransferConfig;
use scanlink_core::error::{Result, ScanlinkError};
use scanlink_core::types::GateRole;

use crate::gate::{ConnectionGate, GateGuard};
use crate::payload::EncodedPayload;
use crate::session::{SessionResult, TransferSession};

/// Receives the outcome of a background session. Consumed on delivery, so a
/// sink can only ever be called once.
pub trait ResultSink: Send + 'static {
    fn deliver(self, result: Result<SessionResult>);
}

impl<F> ResultSink for F
where
    F: FnOnce(Result<SessionResult>) + Send + 'static,
{
    fn deliver(self, result: Result<SessionResult>) {
        self(result)
    }
}

/// Sink backed by a oneshot channel, for callers that await the result.
#[derive(Debug)]
pub struct OneshotSink {
    tx: oneshot::Sender<Result<SessionResult>>,
}

impl OneshotSink {
    pub fn channel() -> (Self, oneshot::Receiver<Result<SessionResult>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }
}

impl ResultSink for OneshotSink {
    fn deliver(self, result: Result<SessionResult>) {
        if self.tx.send(result).is_err() {
            warn!("Session result dropped; receiver is gone");
        }
    }
}

/// What the session does once connected.
enum Exchange {
    RoundTrip(EncodedPayload),
    Listen,
}

/// Start a round-trip session on its own task if `role` is free.
///
/// Returns `None` when the gate refuses; the sink is dropped without being
/// called. Otherwise the role is released when the session ends, before the
/// sink sees the result.
pub fn spawn_session<S: ResultSink>(
    gate: Arc<ConnectionGate>,
    role: GateRole,
    config: TransferConfig,
    payload: EncodedPayload,
    sink: S,
) -> Option<JoinHandle<()>> {
    spawn_guarded(gate, role, config, Exchange::RoundTrip(payload), sink)
}

/// Start a receive-only session under the `Server` role.
///
/// The session connects, sends nothing, and delivers whatever the peer
/// writes before closing. Gate and sink behave as in [`spawn_session`].
pub fn spawn_listen_session<S: ResultSink>(
    gate: Arc<ConnectionGate>,
    config: TransferConfig,
    sink: S,
) -> Option<JoinHandle<()>> {
    spawn_guarded(gate, GateRole::Server, config, Exchange::Listen, sink)
}

fn spawn_guarded<S: ResultSink>(
    gate: Arc<ConnectionGate>,
    role: GateRole,
    config: TransferConfig,
    exchange: Exchange,
    sink: S,
) -> Option<JoinHandle<()>> {
    if !gate.try_acquire(role) {
        warn!(%role, "Session already active; request ignored");
        return None;
    }
    let guard = GateGuard::new(gate, role);
    let mut session = TransferSession::new(&config);
    let span = info_span!("session", id = %session.id(), %role);

    let handle = tokio::spawn(
        async move {
            let result: Result<SessionResult> = async {
                session.connect().await?;
                guard.mark_connected();
                match &exchange {
                    Exchange::RoundTrip(payload) => {
                        session.send(payload).await?;
                        session.receive_all().await?;
                    }
                    Exchange::Listen => {
                        session.listen().await?;
                    }
                }
                session.close();
                session.result().cloned().ok_or_else(|| {
                    ScanlinkError::InvalidState("session closed without a result".into())
                })
            }
            .await;
            session.close();
            drop(guard);

            match &result {
                Ok(done) => info!(lines = done.lines, "Session complete"),
                Err(e) => error!(error = %e, "Session failed"),
            }
            sink.deliver(result);
        }
        .instrument(span),
    );
    Some(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanlink_core::types::{GateMode, LanguageSelector};
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn recognizer(reply: &'static [u8]) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut sink = Vec::new();
            socket.read_to_end(&mut sink).await.unwrap();
            socket.write_all(reply).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        port
    }

    fn config_for(port: u16) -> TransferConfig {
        TransferConfig {
            server_host: "127.0.0.1".into(),
            server_port: port,
            ..TransferConfig::default()
        }
    }

    fn payload() -> EncodedPayload {
        EncodedPayload::new(LanguageSelector::English, b"png")
    }

    #[tokio::test]
    async fn delivers_text_and_releases_gate() {
        let port = recognizer(b"recognized\ntext\n").await;
        let gate = Arc::new(ConnectionGate::default());
        let (sink, rx) = OneshotSink::channel();

        let handle = spawn_session(
            Arc::clone(&gate),
            GateRole::Client,
            config_for(port),
            payload(),
            sink,
        )
        .unwrap();
        handle.await.unwrap();

        let result = rx.await.unwrap().unwrap();
        assert_eq!(result.text, "recognized\ntext");
        assert!(!gate.is_active(GateRole::Client));
    }

    #[tokio::test]
    async fn connect_failure_is_delivered_and_releases_gate() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let gate = Arc::new(ConnectionGate::default());
        let (sink, rx) = OneshotSink::channel();
        let handle = spawn_session(
            Arc::clone(&gate),
            GateRole::Client,
            config_for(port),
            payload(),
            sink,
        )
        .unwrap();
        handle.await.unwrap();

        assert!(matches!(rx.await.unwrap(), Err(ScanlinkError::ConnectFailed(_))));
        assert!(!gate.is_active(GateRole::Client));
    }

    #[tokio::test]
    async fn busy_role_is_refused() {
        let gate = Arc::new(ConnectionGate::new(GateMode::Strict));
        assert!(gate.try_acquire(GateRole::Client));

        let (sink, rx) = OneshotSink::channel();
        let handle = spawn_session(
            Arc::clone(&gate),
            GateRole::Client,
            config_for(1),
            payload(),
            sink,
        );
        assert!(handle.is_none());
        // The sink was dropped without a result.
        assert!(rx.await.is_err());
        assert!(gate.is_active(GateRole::Client));
    }

    #[tokio::test]
    async fn closure_sink_is_called_once() {
        let port = recognizer(b"once\n").await;
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);

        let handle = spawn_session(
            Arc::new(ConnectionGate::default()),
            GateRole::Client,
            config_for(port),
            payload(),
            move |result: Result<SessionResult>| {
                seen.lock().unwrap().push(result.map(|r| r.text));
            },
        )
        .unwrap();
        handle.await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].as_deref().ok(), Some("once"));
    }

    #[tokio::test]
    async fn listen_session_receives_pushed_text() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let peer = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"from server\n").await.unwrap();
            socket.shutdown().await.unwrap();
            let mut wire = Vec::new();
            socket.read_to_end(&mut wire).await.unwrap();
            wire
        });

        let gate = Arc::new(ConnectionGate::default());
        let (sink, rx) = OneshotSink::channel();
        let handle = spawn_listen_session(Arc::clone(&gate), config_for(port), sink).unwrap();
        handle.await.unwrap();

        let result = rx.await.unwrap().unwrap();
        assert_eq!(result.text, "from server");
        assert_eq!(result.bytes_sent, 0);
        assert!(peer.await.unwrap().is_empty());
        assert!(!gate.is_active(GateRole::Server));
    }

    #[tokio::test]
    async fn listen_session_uses_server_role() {
        let gate = Arc::new(ConnectionGate::new(GateMode::Strict));
        assert!(gate.try_acquire(GateRole::Server));

        let (sink, rx) = OneshotSink::channel();
        assert!(spawn_listen_session(Arc::clone(&gate), config_for(1), sink).is_none());
        assert!(rx.await.is_err());
        // The client role is untouched.
        assert!(!gate.is_active(GateRole::Client));
    }

    #[tokio::test]
    async fn missing_host_still_releases() {
        let gate = Arc::new(ConnectionGate::default());
        let (sink, rx) = OneshotSink::channel();
        let handle = spawn_session(
            Arc::clone(&gate),
            GateRole::Client,
            TransferConfig::default(),
            payload(),
            sink,
        )
        .unwrap();
        handle.await.unwrap();
        assert!(matches!(rx.await.unwrap(), Err(ScanlinkError::Config(_))));
        assert!(!gate.is_active(GateRole::Client));
    }
}
