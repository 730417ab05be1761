// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanlink-transfer — Hand-off of a prepared page to the remote recognizer.
//
// One raw TCP round trip per page: optional language tag, PNG bytes, then
// text lines until the peer closes. A per-role gate keeps a single session
// in flight, and the runner delivers the outcome from a background task.
// A receive-only mode connects and reads without sending.

pub mod gate;
pub mod payload;
pub mod runner;
pub mod session;

pub use gate::ConnectionGate;
pub use payload::EncodedPayload;
pub use runner::{OneshotSink, ResultSink, spawn_listen_session, spawn_session};
pub use session::{SessionResult, TransferSession};
