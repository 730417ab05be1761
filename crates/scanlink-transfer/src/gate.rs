// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Connection gate — at most one session in flight per role.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use scanlink_core::types::{GateMode, GateRole};

/// One "session active" flag per role, shared behind an `Arc`.
///
/// In `Strict` mode acquisition is a compare-and-swap. In `Legacy` mode it
/// only checks the flag, which is raised later by [`mark_connected`]; two
/// callers that both acquire before either connects will both succeed.
///
/// [`mark_connected`]: ConnectionGate::mark_connected
#[derive(Debug, Default)]
pub struct ConnectionGate {
    mode: GateMode,
    client: AtomicBool,
    server: AtomicBool,
}

impl ConnectionGate {
    pub fn new(mode: GateMode) -> Self {
        Self {
            mode,
            client: AtomicBool::new(false),
            server: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> GateMode {
        self.mode
    }

    pub fn try_acquire(&self, role: GateRole) -> bool {
        let flag = self.flag(role);
        let acquired = match self.mode {
            GateMode::Strict => flag
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
            GateMode::Legacy => !flag.load(Ordering::Acquire),
        };
        debug!(%role, mode = ?self.mode, acquired, "Gate acquire");
        acquired
    }

    /// Raise the flag once the session's socket is up.
    pub fn mark_connected(&self, role: GateRole) {
        self.flag(role).store(true, Ordering::Release);
    }

    pub fn release(&self, role: GateRole) {
        self.flag(role).store(false, Ordering::Release);
        debug!(%role, "Gate released");
    }

    pub fn is_active(&self, role: GateRole) -> bool {
        self.flag(role).load(Ordering::Acquire)
    }

    fn flag(&self, role: GateRole) -> &AtomicBool {
        match role {
            GateRole::Client => &self.client,
            GateRole::Server => &self.server,
        }
    }
}

/// Releases its role when dropped, whichever way the session ends.
#[derive(Debug)]
pub struct GateGuard {
    gate: Arc<ConnectionGate>,
    role: GateRole,
}

impl GateGuard {
    /// Wrap a role that has already been acquired.
    pub fn new(gate: Arc<ConnectionGate>, role: GateRole) -> Self {
        Self { gate, role }
    }

    pub fn mark_connected(&self) {
        self.gate.mark_connected(self.role);
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.gate.release(self.role);
    }
}
