//! Public connection state and the transitions allowed on it.
//!
//! ```text
//!                connect()
//!  Disconnected ───────────> Connecting ──Identified──> Connected
//!       ^                        │                          │
//!       │        close           │ transport error          │ transport error
//!       ├────────────────────────┼──────────────┐           │
//!       │                        v              v           v
//!       │                      Error <──────────────────────┘
//!       │                        │
//!       └──── disconnect() ──────┘   (close keeps Error; only connect /
//!                                     disconnect clear it)
//! ```
//!
//! Each `connect` and `disconnect` starts a new *generation*.  Tasks that
//! belong to an older session carry their generation number with every
//! update, and updates from a stale generation are ignored.  That keeps a
//! slow reactor from an abandoned socket from overwriting the state of the
//! connection that replaced it.

use serde::{Deserialize, Serialize};

/// Connection status as seen by the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// No connection and none being attempted.
    #[default]
    Disconnected,
    /// Socket opening or handshake in progress.
    Connecting,
    /// `Identified` received; requests may be sent.
    Connected,
    /// The last attempt or connection failed; see the error text.
    Error,
}

/// Everything a reader can observe about the connection, updated atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSnapshot {
    pub status: ConnectionStatus,
    /// Human-readable reason for the `Error` status; empty otherwise.
    pub error: String,
    /// Scene names, top of the OBS list first.
    pub scenes: Vec<String>,
    generation: u64,
}

impl ConnectionSnapshot {
    /// Generation of the session this snapshot belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Starts a new session: `Connecting`, no error, no scenes.
    ///
    /// Returns the generation the new session must tag its updates with.
    pub(crate) fn begin_connect(&mut self) -> u64 {
        self.generation += 1;
        self.status = ConnectionStatus::Connecting;
        self.error.clear();
        self.scenes.clear();
        self.generation
    }

    /// Records a failure of the session's transport.
    pub(crate) fn fail(&mut self, generation: u64, message: String) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.status = ConnectionStatus::Error;
        self.error = message;
        true
    }

    /// Handshake finished.
    pub(crate) fn identified(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) || self.status != ConnectionStatus::Connecting {
            return false;
        }
        self.status = ConnectionStatus::Connected;
        true
    }

    /// Replaces the scene list wholesale.
    ///
    /// Ignored unless the session is current and still `Connected`, so a
    /// refresh that finishes after a close cannot resurrect a stale list.
    pub(crate) fn publish_scenes(&mut self, generation: u64, scenes: Vec<String>) -> bool {
        if !self.is_current(generation) || self.status != ConnectionStatus::Connected {
            return false;
        }
        self.scenes = scenes;
        true
    }

    /// The session's transport closed.  `Error` survives a close.
    pub(crate) fn closed(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        if self.status != ConnectionStatus::Error {
            self.status = ConnectionStatus::Disconnected;
        }
        self.scenes.clear();
        true
    }

    /// Explicit local disconnect: back to a clean `Disconnected`.
    pub(crate) fn reset(&mut self) {
        self.generation += 1;
        self.status = ConnectionStatus::Disconnected;
        self.error.clear();
        self.scenes.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
