//! midi-obs-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does midi-obs-client do? (for beginners)
//!
//! OBS Studio runs a WebSocket server (default port 4455).  This crate is the
//! *client* side of that conversation:
//!
//! 1. Opens the socket and waits for the server's `Hello`.
//! 2. Answers with `Identify`, including a hashed proof of the password when
//!    OBS asks for one.
//! 3. Once OBS replies `Identified`, asks for the scene list and publishes it
//!    (top scene first) for the rest of the app.
//! 4. Lets any number of callers send further requests concurrently and
//!    matches each response to its caller by request id.
//!
//! Everything the UI needs (status, error text, scene list) is readable
//! through [`infrastructure::network::ObsClient`] accessors or a `watch`
//! subscription; nothing outside the client ever writes that state.

/// Application layer: request correlation, connection state, handshake rules.
pub mod application;

/// Infrastructure layer: WebSocket client, file storage, and status bridge.
pub mod infrastructure;
