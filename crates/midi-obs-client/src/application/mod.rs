//! Application layer use cases for the OBS client.
//!
//! Nothing in here touches a socket.  The infrastructure layer owns the
//! transport and calls into these modules to decide what to do.
//!
//! - **`correlator`** – Issues requests with unique ids, tracks them while in
//!   flight, and completes each caller when its response (or a drain, or a
//!   timeout) arrives.  Frames leave through the [`correlator::FrameSink`]
//!   trait so tests can capture them without a network.
//!
//! - **`connection_state`** – The public snapshot (status, error text, scene
//!   list) and every transition the state machine is allowed to make.
//!
//! - **`handshake`** – Builds the `Identify` reply to a server `Hello`.
//!
//! - **`scene_sync`** – Turns a `GetSceneList` response into the ordered
//!   scene list.

pub mod connection_state;
pub mod correlator;
pub mod handshake;
pub mod scene_sync;
