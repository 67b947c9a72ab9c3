//! # midi-obs-core
//!
//! Shared library for MIDI-OBS containing the OBS WebSocket v5 message types
//! and JSON codec, the authentication hash chain, and the pure domain logic
//! that decides which OBS scenes are still free to bind to a MIDI note.
//!
//! This crate has zero dependencies on sockets, async runtimes, or MIDI
//! devices.  Everything here is a plain function or a plain data type, so it
//! can be unit tested without a running OBS instance.
//!
//! # Architecture overview (for beginners)
//!
//! MIDI-OBS lets a MIDI controller drive OBS Studio: each note on the
//! keyboard is mapped to an *action* (switch to a fixed scene, loop through
//! a family of scenes, stop, pause...).  To offer sensible mappings the app
//! needs to know which scenes exist in OBS, and OBS exposes that over its
//! WebSocket server.
//!
//! - **`auth`** – The two-round SHA-256 hash chain OBS uses to prove the
//!   client knows the password without ever sending it.
//!
//! - **`protocol`** – How JSON travels over the socket.  Every frame is an
//!   envelope `{"op": <int>, "d": {...}}`; the codec turns those into typed
//!   [`ObsMessage`] values and back.
//!
//! - **`domain`** – Pure business logic: scene ordering, the note-to-action
//!   model, the scene assignment engine, and note-name formatting.

pub mod auth;
pub mod domain;
pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `midi_obs_core::derive_auth_string` instead of the full module path.
pub use auth::derive_auth_string;
pub use domain::actions::{ActionConfig, ActionMap, LoopAction, LoopStyle, SequenceStep};
pub use domain::assignment::{assigned_scenes, next_unassigned_scene};
pub use domain::note::note_name;
pub use domain::scene::{sort_scene_batch, Scene};
pub use protocol::codec::{decode_message, encode_message, ProtocolError};
pub use protocol::messages::ObsMessage;
