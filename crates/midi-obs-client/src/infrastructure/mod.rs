//! Infrastructure layer for the MIDI-OBS client.
//!
//! Contains the adapters that touch the outside world: the WebSocket
//! connection to OBS, configuration and mapping files on disk, and the
//! status DTOs handed to whatever front end displays them.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `midi_obs_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`network`** – [`network::ObsClient`]: opens the socket, runs the
//!   handshake, routes responses to the correlator, and publishes the
//!   connection state and scene list.
//!
//! - **`storage`** – TOML application config and the JSON note mapping.
//!
//! - **`ui_bridge`** – Serializable status snapshots combining the live
//!   scene list with the note mapping.

pub mod network;
pub mod storage;
pub mod ui_bridge;
