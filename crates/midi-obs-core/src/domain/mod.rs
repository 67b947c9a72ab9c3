//! Domain entities for MIDI-OBS.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What lives here? (for beginners)
//!
//! Clean Architecture keeps the core rules of an application in an innermost
//! **domain** layer that never imports network, OS, or UI code.  For MIDI-OBS
//! those rules are:
//!
//! - how a batch of OBS scenes is ordered for display (`scene`),
//! - what a MIDI note can be mapped to (`actions`),
//! - which scenes are already claimed by a note and which one to suggest next
//!   (`assignment`),
//! - how a MIDI note number is shown to a human (`note`).
//!
//! The WebSocket client in `midi-obs-client` depends on this module; this
//! module depends on nothing but `serde`.

/// Note-to-action mapping model and loop helpers.
pub mod actions;

/// Scene assignment engine.
pub mod assignment;

/// MIDI note-number formatting.
pub mod note;

/// OBS scene value object and display ordering.
pub mod scene;
