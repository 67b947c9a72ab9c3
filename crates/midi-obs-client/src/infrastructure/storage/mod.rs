//! Storage infrastructure: configuration and mapping files.
//!
//! - **`config`** – the TOML application config (`log_level` plus the
//!   `[obs]` connection section).  Missing file means defaults.
//! - **`mapping`** – the JSON note mapping (note key → action).  The user
//!   names this file explicitly, so a missing file is an error.
//!
//! Both are read-only: MIDI-OBS never writes these files back.

pub mod config;
pub mod mapping;

pub use config::{load_config, AppConfig, ConfigError, ObsSection};
pub use mapping::load_action_map;
