//! JSON note mapping.
//!
//! ```json
//! {
//!   "36": { "action": "static", "scene": "Intro" },
//!   "37": { "action": "loop", "prefix": "LOOP_A_", "bpm": 120, "steps": 4 },
//!   "38": { "action": "stop" }
//! }
//! ```

use std::path::Path;

use midi_obs_core::ActionMap;
use tracing::debug;

use super::config::ConfigError;

/// Reads the note mapping at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read (including when it
/// does not exist) and [`ConfigError::Mapping`] if it is not a valid mapping.
pub fn load_action_map(path: &Path) -> Result<ActionMap, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let map: ActionMap = serde_json::from_str(&content).map_err(|source| ConfigError::Mapping {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("loaded {} note mapping(s) from {}", map.len(), path.display());
    Ok(map)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use midi_obs_core::ActionConfig;

    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("midi-obs-{}-{name}", std::process::id()));
        std::fs::write(&path, content).expect("write temp mapping");
        path
    }

    #[test]
    fn test_load_action_map_reads_static_and_kill_entries() {
        // Arrange
        let path = temp_file(
            "mapping.json",
            r#"{
                "36": {"action": "static", "scene": "Intro"},
                "37": {"action": "kill", "scene": "Black"},
                "38": {"action": "stop"}
            }"#,
        );

        // Act
        let map = load_action_map(&path).expect("load");
        std::fs::remove_file(&path).ok();

        // Assert
        assert_eq!(map.len(), 3);
        assert_eq!(map["36"].static_scene(), Some("Intro"));
        assert_eq!(map["37"].static_scene(), Some("Black"));
        assert_eq!(map["38"], ActionConfig::Stop);
    }

    #[test]
    fn test_load_action_map_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("midi-obs-no-such-mapping.json");

        assert!(matches!(load_action_map(&path), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_action_map_unknown_action_is_mapping_error() {
        let path = temp_file("bad-mapping.json", r#"{"36": {"action": "explode"}}"#);

        let result = load_action_map(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ConfigError::Mapping { .. })));
    }
}
