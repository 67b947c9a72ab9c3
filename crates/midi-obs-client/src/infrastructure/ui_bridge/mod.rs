//! Status bridge between the OBS client and a front end.
//!
//! The live [`ObsClient`] state sits behind a `watch` channel and the note
//! mapping is a plain [`ActionMap`]; neither is what a UI wants to render.
//! This module joins the two into serializable snapshots:
//!
//! ```text
//! ObsClient::snapshot() ─┐
//!                        ├──> build_status() ──> ObsStatusDto ──> text / JSON
//! ActionMap ─────────────┘
//! ```
//!
//! # `CommandResult<T>`
//!
//! Every command returns the same envelope so callers have one error path:
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use midi_obs_core::domain::actions::{playback_order, scenes_with_prefix};
use midi_obs_core::domain::note::note_name_for_key;
use midi_obs_core::{next_unassigned_scene, ActionConfig, ActionMap, LoopStyle, SequenceStep};
use serde::{Deserialize, Serialize};

use crate::application::connection_state::{ConnectionSnapshot, ConnectionStatus};
use crate::infrastructure::network::ObsClient;

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Full status snapshot: connection, scenes, and what is still free to map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObsStatusDto {
    pub status: ConnectionStatus,
    /// Empty unless `status` is `Error`.
    pub error: String,
    /// Scenes top-first, each with the notes bound to it.
    pub scenes: Vec<SceneRowDto>,
    /// First scene at or after the requested start index that no note claims.
    pub next_unassigned: Option<String>,
    /// Every loop in the mapping, resolved against the live scene list.
    pub loops: Vec<LoopRowDto>,
}

/// One row of the scene table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneRowDto {
    pub name: String,
    /// Note names (`"C2"`) of every `static` action bound to this scene.
    pub assigned_notes: Vec<String>,
}

/// A `loop` action (or a loop step of a `sequence`) and the scenes it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopRowDto {
    pub note: String,
    pub prefix: String,
    pub style: String,
    /// Time on each scene; `None` when the tempo is unusable.
    pub tick_ms: Option<u64>,
    /// Matching scenes in the order the loop visits them.
    pub scenes: Vec<String>,
}

/// Unified response wrapper for bridge commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    /// `true` if the command completed successfully; `false` on error.
    pub success: bool,
    /// The command's return value, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    /// Constructs a successful result containing `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Constructs an error result containing the given message.
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Joins a connection snapshot with the note mapping.
pub fn build_status(snapshot: &ConnectionSnapshot, entries: &ActionMap, start_idx: usize) -> ObsStatusDto {
    let mut notes_by_scene: HashMap<&str, Vec<String>> = HashMap::new();
    let mut loops = Vec::new();
    for (key, action) in entries {
        let label = note_label(key);
        match action {
            ActionConfig::Static { scene } => {
                notes_by_scene.entry(scene.as_str()).or_default().push(label);
            }
            ActionConfig::Loop(l) => {
                loops.push(loop_row(&label, &l.prefix, l.style, l.tick(), &snapshot.scenes));
            }
            ActionConfig::Sequence { steps } => {
                for step in steps {
                    if let SequenceStep::Loop(l) = step {
                        loops.push(loop_row(&label, &l.prefix, l.style, l.tick(), &snapshot.scenes));
                    }
                }
            }
            ActionConfig::Stop | ActionConfig::Pause { .. } => {}
        }
    }

    let scenes = snapshot
        .scenes
        .iter()
        .map(|name| SceneRowDto {
            name: name.clone(),
            assigned_notes: notes_by_scene.remove(name.as_str()).unwrap_or_default(),
        })
        .collect();

    ObsStatusDto {
        status: snapshot.status,
        error: snapshot.error.clone(),
        scenes,
        next_unassigned: next_unassigned_scene(&snapshot.scenes, entries, start_idx)
            .map(str::to_string),
        loops,
    }
}

fn note_label(key: &str) -> String {
    note_name_for_key(key).unwrap_or_else(|| key.to_string())
}

fn loop_row(
    note: &str,
    prefix: &str,
    style: LoopStyle,
    tick: Option<Duration>,
    scenes: &[String],
) -> LoopRowDto {
    let matching = scenes_with_prefix(prefix, scenes);
    LoopRowDto {
        note: note.to_string(),
        prefix: prefix.to_string(),
        style: style.as_str().to_string(),
        tick_ms: tick.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
        scenes: playback_order(style, &matching)
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Current status of `client`, or its error text if the connection failed.
pub fn get_obs_status(
    client: &ObsClient,
    entries: &ActionMap,
    start_idx: usize,
) -> CommandResult<ObsStatusDto> {
    let snapshot = client.snapshot();
    if snapshot.status == ConnectionStatus::Error {
        return CommandResult::err(snapshot.error);
    }
    CommandResult::ok(build_status(&snapshot, entries, start_idx))
}

/// Re-fetches the scene list and returns it.
pub async fn refresh_scene_list(client: &ObsClient) -> CommandResult<Vec<String>> {
    if client.status() != ConnectionStatus::Connected {
        return CommandResult::err("not connected to OBS");
    }
    if client.refresh_scenes().await {
        CommandResult::ok(client.scenes())
    } else {
        CommandResult::err("could not refresh the scene list; keeping the previous one")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::network::ObsClientConfig;

    fn connected_with(scenes: &[&str]) -> ConnectionSnapshot {
        let mut snapshot = ConnectionSnapshot::default();
        let generation = snapshot.begin_connect();
        snapshot.identified(generation);
        snapshot.publish_scenes(generation, scenes.iter().map(|s| s.to_string()).collect());
        snapshot
    }

    fn mapping(pairs: &[(&str, &str)]) -> ActionMap {
        pairs
            .iter()
            .map(|(key, scene)| {
                (
                    key.to_string(),
                    ActionConfig::Static {
                        scene: scene.to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_build_status_lists_assigned_notes_per_scene() {
        // Arrange
        let snapshot = connected_with(&["Intro", "Main", "Outro"]);
        let entries = mapping(&[("60", "Intro"), ("61", "Intro"), ("72", "Outro")]);

        // Act
        let dto = build_status(&snapshot, &entries, 0);

        // Assert
        assert_eq!(dto.status, ConnectionStatus::Connected);
        assert_eq!(dto.scenes[0].assigned_notes, vec!["C4", "C#4"]);
        assert!(dto.scenes[1].assigned_notes.is_empty());
        assert_eq!(dto.scenes[2].assigned_notes, vec!["C5"]);
        assert_eq!(dto.next_unassigned.as_deref(), Some("Main"));
    }

    #[test]
    fn test_build_status_keeps_non_numeric_keys_verbatim() {
        let snapshot = connected_with(&["Intro"]);
        let entries = mapping(&[("pad-1", "Intro")]);

        let dto = build_status(&snapshot, &entries, 0);

        assert_eq!(dto.scenes[0].assigned_notes, vec!["pad-1"]);
        assert_eq!(dto.next_unassigned, None);
    }

    #[test]
    fn test_build_status_resolves_loops_against_live_scenes() {
        // Arrange
        let snapshot = connected_with(&["LOOP_10", "Main", "LOOP_2", "LOOP_1"]);
        let mut entries = ActionMap::new();
        entries.insert(
            "48".to_string(),
            serde_json::from_value(serde_json::json!({
                "action": "loop", "prefix": "LOOP_", "style": "bounce", "bpm": 120, "steps": 2
            }))
            .unwrap(),
        );

        // Act
        let dto = build_status(&snapshot, &entries, 0);

        // Assert
        assert_eq!(dto.loops.len(), 1);
        let row = &dto.loops[0];
        assert_eq!(row.note, "C3");
        assert_eq!(row.style, "bounce");
        assert_eq!(row.tick_ms, Some(1000));
        assert_eq!(row.scenes, vec!["LOOP_1", "LOOP_2", "LOOP_10", "LOOP_2"]);
        // Loops claim no scene for the assignment engine.
        assert_eq!(dto.next_unassigned.as_deref(), Some("LOOP_10"));
    }

    #[test]
    fn test_build_status_lists_loop_steps_inside_sequences() {
        let snapshot = connected_with(&["S_b", "S_a", "Other"]);
        let mut entries = ActionMap::new();
        entries.insert(
            "60".to_string(),
            serde_json::from_value(serde_json::json!({
                "action": "sequence",
                "steps": [
                    {"action": "static", "scene": "Other"},
                    {"action": "loop", "prefix": "S_", "style": "reverse", "bpm": 0, "steps": 1, "repeats": 2}
                ]
            }))
            .unwrap(),
        );

        let dto = build_status(&snapshot, &entries, 0);

        assert_eq!(dto.loops.len(), 1);
        assert_eq!(dto.loops[0].note, "C4");
        assert_eq!(dto.loops[0].tick_ms, None);
        assert_eq!(dto.loops[0].scenes, vec!["S_b", "S_a"]);
    }

    #[test]
    fn test_build_status_start_index_past_end_has_no_suggestion() {
        let snapshot = connected_with(&["A", "B"]);

        let dto = build_status(&snapshot, &ActionMap::new(), 2);

        assert_eq!(dto.next_unassigned, None);
    }

    #[test]
    fn test_get_obs_status_reports_error_text() {
        // Arrange – connecting outside a runtime fails immediately
        let client = ObsClient::new(ObsClientConfig::default());
        client.connect("localhost", 4455);

        // Act
        let result = get_obs_status(&client, &ActionMap::new(), 0);

        // Assert
        assert!(!result.success);
        assert!(result.error.unwrap().contains("localhost:4455"));
    }

    #[test]
    fn test_get_obs_status_disconnected_is_ok_and_empty() {
        let client = ObsClient::new(ObsClientConfig::default());

        let result = get_obs_status(&client, &ActionMap::new(), 0);

        assert!(result.success);
        let dto = result.data.unwrap();
        assert_eq!(dto.status, ConnectionStatus::Disconnected);
        assert!(dto.scenes.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_scene_list_requires_connection() {
        let client = ObsClient::new(ObsClientConfig::default());

        let result = refresh_scene_list(&client).await;

        assert!(!result.success);
    }

    #[test]
    fn test_status_dto_serializes_status_as_variant_name() {
        let dto = build_status(&ConnectionSnapshot::default(), &ActionMap::new(), 0);

        let json = serde_json::to_value(&dto).unwrap();

        assert_eq!(json["status"], "Disconnected");
        assert_eq!(json["next_unassigned"], serde_json::Value::Null);
    }

    #[test]
    fn test_command_result_err_sets_success_false() {
        let r: CommandResult<u32> = CommandResult::err("oops");
        assert!(!r.success);
        assert!(r.data.is_none());
        assert_eq!(r.error.unwrap(), "oops");
    }
}
