//! Note-to-action mapping model.
//!
//! A mapping file is a JSON object whose keys are note identifiers (normally
//! the MIDI note number as a string, `"48"`) and whose values are actions
//! tagged by an `"action"` field:
//!
//! ```json
//! {
//!   "36": {"action": "static", "scene": "Intro"},
//!   "37": {"action": "loop", "prefix": "LOOP_A_", "style": "bounce", "bpm": 120, "steps": 4},
//!   "38": {"action": "stop"},
//!   "39": {"action": "pause", "resume_note": 40},
//!   "41": {"action": "sequence", "steps": [
//!     {"action": "loop", "prefix": "LOOP_A_", "style": "cycle", "bpm": 120, "steps": 4, "repeats": 3},
//!     {"action": "static", "scene": "Outro"}
//!   ]}
//! }
//! ```
//!
//! The scene assignment engine only cares about `static` actions; the loop
//! helpers at the bottom of this module describe how a `loop` action walks
//! through its scenes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Note identifier → action.  Keys are unique by construction.
pub type ActionMap = BTreeMap<String, ActionConfig>;

/// What a single MIDI note does when pressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionConfig {
    /// Switch to one fixed scene.  Older mapping files call this `kill`.
    #[serde(alias = "kill")]
    Static { scene: String },
    /// Cycle through every scene whose name starts with a prefix.
    Loop(LoopAction),
    /// Stop whatever loop or sequence is running.
    Stop,
    /// Freeze the running loop, optionally resuming on another note.
    Pause {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resume_note: Option<u8>,
    },
    /// Run a list of steps one after another.
    Sequence { steps: Vec<SequenceStep> },
}

impl ActionConfig {
    /// Scene bound by a `static` action; `None` for every other kind.
    pub fn static_scene(&self) -> Option<&str> {
        match self {
            ActionConfig::Static { scene } => Some(scene),
            _ => None,
        }
    }

    /// The `"action"` tag value, for display.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionConfig::Static { .. } => "static",
            ActionConfig::Loop(_) => "loop",
            ActionConfig::Stop => "stop",
            ActionConfig::Pause { .. } => "pause",
            ActionConfig::Sequence { .. } => "sequence",
        }
    }
}

/// Parameters of a `loop` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopAction {
    pub prefix: String,
    #[serde(default)]
    pub style: LoopStyle,
    pub bpm: f64,
    /// Beats held on each scene.
    pub steps: f64,
    /// Number of passes before stopping; endless when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeats: Option<u32>,
}

impl LoopAction {
    /// Time spent on each scene before switching.
    pub fn tick(&self) -> Option<Duration> {
        tick_duration(self.bpm, self.steps)
    }
}

/// One step of a `sequence` action.
///
/// Loops inside a sequence must say how many passes to make, otherwise the
/// sequence would never advance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SequenceStep {
    Loop(SequenceLoop),
    #[serde(alias = "kill")]
    Static { scene: String },
    Stop,
    Pause {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resume_note: Option<u8>,
    },
}

/// A `loop` step inside a sequence (`repeats` is required).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceLoop {
    pub prefix: String,
    #[serde(default)]
    pub style: LoopStyle,
    pub bpm: f64,
    pub steps: f64,
    pub repeats: u32,
}

impl SequenceLoop {
    /// Time spent on each scene before switching.
    pub fn tick(&self) -> Option<Duration> {
        tick_duration(self.bpm, self.steps)
    }
}

/// How a loop walks through its scenes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStyle {
    /// In order, wrapping around.
    #[default]
    Cycle,
    /// Forward then backward without repeating the end scenes.
    Bounce,
    /// In reverse order, wrapping around.
    Reverse,
    /// In order, a single pass.
    Once,
    /// Uniformly random each tick.
    Random,
    /// Random, but never the same scene twice in a row.
    RandomNoRepeat,
    /// Alternate between the first and last scene.
    Strobe,
    /// Shuffled order, reshuffled every pass.
    Shuffle,
}

impl LoopStyle {
    /// Wire name of the style.
    pub fn as_str(self) -> &'static str {
        match self {
            LoopStyle::Cycle => "cycle",
            LoopStyle::Bounce => "bounce",
            LoopStyle::Reverse => "reverse",
            LoopStyle::Once => "once",
            LoopStyle::Random => "random",
            LoopStyle::RandomNoRepeat => "random_no_repeat",
            LoopStyle::Strobe => "strobe",
            LoopStyle::Shuffle => "shuffle",
        }
    }
}

// ── Loop helpers ──────────────────────────────────────────────────────────────

/// Seconds per scene switch: `60 / bpm * steps`.
///
/// Returns `None` when `bpm` is not a positive finite number or `steps` is
/// negative, since no meaningful tick exists.
pub fn tick_duration(bpm: f64, steps: f64) -> Option<Duration> {
    if !(bpm.is_finite() && bpm > 0.0 && steps.is_finite() && steps >= 0.0) {
        return None;
    }
    Duration::try_from_secs_f64(60.0 / bpm * steps).ok()
}

/// Scene names starting with `prefix`, in natural order (`S_2` before `S_10`).
pub fn scenes_with_prefix<'a, S: AsRef<str>>(prefix: &str, scenes: &'a [S]) -> Vec<&'a str> {
    let mut matching: Vec<&str> = scenes
        .iter()
        .map(|scene| scene.as_ref())
        .filter(|name| name.starts_with(prefix))
        .collect();
    matching.sort_by_cached_key(|name| natural_key(name));
    matching
}

/// Compares two strings treating embedded digit runs as numbers and the rest
/// case-insensitively.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

/// Order in which a loop visits `scenes` on one pass.
///
/// The randomised styles (`random`, `random_no_repeat`, `shuffle`) choose
/// their order while playing, so they return the scenes unchanged here.
pub fn playback_order<T: Clone>(style: LoopStyle, scenes: &[T]) -> Vec<T> {
    match style {
        LoopStyle::Bounce if scenes.len() > 2 => scenes
            .iter()
            .chain(scenes[1..scenes.len() - 1].iter().rev())
            .cloned()
            .collect(),
        LoopStyle::Reverse => scenes.iter().rev().cloned().collect(),
        LoopStyle::Strobe if scenes.len() >= 2 => {
            vec![scenes[0].clone(), scenes[scenes.len() - 1].clone()]
        }
        _ => scenes.to_vec(),
    }
}

/// Alternating text / number segments.  Text always comes first (possibly
/// empty) so two keys line up segment by segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum NaturalChunk {
    Text(String),
    /// Digit count without leading zeros, then the digits.
    Number(usize, String),
}

fn natural_key(s: &str) -> Vec<NaturalChunk> {
    let mut chunks = Vec::new();
    let mut text = String::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if !c.is_ascii_digit() {
            text.extend(c.to_lowercase());
            continue;
        }
        chunks.push(NaturalChunk::Text(std::mem::take(&mut text)));
        let mut digits = String::from(c);
        while let Some(&next) = chars.peek() {
            if !next.is_ascii_digit() {
                break;
            }
            digits.push(next);
            chars.next();
        }
        let trimmed = digits.trim_start_matches('0').to_string();
        chunks.push(NaturalChunk::Number(trimmed.len(), trimmed));
    }
    chunks.push(NaturalChunk::Text(text));
    chunks
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_static_action_parses_from_tagged_json() {
        // Arrange
        let value = json!({"action": "static", "scene": "Intro"});

        // Act
        let action: ActionConfig = serde_json::from_value(value).unwrap();

        // Assert
        assert_eq!(
            action,
            ActionConfig::Static {
                scene: "Intro".to_string()
            }
        );
        assert_eq!(action.static_scene(), Some("Intro"));
    }

    #[test]
    fn test_kill_alias_parses_as_static() {
        let action: ActionConfig =
            serde_json::from_value(json!({"action": "kill", "scene": "Black"})).unwrap();

        assert_eq!(action.static_scene(), Some("Black"));
        assert_eq!(action.kind(), "static");
    }

    #[test]
    fn test_loop_action_defaults_style_and_repeats() {
        let action: ActionConfig = serde_json::from_value(
            json!({"action": "loop", "prefix": "LOOP_A_", "bpm": 120, "steps": 4}),
        )
        .unwrap();

        let ActionConfig::Loop(lp) = action else {
            panic!("expected loop action");
        };
        assert_eq!(lp.style, LoopStyle::Cycle);
        assert_eq!(lp.repeats, None);
        assert_eq!(lp.tick(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_every_loop_style_name_parses() {
        for name in [
            "cycle",
            "bounce",
            "reverse",
            "once",
            "random",
            "random_no_repeat",
            "strobe",
            "shuffle",
        ] {
            let style: LoopStyle = serde_json::from_value(json!(name)).unwrap();
            assert_eq!(style.as_str(), name);
        }
    }

    #[test]
    fn test_sequence_loop_step_requires_repeats() {
        let missing = serde_json::from_value::<ActionConfig>(json!({
            "action": "sequence",
            "steps": [{"action": "loop", "prefix": "L_", "style": "cycle", "bpm": 120, "steps": 4}]
        }));

        assert!(missing.is_err(), "loop step without repeats must be rejected");
    }

    #[test]
    fn test_sequence_with_mixed_steps_parses() {
        let action: ActionConfig = serde_json::from_value(json!({
            "action": "sequence",
            "steps": [
                {"action": "loop", "prefix": "L_", "style": "bounce", "bpm": 120, "steps": 2, "repeats": 2},
                {"action": "static", "scene": "Outro"},
                {"action": "pause"},
                {"action": "stop"}
            ]
        }))
        .unwrap();

        let ActionConfig::Sequence { steps } = action else {
            panic!("expected sequence action");
        };
        assert_eq!(steps.len(), 4);
        assert!(matches!(&steps[0], SequenceStep::Loop(lp) if lp.repeats == 2));
        assert_eq!(steps[2], SequenceStep::Pause { resume_note: None });
    }

    #[test]
    fn test_pause_serializes_without_resume_note_when_absent() {
        let json = serde_json::to_value(ActionConfig::Pause { resume_note: None }).unwrap();

        assert_eq!(json, json!({"action": "pause"}));
    }

    #[test]
    fn test_unknown_action_tag_is_rejected() {
        assert!(serde_json::from_value::<ActionConfig>(json!({"action": "explode"})).is_err());
    }

    #[test]
    fn test_tick_duration_matches_bpm_and_steps() {
        assert_eq!(tick_duration(120.0, 4.0), Some(Duration::from_secs(2)));
        assert_eq!(tick_duration(60.0, 1.0), Some(Duration::from_secs(1)));
        assert_eq!(tick_duration(240.0, 0.5), Some(Duration::from_millis(125)));
    }

    #[test]
    fn test_tick_duration_rejects_non_positive_bpm() {
        assert_eq!(tick_duration(0.0, 4.0), None);
        assert_eq!(tick_duration(-10.0, 4.0), None);
        assert_eq!(tick_duration(f64::NAN, 4.0), None);
    }

    #[test]
    fn test_scenes_with_prefix_uses_natural_order() {
        // Arrange
        let scenes = ["LOOP_A_10", "Intro", "LOOP_A_2", "loop_a_3", "LOOP_A_1"];

        // Act
        let matching = scenes_with_prefix("LOOP_A_", &scenes);

        // Assert – prefix match is case-sensitive, ordering is numeric
        assert_eq!(matching, vec!["LOOP_A_1", "LOOP_A_2", "LOOP_A_10"]);
    }

    #[test]
    fn test_natural_cmp_ignores_case_and_leading_zeros() {
        assert_eq!(natural_cmp("Scene 2", "scene 10"), Ordering::Less);
        assert_eq!(natural_cmp("take007", "TAKE7"), Ordering::Equal);
        assert_eq!(natural_cmp("b", "a10"), Ordering::Greater);
    }

    #[test]
    fn test_playback_order_bounce_does_not_repeat_ends() {
        assert_eq!(
            playback_order(LoopStyle::Bounce, &["a", "b", "c", "d"]),
            vec!["a", "b", "c", "d", "c", "b"]
        );
        assert_eq!(playback_order(LoopStyle::Bounce, &["a", "b"]), vec!["a", "b"]);
    }

    #[test]
    fn test_playback_order_reverse_and_strobe() {
        assert_eq!(playback_order(LoopStyle::Reverse, &[1, 2, 3]), vec![3, 2, 1]);
        assert_eq!(playback_order(LoopStyle::Strobe, &[1, 2, 3]), vec![1, 3]);
        assert_eq!(playback_order(LoopStyle::Strobe, &[1]), vec![1]);
    }

    #[test]
    fn test_playback_order_other_styles_keep_order() {
        for style in [LoopStyle::Cycle, LoopStyle::Once, LoopStyle::Random, LoopStyle::Shuffle] {
            assert_eq!(playback_order(style, &["x", "y", "z"]), vec!["x", "y", "z"]);
        }
    }
}
