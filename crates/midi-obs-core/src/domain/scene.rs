//! OBS scene value object.
//!
//! OBS reports scenes with a `sceneIndex` where 0 is the *bottom* of the
//! scene list in the OBS UI.  Users think of the list top to bottom, so the
//! display order is descending by index.

use serde::{Deserialize, Serialize};

/// One scene as reported by `GetSceneList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(rename = "sceneName")]
    pub name: String,
    /// Server-side stacking position; higher means further up the OBS list.
    #[serde(rename = "sceneIndex")]
    pub index: i64,
}

/// Turns a scene batch into names ordered top-first (descending index).
///
/// The sort is stable, so scenes sharing an index keep their arrival order.
///
/// # Examples
///
/// ```rust
/// use midi_obs_core::domain::scene::{sort_scene_batch, Scene};
///
/// let batch = vec![
///     Scene { name: "A".into(), index: 0 },
///     Scene { name: "B".into(), index: 2 },
///     Scene { name: "C".into(), index: 1 },
/// ];
/// assert_eq!(sort_scene_batch(batch), vec!["B", "C", "A"]);
/// ```
pub fn sort_scene_batch(mut batch: Vec<Scene>) -> Vec<String> {
    batch.sort_by(|a, b| b.index.cmp(&a.index));
    batch.into_iter().map(|scene| scene.name).collect()
}
