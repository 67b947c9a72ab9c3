//! Scene assignment engine.
//!
//! Answers two questions for the note-mapping UI:
//!
//! 1. Which scenes are already bound to a note by a `static` action?
//! 2. Walking the scene list from some position, which is the first scene
//!    nobody has claimed yet?
//!
//! Both are pure lookups over borrowed inputs.  Nothing is cached between
//! calls, so calling them repeatedly with the same inputs always gives the
//! same answer.
//!
//! ```text
//! scenes:   [ Intro, Main, Break, Outro ]
//! entries:  { "36": static Intro, "37": loop LOOP_A_, "38": static Break }
//!
//! assigned_scenes(entries)            -> { Intro, Break }
//! next_unassigned_scene(.., start 0)  -> Main
//! next_unassigned_scene(.., start 2)  -> Outro
//! ```

use std::collections::HashSet;

use crate::domain::actions::ActionMap;

/// Scene names claimed by `static` actions.  Other action kinds claim nothing.
pub fn assigned_scenes(entries: &ActionMap) -> HashSet<&str> {
    entries
        .values()
        .filter_map(|action| action.static_scene())
        .collect()
}

/// First scene at or after `start_idx` that no `static` action claims.
///
/// Returns `None` when `scenes` is empty, when `start_idx` is at or past the
/// end, or when every remaining scene is already assigned.
pub fn next_unassigned_scene<'s, S: AsRef<str>>(
    scenes: &'s [S],
    entries: &ActionMap,
    start_idx: usize,
) -> Option<&'s str> {
    let assigned = assigned_scenes(entries);
    scenes
        .get(start_idx..)?
        .iter()
        .map(|scene| scene.as_ref())
        .find(|name| !assigned.contains(name))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
