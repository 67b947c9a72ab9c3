//! MIDI note-number formatting.
//!
//! Uses the convention where middle C (note 60) is `C4`, so note 0 is `C-1`
//! and note 127 is `G9`.

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Pitch class of a note, e.g. `"C#"` for 49.
pub fn pitch_class(note: u8) -> &'static str {
    PITCH_CLASSES[usize::from(note % 12)]
}

/// Octave number of a note, e.g. `4` for 60.
pub fn octave(note: u8) -> i8 {
    // note / 12 is at most 21, so the cast cannot truncate.
    (note / 12) as i8 - 1
}

/// Human-readable name of a MIDI note number.
///
/// # Examples
///
/// ```rust
/// use midi_obs_core::note_name;
///
/// assert_eq!(note_name(60), "C4");
/// assert_eq!(note_name(49), "C#3");
/// ```
pub fn note_name(note: u8) -> String {
    format!("{}{}", pitch_class(note), octave(note))
}

/// Formats a mapping key such as `"48"` as a note name.
///
/// Returns `None` for keys that are not a note number in `0..=255`.
pub fn note_name_for_key(key: &str) -> Option<String> {
    key.trim().parse::<u8>().ok().map(note_name)
}
