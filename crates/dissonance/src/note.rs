use crate::score::Score;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A point in time, in beats.
///
/// Equality and hashing are structural over the bit pattern so that time
/// values can take part in dedup keys. Negative zero is folded into zero.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct Beat(f64);

impl Beat {
    pub fn new(value: f64) -> Self {
        Self(value + 0.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Beat {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl PartialEq for Beat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Beat {}

impl Hash for Beat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for Beat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl std::fmt::Display for Beat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A note reduced to what the dissonance counter needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Note {
    pub start: Beat,
    pub end: Beat,
    pub pitch: i32,
}

impl Note {
    pub fn new(start: f64, end: f64, pitch: i32) -> Self {
        Self {
            start: Beat::new(start),
            end: Beat::new(end),
            pitch,
        }
    }

    /// Closed-interval overlap: notes that merely touch still overlap.
    pub fn overlaps(&self, other: &Note) -> bool {
        self.start.value() <= other.end.value() && other.start.value() <= self.end.value()
    }

    /// The span during which both notes sound, if any.
    pub fn overlap_window(&self, other: &Note) -> Option<OverlapWindow> {
        if !self.overlaps(other) {
            return None;
        }
        Some(OverlapWindow {
            start: Beat::new(self.start.value().max(other.start.value())),
            end: Beat::new(self.end.value().min(other.end.value())),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OverlapWindow {
    pub start: Beat,
    pub end: Beat,
}

/// Unordered pitch pair, stored low-to-high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PitchPair {
    pub low: i32,
    pub high: i32,
}

impl PitchPair {
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn interval(&self) -> u32 {
        self.low.abs_diff(self.high)
    }
}

/// One counted dissonance: a pitch pair sounding during a window.
///
/// Two note pairs that produce the same event are counted once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DissonantEvent {
    pub pitches: PitchPair,
    pub window: OverlapWindow,
}

/// How pitches are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PitchPolicy {
    /// Input pitch numbers as-is
    #[default]
    Raw,
    /// Pitch modulo 12, collapsing octaves
    PitchClass,
}

impl PitchPolicy {
    pub fn apply(self, pitch: i32) -> i32 {
        match self {
            PitchPolicy::Raw => pitch,
            PitchPolicy::PitchClass => pitch.rem_euclid(12),
        }
    }
}

impl std::fmt::Display for PitchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PitchPolicy::Raw => write!(f, "raw"),
            PitchPolicy::PitchClass => write!(f, "pitch-class"),
        }
    }
}

impl std::str::FromStr for PitchPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "raw" => Ok(PitchPolicy::Raw),
            "pitch-class" | "pitch_class" | "mod12" => Ok(PitchPolicy::PitchClass),
            other => Err(crate::Error::InvalidConfig(format!(
                "unknown pitch policy '{}'",
                other
            ))),
        }
    }
}

/// Filtering and normalization applied while flattening tracks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtractOptions {
    /// Keep only notes starting at or before this beat. `None` keeps all.
    pub time_threshold: Option<f64>,
    pub pitch_policy: PitchPolicy,
}

/// Flat, ordered collection of the notes under analysis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteStore {
    notes: Vec<Note>,
}

impl NoteStore {
    /// Flatten every track in order, dropping late notes and normalizing pitch.
    pub fn extract(score: &Score, options: &ExtractOptions) -> Self {
        let notes = score
            .tracks
            .iter()
            .flat_map(|track| track.notes.iter())
            .filter(|record| options.time_threshold.map_or(true, |t| record.time <= t))
            .map(|record| {
                Note::new(
                    record.time,
                    record.end_time(),
                    options.pitch_policy.apply(record.pitch),
                )
            })
            .collect();

        Self { notes }
    }

    pub fn from_notes(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{NoteRecord, Track};
    use pretty_assertions::assert_eq;

    fn record(time: f64, duration: f64, pitch: i32) -> NoteRecord {
        NoteRecord {
            time,
            duration,
            pitch,
            velocity: 100,
        }
    }

    fn two_track_score() -> Score {
        Score {
            tracks: vec![
                Track {
                    program: 0,
                    notes: vec![record(0.0, 4.0, 60), record(7.0, 1.0, 62)],
                },
                Track {
                    program: 24,
                    notes: vec![record(2.0, 2.0, 73), record(6.0, 1.0, 48)],
                },
            ],
        }
    }

    #[test]
    fn extract_flattens_in_track_order() {
        let store = NoteStore::extract(&two_track_score(), &ExtractOptions::default());
        let pitches: Vec<i32> = store.notes().iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![60, 62, 73, 48]);
        assert_eq!(store.notes()[2], Note::new(2.0, 4.0, 73));
    }

    #[test]
    fn extract_applies_time_threshold_inclusively() {
        let options = ExtractOptions {
            time_threshold: Some(6.0),
            pitch_policy: PitchPolicy::Raw,
        };
        let store = NoteStore::extract(&two_track_score(), &options);
        let pitches: Vec<i32> = store.notes().iter().map(|n| n.pitch).collect();
        // 62 starts at beat 7 and is dropped; 48 starts exactly at 6 and stays
        assert_eq!(pitches, vec![60, 73, 48]);
    }

    #[test]
    fn extract_pitch_class_policy() {
        let options = ExtractOptions {
            time_threshold: None,
            pitch_policy: PitchPolicy::PitchClass,
        };
        let store = NoteStore::extract(&two_track_score(), &options);
        let pitches: Vec<i32> = store.notes().iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![0, 2, 1, 0]);
    }

    #[test]
    fn pitch_class_of_negative_pitch_is_non_negative() {
        assert_eq!(PitchPolicy::PitchClass.apply(-1), 11);
        assert_eq!(PitchPolicy::Raw.apply(-1), -1);
    }

    #[test]
    fn touching_notes_overlap() {
        let a = Note::new(0.0, 4.0, 60);
        let b = Note::new(4.0, 8.0, 61);
        assert!(a.overlaps(&b));
        let window = a.overlap_window(&b).unwrap();
        assert_eq!(window.start, Beat::new(4.0));
        assert_eq!(window.end, Beat::new(4.0));
    }

    #[test]
    fn disjoint_notes_have_no_window() {
        let a = Note::new(0.0, 1.0, 60);
        let b = Note::new(1.5, 2.0, 61);
        assert!(!a.overlaps(&b));
        assert_eq!(b.overlap_window(&a), None);
    }

    #[test]
    fn negative_zero_beat_equals_zero() {
        assert_eq!(Beat::new(-0.0), Beat::new(0.0));
    }

    #[test]
    fn pitch_pair_is_canonical() {
        assert_eq!(PitchPair::new(61, 60), PitchPair::new(60, 61));
        assert_eq!(PitchPair::new(72, 60).interval(), 12);
    }

    #[test]
    fn pitch_policy_parses() {
        assert_eq!("raw".parse::<PitchPolicy>().unwrap(), PitchPolicy::Raw);
        assert_eq!(
            "Pitch-Class".parse::<PitchPolicy>().unwrap(),
            PitchPolicy::PitchClass
        );
        assert!("octave".parse::<PitchPolicy>().is_err());
    }
}
