//! Harmonic dissonance analysis over symbolic note events.
//!
//! Tracks of timed notes are flattened into a [`NoteStore`], every pair of
//! co-sounding notes is checked against a set of dissonant intervals, and
//! each distinct (pitch pair, overlap window) event is counted once.

pub mod analyze;
pub mod counter;
pub mod instruments;
pub mod interval;
pub mod note;
pub mod piano_roll;
pub mod profile;
pub mod score;

pub use analyze::{analyze, analyze_file, DissonanceAnalysis};
pub use counter::{count_dissonances, dissonant_events};
pub use instruments::{
    group_by_instrument, read_instrument_table, write_instrument_tables, InstrumentMap,
};
pub use interval::{is_dissonant, DissonantIntervals};
pub use note::{
    Beat, DissonantEvent, ExtractOptions, Note, NoteStore, OverlapWindow, PitchPair, PitchPolicy,
};
pub use piano_roll::{PianoRoll, RollOptions};
pub use profile::AnalysisProfile;
pub use score::{load_score, NoteRecord, Score, Track};

use std::path::PathBuf;

/// Errors from loading and analyzing note-event data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The top-level document is not a track collection.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A track or note record is missing required data.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("cannot read {path}: {source}")]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown analysis profile '{0}' (expected 'wide' or 'pitch-class')")]
    UnknownProfile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The piano roll for these notes would not fit in memory.
    #[error("piano roll too large: {width_beats} beats at {pixels_per_beat} px/beat")]
    ImageTooLarge {
        width_beats: f64,
        pixels_per_beat: u32,
    },

    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
}

pub type Result<T> = std::result::Result<T, Error>;
