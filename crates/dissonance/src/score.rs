use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// A single note record as it appears in the input document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteRecord {
    /// Onset in beats
    pub time: f64,
    pub duration: f64,
    pub pitch: i32,
    pub velocity: i32,
}

impl NoteRecord {
    pub fn end_time(&self) -> f64 {
        self.time + self.duration
    }
}

/// One instrument track: a program number and its notes in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub program: u32,
    pub notes: Vec<NoteRecord>,
}

/// A parsed note-event document (`{"tracks": [...]}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Score {
    pub tracks: Vec<Track>,
}

impl Score {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_slice(json.as_bytes())
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| Error::InvalidInput(format!("not a JSON document: {}", e)))?;
        Self::from_value(&value)
    }

    /// Validate and convert an already-parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let tracks = value
            .get("tracks")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::InvalidInput("document has no 'tracks' array".into()))?;

        let tracks = tracks
            .iter()
            .enumerate()
            .map(|(index, track)| parse_track(index, track))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { tracks })
    }

    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.notes.len()).sum()
    }
}

/// Read and parse a note-event JSON file.
pub fn load_score(path: &Path) -> Result<Score> {
    let bytes = std::fs::read(path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    let score = Score::from_json_slice(&bytes)?;
    tracing::debug!(
        path = %path.display(),
        tracks = score.tracks.len(),
        notes = score.note_count(),
        "loaded score"
    );
    Ok(score)
}

fn parse_track(index: usize, track: &Value) -> Result<Track> {
    let notes = track
        .get("notes")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::MalformedInput(format!("track {} has no 'notes' list", index)))?;

    let program = match track.get("program") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_u64()
            .and_then(|p| u32::try_from(p).ok())
            .ok_or_else(|| {
                Error::MalformedInput(format!("track {} has a non-integer program: {}", index, v))
            })?,
    };

    let notes = notes
        .iter()
        .enumerate()
        .map(|(note_index, note)| parse_note(index, note_index, note))
        .collect::<Result<Vec<_>>>()?;

    Ok(Track { program, notes })
}

fn parse_note(track: usize, index: usize, note: &Value) -> Result<NoteRecord> {
    let missing = |field: &str| {
        Error::MalformedInput(format!(
            "track {} note {} is missing numeric '{}'",
            track, index, field
        ))
    };

    let time = note.get("time").and_then(Value::as_f64).ok_or_else(|| missing("time"))?;
    let duration = note
        .get("duration")
        .and_then(Value::as_f64)
        .ok_or_else(|| missing("duration"))?;
    let pitch = match note.get("pitch") {
        Some(v) if v.is_number() => integral(v).ok_or_else(|| {
            Error::MalformedInput(format!(
                "track {} note {} has non-integer pitch {}",
                track, index, v
            ))
        })?,
        _ => return Err(missing("pitch")),
    };
    let velocity = note.get("velocity").and_then(integral).unwrap_or(0);

    if time < 0.0 || duration < 0.0 {
        return Err(Error::MalformedInput(format!(
            "track {} note {} has negative timing (time={}, duration={})",
            track, index, time, duration
        )));
    }

    Ok(NoteRecord {
        time,
        duration,
        pitch,
        velocity,
    })
}

/// Integer value of a JSON number, accepting whole floats like `60.0`.
fn integral(value: &Value) -> Option<i32> {
    if let Some(i) = value.as_i64() {
        return i32::try_from(i).ok();
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}
