//! Per-instrument note tables.
//!
//! Tracks are grouped by the instrument their program number maps to in an
//! encoding file, and each group is written out as a small CSV table that
//! the piano-roll renderer reads back.

use crate::score::{NoteRecord, Score};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

const TABLE_HEADER: &str = "time,pitch,duration,velocity";

/// Program number to instrument name, from an encoding document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstrumentMap {
    names: HashMap<String, String>,
}

impl InstrumentMap {
    pub fn new(names: HashMap<String, String>) -> Self {
        Self { names }
    }

    /// Parse `{"program_instrument_map": {"0": "piano", ...}}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("encoding is not JSON: {}", e)))?;
        let map = value
            .get("program_instrument_map")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                Error::InvalidInput("encoding has no 'program_instrument_map' object".into())
            })?;

        let names = map
            .iter()
            .filter_map(|(program, name)| name.as_str().map(|n| (program.clone(), n.to_string())))
            .collect();
        Ok(Self { names })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Instrument name for a program, `Unknown_<program>` when unmapped.
    pub fn name_for(&self, program: u32) -> String {
        self.names
            .get(&program.to_string())
            .cloned()
            .unwrap_or_else(|| format!("Unknown_{}", program))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Collect notes per instrument; tracks sharing an instrument are concatenated.
pub fn group_by_instrument(
    score: &Score,
    instruments: &InstrumentMap,
) -> BTreeMap<String, Vec<NoteRecord>> {
    let mut groups: BTreeMap<String, Vec<NoteRecord>> = BTreeMap::new();
    for track in &score.tracks {
        groups
            .entry(instruments.name_for(track.program))
            .or_default()
            .extend(track.notes.iter().cloned());
    }
    groups
}

/// Write one `<instrument>.csv` per group into `dir`, creating it if needed.
pub fn write_instrument_tables(
    groups: &BTreeMap<String, Vec<NoteRecord>>,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(groups.len());
    for (name, notes) in groups {
        let path = dir.join(format!("{}.csv", file_stem(name)));
        let mut out = std::io::BufWriter::new(std::fs::File::create(&path)?);
        writeln!(out, "{}", TABLE_HEADER)?;
        for note in notes {
            writeln!(
                out,
                "{},{},{},{}",
                note.time, note.pitch, note.duration, note.velocity
            )?;
        }
        out.flush()?;

        tracing::debug!(instrument = %name, notes = notes.len(), path = %path.display(), "wrote note table");
        written.push(path);
    }
    Ok(written)
}

/// Read a table written by [`write_instrument_tables`].
pub fn read_instrument_table(path: &Path) -> Result<Vec<NoteRecord>> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;

    let mut lines = contents.lines();
    match lines.next() {
        Some(header) if header.trim() == TABLE_HEADER => {}
        _ => {
            return Err(Error::MalformedInput(format!(
                "{}: expected header '{}'",
                path.display(),
                TABLE_HEADER
            )))
        }
    }

    lines
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            parse_row(line).ok_or_else(|| {
                Error::MalformedInput(format!("{}: bad row {}: '{}'", path.display(), i + 2, line))
            })
        })
        .collect()
}

fn parse_row(line: &str) -> Option<NoteRecord> {
    let mut fields = line.split(',').map(str::trim);
    let time = fields.next()?.parse().ok()?;
    let pitch = fields.next()?.parse().ok()?;
    let duration = fields.next()?.parse().ok()?;
    let velocity = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(NoteRecord {
        time,
        duration,
        pitch,
        velocity,
    })
}

/// Instrument names become file names; keep them to a single path component.
pub(crate) fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::Track;
    use pretty_assertions::assert_eq;

    fn note(time: f64, pitch: i32) -> NoteRecord {
        NoteRecord {
            time,
            duration: 1.5,
            pitch,
            velocity: 80,
        }
    }

    fn encoding() -> InstrumentMap {
        InstrumentMap::from_json_str(
            r#"{"program_instrument_map": {"0": "piano", "33": "electric-bass", "40": "violin"}}"#,
        )
        .unwrap()
    }

    #[test]
    fn names_fall_back_to_unknown() {
        let map = encoding();
        assert_eq!(map.len(), 3);
        assert_eq!(map.name_for(33), "electric-bass");
        assert_eq!(map.name_for(99), "Unknown_99");
    }

    #[test]
    fn encoding_without_map_is_invalid() {
        let err = InstrumentMap::from_json_str(r#"{"programs": {}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn tracks_with_same_instrument_are_merged() {
        let score = Score {
            tracks: vec![
                Track { program: 0, notes: vec![note(0.0, 60)] },
                Track { program: 7, notes: vec![note(1.0, 40)] },
                Track { program: 0, notes: vec![note(2.0, 64)] },
            ],
        };

        let groups = group_by_instrument(&score, &encoding());
        assert_eq!(groups.keys().cloned().collect::<Vec<_>>(), vec!["Unknown_7", "piano"]);
        assert_eq!(
            groups["piano"].iter().map(|n| n.pitch).collect::<Vec<_>>(),
            vec![60, 64]
        );
    }

    #[test]
    fn tables_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut groups = BTreeMap::new();
        groups.insert("violin".to_string(), vec![note(0.0, 76), note(2.5, 79)]);

        let written = write_instrument_tables(&groups, &dir.path().join("output")).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("output/violin.csv"));

        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert!(text.starts_with("time,pitch,duration,velocity\n0,76,1.5,80\n"));

        let notes = read_instrument_table(&written[0]).unwrap();
        assert_eq!(notes, groups["violin"]);
    }

    #[test]
    fn table_without_header_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.csv");
        std::fs::write(&path, "0,60,1,1\n").unwrap();
        assert!(matches!(
            read_instrument_table(&path),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn slashes_are_kept_out_of_file_names() {
        assert_eq!(file_stem("strings/ensemble"), "strings_ensemble");
    }
}
