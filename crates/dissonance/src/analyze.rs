use crate::counter::dissonant_events;
use crate::note::{DissonantEvent, NoteStore};
use crate::profile::AnalysisProfile;
use crate::score::{load_score, Score};
use crate::Result;
use serde::Serialize;
use std::path::Path;

/// Result of one analysis run over one score.
#[derive(Debug, Clone, Serialize)]
pub struct DissonanceAnalysis {
    pub profile: AnalysisProfile,
    /// Notes left after the time-window filter
    pub notes_considered: usize,
    pub notes_total: usize,
    pub count: usize,
    pub events: Vec<DissonantEvent>,
}

/// Count dissonances in an already-loaded score.
pub fn analyze(score: &Score, profile: &AnalysisProfile) -> DissonanceAnalysis {
    let store = NoteStore::extract(score, &profile.extract_options());
    tracing::debug!(
        profile = %profile.name,
        total = score.note_count(),
        considered = store.len(),
        "extracted notes"
    );

    let events = dissonant_events(store.notes(), &profile.intervals);
    tracing::info!(profile = %profile.name, count = events.len(), "dissonance analysis complete");

    DissonanceAnalysis {
        profile: profile.clone(),
        notes_considered: store.len(),
        notes_total: score.note_count(),
        count: events.len(),
        events,
    }
}

/// Load a note-event JSON file and count its dissonances.
pub fn analyze_file(path: &Path, profile: &AnalysisProfile) -> Result<DissonanceAnalysis> {
    let score = load_score(path)?;
    Ok(analyze(&score, profile))
}
