//! Pairwise overlap detection and deduplicated dissonance counting.
//!
//! Every unordered pair of notes is visited once (`i < j` in store order).
//! A pair contributes when the notes overlap as closed intervals and their
//! pitch difference is in the dissonant set. Contributions are keyed on
//! (canonical pitch pair, overlap window), so doubled voices or re-struck
//! notes that sound the same interval over the same window count once.

use crate::interval::{is_dissonant, DissonantIntervals};
use crate::note::{DissonantEvent, Note, PitchPair};
use std::collections::HashSet;

/// Number of distinct dissonant events among `notes`.
pub fn count_dissonances(notes: &[Note], intervals: &DissonantIntervals) -> usize {
    let mut seen = HashSet::new();
    let mut count = 0;
    for_each_dissonant_pair(notes, intervals, |event| {
        if seen.insert(event) {
            count += 1;
        }
    });
    count
}

/// The distinct dissonant events among `notes`, in the order first found.
pub fn dissonant_events(notes: &[Note], intervals: &DissonantIntervals) -> Vec<DissonantEvent> {
    let mut seen = HashSet::new();
    let mut events = Vec::new();
    for_each_dissonant_pair(notes, intervals, |event| {
        if seen.insert(event) {
            events.push(event);
        }
    });
    events
}

fn for_each_dissonant_pair(
    notes: &[Note],
    intervals: &DissonantIntervals,
    mut visit: impl FnMut(DissonantEvent),
) {
    for (i, first) in notes.iter().enumerate() {
        for second in &notes[i + 1..] {
            let Some(window) = first.overlap_window(second) else {
                continue;
            };
            if !is_dissonant(first.pitch, second.pitch, intervals) {
                continue;
            }
            visit(DissonantEvent {
                pitches: PitchPair::new(first.pitch, second.pitch),
                window,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{Beat, OverlapWindow};
    use pretty_assertions::assert_eq;

    fn n(start: f64, end: f64, pitch: i32) -> Note {
        Note::new(start, end, pitch)
    }

    fn semitone() -> DissonantIntervals {
        DissonantIntervals::new([1])
    }

    #[test]
    fn empty_input_counts_zero() {
        assert_eq!(count_dissonances(&[], &DissonantIntervals::wide()), 0);
    }

    #[test]
    fn single_note_counts_zero() {
        assert_eq!(count_dissonances(&[n(0.0, 4.0, 60)], &semitone()), 0);
    }

    #[test]
    fn sequential_notes_never_count() {
        let notes = [n(0.0, 1.0, 60), n(1.5, 2.0, 61), n(3.0, 4.0, 62), n(5.0, 6.0, 66)];
        assert_eq!(count_dissonances(&notes, &DissonantIntervals::wide()), 0);
    }

    #[test]
    fn simultaneous_semitone_counts_once() {
        let notes = [n(0.0, 4.0, 60), n(0.0, 4.0, 61)];
        assert_eq!(count_dissonances(&notes, &semitone()), 1);
    }

    #[test]
    fn simultaneous_fifth_is_consonant() {
        let notes = [n(0.0, 4.0, 60), n(0.0, 4.0, 67)];
        assert_eq!(count_dissonances(&notes, &DissonantIntervals::wide()), 0);
    }

    #[test]
    fn doubled_voice_is_deduplicated() {
        let notes = [n(0.0, 4.0, 60), n(0.0, 4.0, 61), n(0.0, 4.0, 61)];
        assert_eq!(count_dissonances(&notes, &semitone()), 1);
    }

    #[test]
    fn same_pair_in_different_windows_counts_separately() {
        let notes = [
            n(0.0, 4.0, 60),
            n(0.0, 2.0, 61),
            n(2.5, 4.0, 61),
        ];
        assert_eq!(count_dissonances(&notes, &semitone()), 2);
    }

    #[test]
    fn reversed_pitch_order_shares_a_key() {
        // (61, 60) over [0,4] and (60, 61) over [0,4] are the same event
        let notes = [n(0.0, 4.0, 61), n(0.0, 4.0, 60), n(0.0, 4.0, 61)];
        assert_eq!(count_dissonances(&notes, &semitone()), 1);
    }

    #[test]
    fn touching_boundary_counts() {
        let notes = [n(0.0, 4.0, 60), n(4.0, 8.0, 61)];
        assert_eq!(count_dissonances(&notes, &semitone()), 1);

        let events = dissonant_events(&notes, &semitone());
        assert_eq!(
            events[0].window,
            OverlapWindow {
                start: Beat::new(4.0),
                end: Beat::new(4.0)
            }
        );
    }

    #[test]
    fn unison_is_never_dissonant() {
        let notes = [n(0.0, 4.0, 60), n(0.0, 4.0, 60)];
        assert_eq!(count_dissonances(&notes, &DissonantIntervals::wide()), 0);
    }

    #[test]
    fn events_match_count_and_order() {
        let notes = [
            n(0.0, 4.0, 60),
            n(1.0, 3.0, 66),
            n(2.0, 6.0, 61),
            n(2.0, 6.0, 61),
            n(5.0, 7.0, 72),
        ];
        let set = DissonantIntervals::wide();
        let events = dissonant_events(&notes, &set);

        assert_eq!(events.len(), count_dissonances(&notes, &set));
        let pairs: Vec<(i32, i32)> = events
            .iter()
            .map(|e| (e.pitches.low, e.pitches.high))
            .collect();
        // 66-61 is a fourth and the doubled 61 adds nothing new
        assert_eq!(pairs, vec![(60, 66), (60, 61), (61, 72)]);
    }

    #[test]
    fn repeated_runs_agree() {
        let notes = [n(0.0, 2.0, 60), n(1.0, 3.0, 62), n(1.0, 3.0, 71)];
        let set = DissonantIntervals::wide();
        let first = count_dissonances(&notes, &set);
        let second = count_dissonances(&notes, &set);
        assert_eq!(first, second);
        assert_eq!(first, 2);
    }
}
