use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Semitone differences treated as dissonant across several octaves:
/// minor/major second, tritone, minor/major seventh and their compounds.
const WIDE: [u32; 20] = [
    1, 2, 6, 10, 11, 13, 14, 18, 22, 23, 25, 26, 30, 34, 35, 37, 38, 42, 46, 47,
];

/// The same interval classes within a single octave, for mod-12 pitches.
const PITCH_CLASS: [u32; 5] = [1, 2, 6, 10, 11];

/// Set of unsigned pitch differences considered dissonant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DissonantIntervals(BTreeSet<u32>);

impl DissonantIntervals {
    pub fn new(intervals: impl IntoIterator<Item = u32>) -> Self {
        Self(intervals.into_iter().collect())
    }

    /// Twenty intervals spanning four octaves, for raw pitch numbers.
    pub fn wide() -> Self {
        Self::new(WIDE)
    }

    /// Seconds, tritone and sevenths within one octave, for pitch classes.
    pub fn pitch_class() -> Self {
        Self::new(PITCH_CLASS)
    }

    /// Parse a comma separated list such as `"1, 2, 6"`.
    pub fn parse_list(list: &str) -> Result<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u32>().map_err(|_| {
                    Error::InvalidConfig(format!("'{}' is not a semitone interval", s))
                })
            })
            .collect::<Result<BTreeSet<_>>>()
            .map(Self)
    }

    pub fn contains(&self, interval: u32) -> bool {
        self.0.contains(&interval)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl std::fmt::Display for DissonantIntervals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Whether two pitches form a dissonant interval.
pub fn is_dissonant(pitch1: i32, pitch2: i32, intervals: &DissonantIntervals) -> bool {
    intervals.contains(pitch1.abs_diff(pitch2))
}
