use crate::interval::DissonantIntervals;
use crate::note::{ExtractOptions, PitchPolicy};
use crate::{Error, Result};
use serde::Serialize;

/// A named combination of interval set, time window and pitch policy.
///
/// Two presets exist because the analysis has historically been run both
/// ways; neither is preferred.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisProfile {
    pub name: String,
    pub intervals: DissonantIntervals,
    /// Notes starting after this beat are ignored. `None` analyzes everything.
    pub time_threshold: Option<f64>,
    pub pitch_policy: PitchPolicy,
}

impl AnalysisProfile {
    pub const WIDE: &'static str = "wide";
    pub const PITCH_CLASS: &'static str = "pitch-class";

    /// Raw pitches, the 20-interval set, first six beats.
    pub fn wide() -> Self {
        Self {
            name: Self::WIDE.to_string(),
            intervals: DissonantIntervals::wide(),
            time_threshold: Some(6.0),
            pitch_policy: PitchPolicy::Raw,
        }
    }

    /// Pitch classes, the 5-interval set, first four beats.
    pub fn pitch_class() -> Self {
        Self {
            name: Self::PITCH_CLASS.to_string(),
            intervals: DissonantIntervals::pitch_class(),
            time_threshold: Some(4.0),
            pitch_policy: PitchPolicy::PitchClass,
        }
    }

    pub fn by_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            Self::WIDE => Ok(Self::wide()),
            Self::PITCH_CLASS | "pitch_class" | "pc" => Ok(Self::pitch_class()),
            other => Err(Error::UnknownProfile(other.to_string())),
        }
    }

    pub fn with_time_threshold(mut self, threshold: Option<f64>) -> Self {
        self.time_threshold = threshold;
        self
    }

    pub fn with_intervals(mut self, intervals: DissonantIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    pub fn with_pitch_policy(mut self, policy: PitchPolicy) -> Self {
        self.pitch_policy = policy;
        self
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            time_threshold: self.time_threshold,
            pitch_policy: self.pitch_policy,
        }
    }
}

impl Default for AnalysisProfile {
    fn default() -> Self {
        Self::wide()
    }
}
