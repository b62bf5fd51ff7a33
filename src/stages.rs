//! Sleep stage estimation for charting
//!
//! Splits a sleep duration into evenly spaced ticks and labels each tick with a
//! stage taken from its position in a repeating 90 minute cycle:
//! - 0-10 min: Light
//! - 10-30 min: Deep
//! - 30-60 min: Deeper
//! - 60-90 min: REM
//!
//! This is a presentation heuristic, not a physiological model. The output
//! depends only on the sleep time and duration.

use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

use crate::error::ComputeError;
use crate::types::{SleepDuration, SleepStage, StageSample, TimeOfDay, MINUTES_PER_DAY};

/// Length of one sleep cycle in minutes
pub const CYCLE_MINUTES: u32 = 90;

/// Default sampling rate (every 15 minutes)
pub const DEFAULT_SAMPLES_PER_HOUR: u32 = 4;

/// Default spacing of wall-clock axis labels, in samples
pub const DEFAULT_LABEL_EVERY: usize = 4;

/// Map a minute within the 90 minute cycle to its stage
pub fn stage_at_cycle_minute(cycle_minute: u32) -> SleepStage {
    match cycle_minute % CYCLE_MINUTES {
        0..=9 => SleepStage::Light,
        10..=29 => SleepStage::Deep,
        30..=59 => SleepStage::Deeper,
        _ => SleepStage::Rem,
    }
}

/// Sampling configuration for the stage chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Samples per hour; must divide 60 so every tick lands on a whole minute
    #[serde(default = "default_samples_per_hour")]
    pub samples_per_hour: u32,
    /// Attach an `HH:MM` label to every n-th sample
    #[serde(default = "default_label_every")]
    pub label_every: usize,
}

fn default_samples_per_hour() -> u32 {
    DEFAULT_SAMPLES_PER_HOUR
}

fn default_label_every() -> usize {
    DEFAULT_LABEL_EVERY
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            samples_per_hour: DEFAULT_SAMPLES_PER_HOUR,
            label_every: DEFAULT_LABEL_EVERY,
        }
    }
}

impl StageConfig {
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.samples_per_hour == 0 || 60 % self.samples_per_hour != 0 {
            return Err(ComputeError::InvalidConfig(format!(
                "samples_per_hour must divide 60, got {}",
                self.samples_per_hour
            )));
        }
        if self.label_every == 0 {
            return Err(ComputeError::InvalidConfig(
                "label_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Minutes between consecutive samples
    pub fn step_minutes(&self) -> u32 {
        60 / self.samples_per_hour
    }

    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: StageConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}

/// Estimator producing stage samples from a sleep time and duration
#[derive(Debug, Clone, Default)]
pub struct StageEstimator {
    config: StageConfig,
}

impl StageEstimator {
    /// Create an estimator sampling every 15 minutes
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an estimator with a custom sampling configuration
    pub fn with_config(config: StageConfig) -> Result<Self, ComputeError> {
        if let Err(e) = config.validate() {
            log::warn!("rejecting stage configuration: {}", e);
            return Err(e);
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Number of samples covering `duration`, both endpoints included:
    /// `ceil(hours * samples_per_hour) + 1`
    pub fn sample_count(&self, duration: SleepDuration) -> usize {
        let scaled = duration.tenths() as u32 * self.config.samples_per_hour;
        (scaled.div_ceil(10) + 1) as usize
    }

    /// Lazily produce the stage samples for one sleep session
    pub fn estimate(&self, sleep: TimeOfDay, duration: SleepDuration) -> StageSamples {
        StageSamples {
            start_minutes: sleep.minutes_since_midnight(),
            step_minutes: self.config.step_minutes(),
            label_every: self.config.label_every,
            next: 0,
            len: self.sample_count(duration),
        }
    }
}

/// Estimate stage samples with the default 15 minute sampling
pub fn estimate_stages(sleep: TimeOfDay, duration: SleepDuration) -> StageSamples {
    StageEstimator::new().estimate(sleep, duration)
}

/// Finite, restartable sequence of stage samples.
///
/// Cloning the sequence (or calling [`StageSamples::restart`]) yields the same
/// samples again from the start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSamples {
    start_minutes: u32,
    step_minutes: u32,
    label_every: usize,
    next: usize,
    len: usize,
}

impl StageSamples {
    /// Rewind to the first sample
    pub fn restart(&mut self) {
        self.next = 0;
    }

    /// Sample at `index`, independent of iteration state
    pub fn get(&self, index: usize) -> Option<StageSample> {
        if index >= self.len {
            return None;
        }

        let offset_minutes = index as u32 * self.step_minutes;
        let clock_time =
            TimeOfDay::from_minutes((self.start_minutes + offset_minutes) % MINUTES_PER_DAY);
        let time_label = (index % self.label_every == 0).then(|| clock_time.to_string());

        Some(StageSample {
            index,
            offset_hours: offset_minutes as f64 / 60.0,
            clock_time,
            stage: stage_at_cycle_minute(offset_minutes % CYCLE_MINUTES),
            time_label,
        })
    }

    /// Total number of samples, regardless of how many were consumed
    pub fn total(&self) -> usize {
        self.len
    }
}

impl Iterator for StageSamples {
    type Item = StageSample;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.get(self.next)?;
        self.next += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StageSamples {}

impl FusedIterator for StageSamples {}
