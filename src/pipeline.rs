//! Processing surface
//!
//! This module provides the string-in/JSON-out API used by the CLI and the C
//! bindings. It ties the pieces together: `HH:MM` parsing → duration
//! calculation → stage estimation, plus a stateful processor that keeps a
//! sleep log across calls.

use serde::{Deserialize, Serialize};

use crate::duration::compute_duration;
use crate::error::ComputeError;
use crate::history::{DateRange, SleepLog, SleepSummary};
use crate::record::{SleepEntry, SleepRecord};
use crate::stages::{StageConfig, StageEstimator};
use crate::types::{SleepDuration, SleepInterval, StageSample, TimeOfDay};

/// Everything computed for one sleep session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepReport {
    pub sleep_time: TimeOfDay,
    pub wake_time: TimeOfDay,
    pub crosses_midnight: bool,
    /// Hours, one decimal place
    pub duration: SleepDuration,
    /// Hours, truncated
    pub whole_hours: u32,
    pub samples: Vec<StageSample>,
}

impl SleepReport {
    /// Build a report for one session using `estimator` for the stage chart
    pub fn build(estimator: &StageEstimator, sleep: TimeOfDay, wake: TimeOfDay) -> Self {
        let interval = SleepInterval::new(sleep, wake);
        let duration = compute_duration(sleep, wake);

        Self {
            sleep_time: sleep,
            wake_time: wake,
            crosses_midnight: interval.crosses_midnight(),
            duration,
            whole_hours: interval.whole_hours(),
            samples: estimator.estimate(sleep, duration).collect(),
        }
    }
}

/// Compute a sleep report from two `HH:MM` strings.
///
/// # Example
/// ```
/// let report = sleepcalc::sleep_report("23:00", "07:00")?;
/// assert_eq!(report.duration.to_string(), "8.0");
/// assert_eq!(report.samples.len(), 33);
/// # Ok::<(), sleepcalc::ComputeError>(())
/// ```
pub fn sleep_report(sleep: &str, wake: &str) -> Result<SleepReport, ComputeError> {
    let sleep: TimeOfDay = sleep.parse()?;
    let wake: TimeOfDay = wake.parse()?;
    Ok(SleepReport::build(&StageEstimator::new(), sleep, wake))
}

/// Same as [`sleep_report`], encoded as JSON
pub fn sleep_report_json(sleep: &str, wake: &str) -> Result<String, ComputeError> {
    let report = sleep_report(sleep, wake)?;
    serde_json::to_string(&report).map_err(|e| ComputeError::EncodingError(e.to_string()))
}

/// Stateful processor holding a sleep log and stage configuration.
///
/// Use this when records need to persist across multiple calls.
#[derive(Debug, Default)]
pub struct SleepProcessor {
    log: SleepLog,
    estimator: StageEstimator,
}

impl SleepProcessor {
    /// Create a processor with an empty log and default sampling
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a processor with a custom stage configuration
    pub fn with_config(config: StageConfig) -> Result<Self, ComputeError> {
        Ok(Self {
            log: SleepLog::new(),
            estimator: StageEstimator::with_config(config)?,
        })
    }

    pub fn log(&self) -> &SleepLog {
        &self.log
    }

    pub fn estimator(&self) -> &StageEstimator {
        &self.estimator
    }

    /// Load log state from JSON, replacing the current log
    pub fn load_log(&mut self, json: &str) -> Result<(), ComputeError> {
        self.log = SleepLog::from_json(json)?;
        Ok(())
    }

    /// Save log state to JSON
    pub fn save_log(&self) -> Result<String, ComputeError> {
        self.log
            .to_json()
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Record a parsed entry
    pub fn add_entry(&mut self, entry: SleepEntry) -> &SleepRecord {
        self.log.add_entry(entry)
    }

    /// Record one entry given as JSON and return the stored record as JSON
    pub fn add_entry_json(&mut self, entry_json: &str) -> Result<String, ComputeError> {
        let entry: SleepEntry = serde_json::from_str(entry_json)?;
        let record = self.log.add_entry(entry);
        serde_json::to_string(record).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Records for a user within `range`, newest first, as a JSON array
    pub fn records_json(&self, user_id: u64, range: DateRange) -> Result<String, ComputeError> {
        let records = self.log.records(user_id, range);
        serde_json::to_string(&records).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    pub fn summary(
        &self,
        user_id: u64,
        range: DateRange,
        goal_hours: f64,
    ) -> Result<SleepSummary, ComputeError> {
        self.log.summary(user_id, range, goal_hours)
    }

    pub fn summary_json(
        &self,
        user_id: u64,
        range: DateRange,
        goal_hours: f64,
    ) -> Result<String, ComputeError> {
        let summary = self.summary(user_id, range, goal_hours)?;
        serde_json::to_string(&summary).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Report for one session using this processor's stage configuration
    pub fn report(&self, sleep: TimeOfDay, wake: TimeOfDay) -> SleepReport {
        SleepReport::build(&self.estimator, sleep, wake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::DEFAULT_SLEEP_GOAL_HOURS;
    use crate::types::SleepStage;

    #[test]
    fn test_sleep_report() {
        let report = sleep_report("23:00", "07:00").unwrap();
        assert!(report.crosses_midnight);
        assert!((report.duration.hours() - 8.0).abs() < 1e-9);
        assert_eq!(report.whole_hours, 8);
        assert_eq!(report.samples.len(), 33);
        assert_eq!(report.samples[0].stage, SleepStage::Light);
        assert_eq!(report.samples[32].clock_time.to_string(), "07:00");
    }

    #[test]
    fn test_sleep_report_rejects_bad_input() {
        assert!(matches!(
            sleep_report("23:00", "7am"),
            Err(ComputeError::InvalidTimeOfDay(_))
        ));
    }

    #[test]
    fn test_sleep_report_json() {
        let json = sleep_report_json("22:30", "06:45").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["duration"], 8.3);
        assert_eq!(value["wholeHours"], 8);
        assert_eq!(value["sleepTime"], "22:30");
        assert_eq!(value["crossesMidnight"], true);
        assert_eq!(value["samples"][1]["stage"], "Deep");
        assert_eq!(value["samples"][1]["offsetHours"], 0.25);
        assert!(value["samples"][1].get("timeLabel").is_none());
        assert_eq!(value["samples"][4]["timeLabel"], "23:30");
    }

    #[test]
    fn test_processor_records_and_summary() {
        let mut processor = SleepProcessor::new();
        let record_json = processor
            .add_entry_json(
                r#"{"userId": 7, "date": "2024-03-01", "bedTime": "23:00", "wakeTime": "07:00"}"#,
            )
            .unwrap();
        let record: SleepRecord = serde_json::from_str(&record_json).unwrap();
        assert_eq!(record.user_id, 7);
        assert!((record.duration.hours() - 8.0).abs() < 1e-9);

        processor
            .add_entry_json(
                r#"{"userId": 7, "date": "2024-03-02", "bedTime": "01:00", "wakeTime": "06:00"}"#,
            )
            .unwrap();

        let records: Vec<SleepRecord> =
            serde_json::from_str(&processor.records_json(7, DateRange::all()).unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date.to_string(), "2024-03-02");

        let summary = processor
            .summary(7, DateRange::all(), DEFAULT_SLEEP_GOAL_HOURS)
            .unwrap();
        assert_eq!(summary.nights, 2);
        assert_eq!(summary.nights_meeting_goal, 1);

        let json = processor.summary_json(7, DateRange::all(), 8.0).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["goalHours"], 8.0);
        assert_eq!(value["nightsMeetingGoal"], 1);

        assert!(matches!(
            processor.summary_json(7, DateRange::all(), -2.0),
            Err(ComputeError::InvalidGoal(_))
        ));
    }

    #[test]
    fn test_processor_save_and_load() {
        let mut processor = SleepProcessor::new();
        processor
            .add_entry_json(
                r#"{"userId": 1, "date": "2024-03-01", "bedTime": "22:00", "wakeTime": "06:00"}"#,
            )
            .unwrap();
        let saved = processor.save_log().unwrap();

        let mut restored = SleepProcessor::new();
        restored.load_log(&saved).unwrap();
        assert_eq!(restored.log().len(), 1);
        assert!(restored.load_log("not json").is_err());
        assert_eq!(restored.log().len(), 1);
    }

    #[test]
    fn test_processor_custom_config() {
        let processor = SleepProcessor::with_config(StageConfig {
            samples_per_hour: 1,
            label_every: 1,
        })
        .unwrap();
        let report = processor.report("23:00".parse().unwrap(), "07:00".parse().unwrap());
        assert_eq!(report.samples.len(), 9);
        assert!(report.samples.iter().all(|s| s.time_label.is_some()));

        assert!(SleepProcessor::with_config(StageConfig {
            samples_per_hour: 0,
            label_every: 1,
        })
        .is_err());
    }
}
