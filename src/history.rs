//! Sleep history
//!
//! In-memory store of sleep records with the queries the tracker views need:
//! newest-first listings, a chronological chart series and a progress summary
//! against a nightly goal. The store serializes to JSON so callers can persist
//! it between sessions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::record::{SleepEntry, SleepRecord};
use crate::types::SleepDuration;

/// Nightly sleep goal in hours used when none is given
pub const DEFAULT_SLEEP_GOAL_HOURS: f64 = 7.0;

/// Inclusive date filter; a missing bound is open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Reject goals that are not a positive, finite number of hours
pub fn validate_goal(goal_hours: f64) -> Result<f64, ComputeError> {
    if !goal_hours.is_finite() || goal_hours <= 0.0 {
        return Err(ComputeError::InvalidGoal(format!(
            "{} is not a positive number of hours",
            goal_hours
        )));
    }
    Ok(goal_hours)
}

/// One point of the duration chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub duration: SleepDuration,
}

/// Progress against a nightly sleep goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSummary {
    pub user_id: u64,
    pub nights: usize,
    pub total_hours: f64,
    pub average_hours: Option<f64>,
    pub goal_hours: f64,
    pub nights_meeting_goal: usize,
    pub shortest: Option<SleepDuration>,
    pub longest: Option<SleepDuration>,
}

/// Store of sleep records for any number of users
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SleepLog {
    records: Vec<SleepRecord>,
}

impl SleepLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry, computing its duration
    pub fn add_entry(&mut self, entry: SleepEntry) -> &SleepRecord {
        let record = entry.into_record();
        log::debug!(
            "recorded sleep for user {} on {}: {} -> {} ({} h)",
            record.user_id,
            record.date,
            record.bed_time,
            record.wake_time,
            record.duration
        );
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records for a user within `range`, newest date first
    pub fn records(&self, user_id: u64, range: DateRange) -> Vec<&SleepRecord> {
        let mut records: Vec<&SleepRecord> = self
            .records
            .iter()
            .filter(|r| r.user_id == user_id && range.contains(r.date))
            .collect();
        // Stable sort keeps insertion order for records on the same date
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }

    /// The `limit` most recent records for a user
    pub fn recent(&self, user_id: u64, limit: usize) -> Vec<&SleepRecord> {
        let mut records = self.records(user_id, DateRange::all());
        records.truncate(limit);
        records
    }

    /// Duration per night, oldest first
    pub fn chart_series(&self, user_id: u64, range: DateRange) -> Vec<ChartPoint> {
        let mut records: Vec<&SleepRecord> = self
            .records
            .iter()
            .filter(|r| r.user_id == user_id && range.contains(r.date))
            .collect();
        records.sort_by_key(|r| r.date);
        records
            .into_iter()
            .map(|r| ChartPoint {
                date: r.date,
                duration: r.duration,
            })
            .collect()
    }

    /// Summarize a user's nights against `goal_hours`
    pub fn summary(
        &self,
        user_id: u64,
        range: DateRange,
        goal_hours: f64,
    ) -> Result<SleepSummary, ComputeError> {
        let goal_hours = validate_goal(goal_hours)?;
        let records = self.records(user_id, range);
        let nights = records.len();
        let total_tenths: u32 = records.iter().map(|r| r.duration.tenths() as u32).sum();
        let total_hours = total_tenths as f64 / 10.0;

        Ok(SleepSummary {
            user_id,
            nights,
            total_hours,
            average_hours: (nights > 0).then(|| total_hours / nights as f64),
            goal_hours,
            nights_meeting_goal: records.iter().filter(|r| r.meets_goal(goal_hours)).count(),
            shortest: records.iter().map(|r| r.duration).min(),
            longest: records.iter().map(|r| r.duration).max(),
        })
    }

    /// Serialize the log to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Restore a log from JSON.
    ///
    /// Stored durations are recomputed from each record's bed and wake times.
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let mut restored: SleepLog = serde_json::from_str(json)?;
        for record in &mut restored.records {
            let duration = record.interval().duration();
            if record.duration != duration {
                log::warn!(
                    "record {} stored {} h for {} -> {}, recomputed {} h",
                    record.id,
                    record.duration,
                    record.bed_time,
                    record.wake_time,
                    duration
                );
                record.duration = duration;
            }
        }
        log::debug!("loaded sleep log with {} records", restored.len());
        Ok(restored)
    }
}
