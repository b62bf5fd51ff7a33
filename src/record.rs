//! Sleep entries and records
//!
//! A `SleepEntry` is what a client submits (`userId`, `date`, `bedTime`,
//! `wakeTime`); a `SleepRecord` is the stored form with an id and the computed
//! duration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::duration::compute_duration;
use crate::error::ComputeError;
use crate::types::{SleepDuration, SleepInterval, TimeOfDay};

/// Calendar date format used on the wire
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate, ComputeError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| ComputeError::DateParseError(format!("{:?}: {}", s, e)))
}

/// Submitted sleep entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepEntry {
    pub user_id: u64,
    pub date: NaiveDate,
    pub bed_time: TimeOfDay,
    pub wake_time: TimeOfDay,
}

impl SleepEntry {
    pub fn new(user_id: u64, date: NaiveDate, bed_time: TimeOfDay, wake_time: TimeOfDay) -> Self {
        Self {
            user_id,
            date,
            bed_time,
            wake_time,
        }
    }

    pub fn interval(&self) -> SleepInterval {
        SleepInterval::new(self.bed_time, self.wake_time)
    }

    /// Assign an id and compute the duration
    pub fn into_record(self) -> SleepRecord {
        SleepRecord {
            id: Uuid::new_v4(),
            duration: compute_duration(self.bed_time, self.wake_time),
            user_id: self.user_id,
            date: self.date,
            bed_time: self.bed_time,
            wake_time: self.wake_time,
        }
    }

    /// Parse newline-delimited JSON entries, skipping blank lines
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<SleepEntry>, ComputeError> {
        let mut entries = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<SleepEntry>(trimmed) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(entries)
    }

    /// Parse a JSON array of entries
    pub fn parse_array(json: &str) -> Result<Vec<SleepEntry>, ComputeError> {
        serde_json::from_str(json).map_err(|e| ComputeError::ParseError(e.to_string()))
    }
}

/// Stored sleep record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecord {
    pub id: Uuid,
    pub user_id: u64,
    pub date: NaiveDate,
    pub bed_time: TimeOfDay,
    pub wake_time: TimeOfDay,
    /// Hours, one decimal place
    pub duration: SleepDuration,
}

impl SleepRecord {
    pub fn interval(&self) -> SleepInterval {
        SleepInterval::new(self.bed_time, self.wake_time)
    }

    pub fn meets_goal(&self, goal_hours: f64) -> bool {
        self.duration.hours() >= goal_hours
    }
}
