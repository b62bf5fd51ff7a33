//! Core types for sleepcalc
//!
//! This module defines the values that flow between the duration calculator,
//! the stage estimator and the record/history layer: clock times, sleep
//! intervals, rounded durations and chart samples.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ComputeError;

/// Minutes in one calendar day
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Wall-clock time of day with minute resolution and no date component
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { hour: 0, minute: 0 };

    /// Create a time of day, rejecting hours outside 0-23 and minutes outside 0-59
    pub fn new(hour: u32, minute: u32) -> Result<Self, ComputeError> {
        if hour > 23 || minute > 59 {
            return Err(ComputeError::InvalidTimeOfDay(format!(
                "{}:{:02} is outside 00:00-23:59",
                hour, minute
            )));
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    /// Build a time from minutes past midnight, wrapping past 24 hours
    pub fn from_minutes(minutes: u32) -> Self {
        let minutes = minutes % MINUTES_PER_DAY;
        Self {
            hour: (minutes / 60) as u8,
            minute: (minutes % 60) as u8,
        }
    }

    pub fn hour(&self) -> u32 {
        self.hour as u32
    }

    pub fn minute(&self) -> u32 {
        self.minute as u32
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        self.hour() * 60 + self.minute()
    }

    /// Decimal hours, e.g. 22:30 -> 22.5
    pub fn as_decimal_hours(&self) -> f64 {
        self.hour as f64 + self.minute as f64 / 60.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ComputeError;

    /// Parse a 24-hour `HH:MM` string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let time = NaiveTime::parse_from_str(trimmed, "%H:%M")
            .map_err(|e| ComputeError::InvalidTimeOfDay(format!("{:?}: {}", trimmed, e)))?;
        Ok(Self::from(time))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ComputeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

/// Seconds and sub-second precision are dropped
impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }
}

impl From<TimeOfDay> for NaiveTime {
    fn from(time: TimeOfDay) -> Self {
        NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or_default()
    }
}

/// Elapsed sleep in hours, held as whole tenths of an hour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SleepDuration {
    tenths: u16,
}

impl SleepDuration {
    pub const ZERO: SleepDuration = SleepDuration { tenths: 0 };

    /// Longest representable duration: a full day
    pub const MAX_TENTHS: u16 = 240;

    /// Round elapsed minutes to the nearest tenth of an hour.
    ///
    /// A tenth of an hour is six minutes, so the tie sits at exactly three
    /// minutes past a tenth and is rounded up (away from zero).
    pub fn from_minutes(minutes: u32) -> Self {
        let tenths = (minutes.min(MINUTES_PER_DAY) + 3) / 6;
        Self {
            tenths: tenths as u16,
        }
    }

    pub fn from_tenths(tenths: u16) -> Result<Self, ComputeError> {
        if tenths > Self::MAX_TENTHS {
            return Err(ComputeError::InvalidDuration(format!(
                "{} tenths exceeds 24 hours",
                tenths
            )));
        }
        Ok(Self { tenths })
    }

    /// Round a decimal hour value to one decimal place
    pub fn from_hours(hours: f64) -> Result<Self, ComputeError> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(ComputeError::InvalidDuration(format!(
                "{} is not a non-negative number of hours",
                hours
            )));
        }
        let tenths = (hours * 10.0).round();
        if tenths > Self::MAX_TENTHS as f64 {
            return Err(ComputeError::InvalidDuration(format!(
                "{} hours exceeds 24 hours",
                hours
            )));
        }
        Ok(Self {
            tenths: tenths as u16,
        })
    }

    pub fn tenths(&self) -> u16 {
        self.tenths
    }

    pub fn hours(&self) -> f64 {
        self.tenths as f64 / 10.0
    }
}

impl fmt::Display for SleepDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tenths / 10, self.tenths % 10)
    }
}

impl TryFrom<f64> for SleepDuration {
    type Error = ComputeError;

    fn try_from(hours: f64) -> Result<Self, Self::Error> {
        Self::from_hours(hours)
    }
}

impl From<SleepDuration> for f64 {
    fn from(duration: SleepDuration) -> Self {
        duration.hours()
    }
}

/// One sleep session. Wake falls on the same day as sleep or the day after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepInterval {
    pub sleep: TimeOfDay,
    pub wake: TimeOfDay,
}

impl SleepInterval {
    pub fn new(sleep: TimeOfDay, wake: TimeOfDay) -> Self {
        Self { sleep, wake }
    }

    /// Wake is numerically earlier than sleep, so it belongs to the next day
    pub fn crosses_midnight(&self) -> bool {
        self.wake < self.sleep
    }

    /// Exact elapsed minutes, always in [0, 1440)
    pub fn elapsed_minutes(&self) -> u32 {
        let sleep = self.sleep.minutes_since_midnight();
        let mut wake = self.wake.minutes_since_midnight();
        if wake < sleep {
            wake += MINUTES_PER_DAY;
        }
        wake - sleep
    }

    /// Elapsed hours rounded to one decimal place
    pub fn duration(&self) -> SleepDuration {
        SleepDuration::from_minutes(self.elapsed_minutes())
    }

    /// Elapsed hours truncated to a whole number, the granularity older
    /// stored records carry
    pub fn whole_hours(&self) -> u32 {
        self.elapsed_minutes() / 60
    }
}

/// Display-only sleep stage assigned from the position in a 90 minute cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SleepStage {
    Light,
    Deep,
    Deeper,
    #[serde(rename = "REM")]
    Rem,
}

impl SleepStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepStage::Light => "Light",
            SleepStage::Deep => "Deep",
            SleepStage::Deeper => "Deeper",
            SleepStage::Rem => "REM",
        }
    }
}

impl fmt::Display for SleepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point of the synthetic stage chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSample {
    /// Position in the sequence (0-based)
    pub index: usize,
    /// Hours since the sleep time
    pub offset_hours: f64,
    /// Wall-clock time of this sample
    pub clock_time: TimeOfDay,
    /// Stage label
    pub stage: SleepStage,
    /// `HH:MM` axis label, present on every labelled tick only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let time = t("06:45");
        assert_eq!(time.hour(), 6);
        assert_eq!(time.minute(), 45);
        assert_eq!(time.to_string(), "06:45");
        assert_eq!(t(" 23:05 ").to_string(), "23:05");
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        for bad in ["24:00", "12:60", "noon", "", "12:30:15", "-1:00"] {
            let err = bad.parse::<TimeOfDay>().unwrap_err();
            assert!(matches!(err, ComputeError::InvalidTimeOfDay(_)), "{bad}");
        }
    }

    #[test]
    fn test_new_validates_ranges() {
        assert!(TimeOfDay::new(23, 59).is_ok());
        assert!(TimeOfDay::new(24, 0).is_err());
        assert!(TimeOfDay::new(0, 60).is_err());
    }

    #[test]
    fn test_decimal_hours() {
        assert!((t("22:30").as_decimal_hours() - 22.5).abs() < 1e-9);
        assert!((t("06:45").as_decimal_hours() - 6.75).abs() < 1e-9);
        assert_eq!(TimeOfDay::MIDNIGHT.as_decimal_hours(), 0.0);
    }

    #[test]
    fn test_from_minutes_wraps() {
        assert_eq!(TimeOfDay::from_minutes(1440 + 75), t("01:15"));
        assert_eq!(TimeOfDay::from_minutes(23 * 60 + 59), t("23:59"));
    }

    #[test]
    fn test_naive_time_conversion_drops_seconds() {
        let naive = NaiveTime::from_hms_opt(7, 30, 59).unwrap();
        let time = TimeOfDay::from(naive);
        assert_eq!(time, t("07:30"));
        assert_eq!(NaiveTime::from(time), NaiveTime::from_hms_opt(7, 30, 0).unwrap());
    }

    #[test]
    fn test_time_serde_as_string() {
        let json = serde_json::to_string(&t("07:05")).unwrap();
        assert_eq!(json, "\"07:05\"");
        let back: TimeOfDay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t("07:05"));
        assert!(serde_json::from_str::<TimeOfDay>("\"25:00\"").is_err());
    }

    #[test]
    fn test_duration_rounding_from_minutes() {
        // 495 min = 8.25 h, tie rounds up
        assert_eq!(SleepDuration::from_minutes(495).tenths(), 83);
        // 494 min = 8.233 h
        assert_eq!(SleepDuration::from_minutes(494).tenths(), 82);
        assert_eq!(SleepDuration::from_minutes(0), SleepDuration::ZERO);
        assert_eq!(SleepDuration::from_minutes(2), SleepDuration::ZERO);
        assert_eq!(SleepDuration::from_minutes(3).tenths(), 1);
    }

    #[test]
    fn test_duration_from_hours() {
        assert_eq!(SleepDuration::from_hours(7.5).unwrap().tenths(), 75);
        assert_eq!(SleepDuration::from_hours(1.25).unwrap().tenths(), 13);
        assert!(SleepDuration::from_hours(-0.1).is_err());
        assert!(SleepDuration::from_hours(f64::NAN).is_err());
        assert!(SleepDuration::from_hours(24.1).is_err());
    }

    #[test]
    fn test_duration_display_and_serde() {
        let d = SleepDuration::from_minutes(450);
        assert_eq!(d.to_string(), "7.5");
        assert_eq!(SleepDuration::ZERO.to_string(), "0.0");
        assert_eq!(serde_json::to_string(&d).unwrap(), "7.5");
        let back: SleepDuration = serde_json::from_str("8.3").unwrap();
        assert_eq!(back.tenths(), 83);
    }

    #[test]
    fn test_interval_whole_hours_truncates() {
        let interval = SleepInterval::new(t("22:30"), t("06:45"));
        assert!(interval.crosses_midnight());
        assert_eq!(interval.elapsed_minutes(), 495);
        assert_eq!(interval.whole_hours(), 8);

        let same_day = SleepInterval::new(t("13:00"), t("14:50"));
        assert!(!same_day.crosses_midnight());
        assert_eq!(same_day.whole_hours(), 1);
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(SleepStage::Rem.as_str(), "REM");
        assert_eq!(serde_json::to_string(&SleepStage::Rem).unwrap(), "\"REM\"");
        assert_eq!(serde_json::to_string(&SleepStage::Deeper).unwrap(), "\"Deeper\"");
    }
}
