use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::appointment::hh_mm;
use super::enums::LeaveStatus;

/// Names indexed by day-of-week, Sunday first.
pub const DAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

/// Half-open interval of time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "hh_mm")]
    pub start: NaiveTime,
    #[serde(with = "hh_mm")]
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Signed length in minutes; negative when `end` precedes `start`.
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One weekday entry of the availability template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
    pub is_available: bool,
    pub working_hours: TimeRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_time: Option<TimeRange>,
    pub max_appointments: u32,
}

impl DaySchedule {
    pub fn day_name(&self) -> &'static str {
        DAY_NAMES.get(self.day_of_week as usize).copied().unwrap_or("Unknown")
    }
}

/// Partial update merged into a `DaySchedule`. `break_time: Some(None)`
/// clears the break.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayScheduleUpdate {
    pub is_available: Option<bool>,
    pub working_hours: Option<TimeRange>,
    pub break_time: Option<Option<TimeRange>>,
    pub max_appointments: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
}

impl LeaveRequest {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}
