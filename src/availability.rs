//! Weekly availability template and derived slot capacity.
//!
//! Seven `DaySchedule` entries indexed by day of week (0 = Sunday), the
//! appointment duration/buffer/booking-window settings, and leave requests.
//! `update_day` merges permissively; `try_update_day` rejects results whose
//! hours are inverted or whose break falls outside working hours.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PortalConfig;
use crate::events::{Subscribers, SubscriptionId};
use crate::models::{
    DaySchedule, DayScheduleUpdate, DoctorAvailability, LeaveRequest, LeaveStatus, TimeRange,
};

/// Selectable appointment lengths in minutes.
pub const DURATION_CHOICES: &[u32] = &[15, 30, 45, 60];
/// Selectable gaps between appointments in minutes.
pub const BUFFER_CHOICES: &[u32] = &[0, 5, 10, 15];
/// How far ahead patients may book, in days.
pub const BOOKING_WINDOW_CHOICES: &[u32] = &[7, 14, 30, 60];

const DEFAULT_MAX_APPOINTMENTS: u32 = 16;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("Day of week out of range: {0}")]
    InvalidDay(u8),
    #[error("Working hours end before they start ({start} - {end})")]
    InvertedHours { start: NaiveTime, end: NaiveTime },
    #[error("Break {start} - {end} falls outside working hours")]
    BreakOutsideHours { start: NaiveTime, end: NaiveTime },
    #[error("Unsupported appointment duration: {0} minutes")]
    InvalidDuration(u32),
    #[error("Unsupported buffer: {0} minutes")]
    InvalidBuffer(u32),
    #[error("Unsupported booking window: {0} days")]
    InvalidBookingWindow(u32),
    #[error("Leave ends before it starts ({start} - {end})")]
    InvertedLeave { start: NaiveDate, end: NaiveDate },
    #[error("Leave reason is required")]
    MissingReason,
    #[error("Leave request not found: {0}")]
    LeaveNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityEvent {
    DayUpdated { day_of_week: u8 },
    DurationChanged { minutes: u32 },
    LeaveSubmitted { id: String },
    LeaveDecided { id: String, status: LeaveStatus },
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

impl DaySchedule {
    /// Monday–Friday 09:00–17:00 with a 12:00–13:00 break; weekends off.
    pub fn default_for(day_of_week: u8) -> Self {
        Self {
            day_of_week,
            is_available: (1..=5).contains(&day_of_week),
            working_hours: TimeRange::new(hm(9, 0), hm(17, 0)),
            break_time: Some(TimeRange::new(hm(12, 0), hm(13, 0))),
            max_appointments: DEFAULT_MAX_APPOINTMENTS,
        }
    }

    pub fn apply(&mut self, update: &DayScheduleUpdate) {
        if let Some(v) = update.is_available {
            self.is_available = v;
        }
        if let Some(v) = update.working_hours {
            self.working_hours = v;
        }
        if let Some(v) = update.break_time {
            self.break_time = v;
        }
        if let Some(v) = update.max_appointments {
            self.max_appointments = v;
        }
    }

    pub fn validate(&self) -> Result<(), AvailabilityError> {
        let hours = self.working_hours;
        if hours.end <= hours.start {
            return Err(AvailabilityError::InvertedHours {
                start: hours.start,
                end: hours.end,
            });
        }
        if let Some(brk) = self.break_time {
            if brk.end < brk.start || !hours.contains(&brk) {
                return Err(AvailabilityError::BreakOutsideHours {
                    start: brk.start,
                    end: brk.end,
                });
            }
        }
        Ok(())
    }

    /// Working minutes minus break minutes, floored by `duration`. Zero when
    /// the day is unavailable, the duration is zero, or the break outlasts the
    /// working hours.
    pub fn available_slots(&self, duration_minutes: u32) -> u32 {
        if !self.is_available || duration_minutes == 0 {
            return 0;
        }
        let mut total = self.working_hours.minutes();
        if let Some(brk) = self.break_time {
            total -= brk.minutes();
        }
        if total <= 0 {
            return 0;
        }
        u32::try_from(total / i64::from(duration_minutes)).unwrap_or(u32::MAX)
    }

    /// Concrete slot intervals through the day. Slots never overlap the break
    /// and are separated by `buffer_minutes`.
    pub fn slot_times(&self, duration_minutes: u32, buffer_minutes: u32) -> Vec<TimeRange> {
        let mut slots = Vec::new();
        if !self.is_available || duration_minutes == 0 {
            return slots;
        }
        let length = chrono::Duration::minutes(i64::from(duration_minutes));
        let gap = chrono::Duration::minutes(i64::from(buffer_minutes));
        let mut start = self.working_hours.start;
        loop {
            let (end, wrapped) = start.overflowing_add_signed(length);
            if wrapped != 0 || end > self.working_hours.end {
                break;
            }
            let slot = TimeRange::new(start, end);
            if let Some(brk) = self.break_time.filter(|b| b.overlaps(&slot)) {
                start = brk.end;
                continue;
            }
            slots.push(slot);
            let (next, wrapped) = end.overflowing_add_signed(gap);
            if wrapped != 0 {
                break;
            }
            start = next;
        }
        slots
    }
}

#[derive(Debug)]
pub struct AvailabilityTemplate {
    days: Vec<DaySchedule>,
    appointment_duration: u32,
    buffer_minutes: u32,
    booking_window_days: u32,
    leave_requests: Vec<LeaveRequest>,
    subscribers: Subscribers<AvailabilityEvent>,
}

impl Default for AvailabilityTemplate {
    fn default() -> Self {
        Self {
            days: (0..7).map(DaySchedule::default_for).collect(),
            appointment_duration: 30,
            buffer_minutes: 0,
            booking_window_days: 30,
            leave_requests: Vec::new(),
            subscribers: Subscribers::new(),
        }
    }
}

/// Serializable snapshot of the template settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySettings {
    pub weekly_schedule: Vec<DaySchedule>,
    pub appointment_duration: u32,
    pub buffer_minutes: u32,
    pub booking_window_days: u32,
}

impl AvailabilityTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default weekly schedule with the configured slot settings. Each
    /// unsupported value falls back to its default.
    pub fn from_config(config: &PortalConfig) -> Self {
        let mut template = Self::default();
        if let Err(e) = template.set_appointment_duration(config.appointment_duration_minutes) {
            tracing::warn!(error = %e, "Ignoring configured appointment duration");
        }
        if let Err(e) = template.set_buffer_minutes(config.buffer_minutes) {
            tracing::warn!(error = %e, "Ignoring configured buffer");
        }
        if let Err(e) = template.set_booking_window_days(config.booking_window_days) {
            tracing::warn!(error = %e, "Ignoring configured booking window");
        }
        template
    }

    pub fn subscribe(&mut self, listener: impl Fn(&AvailabilityEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn days(&self) -> &[DaySchedule] {
        &self.days
    }

    pub fn day(&self, day_of_week: u8) -> Option<&DaySchedule> {
        self.days.iter().find(|d| d.day_of_week == day_of_week)
    }

    pub fn appointment_duration(&self) -> u32 {
        self.appointment_duration
    }

    pub fn buffer_minutes(&self) -> u32 {
        self.buffer_minutes
    }

    pub fn booking_window_days(&self) -> u32 {
        self.booking_window_days
    }

    /// Merges `update` into the matching day. No entry matches outside 0–6,
    /// in which case nothing happens.
    pub fn update_day(&mut self, day_of_week: u8, update: &DayScheduleUpdate) -> bool {
        let Some(day) = self.days.iter_mut().find(|d| d.day_of_week == day_of_week) else {
            return false;
        };
        day.apply(update);
        tracing::debug!(day_of_week, "Availability day updated");
        self.subscribers.notify(&AvailabilityEvent::DayUpdated { day_of_week });
        true
    }

    /// Like `update_day`, but the merged result must validate.
    pub fn try_update_day(
        &mut self,
        day_of_week: u8,
        update: &DayScheduleUpdate,
    ) -> Result<(), AvailabilityError> {
        let current = self
            .day(day_of_week)
            .ok_or(AvailabilityError::InvalidDay(day_of_week))?;
        let mut merged = current.clone();
        merged.apply(update);
        if let Err(e) = merged.validate() {
            tracing::warn!(day_of_week, error = %e, "Rejected availability update");
            return Err(e);
        }
        self.update_day(day_of_week, update);
        Ok(())
    }

    /// Duration must be one of `DURATION_CHOICES`.
    pub fn set_appointment_duration(&mut self, minutes: u32) -> Result<(), AvailabilityError> {
        if !DURATION_CHOICES.contains(&minutes) {
            return Err(AvailabilityError::InvalidDuration(minutes));
        }
        if self.appointment_duration != minutes {
            self.appointment_duration = minutes;
            self.subscribers.notify(&AvailabilityEvent::DurationChanged { minutes });
        }
        Ok(())
    }

    /// Buffer must be one of `BUFFER_CHOICES`.
    pub fn set_buffer_minutes(&mut self, minutes: u32) -> Result<(), AvailabilityError> {
        if !BUFFER_CHOICES.contains(&minutes) {
            return Err(AvailabilityError::InvalidBuffer(minutes));
        }
        self.buffer_minutes = minutes;
        Ok(())
    }

    /// Window must be one of `BOOKING_WINDOW_CHOICES`.
    pub fn set_booking_window_days(&mut self, days: u32) -> Result<(), AvailabilityError> {
        if !BOOKING_WINDOW_CHOICES.contains(&days) {
            return Err(AvailabilityError::InvalidBookingWindow(days));
        }
        self.booking_window_days = days;
        Ok(())
    }

    /// Slots for one template day at the configured duration.
    pub fn available_slots(&self, day_of_week: u8) -> u32 {
        self.day(day_of_week)
            .map_or(0, |d| d.available_slots(self.appointment_duration))
    }

    pub fn weekly_slot_total(&self) -> u32 {
        self.days
            .iter()
            .map(|d| d.available_slots(self.appointment_duration))
            .sum()
    }

    /// Slots on a calendar date: zero on approved leave, otherwise the
    /// weekday template.
    pub fn available_slots_on(&self, date: NaiveDate) -> u32 {
        if self.is_on_leave(date) {
            return 0;
        }
        let dow = date.weekday().num_days_from_sunday() as u8;
        self.available_slots(dow)
    }

    pub fn slot_times_on(&self, date: NaiveDate) -> Vec<TimeRange> {
        if self.is_on_leave(date) {
            return Vec::new();
        }
        let dow = date.weekday().num_days_from_sunday() as u8;
        self.day(dow)
            .map(|d| d.slot_times(self.appointment_duration, self.buffer_minutes))
            .unwrap_or_default()
    }

    /// Whether `date` lies inside the booking window starting at `today`.
    pub fn is_bookable(&self, date: NaiveDate, today: NaiveDate) -> bool {
        let ahead = (date - today).num_days();
        (0..=i64::from(self.booking_window_days)).contains(&ahead)
            && self.available_slots_on(date) > 0
    }

    // ── Leave ───────────────────────────────────────────────

    pub fn leave_requests(&self) -> &[LeaveRequest] {
        &self.leave_requests
    }

    pub fn submit_leave(
        &mut self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
    ) -> Result<&LeaveRequest, AvailabilityError> {
        if end_date < start_date {
            return Err(AvailabilityError::InvertedLeave {
                start: start_date,
                end: end_date,
            });
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AvailabilityError::MissingReason);
        }
        let request = LeaveRequest {
            id: Uuid::new_v4().to_string(),
            start_date,
            end_date,
            reason: reason.to_string(),
            status: LeaveStatus::Pending,
        };
        let id = request.id.clone();
        self.leave_requests.push(request);
        tracing::info!(id = %id, %start_date, %end_date, "Leave request submitted");
        self.subscribers.notify(&AvailabilityEvent::LeaveSubmitted { id });
        Ok(&self.leave_requests[self.leave_requests.len() - 1])
    }

    pub fn decide_leave(&mut self, id: &str, status: LeaveStatus) -> Result<(), AvailabilityError> {
        let request = self
            .leave_requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AvailabilityError::LeaveNotFound(id.to_string()))?;
        request.status = status;
        self.subscribers.notify(&AvailabilityEvent::LeaveDecided {
            id: id.to_string(),
            status,
        });
        Ok(())
    }

    pub fn is_on_leave(&self, date: NaiveDate) -> bool {
        self.leave_requests
            .iter()
            .any(|r| r.status == LeaveStatus::Approved && r.covers(date))
    }

    // ── Persistence shapes ──────────────────────────────────

    pub fn settings(&self) -> AvailabilitySettings {
        AvailabilitySettings {
            weekly_schedule: self.days.clone(),
            appointment_duration: self.appointment_duration,
            buffer_minutes: self.buffer_minutes,
            booking_window_days: self.booking_window_days,
        }
    }

    /// Rows for the doctor-availability endpoint, one per weekday.
    pub fn to_rows(&self, doctor_id: &str) -> Vec<DoctorAvailability> {
        self.days
            .iter()
            .map(|d| DoctorAvailability {
                id: format!("{doctor_id}-{}", d.day_of_week),
                doctor_id: doctor_id.to_string(),
                day_of_week: d.day_of_week,
                start_time: d.working_hours.start,
                end_time: d.working_hours.end,
                break_start: d.break_time.map(|b| b.start),
                break_end: d.break_time.map(|b| b.end),
                is_available: d.is_available,
                max_appointments: d.max_appointments,
            })
            .collect()
    }

    /// Loads rows back into the template. Rows for unknown days are skipped;
    /// a break needs both ends to count.
    pub fn apply_rows(&mut self, rows: &[DoctorAvailability]) {
        for row in rows {
            let break_time = match (row.break_start, row.break_end) {
                (Some(start), Some(end)) => Some(TimeRange::new(start, end)),
                _ => None,
            };
            let update = DayScheduleUpdate {
                is_available: Some(row.is_available),
                working_hours: Some(TimeRange::new(row.start_time, row.end_time)),
                break_time: Some(break_time),
                max_appointments: Some(row.max_appointments),
            };
            self.update_day(row.day_of_week, &update);
        }
    }
}
