//! Schedule calendar: month, week and day buckets over an appointment
//! collection, plus the navigation state behind the schedule screen.
//!
//! Month grids always cover whole weeks, so leading and trailing days from the
//! neighbouring months appear as context cells. Within a cell appointments
//! keep collection order unless `CellOrder::ByTime` is selected.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::PortalConfig;
use crate::models::{Appointment, AppointmentStatus, CalendarEvent, CalendarEventType};

/// Entries shown in a month cell before the "+N more" overflow.
pub const MONTH_CELL_PREVIEW: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Month,
    Week,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellOrder {
    /// Collection order.
    #[default]
    Inserted,
    /// Stable sort by time of day.
    ByTime,
}

/// Status and free-text filter applied before bucketing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub search: Option<String>,
}

impl AppointmentFilter {
    /// Search is case-insensitive over patient names, symptoms and clinic.
    pub fn matches(&self, appt: &Appointment) -> bool {
        if self.status.is_some_and(|s| s != appt.status) {
            return false;
        }
        let needle = match self.search.as_deref() {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => return true,
        };
        let contains = |field: Option<&str>| {
            field.is_some_and(|f| f.to_lowercase().contains(&needle))
        };
        let patient = appt.patient.as_ref();
        contains(patient.map(|p| p.first_name.as_str()))
            || contains(patient.map(|p| p.last_name.as_str()))
            || contains(appt.symptoms.as_deref())
            || contains(patient.and_then(|p| p.clinic_association.as_deref()))
    }
}

/// One calendar cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket<'a> {
    pub date: NaiveDate,
    /// False for context days of adjacent months in the month grid.
    pub in_current_month: bool,
    pub is_today: bool,
    pub appointments: Vec<&'a Appointment>,
}

impl<'a> DayBucket<'a> {
    /// What a month cell renders.
    pub fn preview(&self) -> &[&'a Appointment] {
        let n = self.appointments.len().min(MONTH_CELL_PREVIEW);
        &self.appointments[..n]
    }

    pub fn overflow(&self) -> usize {
        self.appointments.len().saturating_sub(MONTH_CELL_PREVIEW)
    }

    pub fn overflow_label(&self) -> Option<String> {
        match self.overflow() {
            0 => None,
            n => Some(format!("+{n} more")),
        }
    }
}

// ═══════════════════════════════════════════
// Date arithmetic
// ═══════════════════════════════════════════

/// First day of the week containing `date`, saturating at `NaiveDate::MIN`.
pub fn week_start(date: NaiveDate, starts_on: Weekday) -> NaiveDate {
    let back = (7 + date.weekday().num_days_from_monday() - starts_on.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(u64::from(back)))
        .unwrap_or(NaiveDate::MIN)
}

pub fn week_days(date: NaiveDate, starts_on: Weekday) -> Vec<NaiveDate> {
    week_start(date, starts_on).iter_days().take(7).collect()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Inclusive range of the month grid: start of the week holding the 1st
/// through the end of the week holding the last day.
pub fn month_grid_range(date: NaiveDate, starts_on: Weekday) -> (NaiveDate, NaiveDate) {
    let start = week_start(first_of_month(date), starts_on);
    let end = week_start(last_of_month(date), starts_on)
        .checked_add_days(Days::new(6))
        .unwrap_or(NaiveDate::MAX);
    (start, end)
}

// ═══════════════════════════════════════════
// Bucketing
// ═══════════════════════════════════════════

fn group_by_date<'a>(
    appointments: &'a [Appointment],
    filter: &AppointmentFilter,
    order: CellOrder,
) -> BTreeMap<NaiveDate, Vec<&'a Appointment>> {
    let mut groups: BTreeMap<NaiveDate, Vec<&'a Appointment>> = BTreeMap::new();
    for appt in appointments.iter().filter(|a| filter.matches(a)) {
        groups.entry(appt.date).or_default().push(appt);
    }
    if order == CellOrder::ByTime {
        for cell in groups.values_mut() {
            cell.sort_by_key(|a| a.time);
        }
    }
    groups
}

fn bucket_range<'a>(
    days: impl Iterator<Item = NaiveDate>,
    groups: &mut BTreeMap<NaiveDate, Vec<&'a Appointment>>,
    month: Option<(i32, u32)>,
    today: NaiveDate,
) -> Vec<DayBucket<'a>> {
    days.map(|date| DayBucket {
        date,
        in_current_month: month.map_or(true, |(y, m)| date.year() == y && date.month() == m),
        is_today: date == today,
        appointments: groups.remove(&date).unwrap_or_default(),
    })
    .collect()
}

/// Timed events for the given appointments, in input order. Times of day
/// are taken as UTC.
pub fn appointment_events(appointments: &[&Appointment]) -> Vec<CalendarEvent> {
    appointments
        .iter()
        .map(|a| {
            let start = a.date.and_time(a.time).and_utc();
            CalendarEvent {
                id: a.id.clone(),
                title: a.patient_name().unwrap_or_else(|| a.appointment_type.to_string()),
                start,
                end: start + chrono::Duration::minutes(i64::from(a.duration)),
                event_type: CalendarEventType::Appointment,
                status: a.status.to_string(),
            }
        })
        .collect()
}

// ═══════════════════════════════════════════
// View state
// ═══════════════════════════════════════════

/// Navigation and filter state of the schedule screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarView {
    pub reference: NaiveDate,
    pub mode: ViewMode,
    pub filter: AppointmentFilter,
    pub order: CellOrder,
    pub week_starts_on: Weekday,
}

impl CalendarView {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            reference: today,
            mode: ViewMode::Month,
            filter: AppointmentFilter::default(),
            order: CellOrder::Inserted,
            week_starts_on: Weekday::Sun,
        }
    }

    /// Starts on `today` with the configured first day of the week.
    pub fn from_config(today: NaiveDate, config: &PortalConfig) -> Self {
        Self {
            week_starts_on: config.week_starts_on,
            ..Self::new(today)
        }
    }

    pub fn with_mode(mut self, mode: ViewMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_order(mut self, order: CellOrder) -> Self {
        self.order = order;
        self
    }

    /// One calendar month forward (day clamped to month end), one week, or one day.
    pub fn next(&mut self) {
        self.reference = match self.mode {
            ViewMode::Month => self.reference.checked_add_months(Months::new(1)),
            ViewMode::Week => self.reference.checked_add_days(Days::new(7)),
            ViewMode::Day => self.reference.succ_opt(),
        }
        .unwrap_or(self.reference);
    }

    pub fn previous(&mut self) {
        self.reference = match self.mode {
            ViewMode::Month => self.reference.checked_sub_months(Months::new(1)),
            ViewMode::Week => self.reference.checked_sub_days(Days::new(7)),
            ViewMode::Day => self.reference.pred_opt(),
        }
        .unwrap_or(self.reference);
    }

    pub fn jump_to_today(&mut self, today: NaiveDate) {
        self.reference = today;
    }

    /// Cells for the current mode.
    pub fn cells<'a>(
        &self,
        appointments: &'a [Appointment],
        today: NaiveDate,
    ) -> Vec<DayBucket<'a>> {
        match self.mode {
            ViewMode::Month => self.month(appointments, today),
            ViewMode::Week => self.week(appointments, today),
            ViewMode::Day => vec![self.day(appointments, today)],
        }
    }

    pub fn month<'a>(
        &self,
        appointments: &'a [Appointment],
        today: NaiveDate,
    ) -> Vec<DayBucket<'a>> {
        let (start, end) = month_grid_range(self.reference, self.week_starts_on);
        let mut groups = group_by_date(appointments, &self.filter, self.order);
        let days = start.iter_days().take_while(|d| *d <= end);
        let month = Some((self.reference.year(), self.reference.month()));
        bucket_range(days, &mut groups, month, today)
    }

    pub fn week<'a>(
        &self,
        appointments: &'a [Appointment],
        today: NaiveDate,
    ) -> Vec<DayBucket<'a>> {
        let mut groups = group_by_date(appointments, &self.filter, self.order);
        let days = week_days(self.reference, self.week_starts_on).into_iter();
        bucket_range(days, &mut groups, None, today)
    }

    pub fn day<'a>(&self, appointments: &'a [Appointment], today: NaiveDate) -> DayBucket<'a> {
        let mut groups = group_by_date(appointments, &self.filter, self.order);
        DayBucket {
            date: self.reference,
            in_current_month: true,
            is_today: self.reference == today,
            appointments: groups.remove(&self.reference).unwrap_or_default(),
        }
    }

    /// Header text for the current mode.
    pub fn title(&self) -> String {
        match self.mode {
            ViewMode::Month => self.reference.format("%B %Y").to_string(),
            ViewMode::Week => {
                let days = week_days(self.reference, self.week_starts_on);
                let first = days.first().copied().unwrap_or(self.reference);
                let last = days.last().copied().unwrap_or(self.reference);
                format!("{} - {}", first.format("%b %-d"), last.format("%b %-d, %Y"))
            }
            ViewMode::Day => self.reference.format("%A, %B %-d, %Y").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::appointment::fixtures::{appointment, date, time};
    use crate::models::patient::fixtures::patient;

    fn ids(bucket: &DayBucket<'_>) -> Vec<String> {
        bucket.appointments.iter().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn month_grid_is_whole_weeks() {
        for reference in [
            date(2024, 1, 31),
            date(2024, 2, 1),
            date(2024, 2, 29),
            date(2024, 3, 15),
            date(2026, 2, 1),
            date(2023, 12, 31),
        ] {
            let view = CalendarView::new(reference);
            let cells = view.month(&[], reference);
            assert_eq!(cells.len() % 7, 0, "reference {reference}");
            assert_eq!(cells[0].date.weekday(), Weekday::Sun);
        }
    }

    #[test]
    fn month_grid_bounds_for_january_2024() {
        // Jan 1 2024 is a Monday, Jan 31 a Wednesday.
        let (start, end) = month_grid_range(date(2024, 1, 15), Weekday::Sun);
        assert_eq!(start, date(2023, 12, 31));
        assert_eq!(end, date(2024, 2, 3));
    }

    #[test]
    fn february_2026_fits_four_weeks() {
        let view = CalendarView::new(date(2026, 2, 10));
        let cells = view.month(&[], date(2026, 2, 10));
        assert_eq!(cells.len(), 28);
        assert!(cells.iter().all(|c| c.in_current_month));
    }

    #[test]
    fn context_days_flagged_outside_month() {
        let view = CalendarView::new(date(2024, 1, 15));
        let cells = view.month(&[], date(2024, 1, 15));
        assert!(!cells[0].in_current_month);
        assert!(cells[1].in_current_month);
        assert!(!cells.last().unwrap().in_current_month);
        assert_eq!(cells.iter().filter(|c| c.is_today).count(), 1);
    }

    #[test]
    fn month_cell_caps_preview_at_two() {
        let d = date(2024, 1, 15);
        let appts: Vec<_> = (0..5)
            .map(|i| appointment(&i.to_string(), d, time(9 + i, 0), AppointmentStatus::Confirmed))
            .collect();
        let view = CalendarView::new(d);
        let cells = view.month(&appts, d);
        let cell = cells.iter().find(|c| c.date == d).unwrap();
        assert_eq!(cell.preview().len(), 2);
        assert_eq!(cell.overflow(), 3);
        assert_eq!(cell.overflow_label().as_deref(), Some("+3 more"));

        let empty = cells.iter().find(|c| c.date == date(2024, 1, 16)).unwrap();
        assert!(empty.preview().is_empty());
        assert_eq!(empty.overflow_label(), None);
    }

    #[test]
    fn week_view_lists_all_without_cap() {
        let d = date(2024, 1, 17);
        let appts: Vec<_> = (0..4)
            .map(|i| appointment(&i.to_string(), d, time(9 + i, 0), AppointmentStatus::Confirmed))
            .collect();
        let view = CalendarView::new(d).with_mode(ViewMode::Week);
        let cells = view.week(&appts, d);
        assert_eq!(cells.len(), 7);
        assert_eq!(cells[0].date, date(2024, 1, 14));
        assert_eq!(cells[6].date, date(2024, 1, 20));
        assert_eq!(cells[3].appointments.len(), 4);
    }

    #[test]
    fn day_bucket_contains_only_that_date() {
        let d = date(2024, 1, 15);
        let appts = vec![
            appointment("prev", date(2024, 1, 14), time(9, 0), AppointmentStatus::Confirmed),
            appointment("on", d, time(9, 0), AppointmentStatus::Confirmed),
            appointment("next", date(2024, 1, 16), time(9, 0), AppointmentStatus::Confirmed),
        ];
        let view = CalendarView::new(d).with_mode(ViewMode::Day);
        assert_eq!(ids(&view.day(&appts, d)), vec!["on"]);
    }

    #[test]
    fn day_view_scenario_keeps_insertion_order() {
        let appts = vec![
            appointment("1", date(2024, 1, 15), time(9, 0), AppointmentStatus::Waiting),
            appointment("2", date(2024, 1, 15), time(10, 30), AppointmentStatus::Confirmed),
            appointment("3", date(2024, 1, 16), time(14, 0), AppointmentStatus::Confirmed),
        ];
        let view = CalendarView::new(date(2024, 1, 15)).with_mode(ViewMode::Day);
        let cells = view.cells(&appts, date(2024, 1, 15));
        assert_eq!(cells.len(), 1);
        assert_eq!(ids(&cells[0]), vec!["1", "2"]);
    }

    #[test]
    fn inserted_order_is_not_sorted_by_time() {
        let d = date(2024, 1, 15);
        let appts = vec![
            appointment("late", d, time(15, 0), AppointmentStatus::Confirmed),
            appointment("early", d, time(8, 0), AppointmentStatus::Confirmed),
        ];
        let view = CalendarView::new(d).with_mode(ViewMode::Day);
        assert_eq!(ids(&view.day(&appts, d)), vec!["late", "early"]);

        let sorted = view.with_order(CellOrder::ByTime);
        assert_eq!(ids(&sorted.day(&appts, d)), vec!["early", "late"]);
    }

    #[test]
    fn month_navigation_uses_calendar_months() {
        // ±30 days from Jan 31 would land on Mar 1; calendar months clamp to Feb 29.
        let mut view = CalendarView::new(date(2024, 1, 31));
        view.next();
        assert_eq!(view.reference, date(2024, 2, 29));
        view.previous();
        assert_eq!(view.reference, date(2024, 1, 29));
    }

    #[test]
    fn week_and_day_navigation_steps() {
        let mut view = CalendarView::new(date(2024, 1, 15)).with_mode(ViewMode::Week);
        view.next();
        assert_eq!(view.reference, date(2024, 1, 22));
        view.mode = ViewMode::Day;
        view.previous();
        assert_eq!(view.reference, date(2024, 1, 21));
        view.jump_to_today(date(2024, 3, 1));
        assert_eq!(view.reference, date(2024, 3, 1));
    }

    #[test]
    fn status_filter_applies_before_bucketing() {
        let d = date(2024, 1, 15);
        let appts = vec![
            appointment("1", d, time(9, 0), AppointmentStatus::Waiting),
            appointment("2", d, time(10, 0), AppointmentStatus::Cancelled),
        ];
        let mut view = CalendarView::new(d).with_mode(ViewMode::Day);
        view.filter.status = Some(AppointmentStatus::Cancelled);
        assert_eq!(ids(&view.day(&appts, d)), vec!["2"]);
    }

    #[test]
    fn search_matches_patient_symptoms_and_clinic() {
        let d = date(2024, 1, 15);
        let mut with_patient = appointment("1", d, time(9, 0), AppointmentStatus::Confirmed);
        let mut p = patient("p1", "Rajesh", "Kumar");
        p.clinic_association = Some("Apollo Hospital".into());
        with_patient.patient = Some(p);
        let mut with_symptoms = appointment("2", d, time(10, 0), AppointmentStatus::Confirmed);
        with_symptoms.symptoms = Some("Follow-up for diabetes management".into());

        let filter = |s: &str| AppointmentFilter {
            status: None,
            search: Some(s.into()),
        };
        assert!(filter("rajesh").matches(&with_patient));
        assert!(filter("KUMAR").matches(&with_patient));
        assert!(filter("apollo").matches(&with_patient));
        assert!(!filter("apollo").matches(&with_symptoms));
        assert!(filter("Diabetes").matches(&with_symptoms));
        assert!(filter("").matches(&with_symptoms));
    }

    #[test]
    fn titles_per_mode() {
        let view = CalendarView::new(date(2024, 1, 15));
        assert_eq!(view.title(), "January 2024");
        assert_eq!(view.clone().with_mode(ViewMode::Week).title(), "Jan 14 - Jan 20, 2024");
        assert_eq!(view.with_mode(ViewMode::Day).title(), "Monday, January 15, 2024");
    }

    #[test]
    fn monday_start_weeks() {
        let start = week_start(date(2024, 1, 14), Weekday::Mon);
        assert_eq!(start, date(2024, 1, 8));
        assert_eq!(week_start(date(2024, 1, 15), Weekday::Mon), date(2024, 1, 15));
    }

    #[test]
    fn events_span_appointment_duration() {
        let day = date(2024, 1, 15);
        let mut named = appointment("a1", day, time(9, 30), AppointmentStatus::Confirmed);
        named.patient = Some(patient("p1", "Anita", "Sharma"));
        let anonymous = appointment("a2", day, time(11, 0), AppointmentStatus::Waiting);

        let events = appointment_events(&[&named, &anonymous]);
        assert_eq!(events[0].title, "Anita Sharma");
        assert_eq!((events[0].end - events[0].start).num_minutes(), 30);
        assert_eq!(events[0].start.format("%H:%M").to_string(), "09:30");
        assert_eq!(events[1].title, "consultation");
        assert_eq!(events[1].status, "waiting");
        assert_eq!(events[1].event_type, CalendarEventType::Appointment);
    }

    #[test]
    fn extreme_dates_do_not_panic() {
        assert_eq!(week_start(NaiveDate::MIN, Weekday::Sun), NaiveDate::MIN);
        let (start, end) = month_grid_range(NaiveDate::MAX, Weekday::Sun);
        assert!(start <= end);
        assert_eq!(end, NaiveDate::MAX);

        for reference in [NaiveDate::MIN, NaiveDate::MAX] {
            for mode in [ViewMode::Month, ViewMode::Week, ViewMode::Day] {
                let mut view = CalendarView::new(reference).with_mode(mode);
                assert!(!view.title().is_empty());
                let _ = view.cells(&[], reference);
                view.next();
                view.previous();
            }
        }
    }

    #[test]
    fn configured_week_start() {
        let config = PortalConfig {
            week_starts_on: Weekday::Mon,
            ..PortalConfig::default()
        };
        let view = CalendarView::from_config(date(2024, 1, 17), &config).with_mode(ViewMode::Week);
        assert_eq!(view.title(), "Jan 15 - Jan 21, 2024");
        assert_eq!(view.week(&[], date(2024, 1, 17))[0].date, date(2024, 1, 15));
    }
}
