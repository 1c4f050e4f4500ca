//! Patient queue for one provider and one day.
//!
//! The store owns the master appointment collection and an explicit ordered
//! list of queued appointment ids. Position in that list is the rank shown on
//! the dashboard, independent of priority or scheduled time. Cancelled entries
//! keep their slot in storage but are filtered out of the visible queue, and
//! every index-based operation is resolved against the visible queue.
//!
//! Queue lifecycle: ENQUEUED (waiting/confirmed) → ATTENDED (removed, completed)
//!                                               → CANCELLED (kept, hidden)

use chrono::{DateTime, NaiveDate, Utc};

use crate::events::{Subscribers, SubscriptionId};
use crate::models::{Appointment, AppointmentStatus};

/// Emitted once after every mutation that changed the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    Enqueued { id: String },
    /// Visible positions of the moved entry before and after the swap.
    Reordered { from: usize, to: usize },
    Attended { id: String },
    Postponed { id: String },
    Cancelled { id: String },
}

#[derive(Debug, Default)]
pub struct QueueStore {
    appointments: Vec<Appointment>,
    queue: Vec<String>,
    subscribers: Subscribers<QueueEvent>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with a master collection. Appointments dated `today`
    /// with a waiting or confirmed status are queued in collection order.
    pub fn from_appointments(appointments: Vec<Appointment>, today: NaiveDate) -> Self {
        let queue = appointments
            .iter()
            .filter(|a| a.date == today && a.status.is_queueable())
            .map(|a| a.id.clone())
            .collect();
        Self {
            appointments,
            queue,
            subscribers: Subscribers::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl Fn(&QueueEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ── Queries ─────────────────────────────────────────────

    /// Master collection, including appointments that were never queued.
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn appointment(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    /// Master-collection appointments on `date`, in insertion order.
    pub fn appointments_for_date(&self, date: NaiveDate) -> Vec<&Appointment> {
        self.appointments.iter().filter(|a| a.date == date).collect()
    }

    /// Entries in underlying storage, cancelled ones included.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The rendered queue: non-cancelled entries in rank order.
    pub fn visible(&self) -> Vec<&Appointment> {
        self.queue
            .iter()
            .filter_map(|id| self.appointment(id))
            .filter(|a| !a.is_cancelled())
            .collect()
    }

    /// Badge count ("N waiting").
    pub fn waiting_count(&self) -> usize {
        self.visible().len()
    }

    pub fn next_patient(&self) -> Option<&Appointment> {
        self.visible().into_iter().next()
    }

    pub fn is_queued(&self, id: &str) -> bool {
        self.queue.iter().any(|q| q == id)
    }

    // ── Reordering ──────────────────────────────────────────

    /// Swaps the visible entry at `index` with the one above it. No-op at the
    /// top or out of range.
    pub fn move_up(&mut self, index: usize) -> bool {
        if index == 0 {
            return false;
        }
        self.swap_visible(index, index - 1)
    }

    /// Swaps the visible entry at `index` with the one below it. No-op at the
    /// bottom or out of range.
    pub fn move_down(&mut self, index: usize) -> bool {
        index
            .checked_add(1)
            .is_some_and(|to| self.swap_visible(index, to))
    }

    fn swap_visible(&mut self, from: usize, to: usize) -> bool {
        let positions = self.visible_positions();
        let (Some(&a), Some(&b)) = (positions.get(from), positions.get(to)) else {
            return false;
        };
        self.queue.swap(a, b);
        tracing::debug!(from, to, "Queue reordered");
        self.subscribers.notify(&QueueEvent::Reordered { from, to });
        true
    }

    /// Storage positions of the visible entries, in order.
    fn visible_positions(&self) -> Vec<usize> {
        self.queue
            .iter()
            .enumerate()
            .filter(|(_, id)| self.appointment(id).is_some_and(|a| !a.is_cancelled()))
            .map(|(pos, _)| pos)
            .collect()
    }

    // ── State transitions ───────────────────────────────────

    /// Appends to the tail. The master collection entry is inserted or
    /// replaced. Already-queued ids, zero-duration appointments and statuses
    /// other than waiting or confirmed are ignored.
    pub fn enqueue(&mut self, appointment: Appointment) -> bool {
        if let Err(e) = appointment.validate() {
            tracing::warn!(error = %e, "Refusing to enqueue appointment");
            return false;
        }
        if !appointment.status.is_queueable() {
            tracing::warn!(
                id = %appointment.id,
                status = %appointment.status,
                "Refusing to enqueue appointment that is not waiting or confirmed"
            );
            return false;
        }
        if self.is_queued(&appointment.id) {
            return false;
        }
        let id = appointment.id.clone();
        match self.appointments.iter_mut().find(|a| a.id == id) {
            Some(existing) => *existing = appointment,
            None => self.appointments.push(appointment),
        }
        self.queue.push(id.clone());
        tracing::debug!(id = %id, "Appointment enqueued");
        self.subscribers.notify(&QueueEvent::Enqueued { id });
        true
    }

    /// Removes a visible entry from the queue and marks it completed in the
    /// master collection.
    pub fn attend(&mut self, id: &str) -> bool {
        if !self.is_visible(id) {
            return false;
        }
        self.queue.retain(|q| q != id);
        self.set_status(id, AppointmentStatus::Completed, Utc::now());
        tracing::debug!(id, "Patient attended");
        self.subscribers.notify(&QueueEvent::Attended { id: id.to_string() });
        true
    }

    /// Marks a visible entry confirmed without moving it.
    pub fn postpone(&mut self, id: &str) -> bool {
        if !self.is_visible(id) {
            return false;
        }
        self.set_status(id, AppointmentStatus::Confirmed, Utc::now());
        tracing::debug!(id, "Appointment postponed");
        self.subscribers.notify(&QueueEvent::Postponed { id: id.to_string() });
        true
    }

    /// Marks a visible entry cancelled. It keeps its storage slot but drops
    /// out of the visible queue.
    pub fn cancel(&mut self, id: &str) -> bool {
        if !self.is_visible(id) {
            return false;
        }
        self.set_status(id, AppointmentStatus::Cancelled, Utc::now());
        tracing::debug!(id, "Appointment cancelled");
        self.subscribers.notify(&QueueEvent::Cancelled { id: id.to_string() });
        true
    }

    fn is_visible(&self, id: &str) -> bool {
        self.is_queued(id) && self.appointment(id).is_some_and(|a| !a.is_cancelled())
    }

    fn set_status(&mut self, id: &str, status: AppointmentStatus, now: DateTime<Utc>) {
        if let Some(appt) = self.appointments.iter_mut().find(|a| a.id == id) {
            appt.set_status(status, now);
        }
    }
}

// ── Waiting time ───────────────────────────────────────────

/// Whole minutes since the appointment was created, never negative.
pub fn waiting_minutes(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_minutes().max(0)
}

/// `"45 min"` under an hour, `"1h 5m"` otherwise.
pub fn format_waiting_time(minutes: i64) -> String {
    if minutes < 60 {
        return format!("{minutes} min");
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}
