//! Calendar projection: reminder instances (and appointments) bucketed into
//! the days of one month, plus per-day status summaries.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

use crate::error::{InstanceError, InstanceResult};
use crate::instance::ReminderInstance;
use crate::status::{DeliveryMethod, InstanceStatus};
use crate::time;

/// Default slot length for a medicine event, in minutes.
pub const MEDICINE_EVENT_MINUTES: u32 = 15;

const APPOINTMENT_FALLBACK_TITLE: &str = "Cita";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Medicine,
    Appointment,
}

/// A day-indexed, display-oriented projection of something scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    /// Day of month, 1..=31.
    pub date: u32,
    pub title: String,
    /// `HH:MM`, 24-hour, viewer-local.
    pub time: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub description: String,
    pub starts_at: NaiveDateTime,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InstanceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_method: Option<DeliveryMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl CalendarEvent {
    pub fn is_medicine(&self) -> bool {
        self.kind == EventKind::Medicine
    }

    pub fn hour(&self) -> u32 {
        self.starts_at.hour()
    }
}

impl From<&ReminderInstance> for CalendarEvent {
    fn from(instance: &ReminderInstance) -> Self {
        let at = instance.scheduled_datetime;
        Self {
            id: instance.id.to_string(),
            date: at.day(),
            title: instance.medicine_name.clone(),
            time: time::format_hhmm(at),
            kind: EventKind::Medicine,
            description: instance.dosage.clone(),
            starts_at: at,
            status: Some(instance.status),
            retries: Some(instance.retry_count),
            max_retries: Some(instance.max_retries),
            contact_method: Some(instance.method),
            duration: Some(MEDICINE_EVENT_MINUTES),
        }
    }
}

/// A medical appointment as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub scheduled_datetime: String,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    pub address: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Project an appointment into a calendar event.
pub fn appointment_event(appointment: &Appointment, tz: Tz) -> InstanceResult<CalendarEvent> {
    let at = time::parse_timestamp(&appointment.scheduled_datetime, tz).ok_or_else(|| {
        InstanceError::InvalidTimestamp {
            id: appointment.id,
            field: "scheduled_datetime",
            value: appointment.scheduled_datetime.clone(),
        }
    })?;

    let title = non_empty(&appointment.doctor_name)
        .or_else(|| non_empty(&appointment.specialty))
        .unwrap_or_else(|| APPOINTMENT_FALLBACK_TITLE.to_string());
    let description =
        non_empty(&appointment.description).unwrap_or_else(|| appointment.address.clone());

    Ok(CalendarEvent {
        id: format!("appointment-{}", appointment.id),
        date: at.day(),
        title,
        time: time::format_hhmm(at),
        kind: EventKind::Appointment,
        description,
        starts_at: at,
        status: None,
        retries: None,
        max_retries: None,
        contact_method: None,
        duration: None,
    })
}

/// Counts of medicine events for one day (or a whole month).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub rejected: usize,
}

impl DaySummary {
    pub fn of<'a>(events: impl IntoIterator<Item = &'a CalendarEvent>) -> Self {
        let mut s = Self::default();
        for e in events.into_iter().filter(|e| e.is_medicine()) {
            s.total += 1;
            match e.status.unwrap_or_default() {
                InstanceStatus::Success => s.completed += 1,
                InstanceStatus::Pending => s.pending += 1,
                InstanceStatus::Failed => s.rejected += 1,
            }
        }
        s
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl Add for DaySummary {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            total: self.total + rhs.total,
            completed: self.completed + rhs.completed,
            pending: self.pending + rhs.pending,
            rejected: self.rejected + rhs.rejected,
        }
    }
}

impl AddAssign for DaySummary {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Month layout for a Sunday-first grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    /// Blank cells before the 1st (Sunday = 0).
    pub leading_blanks: u32,
}

impl MonthGrid {
    pub fn new(year: i32, month: u32) -> InstanceResult<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(InstanceError::InvalidMonth { year, month })?;
        let days_in_month =
            time::days_in_month(year, month).ok_or(InstanceError::InvalidMonth { year, month })?;
        Ok(Self {
            year,
            month,
            days_in_month,
            leading_blanks: first.weekday().num_days_from_sunday(),
        })
    }

    /// Blanks followed by the day numbers.
    pub fn cells(&self) -> Vec<Option<u32>> {
        (0..self.leading_blanks)
            .map(|_| None)
            .chain((1..=self.days_in_month).map(Some))
            .collect()
    }

    /// Cells split into rows of seven, the last row padded with blanks.
    pub fn weeks(&self) -> Vec<Vec<Option<u32>>> {
        let mut cells = self.cells();
        while cells.len() % 7 != 0 {
            cells.push(None);
        }
        cells.chunks(7).map(<[_]>::to_vec).collect()
    }

    pub fn contains(&self, day: u32) -> bool {
        (1..=self.days_in_month).contains(&day)
    }
}

/// Events of one month keyed by day-of-month. Days without events are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthProjection {
    grid: MonthGrid,
    days: BTreeMap<u32, Vec<CalendarEvent>>,
}

impl MonthProjection {
    /// Bucket the instances that fall in `[year-month-01, next month)` by day.
    ///
    /// Input order is kept within a day; nothing is sorted here.
    pub fn project(instances: &[ReminderInstance], year: i32, month: u32) -> InstanceResult<Self> {
        let grid = MonthGrid::new(year, month)?;
        let mut days: BTreeMap<u32, Vec<CalendarEvent>> = BTreeMap::new();

        for instance in instances
            .iter()
            .filter(|i| time::in_month(i.scheduled_datetime, year, month))
        {
            let event = CalendarEvent::from(instance);
            days.entry(event.date).or_default().push(event);
        }

        tracing::debug!(
            year,
            month,
            input = instances.len(),
            placed = days.values().map(Vec::len).sum::<usize>(),
            "projected reminder instances"
        );

        Ok(Self { grid, days })
    }

    /// Add appointments that fall in this month, after the medicine events of
    /// their day. Malformed appointments are skipped and returned.
    pub fn add_appointments(&mut self, appointments: &[Appointment], tz: Tz) -> Vec<InstanceError> {
        let mut rejected = Vec::new();
        for appointment in appointments {
            match appointment_event(appointment, tz) {
                Ok(event) => {
                    if time::in_month(event.starts_at, self.grid.year, self.grid.month) {
                        self.days.entry(event.date).or_default().push(event);
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, "skipping appointment");
                    rejected.push(err);
                }
            }
        }
        rejected
    }

    pub fn grid(&self) -> MonthGrid {
        self.grid
    }

    pub fn year(&self) -> i32 {
        self.grid.year
    }

    pub fn month(&self) -> u32 {
        self.grid.month
    }

    /// Days that have at least one event, ascending.
    pub fn days(&self) -> impl Iterator<Item = u32> + '_ {
        self.days.keys().copied()
    }

    pub fn events_for_day(&self, day: u32) -> &[CalendarEvent] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn day_summary(&self, day: u32) -> DaySummary {
        DaySummary::of(self.events_for_day(day))
    }

    /// Like [`Self::day_summary`] but rejects days outside the month.
    pub fn checked_day_summary(&self, day: u32) -> InstanceResult<DaySummary> {
        if !self.grid.contains(day) {
            return Err(InstanceError::UnknownDay {
                year: self.grid.year,
                month: self.grid.month,
                day,
            });
        }
        Ok(self.day_summary(day))
    }

    /// Events of `day` whose start hour is `hour` (the day view's slots).
    pub fn events_in_hour(&self, day: u32, hour: u32) -> Vec<&CalendarEvent> {
        self.events_for_day(day)
            .iter()
            .filter(|e| e.hour() == hour)
            .collect()
    }

    pub fn month_summary(&self) -> DaySummary {
        self.days
            .values()
            .map(|events| DaySummary::of(events))
            .fold(DaySummary::default(), Add::add)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
