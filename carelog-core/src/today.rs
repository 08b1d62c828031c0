//! Dashboard aggregates: today's doses, done/pending counts, what's next.
//!
//! Every function takes "now" from the caller; nothing here reads the clock.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::instance::ReminderInstance;
use crate::status::InstanceStatus;
use crate::time;

/// Two-bucket summary used by the dashboard header.
///
/// `pending` is everything not taken, failed doses included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodaySummary {
    pub total: usize,
    pub done: usize,
    pub pending: usize,
}

impl TodaySummary {
    /// Whole percent of doses taken, 0 when there are none.
    pub fn percent_done(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.done * 100) / self.total) as u32
    }
}

/// Instances scheduled in `[midnight, next midnight)` of `now`'s date.
pub fn for_today(instances: &[ReminderInstance], now: NaiveDateTime) -> Vec<ReminderInstance> {
    let (start, end) = time::day_bounds(now.date());
    instances
        .iter()
        .filter(|i| i.scheduled_datetime >= start && i.scheduled_datetime < end)
        .cloned()
        .collect()
}

pub fn summarize(instances: &[ReminderInstance]) -> TodaySummary {
    let total = instances.len();
    let done = instances
        .iter()
        .filter(|i| i.status == InstanceStatus::Success)
        .count();
    TodaySummary {
        total,
        done,
        pending: total - done,
    }
}

/// Earliest not-yet-taken instance; ties keep input order.
pub fn next_pending(instances: &[ReminderInstance]) -> Option<&ReminderInstance> {
    // min_by_key returns the first of equal minima.
    instances
        .iter()
        .filter(|i| !i.is_taken())
        .min_by_key(|i| i.scheduled_datetime)
}

/// First `limit` instances by scheduled time (stable sort).
pub fn upcoming(instances: &[ReminderInstance], limit: usize) -> Vec<ReminderInstance> {
    let mut sorted = instances.to_vec();
    sorted.sort_by_key(|i| i.scheduled_datetime);
    sorted.truncate(limit);
    sorted
}

/// The last `limit` instances that already have an outcome, in input order.
pub fn recent_outcomes(instances: &[ReminderInstance], limit: usize) -> Vec<ReminderInstance> {
    let outcomes: Vec<_> = instances
        .iter()
        .filter(|i| i.status != InstanceStatus::Pending)
        .collect();
    let skip = outcomes.len().saturating_sub(limit);
    outcomes.into_iter().skip(skip).cloned().collect()
}
