//! carelog-core: calendar bucketing and dose aggregation for medication reminders.

pub mod calendar;
pub mod error;
pub mod instance;
pub mod optimistic;
pub mod status;
pub mod time;
pub mod today;
pub mod transition;

pub use calendar::{
    Appointment, CalendarEvent, DaySummary, EventKind, MonthGrid, MonthProjection,
    appointment_event,
};
pub use error::{InstanceError, InstanceResult};
pub use instance::{Medicine, Normalized, Normalizer, RawInstance, ReminderInstance};
pub use optimistic::{OptimisticUpdate, Phase};
pub use status::{DeliveryMethod, InstanceStatus};
pub use today::{TodaySummary, for_today, next_pending, recent_outcomes, summarize, upcoming};
pub use transition::{PatchInstance, mark_all_taken, mark_taken, mark_taken_by_id};
