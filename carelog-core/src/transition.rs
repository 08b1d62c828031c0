//! The one local mutation: marking doses as taken.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{InstanceError, InstanceResult};
use crate::instance::ReminderInstance;
use crate::status::InstanceStatus;
use crate::time;

/// Mark a dose as taken at `now`.
///
/// Already-taken instances come back unchanged, `taken_at` included.
pub fn mark_taken(instance: &ReminderInstance, now: NaiveDateTime) -> ReminderInstance {
    let mut out = instance.clone();
    if !out.is_taken() {
        out.status = InstanceStatus::Success;
        out.taken_at = Some(now);
    }
    out
}

/// Mark every not-yet-taken instance; taken ones keep their `taken_at`.
pub fn mark_all_taken(instances: &[ReminderInstance], now: NaiveDateTime) -> Vec<ReminderInstance> {
    instances.iter().map(|i| mark_taken(i, now)).collect()
}

/// In-place variant over a working set. Returns whether anything changed.
pub fn mark_taken_by_id(
    instances: &mut [ReminderInstance],
    id: i64,
    now: NaiveDateTime,
) -> InstanceResult<bool> {
    let slot = instances
        .iter_mut()
        .find(|i| i.id == id)
        .ok_or(InstanceError::NotFound { id })?;
    if slot.is_taken() {
        return Ok(false);
    }
    *slot = mark_taken(slot, now);
    Ok(true)
}

/// Body of `PATCH /reminder-instances/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchInstance {
    pub status: InstanceStatus,
    pub taken_at: Option<String>,
}

impl PatchInstance {
    pub fn from_instance(instance: &ReminderInstance) -> Self {
        Self {
            status: instance.status,
            taken_at: instance.taken_at.map(time::to_wire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn marks_pending_and_failed() {
        let t = at(9, 12);
        for status in [InstanceStatus::Pending, InstanceStatus::Failed] {
            let i = ReminderInstance::new(1, 1, at(9, 0)).with_status(status);
            let out = mark_taken(&i, t);
            assert_eq!(out.status, InstanceStatus::Success);
            assert_eq!(out.taken_at, Some(t));
        }
    }

    #[test]
    fn second_mark_is_a_no_op() {
        let i = ReminderInstance::new(1, 1, at(9, 0));
        let once = mark_taken(&i, at(9, 5));
        let twice = mark_taken(&once, at(11, 0));
        assert_eq!(twice, once);
        assert_eq!(twice.taken_at, Some(at(9, 5)));
    }

    #[test]
    fn bulk_keeps_existing_taken_at() {
        let list = vec![
            ReminderInstance::new(1, 1, at(8, 0))
                .with_status(InstanceStatus::Success)
                .with_taken_at(at(8, 3)),
            ReminderInstance::new(2, 1, at(12, 0)),
            ReminderInstance::new(3, 1, at(20, 0)).with_status(InstanceStatus::Failed),
        ];
        let now = at(21, 0);
        let out = mark_all_taken(&list, now);
        assert!(out.iter().all(|i| i.is_taken()));
        assert_eq!(out[0].taken_at, Some(at(8, 3)));
        assert_eq!(out[1].taken_at, Some(now));
        assert_eq!(out[2].taken_at, Some(now));
    }

    #[test]
    fn by_id_reports_changes_and_missing() {
        let mut list = vec![ReminderInstance::new(1, 1, at(8, 0))];
        assert_eq!(mark_taken_by_id(&mut list, 1, at(8, 1)), Ok(true));
        assert_eq!(mark_taken_by_id(&mut list, 1, at(8, 2)), Ok(false));
        assert_eq!(list[0].taken_at, Some(at(8, 1)));
        assert_eq!(
            mark_taken_by_id(&mut list, 42, at(8, 2)),
            Err(InstanceError::NotFound { id: 42 })
        );
    }

    #[test]
    fn patch_body_shape() {
        let i = mark_taken(&ReminderInstance::new(1, 1, at(8, 0)), at(8, 4));
        let body = serde_json::to_value(PatchInstance::from_instance(&i)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "status": "success", "taken_at": "2024-11-15T08:04:00" })
        );
    }
}
