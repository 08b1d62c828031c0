//! Optimistic "mark as taken": apply locally, let the caller dispatch the
//! remote patches, then confirm or roll back.
//!
//! ```text
//! Idle --begin--> Applying --confirm--> Confirmed
//!                     \------rollback--> RolledBack
//! ```
//!
//! Only the instances that actually changed are snapshotted, so a rollback
//! never clobbers doses that were already taken before `begin`.

use chrono::NaiveDateTime;

use crate::error::{InstanceError, InstanceResult};
use crate::instance::ReminderInstance;
use crate::transition::{PatchInstance, mark_taken_by_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Applying,
    Confirmed,
    RolledBack,
}

#[derive(Debug, Clone)]
pub struct OptimisticUpdate {
    phase: Phase,
    snapshot: Vec<ReminderInstance>,
}

impl Default for OptimisticUpdate {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimisticUpdate {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            snapshot: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Ids mutated by `begin`.
    pub fn touched_ids(&self) -> Vec<i64> {
        self.snapshot.iter().map(|i| i.id).collect()
    }

    /// Mark `ids` as taken in `working` and return the patches to send.
    ///
    /// Unknown ids fail the whole call before anything is mutated.
    pub fn begin(
        &mut self,
        working: &mut [ReminderInstance],
        ids: &[i64],
        now: NaiveDateTime,
    ) -> InstanceResult<Vec<(i64, PatchInstance)>> {
        self.expect_phase(Phase::Idle, "begin")?;

        if let Some(&missing) = ids.iter().find(|id| !working.iter().any(|i| i.id == **id)) {
            return Err(InstanceError::NotFound { id: missing });
        }

        let before: Vec<ReminderInstance> = working
            .iter()
            .filter(|i| ids.contains(&i.id) && !i.is_taken())
            .cloned()
            .collect();

        let mut patches = Vec::with_capacity(before.len());
        for original in &before {
            if mark_taken_by_id(working, original.id, now)? {
                if let Some(updated) = working.iter().find(|i| i.id == original.id) {
                    patches.push((updated.id, PatchInstance::from_instance(updated)));
                }
            }
        }

        tracing::debug!(
            changed = patches.len(),
            requested = ids.len(),
            "optimistic mark-as-taken applied"
        );
        self.snapshot = before;
        self.phase = Phase::Applying;
        Ok(patches)
    }

    /// Mark everything not yet taken in `working`.
    pub fn begin_all(
        &mut self,
        working: &mut [ReminderInstance],
        now: NaiveDateTime,
    ) -> InstanceResult<Vec<(i64, PatchInstance)>> {
        let ids: Vec<i64> = working.iter().filter(|i| !i.is_taken()).map(|i| i.id).collect();
        self.begin(working, &ids, now)
    }

    /// The backend accepted every patch.
    pub fn confirm(&mut self) -> InstanceResult<()> {
        self.expect_phase(Phase::Applying, "confirm")?;
        tracing::info!(ids = ?self.touched_ids(), "mark-as-taken confirmed");
        self.phase = Phase::Confirmed;
        Ok(())
    }

    /// Restore the pre-`begin` copies of the touched instances.
    pub fn rollback(&mut self, working: &mut [ReminderInstance]) -> InstanceResult<()> {
        self.expect_phase(Phase::Applying, "roll back")?;
        for original in &self.snapshot {
            if let Some(slot) = working.iter_mut().find(|i| i.id == original.id) {
                *slot = original.clone();
            }
        }
        tracing::warn!(ids = ?self.touched_ids(), "mark-as-taken rolled back");
        self.phase = Phase::RolledBack;
        Ok(())
    }

    fn expect_phase(&self, want: Phase, action: &'static str) -> InstanceResult<()> {
        if self.phase != want {
            return Err(InstanceError::InvalidTransition {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::InstanceStatus;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 15)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn working() -> Vec<ReminderInstance> {
        vec![
            ReminderInstance::new(1, 1, at(8))
                .with_status(InstanceStatus::Success)
                .with_taken_at(at(8)),
            ReminderInstance::new(2, 1, at(12)),
            ReminderInstance::new(3, 1, at(20)).with_status(InstanceStatus::Failed),
        ]
    }

    #[test]
    fn begin_then_confirm() {
        let mut list = working();
        let mut op = OptimisticUpdate::new();
        let patches = op.begin_all(&mut list, at(21)).unwrap();

        assert_eq!(op.phase(), Phase::Applying);
        assert_eq!(patches.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![2, 3]);
        assert!(list.iter().all(|i| i.is_taken()));
        assert_eq!(list[0].taken_at, Some(at(8)));

        op.confirm().unwrap();
        assert_eq!(op.phase(), Phase::Confirmed);
        assert!(op.confirm().is_err());
    }

    #[test]
    fn rollback_restores_only_touched() {
        let original = working();
        let mut list = original.clone();
        let mut op = OptimisticUpdate::new();
        op.begin(&mut list, &[1, 3], at(21)).unwrap();
        assert_eq!(op.touched_ids(), vec![3]);
        assert!(list[2].is_taken());

        op.rollback(&mut list).unwrap();
        assert_eq!(op.phase(), Phase::RolledBack);
        assert_eq!(list, original);
    }

    #[test]
    fn unknown_id_mutates_nothing() {
        let original = working();
        let mut list = original.clone();
        let mut op = OptimisticUpdate::new();
        assert_eq!(
            op.begin(&mut list, &[2, 99], at(21)),
            Err(InstanceError::NotFound { id: 99 })
        );
        assert_eq!(op.phase(), Phase::Idle);
        assert_eq!(list, original);
    }

    #[test]
    fn transitions_are_guarded() {
        let mut list = working();
        let mut op = OptimisticUpdate::new();
        assert_eq!(
            op.rollback(&mut list),
            Err(InstanceError::InvalidTransition {
                action: "roll back",
                phase: Phase::Idle
            })
        );
        op.begin(&mut list, &[2], at(21)).unwrap();
        assert!(op.begin(&mut list, &[3], at(21)).is_err());
    }
}
