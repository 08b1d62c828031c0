//! Mark-as-taken against a live source: apply locally, patch remotely,
//! roll back on failure, then reload.

use anyhow::{Context, Result, bail};
use carelog_core::{
    Normalizer, OptimisticUpdate, RawInstance, ReminderInstance, for_today, summarize,
};
use chrono::NaiveDateTime;

use crate::api::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    One(i64),
    /// Every dose of today not yet taken.
    AllToday,
}

pub async fn run(
    source: &Source,
    normalizer: &Normalizer,
    target: Target,
    now: NaiveDateTime,
) -> Result<()> {
    let raws: Vec<RawInstance> = match target {
        Target::One(id) => source.one(id).await?.into_iter().collect(),
        Target::AllToday => source.today().await?,
    };
    let mut working = normalizer.normalize_all(&raws).instances;
    if target == Target::AllToday {
        working = for_today(&working, now);
    }

    let mut op = OptimisticUpdate::new();
    let patches = match target {
        Target::One(id) => op.begin(&mut working, &[id], now),
        Target::AllToday => op.begin_all(&mut working, now),
    }
    .context("applying mark-as-taken")?;

    if patches.is_empty() {
        println!("Nada que marcar: ya estaba tomado.");
        return Ok(());
    }
    let ids: Vec<i64> = patches.iter().map(|(id, _)| *id).collect();

    if let Err(err) = source.patch_many(&patches).await {
        op.rollback(&mut working)?;
        // Some patches may have landed; the backend is the source of truth.
        let kept: Vec<i64> = match reconcile(source, normalizer, &ids).await {
            Ok(fresh) => fresh.iter().filter(|i| i.is_taken()).map(|i| i.id).collect(),
            Err(reload) => {
                tracing::warn!("reload after failed save: {reload:#}");
                bail!("saving failed, backend state unknown: {err:#}");
            }
        };
        if kept.is_empty() {
            bail!("saving failed, nothing was marked: {err:#}");
        }
        bail!("saving failed for some doses, backend kept {kept:?}: {err:#}");
    }
    op.confirm()?;

    let reloaded = reconcile(source, normalizer, &ids).await?;
    for i in &reloaded {
        if !i.is_taken() {
            tracing::warn!(id = i.id, status = %i.status, "backend did not keep mark-as-taken");
        }
        println!(
            "#{} {} {} -> {}",
            i.id,
            i.scheduled_datetime.format("%d/%m %H:%M"),
            i.medicine_name,
            i.status.label()
        );
    }

    if target == Target::AllToday {
        let fresh = source.today().await.context("reloading today's doses")?;
        let sum = summarize(&for_today(&normalizer.normalize_all(&fresh).instances, now));
        println!("\nHoy: {} de {} tomadas", sum.done, sum.total);
    }
    Ok(())
}

/// Reload canonical state for `ids` from the source.
async fn reconcile(
    source: &Source,
    normalizer: &Normalizer,
    ids: &[i64],
) -> Result<Vec<ReminderInstance>> {
    let fresh = source.many(ids).await.context("reloading instances")?;
    Ok(normalizer.normalize_all(&fresh).instances)
}
