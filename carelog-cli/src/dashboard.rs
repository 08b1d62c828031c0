//! Today / upcoming / history text views.

use carelog_core::{ReminderInstance, next_pending, summarize};
use chrono::{Datelike, NaiveDateTime};
use std::fmt::Write;

use crate::calendar::month_name;

fn line(i: &ReminderInstance) -> String {
    let mut s = format!(
        "{} {:<10} {}",
        i.scheduled_datetime.format("%H:%M"),
        i.status.label(),
        i.medicine_name
    );
    if !i.dosage.is_empty() {
        let _ = write!(s, " {}", i.dosage);
    }
    let _ = write!(s, " [#{}, {}", i.id, i.method);
    if i.retry_count > 0 {
        let _ = write!(s, ", intentos {}/{}", i.retry_count, i.max_retries);
    }
    s.push(']');
    if let Some(t) = i.taken_at {
        let _ = write!(s, " tomado a las {}", t.format("%H:%M"));
    }
    s
}

/// Header with counts, the next dose, then today's list in time order.
pub fn render_today(today: &[ReminderInstance], now: NaiveDateTime) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "Hoy, {} de {}\n",
        now.format("%-d"),
        month_name(now.month())
    );

    let sum = summarize(today);
    let _ = writeln!(
        s,
        "Tomadas {} de {} ({}%), pendientes {}",
        sum.done,
        sum.total,
        sum.percent_done(),
        sum.pending
    );

    match next_pending(today) {
        Some(next) => {
            let _ = writeln!(s, "Siguiente: {}\n", line(next));
        }
        None if today.is_empty() => {
            let _ = writeln!(s, "Sin recordatorios para hoy.\n");
        }
        None => {
            let _ = writeln!(s, "Todo tomado.\n");
        }
    }

    let mut sorted = today.to_vec();
    sorted.sort_by_key(|i| i.scheduled_datetime);
    for i in &sorted {
        let _ = writeln!(s, "  {}", line(i));
    }
    s
}

/// Dated list, for upcoming doses and execution history.
pub fn render_list(title: &str, instances: &[ReminderInstance]) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "{title}\n");
    if instances.is_empty() {
        let _ = writeln!(s, "  (nada)");
    }
    for i in instances {
        let _ = writeln!(s, "  {} {}", i.scheduled_datetime.format("%d/%m"), line(i));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use carelog_core::{DeliveryMethod, InstanceStatus};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn today_header_and_next() {
        let list = vec![
            ReminderInstance::new(1, 1, at(9, 0)).with_medicine("Aspirina", "100mg"),
            ReminderInstance::new(2, 1, at(8, 0))
                .with_medicine("Losartán", "")
                .with_status(InstanceStatus::Failed)
                .with_method(DeliveryMethod::Call),
            ReminderInstance::new(3, 1, at(7, 0))
                .with_status(InstanceStatus::Success)
                .with_taken_at(at(7, 10)),
        ];
        let out = render_today(&list, at(12, 0));
        assert!(out.starts_with("Hoy, 15 de Noviembre"));
        assert!(out.contains("Tomadas 1 de 3 (33%), pendientes 2"));
        assert!(out.contains("Siguiente: 08:00 No tomado"));
        assert!(out.contains("[#2, call]"));
        assert!(out.contains("tomado a las 07:10"));
    }

    #[test]
    fn empty_states() {
        assert!(render_today(&[], at(12, 0)).contains("Sin recordatorios para hoy."));
        let done = vec![ReminderInstance::new(1, 1, at(9, 0)).with_status(InstanceStatus::Success)];
        assert!(render_today(&done, at(12, 0)).contains("Todo tomado."));
        assert!(render_list("Próximas", &[]).contains("(nada)"));
    }
}
