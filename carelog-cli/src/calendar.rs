//! Plain-text month and day views.

use carelog_core::{CalendarEvent, EventKind, MonthProjection};
use chrono::{Datelike, NaiveDate};
use std::fmt::Write;

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];
const DAY_NAMES: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sab"];

/// Cell width, in characters, of one day in the month grid.
const CELL: usize = 9;

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("?")
}

/// Month grid: each cell shows the day and `taken/total` for medicine events,
/// followed by a per-day breakdown.
pub fn render_month(p: &MonthProjection) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "{} {}\n", month_name(p.month()), p.year());

    for name in DAY_NAMES {
        let _ = write!(s, "{name:<width$}", width = CELL);
    }
    s.push('\n');

    for week in p.grid().weeks() {
        for cell in week {
            let text = match cell {
                None => String::new(),
                Some(day) => {
                    let sum = p.day_summary(day);
                    let appts = p
                        .events_for_day(day)
                        .iter()
                        .filter(|e| e.kind == EventKind::Appointment)
                        .count();
                    let mut t = format!("{day:>2}");
                    if !sum.is_empty() {
                        let _ = write!(t, " {}/{}", sum.completed, sum.total);
                    }
                    if appts > 0 {
                        t.push('*');
                    }
                    t
                }
            };
            let _ = write!(s, "{text:<width$}", width = CELL);
        }
        s.push('\n');
    }

    let month = p.month_summary();
    let _ = writeln!(
        s,
        "\nMes: {} dosis, {} tomadas, {} pendientes, {} no tomadas",
        month.total, month.completed, month.pending, month.rejected
    );

    for day in p.days() {
        let sum = p.day_summary(day);
        let _ = writeln!(
            s,
            "  {day:>2}: total {} | tomadas {} | pendientes {} | no tomadas {}",
            sum.total, sum.completed, sum.pending, sum.rejected
        );
    }
    s
}

fn describe(e: &CalendarEvent) -> String {
    match e.kind {
        EventKind::Medicine => {
            let label = e.status.map(|st| st.label()).unwrap_or("Pendiente");
            let mut line = format!("[{label}] {}", e.title);
            if !e.description.is_empty() {
                let _ = write!(line, " {}", e.description);
            }
            if let Some(method) = e.contact_method {
                let _ = write!(line, " ({method}");
                if let (Some(r), Some(max)) = (e.retries, e.max_retries) {
                    let _ = write!(line, ", intentos {r}/{max}");
                }
                line.push(')');
            }
            line
        }
        EventKind::Appointment => format!("[Cita] {} - {}", e.title, e.description),
    }
}

/// Day view with one row per hour.
pub fn render_day(p: &MonthProjection, day: u32) -> String {
    let mut s = String::new();
    let weekday = NaiveDate::from_ymd_opt(p.year(), p.month(), day)
        .map(|d| DAY_NAMES[d.weekday().num_days_from_sunday() as usize])
        .unwrap_or("?");
    let _ = writeln!(s, "{weekday}, {day} de {}\n", month_name(p.month()));

    for hour in 0..24 {
        let events = p.events_in_hour(day, hour);
        if events.is_empty() {
            let _ = writeln!(s, "{hour:02}:00");
            continue;
        }
        for (i, e) in events.iter().enumerate() {
            let slot = if i == 0 { format!("{hour:02}:00") } else { String::new() };
            let _ = writeln!(s, "{slot:<6} {} {}", e.time, describe(e));
        }
    }

    let sum = p.day_summary(day);
    let _ = writeln!(
        s,
        "\nTotal {} | tomadas {} | pendientes {} | no tomadas {}",
        sum.total, sum.completed, sum.pending, sum.rejected
    );
    s
}
