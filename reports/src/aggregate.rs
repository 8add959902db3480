use chrono::{DateTime, Duration, Utc};
use db::models::ticket::TicketStatus;
use serde::Serialize;
use util::config;

use crate::rows::{Technician, TicketRow};

/// Thresholds the aggregator is parameterised with.
#[derive(Debug, Clone, Copy)]
pub struct ReportSettings {
    /// A ticket not yet closed becomes overdue once it is older than this.
    pub overdue_after: Duration,
    /// Executive summary raises an alert when overdue exceeds this share of all tickets.
    pub alert_ratio: f64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            overdue_after: Duration::hours(24),
            alert_ratio: 0.2,
        }
    }
}

impl ReportSettings {
    /// Builds settings from raw values. A negative or unrepresentable threshold
    /// and a ratio outside `0.0..=1.0` fall back to the defaults.
    pub fn new(overdue_hours: i64, alert_ratio: f64) -> Self {
        let defaults = Self::default();

        let overdue_after = match Duration::try_hours(overdue_hours) {
            Some(threshold) if overdue_hours >= 0 => threshold,
            _ => {
                tracing::warn!(overdue_hours, "Invalid overdue threshold, using default");
                defaults.overdue_after
            }
        };

        let alert_ratio = if alert_ratio.is_finite() && (0.0..=1.0).contains(&alert_ratio) {
            alert_ratio
        } else {
            tracing::warn!(alert_ratio, "Invalid overdue alert ratio, using default");
            defaults.alert_ratio
        };

        Self {
            overdue_after,
            alert_ratio,
        }
    }

    pub fn from_config() -> Self {
        Self::new(
            config::overdue_threshold_hours(),
            config::overdue_alert_ratio(),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub total: u64,
    pub open: u64,
    pub in_progress: u64,
    pub closed: u64,
    pub overdue: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicianStats {
    pub technician_id: i64,
    pub username: String,
    pub assigned: u64,
    pub closed: u64,
    /// closed / assigned * 100, or 0 with nothing assigned.
    pub effectiveness: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub generated_at: DateTime<Utc>,
    pub counts: StateCounts,
    pub technicians: Vec<TechnicianStats>,
    pub overdue_alert: bool,
    pub narrative: Vec<String>,
}

pub fn is_overdue(row: &TicketRow, now: DateTime<Utc>, threshold: Duration) -> bool {
    row.status != TicketStatus::Closed && now - row.created_at > threshold
}

pub fn state_counts(rows: &[TicketRow], now: DateTime<Utc>, settings: &ReportSettings) -> StateCounts {
    rows.iter().fold(StateCounts::default(), |mut acc, row| {
        acc.total += 1;
        match row.status {
            TicketStatus::Open => acc.open += 1,
            TicketStatus::InProgress => acc.in_progress += 1,
            TicketStatus::Closed => acc.closed += 1,
        }
        if is_overdue(row, now, settings.overdue_after) {
            acc.overdue += 1;
        }
        acc
    })
}

pub fn effectiveness(assigned: u64, closed: u64) -> f64 {
    if assigned == 0 {
        0.0
    } else {
        closed as f64 / assigned as f64 * 100.0
    }
}

/// Per-technician workload. Every technician is listed, including idle ones,
/// in the order given.
pub fn technician_effectiveness(
    technicians: &[Technician],
    rows: &[TicketRow],
) -> Vec<TechnicianStats> {
    technicians
        .iter()
        .map(|tech| {
            let mine = rows.iter().filter(|r| r.technician_id == Some(tech.id));
            let (assigned, closed) = mine.fold((0u64, 0u64), |(a, c), r| {
                (a + 1, c + u64::from(r.status == TicketStatus::Closed))
            });
            TechnicianStats {
                technician_id: tech.id,
                username: tech.username.clone(),
                assigned,
                closed,
                effectiveness: effectiveness(assigned, closed),
            }
        })
        .collect()
}

pub fn overdue_alert(counts: &StateCounts, settings: &ReportSettings) -> bool {
    counts.total > 0 && counts.overdue as f64 > settings.alert_ratio * counts.total as f64
}

fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Plain-language paragraphs for the executive summary.
pub fn narrative(
    counts: &StateCounts,
    technicians: &[TechnicianStats],
    settings: &ReportSettings,
) -> Vec<String> {
    if counts.total == 0 {
        return vec!["No tickets have been filed yet.".to_string()];
    }

    let mut lines = vec![format!(
        "{} tickets on record: {} open, {} in progress and {} closed ({:.1}% resolution rate).",
        counts.total,
        counts.open,
        counts.in_progress,
        counts.closed,
        percent_of(counts.closed, counts.total)
    )];

    let hours = settings.overdue_after.num_hours();
    if overdue_alert(counts, settings) {
        lines.push(format!(
            "ALERT: {} tickets ({:.1}%) have been waiting more than {hours} hours, above the {:.0}% tolerance.",
            counts.overdue,
            percent_of(counts.overdue, counts.total),
            settings.alert_ratio * 100.0
        ));
    } else {
        lines.push(format!(
            "{} tickets have been waiting more than {hours} hours, within the {:.0}% tolerance.",
            counts.overdue,
            settings.alert_ratio * 100.0
        ));
    }

    let best = technicians
        .iter()
        .filter(|t| t.assigned > 0)
        .max_by(|a, b| a.effectiveness.total_cmp(&b.effectiveness));
    match best {
        Some(t) => lines.push(format!(
            "Most effective technician: {} with {} of {} tickets closed ({:.1}%).",
            t.username, t.closed, t.assigned, t.effectiveness
        )),
        None => lines.push("No tickets have been assigned to technicians yet.".to_string()),
    }

    lines
}

pub fn summarize(
    rows: &[TicketRow],
    technicians: &[Technician],
    now: DateTime<Utc>,
    settings: &ReportSettings,
) -> Summary {
    let counts = state_counts(rows, now, settings);
    let technicians = technician_effectiveness(technicians, rows);
    let narrative = narrative(&counts, &technicians, settings);

    Summary {
        generated_at: now,
        overdue_alert: overdue_alert(&counts, settings),
        counts,
        technicians,
        narrative,
    }
}
