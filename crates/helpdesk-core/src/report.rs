//! Ticket reports and report schedules.
//!
//! Layout:
//!   .helpdesk/schedules.yaml  : saved report schedules (S1, S2, …)
//!
//! Schedules are stored configuration only; nothing in this crate sends
//! them.

use crate::access::{AccessPolicy, Action};
use crate::actor::Actor;
use crate::error::{HelpdeskError, Result};
use crate::ticket::Ticket;
use crate::types::{Priority, TicketStatus};
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Ticket selection for a report. `None` fields match everything; the date
/// range is inclusive and compares the ticket's creation day in UTC.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub sector: Option<String>,
}

impl ReportFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let day = ticket.created_at.date_naive();
        self.from.map_or(true, |from| day >= from)
            && self.to.map_or(true, |to| day <= to)
            && self.status.map_or(true, |s| ticket.status == s)
            && self.sector.as_deref().map_or(true, |s| ticket.sector == s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    /// Resolved and closed tickets.
    pub resolved: usize,
    pub rated: usize,
    pub average_rating: f64,
    pub by_sector: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
}

pub fn filter<'a>(tickets: &'a [Ticket], filter: &ReportFilter) -> Vec<&'a Ticket> {
    tickets.iter().filter(|t| filter.matches(t)).collect()
}

pub fn summarize(tickets: &[Ticket], report_filter: &ReportFilter) -> ReportSummary {
    let selected = filter(tickets, report_filter);
    let mut by_sector = BTreeMap::new();
    let mut by_status = BTreeMap::new();
    let mut by_priority: BTreeMap<String, usize> = Priority::all()
        .iter()
        .map(|p| (p.as_str().to_string(), 0))
        .collect();
    let mut rating_sum = 0u32;
    let mut rated = 0usize;

    for t in &selected {
        *by_sector.entry(t.sector.clone()).or_insert(0) += 1;
        *by_status.entry(t.status.as_str().to_string()).or_insert(0) += 1;
        *by_priority.entry(t.priority.as_str().to_string()).or_insert(0) += 1;
        if let Some(r) = t.rating {
            rating_sum += u32::from(r);
            rated += 1;
        }
    }

    let resolved = selected
        .iter()
        .filter(|t| matches!(t.status, TicketStatus::Resolved | TicketStatus::Closed))
        .count();
    let average_rating = if rated == 0 {
        0.0
    } else {
        f64::from(rating_sum) / rated as f64
    };

    ReportSummary {
        total: selected.len(),
        resolved,
        rated,
        average_rating,
        by_sector,
        by_priority,
        by_status,
    }
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    OneTime,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::OneTime => "one_time",
        }
    }

    /// The next run after `from`. One-time schedules have no cadence.
    pub fn next_after(self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Frequency::Daily => Some(from + Duration::days(1)),
            Frequency::Weekly => Some(from + Duration::weeks(1)),
            Frequency::Monthly => from.checked_add_months(Months::new(1)),
            Frequency::OneTime => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Frequency {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "one_time" | "once" => Ok(Frequency::OneTime),
            _ => Err(HelpdeskError::validation(format!("unknown frequency '{s}'"))),
        }
    }
}

/// `None` means all sectors / all statuses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSchedule {
    pub id: String,
    pub name: String,
    pub active: bool,
    #[serde(default)]
    pub filters: ScheduleFilters,
    #[serde(default)]
    pub recipients: Vec<String>,
    pub frequency: Frequency,
    pub email_subject: String,
    #[serde(default)]
    pub email_body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
}

/// A schedule as submitted. Without an `id` it is created; with one it
/// replaces the stored schedule of that id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub filters: ScheduleFilters,
    #[serde(default)]
    pub recipients: Vec<String>,
    pub frequency: Frequency,
    pub email_subject: String,
    #[serde(default)]
    pub email_body: String,
}

fn default_active() -> bool {
    true
}

pub fn default_schedules() -> Vec<ReportSchedule> {
    let now = Utc::now();
    vec![ReportSchedule {
        id: "S1".to_string(),
        name: "Weekly general summary".to_string(),
        active: true,
        filters: ScheduleFilters::default(),
        recipients: vec!["management@example.com".to_string()],
        frequency: Frequency::Weekly,
        email_subject: "Weekly helpdesk summary".to_string(),
        email_body: "Hello,\n\nAttached is this week's summary across all sectors.".to_string(),
        next_run_at: Frequency::Weekly.next_after(now),
        last_run_at: None,
    }]
}

/// Trim, reject anything without an `@`, and dedupe keeping the first
/// occurrence.
pub fn normalize_recipients(recipients: &[String]) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for r in recipients {
        let r = r.trim();
        if r.is_empty() {
            continue;
        }
        if !r.contains('@') {
            return Err(HelpdeskError::validation(format!(
                "recipient '{r}' is not an email address"
            )));
        }
        if !out.iter().any(|e| e == r) {
            out.push(r.to_string());
        }
    }
    Ok(out)
}

fn next_id(schedules: &[ReportSchedule]) -> String {
    let max = schedules
        .iter()
        .filter_map(|s| s.id.strip_prefix('S')?.parse::<usize>().ok())
        .max()
        .unwrap_or(0);
    format!("S{}", max + 1)
}

pub fn find<'a>(schedules: &'a [ReportSchedule], id: &str) -> Result<&'a ReportSchedule> {
    schedules
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| HelpdeskError::ScheduleNotFound(id.to_string()))
}

pub fn save_schedule(
    schedules: &mut Vec<ReportSchedule>,
    policy: &AccessPolicy,
    admin: &Actor,
    input: ScheduleInput,
) -> Result<ReportSchedule> {
    policy.authorize(admin, Action::ManageReportSchedules)?;
    let name = input.name.trim();
    if name.is_empty() {
        return Err(HelpdeskError::validation("schedule name is required"));
    }
    if input.email_subject.trim().is_empty() {
        return Err(HelpdeskError::validation("email subject is required"));
    }
    let recipients = normalize_recipients(&input.recipients)?;

    let existing = match input.id.as_deref() {
        Some(id) => Some(
            schedules
                .iter()
                .position(|s| s.id == id)
                .ok_or_else(|| HelpdeskError::ScheduleNotFound(id.to_string()))?,
        ),
        None => None,
    };

    let (id, last_run_at, previous_next) = match existing {
        Some(pos) => {
            let s = &schedules[pos];
            (s.id.clone(), s.last_run_at, s.next_run_at)
        }
        None => (next_id(schedules), None, None),
    };
    let next_run_at = if !input.active {
        None
    } else {
        previous_next.or_else(|| input.frequency.next_after(Utc::now()))
    };

    let schedule = ReportSchedule {
        id,
        name: name.to_string(),
        active: input.active,
        filters: input.filters,
        recipients,
        frequency: input.frequency,
        email_subject: input.email_subject.trim().to_string(),
        email_body: input.email_body,
        next_run_at,
        last_run_at,
    };
    match existing {
        Some(pos) => schedules[pos] = schedule.clone(),
        None => schedules.push(schedule.clone()),
    }
    Ok(schedule)
}

/// Flip a schedule between active and paused. Returns the new state.
pub fn toggle_schedule(
    schedules: &mut [ReportSchedule],
    policy: &AccessPolicy,
    admin: &Actor,
    id: &str,
) -> Result<bool> {
    policy.authorize(admin, Action::ManageReportSchedules)?;
    let s = schedules
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| HelpdeskError::ScheduleNotFound(id.to_string()))?;
    s.active = !s.active;
    s.next_run_at = if s.active {
        s.frequency.next_after(Utc::now())
    } else {
        None
    };
    Ok(s.active)
}

pub fn delete_schedule(
    schedules: &mut Vec<ReportSchedule>,
    policy: &AccessPolicy,
    admin: &Actor,
    id: &str,
    confirmed: bool,
) -> Result<ReportSchedule> {
    policy.authorize(admin, Action::ManageReportSchedules)?;
    let pos = schedules
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| HelpdeskError::ScheduleNotFound(id.to_string()))?;
    if !confirmed {
        return Err(HelpdeskError::validation(format!(
            "deleting schedule {id} requires confirmation"
        )));
    }
    Ok(schedules.remove(pos))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
