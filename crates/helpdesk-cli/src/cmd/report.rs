use crate::output::{or_dash, print_json, print_table, timestamp};
use crate::root::{open_desk, require_actor};
use chrono::NaiveDate;
use clap::Subcommand;
use helpdesk_core::report::{Frequency, ReportFilter, ReportSchedule, ScheduleFilters, ScheduleInput};
use helpdesk_core::types::TicketStatus;
use std::path::Path;

#[derive(Subcommand)]
pub enum ReportSubcommand {
    /// Summarize tickets
    Summary {
        /// First creation day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last creation day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        status: Option<TicketStatus>,
        #[arg(long)]
        sector: Option<String>,
    },
    /// Manage report schedules
    Schedule {
        #[command(subcommand)]
        subcommand: ScheduleSubcommand,
    },
}

#[derive(Subcommand)]
pub enum ScheduleSubcommand {
    /// List schedules
    List,
    /// Create a schedule, or replace one with --id
    Save {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "weekly")]
        frequency: Frequency,
        /// Recipient address; repeat for several
        #[arg(long = "to", required = true)]
        recipients: Vec<String>,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long)]
        sector: Option<String>,
        #[arg(long)]
        status: Option<TicketStatus>,
        /// Save the schedule paused
        #[arg(long)]
        paused: bool,
    },
    /// Pause or resume a schedule
    Toggle { id: String },
    /// Delete a schedule
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(
    root: &Path,
    actor: Option<&str>,
    subcmd: ReportSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let me = require_actor(actor)?;

    match subcmd {
        ReportSubcommand::Summary {
            from,
            to,
            status,
            sector,
        } => summary(
            root,
            me,
            &ReportFilter {
                from,
                to,
                status,
                sector,
            },
            json,
        ),
        ReportSubcommand::Schedule { subcommand } => schedule(root, me, subcommand, json),
    }
}

fn summary(root: &Path, me: &str, filter: &ReportFilter, json: bool) -> anyhow::Result<()> {
    let s = open_desk(root)?.report(me, filter)?;
    if json {
        return print_json(&s);
    }

    println!("Tickets:        {}", s.total);
    println!("Resolved:       {}", s.resolved);
    if s.rated > 0 {
        println!("Average rating: {:.1} ({} rated)", s.average_rating, s.rated);
    } else {
        println!("Average rating: - (none rated)");
    }

    println!("\nBy sector:");
    for (sector, n) in &s.by_sector {
        println!("  {sector:<20} {n}");
    }
    println!("\nBy priority:");
    for (priority, n) in &s.by_priority {
        println!("  {priority:<20} {n}");
    }
    println!("\nBy status:");
    for (status, n) in &s.by_status {
        println!("  {status:<20} {n}");
    }
    Ok(())
}

fn schedule(root: &Path, me: &str, subcmd: ScheduleSubcommand, json: bool) -> anyhow::Result<()> {
    let desk = open_desk(root)?;

    match subcmd {
        ScheduleSubcommand::List => {
            let schedules = desk.schedules(me)?;
            if json {
                return print_json(&schedules);
            }
            let rows = schedules
                .iter()
                .map(|s| {
                    vec![
                        s.id.clone(),
                        if s.active { "active" } else { "paused" }.to_string(),
                        s.frequency.to_string(),
                        s.next_run_at
                            .as_ref()
                            .map(timestamp)
                            .unwrap_or_else(|| "-".to_string()),
                        s.recipients.join(","),
                        s.name.clone(),
                    ]
                })
                .collect();
            print_table(&["ID", "STATE", "EVERY", "NEXT RUN", "TO", "NAME"], rows);
            Ok(())
        }
        ScheduleSubcommand::Save {
            id,
            name,
            frequency,
            recipients,
            subject,
            body,
            sector,
            status,
            paused,
        } => {
            let saved = desk.save_schedule(
                me,
                ScheduleInput {
                    id,
                    name,
                    active: !paused,
                    filters: ScheduleFilters { sector, status },
                    recipients,
                    frequency,
                    email_subject: subject,
                    email_body: body,
                },
            )?;
            done(&saved, "Saved", json)
        }
        ScheduleSubcommand::Toggle { id } => {
            let s = desk.toggle_schedule(me, &id)?;
            let verb = if s.active { "Resumed" } else { "Paused" };
            done(&s, verb, json)
        }
        ScheduleSubcommand::Delete { id, yes } => {
            let s = desk.delete_schedule(me, &id, yes)?;
            done(&s, "Deleted", json)
        }
    }
}

fn done(s: &ReportSchedule, verb: &str, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(s);
    }
    println!(
        "{verb} schedule {} ({}, sector {})",
        s.id,
        s.frequency,
        or_dash(s.filters.sector.as_deref())
    );
    Ok(())
}
