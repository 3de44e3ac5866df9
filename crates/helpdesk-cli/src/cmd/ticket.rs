use crate::cmd::block_on;
use crate::output::{or_dash, print_json, print_table, print_ticket, timestamp};
use crate::root::{open_desk, require_actor};
use anyhow::Context;
use clap::Subcommand;
use helpdesk_core::ticket::NewTicket;
use helpdesk_core::types::TicketStatus;
use helpdesk_core::view::{TicketQuery, TicketView};
use std::path::Path;

#[derive(Subcommand)]
pub enum TicketSubcommand {
    /// Open a ticket; it is triaged automatically
    Create {
        #[arg(required = true)]
        title: Vec<String>,
        #[arg(long, short = 'd')]
        description: String,
    },
    /// List tickets visible to the acting actor
    List {
        #[arg(long)]
        status: Option<TicketStatus>,
        #[arg(long)]
        sector: Option<String>,
        /// Case-insensitive match on id, title, sector or requester
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a ticket and its messages
    Show { id: String },
    /// Post a message on a ticket
    Reply {
        id: String,
        #[arg(required = true)]
        message: Vec<String>,
        /// Post as an internal note (staff only)
        #[arg(long)]
        internal: bool,
    },
    /// Take a ticket
    Assign { id: String },
    /// Mark a ticket resolved
    Resolve { id: String },
    /// Close a resolved ticket
    Close { id: String },
    /// Reopen a resolved ticket
    Reopen { id: String },
    /// Rate a resolved ticket from 1 to 5
    Rate { id: String, score: u8 },
}

pub fn run(
    root: &Path,
    actor: Option<&str>,
    subcmd: TicketSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let me = require_actor(actor)?;

    match subcmd {
        TicketSubcommand::Create { title, description } => {
            create(root, me, title.join(" "), description, json)
        }
        TicketSubcommand::List {
            status,
            sector,
            search,
        } => list(
            root,
            me,
            &TicketQuery {
                status,
                sector,
                text: search,
            },
            json,
        ),
        TicketSubcommand::Show { id } => {
            let view = open_desk(root)?.ticket(me, &id)?;
            show(&view, json)
        }
        TicketSubcommand::Reply {
            id,
            message,
            internal,
        } => {
            let desk = open_desk(root)?;
            let m = desk.send_message(me, &id, &message.join(" "), internal)?;
            if json {
                return print_json(&m);
            }
            let status = desk.ticket(me, &id)?.status;
            let kind = if m.is_internal { "internal note" } else { "message" };
            println!("Posted {kind} {} on {id} (status: {status})", m.id);
            Ok(())
        }
        TicketSubcommand::Assign { id } => {
            let view = open_desk(root)?.assign_to_self(me, &id)?;
            moved(&view, "Took", json)
        }
        TicketSubcommand::Resolve { id } => {
            let view = open_desk(root)?.resolve(me, &id)?;
            moved(&view, "Resolved", json)
        }
        TicketSubcommand::Close { id } => {
            let view = open_desk(root)?.close(me, &id)?;
            moved(&view, "Closed", json)
        }
        TicketSubcommand::Reopen { id } => {
            let view = open_desk(root)?.reopen(me, &id)?;
            moved(&view, "Reopened", json)
        }
        TicketSubcommand::Rate { id, score } => {
            let view = open_desk(root)?.rate(me, &id, score)?;
            if json {
                return print_json(&view);
            }
            println!("Rated {} {score}/5", view.id);
            Ok(())
        }
    }
}

fn create(
    root: &Path,
    me: &str,
    title: String,
    description: String,
    json: bool,
) -> anyhow::Result<()> {
    let desk = open_desk(root)?;
    let config = desk.config().context("failed to load config")?;
    let classifier = helpdesk_classifier::from_config(&config.classifier);

    let view = block_on(desk.create_ticket(
        me,
        NewTicket { title, description },
        classifier.as_ref(),
    ))??;

    if json {
        return print_json(&view);
    }
    println!(
        "Opened {} in {} ({} priority)",
        view.id, view.sector, view.priority
    );
    if let Some(reply) = view.messages.iter().rev().find(|m| m.is_automated) {
        println!("\n{}:", reply.sender_name);
        for line in reply.content.lines() {
            println!("    {line}");
        }
    }
    Ok(())
}

fn list(root: &Path, me: &str, query: &TicketQuery, json: bool) -> anyhow::Result<()> {
    let tickets = open_desk(root)?.tickets(me, query)?;
    if json {
        return print_json(&tickets);
    }
    if tickets.is_empty() {
        println!("No tickets.");
        return Ok(());
    }
    let rows = tickets
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.status.to_string(),
                t.priority.to_string(),
                t.sector.clone(),
                t.requester_name.clone(),
                or_dash(t.assigned_agent_id.as_deref()),
                timestamp(&t.updated_at),
                t.title.clone(),
            ]
        })
        .collect();
    print_table(
        &[
            "ID", "STATUS", "PRIORITY", "SECTOR", "REQUESTER", "AGENT", "UPDATED", "TITLE",
        ],
        rows,
    );
    Ok(())
}

fn show(view: &TicketView, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(view);
    }
    print_ticket(view);
    Ok(())
}

fn moved(view: &TicketView, verb: &str, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(view);
    }
    println!("{verb} {} (status: {})", view.id, view.status);
    Ok(())
}
