use crate::output::{or_dash, print_json, print_table, timestamp};
use crate::root::{open_desk, require_actor};
use clap::Subcommand;
use helpdesk_core::actor::{Actor, Registration};
use helpdesk_core::types::Role;
use std::path::Path;

#[derive(Subcommand)]
pub enum ActorSubcommand {
    /// List active actors and pending registrations
    List,
    /// Approve a pending registration with a role
    Approve {
        id: String,
        #[arg(long, default_value = "requester")]
        role: Role,
    },
    /// Discard a pending registration
    Reject {
        id: String,
        /// Confirm the rejection
        #[arg(long)]
        yes: bool,
    },
    /// Change an actor's role
    Role { id: String, role: Role },
    /// Set or clear an actor's home sector
    Sector {
        id: String,
        /// Sector name; omit to clear
        sector: Option<String>,
    },
    /// Remove an actor
    Remove {
        id: String,
        /// Confirm the removal
        #[arg(long)]
        yes: bool,
    },
    /// Restrict registration to one email domain
    Domain {
        /// Domain such as example.com; omit to allow any
        domain: Option<String>,
    },
}

pub fn run(
    root: &Path,
    actor: Option<&str>,
    subcmd: ActorSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let me = require_actor(actor)?;
    let desk = open_desk(root)?;

    match subcmd {
        ActorSubcommand::List => {
            let directory = desk.actors(me)?;
            if json {
                return print_json(&directory);
            }
            if !directory.pending.is_empty() {
                println!("Pending registrations:");
                print_actors(&directory.pending);
                println!();
            }
            print_actors(&directory.active);
            Ok(())
        }
        ActorSubcommand::Approve { id, role } => {
            let a = desk.approve_registration(me, &id, role)?;
            report(&a, &format!("Approved {} as {}", a.id, a.role), json)
        }
        ActorSubcommand::Reject { id, yes } => {
            let a = desk.reject_registration(me, &id, yes)?;
            report(&a, &format!("Rejected registration {} ({})", a.id, a.name), json)
        }
        ActorSubcommand::Role { id, role } => {
            let a = desk.change_role(me, &id, role)?;
            report(&a, &format!("{} is now {}", a.id, a.role), json)
        }
        ActorSubcommand::Sector { id, sector } => {
            let a = desk.set_home_sector(me, &id, sector.as_deref())?;
            let msg = format!(
                "{} home sector: {}",
                a.id,
                or_dash(a.home_sector.as_deref())
            );
            report(&a, &msg, json)
        }
        ActorSubcommand::Remove { id, yes } => {
            let a = desk.remove_actor(me, &id, yes)?;
            report(&a, &format!("Removed {} ({})", a.id, a.name), json)
        }
        ActorSubcommand::Domain { domain } => {
            let config = desk.set_allowed_domain(me, domain.as_deref())?;
            if json {
                return print_json(&config.registration);
            }
            match config.allowed_domain() {
                Some(d) => println!("Registration restricted to @{d}"),
                None => println!("Registration open to any email domain"),
            }
            Ok(())
        }
    }
}

pub fn whoami(root: &Path, actor: Option<&str>, json: bool) -> anyhow::Result<()> {
    let me = require_actor(actor)?;
    let a = open_desk(root)?.whoami(me)?;
    let msg = format!(
        "{} ({}) {}, home sector {}",
        a.name,
        a.id,
        a.role,
        or_dash(a.home_sector.as_deref())
    );
    report(&a, &msg, json)
}

pub fn register(
    root: &Path,
    name: String,
    registration_number: String,
    email: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let a = open_desk(root)?.register(Registration {
        name,
        registration_number,
        email,
    })?;
    report(
        &a,
        &format!(
            "Registered {} as {}. An administrator must approve the account.",
            a.name, a.id
        ),
        json,
    )
}

fn report(actor: &Actor, message: &str, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(actor)
    } else {
        println!("{message}");
        Ok(())
    }
}

fn print_actors(actors: &[Actor]) {
    let rows = actors
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.name.clone(),
                a.role.to_string(),
                or_dash(a.home_sector.as_deref()),
                or_dash(a.email.as_deref()),
                timestamp(&a.created_at),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "ROLE", "SECTOR", "EMAIL", "CREATED"], rows);
}
