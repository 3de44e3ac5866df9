//! Actors: requesters, support agents and administrators.
//!
//! Layout:
//!   .helpdesk/actors.yaml  : every actor, pending registrations included
//!
//! Registered actors get sequential IDs: U1, U2, U3, …  The master admin is
//! seeded at init with the ID named in config (`master_actor_id`).

use crate::access::{AccessPolicy, Action};
use crate::error::{HelpdeskError, Result};
use crate::sector;
use crate::types::Role;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_sector: Option<String>,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Actor {
    /// An approved actor, as produced by seeding.
    pub fn seeded(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            home_sector: None,
            approved: true,
            registration_number: None,
            email: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_home_sector(mut self, sector: impl Into<String>) -> Self {
        self.home_sector = Some(sector.into());
        self
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub registration_number: String,
    #[serde(default)]
    pub email: Option<String>,
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+$").unwrap())
}

fn next_id(actors: &[Actor]) -> String {
    let max = actors
        .iter()
        .filter_map(|a| a.id.strip_prefix('U')?.parse::<usize>().ok())
        .max()
        .unwrap_or(0);
    format!("U{}", max + 1)
}

/// Validate a registration against the existing actors and append it as an
/// unapproved requester. Returns the new actor.
pub fn register(
    actors: &mut Vec<Actor>,
    registration: Registration,
    allowed_domain: Option<&str>,
) -> Result<Actor> {
    let name = registration.name.trim();
    if name.is_empty() {
        return Err(HelpdeskError::validation("name is required"));
    }
    let number = registration.registration_number.trim();
    if number.is_empty() {
        return Err(HelpdeskError::validation("registration number is required"));
    }
    if actors
        .iter()
        .any(|a| a.registration_number.as_deref() == Some(number))
    {
        return Err(HelpdeskError::validation(format!(
            "registration number '{number}' is already in use"
        )));
    }

    let email = match registration.email.as_deref().map(str::trim) {
        Some("") | None => None,
        Some(email) => {
            if !email_re().is_match(email) {
                return Err(HelpdeskError::validation(format!(
                    "'{email}' is not an email address"
                )));
            }
            Some(email.to_string())
        }
    };

    if let Some(domain) = allowed_domain.filter(|d| !d.is_empty()) {
        let domain = domain.trim_start_matches('@');
        let allowed = email
            .as_deref()
            .and_then(|e| e.rsplit_once('@'))
            .is_some_and(|(_, d)| d.eq_ignore_ascii_case(domain));
        if !allowed {
            return Err(HelpdeskError::validation(format!(
                "registration requires an @{domain} email address"
            )));
        }
    }

    let actor = Actor {
        id: next_id(actors),
        name: name.to_string(),
        role: Role::Requester,
        home_sector: None,
        approved: false,
        registration_number: Some(number.to_string()),
        email,
        created_at: Utc::now(),
    };
    actors.push(actor.clone());
    Ok(actor)
}

/// Split actors into (active, pending) the way the administration screen
/// lists them.
pub fn partition(actors: &[Actor]) -> (Vec<&Actor>, Vec<&Actor>) {
    actors.iter().partition(|a| a.approved)
}

pub fn find<'a>(actors: &'a [Actor], id: &str) -> Result<&'a Actor> {
    actors
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| HelpdeskError::ActorNotFound(id.to_string()))
}

pub fn find_mut<'a>(actors: &'a mut [Actor], id: &str) -> Result<&'a mut Actor> {
    actors
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| HelpdeskError::ActorNotFound(id.to_string()))
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

fn pending_position(actors: &[Actor], id: &str) -> Result<usize> {
    let pos = actors
        .iter()
        .position(|a| a.id == id)
        .ok_or_else(|| HelpdeskError::ActorNotFound(id.to_string()))?;
    if actors[pos].approved {
        return Err(HelpdeskError::invalid_transition(
            "approved",
            "approved",
            format!("actor {id} has no pending registration"),
        ));
    }
    Ok(pos)
}

/// Accept a pending registration, granting `role`.
pub fn approve_registration(
    actors: &mut [Actor],
    policy: &AccessPolicy,
    admin: &Actor,
    target_id: &str,
    role: Role,
) -> Result<Actor> {
    policy.authorize(admin, Action::ReviewRegistration)?;
    let pos = pending_position(actors, target_id)?;
    let target = &mut actors[pos];
    target.approved = true;
    target.role = role;
    tracing::info!(actor = %target_id, %role, by = %admin.id, "registration approved");
    Ok(target.clone())
}

/// Drop a pending registration entirely.
pub fn reject_registration(
    actors: &mut Vec<Actor>,
    policy: &AccessPolicy,
    admin: &Actor,
    target_id: &str,
    confirmed: bool,
) -> Result<Actor> {
    policy.authorize(admin, Action::ReviewRegistration)?;
    let pos = pending_position(actors, target_id)?;
    if !confirmed {
        return Err(HelpdeskError::validation(format!(
            "rejecting {target_id} deletes the registration; confirmation required"
        )));
    }
    let removed = actors.remove(pos);
    tracing::info!(actor = %target_id, by = %admin.id, "registration rejected");
    Ok(removed)
}

pub fn change_role(
    actors: &mut [Actor],
    policy: &AccessPolicy,
    admin: &Actor,
    target_id: &str,
    role: Role,
) -> Result<Actor> {
    policy.authorize(admin, Action::ChangeRole { target_id })?;
    let target = find_mut(actors, target_id)?;
    let previous = target.role;
    target.role = role;
    tracing::info!(actor = %target_id, from = %previous, to = %role, by = %admin.id, "role changed");
    Ok(target.clone())
}

/// Set or clear an actor's home sector. A newly chosen sector must be
/// registered; re-saving a stale one is allowed.
pub fn set_home_sector(
    actors: &mut [Actor],
    policy: &AccessPolicy,
    admin: &Actor,
    target_id: &str,
    sector: Option<&str>,
    registry: &[String],
) -> Result<Actor> {
    policy.authorize(admin, Action::SetHomeSector { target_id })?;
    let target = find_mut(actors, target_id)?;
    let sector = sector.map(str::trim).filter(|s| !s.is_empty());
    if let Some(s) = sector {
        if target.home_sector.as_deref() != Some(s) {
            sector::ensure_registered(registry, s)?;
        }
    }
    target.home_sector = sector.map(str::to_string);
    Ok(target.clone())
}

pub fn remove(
    actors: &mut Vec<Actor>,
    policy: &AccessPolicy,
    admin: &Actor,
    target_id: &str,
    confirmed: bool,
) -> Result<Actor> {
    policy.authorize(admin, Action::RemoveActor { target_id })?;
    let pos = actors
        .iter()
        .position(|a| a.id == target_id)
        .ok_or_else(|| HelpdeskError::ActorNotFound(target_id.to_string()))?;
    if !confirmed {
        return Err(HelpdeskError::validation(format!(
            "removing {target_id} is irreversible; confirmation required"
        )));
    }
    let removed = actors.remove(pos);
    tracing::info!(actor = %target_id, by = %admin.id, "actor removed");
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
