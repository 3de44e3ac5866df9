//! The sector registry: an ordered, deduplicated list of routing
//! destinations stored in `.helpdesk/sectors.yaml`.
//!
//! Sectors are plain strings. Nothing points back at the registry, so
//! removing a sector leaves tickets, articles and actors that mention it as
//! they are.

use crate::access::{AccessPolicy, Action};
use crate::actor::Actor;
use crate::error::{HelpdeskError, Result};

pub const DEFAULT_SECTORS: &[&str] = &[
    "IT Support",
    "Human Resources",
    "Sales",
    "Finance",
    "Facilities",
];

/// The default registry, with the manual-triage sector appended if it is
/// not already one of the defaults.
pub fn defaults(manual_triage_sector: &str) -> Vec<String> {
    let mut sectors: Vec<String> = DEFAULT_SECTORS.iter().map(|s| s.to_string()).collect();
    let manual = manual_triage_sector.trim();
    if !manual.is_empty() && !sectors.iter().any(|s| s == manual) {
        sectors.push(manual.to_string());
    }
    sectors
}

pub fn ensure_registered(sectors: &[String], name: &str) -> Result<()> {
    if sectors.iter().any(|s| s == name) {
        Ok(())
    } else {
        Err(HelpdeskError::validation(format!(
            "sector '{name}' is not registered"
        )))
    }
}

/// Add a sector. Returns `false` when the exact name was already present.
pub fn add(
    sectors: &mut Vec<String>,
    policy: &AccessPolicy,
    admin: &Actor,
    name: &str,
) -> Result<bool> {
    policy.authorize(admin, Action::ManageSectors)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(HelpdeskError::validation("sector name is required"));
    }
    if sectors.iter().any(|s| s == name) {
        return Ok(false);
    }
    sectors.push(name.to_string());
    Ok(true)
}

/// Remove a sector. Returns `false` when it was not registered.
pub fn remove(
    sectors: &mut Vec<String>,
    policy: &AccessPolicy,
    admin: &Actor,
    name: &str,
) -> Result<bool> {
    policy.authorize(admin, Action::ManageSectors)?;
    let before = sectors.len();
    sectors.retain(|s| s != name);
    let removed = sectors.len() != before;
    if removed {
        tracing::info!(sector = %name, by = %admin.id, "sector removed");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn ana() -> Actor {
        Actor::seeded("admin", "Ana", Role::Admin)
    }

    #[test]
    fn defaults_include_manual_sector_once() {
        let s = defaults("Manual Triage");
        assert_eq!(s.last().map(String::as_str), Some("Manual Triage"));
        assert_eq!(defaults("Sales").len(), DEFAULT_SECTORS.len());
    }

    #[test]
    fn add_trims_and_dedupes() {
        let p = AccessPolicy::new("admin");
        let mut s = vec!["IT".to_string()];
        assert!(add(&mut s, &p, &ana(), "  Legal ").unwrap());
        assert!(!add(&mut s, &p, &ana(), "IT").unwrap());
        assert!(add(&mut s, &p, &ana(), "it").unwrap());
        assert_eq!(s, vec!["IT", "Legal", "it"]);
        let err = add(&mut s, &p, &ana(), "  ").unwrap_err();
        assert!(matches!(err, HelpdeskError::Validation(_)));
    }

    #[test]
    fn remove_is_unconditional() {
        let p = AccessPolicy::new("admin");
        let mut s = vec!["IT".to_string(), "Sales".to_string()];
        assert!(remove(&mut s, &p, &ana(), "IT").unwrap());
        assert!(!remove(&mut s, &p, &ana(), "IT").unwrap());
        assert_eq!(s, vec!["Sales"]);
    }

    #[test]
    fn support_cannot_manage_sectors() {
        let p = AccessPolicy::new("admin");
        let carl = Actor::seeded("U2", "Carl", Role::Support);
        let mut s = Vec::new();
        let err = add(&mut s, &p, &carl, "Legal").unwrap_err();
        assert!(matches!(err, HelpdeskError::Unauthorized { .. }));
        assert!(s.is_empty());
    }
}
