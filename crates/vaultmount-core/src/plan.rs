//! Diff a declared configuration against recorded state.
//!
//! The plan is where attribute mutability is enforced: a change to any
//! force-new attribute turns into a replacement, TTL changes into an
//! in-place update. Optional+computed TTLs omitted from the configuration
//! keep whatever Vault reported and never produce a diff.

use std::fmt;

use crate::schema::{
    ATTR_DEFAULT_LEASE_TTL, ATTR_DESCRIPTION, ATTR_MAX_LEASE_TTL, ATTR_PATH, ATTR_TYPE,
    SecretBackendConfig, attribute, suppress_path_diff,
};
use crate::state::ResourceData;

/// What has to happen to reach the declared configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NoOp,
    Create,
    Update,
    /// Delete the existing mount, then create it again.
    Replace,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoOp => "no-op",
            Self::Create => "create",
            Self::Update => "update",
            Self::Replace => "replace",
        })
    }
}

/// A single attribute difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub attribute: &'static str,
    pub old: String,
    pub new: String,
    pub forces_replacement: bool,
}

/// The planned action and the attribute changes behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub action: Action,
    pub changes: Vec<AttributeChange>,
}

impl Plan {
    /// Attributes that force replacement.
    pub fn replacement_reasons(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changes
            .iter()
            .filter(|c| c.forces_replacement)
            .map(|c| c.attribute)
    }
}

fn change(name: &'static str, old: String, new: String) -> AttributeChange {
    AttributeChange {
        attribute: name,
        old,
        new,
        forces_replacement: attribute(name).is_some_and(|a| a.force_new),
    }
}

/// Compute the plan that moves `prior` to `config`.
///
/// `prior` is `None` (or has an empty identity) when nothing is recorded or
/// the last refresh found the mount gone.
pub fn plan(prior: Option<&ResourceData>, config: &SecretBackendConfig) -> Plan {
    let Some(prior) = prior.filter(|p| p.is_present()) else {
        let mut changes = vec![
            change(ATTR_TYPE, String::new(), config.engine_type.clone()),
            change(ATTR_PATH, String::new(), config.effective_path().to_owned()),
        ];
        if let Some(description) = &config.description {
            changes.push(change(ATTR_DESCRIPTION, String::new(), description.clone()));
        }
        for (name, value) in [
            (ATTR_DEFAULT_LEASE_TTL, config.default_lease_ttl_seconds),
            (ATTR_MAX_LEASE_TTL, config.max_lease_ttl_seconds),
        ] {
            if let Some(v) = value {
                changes.push(change(name, String::new(), v.to_string()));
            }
        }
        return Plan {
            action: Action::Create,
            changes,
        };
    };

    let mut changes = Vec::new();

    let old_path = if prior.path.is_empty() {
        prior.id.as_str()
    } else {
        prior.path.as_str()
    };
    let new_path = config.effective_path();
    if !suppress_path_diff(old_path, new_path) {
        changes.push(change(ATTR_PATH, old_path.to_owned(), new_path.to_owned()));
    }
    if prior.engine_type != config.engine_type {
        changes.push(change(
            ATTR_TYPE,
            prior.engine_type.clone(),
            config.engine_type.clone(),
        ));
    }
    let description = config.effective_description();
    if prior.description != description {
        changes.push(change(
            ATTR_DESCRIPTION,
            prior.description.clone(),
            description.to_owned(),
        ));
    }
    for (name, old, new) in [
        (
            ATTR_DEFAULT_LEASE_TTL,
            prior.default_lease_ttl_seconds,
            config.default_lease_ttl_seconds,
        ),
        (
            ATTR_MAX_LEASE_TTL,
            prior.max_lease_ttl_seconds,
            config.max_lease_ttl_seconds,
        ),
    ] {
        if let Some(new) = new.filter(|n| *n != old) {
            changes.push(change(name, old.to_string(), new.to_string()));
        }
    }

    let action = if changes.iter().any(|c| c.forces_replacement) {
        Action::Replace
    } else if changes.is_empty() {
        Action::NoOp
    } else {
        Action::Update
    };
    Plan { action, changes }
}
