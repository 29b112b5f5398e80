//! # Access Policy
//!
//! Who may do what. Authentication happens outside this workspace; by the
//! time a call reaches the ledger the caller is an [`Actor`] with a [`Role`].
//!
//! ```text
//!   Actor { id, role } ──► AccessPolicy::authorize(actor, action)
//!                                 │
//!                      ┌──────────┴──────────┐
//!                      ▼                     ▼
//!                    Ok(())         CoreError::Forbidden
//! ```
//!
//! The policy is a trait object injected into the engine so deployments can
//! swap in their own rules without touching the ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};

/// Account role as issued by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Worker,
    Customer,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Worker => "worker",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "worker" => Ok(Role::Worker),
            "customer" => Ok(Role::Customer),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["owner".into(), "worker".into(), "customer".into()],
            }),
        }
    }
}

/// Mutating operations guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AddStock,
    RecordSale,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::AddStock => f.write_str("add stock"),
            Action::RecordSale => f.write_str("record sales"),
        }
    }
}

/// The authenticated principal performing a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Actor {
            id: id.into(),
            role,
        }
    }
}

/// Decides whether an actor may perform an action.
pub trait AccessPolicy: Send + Sync {
    fn authorize(&self, actor: &Actor, action: Action) -> CoreResult<()>;
}

/// Default policy: owners and workers may receive stock and record sales,
/// customers may do neither.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl RolePolicy {
    pub fn allows(role: Role, action: Action) -> bool {
        match (role, action) {
            (Role::Owner | Role::Worker, Action::AddStock | Action::RecordSale) => true,
            (Role::Customer, _) => false,
        }
    }
}

impl AccessPolicy for RolePolicy {
    fn authorize(&self, actor: &Actor, action: Action) -> CoreResult<()> {
        if Self::allows(actor.role, action) {
            Ok(())
        } else {
            Err(CoreError::Forbidden {
                role: actor.role.to_string(),
                action: action.to_string(),
            })
        }
    }
}
