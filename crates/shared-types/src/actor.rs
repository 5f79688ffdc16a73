//! # Actors and Roles
//!
//! Identity is supplied by the host application with every call and is
//! trusted as already authenticated. Subsystems enforce role-gated
//! preconditions only, never authentication itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Generate a fresh random actor ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Workflow role of an actor.
///
/// Roles gate which transitions an actor may trigger:
///
/// | Role | May trigger |
/// |------|-------------|
/// | Sender | upload / re-upload |
/// | Checker | approve, reject, download |
/// | Manager | sign internal, upload externally-signed, download |
/// | Admin | everything a Checker or Manager may |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Submits documents into the workflow.
    Sender,
    /// Reviews pending documents.
    Checker,
    /// Signs approved documents.
    Manager,
    /// Full review and signing powers.
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Sender => "SENDER",
            Role::Checker => "CHECKER",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
        };
        f.write_str(name)
    }
}

/// An authenticated actor: identity plus workflow role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable identity of the actor.
    pub id: ActorId,
    /// Workflow role used for precondition checks.
    pub role: Role,
}

impl Actor {
    /// Convenience constructor with a fresh random ID.
    pub fn with_role(role: Role) -> Self {
        Self {
            id: ActorId::new(),
            role,
        }
    }
}
