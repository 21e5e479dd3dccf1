//! Roles, procedure tiers and the permission matrix.
//!
//! Which role may call which group of procedures is one explicit table
//! ([`ProcedureTier::allows`]); ownership rules for documents live next to it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;
use wayfare_shared::AppError;

/// Organizational role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular employee.
    Employee,
    /// Sales employee, may request bailouts.
    SalesEmployee,
    /// First-line supervisor.
    Supervisor,
    /// Head of a sales team, first bailout approver.
    SalesChief,
    /// Department manager.
    Manager,
    /// Director, second bailout approver.
    Director,
    /// Finance staff, disburses and pays.
    Finance,
    /// System administrator.
    Admin,
}

impl Role {
    /// Every role, lowest rank first.
    pub const ALL: [Self; 8] = [
        Self::Employee,
        Self::SalesEmployee,
        Self::Supervisor,
        Self::SalesChief,
        Self::Manager,
        Self::Director,
        Self::Finance,
        Self::Admin,
    ];

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "EMPLOYEE",
            Self::SalesEmployee => "SALES_EMPLOYEE",
            Self::Supervisor => "SUPERVISOR",
            Self::SalesChief => "SALES_CHIEF",
            Self::Manager => "MANAGER",
            Self::Director => "DIRECTOR",
            Self::Finance => "FINANCE",
            Self::Admin => "ADMIN",
        }
    }

    /// Parses a role, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "EMPLOYEE" => Some(Self::Employee),
            "SALES_EMPLOYEE" => Some(Self::SalesEmployee),
            "SUPERVISOR" => Some(Self::Supervisor),
            "SALES_CHIEF" => Some(Self::SalesChief),
            "MANAGER" => Some(Self::Manager),
            "DIRECTOR" => Some(Self::Director),
            "FINANCE" => Some(Self::Finance),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    /// True for the sales variants.
    #[must_use]
    pub const fn is_sales(&self) -> bool {
        matches!(self, Self::SalesEmployee | Self::SalesChief)
    }

    /// Roles that may read every travel request, claim and bailout.
    ///
    /// This does not extend to approve/reject/revision mutations, which stay
    /// bound to the assigned approver.
    #[must_use]
    pub const fn is_elevated_reader(&self) -> bool {
        matches!(self, Self::Finance | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Groups of procedures gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcedureTier {
    /// No session needed.
    Public,
    /// Any signed-in user.
    Authenticated,
    /// Supervisors and up.
    SupervisorOrAbove,
    /// Managers and up.
    ManagerOrAbove,
    /// Finance staff.
    Finance,
    /// Administrators.
    Admin,
}

impl ProcedureTier {
    /// The permission matrix.
    #[must_use]
    pub const fn allows(self, role: Role) -> bool {
        use Role::{Admin, Director, Finance, Manager, SalesChief, Supervisor};

        match self {
            Self::Public | Self::Authenticated => true,
            Self::SupervisorOrAbove => {
                matches!(role, Supervisor | SalesChief | Manager | Director | Admin)
            }
            Self::ManagerOrAbove => matches!(role, Manager | Director | Admin),
            Self::Finance => matches!(role, Finance | Admin),
            Self::Admin => matches!(role, Admin),
        }
    }

    /// Human-readable tier name for error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Authenticated => "authenticated",
            Self::SupervisorOrAbove => "supervisor or above",
            Self::ManagerOrAbove => "manager or above",
            Self::Finance => "finance",
            Self::Admin => "admin",
        }
    }
}

/// Access-control failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The caller's role is below the procedure tier.
    #[error("Role {role} is not allowed for {tier} procedures")]
    InsufficientRole {
        /// The caller's role.
        role: Role,
        /// Human-readable tier.
        tier: &'static str,
    },

    /// Only the owner of the record may do this.
    #[error("Only the submitter may modify this {entity}")]
    NotOwner {
        /// Entity kind.
        entity: &'static str,
    },

    /// The caller may not read this record.
    #[error("You do not have access to this {entity}")]
    NotVisible {
        /// Entity kind.
        entity: &'static str,
    },

    /// The record is not in an editable state.
    #[error("{entity} in status {status} cannot be modified")]
    NotEditable {
        /// Entity kind.
        entity: &'static str,
        /// Current status.
        status: String,
    },

    /// The role string in the session is unknown.
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

impl From<AccessError> for AppError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::InsufficientRole { .. }
            | AccessError::NotOwner { .. }
            | AccessError::NotVisible { .. } => Self::Forbidden(e.to_string()),
            AccessError::NotEditable { .. } => Self::BadRequest(e.to_string()),
            AccessError::UnknownRole(_) => Self::Unauthorized(e.to_string()),
        }
    }
}

/// Checks a role against a procedure tier.
pub fn require_tier(role: Role, tier: ProcedureTier) -> Result<(), AccessError> {
    if tier.allows(role) {
        Ok(())
    } else {
        Err(AccessError::InsufficientRole {
            role,
            tier: tier.label(),
        })
    }
}

/// The acting user, as seen by business rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User ID.
    pub user_id: Uuid,
    /// Role.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Checks the actor against a procedure tier.
    pub fn require(&self, tier: ProcedureTier) -> Result<(), AccessError> {
        require_tier(self.role, tier)
    }

    /// Read access to a document: owner, an assigned approver, or an
    /// elevated reader.
    #[must_use]
    pub fn can_read(&self, owner_id: Uuid, approver_ids: &[Uuid]) -> bool {
        self.user_id == owner_id
            || self.role.is_elevated_reader()
            || approver_ids.contains(&self.user_id)
    }
}
