//! Bailout state transitions.
//!
//! Two approval levels collapsed into one status enum: a level can only be
//! reached from the one directly below it.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::access::{Actor, ProcedureTier, Role};
use crate::approval::MIN_REASON_LEN;
use crate::bailout::error::BailoutError;
use crate::bailout::types::{BailoutAction, BailoutStatus};

/// Stateless service for bailout transitions.
pub struct BailoutService;

impl BailoutService {
    /// Checks who may open a bailout and for how much.
    pub fn validate_request(requester_role: Role, amount: Decimal) -> Result<(), BailoutError> {
        if !requester_role.is_sales() {
            return Err(BailoutError::RequesterNotSales);
        }
        if amount <= Decimal::ZERO {
            return Err(BailoutError::NonPositiveAmount);
        }
        Ok(())
    }

    /// Drafts can be edited or deleted by their requester only.
    pub fn ensure_editable(
        current_status: BailoutStatus,
        actor_id: Uuid,
        requester_id: Uuid,
    ) -> Result<(), BailoutError> {
        if actor_id != requester_id {
            return Err(BailoutError::NotRequester);
        }
        if current_status != BailoutStatus::Draft {
            return Err(BailoutError::NotEditable(current_status));
        }
        Ok(())
    }

    /// Submits a draft.
    pub fn submit(
        current_status: BailoutStatus,
        actor_id: Uuid,
        requester_id: Uuid,
    ) -> Result<BailoutAction, BailoutError> {
        if actor_id != requester_id {
            return Err(BailoutError::NotRequester);
        }
        match current_status {
            BailoutStatus::Draft => Ok(BailoutAction::Submit {
                new_status: BailoutStatus::Submitted,
                submitted_at: Utc::now(),
            }),
            _ => Err(BailoutError::InvalidTransition {
                from: current_status,
                to: BailoutStatus::Submitted,
            }),
        }
    }

    /// First-level approval by a sales chief other than the requester.
    pub fn approve_chief(
        current_status: BailoutStatus,
        actor: Actor,
        requester_id: Uuid,
    ) -> Result<BailoutAction, BailoutError> {
        Self::require_chief(actor, requester_id)?;
        match current_status {
            BailoutStatus::Submitted => Ok(BailoutAction::ApproveChief {
                new_status: BailoutStatus::ApprovedChief,
                approved_by: actor.user_id,
                approved_at: Utc::now(),
            }),
            _ => Err(BailoutError::InvalidTransition {
                from: current_status,
                to: BailoutStatus::ApprovedChief,
            }),
        }
    }

    /// Second-level approval by a director.
    pub fn approve_director(
        current_status: BailoutStatus,
        actor: Actor,
        requester_id: Uuid,
    ) -> Result<BailoutAction, BailoutError> {
        Self::require_director(actor, requester_id)?;
        match current_status {
            BailoutStatus::ApprovedChief => Ok(BailoutAction::ApproveDirector {
                new_status: BailoutStatus::ApprovedDirector,
                approved_by: actor.user_id,
                approved_at: Utc::now(),
            }),
            _ => Err(BailoutError::InvalidTransition {
                from: current_status,
                to: BailoutStatus::ApprovedDirector,
            }),
        }
    }

    /// Rejects at the current level: the chief while submitted, the director
    /// after the chief approved.
    pub fn reject(
        current_status: BailoutStatus,
        actor: Actor,
        requester_id: Uuid,
        rejection_reason: &str,
    ) -> Result<BailoutAction, BailoutError> {
        let reason = rejection_reason.trim();
        if reason.chars().count() < MIN_REASON_LEN {
            return Err(BailoutError::ReasonTooShort);
        }

        match current_status {
            BailoutStatus::Submitted => Self::require_chief(actor, requester_id)?,
            BailoutStatus::ApprovedChief => Self::require_director(actor, requester_id)?,
            _ => {
                return Err(BailoutError::InvalidTransition {
                    from: current_status,
                    to: BailoutStatus::Rejected,
                });
            }
        }

        Ok(BailoutAction::Reject {
            new_status: BailoutStatus::Rejected,
            rejected_by: actor.user_id,
            rejection_reason: reason.to_string(),
            rejected_at: Utc::now(),
        })
    }

    /// Finance pays out a director-approved bailout.
    pub fn disburse(
        current_status: BailoutStatus,
        actor: Actor,
        reference: Option<String>,
    ) -> Result<BailoutAction, BailoutError> {
        if !ProcedureTier::Finance.allows(actor.role) {
            return Err(BailoutError::WrongApprover {
                required: Role::Finance,
            });
        }
        match current_status {
            BailoutStatus::ApprovedDirector => Ok(BailoutAction::Disburse {
                new_status: BailoutStatus::Disbursed,
                disbursed_by: actor.user_id,
                disbursed_at: Utc::now(),
                reference: reference.filter(|r| !r.trim().is_empty()),
            }),
            _ => Err(BailoutError::InvalidTransition {
                from: current_status,
                to: BailoutStatus::Disbursed,
            }),
        }
    }

    /// Returns true if `from → to` is a valid transition.
    #[must_use]
    pub fn is_valid_transition(from: BailoutStatus, to: BailoutStatus) -> bool {
        matches!(
            (from, to),
            (BailoutStatus::Draft, BailoutStatus::Submitted)
                | (
                    BailoutStatus::Submitted,
                    BailoutStatus::ApprovedChief | BailoutStatus::Rejected
                )
                | (
                    BailoutStatus::ApprovedChief,
                    BailoutStatus::ApprovedDirector | BailoutStatus::Rejected
                )
                | (BailoutStatus::ApprovedDirector, BailoutStatus::Disbursed)
        )
    }

    fn require_chief(actor: Actor, requester_id: Uuid) -> Result<(), BailoutError> {
        if actor.role != Role::SalesChief {
            return Err(BailoutError::WrongApprover {
                required: Role::SalesChief,
            });
        }
        if actor.user_id == requester_id {
            return Err(BailoutError::SelfApproval);
        }
        Ok(())
    }

    fn require_director(actor: Actor, requester_id: Uuid) -> Result<(), BailoutError> {
        if actor.role != Role::Director {
            return Err(BailoutError::WrongApprover {
                required: Role::Director,
            });
        }
        if actor.user_id == requester_id {
            return Err(BailoutError::SelfApproval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn chief() -> Actor {
        Actor::new(Uuid::new_v4(), Role::SalesChief)
    }

    fn director() -> Actor {
        Actor::new(Uuid::new_v4(), Role::Director)
    }

    fn finance() -> Actor {
        Actor::new(Uuid::new_v4(), Role::Finance)
    }

    #[test]
    fn test_happy_path_in_order() {
        let requester = Uuid::new_v4();
        let mut status = BailoutStatus::Draft;

        status = BailoutService::submit(status, requester, requester)
            .unwrap()
            .new_status();
        assert_eq!(status, BailoutStatus::Submitted);

        status = BailoutService::approve_chief(status, chief(), requester)
            .unwrap()
            .new_status();
        assert_eq!(status, BailoutStatus::ApprovedChief);

        status = BailoutService::approve_director(status, director(), requester)
            .unwrap()
            .new_status();
        assert_eq!(status, BailoutStatus::ApprovedDirector);

        let action =
            BailoutService::disburse(status, finance(), Some("TRX-991".into())).unwrap();
        assert_eq!(action.new_status(), BailoutStatus::Disbursed);
        assert!(matches!(
            action,
            BailoutAction::Disburse { reference: Some(ref r), .. } if r == "TRX-991"
        ));
    }

    #[test]
    fn test_cannot_skip_chief() {
        let err = BailoutService::approve_director(BailoutStatus::Submitted, director(), Uuid::new_v4())
            .unwrap_err();
        assert!(matches!(err, BailoutError::InvalidTransition { .. }));
    }

    #[test]
    fn test_disburse_requires_director_approval() {
        for status in [
            BailoutStatus::Draft,
            BailoutStatus::Submitted,
            BailoutStatus::ApprovedChief,
            BailoutStatus::Rejected,
            BailoutStatus::Disbursed,
        ] {
            assert!(BailoutService::disburse(status, finance(), None).is_err(), "{status}");
        }
    }

    #[test]
    fn test_disburse_requires_finance_tier() {
        let err = BailoutService::disburse(BailoutStatus::ApprovedDirector, director(), None)
            .unwrap_err();
        assert!(matches!(err, BailoutError::WrongApprover { .. }));

        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        assert!(BailoutService::disburse(BailoutStatus::ApprovedDirector, admin, None).is_ok());
    }

    #[test]
    fn test_chief_cannot_approve_own_bailout() {
        let me = chief();
        let err = BailoutService::approve_chief(BailoutStatus::Submitted, me, me.user_id).unwrap_err();
        assert_eq!(err, BailoutError::SelfApproval);
    }

    #[test]
    fn test_wrong_role_for_chief_step() {
        let err = BailoutService::approve_chief(BailoutStatus::Submitted, director(), Uuid::new_v4())
            .unwrap_err();
        assert_eq!(
            err,
            BailoutError::WrongApprover {
                required: Role::SalesChief
            }
        );
    }

    #[test]
    fn test_reject_routes_to_current_level() {
        let requester = Uuid::new_v4();
        assert!(BailoutService::reject(BailoutStatus::Submitted, chief(), requester, "no budget left").is_ok());
        assert!(BailoutService::reject(BailoutStatus::Submitted, director(), requester, "no budget left").is_err());
        assert!(BailoutService::reject(BailoutStatus::ApprovedChief, director(), requester, "no budget left").is_ok());
        assert!(matches!(
            BailoutService::reject(BailoutStatus::ApprovedDirector, director(), requester, "no budget left"),
            Err(BailoutError::InvalidTransition { .. })
        ));
        assert_eq!(
            BailoutService::reject(BailoutStatus::Submitted, chief(), requester, "short"),
            Err(BailoutError::ReasonTooShort)
        );
    }

    #[test]
    fn test_request_validation() {
        assert!(BailoutService::validate_request(Role::SalesEmployee, dec!(500)).is_ok());
        assert!(BailoutService::validate_request(Role::SalesChief, dec!(1)).is_ok());
        assert_eq!(
            BailoutService::validate_request(Role::Employee, dec!(500)),
            Err(BailoutError::RequesterNotSales)
        );
        assert_eq!(
            BailoutService::validate_request(Role::SalesEmployee, dec!(0)),
            Err(BailoutError::NonPositiveAmount)
        );
    }

    #[test]
    fn test_editable_only_as_draft_by_requester() {
        let me = Uuid::new_v4();
        assert!(BailoutService::ensure_editable(BailoutStatus::Draft, me, me).is_ok());
        assert_eq!(
            BailoutService::ensure_editable(BailoutStatus::Submitted, me, me),
            Err(BailoutError::NotEditable(BailoutStatus::Submitted))
        );
        assert_eq!(
            BailoutService::ensure_editable(BailoutStatus::Draft, Uuid::new_v4(), me),
            Err(BailoutError::NotRequester)
        );
    }

    #[test]
    fn test_transition_table() {
        assert!(BailoutService::is_valid_transition(BailoutStatus::Draft, BailoutStatus::Submitted));
        assert!(!BailoutService::is_valid_transition(BailoutStatus::Draft, BailoutStatus::Disbursed));
        assert!(!BailoutService::is_valid_transition(BailoutStatus::ApprovedDirector, BailoutStatus::Rejected));
    }
}
