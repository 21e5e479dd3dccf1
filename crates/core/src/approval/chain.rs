//! The approval chain state machine.
//!
//! `ApprovalChain` holds every row of one document together with the
//! document's status. Transitions mutate it in place and report what changed;
//! nothing here touches storage.

use chrono::Utc;
use uuid::Uuid;

use crate::approval::error::ApprovalError;
use crate::approval::types::{
    ApprovalAction, ApprovalStatus, ApprovalStep, ApprovalTarget, MIN_REASON_LEN,
    TransitionOutcome,
};
use crate::document::DocumentStatus;

/// All approval rows of one document plus the document's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalChain {
    target: ApprovalTarget,
    parent_status: DocumentStatus,
    steps: Vec<ApprovalStep>,
}

impl ApprovalChain {
    /// Builds a chain. Rows are kept in level order.
    #[must_use]
    pub fn new(target: ApprovalTarget, parent_status: DocumentStatus, steps: Vec<ApprovalStep>) -> Self {
        let mut steps = steps;
        steps.sort_by_key(|s| s.level);
        Self {
            target,
            parent_status,
            steps,
        }
    }

    /// The document this chain belongs to.
    #[must_use]
    pub const fn target(&self) -> ApprovalTarget {
        self.target
    }

    /// Current document status.
    #[must_use]
    pub const fn parent_status(&self) -> DocumentStatus {
        self.parent_status
    }

    /// Rows, lowest level first.
    #[must_use]
    pub fn steps(&self) -> &[ApprovalStep] {
        &self.steps
    }

    /// Looks up one row.
    #[must_use]
    pub fn step(&self, step_id: Uuid) -> Option<&ApprovalStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// Every assigned approver, in level order.
    #[must_use]
    pub fn approver_ids(&self) -> Vec<Uuid> {
        self.steps.iter().map(|s| s.approver_id).collect()
    }

    /// The row that can be acted on now, if any.
    ///
    /// That is the lowest row that is not approved, provided it is pending
    /// and the document is in review.
    #[must_use]
    pub fn next_pending(&self) -> Option<&ApprovalStep> {
        if !self.parent_status.is_in_review() {
            return None;
        }
        self.steps
            .iter()
            .find(|s| s.status != ApprovalStatus::Approved)
            .filter(|s| s.status == ApprovalStatus::Pending)
    }

    /// True if `step_id` is the row awaiting action.
    #[must_use]
    pub fn is_actionable(&self, step_id: Uuid) -> bool {
        self.next_pending().is_some_and(|s| s.id == step_id)
    }

    /// Approves a row.
    ///
    /// # Errors
    ///
    /// Fails if the actor is not the row's approver, the document is not in
    /// review, the row is not pending, or a lower level is not approved yet.
    pub fn approve(
        &mut self,
        step_id: Uuid,
        actor_id: Uuid,
        comments: Option<String>,
    ) -> Result<TransitionOutcome, ApprovalError> {
        let idx = self.locate_actionable(step_id, actor_id)?;
        let previous_parent_status = self.parent_status;

        let level = {
            let step = &mut self.steps[idx];
            step.status = ApprovalStatus::Approved;
            step.approved_at = Some(Utc::now());
            if let Some(text) = comments.filter(|c| !c.trim().is_empty()) {
                step.comments = Some(text);
            }
            step.level
        };

        let chain_done = self
            .steps
            .iter()
            .all(|s| s.status == ApprovalStatus::Approved);
        self.parent_status = if chain_done {
            DocumentStatus::Approved
        } else {
            DocumentStatus::approved_at(level)
        };

        Ok(TransitionOutcome {
            action: ApprovalAction::Approve,
            step_id,
            level,
            previous_parent_status,
            parent_status: self.parent_status,
            changed_steps: vec![step_id],
            next_approver: self.next_pending().map(|s| s.approver_id),
        })
    }

    /// Rejects the document at a row.
    ///
    /// The acting row keeps the reason; every other row goes back to pending
    /// and the document becomes `REJECTED`, which is terminal.
    ///
    /// # Errors
    ///
    /// As [`Self::approve`], plus `ReasonTooShort`.
    pub fn reject(
        &mut self,
        step_id: Uuid,
        actor_id: Uuid,
        reason: &str,
    ) -> Result<TransitionOutcome, ApprovalError> {
        let reason = require_text("reason", reason)?;
        let idx = self.locate_actionable(step_id, actor_id)?;
        let previous_parent_status = self.parent_status;
        let now = Utc::now();

        for (i, step) in self.steps.iter_mut().enumerate() {
            if i == idx {
                step.status = ApprovalStatus::Rejected;
                step.rejection_reason = Some(reason.clone());
                step.rejected_at = Some(now);
                step.approved_at = None;
            } else {
                step.reset();
            }
        }
        self.parent_status = DocumentStatus::Rejected;

        Ok(TransitionOutcome {
            action: ApprovalAction::Reject,
            step_id,
            level: self.steps[idx].level,
            previous_parent_status,
            parent_status: self.parent_status,
            changed_steps: self.steps.iter().map(|s| s.id).collect(),
            next_approver: None,
        })
    }

    /// Sends the document back to its submitter.
    ///
    /// Every row, the acting one included, returns to pending with cleared
    /// timestamps; the acting row keeps the comments. The document becomes
    /// `REVISION` and is editable again.
    ///
    /// # Errors
    ///
    /// As [`Self::approve`], plus `ReasonTooShort`.
    pub fn request_revision(
        &mut self,
        step_id: Uuid,
        actor_id: Uuid,
        comments: &str,
    ) -> Result<TransitionOutcome, ApprovalError> {
        let comments = require_text("comments", comments)?;
        let idx = self.locate_actionable(step_id, actor_id)?;
        let previous_parent_status = self.parent_status;

        for step in &mut self.steps {
            step.reset();
        }
        self.steps[idx].comments = Some(comments);
        self.parent_status = DocumentStatus::Revision;

        Ok(TransitionOutcome {
            action: ApprovalAction::RequestRevision,
            step_id,
            level: self.steps[idx].level,
            previous_parent_status,
            parent_status: self.parent_status,
            changed_steps: self.steps.iter().map(|s| s.id).collect(),
            next_approver: None,
        })
    }

    /// Finds the row and runs the checks shared by every transition.
    fn locate_actionable(&self, step_id: Uuid, actor_id: Uuid) -> Result<usize, ApprovalError> {
        let idx = self
            .steps
            .iter()
            .position(|s| s.id == step_id)
            .ok_or(ApprovalError::StepNotFound(step_id))?;
        let step = &self.steps[idx];

        if step.approver_id != actor_id {
            return Err(ApprovalError::NotAssignedApprover { user_id: actor_id });
        }
        if !self.parent_status.is_in_review() {
            return Err(ApprovalError::ParentNotInReview {
                status: self.parent_status,
            });
        }
        if step.status != ApprovalStatus::Pending {
            return Err(ApprovalError::AlreadyProcessed {
                status: step.status,
            });
        }
        if let Some(prior) = self.steps[..idx]
            .iter()
            .find(|s| s.status != ApprovalStatus::Approved)
        {
            return Err(ApprovalError::PriorLevelPending { level: prior.level });
        }

        Ok(idx)
    }
}

fn require_text(field: &'static str, text: &str) -> Result<String, ApprovalError> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_REASON_LEN {
        return Err(ApprovalError::ReasonTooShort { field });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::types::ApprovalLevel;

    struct Fixture {
        chain: ApprovalChain,
        approvers: Vec<Uuid>,
        steps: Vec<Uuid>,
    }

    fn fixture(levels: usize) -> Fixture {
        let approvers: Vec<Uuid> = (0..levels).map(|_| Uuid::new_v4()).collect();
        let rows: Vec<ApprovalStep> = ApprovalLevel::ALL
            .iter()
            .zip(&approvers)
            .map(|(level, approver)| ApprovalStep::pending(Uuid::new_v4(), *level, *approver))
            .collect();
        let steps = rows.iter().map(|s| s.id).collect();
        let chain = ApprovalChain::new(
            ApprovalTarget::TravelRequest(Uuid::new_v4()),
            DocumentStatus::Submitted,
            rows,
        );
        Fixture {
            chain,
            approvers,
            steps,
        }
    }

    #[test]
    fn test_approve_in_order_walks_level_markers() {
        let mut f = fixture(3);

        let out = f.chain.approve(f.steps[0], f.approvers[0], None).unwrap();
        assert_eq!(out.parent_status, DocumentStatus::ApprovedL1);
        assert_eq!(out.next_approver, Some(f.approvers[1]));

        let out = f.chain.approve(f.steps[1], f.approvers[1], None).unwrap();
        assert_eq!(out.parent_status, DocumentStatus::ApprovedL2);

        let out = f
            .chain
            .approve(f.steps[2], f.approvers[2], Some("fine".into()))
            .unwrap();
        assert_eq!(out.parent_status, DocumentStatus::Approved);
        assert!(out.completed_chain());
        assert_eq!(out.next_approver, None);
        assert!(f.chain.steps().iter().all(|s| s.approved_at.is_some()));
    }

    #[test]
    fn test_cannot_skip_level() {
        let mut f = fixture(3);
        let err = f.chain.approve(f.steps[1], f.approvers[1], None).unwrap_err();
        assert_eq!(
            err,
            ApprovalError::PriorLevelPending {
                level: ApprovalLevel::L1Supervisor
            }
        );
        assert_eq!(f.chain.parent_status(), DocumentStatus::Submitted);
    }

    #[test]
    fn test_only_assigned_approver_may_act() {
        let mut f = fixture(2);
        let stranger = Uuid::new_v4();
        let err = f.chain.approve(f.steps[0], stranger, None).unwrap_err();
        assert!(matches!(err, ApprovalError::NotAssignedApprover { .. }));
    }

    #[test]
    fn test_double_approve_is_already_processed() {
        let mut f = fixture(2);
        f.chain.approve(f.steps[0], f.approvers[0], None).unwrap();
        let err = f.chain.approve(f.steps[0], f.approvers[0], None).unwrap_err();
        assert_eq!(
            err,
            ApprovalError::AlreadyProcessed {
                status: ApprovalStatus::Approved
            }
        );
    }

    #[test]
    fn test_reject_is_terminal_and_resets_siblings() {
        let mut f = fixture(3);
        f.chain.approve(f.steps[0], f.approvers[0], None).unwrap();
        f.chain.approve(f.steps[1], f.approvers[1], None).unwrap();

        let out = f
            .chain
            .reject(f.steps[2], f.approvers[2], "too expensive")
            .unwrap();
        assert_eq!(out.parent_status, DocumentStatus::Rejected);
        assert_eq!(out.changed_steps.len(), 3);

        let rows = f.chain.steps();
        assert_eq!(rows[2].status, ApprovalStatus::Rejected);
        assert_eq!(rows[2].rejection_reason.as_deref(), Some("too expensive"));
        assert!(rows[2].rejected_at.is_some());
        for row in &rows[..2] {
            assert_eq!(row.status, ApprovalStatus::Pending);
            assert!(row.approved_at.is_none());
        }

        let err = f.chain.approve(f.steps[0], f.approvers[0], None).unwrap_err();
        assert_eq!(
            err,
            ApprovalError::ParentNotInReview {
                status: DocumentStatus::Rejected
            }
        );
    }

    #[test]
    fn test_reject_requires_reason() {
        let mut f = fixture(1);
        let err = f.chain.reject(f.steps[0], f.approvers[0], "  no  ").unwrap_err();
        assert_eq!(err, ApprovalError::ReasonTooShort { field: "reason" });
        assert_eq!(f.chain.steps()[0].status, ApprovalStatus::Pending);
    }

    #[test]
    fn test_revision_resets_every_row() {
        let mut f = fixture(3);
        f.chain
            .approve(f.steps[0], f.approvers[0], Some("looks fine to me".to_string()))
            .unwrap();

        let out = f
            .chain
            .request_revision(f.steps[1], f.approvers[1], "attach the hotel invoice")
            .unwrap();
        assert_eq!(out.parent_status, DocumentStatus::Revision);
        assert!(f.chain.steps().iter().all(|s| {
            s.status == ApprovalStatus::Pending && s.approved_at.is_none() && s.rejected_at.is_none()
        }));
        // Notes from the previous round do not carry over.
        assert_eq!(f.chain.steps()[0].comments, None);
        assert_eq!(f.chain.steps()[2].comments, None);
        assert_eq!(
            f.chain.steps()[1].comments.as_deref(),
            Some("attach the hotel invoice")
        );
        assert!(f.chain.next_pending().is_none());
    }

    #[test]
    fn test_resubmitted_chain_starts_over_at_level_one() {
        let mut f = fixture(2);
        f.chain.approve(f.steps[0], f.approvers[0], None).unwrap();
        f.chain
            .request_revision(f.steps[1], f.approvers[1], "wrong cost center")
            .unwrap();

        let mut chain = ApprovalChain::new(
            f.chain.target(),
            DocumentStatus::Submitted,
            f.chain.steps().to_vec(),
        );
        assert!(chain.is_actionable(f.steps[0]));
        assert!(chain.approve(f.steps[1], f.approvers[1], None).is_err());
        assert!(chain.approve(f.steps[0], f.approvers[0], None).is_ok());
    }

    #[test]
    fn test_rows_sorted_by_level() {
        let a = ApprovalStep::pending(Uuid::new_v4(), ApprovalLevel::L2Manager, Uuid::new_v4());
        let b = ApprovalStep::pending(Uuid::new_v4(), ApprovalLevel::L1Supervisor, Uuid::new_v4());
        let chain = ApprovalChain::new(
            ApprovalTarget::Claim(Uuid::new_v4()),
            DocumentStatus::Submitted,
            vec![a, b.clone()],
        );
        assert_eq!(chain.steps()[0].id, b.id);
        assert_eq!(chain.next_pending().map(|s| s.id), Some(b.id));
    }

    #[test]
    fn test_unknown_step() {
        let mut f = fixture(1);
        let missing = Uuid::new_v4();
        assert_eq!(
            f.chain.approve(missing, f.approvers[0], None).unwrap_err(),
            ApprovalError::StepNotFound(missing)
        );
    }
}
