//! Chain construction from the supervisor hierarchy.

use uuid::Uuid;

use crate::approval::error::ApprovalError;
use crate::approval::types::{ApprovalLevel, PlannedStep};
use crate::hierarchy::Forest;

/// Plans the approval rows for a document submitted by `submitter_id`.
///
/// `active_users` holds every non-deleted user with their supervisor. The
/// direct supervisor becomes L1, their supervisor L2, and so on for at most
/// five levels. A supervisor missing from the forest (deleted) or a repeated
/// user ends the walk.
///
/// # Errors
///
/// Returns `ApprovalError::NoApproverAvailable` when the submitter has no
/// active supervisor.
pub fn plan_chain(submitter_id: Uuid, active_users: &Forest) -> Result<Vec<PlannedStep>, ApprovalError> {
    let steps: Vec<PlannedStep> = ApprovalLevel::ALL
        .into_iter()
        .zip(active_users.ancestors(submitter_id))
        .map(|(level, approver_id)| PlannedStep { level, approver_id })
        .collect();

    if steps.is_empty() {
        return Err(ApprovalError::NoApproverAvailable);
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(depth: usize) -> (Forest, Vec<Uuid>) {
        // ids[0] is the employee, ids[depth] the top of the tree.
        let ids: Vec<Uuid> = (0..=depth).map(|_| Uuid::new_v4()).collect();
        let forest = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, ids.get(i + 1).copied()))
            .collect();
        (forest, ids)
    }

    #[test]
    fn test_levels_follow_supervisors() {
        let (forest, ids) = org(3);
        let plan = plan_chain(ids[0], &forest).unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].level, ApprovalLevel::L1Supervisor);
        assert_eq!(plan[0].approver_id, ids[1]);
        assert_eq!(plan[2].level, ApprovalLevel::L3Director);
        assert_eq!(plan[2].approver_id, ids[3]);
    }

    #[test]
    fn test_chain_capped_at_five_levels() {
        let (forest, ids) = org(8);
        let plan = plan_chain(ids[0], &forest).unwrap();
        assert_eq!(plan.len(), 5);
        assert_eq!(plan[4].level, ApprovalLevel::L5Executive);
    }

    #[test]
    fn test_no_supervisor_means_no_chain() {
        let (forest, ids) = org(2);
        let top = ids[2];
        assert_eq!(
            plan_chain(top, &forest),
            Err(ApprovalError::NoApproverAvailable)
        );
    }

    #[test]
    fn test_deleted_supervisor_ends_walk() {
        let (full, ids) = org(3);
        // ids[2] is soft-deleted, so it is absent from the active set.
        let active: Forest = ids
            .iter()
            .filter(|id| **id != ids[2])
            .map(|id| (*id, full.parent_of(*id)))
            .collect();

        let plan = plan_chain(ids[0], &active).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].approver_id, ids[1]);
    }
}
