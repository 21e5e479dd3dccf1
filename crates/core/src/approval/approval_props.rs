//! Property-based tests for the approval chain.

use proptest::prelude::*;
use uuid::Uuid;

use crate::approval::chain::ApprovalChain;
use crate::approval::error::ApprovalError;
use crate::approval::types::{ApprovalLevel, ApprovalStatus, ApprovalStep, ApprovalTarget};
use crate::document::DocumentStatus;

fn build(levels: usize) -> (ApprovalChain, Vec<(Uuid, Uuid)>) {
    let rows: Vec<ApprovalStep> = ApprovalLevel::ALL
        .iter()
        .take(levels)
        .map(|level| ApprovalStep::pending(Uuid::new_v4(), *level, Uuid::new_v4()))
        .collect();
    let handles = rows.iter().map(|r| (r.id, r.approver_id)).collect();
    let chain = ApprovalChain::new(
        ApprovalTarget::Claim(Uuid::new_v4()),
        DocumentStatus::Submitted,
        rows,
    );
    (chain, handles)
}

/// Strategy for a chain length and a position inside it.
fn arb_chain_and_level() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=5).prop_flat_map(|len| (Just(len), 0..len))
}

/// Strategy for a reason that passes the length check.
fn arb_reason() -> impl Strategy<Value = String> {
    "[a-z]{10,40}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Approving level N succeeds iff every lower level is approved.
    #[test]
    fn prop_approve_requires_all_lower_levels(
        (len, target) in arb_chain_and_level(),
        approved_first in 0usize..5,
    ) {
        let (mut chain, handles) = build(len);
        let approved_first = approved_first.min(target);
        for (step, approver) in handles.iter().take(approved_first) {
            chain.approve(*step, *approver, None).unwrap();
        }

        let (step, approver) = handles[target];
        let result = chain.approve(step, approver, None);

        if approved_first == target {
            prop_assert!(result.is_ok());
        } else {
            let is_prior_pending = matches!(result, Err(ApprovalError::PriorLevelPending { .. }));
            prop_assert!(is_prior_pending);
        }
    }

    /// Approving every level in order always ends in APPROVED, passing through
    /// each level marker.
    #[test]
    fn prop_full_approval_reaches_approved(len in 1usize..=5) {
        let (mut chain, handles) = build(len);
        for (i, (step, approver)) in handles.iter().enumerate() {
            let out = chain.approve(*step, *approver, None).unwrap();
            if i + 1 == len {
                prop_assert_eq!(out.parent_status, DocumentStatus::Approved);
            } else {
                prop_assert_eq!(out.parent_status, DocumentStatus::approved_at(out.level));
                prop_assert_eq!(out.next_approver, Some(handles[i + 1].1));
            }
        }
    }

    /// Revision at any reachable level leaves every row pending with cleared
    /// timestamps.
    #[test]
    fn prop_revision_resets_whole_chain(
        (len, target) in arb_chain_and_level(),
        comments in arb_reason(),
    ) {
        let (mut chain, handles) = build(len);
        for (step, approver) in handles.iter().take(target) {
            chain.approve(*step, *approver, None).unwrap();
        }

        let (step, approver) = handles[target];
        chain.request_revision(step, approver, &comments).unwrap();

        prop_assert_eq!(chain.parent_status(), DocumentStatus::Revision);
        for row in chain.steps() {
            prop_assert_eq!(row.status, ApprovalStatus::Pending);
            prop_assert!(row.approved_at.is_none());
            prop_assert!(row.rejected_at.is_none());
        }
    }

    /// After a rejection no row can be approved again.
    #[test]
    fn prop_rejection_is_terminal(
        (len, target) in arb_chain_and_level(),
        reason in arb_reason(),
    ) {
        let (mut chain, handles) = build(len);
        for (step, approver) in handles.iter().take(target) {
            chain.approve(*step, *approver, None).unwrap();
        }

        let (step, approver) = handles[target];
        chain.reject(step, approver, &reason).unwrap();

        prop_assert_eq!(chain.parent_status(), DocumentStatus::Rejected);
        prop_assert!(chain.next_pending().is_none());
        for (step, approver) in &handles {
            prop_assert!(chain.approve(*step, *approver, None).is_err());
        }
        let others_pending = chain
            .steps()
            .iter()
            .filter(|r| r.id != step)
            .all(|r| r.status == ApprovalStatus::Pending && r.approved_at.is_none());
        prop_assert!(others_pending);
    }

    /// Short reasons never change the chain.
    #[test]
    fn prop_short_reason_changes_nothing(reason in "[a-z ]{0,9}") {
        let (mut chain, handles) = build(2);
        let before = chain.clone();
        let (step, approver) = handles[0];

        let is_short = matches!(
            chain.reject(step, approver, &reason),
            Err(ApprovalError::ReasonTooShort { .. })
        );
        prop_assert!(is_short);
        prop_assert_eq!(chain, before);
    }
}
