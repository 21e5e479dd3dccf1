//! Integration tests for travel requests, claims and their approval chains.

#![allow(clippy::too_many_lines)]

mod common;

use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use wayfare_core::access::Role;
use wayfare_core::approval::ApprovalTarget;
use wayfare_core::audit::EntityType;
use wayfare_core::claim::{
    ClaimDetails, EntertainmentDetails, EntertainmentType, ExpenseCategory,
    NonEntertainmentDetails,
};
use wayfare_core::document::DocumentStatus;
use wayfare_db::entities::notifications;
use wayfare_db::entities::sea_orm_active_enums::{self, ApprovalStatus};
use wayfare_db::repositories::{
    ApprovalRepository, AuditLogRepository, ClaimFilter, ClaimRepository, CreateClaimInput,
    NotificationFilter, NotificationRepository, TravelRequestFilter, TravelRequestRepository,
    UpdateClaimInput, UpdateTravelRequestInput,
};
use wayfare_shared::{AppError, PageRequest};

use common::{
    Org, date, email, failing_notifier, force_request_status, insert_user, notifier, setup_db,
    trip,
};

fn dinner() -> ClaimDetails {
    ClaimDetails::Entertainment(EntertainmentDetails {
        entertainment_type: EntertainmentType::Meal,
        guest_name: "Budi Santoso".to_string(),
        guest_company: "PT Nusantara".to_string(),
        guest_position: Some("Procurement lead".to_string()),
        is_government_official: false,
        location: "Surabaya".to_string(),
    })
}

fn taxi() -> ClaimDetails {
    ClaimDetails::NonEntertainment(NonEntertainmentDetails {
        expense_category: ExpenseCategory::Transport,
        destination: Some("Juanda airport".to_string()),
        customer_name: None,
    })
}

fn claim_input(travel_request_id: uuid::Uuid, details: ClaimDetails) -> CreateClaimInput {
    CreateClaimInput {
        travel_request_id,
        date: date("2026-03-11"),
        amount: dec!(1250000.00),
        description: "Dinner with procurement team".to_string(),
        notes: None,
        chart_of_account_id: None,
        details,
    }
}

#[tokio::test]
async fn test_travel_request_walks_supervisor_chain() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let (notifier, sender) = notifier(&db);
    let requests = TravelRequestRepository::new(db.clone(), notifier.clone());
    let approvals = ApprovalRepository::new(db.clone(), notifier);

    let request = requests.create(org.employee, trip()).await.unwrap();
    assert!(request.request_number.starts_with("TR-"));
    assert!(request.request_number.ends_with("-00001"));
    assert_eq!(request.status, sea_orm_active_enums::DocumentStatus::Draft);

    let request = requests.submit(org.employee, request.id).await.unwrap();
    assert_eq!(request.status, sea_orm_active_enums::DocumentStatus::Submitted);
    assert!(request.submitted_at.is_some());

    let target = ApprovalTarget::TravelRequest(request.id);
    let chain = approvals.chain(org.employee, target).await.unwrap();
    let approvers: Vec<_> = chain.steps.iter().map(|s| s.approver_id).collect();
    assert_eq!(
        approvers,
        vec![
            org.supervisor.user_id,
            org.manager.user_id,
            org.director.user_id
        ]
    );
    assert_eq!(sender.sent_to(&email("supervisor")), 1);

    // Only the lowest pending level is actionable.
    assert_eq!(approvals.pending_for(org.supervisor.user_id).await.unwrap().len(), 1);
    assert!(approvals.pending_for(org.manager.user_id).await.unwrap().is_empty());
    let early = approvals
        .approve(org.manager, chain.steps[1].id, None)
        .await
        .unwrap_err();
    assert!(matches!(early, AppError::BadRequest(_)));

    let decision = approvals
        .approve(org.supervisor, chain.steps[0].id, Some("Fine".to_string()))
        .await
        .unwrap();
    assert_eq!(decision.document_status, DocumentStatus::ApprovedL1);
    assert!(!decision.chain_completed);
    assert_eq!(sender.sent_to(&email("manager")), 1);

    let decision = approvals
        .approve(org.manager, chain.steps[1].id, None)
        .await
        .unwrap();
    assert_eq!(decision.document_status, DocumentStatus::ApprovedL2);

    let decision = approvals
        .approve(org.director, chain.steps[2].id, None)
        .await
        .unwrap();
    assert_eq!(decision.document_status, DocumentStatus::Approved);
    assert!(decision.chain_completed);
    assert!(
        sender
            .subjects()
            .iter()
            .any(|s| s.contains(&request.request_number) && s.ends_with("approved"))
    );

    let history = AuditLogRepository::new(db.clone())
        .entity_history(EntityType::TravelRequest, request.id)
        .await
        .unwrap();
    let actions: Vec<_> = history.iter().map(|h| h.action).collect();
    assert_eq!(
        actions,
        vec![
            sea_orm_active_enums::AuditAction::Create,
            sea_orm_active_enums::AuditAction::Submit,
            sea_orm_active_enums::AuditAction::Approve,
            sea_orm_active_enums::AuditAction::Approve,
            sea_orm_active_enums::AuditAction::Approve,
        ]
    );

    let decided = approvals
        .history(org.director.user_id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(decided.meta.total, 1);
}

#[tokio::test]
async fn test_revision_reopens_the_same_chain() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let (notifier, _sender) = notifier(&db);
    let requests = TravelRequestRepository::new(db.clone(), notifier.clone());
    let approvals = ApprovalRepository::new(db.clone(), notifier);

    let request = requests.create(org.employee, trip()).await.unwrap();
    requests.submit(org.employee, request.id).await.unwrap();
    let target = ApprovalTarget::TravelRequest(request.id);
    let before = approvals.chain(org.employee, target).await.unwrap();

    approvals
        .approve(
            org.supervisor,
            before.steps[0].id,
            Some("looks fine to me".to_string()),
        )
        .await
        .unwrap();
    let decision = approvals
        .request_revision(org.manager, before.steps[1].id, "Please attach the agenda")
        .await
        .unwrap();
    assert_eq!(decision.document_status, DocumentStatus::Revision);

    // Editable again by the requester, and only by them.
    let denied = requests
        .update(
            org.supervisor,
            request.id,
            UpdateTravelRequestInput {
                purpose: Some("Hijacked".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(denied, AppError::Forbidden(_)));
    requests
        .update(
            org.employee,
            request.id,
            UpdateTravelRequestInput {
                purpose: Some("Customer visit, agenda attached".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    requests.submit(org.employee, request.id).await.unwrap();
    let after = approvals.chain(org.employee, target).await.unwrap();
    let ids = |c: &wayfare_db::repositories::ChainView| {
        c.steps.iter().map(|s| s.id).collect::<Vec<_>>()
    };
    assert_eq!(ids(&before), ids(&after));
    assert!(after.steps.iter().all(|s| s.status == ApprovalStatus::Pending));
    assert_eq!(after.document_status, DocumentStatus::Submitted);
    // The earlier approval note is gone; the revision request is kept.
    assert_eq!(after.steps[0].comments, None);
    assert_eq!(
        after.steps[1].comments.as_deref(),
        Some("Please attach the agenda")
    );
}

#[tokio::test]
async fn test_failed_delivery_is_recorded_without_failing_the_transition() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let notifier = failing_notifier(&db);
    let requests = TravelRequestRepository::new(db.clone(), notifier.clone());
    let approvals = ApprovalRepository::new(db.clone(), notifier);

    let request = requests.create(org.employee, trip()).await.unwrap();
    let submitted = requests.submit(org.employee, request.id).await.unwrap();
    assert_eq!(
        DocumentStatus::from(submitted.status),
        DocumentStatus::Submitted
    );

    let chain = approvals
        .chain(org.employee, ApprovalTarget::TravelRequest(request.id))
        .await
        .unwrap();
    approvals
        .approve(org.supervisor, chain.steps[0].id, None)
        .await
        .unwrap();

    let stored = notifications::Entity::find()
        .filter(notifications::Column::EntityId.eq(request.id))
        .all(&db)
        .await
        .unwrap();
    let recipients: Vec<_> = stored.iter().map(|n| n.recipient_id).collect();
    assert!(recipients.contains(&org.supervisor.user_id));
    assert!(recipients.contains(&org.manager.user_id));
    assert!(stored.iter().all(|n| {
        n.delivery_status == sea_orm_active_enums::DeliveryStatus::Failed
    }));

    // Stored rows stay readable in the app even though email never went out.
    let unread = NotificationRepository::new(db.clone())
        .unread_count(org.manager.user_id)
        .await
        .unwrap();
    assert_eq!(unread, 1);
}

#[tokio::test]
async fn test_rejection_is_final() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let (notifier, _sender) = notifier(&db);
    let requests = TravelRequestRepository::new(db.clone(), notifier.clone());
    let approvals = ApprovalRepository::new(db.clone(), notifier);

    let request = requests.create(org.employee, trip()).await.unwrap();
    requests.submit(org.employee, request.id).await.unwrap();
    let chain = approvals
        .chain(org.employee, ApprovalTarget::TravelRequest(request.id))
        .await
        .unwrap();

    let short = approvals
        .reject(org.supervisor, chain.steps[0].id, "no")
        .await
        .unwrap_err();
    assert!(matches!(short, AppError::BadRequest(_)));

    let not_mine = approvals
        .reject(org.employee, chain.steps[0].id, "Not within the travel policy")
        .await
        .unwrap_err();
    assert!(matches!(not_mine, AppError::Forbidden(_)));

    let decision = approvals
        .reject(org.supervisor, chain.steps[0].id, "Not within the travel policy")
        .await
        .unwrap();
    assert_eq!(decision.document_status, DocumentStatus::Rejected);

    assert!(matches!(
        requests.submit(org.employee, request.id).await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        requests.delete(org.employee, request.id).await,
        Err(AppError::BadRequest(_))
    ));
}

#[tokio::test]
async fn test_submit_without_supervisor_rolls_back() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let (notifier, _sender) = notifier(&db);
    let requests = TravelRequestRepository::new(db.clone(), notifier);

    let request = requests.create(org.director, trip()).await.unwrap();
    let err = requests.submit(org.director, request.id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let reloaded = requests.get(org.director, request.id).await.unwrap();
    assert_eq!(reloaded.status, sea_orm_active_enums::DocumentStatus::Draft);
    assert_eq!(reloaded.version, request.version);
}

#[tokio::test]
async fn test_read_access_follows_ownership_and_chain() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let outsider = insert_user(&db, "outsider", Role::Employee, Some(org.manager.user_id)).await;
    let (notifier, _sender) = notifier(&db);
    let requests = TravelRequestRepository::new(db.clone(), notifier);

    let request = requests.create(org.employee, trip()).await.unwrap();
    requests.submit(org.employee, request.id).await.unwrap();

    assert!(matches!(
        requests.get(outsider, request.id).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(requests.get(org.supervisor, request.id).await.is_ok());
    assert!(requests.get(org.finance, request.id).await.is_ok());

    let page = PageRequest::default();
    let filter = TravelRequestFilter::default();
    assert_eq!(requests.list(outsider, filter, page).await.unwrap().meta.total, 0);
    assert_eq!(requests.list(org.manager, filter, page).await.unwrap().meta.total, 1);
    assert_eq!(requests.list(org.admin, filter, page).await.unwrap().meta.total, 1);
}

#[tokio::test]
async fn test_claim_is_approved_paid_and_request_closed() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let (notifier, sender) = notifier(&db);
    let requests = TravelRequestRepository::new(db.clone(), notifier.clone());
    let claims = ClaimRepository::new(db.clone(), notifier.clone());
    let approvals = ApprovalRepository::new(db.clone(), notifier);

    let request = requests.create(org.employee, trip()).await.unwrap();
    force_request_status(&db, request.clone(), DocumentStatus::Approved).await;

    let claim = claims
        .create(org.employee, claim_input(request.id, dinner()))
        .await
        .unwrap();
    assert!(claim.claim.claim_number.starts_with("CL-"));
    assert_eq!(claim.details, dinner());

    let claim = claims.submit(org.employee, claim.claim.id).await.unwrap();
    assert_eq!(claim.claim.status, sea_orm_active_enums::DocumentStatus::Submitted);

    // Closing waits for claims still in review.
    assert!(matches!(
        requests.close(org.employee, request.id).await,
        Err(AppError::BadRequest(_))
    ));

    let chain = approvals
        .chain(org.employee, ApprovalTarget::Claim(claim.claim.id))
        .await
        .unwrap();
    for (step, approver) in chain
        .steps
        .iter()
        .zip([org.supervisor, org.manager, org.director])
    {
        approvals.approve(approver, step.id, None).await.unwrap();
    }

    assert!(matches!(
        claims.mark_paid(org.employee, claim.claim.id, None).await,
        Err(AppError::Forbidden(_))
    ));
    let paid = claims
        .mark_paid(org.finance, claim.claim.id, Some("TRX-2026-118".to_string()))
        .await
        .unwrap();
    assert_eq!(paid.claim.status, sea_orm_active_enums::DocumentStatus::Paid);
    assert_eq!(paid.claim.paid_by, Some(org.finance.user_id));
    assert!(
        sender
            .subjects()
            .contains(&format!("[Wayfare] Claim {} paid", paid.claim.claim_number))
    );
    assert!(matches!(
        claims.mark_paid(org.finance, claim.claim.id, None).await,
        Err(AppError::BadRequest(_))
    ));

    let closed = requests.close(org.employee, request.id).await.unwrap();
    assert_eq!(closed.status, sea_orm_active_enums::DocumentStatus::Closed);

    let notifications = NotificationRepository::new(db.clone());
    let mine = notifications
        .list(org.employee.user_id, NotificationFilter { unread_only: true }, PageRequest::default())
        .await
        .unwrap();
    assert!(mine.meta.total >= 2);
    assert_eq!(
        notifications.mark_all_read(org.employee.user_id).await.unwrap(),
        mine.meta.total
    );
    assert_eq!(notifications.unread_count(org.employee.user_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_claim_rules() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let (notifier, _sender) = notifier(&db);
    let requests = TravelRequestRepository::new(db.clone(), notifier.clone());
    let claims = ClaimRepository::new(db.clone(), notifier);

    let request = requests.create(org.employee, trip()).await.unwrap();

    // Draft request: nothing to claim against yet.
    assert!(matches!(
        claims.create(org.employee, claim_input(request.id, taxi())).await,
        Err(AppError::BadRequest(_))
    ));

    force_request_status(&db, request.clone(), DocumentStatus::Approved).await;

    // Someone else's request.
    assert!(matches!(
        claims.create(org.supervisor, claim_input(request.id, taxi())).await,
        Err(AppError::Forbidden(_))
    ));

    let mut zero = claim_input(request.id, taxi());
    zero.amount = dec!(0);
    assert!(matches!(
        claims.create(org.employee, zero).await,
        Err(AppError::BadRequest(_))
    ));

    let claim = claims
        .create(org.employee, claim_input(request.id, taxi()))
        .await
        .unwrap();

    // The variant is fixed at creation.
    let switched = claims
        .update(
            org.employee,
            claim.claim.id,
            UpdateClaimInput {
                details: Some(dinner()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(switched, AppError::BadRequest(_)));

    let updated = claims
        .update(
            org.employee,
            claim.claim.id,
            UpdateClaimInput {
                amount: Some(dec!(180000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.claim.amount, dec!(180000));
    assert_eq!(updated.claim.version, claim.claim.version + 1);

    let listed = claims
        .list(
            org.employee,
            ClaimFilter {
                travel_request_id: Some(request.id),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(listed.meta.total, 1);

    claims.delete(org.employee, claim.claim.id).await.unwrap();
    assert!(matches!(
        claims.get(org.employee, claim.claim.id).await,
        Err(AppError::NotFound(_))
    ));
}
