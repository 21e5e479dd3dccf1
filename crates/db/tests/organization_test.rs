//! Integration tests for users, departments, the chart of accounts,
//! attachments, the audit trail and the personal dashboard.

mod common;

use rust_decimal_macros::dec;
use wayfare_core::access::Role;
use wayfare_core::account::AccountType;
use wayfare_core::attachment::NewAttachment;
use wayfare_core::audit::{AuditAction, EntityType};
use wayfare_core::claim::{ClaimDetails, ExpenseCategory, NonEntertainmentDetails};
use wayfare_core::document::DocumentStatus;
use wayfare_db::repositories::{
    ApprovalRepository, AttachmentRepository, AuditLogFilter, AuditLogRepository, ChartOfAccountsRepository,
    ClaimRepository, CreateAccountInput, CreateClaimInput, CreateDepartmentInput,
    CreateUserInput, DashboardRepository, DepartmentRepository, TravelRequestRepository,
    UpdateAccountInput, UpdateDepartmentInput, UserFilter, UserRepository,
};
use wayfare_shared::{AppError, PageRequest};

use common::{Org, date, force_request_status, notifier, setup_db, trip};

fn new_user(key: &str, role: Role, supervisor_id: Option<uuid::Uuid>) -> CreateUserInput {
    CreateUserInput {
        employee_id: format!("EMP-{key}"),
        email: format!("  {}@Wayfare.Test ", key.to_uppercase()),
        name: key.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        role,
        department_id: None,
        supervisor_id,
        phone: None,
    }
}

fn account(code: &str, account_type: AccountType, parent_id: Option<uuid::Uuid>) -> CreateAccountInput {
    CreateAccountInput {
        code: code.to_string(),
        name: format!("Account {code}"),
        account_type,
        parent_id,
        description: None,
        is_active: true,
    }
}

#[tokio::test]
async fn test_user_lifecycle_and_supervisor_tree() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let users = UserRepository::new(db.clone());

    let ana = users
        .create(org.admin, new_user("ana", Role::Employee, Some(org.supervisor.user_id)))
        .await
        .unwrap();
    assert_eq!(ana.email, "ana@wayfare.test");
    assert!(users.find_active_by_email("ana@wayfare.test").await.unwrap().is_some());

    let duplicate = users
        .create(org.admin, new_user("ana", Role::Employee, None))
        .await
        .unwrap_err();
    assert!(matches!(duplicate, AppError::Conflict(_)));

    // The supervisor cannot report to someone below them.
    let cycle = users
        .assign_supervisor(org.admin, org.supervisor.user_id, Some(ana.id))
        .await
        .unwrap_err();
    assert!(matches!(cycle, AppError::BadRequest(_)));
    let itself = users
        .assign_supervisor(org.admin, ana.id, Some(ana.id))
        .await
        .unwrap_err();
    assert!(matches!(itself, AppError::BadRequest(_)));

    let reports = users.direct_reports(org.supervisor.user_id).await.unwrap();
    assert_eq!(reports.len(), 2);

    assert!(matches!(
        users.soft_delete(org.admin, org.supervisor.user_id).await,
        Err(AppError::BadRequest(_))
    ));
    users.soft_delete(org.admin, ana.id).await.unwrap();
    assert!(users.find_active_by_email("ana@wayfare.test").await.unwrap().is_none());

    let active = users
        .list(UserFilter::default(), PageRequest::default())
        .await
        .unwrap();
    let everyone = users
        .list(
            UserFilter {
                include_deleted: true,
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(everyone.meta.total, active.meta.total + 1);

    let trail = AuditLogRepository::new(db.clone())
        .list(
            AuditLogFilter {
                entity_type: Some(EntityType::User),
                entity_id: Some(ana.id),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(trail.meta.total, 2);

    let deletes = AuditLogRepository::new(db.clone())
        .list(
            AuditLogFilter {
                action: Some(AuditAction::Delete),
                actor_id: Some(org.admin.user_id),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(deletes.meta.total, 1);
}

#[tokio::test]
async fn test_approver_with_open_rows_cannot_be_deleted() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let (notifier, _sender) = notifier(&db);
    let users = UserRepository::new(db.clone());
    let requests = TravelRequestRepository::new(db.clone(), notifier.clone());
    let approvals = ApprovalRepository::new(db.clone(), notifier);

    let request = requests.create(org.employee, trip()).await.unwrap();
    requests.submit(org.employee, request.id).await.unwrap();

    // The employee moves teams; the old supervisor no longer has reports
    // but still holds level one of the submitted request.
    users
        .assign_supervisor(org.admin, org.employee.user_id, Some(org.manager.user_id))
        .await
        .unwrap();
    assert!(users.direct_reports(org.supervisor.user_id).await.unwrap().is_empty());

    let err = users
        .soft_delete(org.admin, org.supervisor.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("pending approvals")));

    // Once the row is decided the supervisor can go.
    let pending = approvals.pending_for(org.supervisor.user_id).await.unwrap();
    assert_eq!(pending.len(), 1);
    approvals
        .approve(org.supervisor, pending[0].approval.id, None)
        .await
        .unwrap();
    users.soft_delete(org.admin, org.supervisor.user_id).await.unwrap();
}

#[tokio::test]
async fn test_department_tree_rules() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let departments = DepartmentRepository::new(db.clone());
    let users = UserRepository::new(db.clone());

    let input = |code: &str, parent_id| CreateDepartmentInput {
        code: code.to_string(),
        name: code.to_string(),
        description: None,
        parent_id,
    };
    let sales = departments.create(org.admin, input("SAL", None)).await.unwrap();
    let east = departments
        .create(org.admin, input("SAL-E", Some(sales.id)))
        .await
        .unwrap();

    assert!(matches!(
        departments.create(org.admin, input("SAL", None)).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        departments
            .update(
                org.admin,
                sales.id,
                UpdateDepartmentInput {
                    parent_id: Some(Some(east.id)),
                    ..Default::default()
                },
            )
            .await,
        Err(AppError::BadRequest(_))
    ));

    let tree = departments.tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].item.id, east.id);

    let mut member = new_user("budi", Role::Employee, None);
    member.department_id = Some(sales.id);
    let budi = users.create(org.admin, member).await.unwrap();
    assert!(matches!(
        departments.delete(org.admin, sales.id).await,
        Err(AppError::BadRequest(_))
    ));

    users.soft_delete(org.admin, budi.id).await.unwrap();
    departments.delete(org.admin, sales.id).await.unwrap();
    let east = departments.find_by_id(east.id).await.unwrap();
    assert_eq!(east.parent_id, None);
}

#[tokio::test]
async fn test_chart_of_accounts_rules() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let accounts = ChartOfAccountsRepository::new(db.clone());

    let travel = accounts
        .create(org.admin, account("6100", AccountType::Expense, None))
        .await
        .unwrap();
    let hotel = accounts
        .create(org.admin, account("6110", AccountType::Expense, Some(travel.id)))
        .await
        .unwrap();

    assert!(matches!(
        accounts
            .create(org.admin, account("1100", AccountType::Asset, Some(travel.id)))
            .await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        accounts
            .create(org.admin, account("6100", AccountType::Expense, None))
            .await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        accounts
            .update(
                org.admin,
                travel.id,
                UpdateAccountInput {
                    account_type: Some(AccountType::Asset),
                    ..Default::default()
                },
            )
            .await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        accounts.delete(org.admin, travel.id).await,
        Err(AppError::BadRequest(_))
    ));

    accounts.delete(org.admin, hotel.id).await.unwrap();
    accounts.delete(org.admin, travel.id).await.unwrap();
    assert!(accounts.tree().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_attachments_follow_claim_editability() {
    let db = setup_db().await;
    let org = Org::seed(&db).await;
    let (notifier, _sender) = notifier(&db);
    let requests = TravelRequestRepository::new(db.clone(), notifier.clone());
    let claims = ClaimRepository::new(db.clone(), notifier);
    let attachments = AttachmentRepository::new(db.clone(), 1024 * 1024);
    let accounts = ChartOfAccountsRepository::new(db.clone());

    let request = requests.create(org.employee, trip()).await.unwrap();
    force_request_status(&db, request.clone(), DocumentStatus::Approved).await;

    let mut inactive = account("6200", AccountType::Expense, None);
    inactive.is_active = false;
    let inactive = accounts.create(org.admin, inactive).await.unwrap();

    let input = |chart_of_account_id| CreateClaimInput {
        travel_request_id: request.id,
        date: date("2026-03-10"),
        amount: dec!(350000),
        description: "Hotel night".to_string(),
        notes: None,
        chart_of_account_id,
        details: ClaimDetails::NonEntertainment(NonEntertainmentDetails {
            expense_category: ExpenseCategory::Accommodation,
            destination: None,
            customer_name: Some("PT Nusantara".to_string()),
        }),
    };
    assert!(matches!(
        claims.create(org.employee, input(Some(inactive.id))).await,
        Err(AppError::BadRequest(_))
    ));
    let claim = claims.create(org.employee, input(None)).await.unwrap();

    let upload = |mime: &str, size| NewAttachment {
        filename: "hotel-invoice.pdf".to_string(),
        mime_type: mime.to_string(),
        file_size: size,
        storage_url: "s3://wayfare/claims/hotel-invoice.pdf".to_string(),
    };
    assert!(matches!(
        attachments
            .add(org.employee, claim.claim.id, upload("application/zip", 2048))
            .await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        attachments
            .add(org.employee, claim.claim.id, upload("application/pdf", 2 * 1024 * 1024))
            .await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        attachments
            .add(org.supervisor, claim.claim.id, upload("application/pdf", 2048))
            .await,
        Err(AppError::Forbidden(_))
    ));

    let stored = attachments
        .add(org.employee, claim.claim.id, upload("Application/PDF", 2048))
        .await
        .unwrap();
    assert_eq!(stored.mime_type, "application/pdf");
    assert_eq!(attachments.list(org.employee, claim.claim.id).await.unwrap().len(), 1);

    claims.submit(org.employee, claim.claim.id).await.unwrap();

    // In review: readable by the approver, frozen for the submitter.
    assert!(attachments.get(org.supervisor, stored.id).await.is_ok());
    assert!(matches!(
        attachments.delete(org.employee, stored.id).await,
        Err(AppError::BadRequest(_))
    ));

    let mine = DashboardRepository::new(db.clone()).me(org.employee).await.unwrap();
    assert_eq!(mine.total_claimed, dec!(350000));
    assert_eq!(mine.claims_by_status.len(), 1);
    assert_eq!(mine.claims_by_status[0].status, DocumentStatus::Submitted);

    let theirs = DashboardRepository::new(db.clone())
        .me(org.supervisor)
        .await
        .unwrap();
    assert_eq!(theirs.pending_approvals, 1);
}
