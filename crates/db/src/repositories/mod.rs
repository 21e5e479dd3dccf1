//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every mutation writes its audit rows (and queued notifications) in the
//! same transaction as the change itself.

pub mod approval;
pub mod attachment;
pub mod audit_log;
pub mod bailout;
pub mod chart_of_accounts;
pub mod claim;
pub mod dashboard;
pub mod department;
pub mod notification;
pub mod travel_request;
pub mod user;

mod support;


pub use approval::{ApprovalDecision, ApprovalRepository, ChainView, PendingApproval};
pub use attachment::AttachmentRepository;
pub use audit_log::{AuditLogFilter, AuditLogRepository};
pub use bailout::{BailoutFilter, BailoutRepository, CreateBailoutInput, UpdateBailoutInput};
pub use chart_of_accounts::{
    AccountFilter, ChartOfAccountsRepository, CreateAccountInput, UpdateAccountInput,
};
pub use claim::{ClaimFilter, ClaimRepository, ClaimView, CreateClaimInput, UpdateClaimInput};
pub use dashboard::DashboardRepository;
pub use department::{CreateDepartmentInput, DepartmentRepository, UpdateDepartmentInput};
pub use notification::{NotificationFilter, NotificationRepository, Notifier};
pub use support::sql_err;
pub use travel_request::{
    CreateTravelRequestInput, TravelRequestFilter, TravelRequestRepository,
    UpdateTravelRequestInput,
};
pub use user::{CreateUserInput, UpdateUserInput, UserFilter, UserRepository};
