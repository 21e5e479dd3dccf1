//! `SeaORM` entity definitions.

pub mod approvals;
pub mod attachments;
pub mod audit_logs;
pub mod bailouts;
pub mod chart_of_accounts;
pub mod claims;
pub mod departments;
pub mod notifications;
pub mod sea_orm_active_enums;
pub mod travel_requests;
pub mod users;

pub mod prelude {
    //! Entity aliases.

    pub use super::approvals::Entity as Approvals;
    pub use super::attachments::Entity as Attachments;
    pub use super::audit_logs::Entity as AuditLogs;
    pub use super::bailouts::Entity as Bailouts;
    pub use super::chart_of_accounts::Entity as ChartOfAccounts;
    pub use super::claims::Entity as Claims;
    pub use super::departments::Entity as Departments;
    pub use super::notifications::Entity as Notifications;
    pub use super::travel_requests::Entity as TravelRequests;
    pub use super::users::Entity as Users;
}
