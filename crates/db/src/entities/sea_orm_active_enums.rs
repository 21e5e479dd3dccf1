//! Enum columns, stored as short strings.
//!
//! Each database enum mirrors a core enum one to one; the `From` impls in
//! both directions are generated alongside.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use wayfare_core::access::Role;
use wayfare_core::account::AccountType as CoreAccountType;
use wayfare_core::approval::{ApprovalLevel as CoreApprovalLevel, ApprovalStatus as CoreApprovalStatus};
use wayfare_core::audit::{AuditAction as CoreAuditAction, EntityType as CoreEntityType};
use wayfare_core::bailout::BailoutStatus as CoreBailoutStatus;
use wayfare_core::claim::{
    ClaimType as CoreClaimType, EntertainmentType as CoreEntertainmentType,
    ExpenseCategory as CoreExpenseCategory,
};
use wayfare_core::document::DocumentStatus as CoreDocumentStatus;
use wayfare_core::notification::{
    DeliveryStatus as CoreDeliveryStatus, NotificationKind as CoreNotificationKind,
};
use wayfare_core::travel::TravelType as CoreTravelType;

macro_rules! db_enum {
    ($(#[$meta:meta])* $name:ident => $core:ty { $($variant:ident = $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
        #[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
        pub enum $name {
            $(
                #[allow(missing_docs)]
                #[sea_orm(string_value = $value)]
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl From<$name> for $core {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => <$core>::$variant,)+
                }
            }
        }

        impl From<$core> for $name {
            fn from(value: $core) -> Self {
                match value {
                    $(<$core>::$variant => Self::$variant,)+
                }
            }
        }
    };
}

db_enum! {
    /// `users.role`
    UserRole => Role {
        Employee = "EMPLOYEE",
        SalesEmployee = "SALES_EMPLOYEE",
        Supervisor = "SUPERVISOR",
        SalesChief = "SALES_CHIEF",
        Manager = "MANAGER",
        Director = "DIRECTOR",
        Finance = "FINANCE",
        Admin = "ADMIN",
    }
}

db_enum! {
    /// `travel_requests.status`, `claims.status`
    DocumentStatus => CoreDocumentStatus {
        Draft = "DRAFT",
        Submitted = "SUBMITTED",
        ApprovedL1 = "APPROVED_L1",
        ApprovedL2 = "APPROVED_L2",
        ApprovedL3 = "APPROVED_L3",
        ApprovedL4 = "APPROVED_L4",
        ApprovedL5 = "APPROVED_L5",
        Approved = "APPROVED",
        Rejected = "REJECTED",
        Revision = "REVISION",
        Paid = "PAID",
        Closed = "CLOSED",
    }
}

db_enum! {
    /// `approvals.level`
    ApprovalLevel => CoreApprovalLevel {
        L1Supervisor = "L1_SUPERVISOR",
        L2Manager = "L2_MANAGER",
        L3Director = "L3_DIRECTOR",
        L4SeniorDirector = "L4_SENIOR_DIRECTOR",
        L5Executive = "L5_EXECUTIVE",
    }
}

db_enum! {
    /// `approvals.status`
    ApprovalStatus => CoreApprovalStatus {
        Pending = "PENDING",
        Approved = "APPROVED",
        Rejected = "REJECTED",
        RevisionRequested = "REVISION_REQUESTED",
    }
}

db_enum! {
    /// `bailouts.status`
    BailoutStatus => CoreBailoutStatus {
        Draft = "DRAFT",
        Submitted = "SUBMITTED",
        ApprovedChief = "APPROVED_CHIEF",
        ApprovedDirector = "APPROVED_DIRECTOR",
        Disbursed = "DISBURSED",
        Rejected = "REJECTED",
    }
}

db_enum! {
    /// `travel_requests.travel_type`
    TravelType => CoreTravelType {
        Domestic = "DOMESTIC",
        International = "INTERNATIONAL",
    }
}

db_enum! {
    /// `claims.claim_type`
    ClaimType => CoreClaimType {
        Entertainment = "ENTERTAINMENT",
        NonEntertainment = "NON_ENTERTAINMENT",
    }
}

db_enum! {
    /// `claims.entertainment_type`
    EntertainmentType => CoreEntertainmentType {
        Meal = "MEAL",
        Gift = "GIFT",
        Event = "EVENT",
        Other = "OTHER",
    }
}

db_enum! {
    /// `claims.expense_category`
    ExpenseCategory => CoreExpenseCategory {
        Transport = "TRANSPORT",
        Accommodation = "ACCOMMODATION",
        Meal = "MEAL",
        Communication = "COMMUNICATION",
        Other = "OTHER",
    }
}

db_enum! {
    /// `chart_of_accounts.account_type`
    AccountType => CoreAccountType {
        Asset = "ASSET",
        Liability = "LIABILITY",
        Equity = "EQUITY",
        Revenue = "REVENUE",
        Expense = "EXPENSE",
    }
}

db_enum! {
    /// `notifications.kind`
    NotificationKind => CoreNotificationKind {
        ApprovalRequired = "APPROVAL_REQUIRED",
        Approved = "APPROVED",
        Rejected = "REJECTED",
        RevisionRequested = "REVISION_REQUESTED",
        BailoutUpdate = "BAILOUT_UPDATE",
        Payment = "PAYMENT",
    }
}

db_enum! {
    /// `notifications.delivery_status`
    DeliveryStatus => CoreDeliveryStatus {
        Pending = "PENDING",
        Sent = "SENT",
        Failed = "FAILED",
    }
}

db_enum! {
    /// `audit_logs.action`
    AuditAction => CoreAuditAction {
        Create = "CREATE",
        Update = "UPDATE",
        Delete = "DELETE",
        Submit = "SUBMIT",
        Approve = "APPROVE",
        Reject = "REJECT",
        RequestRevision = "REQUEST_REVISION",
        Disburse = "DISBURSE",
        AssignSupervisor = "ASSIGN_SUPERVISOR",
        MarkPaid = "MARK_PAID",
        Close = "CLOSE",
    }
}

db_enum! {
    /// `audit_logs.entity_type`, `notifications.entity_type`
    EntityType => CoreEntityType {
        User = "USER",
        Department = "DEPARTMENT",
        TravelRequest = "TRAVEL_REQUEST",
        Claim = "CLAIM",
        Approval = "APPROVAL",
        Bailout = "BAILOUT",
        Attachment = "ATTACHMENT",
        ChartOfAccount = "CHART_OF_ACCOUNT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_core() {
        for status in [
            CoreDocumentStatus::Draft,
            CoreDocumentStatus::ApprovedL3,
            CoreDocumentStatus::Closed,
        ] {
            assert_eq!(CoreDocumentStatus::from(DocumentStatus::from(status)), status);
        }
        assert_eq!(Role::from(UserRole::SalesChief), Role::SalesChief);
    }

    #[test]
    fn test_stored_values_match_wire_names() {
        assert_eq!(DocumentStatus::ApprovedL2.to_value(), "APPROVED_L2");
        assert_eq!(
            ApprovalLevel::L4SeniorDirector.to_value(),
            CoreApprovalLevel::L4SeniorDirector.as_str()
        );
        assert_eq!(AuditAction::RequestRevision.to_value(), "REQUEST_REVISION");
    }
}
