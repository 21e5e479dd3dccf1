//! Initial schema: organization, documents, approvals, bailouts and the
//! notification and audit tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn id(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().primary_key().to_owned()
}

fn enum_col(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).string_len(32).not_null().to_owned()
}

fn timestamp(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .to_owned()
}

fn money(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).decimal_len(15, 2).not_null().to_owned()
}

fn version(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col).integer().not_null().default(0).to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Departments::Table)
                    .if_not_exists()
                    .col(id(Departments::Id))
                    .col(ColumnDef::new(Departments::Code).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Departments::Name).string().not_null())
                    .col(ColumnDef::new(Departments::Description).text())
                    .col(ColumnDef::new(Departments::ParentId).uuid())
                    .col(timestamp(Departments::CreatedAt))
                    .col(timestamp(Departments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Departments::Table, Departments::ParentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(id(Users::Id))
                    .col(ColumnDef::new(Users::EmployeeId).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(enum_col(Users::Role))
                    .col(ColumnDef::new(Users::DepartmentId).uuid())
                    .col(ColumnDef::new(Users::SupervisorId).uuid())
                    .col(ColumnDef::new(Users::Phone).string_len(32))
                    .col(ColumnDef::new(Users::DeletedAt).timestamp_with_time_zone())
                    .col(timestamp(Users::CreatedAt))
                    .col(timestamp(Users::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Users::Table, Users::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Users::Table, Users::SupervisorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChartOfAccounts::Table)
                    .if_not_exists()
                    .col(id(ChartOfAccounts::Id))
                    .col(ColumnDef::new(ChartOfAccounts::Code).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(ChartOfAccounts::Name).string().not_null())
                    .col(enum_col(ChartOfAccounts::AccountType))
                    .col(ColumnDef::new(ChartOfAccounts::ParentId).uuid())
                    .col(ColumnDef::new(ChartOfAccounts::Description).text())
                    .col(ColumnDef::new(ChartOfAccounts::IsActive).boolean().not_null().default(true))
                    .col(timestamp(ChartOfAccounts::CreatedAt))
                    .col(timestamp(ChartOfAccounts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(ChartOfAccounts::Table, ChartOfAccounts::ParentId)
                            .to(ChartOfAccounts::Table, ChartOfAccounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TravelRequests::Table)
                    .if_not_exists()
                    .col(id(TravelRequests::Id))
                    .col(ColumnDef::new(TravelRequests::RequestNumber).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(TravelRequests::RequesterId).uuid().not_null())
                    .col(ColumnDef::new(TravelRequests::Purpose).text().not_null())
                    .col(ColumnDef::new(TravelRequests::Destination).string().not_null())
                    .col(enum_col(TravelRequests::TravelType))
                    .col(ColumnDef::new(TravelRequests::StartDate).date().not_null())
                    .col(ColumnDef::new(TravelRequests::EndDate).date().not_null())
                    .col(money(TravelRequests::EstimatedBudget))
                    .col(ColumnDef::new(TravelRequests::ProjectCode).string_len(64))
                    .col(enum_col(TravelRequests::Status))
                    .col(ColumnDef::new(TravelRequests::SubmittedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(TravelRequests::ClosedAt).timestamp_with_time_zone())
                    .col(version(TravelRequests::Version))
                    .col(timestamp(TravelRequests::CreatedAt))
                    .col(timestamp(TravelRequests::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(TravelRequests::Table, TravelRequests::RequesterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Claims::Table)
                    .if_not_exists()
                    .col(id(Claims::Id))
                    .col(ColumnDef::new(Claims::ClaimNumber).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Claims::TravelRequestId).uuid().not_null())
                    .col(ColumnDef::new(Claims::SubmitterId).uuid().not_null())
                    .col(enum_col(Claims::ClaimType))
                    .col(ColumnDef::new(Claims::Date).date().not_null())
                    .col(money(Claims::Amount))
                    .col(ColumnDef::new(Claims::Description).text().not_null())
                    .col(ColumnDef::new(Claims::Notes).text())
                    .col(ColumnDef::new(Claims::ChartOfAccountId).uuid())
                    .col(enum_col(Claims::Status))
                    .col(ColumnDef::new(Claims::EntertainmentType).string_len(32))
                    .col(ColumnDef::new(Claims::GuestName).string())
                    .col(ColumnDef::new(Claims::GuestCompany).string())
                    .col(ColumnDef::new(Claims::GuestPosition).string())
                    .col(ColumnDef::new(Claims::IsGovernmentOfficial).boolean())
                    .col(ColumnDef::new(Claims::Location).string())
                    .col(ColumnDef::new(Claims::ExpenseCategory).string_len(32))
                    .col(ColumnDef::new(Claims::Destination).string())
                    .col(ColumnDef::new(Claims::CustomerName).string())
                    .col(ColumnDef::new(Claims::SubmittedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Claims::PaidAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Claims::PaidBy).uuid())
                    .col(version(Claims::Version))
                    .col(timestamp(Claims::CreatedAt))
                    .col(timestamp(Claims::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Claims::Table, Claims::TravelRequestId)
                            .to(TravelRequests::Table, TravelRequests::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Claims::Table, Claims::SubmitterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Claims::Table, Claims::ChartOfAccountId)
                            .to(ChartOfAccounts::Table, ChartOfAccounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Approvals::Table)
                    .if_not_exists()
                    .col(id(Approvals::Id))
                    .col(ColumnDef::new(Approvals::TravelRequestId).uuid())
                    .col(ColumnDef::new(Approvals::ClaimId).uuid())
                    .col(enum_col(Approvals::Level))
                    .col(ColumnDef::new(Approvals::ApproverId).uuid().not_null())
                    .col(enum_col(Approvals::Status))
                    .col(ColumnDef::new(Approvals::Comments).text())
                    .col(ColumnDef::new(Approvals::RejectionReason).text())
                    .col(ColumnDef::new(Approvals::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Approvals::RejectedAt).timestamp_with_time_zone())
                    .col(version(Approvals::Version))
                    .col(timestamp(Approvals::CreatedAt))
                    .col(timestamp(Approvals::UpdatedAt))
                    .check(Expr::cust("(travel_request_id IS NULL) <> (claim_id IS NULL)"))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Approvals::Table, Approvals::TravelRequestId)
                            .to(TravelRequests::Table, TravelRequests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Approvals::Table, Approvals::ClaimId)
                            .to(Claims::Table, Claims::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Approvals::Table, Approvals::ApproverId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_approvals_travel_request_level")
                    .table(Approvals::Table)
                    .col(Approvals::TravelRequestId)
                    .col(Approvals::Level)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_approvals_claim_level")
                    .table(Approvals::Table)
                    .col(Approvals::ClaimId)
                    .col(Approvals::Level)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approvals_approver_status")
                    .table(Approvals::Table)
                    .col(Approvals::ApproverId)
                    .col(Approvals::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bailouts::Table)
                    .if_not_exists()
                    .col(id(Bailouts::Id))
                    .col(ColumnDef::new(Bailouts::BailoutNumber).string_len(32).not_null().unique_key())
                    .col(ColumnDef::new(Bailouts::TravelRequestId).uuid().not_null())
                    .col(ColumnDef::new(Bailouts::RequesterId).uuid().not_null())
                    .col(money(Bailouts::Amount))
                    .col(ColumnDef::new(Bailouts::Purpose).text().not_null())
                    .col(enum_col(Bailouts::Status))
                    .col(ColumnDef::new(Bailouts::SubmittedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Bailouts::ChiefApproverId).uuid())
                    .col(ColumnDef::new(Bailouts::ChiefApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Bailouts::DirectorApproverId).uuid())
                    .col(ColumnDef::new(Bailouts::DirectorApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Bailouts::RejectedBy).uuid())
                    .col(ColumnDef::new(Bailouts::RejectionReason).text())
                    .col(ColumnDef::new(Bailouts::RejectedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Bailouts::DisbursedBy).uuid())
                    .col(ColumnDef::new(Bailouts::DisbursedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Bailouts::DisbursementReference).string())
                    .col(version(Bailouts::Version))
                    .col(timestamp(Bailouts::CreatedAt))
                    .col(timestamp(Bailouts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Bailouts::Table, Bailouts::TravelRequestId)
                            .to(TravelRequests::Table, TravelRequests::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Bailouts::Table, Bailouts::RequesterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Attachments::Table)
                    .if_not_exists()
                    .col(id(Attachments::Id))
                    .col(ColumnDef::new(Attachments::ClaimId).uuid().not_null())
                    .col(ColumnDef::new(Attachments::Filename).string().not_null())
                    .col(ColumnDef::new(Attachments::MimeType).string_len(64).not_null())
                    .col(ColumnDef::new(Attachments::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(Attachments::StorageUrl).text().not_null())
                    .col(ColumnDef::new(Attachments::UploadedBy).uuid().not_null())
                    .col(timestamp(Attachments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attachments::Table, Attachments::ClaimId)
                            .to(Claims::Table, Claims::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attachments::Table, Attachments::UploadedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(id(Notifications::Id))
                    .col(ColumnDef::new(Notifications::RecipientId).uuid().not_null())
                    .col(enum_col(Notifications::Kind))
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(enum_col(Notifications::EntityType))
                    .col(ColumnDef::new(Notifications::EntityId).uuid().not_null())
                    .col(enum_col(Notifications::DeliveryStatus))
                    .col(ColumnDef::new(Notifications::ReadAt).timestamp_with_time_zone())
                    .col(timestamp(Notifications::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Notifications::Table, Notifications::RecipientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_recipient_read")
                    .table(Notifications::Table)
                    .col(Notifications::RecipientId)
                    .col(Notifications::ReadAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(id(AuditLogs::Id))
                    .col(ColumnDef::new(AuditLogs::ActorId).uuid())
                    .col(enum_col(AuditLogs::Action))
                    .col(enum_col(AuditLogs::EntityType))
                    .col(ColumnDef::new(AuditLogs::EntityId).uuid().not_null())
                    .col(ColumnDef::new(AuditLogs::Metadata).json().not_null())
                    .col(timestamp(AuditLogs::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_entity")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::EntityType)
                    .col(AuditLogs::EntityId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attachments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bailouts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Approvals::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Claims::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TravelRequests::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChartOfAccounts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Departments::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Departments {
    Table,
    Id,
    Code,
    Name,
    Description,
    ParentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    EmployeeId,
    Email,
    Name,
    PasswordHash,
    Role,
    DepartmentId,
    SupervisorId,
    Phone,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ChartOfAccounts {
    Table,
    Id,
    Code,
    Name,
    AccountType,
    ParentId,
    Description,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TravelRequests {
    Table,
    Id,
    RequestNumber,
    RequesterId,
    Purpose,
    Destination,
    TravelType,
    StartDate,
    EndDate,
    EstimatedBudget,
    ProjectCode,
    Status,
    SubmittedAt,
    ClosedAt,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Claims {
    Table,
    Id,
    ClaimNumber,
    TravelRequestId,
    SubmitterId,
    ClaimType,
    Date,
    Amount,
    Description,
    Notes,
    ChartOfAccountId,
    Status,
    EntertainmentType,
    GuestName,
    GuestCompany,
    GuestPosition,
    IsGovernmentOfficial,
    Location,
    ExpenseCategory,
    Destination,
    CustomerName,
    SubmittedAt,
    PaidAt,
    PaidBy,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Approvals {
    Table,
    Id,
    TravelRequestId,
    ClaimId,
    Level,
    ApproverId,
    Status,
    Comments,
    RejectionReason,
    ApprovedAt,
    RejectedAt,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Bailouts {
    Table,
    Id,
    BailoutNumber,
    TravelRequestId,
    RequesterId,
    Amount,
    Purpose,
    Status,
    SubmittedAt,
    ChiefApproverId,
    ChiefApprovedAt,
    DirectorApproverId,
    DirectorApprovedAt,
    RejectedBy,
    RejectionReason,
    RejectedAt,
    DisbursedBy,
    DisbursedAt,
    DisbursementReference,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Attachments {
    Table,
    Id,
    ClaimId,
    Filename,
    MimeType,
    FileSize,
    StorageUrl,
    UploadedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    RecipientId,
    Kind,
    Title,
    Message,
    EntityType,
    EntityId,
    DeliveryStatus,
    ReadAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    ActorId,
    Action,
    EntityType,
    EntityId,
    Metadata,
    CreatedAt,
}
