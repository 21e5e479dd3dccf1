//! Audit trail queries. Rows are only ever inserted, by the repositories
//! that perform the audited mutation.

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;
use wayfare_core::audit::{AuditAction, EntityType};
use wayfare_shared::{AppError, PageRequest, PageResponse};

use crate::entities::{audit_logs, sea_orm_active_enums};
use crate::repositories::support::sql_err;

/// Filter options for the audit trail.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditLogFilter {
    /// Kind of record.
    pub entity_type: Option<EntityType>,
    /// One record.
    pub entity_id: Option<Uuid>,
    /// Who acted.
    pub actor_id: Option<Uuid>,
    /// What they did.
    pub action: Option<AuditAction>,
    /// First day, inclusive.
    pub from: Option<NaiveDate>,
    /// Last day, inclusive.
    pub to: Option<NaiveDate>,
}

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    db: DatabaseConnection,
}

impl AuditLogRepository {
    /// Creates a new audit log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Searches the trail, newest first.
    pub async fn list(
        &self,
        filter: AuditLogFilter,
        page: PageRequest,
    ) -> Result<PageResponse<audit_logs::Model>, AppError> {
        let page = page.normalized();
        let mut query = audit_logs::Entity::find()
            .order_by_desc(audit_logs::Column::CreatedAt)
            .order_by_desc(audit_logs::Column::Id);

        if let Some(entity_type) = filter.entity_type {
            query = query.filter(
                audit_logs::Column::EntityType.eq(sea_orm_active_enums::EntityType::from(entity_type)),
            );
        }
        if let Some(entity_id) = filter.entity_id {
            query = query.filter(audit_logs::Column::EntityId.eq(entity_id));
        }
        if let Some(actor_id) = filter.actor_id {
            query = query.filter(audit_logs::Column::ActorId.eq(actor_id));
        }
        if let Some(action) = filter.action {
            query = query.filter(
                audit_logs::Column::Action.eq(sea_orm_active_enums::AuditAction::from(action)),
            );
        }
        if let Some(from) = filter.from.and_then(|d| d.and_hms_opt(0, 0, 0)) {
            query =
                query.filter(audit_logs::Column::CreatedAt.gte(from.and_utc().fixed_offset()));
        }
        if let Some(to) = filter
            .to
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            query =
                query.filter(audit_logs::Column::CreatedAt.lt(to.and_utc().fixed_offset()));
        }

        let paginator = query.paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(sql_err)?;
        let rows = paginator
            .fetch_page(u64::from(page.page - 1))
            .await
            .map_err(sql_err)?;
        Ok(PageResponse::new(rows, page, total))
    }

    /// Every entry for one record, oldest first.
    pub async fn entity_history(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<Vec<audit_logs::Model>, AppError> {
        audit_logs::Entity::find()
            .filter(
                audit_logs::Column::EntityType.eq(sea_orm_active_enums::EntityType::from(entity_type)),
            )
            .filter(audit_logs::Column::EntityId.eq(entity_id))
            .order_by_asc(audit_logs::Column::CreatedAt)
            .order_by_asc(audit_logs::Column::Id)
            .all(&self.db)
            .await
            .map_err(sql_err)
    }
}
