//! Notification repository and post-commit delivery.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, sea_query::Expr,
};
use tracing::{debug, info, warn};
use uuid::Uuid;
use wayfare_core::notification::{DeliveryStatus, NotificationDraft};
use wayfare_shared::{AppError, NotificationSender, PageRequest, PageResponse};

use crate::entities::{notifications, users};
use crate::repositories::support::{not_found, sql_err};

/// Hands stored notifications to a [`NotificationSender`] and records the
/// outcome. Called after the transaction that queued them has committed.
#[derive(Clone)]
pub struct Notifier {
    db: DatabaseConnection,
    sender: Arc<dyn NotificationSender>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("channel", &self.sender.channel())
            .finish_non_exhaustive()
    }
}

impl Notifier {
    /// Creates a notifier.
    #[must_use]
    pub fn new(db: DatabaseConnection, sender: Arc<dyn NotificationSender>) -> Self {
        Self { db, sender }
    }

    /// Delivers each queued notification. Failures are logged and recorded
    /// as `FAILED`; they never fail the caller.
    pub async fn deliver(&self, ids: &[Uuid]) {
        for id in ids {
            match self.deliver_one(*id).await {
                Ok(status) => debug!(notification_id = %id, ?status, "Notification processed"),
                Err(e) => warn!(notification_id = %id, error = %e, "Notification delivery skipped"),
            }
        }
    }

    async fn deliver_one(&self, id: Uuid) -> Result<DeliveryStatus, AppError> {
        let row = notifications::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| not_found("Notification", id))?;
        let recipient = users::Entity::find_by_id(row.recipient_id)
            .one(&self.db)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| not_found("User", row.recipient_id))?;

        let draft = NotificationDraft {
            recipient_id: row.recipient_id,
            kind: row.kind.into(),
            title: row.title.clone(),
            message: row.message.clone(),
            entity_type: row.entity_type.into(),
            entity_id: row.entity_id,
        };
        let message = draft.to_outbound(&recipient.email, &recipient.name);

        let status = match self.sender.send(&message).await {
            Ok(()) => DeliveryStatus::Sent,
            Err(e) => {
                warn!(
                    notification_id = %id,
                    channel = self.sender.channel(),
                    error = %e,
                    "Notification delivery failed"
                );
                DeliveryStatus::Failed
            }
        };

        let mut active: notifications::ActiveModel = row.into();
        active.delivery_status = Set(status.into());
        active.update(&self.db).await.map_err(sql_err)?;
        Ok(status)
    }
}

/// Filter options for listing notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationFilter {
    /// Only unread ones.
    pub unread_only: bool,
}

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the user's notifications, newest first.
    pub async fn list(
        &self,
        recipient_id: Uuid,
        filter: NotificationFilter,
        page: PageRequest,
    ) -> Result<PageResponse<notifications::Model>, AppError> {
        let page = page.normalized();
        let mut query = notifications::Entity::find()
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id);
        if filter.unread_only {
            query = query.filter(notifications::Column::ReadAt.is_null());
        }

        let paginator = query.paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(sql_err)?;
        let rows = paginator
            .fetch_page(u64::from(page.page - 1))
            .await
            .map_err(sql_err)?;
        Ok(PageResponse::new(rows, page, total))
    }

    /// Number of unread notifications.
    pub async fn unread_count(&self, recipient_id: Uuid) -> Result<u64, AppError> {
        notifications::Entity::find()
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .filter(notifications::Column::ReadAt.is_null())
            .count(&self.db)
            .await
            .map_err(sql_err)
    }

    /// Marks one notification read. Someone else's notification is reported
    /// as not found.
    pub async fn mark_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<notifications::Model, AppError> {
        let row = notifications::Entity::find_by_id(id)
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .one(&self.db)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| not_found("Notification", id))?;

        if row.read_at.is_some() {
            return Ok(row);
        }
        let mut active: notifications::ActiveModel = row.into();
        active.read_at = Set(Some(Utc::now().into()));
        active.update(&self.db).await.map_err(sql_err)
    }

    /// Marks every unread notification read and returns how many changed.
    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64, AppError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::ReadAt, Expr::value(now))
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .filter(notifications::Column::ReadAt.is_null())
            .exec(&self.db)
            .await
            .map_err(sql_err)?;
        info!(%recipient_id, count = result.rows_affected, "Marked notifications read");
        Ok(result.rows_affected)
    }
}
