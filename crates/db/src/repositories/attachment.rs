//! Claim attachment repository.
//!
//! Only metadata is stored; the bytes live wherever `storage_url` points.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;
use wayfare_core::access::Actor;
use wayfare_core::attachment::{NewAttachment, validate_upload};
use wayfare_core::audit::{AuditAction, AuditEntry, EntityType};
use wayfare_core::document::ensure_editable;
use wayfare_shared::AppError;

use crate::entities::attachments;
use crate::repositories::claim;
use crate::repositories::support::{not_found, sql_err, write_audit};

/// Attachment repository.
#[derive(Debug, Clone)]
pub struct AttachmentRepository {
    db: DatabaseConnection,
    max_file_size: i64,
}

impl AttachmentRepository {
    /// Creates a new attachment repository with an upload size limit in bytes.
    #[must_use]
    pub const fn new(db: DatabaseConnection, max_file_size: i64) -> Self {
        Self { db, max_file_size }
    }

    /// Records an upload on a claim the actor may still edit.
    ///
    /// # Errors
    ///
    /// `BadRequest` for unsupported types, empty or oversized files, or a
    /// claim already in review.
    pub async fn add(
        &self,
        actor: Actor,
        claim_id: Uuid,
        input: NewAttachment,
    ) -> Result<attachments::Model, AppError> {
        let kind = match validate_upload(&input, self.max_file_size) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(claim_id = %claim_id, error = %e, "Attachment rejected");
                return Err(e.into());
            }
        };

        let txn = self.db.begin().await.map_err(sql_err)?;
        let claim = claim::find(&txn, claim_id).await?;
        ensure_editable("claim", claim.status.into(), actor.user_id, claim.submitter_id)?;

        let attachment = attachments::ActiveModel {
            id: Set(Uuid::now_v7()),
            claim_id: Set(claim_id),
            filename: Set(input.filename.trim().to_string()),
            mime_type: Set(kind.mime_type().to_string()),
            file_size: Set(input.file_size),
            storage_url: Set(input.storage_url),
            uploaded_by: Set(actor.user_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Create,
                EntityType::Attachment,
                attachment.id,
            )
            .with("claim_id", claim_id)
            .with("filename", &attachment.filename)
            .with("file_size", attachment.file_size),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(attachment_id = %attachment.id, claim_id = %claim_id, "Attachment added");
        Ok(attachment)
    }

    /// Lists a claim's attachments, oldest first.
    pub async fn list(&self, actor: Actor, claim_id: Uuid) -> Result<Vec<attachments::Model>, AppError> {
        let claim = claim::find(&self.db, claim_id).await?;
        claim::ensure_readable(&self.db, actor, &claim).await?;

        attachments::Entity::find()
            .filter(attachments::Column::ClaimId.eq(claim_id))
            .order_by_asc(attachments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(sql_err)
    }

    /// Gets one attachment if its claim is visible to the actor.
    pub async fn get(&self, actor: Actor, id: Uuid) -> Result<attachments::Model, AppError> {
        let attachment = attachments::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| not_found("Attachment", id))?;
        let claim = claim::find(&self.db, attachment.claim_id).await?;
        claim::ensure_readable(&self.db, actor, &claim).await?;
        Ok(attachment)
    }

    /// Removes an attachment while its claim is still editable.
    pub async fn delete(&self, actor: Actor, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let attachment = attachments::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| not_found("Attachment", id))?;
        let claim = claim::find(&txn, attachment.claim_id).await?;
        ensure_editable("claim", claim.status.into(), actor.user_id, claim.submitter_id)?;

        attachments::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(sql_err)?;
        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Delete,
                EntityType::Attachment,
                id,
            )
            .with("claim_id", attachment.claim_id)
            .with("filename", attachment.filename),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(attachment_id = %id, "Attachment deleted");
        Ok(())
    }
}
