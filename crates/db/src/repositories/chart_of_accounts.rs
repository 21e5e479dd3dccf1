//! Chart of accounts repository.
//!
//! Accounts form a tree whose parent and child always share an account type.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;
use wayfare_core::access::Actor;
use wayfare_core::account::{AccountError, AccountType, check_deletable, check_parent_type};
use wayfare_core::audit::{AuditAction, AuditEntry, EntityType};
use wayfare_core::hierarchy::{Forest, TreeNode, build_tree};
use wayfare_shared::AppError;

use crate::entities::{chart_of_accounts, claims, sea_orm_active_enums};
use crate::repositories::support::{not_found, sql_err, write_audit};

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Unique code.
    pub code: String,
    /// Name.
    pub name: String,
    /// Type.
    pub account_type: AccountType,
    /// Parent account of the same type.
    pub parent_id: Option<Uuid>,
    /// Description.
    pub description: Option<String>,
    /// Whether claims may be booked on it.
    pub is_active: bool,
}

/// Input for updating an account.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// Code.
    pub code: Option<String>,
    /// Name.
    pub name: Option<String>,
    /// Type, only while the account has no children.
    pub account_type: Option<AccountType>,
    /// Parent; `Some(None)` makes it a root.
    pub parent_id: Option<Option<Uuid>>,
    /// Description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// Filter options for listing accounts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountFilter {
    /// Only this type.
    pub account_type: Option<AccountType>,
    /// Only active or inactive.
    pub is_active: Option<bool>,
}

/// Chart of accounts repository.
#[derive(Debug, Clone)]
pub struct ChartOfAccountsRepository {
    db: DatabaseConnection,
}

impl ChartOfAccountsRepository {
    /// Creates a new repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists accounts ordered by code.
    pub async fn list(&self, filter: AccountFilter) -> Result<Vec<chart_of_accounts::Model>, AppError> {
        let mut query = chart_of_accounts::Entity::find().order_by_asc(chart_of_accounts::Column::Code);
        if let Some(account_type) = filter.account_type {
            query = query.filter(
                chart_of_accounts::Column::AccountType
                    .eq(sea_orm_active_enums::AccountType::from(account_type)),
            );
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(chart_of_accounts::Column::IsActive.eq(is_active));
        }
        query.all(&self.db).await.map_err(sql_err)
    }

    /// Every account nested under its parent, siblings ordered by code.
    pub async fn tree(&self) -> Result<Vec<TreeNode<chart_of_accounts::Model>>, AppError> {
        let rows = self.list(AccountFilter::default()).await?;
        Ok(build_tree(rows, |a| a.id, |a| a.parent_id))
    }

    /// Finds an account by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<chart_of_accounts::Model, AppError> {
        find(&self.db, id).await
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// `Conflict` on a duplicate code, `NotFound` for a missing parent,
    /// `BadRequest` when the parent has another type.
    pub async fn create(
        &self,
        actor: Actor,
        input: CreateAccountInput,
    ) -> Result<chart_of_accounts::Model, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        ensure_code_free(&txn, &input.code, None).await?;

        if let Some(parent_id) = input.parent_id {
            let parent = find(&txn, parent_id).await?;
            check_parent_type(input.account_type, parent.account_type.into())?;
        }

        let now = Utc::now().into();
        let account = chart_of_accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            code: Set(input.code),
            name: Set(input.name),
            account_type: Set(input.account_type.into()),
            parent_id: Set(input.parent_id),
            description: Set(input.description),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Create,
                EntityType::ChartOfAccount,
                account.id,
            )
            .with("code", &account.code)
            .with("account_type", account.account_type),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(account_id = %account.id, code = %account.code, "Account created");
        Ok(account)
    }

    /// Updates an account.
    ///
    /// # Errors
    ///
    /// As [`Self::create`], plus `BadRequest` for a cycle or a type change
    /// on an account with children.
    pub async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        input: UpdateAccountInput,
    ) -> Result<chart_of_accounts::Model, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let account = find(&txn, id).await?;

        if let Some(code) = &input.code
            && *code != account.code
        {
            ensure_code_free(&txn, code, Some(id)).await?;
        }

        let current_type: AccountType = account.account_type.into();
        let new_type = input.account_type.unwrap_or(current_type);
        if new_type != current_type && child_count(&txn, id).await? > 0 {
            return Err(AccountError::TypeLockedByChildren.into());
        }

        let parent_id = input.parent_id.unwrap_or(account.parent_id);
        if let Some(parent) = parent_id {
            account_forest(&txn)
                .await?
                .check_reassignment("account", id, Some(parent))?;
            let parent = find(&txn, parent).await?;
            check_parent_type(new_type, parent.account_type.into())?;
        }

        let mut active: chart_of_accounts::ActiveModel = account.into();
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.account_type = Set(new_type.into());
        active.parent_id = Set(parent_id);
        active.updated_at = Set(Utc::now().into());
        let account = active.update(&txn).await.map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Update,
                EntityType::ChartOfAccount,
                id,
            )
            .with("code", &account.code)
            .with("parent_id", account.parent_id)
            .with("is_active", account.is_active),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(account_id = %id, "Account updated");
        Ok(account)
    }

    /// Deletes an account with no children and no claims booked on it.
    pub async fn delete(&self, actor: Actor, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let account = find(&txn, id).await?;

        let children = child_count(&txn, id).await?;
        let claim_count = claims::Entity::find()
            .filter(claims::Column::ChartOfAccountId.eq(id))
            .count(&txn)
            .await
            .map_err(sql_err)?;
        check_deletable(children, claim_count)?;

        chart_of_accounts::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(sql_err)?;
        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Delete,
                EntityType::ChartOfAccount,
                id,
            )
            .with("code", account.code),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(account_id = %id, "Account deleted");
        Ok(())
    }
}

async fn find<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<chart_of_accounts::Model, AppError> {
    chart_of_accounts::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(sql_err)?
        .ok_or_else(|| not_found("Account", id))
}

async fn child_count<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<u64, AppError> {
    chart_of_accounts::Entity::find()
        .filter(chart_of_accounts::Column::ParentId.eq(id))
        .count(conn)
        .await
        .map_err(sql_err)
}

async fn ensure_code_free<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    let mut query = chart_of_accounts::Entity::find().filter(chart_of_accounts::Column::Code.eq(code));
    if let Some(except) = except {
        query = query.filter(chart_of_accounts::Column::Id.ne(except));
    }
    if query.one(conn).await.map_err(sql_err)?.is_some() {
        return Err(AppError::Conflict(format!("Account code '{code}' already exists")));
    }
    Ok(())
}

async fn account_forest<C: ConnectionTrait>(conn: &C) -> Result<Forest, AppError> {
    let rows: Vec<(Uuid, Option<Uuid>)> = chart_of_accounts::Entity::find()
        .select_only()
        .column(chart_of_accounts::Column::Id)
        .column(chart_of_accounts::Column::ParentId)
        .into_tuple()
        .all(conn)
        .await
        .map_err(sql_err)?;
    Ok(rows.into_iter().collect())
}
