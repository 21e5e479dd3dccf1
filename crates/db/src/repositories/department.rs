//! Department repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use tracing::info;
use uuid::Uuid;
use wayfare_core::access::Actor;
use wayfare_core::audit::{AuditAction, AuditEntry, EntityType};
use wayfare_core::hierarchy::{Forest, TreeNode, build_tree, ensure_no_dependents};
use wayfare_shared::AppError;

use crate::entities::{departments, users};
use crate::repositories::support::{not_found, sql_err, write_audit};

/// Input for creating a department.
#[derive(Debug, Clone)]
pub struct CreateDepartmentInput {
    /// Short unique code.
    pub code: String,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Parent department.
    pub parent_id: Option<Uuid>,
}

/// Input for updating a department.
#[derive(Debug, Clone, Default)]
pub struct UpdateDepartmentInput {
    /// Code.
    pub code: Option<String>,
    /// Name.
    pub name: Option<String>,
    /// Description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Parent; `Some(None)` makes it a root.
    pub parent_id: Option<Option<Uuid>>,
}

/// Department repository.
#[derive(Debug, Clone)]
pub struct DepartmentRepository {
    db: DatabaseConnection,
}

impl DepartmentRepository {
    /// Creates a new department repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// All departments ordered by code.
    pub async fn list(&self) -> Result<Vec<departments::Model>, AppError> {
        departments::Entity::find()
            .order_by_asc(departments::Column::Code)
            .all(&self.db)
            .await
            .map_err(sql_err)
    }

    /// Departments nested under their parents.
    pub async fn tree(&self) -> Result<Vec<TreeNode<departments::Model>>, AppError> {
        let rows = self.list().await?;
        Ok(build_tree(rows, |d| d.id, |d| d.parent_id))
    }

    /// Finds a department by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<departments::Model, AppError> {
        departments::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| not_found("Department", id))
    }

    /// Creates a department.
    pub async fn create(
        &self,
        actor: Actor,
        input: CreateDepartmentInput,
    ) -> Result<departments::Model, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;

        if departments::Entity::find()
            .filter(departments::Column::Code.eq(&input.code))
            .one(&txn)
            .await
            .map_err(sql_err)?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Department code '{}' already exists",
                input.code
            )));
        }

        let id = Uuid::now_v7();
        department_forest(&txn)
            .await?
            .check_reassignment("department", id, input.parent_id)?;

        let now = Utc::now().into();
        let department = departments::ActiveModel {
            id: Set(id),
            code: Set(input.code),
            name: Set(input.name),
            description: Set(input.description),
            parent_id: Set(input.parent_id),
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
                EntityType::Department,
                id,
            )
            .with("code", &department.code),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(department_id = %id, code = %department.code, "Department created");
        Ok(department)
    }

    /// Updates a department. A new parent is checked for cycles.
    pub async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        input: UpdateDepartmentInput,
    ) -> Result<departments::Model, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let department = departments::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| not_found("Department", id))?;

        if let Some(code) = &input.code
            && *code != department.code
            && departments::Entity::find()
                .filter(departments::Column::Code.eq(code))
                .one(&txn)
                .await
                .map_err(sql_err)?
                .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Department code '{code}' already exists"
            )));
        }
        if let Some(parent_id) = input.parent_id {
            department_forest(&txn)
                .await?
                .check_reassignment("department", id, parent_id)?;
        }

        let mut active: departments::ActiveModel = department.into();
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(parent_id) = input.parent_id {
            active.parent_id = Set(parent_id);
        }
        active.updated_at = Set(Utc::now().into());
        let department = active.update(&txn).await.map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Update,
                EntityType::Department,
                id,
            )
            .with("code", &department.code)
            .with("parent_id", department.parent_id),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(department_id = %id, "Department updated");
        Ok(department)
    }

    /// Deletes a department that no active user belongs to. Child
    /// departments become roots.
    pub async fn delete(&self, actor: Actor, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let department = departments::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| not_found("Department", id))?;

        let members = users::Entity::find()
            .filter(users::Column::DepartmentId.eq(id))
            .filter(users::Column::DeletedAt.is_null())
            .count(&txn)
            .await
            .map_err(sql_err)?;
        ensure_no_dependents("department", "users", members)?;

        departments::Entity::update_many()
            .col_expr(
                departments::Column::ParentId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(departments::Column::ParentId.eq(id))
            .exec(&txn)
            .await
            .map_err(sql_err)?;
        users::Entity::update_many()
            .col_expr(
                users::Column::DepartmentId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(users::Column::DepartmentId.eq(id))
            .exec(&txn)
            .await
            .map_err(sql_err)?;
        departments::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::Delete,
                EntityType::Department,
                id,
            )
            .with("code", department.code),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(department_id = %id, "Department deleted");
        Ok(())
    }
}

async fn department_forest<C: ConnectionTrait>(conn: &C) -> Result<Forest, AppError> {
    let rows: Vec<(Uuid, Option<Uuid>)> = departments::Entity::find()
        .select_only()
        .column(departments::Column::Id)
        .column(departments::Column::ParentId)
        .into_tuple()
        .all(conn)
        .await
        .map_err(sql_err)?;
    Ok(rows.into_iter().collect())
}
