//! User repository: organization members, the supervisor forest and
//! soft deletion.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;
use wayfare_core::access::{Actor, Role};
use wayfare_core::audit::{AuditAction, AuditEntry, EntityType};
use wayfare_core::hierarchy::{Forest, ensure_no_dependents};
use wayfare_shared::{AppError, PageRequest, PageResponse};

use crate::entities::{departments, sea_orm_active_enums::UserRole, users};
use crate::repositories::approval::pending_held_by;
use crate::repositories::support::{not_found, sql_err, write_audit};

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Employee number, unique.
    pub employee_id: String,
    /// Email, unique.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Argon2 hash of the initial password.
    pub password_hash: String,
    /// Role.
    pub role: Role,
    /// Department.
    pub department_id: Option<Uuid>,
    /// Direct supervisor.
    pub supervisor_id: Option<Uuid>,
    /// Phone number.
    pub phone: Option<String>,
}

/// Input for updating a user. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// Email.
    pub email: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Role.
    pub role: Option<Role>,
    /// Department; `Some(None)` clears it.
    pub department_id: Option<Option<Uuid>>,
    /// Phone; `Some(None)` clears it.
    pub phone: Option<Option<String>>,
}

/// Filter options for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Only this role.
    pub role: Option<Role>,
    /// Only this department.
    pub department_id: Option<Uuid>,
    /// Substring of name, email or employee id.
    pub search: Option<String>,
    /// Include soft-deleted users.
    pub include_deleted: bool,
}

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an active user by email, for login.
    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<users::Model>, AppError> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.trim().to_lowercase()))
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(sql_err)
    }

    /// Finds a user by ID unless they were soft-deleted.
    pub async fn find_active_by_id(&self, id: Uuid) -> Result<Option<users::Model>, AppError> {
        users::Entity::find_by_id(id)
            .filter(users::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(sql_err)
    }

    /// Finds a user by ID, deleted or not.
    pub async fn find_by_id(&self, id: Uuid) -> Result<users::Model, AppError> {
        users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(sql_err)?
            .ok_or_else(|| not_found("User", id))
    }

    /// Lists users with filters and pagination, ordered by name.
    pub async fn list(
        &self,
        filter: UserFilter,
        page: PageRequest,
    ) -> Result<PageResponse<users::Model>, AppError> {
        let page = page.normalized();
        let mut query = users::Entity::find().order_by_asc(users::Column::Name);

        if !filter.include_deleted {
            query = query.filter(users::Column::DeletedAt.is_null());
        }
        if let Some(role) = filter.role {
            query = query.filter(users::Column::Role.eq(UserRole::from(role)));
        }
        if let Some(department_id) = filter.department_id {
            query = query.filter(users::Column::DepartmentId.eq(department_id));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(users::Column::Name.contains(search))
                    .add(users::Column::Email.contains(search.to_lowercase()))
                    .add(users::Column::EmployeeId.contains(search)),
            );
        }

        let paginator = query.paginate(&self.db, page.limit());
        let total = paginator.num_items().await.map_err(sql_err)?;
        let rows = paginator
            .fetch_page(u64::from(page.page - 1))
            .await
            .map_err(sql_err)?;
        Ok(PageResponse::new(rows, page, total))
    }

    /// Active users whose direct supervisor is `id`.
    pub async fn direct_reports(&self, id: Uuid) -> Result<Vec<users::Model>, AppError> {
        users::Entity::find()
            .filter(users::Column::SupervisorId.eq(id))
            .filter(users::Column::DeletedAt.is_null())
            .order_by_asc(users::Column::Name)
            .all(&self.db)
            .await
            .map_err(sql_err)
    }

    /// Creates a user.
    ///
    /// # Errors
    ///
    /// `Conflict` on a duplicate email or employee id, `NotFound` when the
    /// department or supervisor does not exist.
    pub async fn create(&self, actor: Actor, input: CreateUserInput) -> Result<users::Model, AppError> {
        let email = input.email.trim().to_lowercase();
        let txn = self.db.begin().await.map_err(sql_err)?;

        ensure_unique(&txn, &email, Some(&input.employee_id), None).await?;
        if let Some(department_id) = input.department_id {
            ensure_department(&txn, department_id).await?;
        }
        if let Some(supervisor_id) = input.supervisor_id {
            find_active(&txn, supervisor_id).await?;
        }

        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            employee_id: Set(input.employee_id),
            email: Set(email),
            name: Set(input.name),
            password_hash: Set(input.password_hash),
            role: Set(input.role.into()),
            department_id: Set(input.department_id),
            supervisor_id: Set(input.supervisor_id),
            phone: Set(input.phone),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(Some(actor.user_id), AuditAction::Create, EntityType::User, user.id)
                .with("employee_id", &user.employee_id)
                .with("email", &user.email)
                .with("role", user.role),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(user_id = %user.id, role = ?user.role, "User created");
        Ok(user)
    }

    /// Updates profile fields of an active user.
    pub async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<users::Model, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let user = find_active(&txn, id).await?;

        let email = input.email.map(|e| e.trim().to_lowercase());
        if let Some(email) = &email
            && *email != user.email
        {
            ensure_unique(&txn, email, None, Some(id)).await?;
        }
        if let Some(Some(department_id)) = input.department_id {
            ensure_department(&txn, department_id).await?;
        }

        let before_role = user.role;
        let mut active: users::ActiveModel = user.into();
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(role) = input.role {
            active.role = Set(role.into());
        }
        if let Some(department_id) = input.department_id {
            active.department_id = Set(department_id);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        active.updated_at = Set(Utc::now().into());
        let user = active.update(&txn).await.map_err(sql_err)?;

        let mut entry = AuditEntry::new(Some(actor.user_id), AuditAction::Update, EntityType::User, id)
            .with("email", &user.email)
            .with("department_id", user.department_id);
        if before_role != user.role {
            entry = entry.with_transition(Role::from(before_role), Role::from(user.role));
        }
        write_audit(&txn, entry).await?;
        txn.commit().await.map_err(sql_err)?;

        info!(user_id = %id, "User updated");
        Ok(user)
    }

    /// Sets or clears a user's supervisor.
    ///
    /// # Errors
    ///
    /// `BadRequest` for self-assignment or a cycle, `NotFound` when the
    /// supervisor does not exist or is deleted.
    pub async fn assign_supervisor(
        &self,
        actor: Actor,
        id: Uuid,
        supervisor_id: Option<Uuid>,
    ) -> Result<users::Model, AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let user = find_active(&txn, id).await?;

        if let Err(e) = active_forest(&txn).await?.check_reassignment("supervisor", id, supervisor_id) {
            warn!(user_id = %id, ?supervisor_id, error = %e, "Supervisor assignment rejected");
            return Err(e.into());
        }

        let previous = user.supervisor_id;
        let mut active: users::ActiveModel = user.into();
        active.supervisor_id = Set(supervisor_id);
        active.updated_at = Set(Utc::now().into());
        let user = active.update(&txn).await.map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(
                Some(actor.user_id),
                AuditAction::AssignSupervisor,
                EntityType::User,
                id,
            )
            .with("from", previous)
            .with("to", supervisor_id),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(user_id = %id, ?supervisor_id, "Supervisor assigned");
        Ok(user)
    }

    /// Soft-deletes a user.
    ///
    /// # Errors
    ///
    /// `BadRequest` while active users still report to them or they hold
    /// pending approvals on documents in review.
    pub async fn soft_delete(&self, actor: Actor, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await.map_err(sql_err)?;
        let user = find_active(&txn, id).await?;

        let reports = users::Entity::find()
            .filter(users::Column::SupervisorId.eq(id))
            .filter(users::Column::DeletedAt.is_null())
            .count(&txn)
            .await
            .map_err(sql_err)?;
        ensure_no_dependents("user", "direct reports", reports)?;
        let held = pending_held_by(&txn, id).await?;
        ensure_no_dependents("user", "pending approvals", held)?;

        let email = user.email.clone();
        let mut active: users::ActiveModel = user.into();
        let now = Utc::now().into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(&txn).await.map_err(sql_err)?;

        write_audit(
            &txn,
            AuditEntry::new(Some(actor.user_id), AuditAction::Delete, EntityType::User, id)
                .with("email", email),
        )
        .await?;
        txn.commit().await.map_err(sql_err)?;

        info!(user_id = %id, "User soft-deleted");
        Ok(())
    }
}

/// Every active user with their supervisor.
pub(crate) async fn active_forest<C: ConnectionTrait>(conn: &C) -> Result<Forest, AppError> {
    let rows: Vec<(Uuid, Option<Uuid>)> = users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::SupervisorId)
        .filter(users::Column::DeletedAt.is_null())
        .into_tuple()
        .all(conn)
        .await
        .map_err(sql_err)?;
    Ok(rows.into_iter().collect())
}

pub(crate) async fn find_active<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<users::Model, AppError> {
    users::Entity::find_by_id(id)
        .filter(users::Column::DeletedAt.is_null())
        .one(conn)
        .await
        .map_err(sql_err)?
        .ok_or_else(|| not_found("User", id))
}

async fn ensure_unique<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    employee_id: Option<&str>,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    let mut cond = Condition::any().add(users::Column::Email.eq(email));
    if let Some(employee_id) = employee_id {
        cond = cond.add(users::Column::EmployeeId.eq(employee_id));
    }
    let mut query = users::Entity::find().filter(cond);
    if let Some(except) = except {
        query = query.filter(users::Column::Id.ne(except));
    }

    if let Some(existing) = query.one(conn).await.map_err(sql_err)? {
        let field = if existing.email == email { "email" } else { "employee id" };
        return Err(AppError::Conflict(format!("A user with this {field} already exists")));
    }
    Ok(())
}

async fn ensure_department<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<(), AppError> {
    departments::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(sql_err)?
        .map(|_| ())
        .ok_or_else(|| not_found("Department", id))
}
