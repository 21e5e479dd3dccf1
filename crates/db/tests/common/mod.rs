//! Shared fixtures for the repository integration tests.
//!
//! Every test gets its own in-memory `SQLite` database with the full schema.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;
use wayfare_core::access::{Actor, Role};
use wayfare_core::travel::TravelType;
use wayfare_db::entities::{travel_requests, users};
use wayfare_db::migration::{Migrator, MigratorTrait};
use wayfare_db::repositories::{CreateTravelRequestInput, Notifier};
use wayfare_shared::{DeliveryError, NotificationSender, OutboundMessage};

/// Fresh database with migrations applied.
pub async fn setup_db() -> DatabaseConnection {
    // One connection: each in-memory SQLite connection is its own database.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect");
    Migrator::up(&db, None).await.expect("migrate");
    db
}

/// Sender that keeps every message it is handed.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingSender {
    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.subject.clone())
            .collect()
    }

    pub fn sent_to(&self, email: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.to_email == email)
            .count()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "recording"
    }
}

/// Sender whose transport is always down.
#[derive(Debug, Default)]
pub struct FailingSender;

#[async_trait]
impl NotificationSender for FailingSender {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        Err(DeliveryError::SendError(format!(
            "connection refused for {}",
            message.to_email
        )))
    }

    fn channel(&self) -> &'static str {
        "failing"
    }
}

pub fn failing_notifier(db: &DatabaseConnection) -> Notifier {
    Notifier::new(db.clone(), Arc::new(FailingSender))
}

pub fn notifier(db: &DatabaseConnection) -> (Notifier, Arc<RecordingSender>) {
    let sender = Arc::new(RecordingSender::default());
    (Notifier::new(db.clone(), sender.clone()), sender)
}

/// Inserts an active user directly.
pub async fn insert_user(
    db: &DatabaseConnection,
    key: &str,
    role: Role,
    supervisor_id: Option<Uuid>,
) -> Actor {
    let id = Uuid::now_v7();
    let now = Utc::now().into();
    users::ActiveModel {
        id: Set(id),
        employee_id: Set(format!("EMP-{key}")),
        email: Set(email(key)),
        name: Set(key.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        role: Set(role.into()),
        department_id: Set(None),
        supervisor_id: Set(supervisor_id),
        phone: Set(None),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("insert user");
    Actor::new(id, role)
}

pub fn email(key: &str) -> String {
    format!("{key}@wayfare.test")
}

/// A small org: employee → supervisor → manager → director, plus sales,
/// finance and admin staff.
pub struct Org {
    pub director: Actor,
    pub manager: Actor,
    pub supervisor: Actor,
    pub employee: Actor,
    pub chief: Actor,
    pub sales: Actor,
    pub finance: Actor,
    pub admin: Actor,
}

impl Org {
    pub async fn seed(db: &DatabaseConnection) -> Self {
        let director = insert_user(db, "director", Role::Director, None).await;
        let manager = insert_user(db, "manager", Role::Manager, Some(director.user_id)).await;
        let supervisor =
            insert_user(db, "supervisor", Role::Supervisor, Some(manager.user_id)).await;
        let employee = insert_user(db, "employee", Role::Employee, Some(supervisor.user_id)).await;
        let chief = insert_user(db, "chief", Role::SalesChief, Some(director.user_id)).await;
        let sales = insert_user(db, "sales", Role::SalesEmployee, Some(chief.user_id)).await;
        let finance = insert_user(db, "finance", Role::Finance, Some(director.user_id)).await;
        let admin = insert_user(db, "admin", Role::Admin, None).await;
        Self {
            director,
            manager,
            supervisor,
            employee,
            chief,
            sales,
            finance,
            admin,
        }
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn trip() -> CreateTravelRequestInput {
    CreateTravelRequestInput {
        purpose: "Customer visit and quarterly review".to_string(),
        destination: "Surabaya".to_string(),
        travel_type: TravelType::Domestic,
        start_date: date("2026-03-10"),
        end_date: date("2026-03-12"),
        estimated_budget: Decimal::new(450_000, 2),
        project_code: Some("PRJ-7".to_string()),
    }
}

/// Forces a travel request into a status without running its chain.
pub async fn force_request_status(
    db: &DatabaseConnection,
    request: travel_requests::Model,
    status: wayfare_core::document::DocumentStatus,
) {
    let mut active: travel_requests::ActiveModel = request.into();
    active.status = Set(status.into());
    active.update(db).await.expect("force status");
}
