//! Database seeder for Wayfare development and testing.
//!
//! Seeds departments, a small reporting line covering every role, and a
//! chart of accounts for expense coding. Rows use fixed ids so the seeder
//! can run repeatedly.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;
use wayfare_core::auth::hash_password;
use wayfare_db::entities::{
    chart_of_accounts, departments,
    sea_orm_active_enums::{AccountType, UserRole},
    users,
};
use wayfare_shared::config::DatabaseConfig;

/// Password shared by every seeded user.
const SEED_PASSWORD: &str = "Wayfare2026";

const DEPT_SALES: Uuid = Uuid::from_u128(0x0100);
const DEPT_OPERATIONS: Uuid = Uuid::from_u128(0x0101);
const DEPT_FINANCE: Uuid = Uuid::from_u128(0x0102);

/// (id, parent, code, name)
const DEPARTMENTS: [(Uuid, Option<Uuid>, &str, &str); 3] = [
    (DEPT_OPERATIONS, None, "OPS", "Operations"),
    (DEPT_SALES, Some(DEPT_OPERATIONS), "SLS", "Sales"),
    (DEPT_FINANCE, None, "FIN", "Finance"),
];

/// (id, employee id, email, name, role, department, supervisor)
type SeedUser = (u128, &'static str, &'static str, &'static str, UserRole, Uuid, Option<u128>);

// Supervisors come before their reports.
const USERS: [SeedUser; 8] = [
    (0x0200, "EMP-0001", "director@wayfare.dev", "Dewi Director", UserRole::Director, DEPT_OPERATIONS, None),
    (0x0201, "EMP-0002", "manager@wayfare.dev", "Made Manager", UserRole::Manager, DEPT_OPERATIONS, Some(0x0200)),
    (0x0202, "EMP-0003", "supervisor@wayfare.dev", "Sari Supervisor", UserRole::Supervisor, DEPT_OPERATIONS, Some(0x0201)),
    (0x0203, "EMP-0004", "employee@wayfare.dev", "Eko Employee", UserRole::Employee, DEPT_OPERATIONS, Some(0x0202)),
    (0x0204, "EMP-0005", "chief@wayfare.dev", "Citra Chief", UserRole::SalesChief, DEPT_SALES, Some(0x0200)),
    (0x0205, "EMP-0006", "sales@wayfare.dev", "Sandi Sales", UserRole::SalesEmployee, DEPT_SALES, Some(0x0204)),
    (0x0206, "EMP-0007", "finance@wayfare.dev", "Fajar Finance", UserRole::Finance, DEPT_FINANCE, Some(0x0200)),
    (0x0207, "EMP-0008", "admin@wayfare.dev", "Ayu Admin", UserRole::Admin, DEPT_FINANCE, None),
];

/// (id, parent, code, name, type)
const ACCOUNTS: [(u128, Option<u128>, &str, &str, AccountType); 9] = [
    (0x0300, None, "6000", "Travel Expenses", AccountType::Expense),
    (0x0301, Some(0x0300), "6100", "Transportation", AccountType::Expense),
    (0x0302, Some(0x0300), "6200", "Accommodation", AccountType::Expense),
    (0x0303, Some(0x0300), "6300", "Meals and Per Diem", AccountType::Expense),
    (0x0304, None, "6500", "Entertainment", AccountType::Expense),
    (0x0305, Some(0x0304), "6510", "Client Meals", AccountType::Expense),
    (0x0306, Some(0x0304), "6520", "Client Gifts", AccountType::Expense),
    (0x0307, None, "1400", "Employee Advances", AccountType::Asset),
    (0x0308, None, "2100", "Reimbursements Payable", AccountType::Liability),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = wayfare_db::connect(&DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
    })
    .await
    .context("Failed to connect to database")?;

    println!("Seeding departments...");
    seed_departments(&db).await;

    println!("Seeding users...");
    seed_users(&db).await?;

    println!("Seeding chart of accounts...");
    seed_accounts(&db).await;

    println!("Seeding complete! Every user signs in with password {SEED_PASSWORD}");
    Ok(())
}

async fn seed_departments(db: &DatabaseConnection) {
    for (id, parent_id, code, name) in DEPARTMENTS {
        if departments::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  Department {code} already exists, skipping...");
            continue;
        }

        let department = departments::ActiveModel {
            id: Set(id),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            description: Set(None),
            parent_id: Set(parent_id),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };

        if let Err(e) = department.insert(db).await {
            eprintln!("Failed to insert department {code}: {e}");
        } else {
            println!("  Created department: {name}");
        }
    }
}

async fn seed_users(db: &DatabaseConnection) -> anyhow::Result<()> {
    let password_hash = hash_password(SEED_PASSWORD).context("Failed to hash seed password")?;

    for (id, employee_id, email, name, role, department_id, supervisor) in USERS {
        let id = Uuid::from_u128(id);
        if users::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            println!("  User {email} already exists, skipping...");
            continue;
        }

        let user = users::ActiveModel {
            id: Set(id),
            employee_id: Set(employee_id.to_string()),
            email: Set(email.to_string()),
            name: Set(name.to_string()),
            password_hash: Set(password_hash.clone()),
            role: Set(role),
            department_id: Set(Some(department_id)),
            supervisor_id: Set(supervisor.map(Uuid::from_u128)),
            phone: Set(None),
            deleted_at: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };

        if let Err(e) = user.insert(db).await {
            eprintln!("Failed to insert user {email}: {e}");
        } else {
            println!("  Created {role:?} user: {email}");
        }
    }
    Ok(())
}

async fn seed_accounts(db: &DatabaseConnection) {
    let mut inserted = 0;

    for (id, parent, code, name, account_type) in ACCOUNTS {
        let id = Uuid::from_u128(id);
        if chart_of_accounts::Entity::find_by_id(id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some()
        {
            continue;
        }

        let account = chart_of_accounts::ActiveModel {
            id: Set(id),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            account_type: Set(account_type),
            parent_id: Set(parent.map(Uuid::from_u128)),
            description: Set(None),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };

        if let Err(e) = account.insert(db).await {
            eprintln!("Failed to insert account {code}: {e}");
        } else {
            inserted += 1;
        }
    }

    println!("  Inserted {inserted} accounts");
}
