//! End-to-end tests of the HTTP surface against an in-memory database.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{DateTime, FixedOffset, Utc};
use http_body_util::BodyExt;
use rstest::rstest;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;
use wayfare_api::{AppState, create_router};
use wayfare_core::access::Role;
use wayfare_core::auth::hash_password;
use wayfare_db::entities::users;
use wayfare_db::migration::{Migrator, MigratorTrait};
use wayfare_shared::config::AuthSettings;
use wayfare_shared::{JwtConfig, JwtService, LogSender};

const SERVICE_TOKEN: &str = "svc-0123456789";
const PASSWORD: &str = "Travel2026";

struct TestApp {
    router: Router,
    state: AppState,
}

struct Staff {
    director: Uuid,
    manager: Uuid,
    supervisor: Uuid,
    employee: Uuid,
    admin: Uuid,
}

impl TestApp {
    async fn spawn() -> (Self, Staff) {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let director = insert_user(&db, "director", Role::Director, None).await;
        let manager = insert_user(&db, "manager", Role::Manager, Some(director)).await;
        let supervisor = insert_user(&db, "supervisor", Role::Supervisor, Some(manager)).await;
        let employee = insert_user(&db, "employee", Role::Employee, Some(supervisor)).await;
        let admin = insert_user(&db, "admin", Role::Admin, None).await;

        let jwt = JwtService::new(JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expires_minutes: 60,
        });
        let auth = AuthSettings {
            service_token: Some(SERVICE_TOKEN.to_string()),
            service_user_id: Some(admin),
        };
        let state = AppState::new(db, jwt, Arc::new(LogSender), auth, 10 * 1024 * 1024);
        let app = Self {
            router: create_router(state.clone()),
            state,
        };
        (
            app,
            Staff {
                director,
                manager,
                supervisor,
                employee,
                admin,
            },
        )
    }

    fn token(&self, user_id: Uuid, role: Role) -> String {
        self.state
            .jwt_service
            .generate_access_token(user_id, role.as_str())
            .unwrap()
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

async fn insert_user(
    db: &DatabaseConnection,
    key: &str,
    role: Role,
    supervisor_id: Option<Uuid>,
) -> Uuid {
    let id = Uuid::now_v7();
    let now: DateTime<FixedOffset> = Utc::now().into();
    users::ActiveModel {
        id: Set(id),
        employee_id: Set(format!("EMP-{key}")),
        email: Set(format!("{key}@wayfare.test")),
        name: Set(key.to_string()),
        password_hash: Set(hash_password(PASSWORD).unwrap()),
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
    .unwrap();
    id
}

fn trip() -> Value {
    json!({
        "purpose": "Customer visit and quarterly review",
        "destination": "Surabaya",
        "travel_type": "DOMESTIC",
        "start_date": "2026-03-10",
        "end_date": "2026-03-12",
        "estimated_budget": "4500.00"
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = TestApp::spawn().await;
    let (status, body) = app.call("GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_login_sets_cookie_and_cookie_authenticates() {
    let (app, staff) = TestApp::spawn().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "Employee@Wayfare.test", "password": PASSWORD}).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("wayfare_session="));
    assert!(cookie.contains("HttpOnly"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["user"]["id"], staff.employee.to_string());
    assert_eq!(body["user"]["role"], "EMPLOYEE");
    assert_eq!(body["expires_in"], 3600);

    let session = cookie.split(';').next().unwrap().to_string();
    let request = Request::builder()
        .uri("/api/v1/auth/me")
        .header(header::COOKIE, session)
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let (app, _) = TestApp::spawn().await;
    let (status, body) = app
        .call(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "employee@wayfare.test", "password": "wrong-password1"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_protected_routes_need_a_session() {
    let (app, _) = TestApp::spawn().await;

    let (status, body) = app.call("GET", "/api/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = app
        .call("GET", "/api/v1/auth/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_service_token_acts_as_admin() {
    let (app, staff) = TestApp::spawn().await;

    let (status, body) = app
        .call("GET", "/api/v1/auth/me", Some(SERVICE_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], staff.admin.to_string());

    let (status, _) = app
        .call("GET", "/api/v1/audit-logs", Some(SERVICE_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[rstest]
#[case::employee(Role::Employee, StatusCode::FORBIDDEN)]
#[case::supervisor(Role::Supervisor, StatusCode::FORBIDDEN)]
#[case::finance(Role::Finance, StatusCode::FORBIDDEN)]
#[case::manager(Role::Manager, StatusCode::OK)]
#[case::director(Role::Director, StatusCode::OK)]
#[tokio::test]
async fn test_overview_requires_manager_tier(#[case] role: Role, #[case] expected: StatusCode) {
    let (app, _) = TestApp::spawn().await;
    let viewer = insert_user(&app.state.db, &format!("viewer-{role}"), role, None).await;
    let token = app.token(viewer, role);
    let (status, _) = app
        .call(
            "GET",
            "/api/v1/dashboard/overview?from=2026-01-01&to=2026-03-31",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, expected);
}

#[tokio::test]
async fn test_user_admin_flow() {
    let (app, staff) = TestApp::spawn().await;
    let admin = app.token(staff.admin, Role::Admin);
    let employee = app.token(staff.employee, Role::Employee);

    let new_user = json!({
        "employee_id": "EMP-0042",
        "email": "rina@wayfare.test",
        "name": "Rina",
        "password": "Welcome2026",
        "role": "SALES_EMPLOYEE",
        "supervisor_id": staff.manager,
    });

    let (status, body) = app
        .call("POST", "/api/v1/users", Some(&employee), Some(new_user.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let mut weak = new_user.clone();
    weak["password"] = json!("lettersonly");
    let (status, _) = app
        .call("POST", "/api/v1/users", Some(&admin), Some(weak))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_email = new_user.clone();
    bad_email["email"] = json!("not-an-email");
    let (status, body) = app
        .call("POST", "/api/v1/users", Some(&admin), Some(bad_email))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("email"));

    let (status, body) = app
        .call("POST", "/api/v1/users", Some(&admin), Some(new_user.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "SALES_EMPLOYEE");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app
        .call("POST", "/api/v1/users", Some(&admin), Some(new_user))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");

    let uri = format!("/api/v1/users/{}/reports", staff.manager);
    let (status, body) = app.call("GET", &uri, Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let uri = format!("/api/v1/users/{}/supervisor", staff.director);
    let (status, body) = app
        .call(
            "PUT",
            &uri,
            Some(&admin),
            Some(json!({"supervisor_id": staff.employee})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_travel_request_walks_the_chain_over_http() {
    let (app, staff) = TestApp::spawn().await;
    let employee = app.token(staff.employee, Role::Employee);

    let (status, created) = app
        .call("POST", "/api/v1/travel-requests", Some(&employee), Some(trip()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "DRAFT");
    let id = created["id"].as_str().unwrap().to_string();
    assert!(created["request_number"].as_str().unwrap().starts_with("TR-"));

    let (status, submitted) = app
        .call(
            "POST",
            &format!("/api/v1/travel-requests/{id}/submit"),
            Some(&employee),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "SUBMITTED");

    let (status, chain) = app
        .call(
            "GET",
            &format!("/api/v1/approvals/chain/travel-request/{id}"),
            Some(&employee),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chain["steps"].as_array().unwrap().len(), 3);

    // The manager cannot act before the supervisor.
    let manager = app.token(staff.manager, Role::Manager);
    let (_, pending) = app
        .call("GET", "/api/v1/approvals/pending", Some(&manager), None)
        .await;
    assert!(pending.as_array().unwrap().is_empty());

    let mut last = Value::Null;
    for (user, role) in [
        (staff.supervisor, Role::Supervisor),
        (staff.manager, Role::Manager),
        (staff.director, Role::Director),
    ] {
        let token = app.token(user, role);
        let (status, pending) = app
            .call("GET", "/api/v1/approvals/pending", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let rows = pending.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        let approval_id = rows[0]["approval"]["id"].as_str().unwrap().to_string();

        // The director approves without a body.
        let body = (role != Role::Director).then(|| json!({"comments": "Looks fine"}));
        let (status, decision) = app
            .call(
                "POST",
                &format!("/api/v1/approvals/{approval_id}/approve"),
                Some(&token),
                body,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        last = decision;
    }
    assert_eq!(last["document_status"], "APPROVED");
    assert_eq!(last["chain_completed"], true);

    let (status, body) = app
        .call(
            "POST",
            "/api/v1/claims",
            Some(&employee),
            Some(json!({
                "travel_request_id": id,
                "date": "2026-03-11",
                "amount": "350.00",
                "description": "Dinner with the customer",
                "details": {
                    "claim_type": "ENTERTAINMENT",
                    "entertainment_type": "MEAL",
                    "guest_name": "Budi",
                    "guest_company": "PT Maju",
                    "location": "Surabaya"
                }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["details"]["claim_type"], "ENTERTAINMENT");
    assert!(body["claim_number"].as_str().unwrap().starts_with("CL-"));

    let (status, body) = app
        .call("GET", "/api/v1/notifications/unread-count", Some(&employee), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_rule_violations_map_to_json_errors() {
    let (app, staff) = TestApp::spawn().await;
    let employee = app.token(staff.employee, Role::Employee);

    let mut inverted = trip();
    inverted["end_date"] = json!("2026-03-01");
    let (status, body) = app
        .call("POST", "/api/v1/travel-requests", Some(&employee), Some(inverted))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let (status, body) = app
        .call(
            "GET",
            &format!("/api/v1/travel-requests/{}", Uuid::now_v7()),
            Some(&employee),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, _) = app
        .call(
            "GET",
            &format!("/api/v1/approvals/chain/invoice/{}", Uuid::now_v7()),
            Some(&employee),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            "POST",
            "/api/v1/travel-requests",
            Some(&employee),
            Some(json!({"purpose": "missing fields"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let supervisor = app.token(staff.supervisor, Role::Supervisor);
    let (_, created) = app
        .call("POST", "/api/v1/travel-requests", Some(&employee), Some(trip()))
        .await;
    let id = created["id"].as_str().unwrap();
    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/v1/travel-requests/{id}"),
            Some(&supervisor),
            Some(json!({"destination": "Bali"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_audit_history_needs_finance_tier() {
    let (app, staff) = TestApp::spawn().await;
    let employee = app.token(staff.employee, Role::Employee);
    let finance_id = insert_user(&app.state.db, "finance", Role::Finance, None).await;
    let finance = app.token(finance_id, Role::Finance);

    let (_, created) = app
        .call("POST", "/api/v1/travel-requests", Some(&employee), Some(trip()))
        .await;
    let uri = format!("/api/v1/audit-logs/travel-request/{}", created["id"].as_str().unwrap());

    let (status, _) = app.call("GET", &uri, Some(&employee), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.call("GET", &uri, Some(&finance), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "CREATE");

    let (status, _) = app.call("GET", "/api/v1/audit-logs", Some(&finance), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleted_user_token_is_refused() {
    let (app, staff) = TestApp::spawn().await;
    let admin = app.token(staff.admin, Role::Admin);
    let leaver = insert_user(&app.state.db, "leaver", Role::Employee, Some(staff.supervisor)).await;
    let token = app.token(leaver, Role::Employee);

    let (status, _) = app.call("GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call("DELETE", &format!("/api/v1/users/{leaver}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.call("GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_stored_role_overrides_the_token_claim() {
    let (app, staff) = TestApp::spawn().await;
    let inflated = app.token(staff.employee, Role::Manager);

    let (status, _) = app
        .call(
            "GET",
            "/api/v1/dashboard/overview?from=2026-01-01&to=2026-03-31",
            Some(&inflated),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_approve_accepts_a_missing_body_but_not_a_bad_one() {
    let (app, staff) = TestApp::spawn().await;
    let employee = app.token(staff.employee, Role::Employee);
    let supervisor = app.token(staff.supervisor, Role::Supervisor);

    let (_, created) = app
        .call("POST", "/api/v1/travel-requests", Some(&employee), Some(trip()))
        .await;
    let id = created["id"].as_str().unwrap().to_string();
    app.call(
        "POST",
        &format!("/api/v1/travel-requests/{id}/submit"),
        Some(&employee),
        None,
    )
    .await;

    let (_, pending) = app
        .call("GET", "/api/v1/approvals/pending", Some(&supervisor), None)
        .await;
    let approval_id = pending[0]["approval"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/approvals/{approval_id}/approve");

    let too_long = json!({"comments": "x".repeat(2001)});
    let (status, _) = app.call("POST", &uri, Some(&supervisor), Some(too_long)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, decision) = app.call("POST", &uri, Some(&supervisor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decision["document_status"], "APPROVED_L1");
}
