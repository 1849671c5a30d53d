//! API tests against the in-memory store

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use radiodesk_server::{
    config::{AppConfig, AuthConfig, StorageBackend, StorageConfig},
    create_router,
    models::operator::OperatorClaims,
    repository::Repository,
    AppState,
};

const SECRET: &str = "api-test-secret";

fn app() -> Router {
    let config = AppConfig {
        server: Default::default(),
        database: Default::default(),
        auth: AuthConfig {
            jwt_secret: SECRET.to_string(),
            audience: None,
        },
        logging: Default::default(),
        storage: StorageConfig {
            backend: StorageBackend::Memory,
        },
        roster: Default::default(),
    };
    create_router(AppState::new(config, Repository::in_memory()))
}

fn token(role: Option<&str>) -> String {
    OperatorClaims {
        sub: Uuid::new_v4(),
        email: Some("desk@example.org".to_string()),
        role: role.map(str::to_string),
        exp: Utc::now().timestamp() + 3600,
        iat: None,
    }
    .create_token(SECRET)
    .unwrap()
}

/// Send a request and decode the JSON response (Null for empty bodies)
async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn enroll(app: &Router, admin: &str, name: &str, tax_id: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/roster",
        Some(admin),
        Some(json!({ "name": name, "tax_id": tax_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_missing_or_invalid_token_is_unauthorized() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/api/v1/equipment", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, "/api/v1/equipment", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_operator_cannot_change_configuration() {
    let app = app();
    let operator = token(Some("operator"));
    let unknown_role = token(Some("superuser"));
    let no_role = token(None);

    for t in [&operator, &unknown_role, &no_role] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/equipment",
            Some(t),
            Some(json!({ "tag": "RD-1", "kind": "radio" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, _) = send(&app, Method::GET, "/api/v1/equipment", Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_merchandise_last_unit() {
    let app = app();
    let admin = token(Some("admin"));
    let operator = token(None);

    let (status, item) = send(
        &app,
        Method::POST,
        "/api/v1/merchandise",
        Some(&admin),
        Some(json!({ "name": "Finisher medal", "stock": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = item["id"].as_str().unwrap().to_string();
    let first = enroll(&app, &admin, "Ana Souza", "111").await;
    let second = enroll(&app, &admin, "Bruno Lima", "222").await;
    let deliveries = format!("/api/v1/merchandise/{}/deliveries", item_id);

    let (status, receipt) = send(
        &app,
        Method::POST,
        &deliveries,
        Some(&operator),
        Some(json!({ "person_id": first })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["person_id"], first.as_str());

    let item_uri = format!("/api/v1/merchandise/{}", item_id);
    let (_, item) = send(&app, Method::GET, &item_uri, Some(&operator), None).await;
    assert_eq!(item["stock"], 0);

    let first_status = format!("{}/{}", deliveries, first);
    let (status, check) = send(&app, Method::GET, &first_status, Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["delivered_at"], receipt["delivered_at"]);

    let (status, body) = send(
        &app,
        Method::POST,
        &deliveries,
        Some(&operator),
        Some(json!({ "person_id": second })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "InsufficientStock");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("{}/{}", deliveries, first),
        Some(&operator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, item) = send(&app, Method::GET, &item_uri, Some(&operator), None).await;
    assert_eq!(item["stock"], 1);

    let (status, check) = send(&app, Method::GET, &first_status, Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(check["delivered_at"].is_null());

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("{}/{}", deliveries, first),
        Some(&operator),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoDeliveryFound");
}

#[tokio::test]
async fn test_partial_then_complete_return() {
    let app = app();
    let admin = token(Some("admin"));
    let operator = token(None);

    let (_, equipment) = send(
        &app,
        Method::POST,
        "/api/v1/equipment",
        Some(&admin),
        Some(json!({ "tag": "RD-042", "kind": "radio" })),
    )
    .await;
    let today = Utc::now().date_naive();
    let (_, event) = send(
        &app,
        Method::POST,
        "/api/v1/events",
        Some(&admin),
        Some(json!({ "name": "City run", "start_date": today, "end_date": today })),
    )
    .await;

    let (status, rental) = send(
        &app,
        Method::POST,
        "/api/v1/rentals",
        Some(&operator),
        Some(json!({
            "equipment_id": equipment["id"],
            "event_id": event["id"],
            "responsible_name": "Carla",
            "expected_return_date": Utc::now() + Duration::hours(6),
            "accessories": { "antenna": true, "clip": true },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rental["display_status"], "active");
    let return_uri = format!("/api/v1/rentals/{}/return", rental["id"].as_str().unwrap());

    // Same radio cannot go out twice
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/rentals",
        Some(&operator),
        Some(json!({
            "equipment_id": equipment["id"],
            "event_id": event["id"],
            "responsible_name": "Diego",
            "expected_return_date": Utc::now() + Duration::hours(6),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, partial) = send(
        &app,
        Method::POST,
        &return_uri,
        Some(&operator),
        Some(json!({ "returned_accessories": { "antenna": true } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(partial["status"], "partial");
    assert_eq!(partial["missing_accessories"], json!(["clip"]));

    let (_, done) = send(
        &app,
        Method::POST,
        &return_uri,
        Some(&operator),
        Some(json!({ "returned_accessories": { "clip": true } })),
    )
    .await;
    assert_eq!(done["status"], "completed");
    assert!(done["returned_at"].is_string());

    let (status, body) = send(&app, Method::POST, &return_uri, Some(&operator), Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "RentalClosed");
}

#[tokio::test]
async fn test_overdue_count_tracks_open_late_rentals() {
    let app = app();
    let admin = token(Some("admin"));
    let operator = token(None);
    let today = Utc::now().date_naive();
    let (_, event) = send(
        &app,
        Method::POST,
        "/api/v1/events",
        Some(&admin),
        Some(json!({ "name": "Night ride", "start_date": today, "end_date": today })),
    )
    .await;

    let mut late = Vec::new();
    for (tag, hours_left) in [("RD-1", -1), ("RD-2", -2), ("RD-3", 3)] {
        let (_, equipment) = send(
            &app,
            Method::POST,
            "/api/v1/equipment",
            Some(&admin),
            Some(json!({ "tag": tag, "kind": "radio" })),
        )
        .await;
        let (status, rental) = send(
            &app,
            Method::POST,
            "/api/v1/rentals",
            Some(&operator),
            Some(json!({
                "equipment_id": equipment["id"],
                "event_id": event["id"],
                "responsible_name": "Eva",
                "start_date": Utc::now() - Duration::hours(5),
                "expected_return_date": Utc::now() + Duration::hours(hours_left),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        if hours_left < 0 {
            late.push(rental["id"].as_str().unwrap().to_string());
        }
    }

    let (status, count) = send(&app, Method::GET, "/api/v1/rentals/overdue-count", Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["overdue"], 2);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/rentals/{}/return", late[0]),
        Some(&operator),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, count) = send(&app, Method::GET, "/api/v1/rentals/overdue-count", Some(&operator), None).await;
    assert_eq!(count["overdue"], 1);
}

#[tokio::test]
async fn test_roster_import_preview_and_confirm() {
    let app = app();
    let admin = token(Some("admin"));
    enroll(&app, &admin, "Already Here", "33333333333").await;

    let boundary = "radiodesk-test-boundary";
    let csv = "nome;cpf;email\nAna;111.111.111-11;ana@example.org\nBruno;222.222.222-22;\nAlready Here;333.333.333-33;\n";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"inscritos.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{b}--\r\n",
        b = boundary,
        csv = csv
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/roster/import/preview")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let preview: Value = serde_json::from_slice(&bytes).unwrap();

    let rows = preview["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(preview["skipped"], json!([{ "line": 1, "reason": "header row" }]));
    let duplicate = rows.iter().find(|r| r["tax_id"] == "33333333333").unwrap();
    assert_eq!(duplicate["duplicate"], true);
    assert_eq!(duplicate["selected"], false);

    let records: Vec<Value> = rows
        .iter()
        .filter(|r| r["selected"] == true)
        .map(|r| {
            json!({
                "name": r["name"],
                "tax_id": r["tax_id"],
                "email": r["email"],
                "phone": r["phone"],
                "enrollment_number": r["enrollment_number"],
            })
        })
        .collect();
    let (status, result) = send(
        &app,
        Method::POST,
        "/api/v1/roster/import",
        Some(&admin),
        Some(json!({ "records": records })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["inserted"], 2);

    let (_, search) = send(
        &app,
        Method::GET,
        "/api/v1/roster?q=ana&seq=4",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(search["seq"], 4);
    assert_eq!(search["people"][0]["tax_id"], "11111111111");
}
