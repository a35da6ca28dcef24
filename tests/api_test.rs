//! HTTP API integration tests: sign-in flow, role gating, and the table
//! endpoints end to end over the router.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use trustlock::store::MemoryStore;
use trustlock::{Role, ServerConfig, TrustLockServer};

fn seed_root() -> Value {
    let mut sessions = serde_json::Map::new();
    for i in 0..25 {
        sessions.insert(
            format!("user{i:02}"),
            json!({
                "status": i % 2 == 0,
                "loginTime": "1/2/2026, 9:00:00 AM",
                "logoutTime": "null",
            }),
        );
    }

    json!({
        "component_1": Value::Object(sessions),
        "component_2": {
            "carol": {"ip_address": true, "request": false},
            "dave": {"ip_address": false, "request": false},
        },
        "component_4": {
            "malicious": false,
            "summary": "Nothing unusual",
            "steps": {
                "risk_evaluation": {"query": "Overall?", "answer": "Low"}
            }
        },
    })
}

async fn test_app() -> (Router, Arc<MemoryStore>) {
    let config = ServerConfig {
        jwt_secret: "test-secret-at-least-32-characters-long".to_string(),
        ..ServerConfig::default()
    };
    let store = Arc::new(MemoryStore::with_root(seed_root()));
    let server = TrustLockServer::new(config, store.clone()).await.unwrap();

    server
        .auth()
        .register("admin@trustlock.io", "Admin", "s3cure-pass!", Role::Admin)
        .unwrap();
    server
        .auth()
        .register("viewer@trustlock.io", "Viewer", "s3cure-pass!", Role::User)
        .unwrap();

    (server.build_router(), store)
}

/// Sign in and return the access-token cookie pair (`name=value`).
async fn sign_in(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"email": email, "password": "s3cure-pass!"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|c| c.starts_with("trustlock_token="))
        .and_then(|c| c.split(';').next())
        .map(str::to_string)
        .expect("login response must set the auth cookie")
}

async fn get_json(app: &Router, uri: &str, cookie: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn login_sets_cookie_and_me_reports_role() {
    let (app, _) = test_app().await;
    let cookie = sign_in(&app, "admin@trustlock.io").await;

    let (status, me) = get_json(&app, "/api/auth/me", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "admin@trustlock.io");
    assert_eq!(me["role"], "admin");
}

#[tokio::test]
async fn login_failures_use_fixed_messages() {
    let (app, _) = test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"email": "ghost@trustlock.io", "password": "whatever1!"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "No user found with this email.");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"email": "admin@trustlock.io", "password": "wrong-pass-1!"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "Incorrect password. Please try again.");
}

#[tokio::test]
async fn weak_password_rejected_on_register() {
    let (app, _) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"email": "new@trustlock.io", "password": "weakpass"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json["message"],
        "Password must contain at least 8 characters, a number, and a special character."
    );
}

#[tokio::test]
async fn sessions_table_paginates_and_summarizes() {
    let (app, _) = test_app().await;
    let cookie = sign_in(&app, "viewer@trustlock.io").await;

    let (status, page1) = get_json(&app, "/api/sessions", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page1["rows"].as_array().unwrap().len(), 12);
    assert_eq!(page1["total_pages"], 3);
    assert_eq!(page1["controls"]["show"], true);
    assert_eq!(page1["controls"]["can_prev"], false);
    assert_eq!(page1["summary"]["healthy"], 13);
    assert_eq!(page1["summary"]["danger"], 12);

    let (_, page3) = get_json(&app, "/api/sessions?page=3", &cookie).await;
    assert_eq!(page3["rows"].as_array().unwrap().len(), 1);
    assert_eq!(page3["controls"]["can_next"], false);

    // Out-of-range pages clamp rather than 404
    let (_, clamped) = get_json(&app, "/api/sessions?page=99", &cookie).await;
    assert_eq!(clamped["page"], 3);
}

#[tokio::test]
async fn sessions_filter_and_search() {
    let (app, _) = test_app().await;
    let cookie = sign_in(&app, "viewer@trustlock.io").await;

    let (_, danger) = get_json(&app, "/api/sessions?status=Danger", &cookie).await;
    for row in danger["rows"].as_array().unwrap() {
        assert_eq!(row["status"], "Danger");
    }
    // Filtering never shrinks the chart summary
    assert_eq!(danger["summary"]["healthy"], 13);

    // An unrecognized filter value falls back to All
    let (_, all) = get_json(&app, "/api/sessions?status=danger", &cookie).await;
    assert_eq!(all["summary"]["healthy"], 13);
    assert_eq!(all["total_pages"], 3);

    let (_, searched) = get_json(&app, "/api/sessions?search=user01", &cookie).await;
    assert_eq!(searched["rows"].as_array().unwrap().len(), 1);
    assert_eq!(searched["warning_triggered"], false);

    // Angle brackets are stripped and flagged
    let (_, flagged) = get_json(&app, "/api/sessions?search=%3Cuser01%3E", &cookie).await;
    assert_eq!(flagged["rows"].as_array().unwrap().len(), 1);
    assert_eq!(flagged["warning_triggered"], true);
}

#[tokio::test]
async fn behavior_table_has_per_field_filters() {
    let (app, _) = test_app().await;
    let cookie = sign_in(&app, "viewer@trustlock.io").await;

    let (status, all) = get_json(&app, "/api/behavior", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["rows"].as_array().unwrap().len(), 2);

    let (_, filtered) = get_json(&app, "/api/behavior?ip=Healthy&request=Danger", &cookie).await;
    let rows = filtered["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "carol");
}

#[tokio::test]
async fn admin_can_add_and_delete_users() {
    let (app, store) = test_app().await;
    let cookie = sign_in(&app, "admin@trustlock.io").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"username": "newcomer"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let snap = trustlock::RealtimeStore::snapshot(store.as_ref(), "component_1/newcomer")
        .await
        .unwrap();
    assert_eq!(snap["status"], true);
    assert_eq!(snap["logoutTime"], "null");
    assert!(snap["loginTime"].as_str().is_some_and(|t| !t.is_empty()));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/sessions/newcomer")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let snap = trustlock::RealtimeStore::snapshot(store.as_ref(), "component_1/newcomer")
        .await
        .unwrap();
    assert!(snap.is_null());
}

#[tokio::test]
async fn non_admin_cannot_mutate_sessions() {
    let (app, _) = test_app().await;
    let cookie = sign_in(&app, "viewer@trustlock.io").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"username": "intruder"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/sessions/user00")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rejected_write_reports_and_preserves_state() {
    let (app, store) = test_app().await;
    let cookie = sign_in(&app, "admin@trustlock.io").await;

    store.reject_writes(true);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sessions")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"username": "lost"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "The change was not saved. Please try again.");

    store.reject_writes(false);
    let snap = trustlock::RealtimeStore::snapshot(store.as_ref(), "component_1/lost")
        .await
        .unwrap();
    assert!(snap.is_null());
}

#[tokio::test]
async fn risk_view_and_export() {
    let (app, _) = test_app().await;
    let cookie = sign_in(&app, "viewer@trustlock.io").await;

    let (status, risk) = get_json(&app, "/api/risk", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(risk["malicious"], false);
    assert_eq!(risk["risk_evaluation"], "Low");
    assert_eq!(risk["summary"], "Nothing unusual");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/risk/export")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"threat-analysis-report.txt\""
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("Threat Analysis Report"));
    assert!(text.contains("Malicious: No"));
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let (app, _) = test_app().await;
    let cookie = sign_in(&app, "viewer@trustlock.io").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The old token no longer opens the data API
    let (status, _) = get_json(&app, "/api/sessions", &cookie).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
