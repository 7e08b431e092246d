// rest_api/tests/api.rs

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use lib::config::ArtifactSinkKind;
use lib::{AppConfig, FixedClock, StorageHandle};
use rest_api::{router, AppState};

fn app() -> Router {
    let mut config = AppConfig::default();
    config.auth.bcrypt_cost = 4;
    config.artifacts.sink = ArtifactSinkKind::Inline;
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let state = AppState::new(StorageHandle::in_memory(), &config, clock).unwrap();
    router(state)
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes, _) = call_raw(app, method, uri, token, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn call_raw(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>, axum::http::HeaderMap) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    (status, bytes, headers)
}

/// Registers a hospital and returns a token for its first admin.
async fn onboard(app: &Router, name: &str, slug: &str) -> String {
    let (status, _) = call(
        app,
        "POST",
        "/api/hospitals/register",
        None,
        Some(json!({
            "name": name,
            "email": format!("desk@{}.in", slug),
            "address": "12 MG Road, Pune",
            "phone": "020 5555 0101",
            "registrationNumber": format!("REG-{}", slug),
            "adminName": "Anita Desai",
            "adminEmail": format!("admin@{}.in", slug),
            "adminPassword": "secret123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        app,
        "POST",
        "/api/admin/login",
        None,
        Some(json!({ "email": format!("admin@{}.in", slug), "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn report(medications: usize, diagnosis: &str) -> Value {
    let meds: Vec<Value> = (1..=medications)
        .map(|i| json!({ "name": format!("Med {}", i), "morning": "1", "night": "1/2", "duration": "5 days" }))
        .collect();
    json!({
        "prescriptionId": "RX-1",
        "doctorInfo": { "name": "Dr. Rao", "regdNo": "MH-1234" },
        "patientInfo": { "name": "Ravi Kumar", "age": 42, "gender": "M" },
        "diagnosis": { "current": diagnosis },
        "notes": "Review after a week",
        "medications": meds,
    })
}

#[tokio::test]
async fn should_report_health_without_auth() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn should_reject_missing_and_invalid_tokens() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/reports", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");

    let (status, body) = call(&app, "GET", "/api/admin/profile", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn should_reject_bad_logins_and_incomplete_registrations() {
    let app = app();
    onboard(&app, "City Care", "citycare").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/admin/login",
        None,
        Some(json!({ "email": "admin@citycare.in", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, _) = call(
        &app,
        "POST",
        "/api/hospitals/register",
        None,
        Some(json!({ "name": "City Care", "email": "desk@citycare.in" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_show_profile_of_token_holder() {
    let app = app();
    let token = onboard(&app, "City Care", "citycare").await;
    let (status, body) = call(&app, "GET", "/api/admin/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "admin@citycare.in");
    assert_eq!(body["hospital"]["name"], "City Care");
    assert!(body["lastLogin"].is_string());
}

#[tokio::test]
async fn should_version_reports_through_edits() {
    let app = app();
    let token = onboard(&app, "City Care", "citycare").await;

    let (status, original) = call(&app, "POST", "/api/reports", Some(&token), Some(report(12, "Fever"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(original["versionInfo"]["versionNumber"], 1);
    assert_eq!(original["versionInfo"]["parentReportId"], Value::Null);
    let original_id = original["id"].as_str().unwrap().to_string();

    let (status, second) = call(
        &app,
        "PUT",
        &format!("/api/reports/{}", original_id),
        Some(&token),
        Some(report(3, "Viral fever")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["versionInfo"]["versionNumber"], 2);
    assert_eq!(second["versionInfo"]["parentReportId"], original_id.as_str());

    // The superseded version can no longer be edited.
    let (status, _) = call(
        &app,
        "PUT",
        &format!("/api/reports/{}", original_id),
        Some(&token),
        Some(report(1, "Flu")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, listed) = call(&app, "GET", "/api/reports", Some(&token), None).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], second["id"]);

    let (_, versions) = call(&app, "GET", &format!("/api/reports/{}/versions", original_id), Some(&token), None).await;
    let numbers: Vec<u64> = versions
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["versionInfo"]["versionNumber"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2]);

    let (status, first) = call(&app, "GET", &format!("/api/reports/{}/version/1", original_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["versionInfo"]["isLatest"], false);
    let (status, _) = call(&app, "GET", &format!("/api/reports/{}/version/9", original_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_forbid_edits_from_another_hospital() {
    let app = app();
    let ours = onboard(&app, "City Care", "citycare").await;
    let theirs = onboard(&app, "Lake View", "lakeview").await;

    let (_, created) = call(&app, "POST", "/api/reports", Some(&ours), Some(report(2, "Fever"))).await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = call(&app, "PUT", &format!("/api/reports/{}", id), Some(&theirs), Some(report(1, "Flu"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, listed) = call(&app, "GET", "/api/reports", Some(&theirs), None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_reports_without_patient_or_with_unknown_ids() {
    let app = app();
    let token = onboard(&app, "City Care", "citycare").await;

    let (status, body) = call(&app, "POST", "/api/reports", Some(&token), Some(json!({ "prescriptionId": "RX-9" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, _) = call(&app, "GET", "/api/reports/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "GET", &format!("/api/reports/{}", uuid::Uuid::new_v4()), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_download_regenerated_pdf() {
    let app = app();
    let token = onboard(&app, "City Care", "citycare").await;
    let (_, created) = call(&app, "POST", "/api/reports", Some(&token), Some(report(12, "Fever"))).await;
    let id = created["id"].as_str().unwrap();

    let (status, bytes, headers) =
        call_raw(&app, "GET", &format!("/api/reports/{}/download/A5", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"prescription-RX-1-A5.pdf\""
    );
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(lib::render::page_count(&bytes).unwrap(), 2);

    let (_, _, headers) = call_raw(&app, "GET", &format!("/api/reports/{}/download/letter", id), Some(&token), None).await;
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"prescription-RX-1-A4.pdf\""
    );
}

#[tokio::test]
async fn should_manage_doctors_of_own_hospital() {
    let app = app();
    let token = onboard(&app, "City Care", "citycare").await;
    let doctor = json!({
        "name": "Dr. Meera Iyer",
        "qualification": "MBBS, MD",
        "specialization": "General Medicine",
        "regdNo": "MH-5678",
        "clinicAddress": "12 MG Road, Pune",
    });

    let (status, added) = call(&app, "POST", "/api/doctors", Some(&token), Some(doctor)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = added["doctor"]["id"].as_str().unwrap().to_string();

    let (status, updated) = call(
        &app,
        "PUT",
        &format!("/api/doctors/{}", id),
        Some(&token),
        Some(json!({ "specialization": "Cardiology" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["doctor"]["specialization"], "Cardiology");
    assert_eq!(updated["doctor"]["regdNo"], "MH-5678");

    let (_, listed) = call(&app, "GET", "/api/doctors", Some(&token), None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, "DELETE", &format!("/api/doctors/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, listed) = call(&app, "GET", "/api/doctors", Some(&token), None).await;
    assert!(listed.as_array().unwrap().is_empty());
}
