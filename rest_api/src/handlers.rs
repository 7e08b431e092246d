// rest_api/src/handlers.rs

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use lib::errors::PrescriptionError;
use models::{AdminLogin, AdminProfile, Doctor, DoctorUpdate, HospitalRegistration, NewDoctor, Prescription, PrescriptionSnapshot};

use crate::errors::RestApiError;
use crate::extract::{record_id, ApiJson, CurrentAdmin};
use crate::AppState;

type ApiResult<T> = Result<T, RestApiError>;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Server is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn register_hospital(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<HospitalRegistration>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let registered = state.auth.register_hospital(registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Hospital registered successfully",
            "hospital": registered.hospital,
            "admin": registered.admin,
        })),
    ))
}

pub async fn login(State(state): State<AppState>, ApiJson(login): ApiJson<AdminLogin>) -> ApiResult<Json<Value>> {
    let success = state.auth.login(login).await?;
    Ok(Json(json!({
        "message": "Login successful",
        "token": success.token,
        "admin": success.admin,
    })))
}

pub async fn profile(State(state): State<AppState>, CurrentAdmin(actor): CurrentAdmin) -> ApiResult<Json<AdminProfile>> {
    Ok(Json(state.auth.profile(&actor).await?))
}

pub async fn list_doctors(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
) -> ApiResult<Json<Vec<Doctor>>> {
    Ok(Json(state.doctors.list(&actor).await?))
}

pub async fn add_doctor(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
    ApiJson(new): ApiJson<NewDoctor>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let doctor = state.doctors.add(&actor, new).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Doctor added successfully", "doctor": doctor })),
    ))
}

pub async fn update_doctor(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<DoctorUpdate>,
) -> ApiResult<Json<Value>> {
    let id = record_id(&id, "Doctor")?;
    let doctor = state.doctors.update(&actor, &id, update).await?;
    Ok(Json(json!({ "message": "Doctor updated successfully", "doctor": doctor })))
}

pub async fn delete_doctor(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = record_id(&id, "Doctor")?;
    state.doctors.deactivate(&actor, &id).await?;
    Ok(Json(json!({ "message": "Doctor deleted successfully" })))
}

pub async fn create_report(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
    ApiJson(snapshot): ApiJson<PrescriptionSnapshot>,
) -> ApiResult<(StatusCode, Json<Prescription>)> {
    let record = state.prescriptions.create(&actor, snapshot).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_reports(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
) -> ApiResult<Json<Vec<Prescription>>> {
    Ok(Json(state.prescriptions.list_latest(&actor).await?))
}

pub async fn get_report(
    State(state): State<AppState>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<String>,
) -> ApiResult<Json<Prescription>> {
    let id = record_id(&id, "Report")?;
    Ok(Json(state.prescriptions.get(&id).await?))
}

pub async fn update_report(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
    Path(id): Path<String>,
    ApiJson(snapshot): ApiJson<PrescriptionSnapshot>,
) -> ApiResult<Json<Prescription>> {
    let id = record_id(&id, "Report")?;
    Ok(Json(state.prescriptions.update(&actor, &id, snapshot).await?))
}

pub async fn report_versions(
    State(state): State<AppState>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Prescription>>> {
    let id = record_id(&id, "Report")?;
    Ok(Json(state.prescriptions.history(&id).await?))
}

pub async fn report_version(
    State(state): State<AppState>,
    CurrentAdmin(_): CurrentAdmin,
    Path((id, number)): Path<(String, String)>,
) -> ApiResult<Json<Prescription>> {
    let id = record_id(&id, "Report")?;
    let number: u32 = number
        .parse()
        .map_err(|_| PrescriptionError::NotFound("Version not found".to_string()))?;
    Ok(Json(state.prescriptions.version(&id, number).await?))
}

pub async fn download_report(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
    Path((id, format)): Path<(String, String)>,
) -> ApiResult<Response> {
    let id = record_id(&id, "Report")?;
    let download = state.prescriptions.download(&id, &format).await?;
    info!(
        "Admin {} downloaded {} ({} pages, {})",
        actor.admin_id, download.file_name, download.page_count, download.format
    );
    let disposition = format!("attachment; filename=\"{}\"", download.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response())
}
