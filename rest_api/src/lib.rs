// rest_api/src/lib.rs
//! HTTP surface of the prescription service.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use lib::{AppConfig, ArtifactStore, Clock, DocumentRenderer, DoctorDirectory, PrescriptionService, StorageHandle};
use security::{Authenticator, JwtKeys};

pub mod errors;
pub mod extract;
pub mod handlers;

pub use errors::RestApiError;
pub use extract::CurrentAdmin;

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Authenticator>,
    pub doctors: Arc<DoctorDirectory>,
    pub prescriptions: Arc<PrescriptionService>,
}

impl AppState {
    pub fn new(storage: StorageHandle, config: &AppConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let artifacts = ArtifactStore::from_config(&config.artifacts).context("Failed to set up the artifact sink")?;
        let keys = JwtKeys::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);
        Ok(AppState {
            auth: Arc::new(Authenticator::new(
                storage.accounts.clone(),
                keys,
                config.auth.bcrypt_cost,
                clock.clone(),
            )),
            doctors: Arc::new(DoctorDirectory::new(storage.doctors.clone(), clock.clone())),
            prescriptions: Arc::new(PrescriptionService::new(
                storage.prescriptions.clone(),
                storage.accounts.clone(),
                DocumentRenderer::lopdf(config.render.page_timeout()),
                artifacts,
                clock,
                config.render.default_format,
            )),
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/hospitals/register", post(handlers::register_hospital))
        .route("/api/admin/login", post(handlers::login))
        .route("/api/admin/profile", get(handlers::profile))
        .route("/api/doctors", get(handlers::list_doctors).post(handlers::add_doctor))
        .route("/api/doctors/:id", put(handlers::update_doctor).delete(handlers::delete_doctor))
        .route("/api/reports", get(handlers::list_reports).post(handlers::create_report))
        .route("/api/reports/:id", get(handlers::get_report).put(handlers::update_report))
        .route("/api/reports/:id/versions", get(handlers::report_versions))
        .route("/api/reports/:id/version/:number", get(handlers::report_version))
        .route("/api/reports/:id/download/:format", get(handlers::download_report))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serves until `shutdown` resolves.
pub async fn serve<F>(config: &AppConfig, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;
    info!("REST API server listening on {}", addr);

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("REST API server failed to start or run")?;

    info!("REST API server stopped.");
    Ok(())
}
