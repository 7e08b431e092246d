// server/src/seed.rs
//! Loads hospitals with their first admins, doctors and sample prescriptions
//! from a JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use lib::errors::PrescriptionError;
use models::{Actor, HospitalRegistration, NewDoctor, PrescriptionSnapshot};
use rest_api::AppState;
use security::AuthError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub hospitals: Vec<SeedHospital>,
}

/// A registration payload with the hospital's doctors and prescriptions alongside.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedHospital {
    #[serde(flatten)]
    pub registration: HospitalRegistration,
    #[serde(default)]
    pub doctors: Vec<NewDoctor>,
    /// Created as originals by the hospital's first admin.
    #[serde(default)]
    pub prescriptions: Vec<PrescriptionSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub hospitals: usize,
    pub doctors: usize,
    pub prescriptions: usize,
    pub skipped: usize,
}

pub fn load(path: &Path) -> Result<SeedFile> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read seed file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse seed file {}", path.display()))
}

/// Hospitals that already exist are skipped together with their doctors and
/// prescriptions, so a file can be applied more than once.
pub async fn apply(state: &AppState, seed: SeedFile) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    for entry in seed.hospitals {
        let name = entry.registration.name.clone().unwrap_or_default();
        let registered = match state.auth.register_hospital(entry.registration).await {
            Ok(registered) => registered,
            Err(AuthError::Storage(PrescriptionError::AlreadyExists(reason))) => {
                warn!("Skipping hospital {}: {}", name, reason);
                report.skipped += 1;
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to seed hospital {}", name)),
        };
        report.hospitals += 1;

        let actor = Actor {
            admin_id: registered.admin.id,
            admin_name: registered.admin.name.clone(),
            hospital_id: registered.hospital.id,
            hospital_name: registered.hospital.name.clone(),
        };
        for doctor in entry.doctors {
            match state.doctors.add(&actor, doctor).await {
                Ok(added) => {
                    info!("Seeded doctor {} for {}", added.name, actor.hospital_name);
                    report.doctors += 1;
                }
                Err(PrescriptionError::AlreadyExists(reason)) => {
                    warn!("Skipping doctor: {}", reason);
                    report.skipped += 1;
                }
                Err(e) => return Err(e).with_context(|| format!("Failed to seed doctors for {}", name)),
            }
        }
        for snapshot in entry.prescriptions {
            let created = state
                .prescriptions
                .create(&actor, snapshot)
                .await
                .with_context(|| format!("Failed to seed prescriptions for {}", name))?;
            info!(
                "Seeded prescription {} for {}",
                created.content.prescription_id, actor.hospital_name
            );
            report.prescriptions += 1;
        }
    }
    Ok(report)
}
