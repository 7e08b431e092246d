// lib/src/storage_engine/inmemory_storage.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use models::{Admin, Doctor, Hospital, Prescription};

use super::storage_engine::{regd_key, AccountStorage, DoctorStorage, PrescriptionStorage};
use crate::errors::{PrescriptionError, Result};

#[derive(Debug, Default)]
struct State {
    prescriptions: HashMap<Uuid, Prescription>,
    hospitals: HashMap<Uuid, Hospital>,
    admins: HashMap<Uuid, Admin>,
    doctors: HashMap<Uuid, Doctor>,
}

/// Lightweight engine for tests and throwaway runs. All data sits behind one
/// lock, so every write is atomic.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    state: Arc<RwLock<State>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrescriptionStorage for InMemoryStorage {
    async fn insert_prescription(&self, record: &Prescription) -> Result<()> {
        let mut state = self.state.write().await;
        if state.prescriptions.contains_key(&record.id) {
            return Err(PrescriptionError::AlreadyExists(format!("prescription {}", record.id)));
        }
        state.prescriptions.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_prescription(&self, id: &Uuid) -> Result<Option<Prescription>> {
        Ok(self.state.read().await.prescriptions.get(id).cloned())
    }

    async fn list_latest(&self, hospital_id: &Uuid) -> Result<Vec<Prescription>> {
        let state = self.state.read().await;
        let mut latest: Vec<Prescription> = state
            .prescriptions
            .values()
            .filter(|r| r.version_info.is_latest && r.hospital_info.hospital_id == *hospital_id)
            .cloned()
            .collect();
        latest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(latest)
    }

    async fn lineage(&self, root: &Uuid) -> Result<Vec<Prescription>> {
        let state = self.state.read().await;
        let mut members: Vec<Prescription> = state
            .prescriptions
            .values()
            .filter(|r| r.lineage_root() == *root)
            .cloned()
            .collect();
        members.sort_by_key(|r| r.version_info.version_number);
        Ok(members)
    }

    async fn supersede(&self, previous_id: &Uuid, next: &Prescription) -> Result<Prescription> {
        let mut state = self.state.write().await;
        let previous = state
            .prescriptions
            .get(previous_id)
            .ok_or_else(|| PrescriptionError::NotFound(format!("prescription {}", previous_id)))?;
        if !previous.version_info.is_latest {
            return Err(PrescriptionError::VersionConflict {
                lineage: previous.lineage_root(),
                version: previous.version_info.version_number,
            });
        }
        if previous.lineage_root() != next.lineage_root()
            || next.version_info.version_number != previous.version_info.version_number + 1
        {
            return Err(PrescriptionError::Internal(format!(
                "record {} does not follow version {} of lineage {}",
                next.id,
                previous.version_info.version_number,
                previous.lineage_root()
            )));
        }
        if state.prescriptions.contains_key(&next.id) {
            return Err(PrescriptionError::AlreadyExists(format!("prescription {}", next.id)));
        }

        let mut superseded = previous.clone();
        superseded.version_info.is_latest = false;
        superseded.updated_at = next.created_at;
        state.prescriptions.insert(superseded.id, superseded.clone());
        state.prescriptions.insert(next.id, next.clone());
        Ok(superseded)
    }

    fn get_type(&self) -> &'static str {
        "InMemory"
    }
}

#[async_trait]
impl AccountStorage for InMemoryStorage {
    async fn register_hospital(&self, hospital: &Hospital, admin: &Admin) -> Result<()> {
        let mut state = self.state.write().await;
        if state.hospitals.values().any(|h| h.email.eq_ignore_ascii_case(&hospital.email)) {
            return Err(PrescriptionError::AlreadyExists(format!("hospital email {}", hospital.email)));
        }
        if state
            .hospitals
            .values()
            .any(|h| h.registration_number == hospital.registration_number)
        {
            return Err(PrescriptionError::AlreadyExists(format!(
                "registration number {}",
                hospital.registration_number
            )));
        }
        if state.admins.values().any(|a| a.email.eq_ignore_ascii_case(&admin.email)) {
            return Err(PrescriptionError::AlreadyExists(format!("admin email {}", admin.email)));
        }
        state.hospitals.insert(hospital.id, hospital.clone());
        state.admins.insert(admin.id, admin.clone());
        Ok(())
    }

    async fn get_hospital(&self, id: &Uuid) -> Result<Option<Hospital>> {
        Ok(self.state.read().await.hospitals.get(id).cloned())
    }

    async fn get_admin(&self, id: &Uuid) -> Result<Option<Admin>> {
        Ok(self.state.read().await.admins.get(id).cloned())
    }

    async fn get_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let email = email.trim();
        Ok(self
            .state
            .read()
            .await
            .admins
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_admin(&self, admin: &Admin) -> Result<()> {
        let mut state = self.state.write().await;
        match state.admins.get_mut(&admin.id) {
            Some(slot) => {
                *slot = admin.clone();
                Ok(())
            }
            None => Err(PrescriptionError::NotFound(format!("admin {}", admin.id))),
        }
    }
}

#[async_trait]
impl DoctorStorage for InMemoryStorage {
    async fn insert_doctor(&self, doctor: &Doctor) -> Result<()> {
        let mut state = self.state.write().await;
        let key = regd_key(&doctor.hospital_id, &doctor.regd_no);
        if state
            .doctors
            .values()
            .any(|d| regd_key(&d.hospital_id, &d.regd_no) == key)
        {
            return Err(PrescriptionError::AlreadyExists(format!(
                "doctor with registration number {}",
                doctor.regd_no
            )));
        }
        state.doctors.insert(doctor.id, doctor.clone());
        Ok(())
    }

    async fn get_doctor(&self, id: &Uuid) -> Result<Option<Doctor>> {
        Ok(self.state.read().await.doctors.get(id).cloned())
    }

    async fn update_doctor(&self, doctor: &Doctor) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.doctors.contains_key(&doctor.id) {
            return Err(PrescriptionError::NotFound(format!("doctor {}", doctor.id)));
        }
        let key = regd_key(&doctor.hospital_id, &doctor.regd_no);
        if state
            .doctors
            .values()
            .any(|d| d.id != doctor.id && regd_key(&d.hospital_id, &d.regd_no) == key)
        {
            return Err(PrescriptionError::AlreadyExists(format!(
                "doctor with registration number {}",
                doctor.regd_no
            )));
        }
        state.doctors.insert(doctor.id, doctor.clone());
        Ok(())
    }

    async fn list_doctors(&self, hospital_id: &Uuid) -> Result<Vec<Doctor>> {
        Ok(self
            .state
            .read()
            .await
            .doctors
            .values()
            .filter(|d| d.hospital_id == *hospital_id)
            .cloned()
            .collect())
    }
}
