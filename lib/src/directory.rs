// lib/src/directory.rs
//! Doctors of a hospital. Admins only ever see their own hospital's doctors.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use models::{Actor, Doctor, DoctorUpdate, NewDoctor};

use crate::clock::Clock;
use crate::errors::{PrescriptionError, Result};
use crate::storage_engine::DoctorStorage;

pub struct DoctorDirectory {
    store: Arc<dyn DoctorStorage>,
    clock: Arc<dyn Clock>,
}

impl DoctorDirectory {
    pub fn new(store: Arc<dyn DoctorStorage>, clock: Arc<dyn Clock>) -> Self {
        DoctorDirectory { store, clock }
    }

    /// Active doctors, sorted by name.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Doctor>> {
        let mut doctors: Vec<Doctor> = self
            .store
            .list_doctors(&actor.hospital_id)
            .await?
            .into_iter()
            .filter(|d| d.is_active)
            .collect();
        doctors.sort_by_key(|d| d.name.to_lowercase());
        Ok(doctors)
    }

    pub async fn add(&self, actor: &Actor, new: NewDoctor) -> Result<Doctor> {
        new.validate()?;
        let doctor = Doctor::from_new(actor.hospital_id, &new, self.clock.now());
        self.store.insert_doctor(&doctor).await?;
        info!("Added doctor {} to hospital {}", doctor.id, actor.hospital_id);
        Ok(doctor)
    }

    pub async fn update(&self, actor: &Actor, id: &Uuid, update: DoctorUpdate) -> Result<Doctor> {
        let mut doctor = self.owned(actor, id).await?;
        doctor.apply(&update);
        self.store.update_doctor(&doctor).await?;
        Ok(doctor)
    }

    /// Soft delete; the record stays for prescriptions that name the doctor.
    pub async fn deactivate(&self, actor: &Actor, id: &Uuid) -> Result<Doctor> {
        let mut doctor = self.owned(actor, id).await?;
        doctor.is_active = false;
        self.store.update_doctor(&doctor).await?;
        info!("Deactivated doctor {}", doctor.id);
        Ok(doctor)
    }

    async fn owned(&self, actor: &Actor, id: &Uuid) -> Result<Doctor> {
        match self.store.get_doctor(id).await? {
            Some(doctor) if doctor.hospital_id == actor.hospital_id => Ok(doctor),
            _ => Err(PrescriptionError::NotFound(format!("Doctor {} not found", id))),
        }
    }
}
