// lib/src/storage_engine/storage_engine.rs
use async_trait::async_trait;
use uuid::Uuid;

use models::{Admin, Doctor, Hospital, Prescription};

use crate::errors::Result;

/// Prescription records and their version lineage.
#[async_trait]
pub trait PrescriptionStorage: Send + Sync + 'static {
    /// Stores the first version of a lineage.
    /// Fails with `AlreadyExists` if the id is taken.
    async fn insert_prescription(&self, record: &Prescription) -> Result<()>;
    async fn get_prescription(&self, id: &Uuid) -> Result<Option<Prescription>>;
    /// Latest version of every lineage owned by `hospital_id`, newest first.
    async fn list_latest(&self, hospital_id: &Uuid) -> Result<Vec<Prescription>>;
    /// Every member of the lineage rooted at `root`, ascending by version number.
    async fn lineage(&self, root: &Uuid) -> Result<Vec<Prescription>>;
    /// In one atomic step, marks `previous_id` as no longer latest and stores
    /// `next`. Aborts with `VersionConflict` when `previous_id` is not the
    /// latest version any more. Returns the superseded record.
    async fn supersede(&self, previous_id: &Uuid, next: &Prescription) -> Result<Prescription>;
    fn get_type(&self) -> &'static str;
}

/// Hospitals and their admins.
#[async_trait]
pub trait AccountStorage: Send + Sync + 'static {
    /// Stores a hospital together with its first admin, or neither.
    /// Duplicate hospital email, registration number or admin email yields `AlreadyExists`.
    async fn register_hospital(&self, hospital: &Hospital, admin: &Admin) -> Result<()>;
    async fn get_hospital(&self, id: &Uuid) -> Result<Option<Hospital>>;
    async fn get_admin(&self, id: &Uuid) -> Result<Option<Admin>>;
    /// Lookup is case-insensitive.
    async fn get_admin_by_email(&self, email: &str) -> Result<Option<Admin>>;
    async fn update_admin(&self, admin: &Admin) -> Result<()>;
}

#[async_trait]
pub trait DoctorStorage: Send + Sync + 'static {
    /// `regd_no` is unique within a hospital.
    async fn insert_doctor(&self, doctor: &Doctor) -> Result<()>;
    async fn get_doctor(&self, id: &Uuid) -> Result<Option<Doctor>>;
    async fn update_doctor(&self, doctor: &Doctor) -> Result<()>;
    /// Every doctor of the hospital, active or not.
    async fn list_doctors(&self, hospital_id: &Uuid) -> Result<Vec<Doctor>>;
}

/// Key under which a doctor's registration number is reserved.
pub(crate) fn regd_key(hospital_id: &Uuid, regd_no: &str) -> Vec<u8> {
    let mut key = hospital_id.as_bytes().to_vec();
    key.extend_from_slice(regd_no.trim().to_lowercase().as_bytes());
    key
}

/// Lineage index key: root id, then big-endian version so a prefix scan runs in version order.
pub(crate) fn lineage_key(root: &Uuid, version: u32) -> Vec<u8> {
    let mut key = root.as_bytes().to_vec();
    key.extend_from_slice(&version.to_be_bytes());
    key
}
