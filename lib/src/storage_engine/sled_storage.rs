// lib/src/storage_engine/sled_storage.rs
//! Sled document store. Records are JSON values keyed by their uuid bytes;
//! uniqueness and lineage are kept in side trees updated in the same
//! transaction as the record.

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};
use tracing::{debug, info};
use uuid::Uuid;

use models::{Admin, Doctor, Hospital, Prescription};

use super::storage_engine::{lineage_key, regd_key, AccountStorage, DoctorStorage, PrescriptionStorage};
use crate::errors::{PrescriptionError, Result};

type TxResult<T> = std::result::Result<T, ConflictableTransactionError<PrescriptionError>>;

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn abort<T>(err: impl Into<PrescriptionError>) -> TxResult<T> {
    Err(ConflictableTransactionError::Abort(err.into()))
}

fn settle<T>(result: std::result::Result<T, TransactionError<PrescriptionError>>) -> Result<T> {
    result.map_err(|err| match err {
        TransactionError::Abort(err) => err,
        TransactionError::Storage(err) => err.into(),
    })
}

fn email_key(email: &str) -> Vec<u8> {
    email.trim().to_lowercase().into_bytes()
}

pub struct SledStorage {
    db: Db,
    prescriptions: Tree,
    lineage: Tree,
    hospitals: Tree,
    hospital_emails: Tree,
    hospital_registrations: Tree,
    admins: Tree,
    admin_emails: Tree,
    doctors: Tree,
    doctor_registrations: Tree,
}

impl SledStorage {
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening sled database at {:?}", path);
        let db = sled::open(path)?;
        Self::new(db)
    }

    pub fn new(db: Db) -> Result<Self> {
        Ok(SledStorage {
            prescriptions: db.open_tree("prescriptions")?,
            lineage: db.open_tree("prescription_lineage")?,
            hospitals: db.open_tree("hospitals")?,
            hospital_emails: db.open_tree("hospital_emails")?,
            hospital_registrations: db.open_tree("hospital_registrations")?,
            admins: db.open_tree("admins")?,
            admin_emails: db.open_tree("admin_emails")?,
            doctors: db.open_tree("doctors")?,
            doctor_registrations: db.open_tree("doctor_registrations")?,
            db,
        })
    }

    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(tree: &Tree, id: &Uuid) -> Result<Option<T>> {
        match tree.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PrescriptionStorage for SledStorage {
    async fn insert_prescription(&self, record: &Prescription) -> Result<()> {
        let bytes = encode(record)?;
        let id = record.id;
        let root = record.lineage_root();
        let version = record.version_info.version_number;
        let index_key = lineage_key(&root, version);
        settle((&self.prescriptions, &self.lineage).transaction(|(records, lineage)| {
            if records.get(id.as_bytes())?.is_some() {
                return abort(PrescriptionError::AlreadyExists(format!("prescription {}", id)));
            }
            if lineage.get(index_key.as_slice())?.is_some() {
                return abort(PrescriptionError::VersionConflict { lineage: root, version });
            }
            records.insert(&id.as_bytes()[..], bytes.as_slice())?;
            lineage.insert(index_key.as_slice(), &id.as_bytes()[..])?;
            Ok(())
        }))?;
        debug!("Stored prescription {} ({})", record.id, record.content.prescription_id);
        Ok(())
    }

    async fn get_prescription(&self, id: &Uuid) -> Result<Option<Prescription>> {
        Self::get(&self.prescriptions, id)
    }

    async fn list_latest(&self, hospital_id: &Uuid) -> Result<Vec<Prescription>> {
        let mut latest = Vec::new();
        for item in self.prescriptions.iter() {
            let (_, value) = item?;
            let record: Prescription = decode(&value)?;
            if record.version_info.is_latest && record.hospital_info.hospital_id == *hospital_id {
                latest.push(record);
            }
        }
        latest.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(latest)
    }

    async fn lineage(&self, root: &Uuid) -> Result<Vec<Prescription>> {
        let mut members = Vec::new();
        for item in self.lineage.scan_prefix(root.as_bytes()) {
            let (_, id) = item?;
            if let Some(bytes) = self.prescriptions.get(&id)? {
                members.push(decode::<Prescription>(&bytes)?);
            }
        }
        Ok(members)
    }

    async fn supersede(&self, previous_id: &Uuid, next: &Prescription) -> Result<Prescription> {
        let next_bytes = encode(next)?;
        let previous_id = *previous_id;
        let next_id = next.id;
        let root = next.lineage_root();
        let index_key = lineage_key(&root, next.version_info.version_number);

        let superseded = settle((&self.prescriptions, &self.lineage).transaction(|(records, lineage)| {
            let raw = match records.get(previous_id.as_bytes())? {
                Some(raw) => raw,
                None => {
                    return abort(PrescriptionError::NotFound(format!("prescription {}", previous_id)))
                }
            };
            let mut previous: Prescription = match decode(&raw) {
                Ok(previous) => previous,
                Err(err) => return abort(err),
            };
            if !previous.version_info.is_latest || lineage.get(index_key.as_slice())?.is_some() {
                return abort(PrescriptionError::VersionConflict {
                    lineage: previous.lineage_root(),
                    version: previous.version_info.version_number,
                });
            }
            if previous.lineage_root() != root
                || next.version_info.version_number != previous.version_info.version_number + 1
            {
                return abort(PrescriptionError::Internal(format!(
                    "record {} does not follow version {} of lineage {}",
                    next_id,
                    previous.version_info.version_number,
                    previous.lineage_root()
                )));
            }
            if records.get(next_id.as_bytes())?.is_some() {
                return abort(PrescriptionError::AlreadyExists(format!("prescription {}", next_id)));
            }

            previous.version_info.is_latest = false;
            previous.updated_at = next.created_at;
            let previous_bytes = match encode(&previous) {
                Ok(bytes) => bytes,
                Err(err) => return abort(err),
            };
            records.insert(&previous_id.as_bytes()[..], previous_bytes)?;
            records.insert(&next_id.as_bytes()[..], next_bytes.as_slice())?;
            lineage.insert(index_key.as_slice(), &next_id.as_bytes()[..])?;
            Ok(previous)
        }))?;

        debug!(
            "Superseded {} with {} (version {})",
            previous_id, next_id, next.version_info.version_number
        );
        Ok(superseded)
    }

    fn get_type(&self) -> &'static str {
        "Sled"
    }
}

#[async_trait]
impl AccountStorage for SledStorage {
    async fn register_hospital(&self, hospital: &Hospital, admin: &Admin) -> Result<()> {
        let hospital_bytes = encode(hospital)?;
        let admin_bytes = encode(admin)?;
        let hospital_email = email_key(&hospital.email);
        let registration = hospital.registration_number.trim().as_bytes().to_vec();
        let admin_email = email_key(&admin.email);

        settle(
            (
                &self.hospitals,
                &self.hospital_emails,
                &self.hospital_registrations,
                &self.admins,
                &self.admin_emails,
            )
                .transaction(|(hospitals, hospital_emails, registrations, admins, admin_emails)| {
                    if hospital_emails.get(hospital_email.as_slice())?.is_some() {
                        return abort(PrescriptionError::AlreadyExists(format!(
                            "hospital email {}",
                            hospital.email
                        )));
                    }
                    if registrations.get(registration.as_slice())?.is_some() {
                        return abort(PrescriptionError::AlreadyExists(format!(
                            "registration number {}",
                            hospital.registration_number
                        )));
                    }
                    if admin_emails.get(admin_email.as_slice())?.is_some() {
                        return abort(PrescriptionError::AlreadyExists(format!(
                            "admin email {}",
                            admin.email
                        )));
                    }
                    hospitals.insert(&hospital.id.as_bytes()[..], hospital_bytes.as_slice())?;
                    hospital_emails.insert(hospital_email.as_slice(), &hospital.id.as_bytes()[..])?;
                    registrations.insert(registration.as_slice(), &hospital.id.as_bytes()[..])?;
                    admins.insert(&admin.id.as_bytes()[..], admin_bytes.as_slice())?;
                    admin_emails.insert(admin_email.as_slice(), &admin.id.as_bytes()[..])?;
                    Ok(())
                }),
        )
    }

    async fn get_hospital(&self, id: &Uuid) -> Result<Option<Hospital>> {
        Self::get(&self.hospitals, id)
    }

    async fn get_admin(&self, id: &Uuid) -> Result<Option<Admin>> {
        Self::get(&self.admins, id)
    }

    async fn get_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
        match self.admin_emails.get(email_key(email))? {
            Some(id) => match self.admins.get(&id)? {
                Some(bytes) => Ok(Some(decode(&bytes)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    async fn update_admin(&self, admin: &Admin) -> Result<()> {
        let bytes = encode(admin)?;
        let id = admin.id;
        settle(self.admins.transaction(|admins| {
            if admins.get(id.as_bytes())?.is_none() {
                return abort(PrescriptionError::NotFound(format!("admin {}", id)));
            }
            admins.insert(&id.as_bytes()[..], bytes.as_slice())?;
            Ok(())
        }))
    }
}

#[async_trait]
impl DoctorStorage for SledStorage {
    async fn insert_doctor(&self, doctor: &Doctor) -> Result<()> {
        let bytes = encode(doctor)?;
        let key = regd_key(&doctor.hospital_id, &doctor.regd_no);
        settle((&self.doctors, &self.doctor_registrations).transaction(|(doctors, registrations)| {
            if registrations.get(key.as_slice())?.is_some() {
                return abort(PrescriptionError::AlreadyExists(format!(
                    "doctor with registration number {}",
                    doctor.regd_no
                )));
            }
            doctors.insert(&doctor.id.as_bytes()[..], bytes.as_slice())?;
            registrations.insert(key.as_slice(), &doctor.id.as_bytes()[..])?;
            Ok(())
        }))
    }

    async fn get_doctor(&self, id: &Uuid) -> Result<Option<Doctor>> {
        Self::get(&self.doctors, id)
    }

    async fn update_doctor(&self, doctor: &Doctor) -> Result<()> {
        let bytes = encode(doctor)?;
        let new_key = regd_key(&doctor.hospital_id, &doctor.regd_no);
        settle((&self.doctors, &self.doctor_registrations).transaction(|(doctors, registrations)| {
            let current: Doctor = match doctors.get(doctor.id.as_bytes())? {
                Some(raw) => match decode(&raw) {
                    Ok(current) => current,
                    Err(err) => return abort(err),
                },
                None => return abort(PrescriptionError::NotFound(format!("doctor {}", doctor.id))),
            };
            let old_key = regd_key(&current.hospital_id, &current.regd_no);
            if old_key != new_key {
                if registrations.get(new_key.as_slice())?.is_some() {
                    return abort(PrescriptionError::AlreadyExists(format!(
                        "doctor with registration number {}",
                        doctor.regd_no
                    )));
                }
                registrations.remove(old_key.as_slice())?;
                registrations.insert(new_key.as_slice(), &doctor.id.as_bytes()[..])?;
            }
            doctors.insert(&doctor.id.as_bytes()[..], bytes.as_slice())?;
            Ok(())
        }))
    }

    async fn list_doctors(&self, hospital_id: &Uuid) -> Result<Vec<Doctor>> {
        let mut doctors = Vec::new();
        for item in self.doctors.iter() {
            let (_, value) = item?;
            let doctor: Doctor = decode(&value)?;
            if doctor.hospital_id == *hospital_id {
                doctors.push(doctor);
            }
        }
        Ok(doctors)
    }
}
