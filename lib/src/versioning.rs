// lib/src/versioning.rs
//! Version lineage of prescriptions.
//!
//! Every edit appends a record. The original's id roots the lineage and is the
//! `parentReportId` of every later version. Exactly one member is latest.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use models::{Actor, ArtifactRef, HospitalInfo, Prescription, PrescriptionSnapshot, VersionInfo};

use crate::clock::Clock;
use crate::errors::{PrescriptionError, Result};
use crate::storage_engine::PrescriptionStorage;

/// Where a stored record stands in its lineage. Unstored versions are [`Draft`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineageState {
    ActiveLatest,
    /// Terminal.
    Superseded,
}

impl LineageState {
    pub fn of(record: &Prescription) -> Self {
        if record.version_info.is_latest {
            LineageState::ActiveLatest
        } else {
            LineageState::Superseded
        }
    }
}

/// A version that has passed every guard but has no artifact yet.
#[derive(Debug, Clone)]
pub struct Draft {
    pub id: Uuid,
    pub content: PrescriptionSnapshot,
    pub hospital_info: HospitalInfo,
    pub version_info: VersionInfo,
    pub created_at: DateTime<Utc>,
    /// The record this draft will supersede; `None` for an original.
    pub supersedes: Option<Uuid>,
}

impl Draft {
    /// Date printed on the document.
    pub fn issued_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    pub fn finalize(self, artifact: ArtifactRef) -> Prescription {
        Prescription {
            id: self.id,
            content: self.content,
            hospital_info: self.hospital_info,
            version_info: self.version_info,
            artifact,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Held while a lineage is being edited.
pub struct LineageGuard {
    pub root: Uuid,
    _guard: OwnedMutexGuard<()>,
}

pub struct VersionManager {
    store: Arc<dyn PrescriptionStorage>,
    clock: Arc<dyn Clock>,
    locks: Mutex<HashMap<Uuid, Arc<TokioMutex<()>>>>,
}

impl VersionManager {
    pub fn new(store: Arc<dyn PrescriptionStorage>, clock: Arc<dyn Clock>) -> Self {
        VersionManager {
            store,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn load(&self, id: &Uuid) -> Result<Prescription> {
        self.store
            .get_prescription(id)
            .await?
            .ok_or_else(|| PrescriptionError::NotFound(format!("Prescription {} not found", id)))
    }

    /// Hospital ownership first, then the same-day window on `current`.
    pub fn check_edit_eligibility(&self, actor: &Actor, current: &Prescription) -> Result<()> {
        if actor.hospital_id != current.hospital_info.hospital_id {
            return Err(PrescriptionError::Permission(
                "Only the hospital that created this prescription can edit it".to_string(),
            ));
        }
        let created_on = current.created_on();
        if created_on != self.clock.today() {
            return Err(PrescriptionError::EditWindowExpired { created_on });
        }
        Ok(())
    }

    pub fn draft_original(&self, hospital_info: HospitalInfo, content: PrescriptionSnapshot) -> Draft {
        Draft {
            id: Uuid::new_v4(),
            content,
            hospital_info,
            version_info: VersionInfo::original(),
            created_at: self.clock.now(),
            supersedes: None,
        }
    }

    /// The version that would follow `current`. `current` must still be the latest.
    pub fn draft_next(
        &self,
        actor: &Actor,
        current: &Prescription,
        content: PrescriptionSnapshot,
    ) -> Result<Draft> {
        self.check_edit_eligibility(actor, current)?;
        match LineageState::of(current) {
            LineageState::ActiveLatest => {}
            LineageState::Superseded => {
                return Err(PrescriptionError::VersionConflict {
                    lineage: current.lineage_root(),
                    version: current.version_info.version_number,
                });
            }
        }
        Ok(Draft {
            id: Uuid::new_v4(),
            content,
            hospital_info: current.hospital_info.clone(),
            version_info: VersionInfo {
                version_number: current.version_info.version_number + 1,
                is_latest: true,
                parent_report_id: Some(current.lineage_root()),
            },
            created_at: self.clock.now(),
            supersedes: Some(current.id),
        })
    }

    /// Serializes edits of one lineage within this process.
    pub async fn lock_lineage(&self, root: Uuid) -> LineageGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(root).or_default().clone()
        };
        LineageGuard {
            root,
            _guard: lock.lock_owned().await,
        }
    }

    /// Stores a finished draft: a plain insert for originals, an atomic
    /// supersede for later versions.
    pub async fn commit(&self, draft: Draft, artifact: ArtifactRef) -> Result<Prescription> {
        let supersedes = draft.supersedes;
        let record = draft.finalize(artifact);
        match supersedes {
            None => {
                self.store.insert_prescription(&record).await?;
                info!(
                    "Created prescription {} ({})",
                    record.id, record.content.prescription_id
                );
            }
            Some(previous) => {
                self.store.supersede(&previous, &record).await?;
                info!(
                    "Prescription {} is now at version {} ({} superseded)",
                    record.lineage_root(),
                    record.version_info.version_number,
                    previous
                );
            }
        }
        Ok(record)
    }

    /// Every version of the lineage `id` belongs to, ascending.
    pub async fn history(&self, id: &Uuid) -> Result<Vec<Prescription>> {
        let record = self.load(id).await?;
        let members = self.store.lineage(&record.lineage_root()).await?;
        debug!("Lineage {} has {} versions", record.lineage_root(), members.len());
        Ok(members)
    }

    pub async fn version(&self, id: &Uuid, version_number: u32) -> Result<Prescription> {
        self.history(id)
            .await?
            .into_iter()
            .find(|r| r.version_info.version_number == version_number)
            .ok_or_else(|| {
                PrescriptionError::NotFound(format!("Version {} of prescription {} not found", version_number, id))
            })
    }
}
