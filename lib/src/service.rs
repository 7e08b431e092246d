// lib/src/service.rs
//! Prescription operations exposed to the HTTP layer.
//!
//! Create and update render first and persist last, so a failed render or
//! upload never leaves a record behind.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use models::{Actor, HospitalInfo, Prescription, PrescriptionSnapshot};

use crate::artifacts::{artifact_key, ArtifactStore};
use crate::clock::Clock;
use crate::errors::{PrescriptionError, Result};
use crate::render::{DocumentRenderer, PageFormat};
use crate::storage_engine::{AccountStorage, PrescriptionStorage};
use crate::versioning::{Draft, VersionManager};

/// A regenerated PDF ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub format: PageFormat,
    pub page_count: usize,
}

pub struct PrescriptionService {
    versions: VersionManager,
    prescriptions: Arc<dyn PrescriptionStorage>,
    accounts: Arc<dyn AccountStorage>,
    renderer: DocumentRenderer,
    artifacts: ArtifactStore,
    default_format: PageFormat,
}

impl PrescriptionService {
    pub fn new(
        prescriptions: Arc<dyn PrescriptionStorage>,
        accounts: Arc<dyn AccountStorage>,
        renderer: DocumentRenderer,
        artifacts: ArtifactStore,
        clock: Arc<dyn Clock>,
        default_format: PageFormat,
    ) -> Self {
        PrescriptionService {
            versions: VersionManager::new(prescriptions.clone(), clock),
            prescriptions,
            accounts,
            renderer,
            artifacts,
            default_format,
        }
    }

    pub async fn create(&self, actor: &Actor, snapshot: PrescriptionSnapshot) -> Result<Prescription> {
        snapshot.validate()?;
        let hospital = self
            .accounts
            .get_hospital(&actor.hospital_id)
            .await?
            .ok_or_else(|| PrescriptionError::NotFound(format!("Hospital {} not found", actor.hospital_id)))?;

        let info = HospitalInfo {
            hospital_id: hospital.id,
            hospital_name: hospital.name.clone(),
            hospital_address: Some(hospital.address.clone()),
            hospital_phone: Some(hospital.phone.clone()),
            hospital_email: Some(hospital.email.clone()),
            admin_id: actor.admin_id,
            admin_name: actor.admin_name.clone(),
        };
        let draft = self.versions.draft_original(info, snapshot);
        self.publish(draft).await
    }

    /// Appends a new version after `id`, which must be the lineage's latest.
    pub async fn update(&self, actor: &Actor, id: &Uuid, snapshot: PrescriptionSnapshot) -> Result<Prescription> {
        snapshot.validate()?;
        let root = self.versions.load(id).await?.lineage_root();

        let _guard = self.versions.lock_lineage(root).await;
        // re-read under the lock so a concurrent edit is seen
        let current = self.versions.load(id).await?;
        let draft = self.versions.draft_next(actor, &current, snapshot)?;
        self.publish(draft).await
    }

    async fn publish(&self, draft: Draft) -> Result<Prescription> {
        let document = self
            .renderer
            .render(&draft.content, draft.issued_on(), self.default_format)
            .await
            .map_err(|e| {
                error!("Rendering {} failed: {}", draft.content.prescription_id, e);
                PrescriptionError::from(e)
            })?;
        let key = artifact_key(
            &draft.content.prescription_id,
            draft.version_info.version_number,
            draft.created_at,
        );
        let artifact = self.artifacts.persist(&key, &document.bytes).await?;
        info!(
            "Rendered {} page(s) for {} into {}",
            document.page_count,
            draft.content.prescription_id,
            key
        );
        self.versions.commit(draft, artifact).await
    }

    pub async fn get(&self, id: &Uuid) -> Result<Prescription> {
        self.versions.load(id).await
    }

    /// Latest version of every lineage owned by the actor's hospital.
    pub async fn list_latest(&self, actor: &Actor) -> Result<Vec<Prescription>> {
        self.prescriptions.list_latest(&actor.hospital_id).await
    }

    pub async fn history(&self, id: &Uuid) -> Result<Vec<Prescription>> {
        self.versions.history(id).await
    }

    pub async fn version(&self, id: &Uuid, version_number: u32) -> Result<Prescription> {
        self.versions.version(id, version_number).await
    }

    /// Renders `id` again in `format`; unknown formats fall back to A4.
    pub async fn download(&self, id: &Uuid, format: &str) -> Result<Download> {
        let record = self.versions.load(id).await?;
        let format = PageFormat::parse_or_default(format);
        let document = self.renderer.render(&record.content, record.created_on(), format).await?;
        Ok(Download {
            file_name: format!("prescription-{}-{}.pdf", record.content.prescription_id, format),
            bytes: document.bytes,
            format,
            page_count: document.page_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{decode_inline, ArtifactSink};
    use crate::clock::FixedClock;
    use crate::render::merge::page_count;
    use crate::render::testing::ScriptedRenderer;
    use crate::storage_engine::{AccountStorage, InMemoryStorage};
    use crate::testing::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use models::{ArtifactRef, Hospital};

    struct BrokenSink;

    #[async_trait]
    impl ArtifactSink for BrokenSink {
        async fn put(&self, key: &str, _bytes: &[u8]) -> Result<ArtifactRef> {
            Err(PrescriptionError::Storage(format!("bucket unavailable for {}", key)))
        }

        fn get_type(&self) -> &'static str {
            "object"
        }
    }

    struct Fixture {
        service: Arc<PrescriptionService>,
        clock: Arc<FixedClock>,
        renderer: Arc<ScriptedRenderer>,
        hospital: Hospital,
        actor: Actor,
    }

    async fn fixture_with(artifacts: ArtifactStore) -> Fixture {
        let store = Arc::new(InMemoryStorage::new());
        let clock = Arc::new(FixedClock::new(at(2026, 10, 14, 9)));
        let renderer = Arc::new(ScriptedRenderer::default());
        let h = hospital("City Care", "desk@citycare.in", "MH-001");
        let a = admin(&h, "anita@citycare.in");
        store.register_hospital(&h, &a).await.unwrap();

        let service = PrescriptionService::new(
            store.clone(),
            store.clone(),
            DocumentRenderer::new(renderer.clone(), std::time::Duration::from_secs(30)),
            artifacts,
            clock.clone(),
            PageFormat::A4,
        );
        Fixture {
            service: Arc::new(service),
            clock,
            renderer,
            actor: actor(&h, &a),
            hospital: h,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(ArtifactStore::inline()).await
    }

    #[tokio::test]
    async fn should_create_original_with_rendered_artifact() {
        let f = fixture().await;
        let record = f.service.create(&f.actor, snapshot("RX-1", 12)).await.unwrap();
        assert_eq!(record.version_info.version_number, 1);
        assert!(record.version_info.is_latest);
        assert_eq!(record.hospital_info.hospital_id, f.hospital.id);
        assert_eq!(record.hospital_info.admin_name, "Anita Desai");
        let pdf = decode_inline(&record.artifact).unwrap();
        assert_eq!(page_count(&pdf).unwrap(), 2);
        assert_eq!(f.service.get(&record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn should_reject_invalid_snapshot_without_side_effects() {
        let f = fixture().await;
        let mut invalid = snapshot("RX-1", 1);
        invalid.patient_info.name = None;
        assert!(matches!(
            f.service.create(&f.actor, invalid).await,
            Err(PrescriptionError::Validation(_))
        ));
        assert!(f.service.list_latest(&f.actor).await.unwrap().is_empty());
        assert_eq!(f.renderer.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_version_updates_and_keep_one_latest() {
        let f = fixture().await;
        let v1 = f.service.create(&f.actor, snapshot("RX-2", 1)).await.unwrap();
        f.clock.advance(Duration::hours(1));
        let v2 = f.service.update(&f.actor, &v1.id, snapshot("RX-2", 8)).await.unwrap();
        let v3 = f.service.update(&f.actor, &v2.id, snapshot("RX-2", 9)).await.unwrap();

        assert_eq!(v3.version_info.version_number, 3);
        assert_eq!(v3.version_info.parent_report_id, Some(v1.id));
        let listed = f.service.list_latest(&f.actor).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, v3.id);
        assert_eq!(f.service.version(&v3.id, 1).await.unwrap().id, v1.id);
        assert!(!f.service.get(&v1.id).await.unwrap().version_info.is_latest);
    }

    #[tokio::test]
    async fn should_leave_previous_version_latest_when_render_fails() {
        let f = fixture().await;
        let v1 = f.service.create(&f.actor, snapshot("RX-3", 2)).await.unwrap();
        f.renderer.set_failing(true);

        let err = f.service.update(&f.actor, &v1.id, snapshot("RX-3", 3)).await.unwrap_err();
        assert!(matches!(err, PrescriptionError::Render(_)));
        let history = f.service.history(&v1.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].version_info.is_latest);

        f.renderer.set_failing(false);
        let v2 = f.service.update(&f.actor, &v1.id, snapshot("RX-3", 3)).await.unwrap();
        assert_eq!(v2.version_info.version_number, 2);
    }

    #[tokio::test]
    async fn should_store_inline_when_artifact_sink_fails() {
        let f = fixture_with(ArtifactStore::new(Arc::new(BrokenSink))).await;
        let record = f.service.create(&f.actor, snapshot("RX-4", 1)).await.unwrap();
        assert!(matches!(record.artifact, ArtifactRef::Inline { .. }));
    }

    #[tokio::test]
    async fn should_allow_exactly_one_of_concurrent_edits() {
        let f = fixture().await;
        let v1 = f.service.create(&f.actor, snapshot("RX-5", 1)).await.unwrap();

        let edits: Vec<_> = (0..4)
            .map(|i| {
                let service = f.service.clone();
                let actor = f.actor.clone();
                let id = v1.id;
                tokio::spawn(async move { service.update(&actor, &id, snapshot("RX-5", i + 1)).await })
            })
            .collect();

        let mut successes = 0;
        for edit in edits {
            match edit.await.unwrap() {
                Ok(_) => successes += 1,
                Err(err) => assert!(matches!(err, PrescriptionError::VersionConflict { .. })),
            }
        }
        assert_eq!(successes, 1);
        let history = f.service.history(&v1.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|r| r.version_info.is_latest).count(), 1);
    }

    #[tokio::test]
    async fn should_reject_yesterdays_record_and_other_hospitals() {
        let f = fixture().await;
        let v1 = f.service.create(&f.actor, snapshot("RX-6", 1)).await.unwrap();

        let other = hospital("Lake View", "info@lakeview.in", "MH-002");
        let outsider = actor(&other, &admin(&other, "bala@lakeview.in"));
        assert!(matches!(
            f.service.update(&outsider, &v1.id, snapshot("RX-6", 2)).await,
            Err(PrescriptionError::Permission(_))
        ));

        f.clock.advance(Duration::days(1));
        assert!(matches!(
            f.service.update(&f.actor, &v1.id, snapshot("RX-6", 2)).await,
            Err(PrescriptionError::EditWindowExpired { .. })
        ));
        assert_eq!(f.service.history(&v1.id).await.unwrap(), vec![v1]);
    }

    #[tokio::test]
    async fn should_download_in_requested_format() {
        let f = fixture().await;
        let v1 = f.service.create(&f.actor, snapshot("RX-7", 20)).await.unwrap();

        let a5 = f.service.download(&v1.id, "a5").await.unwrap();
        assert_eq!(a5.format, PageFormat::A5);
        assert_eq!(a5.file_name, "prescription-RX-7-A5.pdf");
        assert_eq!(page_count(&a5.bytes).unwrap(), 3);

        let fallback = f.service.download(&v1.id, "letter").await.unwrap();
        assert_eq!(fallback.format, PageFormat::A4);
        assert!(matches!(
            f.service.download(&Uuid::new_v4(), "A4").await,
            Err(PrescriptionError::NotFound(_))
        ));
    }
}
