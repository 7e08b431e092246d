// lib/src/artifacts.rs
//! Where rendered PDFs go once a record is ready to be stored.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, warn};

use models::ArtifactRef;

use crate::config::{ArtifactSinkKind, ArtifactsConfig, ObjectStoreConfig};
use crate::errors::{PrescriptionError, Result};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// `prescriptions/<prescriptionId>-<unix millis>.pdf`, with `-v<n>` for edits.
pub fn artifact_key(prescription_id: &str, version: u32, at: DateTime<Utc>) -> String {
    let safe: String = prescription_id
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    let suffix = if version > 1 { format!("-v{}", version) } else { String::new() };
    format!("prescriptions/{}-{}{}.pdf", safe, at.timestamp_millis(), suffix)
}

pub fn inline(bytes: &[u8]) -> ArtifactRef {
    ArtifactRef::Inline {
        data_url: format!("data:{};base64,{}", PDF_CONTENT_TYPE, STANDARD.encode(bytes)),
    }
}

/// Decodes an inline artifact back to PDF bytes.
pub fn decode_inline(artifact: &ArtifactRef) -> Option<Vec<u8>> {
    match artifact {
        ArtifactRef::Inline { data_url } => data_url
            .split_once(";base64,")
            .and_then(|(_, payload)| STANDARD.decode(payload).ok()),
        _ => None,
    }
}

/// Destination for finished PDFs. Failures are reported as `PrescriptionError::Storage`.
#[async_trait]
pub trait ArtifactSink: Send + Sync + 'static {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<ArtifactRef>;
    fn get_type(&self) -> &'static str;
}

/// HTTP PUT to `{endpoint}/{bucket}/{key}`.
pub struct ObjectStoreSink {
    client: Client,
    config: ObjectStoreConfig,
}

impl ObjectStoreSink {
    pub fn new(config: ObjectStoreConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(ObjectStoreSink { client, config })
    }
}

#[async_trait]
impl ArtifactSink for ObjectStoreSink {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<ArtifactRef> {
        let url = format!(
            "{}/{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.bucket,
            key
        );
        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, PDF_CONTENT_TYPE)
            .body(bytes.to_vec())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PrescriptionError::Storage(format!(
                "object store rejected {} with status {}",
                key,
                response.status()
            )));
        }
        debug!("Uploaded {} ({} bytes)", key, bytes.len());
        Ok(ArtifactRef::Object {
            url: format!("{}/{}", self.config.public_base().trim_end_matches('/'), key),
            key: key.to_string(),
        })
    }

    fn get_type(&self) -> &'static str {
        "object"
    }
}

pub struct LocalDirectorySink {
    root: PathBuf,
}

impl LocalDirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalDirectorySink { root: root.into() }
    }
}

#[async_trait]
impl ArtifactSink for LocalDirectorySink {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<ArtifactRef> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(ArtifactRef::Local {
            path: path.to_string_lossy().into_owned(),
        })
    }

    fn get_type(&self) -> &'static str {
        "local"
    }
}

/// Keeps the PDF inside the record as a base64 data URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineSink;

#[async_trait]
impl ArtifactSink for InlineSink {
    async fn put(&self, _key: &str, bytes: &[u8]) -> Result<ArtifactRef> {
        Ok(inline(bytes))
    }

    fn get_type(&self) -> &'static str {
        "inline"
    }
}

/// The configured sink, degrading to an inline artifact when it fails.
#[derive(Clone)]
pub struct ArtifactStore {
    primary: Arc<dyn ArtifactSink>,
}

impl ArtifactStore {
    pub fn new(primary: Arc<dyn ArtifactSink>) -> Self {
        ArtifactStore { primary }
    }

    pub fn inline() -> Self {
        Self::new(Arc::new(InlineSink))
    }

    pub fn from_config(config: &ArtifactsConfig) -> anyhow::Result<Self> {
        let primary: Arc<dyn ArtifactSink> = match config.sink {
            ArtifactSinkKind::Object => {
                let store = config.object_store.clone().ok_or_else(|| {
                    anyhow::anyhow!("artifacts.sink is 'object' but artifacts.object_store is not configured")
                })?;
                Arc::new(ObjectStoreSink::new(store)?)
            }
            ArtifactSinkKind::Local => Arc::new(LocalDirectorySink::new(config.local_directory.clone())),
            ArtifactSinkKind::Inline => Arc::new(InlineSink),
        };
        Ok(Self::new(primary))
    }

    pub async fn persist(&self, key: &str, bytes: &[u8]) -> Result<ArtifactRef> {
        match self.primary.put(key, bytes).await {
            Ok(artifact) => Ok(artifact),
            Err(PrescriptionError::Storage(reason)) => {
                warn!(
                    "{} artifact sink failed for {}: {}. Storing the PDF inline instead.",
                    self.primary.get_type(),
                    key,
                    reason
                );
                Ok(inline(bytes))
            }
            Err(other) => Err(other),
        }
    }
}
