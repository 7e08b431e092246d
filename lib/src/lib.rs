// lib/src/lib.rs
//! Core of the prescription service.

pub mod artifacts;
pub mod clock;
pub mod config;
pub mod directory;
pub mod errors;
pub mod pagination;
pub mod render;
pub mod service;
pub mod storage_engine;
pub mod versioning;

#[cfg(test)]
pub(crate) mod testing;

pub use artifacts::ArtifactStore;
pub use clock::{Clock, FixedClock, SystemClock};
pub use crate::config::AppConfig;
pub use directory::DoctorDirectory;
pub use errors::{PrescriptionError, RenderError, Result};
pub use render::{DocumentRenderer, PageFormat};
pub use service::{Download, PrescriptionService};
pub use storage_engine::{open_storage, StorageHandle};
pub use versioning::VersionManager;
