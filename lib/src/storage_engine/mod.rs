// lib/src/storage_engine/mod.rs

pub mod inmemory_storage;
pub mod sled_storage;
pub mod storage_engine;

pub use inmemory_storage::InMemoryStorage;
pub use sled_storage::SledStorage;
pub use storage_engine::{AccountStorage, DoctorStorage, PrescriptionStorage};

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageConfig, StorageEngineType};
use crate::errors::Result;

/// The three storage seams, usually backed by one engine.
#[derive(Clone)]
pub struct StorageHandle {
    pub prescriptions: Arc<dyn PrescriptionStorage>,
    pub accounts: Arc<dyn AccountStorage>,
    pub doctors: Arc<dyn DoctorStorage>,
}

impl StorageHandle {
    pub fn from_engine<E>(engine: Arc<E>) -> Self
    where
        E: PrescriptionStorage + AccountStorage + DoctorStorage,
    {
        StorageHandle {
            prescriptions: engine.clone(),
            accounts: engine.clone(),
            doctors: engine,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_engine(Arc::new(InMemoryStorage::new()))
    }
}

/// Opens the engine selected by `config`. Sled is the default.
pub fn open_storage(config: &StorageConfig) -> Result<StorageHandle> {
    let handle = match config.engine {
        StorageEngineType::Sled => {
            StorageHandle::from_engine(Arc::new(SledStorage::open(&config.data_directory)?))
        }
        StorageEngineType::InMemory => StorageHandle::in_memory(),
    };
    info!("Opened {} storage engine", handle.prescriptions.get_type());
    Ok(handle)
}
