// lib/src/config/config_defaults.rs
use std::path::PathBuf;

use crate::config::config_structs::{ArtifactSinkKind, StorageEngineType};
use crate::render::PageFormat;

pub const DEFAULT_CONFIG_BASENAME: &str = "medscript";
pub const ENV_PREFIX: &str = "MEDSCRIPT";
pub const ENV_SEPARATOR: &str = "__";

pub fn default_host() -> String { "0.0.0.0".to_string() }
pub fn default_port() -> u16 { 5000 }
pub fn default_storage_engine_type() -> StorageEngineType { StorageEngineType::Sled }
pub fn default_data_directory() -> PathBuf { PathBuf::from("./data/medscript") }
pub fn default_jwt_secret() -> String { "medscript-development-secret".to_string() }
pub fn default_token_ttl_hours() -> i64 { 24 }
pub fn default_bcrypt_cost() -> u32 { 10 }
pub fn default_page_timeout_ms() -> u64 { 30_000 }
pub fn default_page_format() -> PageFormat { PageFormat::A4 }
pub fn default_artifact_sink() -> ArtifactSinkKind { ArtifactSinkKind::Local }
pub fn default_artifact_directory() -> PathBuf { PathBuf::from("./data/artifacts") }
