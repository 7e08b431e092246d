// models/src/lib.rs
//! Record types persisted and exchanged by the prescription service.

pub mod errors;
pub mod medical;

pub use errors::{ValidationError, ValidationResult};
pub use medical::*;
