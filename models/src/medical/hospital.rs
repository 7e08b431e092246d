// models/src/medical/hospital.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{require, ValidationResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    /// Unique across hospitals.
    pub email: String,
    pub address: String,
    pub phone: String,
    /// Unique across hospitals.
    pub registration_number: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Registration payload: the hospital plus its first admin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalRegistration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub registration_number: Option<String>,
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl HospitalRegistration {
    pub fn validate(&self) -> ValidationResult<()> {
        require("name", self.name.as_deref())?;
        require("email", self.email.as_deref())?;
        require("address", self.address.as_deref())?;
        require("phone", self.phone.as_deref())?;
        require("registrationNumber", self.registration_number.as_deref())?;
        require("adminName", self.admin_name.as_deref())?;
        require("adminEmail", self.admin_email.as_deref())?;
        require("adminPassword", self.admin_password.as_deref())?;
        Ok(())
    }
}

impl Hospital {
    /// Builds the hospital half of a validated registration.
    pub fn from_registration(registration: &HospitalRegistration, now: DateTime<Utc>) -> Self {
        let field = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_string();
        Hospital {
            id: Uuid::new_v4(),
            name: field(&registration.name),
            email: field(&registration.email).to_lowercase(),
            address: field(&registration.address),
            phone: field(&registration.phone),
            registration_number: field(&registration.registration_number),
            is_active: true,
            created_at: now,
        }
    }

    pub fn summary(&self) -> HospitalSummary {
        HospitalSummary {
            id: self.id,
            name: self.name.clone(),
            address: Some(self.address.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
