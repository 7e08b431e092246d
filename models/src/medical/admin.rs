// models/src/medical/admin.rs
use bcrypt::{hash, verify, BcryptError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::medical::hospital::{Hospital, HospitalSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    #[default]
    Admin,
    SuperAdmin,
}

/// Stored admin account. Holds the bcrypt hash, never the plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub name: String,
    /// Unique across admins, stored lowercase.
    pub email: String,
    pub password_hash: String,
    pub role: AdminRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    /// Creates an active admin, hashing `password` with the given bcrypt cost.
    pub fn new(
        hospital_id: Uuid,
        name: &str,
        email: &str,
        password: &str,
        cost: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, BcryptError> {
        Ok(Admin {
            id: Uuid::new_v4(),
            hospital_id,
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            password_hash: hash(password, cost)?,
            role: AdminRole::Admin,
            is_active: true,
            last_login: None,
            created_at: now,
        })
    }

    pub fn verify_password(&self, password: &str) -> Result<bool, BcryptError> {
        verify(password, &self.password_hash)
    }

    pub fn profile(&self, hospital: &Hospital) -> AdminProfile {
        AdminProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            hospital: hospital.summary(),
            role: self.role,
            last_login: self.last_login,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLogin {
    pub email: String,
    pub password: String,
}

/// Public view of an admin, without the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub hospital: HospitalSummary,
    pub role: AdminRole,
    pub last_login: Option<DateTime<Utc>>,
}

/// The authenticated admin a request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub admin_id: Uuid,
    pub admin_name: String,
    pub hospital_id: Uuid,
    pub hospital_name: String,
}
