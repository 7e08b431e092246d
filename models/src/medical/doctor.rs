// models/src/medical/doctor.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{require, ValidationResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub name: String,
    pub qualification: String,
    pub specialization: String,
    /// Medical council registration number, unique within a hospital.
    pub regd_no: String,
    pub clinic_address: String,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub name: Option<String>,
    pub qualification: Option<String>,
    pub specialization: Option<String>,
    pub regd_no: Option<String>,
    pub clinic_address: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
}

impl NewDoctor {
    pub fn validate(&self) -> ValidationResult<()> {
        require("name", self.name.as_deref())?;
        require("qualification", self.qualification.as_deref())?;
        require("specialization", self.specialization.as_deref())?;
        require("regdNo", self.regd_no.as_deref())?;
        require("clinicAddress", self.clinic_address.as_deref())?;
        Ok(())
    }
}

/// Partial update: absent or blank fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorUpdate {
    pub name: Option<String>,
    pub qualification: Option<String>,
    pub specialization: Option<String>,
    pub regd_no: Option<String>,
    pub clinic_address: Option<String>,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

fn filled(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Doctor {
    /// Builds an active doctor from a validated request.
    pub fn from_new(hospital_id: Uuid, new: &NewDoctor, now: DateTime<Utc>) -> Self {
        Doctor {
            id: Uuid::new_v4(),
            hospital_id,
            name: filled(&new.name).unwrap_or_default(),
            qualification: filled(&new.qualification).unwrap_or_default(),
            specialization: filled(&new.specialization).unwrap_or_default(),
            regd_no: filled(&new.regd_no).unwrap_or_default(),
            clinic_address: filled(&new.clinic_address).unwrap_or_default(),
            contact_number: filled(&new.contact_number),
            email: filled(&new.email),
            is_active: true,
            created_at: now,
        }
    }

    pub fn apply(&mut self, update: &DoctorUpdate) {
        if let Some(v) = filled(&update.name) {
            self.name = v;
        }
        if let Some(v) = filled(&update.qualification) {
            self.qualification = v;
        }
        if let Some(v) = filled(&update.specialization) {
            self.specialization = v;
        }
        if let Some(v) = filled(&update.regd_no) {
            self.regd_no = v;
        }
        if let Some(v) = filled(&update.clinic_address) {
            self.clinic_address = v;
        }
        if let Some(v) = filled(&update.contact_number) {
            self.contact_number = Some(v);
        }
        if let Some(v) = filled(&update.email) {
            self.email = Some(v);
        }
        if let Some(active) = update.is_active {
            self.is_active = active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Doctor {
        let new = NewDoctor {
            name: Some("Dr. Kavya Raman".into()),
            qualification: Some("MBBS, MD".into()),
            specialization: Some("General Medicine".into()),
            regd_no: Some("TNMC-55821".into()),
            clinic_address: Some("12 Anna Salai, Chennai".into()),
            ..Default::default()
        };
        assert!(new.validate().is_ok());
        Doctor::from_new(Uuid::new_v4(), &new, Utc::now())
    }

    #[test]
    fn should_keep_fields_missing_from_update() {
        let mut doctor = sample();
        doctor.apply(&DoctorUpdate {
            specialization: Some("Cardiology".into()),
            name: Some("".into()),
            ..Default::default()
        });
        assert_eq!(doctor.specialization, "Cardiology");
        assert_eq!(doctor.name, "Dr. Kavya Raman");
        assert!(doctor.is_active);
    }

    #[test]
    fn should_toggle_active_flag() {
        let mut doctor = sample();
        doctor.apply(&DoctorUpdate { is_active: Some(false), ..Default::default() });
        assert!(!doctor.is_active);
    }
}
