// models/src/medical/prescription.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use uuid::Uuid;

use crate::errors::{require, ValidationResult};
use crate::medical::lenient::{LenientNumber, LenientOptionalDate};
use crate::medical::medication::Medication;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorInfo {
    pub name: Option<String>,
    pub qualification: Option<String>,
    pub specialization: Option<String>,
    pub regd_no: Option<String>,
    pub clinic_address: Option<String>,
    pub signature_url: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub name: Option<String>,
    #[serde(default)]
    #[serde_as(as = "LenientNumber")]
    pub age: Option<u32>,
    /// `M`, `F` or free text.
    pub gender: Option<String>,
    pub patient_id: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    /// cm
    #[serde(default)]
    #[serde_as(as = "LenientNumber")]
    pub height: Option<f64>,
    /// kg
    #[serde(default)]
    #[serde_as(as = "LenientNumber")]
    pub weight: Option<f64>,
    /// Fahrenheit
    #[serde(default)]
    #[serde_as(as = "LenientNumber")]
    pub temp: Option<f64>,
    /// beats per minute
    #[serde(default)]
    #[serde_as(as = "LenientNumber")]
    pub hr: Option<u32>,
    /// mm Hg, e.g. "120/80"
    pub bp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub current: Option<String>,
    #[serde(rename = "currentICD")]
    pub current_icd: Option<String>,
    pub known: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Examination {
    pub nutritional_assessment: Option<String>,
    pub other_findings: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaints {
    pub symptoms: Option<String>,
    pub duration: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub personal: Option<String>,
    pub family: Option<String>,
    #[serde(default)]
    #[serde_as(as = "LenientOptionalDate")]
    pub last_updated: Option<NaiveDate>,
}

/// The part of a prescription an admin submits. Every edit replaces it wholesale.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionSnapshot {
    /// Human-assigned, shared by every version of a lineage.
    #[serde(default)]
    pub prescription_id: String,
    #[serde(default)]
    pub doctor_info: DoctorInfo,
    #[serde(default)]
    pub patient_info: PatientInfo,
    #[serde(default)]
    pub vitals: Vitals,
    #[serde(default)]
    pub diagnosis: Diagnosis,
    pub allergy: Option<String>,
    pub notes: Option<String>,
    pub instructions: Option<String>,
    pub footer_text: Option<String>,
    #[serde(default)]
    #[serde_as(as = "LenientOptionalDate")]
    pub valid_till_date: Option<NaiveDate>,
    #[serde(default)]
    pub examination: Examination,
    #[serde(default)]
    pub complaints: Complaints,
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub medications: Vec<Medication>,
    pub signature_url: Option<String>,
}

impl PrescriptionSnapshot {
    /// Checks the identifying fields every prescription must carry.
    pub fn validate(&self) -> ValidationResult<()> {
        require("prescriptionId", Some(self.prescription_id.as_str()))?;
        require("patientInfo.name", self.patient_info.name.as_deref())?;
        Ok(())
    }
}

/// Which hospital and admin own a lineage. Copied unchanged into every version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalInfo {
    pub hospital_id: Uuid,
    pub hospital_name: String,
    pub hospital_address: Option<String>,
    pub hospital_phone: Option<String>,
    pub hospital_email: Option<String>,
    pub admin_id: Uuid,
    pub admin_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub version_number: u32,
    pub is_latest: bool,
    /// Id of the lineage's original record; `None` on the original itself.
    pub parent_report_id: Option<Uuid>,
}

impl VersionInfo {
    pub fn original() -> Self {
        VersionInfo {
            version_number: 1,
            is_latest: true,
            parent_report_id: None,
        }
    }
}

/// Where the rendered PDF of a record lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ArtifactRef {
    Object { url: String, key: String },
    Local { path: String },
    Inline {
        #[serde(rename = "dataUrl")]
        data_url: String,
    },
}

impl ArtifactRef {
    /// A link a client can open directly.
    pub fn url(&self) -> String {
        match self {
            ArtifactRef::Object { url, .. } => url.clone(),
            ArtifactRef::Local { path } => format!("file://{}", path),
            ArtifactRef::Inline { data_url } => data_url.clone(),
        }
    }
}

/// One persisted version of a prescription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: Uuid,
    #[serde(flatten)]
    pub content: PrescriptionSnapshot,
    pub hospital_info: HospitalInfo,
    pub version_info: VersionInfo,
    pub artifact: ArtifactRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prescription {
    /// Id of the original record of this record's lineage.
    pub fn lineage_root(&self) -> Uuid {
        self.version_info.parent_report_id.unwrap_or(self.id)
    }

    /// Calendar day (UTC) the record was created.
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}
