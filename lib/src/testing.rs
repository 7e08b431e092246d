// lib/src/testing.rs
//! Fixtures shared by the unit tests of this crate.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use models::{
    Actor, Admin, ArtifactRef, Doctor, Hospital, HospitalInfo, Medication, NewDoctor,
    PatientInfo, Prescription, PrescriptionSnapshot, VersionInfo,
};

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn hospital(name: &str, email: &str, registration_number: &str) -> Hospital {
    Hospital {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_lowercase(),
        address: "12 MG Road, Pune".to_string(),
        phone: "+91 20 5555 0101".to_string(),
        registration_number: registration_number.to_string(),
        is_active: true,
        created_at: at(2026, 1, 5, 9),
    }
}

pub fn admin(hospital: &Hospital, email: &str) -> Admin {
    Admin::new(hospital.id, "Anita Desai", email, "secret123", 4, at(2026, 1, 5, 9)).unwrap()
}

pub fn actor(hospital: &Hospital, admin: &Admin) -> Actor {
    Actor {
        admin_id: admin.id,
        admin_name: admin.name.clone(),
        hospital_id: hospital.id,
        hospital_name: hospital.name.clone(),
    }
}

pub fn hospital_info(hospital: &Hospital, admin: &Admin) -> HospitalInfo {
    HospitalInfo {
        hospital_id: hospital.id,
        hospital_name: hospital.name.clone(),
        hospital_address: Some(hospital.address.clone()),
        hospital_phone: Some(hospital.phone.clone()),
        hospital_email: Some(hospital.email.clone()),
        admin_id: admin.id,
        admin_name: admin.name.clone(),
    }
}

pub fn snapshot(prescription_id: &str, meds: usize) -> PrescriptionSnapshot {
    PrescriptionSnapshot {
        prescription_id: prescription_id.to_string(),
        patient_info: PatientInfo {
            name: Some("Ravi Kumar".into()),
            age: Some(41),
            gender: Some("M".into()),
            patient_id: Some("P-1001".into()),
        },
        medications: (1..=meds).map(|i| Medication::named(format!("Medicine {}", i))).collect(),
        ..Default::default()
    }
}

pub fn inline_artifact() -> ArtifactRef {
    ArtifactRef::Inline {
        data_url: "data:application/pdf;base64,JVBERg==".into(),
    }
}

pub fn original(info: &HospitalInfo, prescription_id: &str, created_at: DateTime<Utc>) -> Prescription {
    Prescription {
        id: Uuid::new_v4(),
        content: snapshot(prescription_id, 2),
        hospital_info: info.clone(),
        version_info: VersionInfo::original(),
        artifact: inline_artifact(),
        created_at,
        updated_at: created_at,
    }
}

pub fn next_version(previous: &Prescription, created_at: DateTime<Utc>) -> Prescription {
    Prescription {
        id: Uuid::new_v4(),
        content: previous.content.clone(),
        hospital_info: previous.hospital_info.clone(),
        version_info: VersionInfo {
            version_number: previous.version_info.version_number + 1,
            is_latest: true,
            parent_report_id: Some(previous.lineage_root()),
        },
        artifact: inline_artifact(),
        created_at,
        updated_at: created_at,
    }
}

pub fn new_doctor(name: &str, regd_no: &str) -> NewDoctor {
    NewDoctor {
        name: Some(name.to_string()),
        qualification: Some("MBBS, MD".into()),
        specialization: Some("General Medicine".into()),
        regd_no: Some(regd_no.to_string()),
        clinic_address: Some("OPD 4, Block B".into()),
        ..Default::default()
    }
}

pub fn doctor(hospital_id: Uuid, name: &str, regd_no: &str) -> Doctor {
    Doctor::from_new(hospital_id, &new_doctor(name, regd_no), at(2026, 2, 1, 10))
}
