// models/src/medical/mod.rs
pub mod admin;
pub mod doctor;
pub mod hospital;
pub mod lenient;
pub mod medication;
pub mod prescription;

pub use admin::{Actor, Admin, AdminLogin, AdminProfile, AdminRole};
pub use doctor::{Doctor, DoctorUpdate, NewDoctor};
pub use hospital::{Hospital, HospitalRegistration, HospitalSummary};
pub use medication::{DosageSchedule, Medication};
pub use prescription::{
    ArtifactRef, Complaints, Diagnosis, DoctorInfo, Examination, History, HospitalInfo,
    PatientInfo, Prescription, PrescriptionSnapshot, VersionInfo, Vitals,
};
