// lib/src/render/layout.rs
//! Text content of one printed page, composed from a prescription snapshot.
//!
//! Every value is already a display string: absent fields come out empty so a
//! backend never has to decide how to print a missing value.

use chrono::{Duration, NaiveDate};

use models::{Medication, PrescriptionSnapshot};

use crate::errors::RenderError;
use crate::pagination::page_slice;

/// Days a prescription stays valid when no date was given.
pub const DEFAULT_VALIDITY_DAYS: i64 = 30;

pub const ISSUED_DIGITALLY_NOTICE: &str = "Doctor generated this prescription and issued digitally.";

/// `14 Oct 2026`
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

fn text(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn number<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// `head` followed by `sep` and `tail` when `tail` is non-empty.
fn joined(head: String, sep: &str, tail: String) -> String {
    if tail.is_empty() {
        head
    } else {
        format!("{}{}{}", head, sep, tail)
    }
}

fn patient_title(gender: &str, name: &str) -> String {
    match gender {
        "F" => format!("Ms. {}", name),
        "M" => format!("Mr. {}", name),
        _ => name.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorBlock {
    pub name: String,
    /// Qualification, then specialization when present.
    pub credentials: String,
    pub registration: String,
    pub clinic_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientLine {
    /// `Mr. Ravi, 41yr / M`
    pub headline: String,
    pub date: String,
    pub patient_id: String,
    pub prescription_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VitalCell {
    pub label: &'static str,
    pub value: String,
    pub unit: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisBlock {
    /// Current diagnosis, then the ICD code when present.
    pub current: String,
    pub known: String,
}

/// Page 1 only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicalBlock {
    pub allergy: String,
    pub examination: String,
    pub complaints: String,
    pub known: String,
    pub personal_history: String,
    pub family_history: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicationRow {
    pub number: usize,
    pub name: String,
    pub composition: String,
    /// `MN - AF - EN - NT`
    pub frequency: String,
    pub timing: String,
    pub duration: String,
    pub quantity: String,
}

impl MedicationRow {
    fn new(number: usize, med: &Medication) -> Self {
        MedicationRow {
            number,
            name: text(&med.name),
            composition: text(&med.composition),
            frequency: med.dosage.frequency(),
            timing: text(&med.timing),
            duration: text(&med.duration),
            quantity: text(&med.quantity),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    /// `Page 1 of 2`
    pub page_label: String,
    pub notice: &'static str,
    pub instructions: String,
    pub footer_text: String,
    pub valid_till: String,
    /// Empty when no signature image is known; backends draw a blank line.
    pub signature_url: String,
}

/// Everything printed on one page, in its seven sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    pub title: String,
    pub page_number: usize,
    pub total_pages: usize,
    pub header: DoctorBlock,
    pub patient: PatientLine,
    pub vitals: Vec<VitalCell>,
    pub diagnosis: DiagnosisBlock,
    pub clinical: Option<ClinicalBlock>,
    pub medications: Vec<MedicationRow>,
    pub footer: Footer,
}

impl PageLayout {
    /// Lays out `page` of a prescription issued on `issued_on`.
    pub fn compose(
        snapshot: &PrescriptionSnapshot,
        issued_on: NaiveDate,
        page: usize,
    ) -> Result<Self, RenderError> {
        let slice = page_slice(&snapshot.medications, page)?;
        let doctor = &snapshot.doctor_info;
        let patient = &snapshot.patient_info;
        let vitals = &snapshot.vitals;
        let issued = display_date(issued_on);

        let header = DoctorBlock {
            name: text(&doctor.name),
            credentials: joined(text(&doctor.qualification), ", ", text(&doctor.specialization)),
            registration: format!("REGD. No. {}", text(&doctor.regd_no)),
            clinic_address: text(&doctor.clinic_address),
        };

        let gender = text(&patient.gender);
        let patient_line = PatientLine {
            headline: format!(
                "{}, {}yr / {}",
                patient_title(&gender, &text(&patient.name)),
                number(&patient.age),
                gender
            ),
            date: issued.clone(),
            patient_id: text(&patient.patient_id),
            prescription_id: snapshot.prescription_id.clone(),
        };

        let vital_cells = vec![
            VitalCell { label: "Ht", value: number(&vitals.height), unit: "cm" },
            VitalCell { label: "Wt", value: number(&vitals.weight), unit: "kg" },
            VitalCell { label: "Temp", value: number(&vitals.temp), unit: "F" },
            VitalCell { label: "HR", value: number(&vitals.hr), unit: "BPM" },
            VitalCell { label: "BP", value: text(&vitals.bp), unit: "mm.Hg" },
        ];

        let diagnosis = DiagnosisBlock {
            current: joined(
                text(&snapshot.diagnosis.current),
                ", ",
                text(&snapshot.diagnosis.current_icd),
            ),
            known: text(&snapshot.diagnosis.known),
        };

        let clinical = slice.has_clinical_block().then(|| {
            let history = &snapshot.history;
            let updated = history
                .last_updated
                .map(|d| format!("[Updated at {}]", display_date(d)))
                .unwrap_or_default();
            ClinicalBlock {
                allergy: text(&snapshot.allergy),
                examination: joined(
                    text(&snapshot.examination.nutritional_assessment),
                    ". ",
                    text(&snapshot.examination.other_findings),
                ),
                complaints: joined(
                    text(&snapshot.complaints.symptoms),
                    ". ",
                    text(&snapshot.complaints.duration),
                ),
                known: joined(text(&snapshot.diagnosis.known), ". ", updated),
                personal_history: text(&history.personal),
                family_history: text(&history.family),
                notes: Some(text(&snapshot.notes)).filter(|n| !n.is_empty()),
            }
        });

        let medications = slice
            .numbered()
            .map(|(number, med)| MedicationRow::new(number, med))
            .collect();

        let valid_till = snapshot
            .valid_till_date
            .unwrap_or_else(|| issued_on + Duration::days(DEFAULT_VALIDITY_DAYS));
        let signature_url = snapshot
            .signature_url
            .clone()
            .or_else(|| doctor.signature_url.clone())
            .unwrap_or_default();

        Ok(PageLayout {
            title: format!("Prescription - {} - Page {}", snapshot.prescription_id, page),
            page_number: page,
            total_pages: slice.total_pages,
            header,
            patient: patient_line,
            vitals: vital_cells,
            diagnosis,
            clinical,
            medications,
            footer: Footer {
                page_label: format!("Page {} of {}", page, slice.total_pages),
                notice: ISSUED_DIGITALLY_NOTICE,
                instructions: text(&snapshot.instructions),
                footer_text: text(&snapshot.footer_text),
                valid_till: display_date(valid_till),
                signature_url,
            },
        })
    }
}
