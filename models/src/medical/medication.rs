// models/src/medical/medication.rs
use serde::{Deserialize, Serialize};

/// Doses per slot of the day. Slots are short strings so that "1/2" survives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DosageSchedule {
    pub morning: Option<String>,
    pub afternoon: Option<String>,
    pub evening: Option<String>,
    pub night: Option<String>,
}

impl DosageSchedule {
    pub fn new(morning: &str, afternoon: &str, evening: &str, night: &str) -> Self {
        let slot = |s: &str| Some(s.to_string());
        DosageSchedule {
            morning: slot(morning),
            afternoon: slot(afternoon),
            evening: slot(evening),
            night: slot(night),
        }
    }

    /// `MN - AF - EN - NT`, an empty slot counts as zero.
    pub fn frequency(&self) -> String {
        [&self.morning, &self.afternoon, &self.evening, &self.night]
            .iter()
            .map(|slot| match slot.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => "0".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

/// One row of the prescription table. Position in the list is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: Option<String>,
    pub composition: Option<String>,
    #[serde(flatten)]
    pub dosage: DosageSchedule,
    pub timing: Option<String>,
    pub duration: Option<String>,
    pub quantity: Option<String>,
}

impl Medication {
    pub fn named(name: impl Into<String>) -> Self {
        Medication {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}
