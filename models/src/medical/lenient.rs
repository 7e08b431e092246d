// models/src/medical/lenient.rs
//! `serde_as` adapters for form payloads where every input is a string.

use chrono::{DateTime, NaiveDate};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use serde_with::{DeserializeAs, DisplayFromStr, NoneAsEmptyString, PickFirst, Same, SerializeAs};

/// A number, a numeric string, `""` or null. Serializes as a plain number.
pub type LenientNumber = PickFirst<(Option<PickFirst<(Same, DisplayFromStr)>>, NoneAsEmptyString)>;

/// `YYYY-MM-DD`, an RFC 3339 datetime (date part kept), `""` or null.
pub type LenientOptionalDate = PickFirst<(Option<LenientDate>, NoneAsEmptyString)>;

pub struct LenientDate;

impl LenientDate {
    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
    }
}

impl<'de> DeserializeAs<'de, NaiveDate> for LenientDate {
    fn deserialize_as<D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        LenientDate::parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {}", raw)))
    }
}

impl SerializeAs<NaiveDate> for LenientDate {
    fn serialize_as<S>(source: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&source.format("%Y-%m-%d"))
    }
}
