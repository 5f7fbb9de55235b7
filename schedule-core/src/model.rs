//! Records returned by the practice API.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Anything stored in a lifecycle collection.
pub trait Entity {
    fn id(&self) -> &str;

    /// Owning patient, for records kept per patient.
    fn patient_id(&self) -> Option<&str> {
        None
    }
}

/// Scheduling record as sent by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "startTime", alias = "dateTime", with = "wall_clock")]
    pub start: NaiveDateTime,
    /// Length in minutes.
    #[serde(default, alias = "durationMinutes")]
    pub duration: i64,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub fee: Option<f64>,
    #[serde(default)]
    pub billing_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub is_repeat: bool,
}

impl Entity for Appointment {
    fn id(&self) -> &str {
        &self.id
    }

    fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }
}

/// Appointment status. Unknown server values are kept verbatim in `Other`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
    NoShow,
    Other(String),
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::CheckedIn => "Checked In",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "No Show",
            AppointmentStatus::Other(raw) => raw,
        }
    }
}

impl From<&str> for AppointmentStatus {
    fn from(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "scheduled" => AppointmentStatus::Scheduled,
            "confirmed" => AppointmentStatus::Confirmed,
            "checkedin" => AppointmentStatus::CheckedIn,
            "completed" => AppointmentStatus::Completed,
            "cancelled" | "canceled" => AppointmentStatus::Cancelled,
            "noshow" => AppointmentStatus::NoShow,
            _ => AppointmentStatus::Other(raw.to_string()),
        }
    }
}

impl From<String> for AppointmentStatus {
    fn from(raw: String) -> Self {
        AppointmentStatus::from(raw.as_str())
    }
}

impl From<AppointmentStatus> for String {
    fn from(status: AppointmentStatus) -> Self {
        match status {
            AppointmentStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl Entity for Patient {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vital {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub heart_rate: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub respiratory_rate: Option<f64>,
    #[serde(default)]
    pub oxygen_saturation: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    pub test_name: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reference_range: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub collected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalNote {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub note_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(alias = "_id")]
    pub id: String,
    pub patient_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Telemedicine session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(alias = "startTime", with = "wall_clock")]
    pub start: NaiveDateTime,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

macro_rules! patient_scoped {
    ($($record:ty),+ $(,)?) => {
        $(
            impl Entity for $record {
                fn id(&self) -> &str {
                    &self.id
                }

                fn patient_id(&self) -> Option<&str> {
                    Some(&self.patient_id)
                }
            }
        )+
    };
}

patient_scoped!(Vital, LabResult, Medication, ClinicalNote, Document);

impl Entity for Meeting {
    fn id(&self) -> &str {
        &self.id
    }

    fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }
}

/// Wall-clock timestamps.
///
/// Naive ISO strings are taken as local time already. Strings carrying an
/// offset are converted to the process time zone before the offset is
/// dropped.
pub mod wall_clock {
    use chrono::{DateTime, Local, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::ScheduleError;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
    const FALLBACK_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

    pub fn parse(raw: &str) -> Result<NaiveDateTime, ScheduleError> {
        let raw = raw.trim();
        if let Ok(value) = raw.parse::<NaiveDateTime>() {
            return Ok(value);
        }
        if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
            return Ok(value.with_timezone(&Local).naive_local());
        }
        FALLBACK_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .ok_or_else(|| ScheduleError::InvalidTimestamp(raw.to_string()))
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
