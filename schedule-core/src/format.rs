//! Turns raw appointments into calendar-ready view objects.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::{Appointment, AppointmentStatus};

/// Visual bucket an appointment falls in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Scheduled,
    Neutral,
}

impl StatusTone {
    pub fn classes(self) -> StyleClasses {
        let (fill, border, text) = match self {
            StatusTone::Scheduled => ("bg-blue-100", "border-blue-500", "text-blue-800"),
            StatusTone::Neutral => ("bg-gray-100", "border-gray-400", "text-gray-700"),
        };
        StyleClasses {
            fill: fill.to_string(),
            border: border.to_string(),
            text: text.to_string(),
        }
    }
}

impl From<&AppointmentStatus> for StatusTone {
    fn from(status: &AppointmentStatus) -> Self {
        // Only "Scheduled" gets its own colour; adding a status means deciding here.
        match status {
            AppointmentStatus::Scheduled => StatusTone::Scheduled,
            AppointmentStatus::Confirmed
            | AppointmentStatus::CheckedIn
            | AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow
            | AppointmentStatus::Other(_) => StatusTone::Neutral,
        }
    }
}

/// Fill, border and text colour classes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StyleClasses {
    pub fill: String,
    pub border: String,
    pub text: String,
}

/// Render-ready view of one appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormattedAppointment {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub start_time: String,
    pub end_time: String,
    pub time_display: String,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub tone: StatusTone,
    pub color: StyleClasses,
    pub patient_id: Option<String>,
    pub provider_id: Option<String>,
    pub location: Option<String>,
}

/// Formats every appointment, keeping input order.
pub fn format_appointments(appointments: &[Appointment]) -> Vec<FormattedAppointment> {
    appointments.iter().map(format_appointment).collect()
}

pub fn format_appointment(appointment: &Appointment) -> FormattedAppointment {
    // Negative durations would put the end before the start.
    let duration_minutes = appointment.duration.max(0);
    let start = appointment.start;
    let end = add_minutes(start, duration_minutes);
    let start_time = clock_label(start);
    let end_time = clock_label(end);
    let tone = StatusTone::from(&appointment.status);

    FormattedAppointment {
        id: appointment.id.clone(),
        title: appointment.services.join(", "),
        date: start.date(),
        start,
        end,
        time_display: format!("{start_time} - {end_time}"),
        start_time,
        end_time,
        duration_minutes,
        status: appointment.status.clone(),
        tone,
        color: tone.classes(),
        patient_id: appointment.patient_id.clone(),
        provider_id: appointment.provider_id.clone(),
        location: appointment.location.clone(),
    }
}

/// `start + minutes`, saturating at the latest representable date-time.
pub(crate) fn add_minutes(start: NaiveDateTime, minutes: i64) -> NaiveDateTime {
    Duration::try_minutes(minutes)
        .and_then(|delta| start.checked_add_signed(delta))
        .unwrap_or(NaiveDateTime::MAX)
}

fn clock_label(value: NaiveDateTime) -> String {
    value.format("%H:%M").to_string()
}
