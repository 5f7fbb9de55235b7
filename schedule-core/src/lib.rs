//! Core view-model logic for the practice calendar: appointment records,
//! the calendar-ready formatter, the week grid layout and the per-domain
//! async lifecycle store.

pub mod dates;
pub mod format;
pub mod grid;
pub mod model;
pub mod store;
pub mod view;

use serde::{Deserialize, Serialize};

pub use dates::{is_same_day, week_range, week_start, WeekRange};
pub use format::{format_appointment, format_appointments, FormattedAppointment, StatusTone, StyleClasses};
pub use grid::{layout_week, DayColumn, GridCell, HourRow, PlacedAppointment, WeekLayout};
pub use model::{
    Appointment, AppointmentStatus, ClinicalNote, Document, Entity, LabResult, Medication, Meeting,
    Patient, Vital,
};
pub use store::{
    AppState, Collection, EntityList, LifecycleFlags, Operation, PatientIndex, Phase, Resource,
    Scope, Slice, SupersessionPolicy, Ticket,
};
pub use view::{CalendarScreen, CalendarView, ScreenStatus};

/// Display window and sizing of the week grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarConfig {
    /// First hour row shown (inclusive).
    pub start_hour: u32,
    /// Hour at which the window closes (exclusive).
    pub end_hour: u32,
    /// Pixel height of one hour row.
    pub row_height_px: f64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 18,
            row_height_px: 64.0,
        }
    }
}

impl CalendarConfig {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.start_hour >= self.end_hour {
            return Err(ScheduleError::InvalidConfig(format!(
                "start_hour {} must be before end_hour {}",
                self.start_hour, self.end_hour
            )));
        }
        if self.end_hour > 24 {
            return Err(ScheduleError::InvalidConfig(format!(
                "end_hour {} is past midnight",
                self.end_hour
            )));
        }
        if !(self.row_height_px.is_finite() && self.row_height_px > 0.0) {
            return Err(ScheduleError::InvalidConfig(format!(
                "row_height_px must be positive, got {}",
                self.row_height_px
            )));
        }
        Ok(())
    }

    pub fn px_per_minute(&self) -> f64 {
        self.row_height_px / 60.0
    }

    /// Hour rows of the grid, in display order.
    pub fn hours(&self) -> std::ops::Range<u32> {
        self.start_hour..self.end_hour
    }

    /// Last hour an appointment may start in and still be shown.
    pub fn last_hour(&self) -> u32 {
        self.end_hour.saturating_sub(1)
    }
}

/// Errors raised by the calendar view model.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid calendar config: {0}")]
    InvalidConfig(String),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Could not read data: {0}")]
    Parse(String),
}
