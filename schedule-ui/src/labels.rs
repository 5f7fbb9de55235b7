//! Text and inline styles used by the calendar markup.

use chrono::Datelike;
use schedule_core::{PlacedAppointment, WeekRange};

/// "Aug 24 - Aug 30, 2025", or with both years when the week spans two.
pub fn range_title(range: &WeekRange) -> String {
    if range.start.year() == range.end.year() {
        format!(
            "{} - {}",
            range.start.format("%b %-d"),
            range.end.format("%b %-d, %Y")
        )
    } else {
        format!(
            "{} - {}",
            range.start.format("%b %-d, %Y"),
            range.end.format("%b %-d, %Y")
        )
    }
}

/// Absolute position of an appointment inside its hour cell.
pub fn entry_style(placed: &PlacedAppointment) -> String {
    let lanes = placed.lane_count.max(1);
    format!(
        "top: {:.2}px; height: {:.2}px; left: calc({} * 100% / {lanes}); width: calc(100% / {lanes});",
        placed.offset_in_row_px, placed.height_px, placed.lane
    )
}

pub fn entry_label(placed: &PlacedAppointment) -> String {
    let appointment = &placed.appointment;
    if appointment.title.is_empty() {
        format!("{} ({})", appointment.time_display, appointment.status)
    } else {
        format!("{} {}", appointment.time_display, appointment.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use schedule_core::{format_appointment, week_range, Appointment, AppointmentStatus};

    fn placed(title: &[&str], lane: usize, lane_count: usize) -> PlacedAppointment {
        let appointment = format_appointment(&Appointment {
            id: "a".into(),
            start: "2025-08-26T09:30:00".parse().unwrap(),
            duration: 90,
            services: title.iter().map(|s| s.to_string()).collect(),
            status: AppointmentStatus::Cancelled,
            patient_id: None,
            provider_id: None,
            fee: None,
            billing_type: None,
            location: None,
            is_repeat: false,
        });
        PlacedAppointment {
            appointment,
            top_px: 32.0,
            offset_in_row_px: 32.0,
            height_px: 96.0,
            lane,
            lane_count,
        }
    }

    #[test]
    fn titles_for_week_ranges() {
        let range = week_range(NaiveDate::from_ymd_opt(2025, 8, 26).unwrap());
        assert_eq!(range_title(&range), "Aug 24 - Aug 30, 2025");

        let range = week_range(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(range_title(&range), "Dec 28, 2025 - Jan 3, 2026");
    }

    #[test]
    fn style_splits_width_between_lanes() {
        assert_eq!(
            entry_style(&placed(&["Consult"], 1, 2)),
            "top: 32.00px; height: 96.00px; left: calc(1 * 100% / 2); width: calc(100% / 2);"
        );
    }

    #[test]
    fn blank_titles_fall_back_to_status() {
        assert_eq!(entry_label(&placed(&[], 0, 1)), "09:30 - 11:00 (Cancelled)");
        assert_eq!(entry_label(&placed(&["Consult"], 0, 1)), "09:30 - 11:00 Consult");
    }
}
