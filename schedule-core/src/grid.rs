//! Week grid: hour rows × seven day columns.
//!
//! An appointment is placed once, in the row of its start hour. Its
//! height is stretched from the duration instead of repeating it on the
//! following rows, and never drops below one row. Appointments that start
//! outside the hour window are left out.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dates::{is_same_day, week_range, WeekRange};
use crate::format::{add_minutes, FormattedAppointment};
use crate::{CalendarConfig, ScheduleError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayColumn {
    pub date: NaiveDate,
    /// Short weekday name ("Sun").
    pub weekday: String,
    /// Month and day ("Aug 26").
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourRow {
    pub hour: u32,
    /// "09:00"
    pub label: String,
    /// One cell per day column.
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridCell {
    pub date: NaiveDate,
    pub entries: Vec<PlacedAppointment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedAppointment {
    pub appointment: FormattedAppointment,
    /// Distance from the top of the hour window.
    pub top_px: f64,
    /// Distance from the top of the start-hour row.
    pub offset_in_row_px: f64,
    pub height_px: f64,
    /// Side-by-side slot among overlapping appointments of the same day.
    pub lane: usize,
    /// Number of slots in this appointment's overlap group.
    pub lane_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekLayout {
    pub range: WeekRange,
    pub days: Vec<DayColumn>,
    pub rows: Vec<HourRow>,
    pub row_height_px: f64,
    /// Appointments of this week that start outside the hour window.
    pub hidden: usize,
}

impl WeekLayout {
    /// Grid frame without any appointment.
    pub fn empty(range: WeekRange, config: &CalendarConfig) -> Self {
        let days: Vec<DayColumn> = range.days().map(day_column).collect();
        let rows = config
            .hours()
            .map(|hour| HourRow {
                hour,
                label: format!("{hour:02}:00"),
                cells: days
                    .iter()
                    .map(|day| GridCell {
                        date: day.date,
                        entries: Vec::new(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            range,
            days,
            rows,
            row_height_px: config.row_height_px,
            hidden: 0,
        }
    }

    /// Placed appointments in row-major order.
    pub fn placements(&self) -> impl Iterator<Item = &PlacedAppointment> {
        self.rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .flat_map(|cell| cell.entries.iter())
    }

    pub fn appointment(&self, id: &str) -> Option<&FormattedAppointment> {
        self.placements()
            .map(|placed| &placed.appointment)
            .find(|appointment| appointment.id == id)
    }

    pub fn cell(&self, hour: u32, date: NaiveDate) -> Option<&GridCell> {
        self.rows
            .iter()
            .find(|row| row.hour == hour)?
            .cells
            .iter()
            .find(|cell| cell.date == date)
    }

    pub fn is_empty(&self) -> bool {
        self.placements().next().is_none()
    }
}

/// Lays out `appointments` on the week that contains `anchor`.
pub fn layout_week(
    appointments: &[FormattedAppointment],
    anchor: NaiveDate,
    config: &CalendarConfig,
) -> Result<WeekLayout, ScheduleError> {
    config.validate()?;

    let range = week_range(anchor);
    let mut layout = WeekLayout::empty(range, config);
    let px_per_minute = config.px_per_minute();

    for (column, day) in range.days().enumerate() {
        let visible: Vec<(usize, &FormattedAppointment)> = appointments
            .iter()
            .enumerate()
            .filter(|(_, appointment)| is_same_day(&appointment.date, &day))
            .filter(|(_, appointment)| {
                let shown = in_window(appointment.start, config);
                if !shown {
                    layout.hidden += 1;
                }
                shown
            })
            .collect();

        let lanes = assign_lanes(&visible);

        for ((_, appointment), (lane, lane_count)) in visible.into_iter().zip(lanes) {
            let hour = appointment.start.hour();
            let minutes_since_start = i64::from((hour - config.start_hour) * 60 + appointment.start.minute());
            let placed = PlacedAppointment {
                appointment: appointment.clone(),
                top_px: minutes_since_start as f64 * px_per_minute,
                offset_in_row_px: f64::from(appointment.start.minute()) * px_per_minute,
                height_px: (appointment.duration_minutes as f64 * px_per_minute)
                    .max(config.row_height_px),
                lane,
                lane_count,
            };
            let row = (hour - config.start_hour) as usize;
            layout.rows[row].cells[column].entries.push(placed);
        }
    }

    if layout.hidden > 0 {
        debug!(
            hidden = layout.hidden,
            start_hour = config.start_hour,
            end_hour = config.end_hour,
            "appointments outside the calendar window were not placed"
        );
    }

    Ok(layout)
}

fn in_window(start: NaiveDateTime, config: &CalendarConfig) -> bool {
    let hour = start.hour();
    config.start_hour <= hour && hour < config.end_hour
}

/// Greedy interval partitioning over one day's appointments.
///
/// Returns `(lane, lane_count)` per input position. Each appointment
/// occupies at least one hour visually, so that is the minimum span used
/// for overlap.
fn assign_lanes(day: &[(usize, &FormattedAppointment)]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..day.len()).collect();
    order.sort_by_key(|&position| (day[position].1.start, day[position].0));

    let mut result = vec![(0, 1); day.len()];
    let mut lane_ends: Vec<NaiveDateTime> = Vec::new();
    let mut group: Vec<usize> = Vec::new();
    let mut group_end: Option<NaiveDateTime> = None;

    for position in order {
        let appointment = day[position].1;
        let start = appointment.start;
        let end = visual_end(appointment);

        if group_end.is_some_and(|group_end| start >= group_end) {
            close_group(&mut result, &group, lane_ends.len());
            group.clear();
            lane_ends.clear();
        }

        let lane = match lane_ends.iter().position(|lane_end| *lane_end <= start) {
            Some(free) => {
                lane_ends[free] = end;
                free
            }
            None => {
                lane_ends.push(end);
                lane_ends.len() - 1
            }
        };

        result[position].0 = lane;
        group.push(position);
        group_end = Some(group_end.map_or(end, |current| current.max(end)));
    }
    close_group(&mut result, &group, lane_ends.len());

    result
}

fn close_group(result: &mut [(usize, usize)], group: &[usize], lane_count: usize) {
    for &position in group {
        result[position].1 = lane_count.max(1);
    }
}

fn visual_end(appointment: &FormattedAppointment) -> NaiveDateTime {
    add_minutes(appointment.start, appointment.duration_minutes.max(60))
}

fn day_column(date: NaiveDate) -> DayColumn {
    DayColumn {
        date,
        weekday: date.weekday().to_string(),
        label: date.format("%b %-d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::format_appointment;
    use crate::model::{Appointment, AppointmentStatus};

    fn formatted(id: &str, start: &str, duration: i64) -> FormattedAppointment {
        format_appointment(&Appointment {
            id: id.to_string(),
            start: start.parse().unwrap(),
            duration,
            services: vec!["Consultation".to_string()],
            status: AppointmentStatus::Scheduled,
            patient_id: None,
            provider_id: None,
            fee: None,
            billing_type: None,
            location: None,
            is_repeat: false,
        })
    }

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 26).unwrap()
    }

    #[test]
    fn frame_has_seven_days_and_nine_rows() {
        let layout = layout_week(&[], anchor(), &CalendarConfig::default()).unwrap();
        assert_eq!(layout.days.len(), 7);
        assert_eq!(layout.days[0].date, NaiveDate::from_ymd_opt(2025, 8, 24).unwrap());
        assert_eq!(layout.days[0].weekday, "Sun");
        assert_eq!(layout.days[2].label, "Aug 26");
        assert_eq!(layout.rows.len(), 9);
        assert_eq!(layout.rows[0].label, "09:00");
        assert_eq!(layout.rows[8].label, "17:00");
        assert!(layout.rows.iter().all(|row| row.cells.len() == 7));
        assert!(layout.is_empty());
    }

    #[test]
    fn appointment_is_placed_once_on_its_start_row() {
        let items = vec![formatted("long", "2025-08-26T10:30:00", 150)];
        let layout = layout_week(&items, anchor(), &CalendarConfig::default()).unwrap();

        assert_eq!(layout.placements().count(), 1);
        let cell = layout.cell(10, anchor()).unwrap();
        assert_eq!(cell.entries.len(), 1);
        let placed = &cell.entries[0];
        // 90 minutes past 09:00 at 64px per hour.
        assert!((placed.top_px - 96.0).abs() < 1e-9);
        assert!((placed.offset_in_row_px - 32.0).abs() < 1e-9);
        assert!((placed.height_px - 160.0).abs() < 1e-9);
        assert!(layout.cell(11, anchor()).unwrap().entries.is_empty());
    }

    #[test]
    fn short_appointments_get_one_row_of_height() {
        let items = vec![formatted("short", "2025-08-26T09:00:00", 10)];
        let layout = layout_week(&items, anchor(), &CalendarConfig::default()).unwrap();
        let placed = layout.placements().next().unwrap();
        assert_eq!(placed.height_px, 64.0);
    }

    #[test]
    fn window_boundaries() {
        let items = vec![
            formatted("last-row", "2025-08-26T17:00:00", 30),
            formatted("before", "2025-08-26T08:59:00", 30),
            formatted("closing", "2025-08-26T18:00:00", 30),
            formatted("first-row", "2025-08-26T09:00:00", 30),
        ];
        let layout = layout_week(&items, anchor(), &CalendarConfig::default()).unwrap();

        assert_eq!(layout.cell(17, anchor()).unwrap().entries[0].appointment.id, "last-row");
        assert_eq!(layout.cell(9, anchor()).unwrap().entries[0].appointment.id, "first-row");
        assert!(layout.appointment("before").is_none());
        assert!(layout.appointment("closing").is_none());
        assert_eq!(layout.hidden, 2);
    }

    #[test]
    fn other_weeks_are_ignored() {
        let items = vec![
            formatted("prev", "2025-08-23T10:00:00", 30),
            formatted("next", "2025-08-31T10:00:00", 30),
            formatted("sat", "2025-08-30T10:00:00", 30),
        ];
        let layout = layout_week(&items, anchor(), &CalendarConfig::default()).unwrap();
        assert_eq!(layout.placements().count(), 1);
        assert_eq!(layout.hidden, 0);
        let saturday = NaiveDate::from_ymd_opt(2025, 8, 30).unwrap();
        assert_eq!(layout.cell(10, saturday).unwrap().entries.len(), 1);
    }

    #[test]
    fn overlapping_appointments_share_the_width() {
        let items = vec![
            formatted("a", "2025-08-26T09:00:00", 90),
            formatted("b", "2025-08-26T09:30:00", 30),
            formatted("c", "2025-08-26T10:30:00", 30),
            formatted("d", "2025-08-26T13:00:00", 30),
        ];
        let layout = layout_week(&items, anchor(), &CalendarConfig::default()).unwrap();
        let lanes: Vec<(String, usize, usize)> = layout
            .placements()
            .map(|p| (p.appointment.id.clone(), p.lane, p.lane_count))
            .collect();

        // b overlaps a; c starts exactly when both boxes end.
        assert!(lanes.contains(&("a".into(), 0, 2)));
        assert!(lanes.contains(&("b".into(), 1, 2)));
        assert!(lanes.contains(&("c".into(), 0, 1)));
        assert!(lanes.contains(&("d".into(), 0, 1)));
    }

    #[test]
    fn same_cell_keeps_input_order() {
        let items = vec![
            formatted("second", "2025-08-26T09:40:00", 15),
            formatted("first", "2025-08-26T09:05:00", 15),
        ];
        let layout = layout_week(&items, anchor(), &CalendarConfig::default()).unwrap();
        let ids: Vec<_> = layout
            .cell(9, anchor())
            .unwrap()
            .entries
            .iter()
            .map(|p| p.appointment.id.as_str())
            .collect();
        assert_eq!(ids, ["second", "first"]);
        let lanes: Vec<_> = layout.cell(9, anchor()).unwrap().entries.iter().map(|p| p.lane).collect();
        assert_eq!(lanes, [1, 0]);
    }

    #[test]
    fn custom_window_and_row_height() {
        let config = CalendarConfig {
            start_hour: 7,
            end_hour: 20,
            row_height_px: 120.0,
        };
        let items = vec![formatted("early", "2025-08-26T07:15:00", 120)];
        let layout = layout_week(&items, anchor(), &config).unwrap();
        assert_eq!(layout.rows.len(), 13);
        let placed = layout.placements().next().unwrap();
        assert_eq!(placed.top_px, 30.0);
        assert_eq!(placed.height_px, 240.0);
    }

    #[test]
    fn huge_duration_is_placed_with_saturated_height() {
        let items = [
            formatted("huge", "2025-08-26T10:00:00", i64::MAX),
            formatted("next", "2025-08-26T11:00:00", 30),
        ];
        let layout = layout_week(&items, anchor(), &CalendarConfig::default()).unwrap();
        let lanes: Vec<_> = layout.placements().map(|p| (p.lane, p.lane_count)).collect();
        assert_eq!(lanes, [(0, 2), (1, 2)]);
        assert!(layout.placements().all(|p| p.height_px.is_finite()));
    }

    #[test]
    fn invalid_config_is_an_error() {
        let config = CalendarConfig {
            start_hour: 12,
            end_hour: 12,
            row_height_px: 64.0,
        };
        assert!(layout_week(&[], anchor(), &config).is_err());
    }
}
