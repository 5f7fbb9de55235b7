use std::fs;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use schedule_core::{format_appointments, layout_week, Appointment, CalendarConfig};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[derive(Deserialize)]
struct Envelope {
    appointments: Vec<Appointment>,
}

fn load_week() -> Vec<Appointment> {
    let raw = fs::read_to_string(fixture_path("week_appointments.json"))
        .expect("could not read appointment fixture");
    serde_json::from_str::<Envelope>(&raw)
        .expect("fixture is not a valid envelope")
        .appointments
}

#[test]
fn formatted_week_matches_golden() {
    let formatted = format_appointments(&load_week());
    let actual = serde_json::to_value(&formatted).expect("could not serialize formatted week");

    let expected = fs::read_to_string(fixture_path("week_formatted.json"))
        .expect("could not read golden file");
    let expected: Value = serde_json::from_str(&expected).expect("golden file is not valid JSON");

    assert_eq!(actual, expected);
}

#[test]
fn fixture_week_layout() {
    let formatted = format_appointments(&load_week());
    let anchor = NaiveDate::from_ymd_opt(2025, 8, 27).unwrap();
    let layout = layout_week(&formatted, anchor, &CalendarConfig::default())
        .expect("default config is valid");

    // apt-103 starts at 08:30, before the window opens.
    assert_eq!(layout.hidden, 1);
    assert!(layout.appointment("apt-103").is_none());

    let thursday = NaiveDate::from_ymd_opt(2025, 8, 28).unwrap();
    let late = &layout.cell(17, thursday).expect("17:00 row exists").entries[0];
    assert_eq!(late.appointment.id, "apt-102");
    // 8h50 past 09:00 at 64px per hour.
    assert!((late.top_px - 565.333_333_333).abs() < 1e-6);
    assert_eq!(late.height_px, 64.0);

    let ids: Vec<_> = layout.placements().map(|p| p.appointment.id.as_str()).collect();
    assert_eq!(ids, ["apt-100", "apt-101", "apt-102"]);
}
