//! Framework-neutral WASM <-> JavaScript bridge for the calendar view model.

use chrono::NaiveDate;
use schedule_core::{format_appointments, layout_week, Appointment, CalendarConfig, ScheduleError};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct JsCalendarConfig {
    #[serde(default)]
    start_hour: Option<u32>,
    #[serde(default)]
    end_hour: Option<u32>,
    #[serde(default)]
    row_height_px: Option<f64>,
}

impl From<JsCalendarConfig> for CalendarConfig {
    fn from(cfg: JsCalendarConfig) -> Self {
        let mut base = CalendarConfig::default();
        if let Some(hour) = cfg.start_hour {
            base.start_hour = hour;
        }
        if let Some(hour) = cfg.end_hour {
            base.end_hour = hour;
        }
        if let Some(height) = cfg.row_height_px {
            base.row_height_px = height;
        }
        base
    }
}

/// Raw appointments (array or `{ appointments }` envelope) to formatted ones.
#[wasm_bindgen(js_name = formatAppointments)]
pub fn format_appointments_js(appointments: JsValue) -> Result<JsValue, JsValue> {
    init_panic_hook();
    let appointments = read_appointments(appointments)?;
    to_value(&format_appointments(&appointments))
        .map_err(|err| JsValue::from_str(&format!("Could not serialize appointments: {err}")))
}

/// Sunday..Saturday range around an ISO date.
#[wasm_bindgen(js_name = weekRange)]
pub fn week_range_js(date: &str) -> Result<JsValue, JsValue> {
    let date = parse_date(date)?;
    to_value(&schedule_core::week_range(date))
        .map_err(|err| JsValue::from_str(&format!("Could not serialize week range: {err}")))
}

/// Formats and lays out the week containing `anchor`.
#[wasm_bindgen(js_name = layoutWeek)]
pub fn layout_week_js(
    appointments: JsValue,
    anchor: &str,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    init_panic_hook();
    let appointments = read_appointments(appointments)?;
    let anchor = parse_date(anchor)?;

    let cfg = match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsCalendarConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            CalendarConfig::from(cfg)
        }
        _ => CalendarConfig::default(),
    };

    let layout = layout_week(&format_appointments(&appointments), anchor, &cfg)
        .map_err(|err| JsValue::from_str(&format_schedule_error(err)))?;

    to_value(&layout).map_err(|err| JsValue::from_str(&format!("Could not serialize layout: {err}")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AppointmentInput {
    List(Vec<Appointment>),
    Envelope { appointments: Vec<Appointment> },
}

impl From<AppointmentInput> for Vec<Appointment> {
    fn from(input: AppointmentInput) -> Self {
        match input {
            AppointmentInput::List(items) | AppointmentInput::Envelope { appointments: items } => items,
        }
    }
}

fn read_appointments(value: JsValue) -> Result<Vec<Appointment>, JsValue> {
    let json = from_value::<serde_json::Value>(value)
        .map_err(|err| JsValue::from_str(&format!("Could not read appointments: {err}")))?;
    parse_appointments(json).map_err(|err| JsValue::from_str(&format_schedule_error(err)))
}

fn parse_appointments(json: serde_json::Value) -> Result<Vec<Appointment>, ScheduleError> {
    serde_json::from_value::<AppointmentInput>(json)
        .map(Vec::from)
        .map_err(|err| ScheduleError::Parse(err.to_string()))
}

fn parse_date(raw: &str) -> Result<NaiveDate, JsValue> {
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d")
        .map_err(|err| JsValue::from_str(&format!("Invalid date '{raw}': {err}")))
}

fn format_schedule_error(err: ScheduleError) -> String {
    format!("Calendar error: {err}")
}

fn init_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}
