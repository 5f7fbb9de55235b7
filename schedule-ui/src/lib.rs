//! Yew week calendar for WebAssembly hosts.

mod labels;

pub use labels::{entry_label, entry_style, range_title};

#[cfg(target_arch = "wasm32")]
mod styles;

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use crate::labels::{entry_label, entry_style, range_title};
    use crate::styles;
    use schedule_core::{
        CalendarScreen, DayColumn, FormattedAppointment, GridCell, HourRow, PlacedAppointment,
        ScreenStatus,
    };
    use serde_wasm_bindgen::{from_value, to_value};
    use wasm_bindgen::prelude::*;
    use web_sys::{console, Document, Element, Window};
    use yew::prelude::*;

    /// Toolbar and banner actions forwarded to the host.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Navigation {
        Previous,
        Next,
        Retry,
    }

    impl Navigation {
        fn as_str(self) -> &'static str {
            match self {
                Navigation::Previous => "previous",
                Navigation::Next => "next",
                Navigation::Retry => "retry",
            }
        }
    }

    #[derive(Properties, PartialEq)]
    pub struct WeekCalendarProps {
        pub screen: CalendarScreen,
        #[prop_or_default]
        pub on_select: Callback<FormattedAppointment>,
        #[prop_or_default]
        pub on_navigate: Callback<Navigation>,
    }

    #[function_component(WeekCalendar)]
    pub fn week_calendar(props: &WeekCalendarProps) -> Html {
        let screen = &props.screen;

        use_effect_with((), |_| {
            if let Some(window) = web_sys::window() {
                if let Some(document) = window.document() {
                    if let Err(err) = styles::ensure_styles(&document) {
                        console::error_1(&err);
                    }
                }
            }
            || ()
        });

        let navigate = |target: Navigation| {
            let on_navigate = props.on_navigate.clone();
            Callback::from(move |_: MouseEvent| on_navigate.emit(target))
        };
        let loading = screen.status == ScreenStatus::Loading;
        let row_height = format!("--calendar-row-height: {}px;", screen.layout.row_height_px);

        html! {
            <div class="calendar-root">
                <header class="calendar-toolbar">
                    <button type="button" onclick={navigate(Navigation::Previous)} aria-label="Previous week">{"‹"}</button>
                    <h2 class="calendar-title">{ range_title(&screen.range) }</h2>
                    <button type="button" onclick={navigate(Navigation::Next)} aria-label="Next week">{"›"}</button>
                </header>
                {
                    match &screen.banner {
                        Some(message) if screen.status == ScreenStatus::Failed => html! {
                            <div class="calendar-banner" role="alert">
                                <span>{ message.clone() }</span>
                                <button type="button" onclick={navigate(Navigation::Retry)}>{"Try again"}</button>
                            </div>
                        },
                        _ => Html::default(),
                    }
                }
                <div class={classes!("calendar-grid", loading.then_some("is-loading"))} style={row_height} aria-busy={loading.to_string()}>
                    <div class="calendar-corner"></div>
                    { for screen.layout.days.iter().map(render_day) }
                    { for screen.layout.rows.iter().map(|row| render_row(row, &props.on_select)) }
                    {
                        if loading {
                            html! { <div class="calendar-loading">{"Loading appointments…"}</div> }
                        } else {
                            Html::default()
                        }
                    }
                </div>
                {
                    if screen.layout.hidden > 0 {
                        html! {
                            <p class="calendar-hidden">
                                { format!("{} appointment(s) outside working hours", screen.layout.hidden) }
                            </p>
                        }
                    } else {
                        Html::default()
                    }
                }
            </div>
        }
    }

    fn render_day(day: &DayColumn) -> Html {
        html! {
            <div class="calendar-day-header">
                <span class="calendar-weekday">{ day.weekday.clone() }</span>
                <span class="calendar-date">{ day.label.clone() }</span>
            </div>
        }
    }

    fn render_row(row: &HourRow, on_select: &Callback<FormattedAppointment>) -> Html {
        html! {
            <>
                <div class="calendar-hour">{ row.label.clone() }</div>
                { for row.cells.iter().map(|cell| render_cell(cell, on_select)) }
            </>
        }
    }

    fn render_cell(cell: &GridCell, on_select: &Callback<FormattedAppointment>) -> Html {
        html! {
            <div class="calendar-cell" data-date={cell.date.to_string()}>
                { for cell.entries.iter().map(|placed| render_entry(placed, on_select)) }
            </div>
        }
    }

    fn render_entry(placed: &PlacedAppointment, on_select: &Callback<FormattedAppointment>) -> Html {
        let appointment = &placed.appointment;
        let onclick = {
            let on_select = on_select.clone();
            let appointment = appointment.clone();
            Callback::from(move |_: MouseEvent| on_select.emit(appointment.clone()))
        };

        html! {
            <button
                type="button"
                class={classes!(
                    "calendar-appointment",
                    appointment.color.fill.clone(),
                    appointment.color.border.clone(),
                    appointment.color.text.clone()
                )}
                style={entry_style(placed)}
                data-status={appointment.status.to_string()}
                title={appointment.location.clone().unwrap_or_default()}
                onclick={onclick}
            >
                { entry_label(placed) }
            </button>
        }
    }

    fn report(result: Result<JsValue, JsValue>) {
        if let Err(err) = result {
            console::error_1(&err);
        }
    }

    #[wasm_bindgen]
    pub fn mount_week_calendar(
        selector: &str,
        screen: JsValue,
        on_select: Option<js_sys::Function>,
        on_navigate: Option<js_sys::Function>,
    ) -> Result<(), JsValue> {
        let window: Window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("Could not access document"))?;

        let target: Element = document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("Invalid selector: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("No element matches the selector"))?;

        let screen: CalendarScreen = from_value(screen)?;

        let on_select = Callback::from(move |appointment: FormattedAppointment| {
            let Some(handler) = &on_select else {
                return;
            };
            match to_value(&appointment) {
                Ok(value) => report(handler.call1(&JsValue::NULL, &value)),
                Err(err) => console::error_1(&JsValue::from_str(&err.to_string())),
            }
        });
        let on_navigate = Callback::from(move |target: Navigation| {
            if let Some(handler) = &on_navigate {
                report(handler.call1(&JsValue::NULL, &JsValue::from_str(target.as_str())));
            }
        });

        yew::Renderer::<WeekCalendar>::with_root_and_props(
            target,
            WeekCalendarProps {
                screen,
                on_select,
                on_navigate,
            },
        )
        .render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::{mount_week_calendar, Navigation, WeekCalendar, WeekCalendarProps};

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_week_calendar(
    _: &str,
    _: wasm_bindgen::JsValue,
    _: Option<wasm_bindgen::JsValue>,
    _: Option<wasm_bindgen::JsValue>,
) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "schedule-ui only supports the wasm32 target",
    ))
}
