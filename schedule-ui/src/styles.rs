#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-schedule-ui]";

/// Layout rules for the week grid. Status colors come from the utility
/// classes carried on each appointment.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --calendar-font-family: 'Inter', system-ui, -apple-system, 'Segoe UI', sans-serif;
  --calendar-border: #e5e7eb;
  --calendar-muted: #6b7280;
  --calendar-heading: #111827;
  --calendar-surface: #f9fafb;
  --calendar-danger-bg: #fef2f2;
  --calendar-danger-text: #b91c1c;
}

.calendar-root {
  font-family: var(--calendar-font-family);
  color: var(--calendar-heading);
  display: flex;
  flex-direction: column;
  gap: 12px;
}

.calendar-toolbar {
  display: flex;
  align-items: center;
  gap: 12px;
}

.calendar-toolbar button {
  border: 1px solid var(--calendar-border);
  background: #fff;
  border-radius: 8px;
  padding: 4px 12px;
  cursor: pointer;
}

.calendar-title {
  margin: 0;
  font-size: 1.125rem;
}

.calendar-banner {
  display: flex;
  justify-content: space-between;
  align-items: center;
  padding: 8px 12px;
  border-radius: 8px;
  background: var(--calendar-danger-bg);
  color: var(--calendar-danger-text);
}

.calendar-grid {
  position: relative;
  display: grid;
  grid-template-columns: 64px repeat(7, minmax(0, 1fr));
  grid-auto-rows: var(--calendar-row-height, 64px);
  border-top: 1px solid var(--calendar-border);
  border-left: 1px solid var(--calendar-border);
}

.calendar-grid.is-loading .calendar-cell {
  opacity: 0.4;
}

.calendar-corner,
.calendar-day-header,
.calendar-hour,
.calendar-cell {
  border-right: 1px solid var(--calendar-border);
  border-bottom: 1px solid var(--calendar-border);
}

.calendar-day-header {
  display: flex;
  flex-direction: column;
  align-items: center;
  justify-content: center;
  background: var(--calendar-surface);
}

.calendar-weekday {
  font-size: 0.75rem;
  color: var(--calendar-muted);
  text-transform: uppercase;
}

.calendar-hour {
  font-size: 0.75rem;
  color: var(--calendar-muted);
  padding: 4px 8px;
}

.calendar-cell {
  position: relative;
  overflow: visible;
}

.calendar-appointment {
  position: absolute;
  box-sizing: border-box;
  z-index: 1;
  overflow: hidden;
  border-width: 0 0 0 4px;
  border-style: solid;
  border-radius: 6px;
  padding: 2px 6px;
  font-size: 0.75rem;
  text-align: left;
  cursor: pointer;
}

.bg-blue-100 { background-color: #dbeafe; }
.border-blue-500 { border-color: #3b82f6; }
.text-blue-800 { color: #1e40af; }
.bg-gray-100 { background-color: #f3f4f6; }
.border-gray-400 { border-color: #9ca3af; }
.text-gray-700 { color: #374151; }

.calendar-loading {
  position: absolute;
  inset: 0;
  display: flex;
  align-items: center;
  justify-content: center;
  color: var(--calendar-muted);
  z-index: 2;
}

.calendar-hidden {
  margin: 0;
  font-size: 0.75rem;
  color: var(--calendar-muted);
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Document has no <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-schedule-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
