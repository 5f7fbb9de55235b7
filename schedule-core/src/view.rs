//! Week navigation state and the screen model fed to the calendar UI.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dates::{week_range, WeekRange};
use crate::format::{format_appointments, FormattedAppointment};
use crate::grid::{layout_week, WeekLayout};
use crate::model::Appointment;
use crate::store::LifecycleFlags;
use crate::{CalendarConfig, ScheduleError};

/// Anchor date of the visible week.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarView {
    current_week: NaiveDate,
}

impl CalendarView {
    pub fn new(anchor: NaiveDate) -> Self {
        Self {
            current_week: anchor,
        }
    }

    pub fn current_week(&self) -> NaiveDate {
        self.current_week
    }

    pub fn visible_range(&self) -> WeekRange {
        week_range(self.current_week)
    }

    pub fn previous_week(&mut self) -> WeekRange {
        self.current_week -= Duration::days(7);
        self.visible_range()
    }

    pub fn next_week(&mut self) -> WeekRange {
        self.current_week += Duration::days(7);
        self.visible_range()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScreenStatus {
    /// Nothing requested yet.
    Idle,
    /// A fetch is in flight; the grid shows a loading indicator.
    Loading,
    /// The last fetch failed; the banner holds the message.
    Failed,
    Ready,
}

/// What the calendar renders for one week.
///
/// `layout` only holds appointments when `status` is `Ready`; in the other
/// states it is the empty frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarScreen {
    pub range: WeekRange,
    pub status: ScreenStatus,
    pub banner: Option<String>,
    pub layout: WeekLayout,
}

impl CalendarScreen {
    pub fn build(
        view: &CalendarView,
        flags: &LifecycleFlags,
        appointments: &[Appointment],
        config: &CalendarConfig,
    ) -> Result<Self, ScheduleError> {
        config.validate()?;
        let range = view.visible_range();

        let (status, banner) = if flags.loading {
            (ScreenStatus::Loading, None)
        } else if let Some(message) = &flags.error {
            (ScreenStatus::Failed, Some(message.clone()))
        } else if flags.success {
            (ScreenStatus::Ready, None)
        } else {
            (ScreenStatus::Idle, None)
        };

        let layout = match status {
            ScreenStatus::Ready => {
                layout_week(&format_appointments(appointments), view.current_week(), config)?
            }
            _ => WeekLayout::empty(range, config),
        };

        Ok(Self {
            range,
            status,
            banner,
            layout,
        })
    }

    /// Forwards the appointment with `id` to `on_select`. Returns false when
    /// it is not on screen.
    pub fn select(&self, id: &str, on_select: impl FnOnce(&FormattedAppointment)) -> bool {
        match self.layout.appointment(id) {
            Some(appointment) => {
                on_select(appointment);
                true
            }
            None => false,
        }
    }
}
