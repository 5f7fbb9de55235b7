use chrono::NaiveDate;
use schedule_core::{
    Appointment, CalendarConfig, CalendarScreen, CalendarView, Resource, ScheduleError,
};

use crate::dispatch::{Dispatch, Dispatcher};
use crate::transport::Transport;

/// Week calendar bound to the appointments slice.
///
/// Navigation moves the anchor by a week and fetches the new range; the
/// screen is recomputed from whatever the slice holds at that moment.
pub struct CalendarSession<T> {
    dispatcher: Dispatcher<T>,
    view: CalendarView,
    config: CalendarConfig,
}

impl<T: Transport> CalendarSession<T> {
    pub fn new(
        dispatcher: Dispatcher<T>,
        anchor: NaiveDate,
        config: CalendarConfig,
    ) -> Result<Self, ScheduleError> {
        config.validate()?;
        Ok(Self {
            dispatcher,
            view: CalendarView::new(anchor),
            config,
        })
    }

    pub fn view(&self) -> &CalendarView {
        &self.view
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Fetches the visible week.
    pub async fn load(&self) -> Dispatch {
        self.dispatcher
            .fetch_appointments(self.view.visible_range())
            .await
    }

    pub async fn next_week(&mut self) -> Dispatch {
        self.view.next_week();
        self.load().await
    }

    pub async fn previous_week(&mut self) -> Dispatch {
        self.view.previous_week();
        self.load().await
    }

    /// Re-dispatches the same fetch after a failure.
    pub async fn retry(&self) -> Dispatch {
        self.load().await
    }

    pub async fn screen(&self) -> Result<CalendarScreen, ScheduleError> {
        let state = self.dispatcher.state();
        let state = state.lock().await;
        let slice = Appointment::slice(&state);
        CalendarScreen::build(&self.view, slice.flags(), slice.data().items(), &self.config)
    }
}
