//! Client side of the practice API: transport, response envelopes and
//! the dispatcher that runs each call through the store's lifecycle.

mod calendar;
mod config;
mod dispatch;
pub mod envelope;
mod error;
mod http;
mod transport;

pub use calendar::CalendarSession;
pub use config::ApiConfig;
pub use dispatch::{Dispatch, Dispatcher};
pub use error::ApiError;
pub use http::{HttpClient, Tokens};
pub use transport::{ApiRequest, Method, Transport};
