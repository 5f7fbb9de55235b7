//! Drives store slices through pending → fulfilled | rejected around each
//! API call.
//!
//! The store lock is only held while a slice is updated, never across the
//! network call, so overlapping dispatches resolve independently.

use std::sync::Arc;

use schedule_core::{
    AppState, Appointment, Collection, LifecycleFlags, Operation, Resource, Scope, WeekRange,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::envelope::{decode_collection, decode_item};
use crate::transport::{ApiRequest, Transport};
use crate::ApiError;

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Fulfilled,
    Rejected(String),
    /// A newer dispatch of the same operation owns the slice.
    Superseded,
}

impl Dispatch {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Dispatch::Fulfilled)
    }
}

pub struct Dispatcher<T> {
    transport: Arc<T>,
    state: Arc<Mutex<AppState>>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, state: AppState) -> Self {
        Self::shared(Arc::new(transport), Arc::new(Mutex::new(state)))
    }

    pub fn shared(transport: Arc<T>, state: Arc<Mutex<AppState>>) -> Self {
        Self { transport, state }
    }

    pub fn state(&self) -> Arc<Mutex<AppState>> {
        Arc::clone(&self.state)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn flags<R: Resource>(&self) -> LifecycleFlags {
        R::slice(&*self.state.lock().await).flags().clone()
    }

    /// Lists records of `R` and replaces the part of the collection that
    /// `scope` covers.
    pub async fn fetch<R: Resource>(&self, scope: Scope) -> Dispatch {
        let request = ApiRequest::list::<R>(&scope);
        self.fetch_with::<R>(request, scope).await
    }

    /// Loads the appointments of one week, replacing the previous week.
    pub async fn fetch_appointments(&self, range: WeekRange) -> Dispatch {
        self.fetch_with::<Appointment>(ApiRequest::appointments_in(&range), Scope::All)
            .await
    }

    async fn fetch_with<R: Resource>(&self, request: ApiRequest, scope: Scope) -> Dispatch {
        self.run::<R, Vec<R>, _, _>(
            Operation::Fetch(scope.clone()),
            Ok(request),
            decode_collection::<R>,
            move |data, items| data.replace(&scope, items),
        )
        .await
    }

    /// Creates a record and appends the server's copy.
    pub async fn create<R: Resource>(&self, record: &R) -> Dispatch {
        self.run::<R, R, _, _>(
            Operation::Create,
            ApiRequest::create(record),
            decode_item::<R>,
            |data, created| data.insert(created),
        )
        .await
    }

    /// Updates a record and swaps the server's copy in place.
    pub async fn update<R: Resource>(&self, record: &R) -> Dispatch {
        self.run::<R, R, _, _>(
            Operation::Update(record.id().to_string()),
            ApiRequest::update(record),
            decode_item::<R>,
            |data, updated: R| {
                let id = updated.id().to_string();
                if !data.update(updated) {
                    debug!(id = id.as_str(), "updated record was not loaded");
                }
            },
        )
        .await
    }

    pub async fn delete<R: Resource>(&self, id: &str) -> Dispatch {
        let removed = id.to_string();
        self.run::<R, (), _, _>(
            Operation::Delete(removed.clone()),
            Ok(ApiRequest::delete::<R>(id)),
            |_| Ok(()),
            move |data, ()| {
                data.remove(&removed);
            },
        )
        .await
    }

    /// Drops a sticky error or success back to Idle.
    pub async fn clear_status<R: Resource>(&self) {
        R::slice_mut(&mut *self.state.lock().await).clear_status();
    }

    async fn run<R, V, D, F>(
        &self,
        operation: Operation,
        request: Result<ApiRequest, ApiError>,
        decode: D,
        reduce: F,
    ) -> Dispatch
    where
        R: Resource,
        V: Send,
        D: FnOnce(Value) -> Result<V, ApiError> + Send,
        F: FnOnce(&mut R::Collection, V) + Send,
    {
        let ticket = R::slice_mut(&mut *self.state.lock().await).begin(operation);
        let operation = &ticket.operation;
        debug!(resource = R::PATH, ?operation, generation = ticket.generation, "dispatch pending");

        let outcome = match request {
            Ok(request) => self.transport.send(request).await.and_then(decode),
            Err(err) => Err(err),
        };

        let mut state = self.state.lock().await;
        let slice = R::slice_mut(&mut state);
        match outcome {
            Ok(value) => {
                if slice.fulfill(&ticket, |data| reduce(data, value)) {
                    debug!(resource = R::PATH, ?operation, "dispatch fulfilled");
                    Dispatch::Fulfilled
                } else {
                    Dispatch::Superseded
                }
            }
            Err(err) => {
                let message = err.user_message();
                warn!(resource = R::PATH, ?operation, error = message.as_str(), "dispatch rejected");
                if slice.reject(&ticket, message.clone()) {
                    Dispatch::Rejected(message)
                } else {
                    Dispatch::Superseded
                }
            }
        }
    }
}
