use async_trait::async_trait;
use schedule_core::{Resource, Scope, WeekRange};
use serde_json::Value;

use crate::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// One call against the API, relative to the base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn list<R: Resource>(scope: &Scope) -> Self {
        let request = Self::new(Method::Get, format!("/{}", R::PATH));
        match scope {
            Scope::All => request,
            Scope::Patient(patient_id) => request.with_query("patientId", patient_id.as_str()),
        }
    }

    /// `GET /appointments?start=..&end=..` for one visible week.
    pub fn appointments_in(range: &WeekRange) -> Self {
        range
            .query_params()
            .into_iter()
            .fold(Self::new(Method::Get, "/appointments"), |request, (key, value)| {
                request.with_query(key, value)
            })
    }

    pub fn create<R: Resource>(record: &R) -> Result<Self, ApiError> {
        Ok(Self::new(Method::Post, format!("/{}", R::PATH)).with_body(serde_json::to_value(record)?))
    }

    pub fn update<R: Resource>(record: &R) -> Result<Self, ApiError> {
        Ok(Self::new(Method::Put, record_path::<R>(record.id()))
            .with_body(serde_json::to_value(record)?))
    }

    pub fn delete<R: Resource>(id: &str) -> Self {
        Self::new(Method::Delete, record_path::<R>(id))
    }
}

/// `/{path}/{id}` with the id as one percent-encoded segment.
fn record_path<R: Resource>(id: &str) -> String {
    format!("/{}/{}", R::PATH, urlencoding::encode(id))
}

/// Sends requests and returns the decoded JSON body of successful ones.
/// Non-success statuses come back as [`ApiError::Server`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError>;
}
