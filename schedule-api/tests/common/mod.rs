#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use schedule_api::{ApiError, ApiRequest, Transport};
use serde_json::Value;
use tokio::sync::oneshot;

type Reply = Result<Value, ApiError>;

/// Transport whose responses are handed over by the test, one per request,
/// in request order.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<oneshot::Receiver<Reply>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    /// Queues a response that is available immediately.
    pub fn respond(&self, reply: Reply) {
        let (sender, receiver) = oneshot::channel();
        sender.send(reply).ok();
        self.replies.lock().unwrap().push_back(receiver);
    }

    /// Queues a response that the test releases later through the sender.
    pub fn hold(&self) -> oneshot::Sender<Reply> {
        let (sender, receiver) = oneshot::channel();
        self.replies.lock().unwrap().push_back(receiver);
        sender
    }

    pub fn issued(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(request);
        let receiver = self.replies.lock().unwrap().pop_front();
        match receiver {
            Some(receiver) => receiver
                .await
                .unwrap_or_else(|_| Err(ApiError::server(503, "reply dropped"))),
            None => Err(ApiError::server(500, "no scripted reply")),
        }
    }
}

/// Yields until `count` requests have reached the transport.
pub async fn wait_for_requests(transport: &ScriptedTransport, count: usize) {
    for _ in 0..10_000 {
        if transport.issued() >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {count} requests, saw {}", transport.issued());
}

pub fn fixture(name: &str) -> Value {
    let path = format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"));
    let raw = std::fs::read_to_string(&path).expect("could not read fixture");
    serde_json::from_str(&raw).expect("fixture is not valid JSON")
}
