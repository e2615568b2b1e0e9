//! ScriptedTransport - テスト用の HttpTransport
//!
//! Answers every request with a closure and records what was sent.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::Result;
use crate::ports::{HttpRequest, HttpResponse, HttpTransport};

type Handler = Box<dyn FnMut(&HttpRequest) -> Result<HttpResponse> + Send>;

pub struct ScriptedTransport {
    handler: Mutex<Handler>,
    latency: Option<Duration>,
    log: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(handler: impl FnMut(&HttpRequest) -> Result<HttpResponse> + Send + 'static) -> Self {
        Self {
            handler: Mutex::new(Box::new(handler)),
            latency: None,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Every response is delayed by `latency` (tokio time).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&HttpRequest) -> bool) -> usize {
        self.log.lock().unwrap().iter().filter(|r| predicate(r)).count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.log.lock().unwrap().push(request.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut handler = self.handler.lock().unwrap();
        (handler)(&request)
    }
}
