//! Scripted transport and recording observer for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backoff::ExponentialBackoff;
use crate::client::Client;
use crate::error::{ClientError, Result};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::observe::RequestObserver;

/// Answers requests from a queue and records what it was sent. Once the queue
/// is empty every request gets `200 []`.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<Result<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, status: u16, body: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub(crate) fn fail(&self, message: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(ClientError::Transport(message.to_string())));
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn bodies(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| String::from_utf8(r.body.unwrap_or_default()).unwrap())
            .collect()
    }

    /// Client on `base_url` with token `token`, wired to this transport and
    /// with zero backoff delays.
    pub(crate) fn client(&self, base_url: &str, token: Option<&str>) -> Client {
        Client::new(base_url, token.map(str::to_string))
            .unwrap()
            .with_transport(self.clone())
            .with_backoff(ExponentialBackoff::new(Duration::ZERO, 5))
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, "[]")))
    }
}

/// Collects observer events as strings.
#[derive(Clone, Default)]
pub(crate) struct RecordingObserver {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingObserver {
    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl RequestObserver for RecordingObserver {
    fn dry_run(&self, request: &HttpRequest, body: Option<&str>) {
        self.push(format!("dry-run {} {} {}", request.method, request.url, body.unwrap_or("")));
    }

    fn sending_chunk(&self, number: usize) {
        self.push(format!("chunk {number}"));
    }

    fn retrying(&self, _: &HttpRequest, attempt: u32, status: u16, _: Duration) {
        self.push(format!("retry {attempt} {status}"));
    }

    fn request_failed(&self, _: &HttpRequest, status: u16, body: &str) {
        self.push(format!("failed {status} {body}"));
    }

    fn response(&self, _: &HttpRequest, status: u16, _: &str) {
        self.push(format!("response {status}"));
    }
}
