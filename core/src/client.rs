//! Request execution core for the Performance Platform API.
//!
//! # Design
//! `Client` owns an immutable `ClientConfig` and carries no mutable state
//! between calls. Every call builds a fresh `HttpRequest` (URL, canonical
//! headers, encoded and possibly gzipped body), runs it through the retry
//! loop and classifies the final response. The round-trip itself is
//! delegated to a `Transport`, so the whole pipeline runs unchanged against
//! the scripted transport used in tests.

use std::sync::Arc;
use std::thread;

use serde_json::Value;

use crate::backoff::{classify_status, ExponentialBackoff, ResponseClass};
use crate::config::{ClientConfig, ClientSettings};
use crate::encode::{gzip, should_gzip};
use crate::error::{ClientError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::observe::{RequestObserver, TracingObserver};
use crate::payload::Payload;
use crate::query::{to_query_string, QueryValue};
use crate::transport::UreqTransport;

pub const USER_AGENT: &str = concat!("Performance Platform Client ", env!("CARGO_PKG_VERSION"));
pub const REQUEST_ID_HEADER: &str = "Govuk-Request-Id";

/// Synchronous client for one Performance Platform endpoint.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn RequestObserver>,
    backoff: ExponentialBackoff,
}

impl Client {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(Self::from_config(ClientConfig::new(base_url, token)?))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: Arc::new(UreqTransport::new()),
            observer: Arc::new(TracingObserver),
            backoff: ExponentialBackoff::default(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        Ok(Self::from_config(ClientConfig::from_settings(settings)?))
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    pub fn with_request_id<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.config.request_id = Arc::new(supplier);
        self
    }

    pub fn with_retry(mut self, retry_on_error: bool) -> Self {
        self.config.retry_on_error = retry_on_error;
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.config.compress = compress;
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    pub fn with_observer(mut self, observer: impl RequestObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Attaches a bearer token to a client created without one.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.config.token = Some(token.into());
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get(&self, path: &str, query: &[(String, QueryValue)]) -> Result<Option<Value>> {
        self.execute(HttpMethod::Get, path, None, query)
    }

    /// Posts `payload` in one request, or, when `chunk_size > 0`, as
    /// consecutive chunks of at most `chunk_size` records.
    ///
    /// Chunked posts return `None`; the first failing chunk aborts the rest.
    pub fn post<'a>(&self, path: &str, payload: impl Into<Payload<'a>>, chunk_size: usize) -> Result<Option<Value>> {
        let payload = payload.into();
        if chunk_size == 0 {
            return self.execute(HttpMethod::Post, path, Some(payload), &[]);
        }

        for (index, chunk) in payload.into_chunks(chunk_size)?.enumerate() {
            self.observer.sending_chunk(index + 1);
            self.execute(HttpMethod::Post, path, Some(Payload::Sequence(chunk)), &[])?;
        }
        Ok(None)
    }

    pub fn put<'a>(&self, path: &str, payload: impl Into<Payload<'a>>) -> Result<Option<Value>> {
        self.execute(HttpMethod::Put, path, Some(payload.into()), &[])
    }

    pub fn delete(&self, path: &str) -> Result<Option<Value>> {
        self.execute(HttpMethod::Delete, path, None, &[])
    }

    /// Performs one logical request: build, retry on 500/502/503, classify.
    ///
    /// Returns `None` for dry runs, 204 responses and empty bodies.
    pub fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Payload<'_>>,
        query: &[(String, QueryValue)],
    ) -> Result<Option<Value>> {
        let url = format!("{}{}{}", self.config.base_url, path, to_query_string(query));
        let body = body.map(Payload::into_body).transpose()?;
        let mut headers = self.headers(body.is_some());

        if self.config.dry_run {
            let request = HttpRequest {
                method,
                url,
                headers,
                body: body.clone().map(String::into_bytes),
            };
            self.observer.dry_run(&request, body.as_deref());
            return Ok(None);
        }

        let body = match body {
            Some(text) if should_gzip(text.len(), self.config.compress) => {
                headers.push(("Content-Encoding".to_string(), "gzip".to_string()));
                Some(gzip(text.as_bytes())?)
            }
            Some(text) => Some(text.into_bytes()),
            None => None,
        };

        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        let response = self.send_with_retry(&request)?;
        self.handle_response(&request, response)
    }

    fn headers(&self, has_body: bool) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            (REQUEST_ID_HEADER.to_string(), self.config.request_id()),
        ];
        if let Some(token) = &self.config.token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        if has_body {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        headers
    }

    /// Sends `request` until it gets a non-retryable status or the backoff
    /// budget is spent. The last response is returned either way.
    fn send_with_retry(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if !self.config.retry_on_error {
            return self.transport.send(request);
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let response = self.transport.send(request)?;
            if classify_status(response.status) != ResponseClass::Retryable {
                return Ok(response);
            }
            let Some(delay) = self.backoff.next_delay(attempt) else {
                return Ok(response);
            };
            self.observer.retrying(request, attempt, response.status, delay);
            thread::sleep(delay);
        }
    }

    fn handle_response(&self, request: &HttpRequest, response: HttpResponse) -> Result<Option<Value>> {
        match classify_status(response.status) {
            ResponseClass::Retryable | ResponseClass::Failed => {
                self.observer.request_failed(request, response.status, &response.body);
                Err(ClientError::RequestFailed {
                    status: response.status,
                    body: response.body,
                })
            }
            ResponseClass::NoContent => Ok(None),
            ResponseClass::Success => {
                self.observer.response(request, response.status, &response.body);
                if response.body.trim().is_empty() {
                    return Ok(None);
                }
                serde_json::from_str(&response.body)
                    .map(Some)
                    .map_err(ClientError::Deserialization)
            }
        }
    }
}

/// Runs `call`, turning a `RequestFailed` with `status` into `Ok(None)`.
/// Every other outcome passes through untouched.
pub fn absent_on<T>(status: u16, call: impl FnOnce() -> Result<Option<T>>) -> Result<Option<T>> {
    match call() {
        Err(err) if err.status() == Some(status) => Ok(None),
        other => other,
    }
}
