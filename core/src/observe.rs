//! Hooks for what the client reports while it works.
//!
//! `Client` holds an `Arc<dyn RequestObserver>` instead of writing to a
//! global logger. The default, `TracingObserver`, emits `tracing` events,
//! which go nowhere until the application installs a subscriber.

use std::time::Duration;

use crate::http::HttpRequest;

pub trait RequestObserver: Send + Sync {
    /// A dry-run client would have sent `request`. `body` is the encoded,
    /// uncompressed payload.
    fn dry_run(&self, request: &HttpRequest, body: Option<&str>);

    /// Chunk number `number` (1-based) is about to be posted.
    fn sending_chunk(&self, number: usize);

    /// Attempt `attempt` got a retryable `status`; the next try follows
    /// after `delay`.
    fn retrying(&self, request: &HttpRequest, attempt: u32, status: u16, delay: Duration);

    /// The server answered with an error status that will be surfaced.
    fn request_failed(&self, request: &HttpRequest, status: u16, body: &str);

    /// The server answered successfully.
    fn response(&self, request: &HttpRequest, status: u16, body: &str);
}

/// Forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn dry_run(&self, request: &HttpRequest, body: Option<&str>) {
        tracing::info!(
            method = %request.method,
            url = %request.url,
            headers = ?request.headers,
            "dry run, request not sent"
        );
        tracing::info!(body = body.unwrap_or(""), "dry run body");
    }

    fn sending_chunk(&self, number: usize) {
        tracing::info!("Sending chunk {number}");
    }

    fn retrying(&self, request: &HttpRequest, attempt: u32, status: u16, delay: Duration) {
        tracing::warn!(
            attempt,
            status,
            delay_ms = delay.as_millis() as u64,
            url = %request.url,
            "retrying request"
        );
    }

    fn request_failed(&self, request: &HttpRequest, status: u16, body: &str) {
        tracing::error!(status, url = %request.url, "[PP-C] {body}");
    }

    fn response(&self, request: &HttpRequest, status: u16, body: &str) {
        tracing::debug!(status, url = %request.url, "[PP-C] {body}");
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {
    fn dry_run(&self, _: &HttpRequest, _: Option<&str>) {}
    fn sending_chunk(&self, _: usize) {}
    fn retrying(&self, _: &HttpRequest, _: u32, _: u16, _: Duration) {}
    fn request_failed(&self, _: &HttpRequest, _: u16, _: &str) {}
    fn response(&self, _: &HttpRequest, _: u16, _: &str) {}
}
