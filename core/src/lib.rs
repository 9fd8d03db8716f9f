//! Synchronous client for the Performance Platform data API.
//!
//! # Overview
//! Writes JSON records to data sets and reads data sets, admin metadata and
//! collector definitions. Every call is one blocking HTTP exchange (or one
//! sequence of chunked exchanges) with bearer authentication, gzip for large
//! bodies and retries on 500/502/503.
//!
//! # Design
//! - `Client` is the request execution core; `DataSet`, `AdminApi` and
//!   `CollectorApi` only build paths and payloads for it.
//! - The network sits behind the `Transport` trait. `UreqTransport` is the
//!   default; tests script responses without sockets.
//! - What the client reports goes through an injected `RequestObserver`
//!   (`tracing` by default) rather than a global logger.

pub mod admin;
pub mod backoff;
pub mod client;
pub mod collector;
pub mod config;
pub mod data_set;
pub mod encode;
pub mod error;
pub mod http;
pub mod observe;
pub mod payload;
pub mod query;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use admin::AdminApi;
pub use backoff::ExponentialBackoff;
pub use client::{absent_on, Client};
pub use collector::CollectorApi;
pub use config::{ClientConfig, ClientSettings};
pub use data_set::DataSet;
pub use encode::Timestamp;
pub use error::{ClientError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use observe::{NoopObserver, RequestObserver, TracingObserver};
pub use payload::Payload;
pub use query::{Query, QueryValue};
pub use transport::UreqTransport;
