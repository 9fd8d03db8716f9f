//! Writer for a single Performance Platform data set.

use serde_json::Value;

use crate::client::Client;
use crate::config::{ClientConfig, ClientSettings};
use crate::error::{ClientError, Result};
use crate::payload::Payload;
use crate::query::QueryValue;

/// Client bound to one data set URL, e.g. `<api>/<data-group>/<data-type>`.
#[derive(Clone)]
pub struct DataSet {
    client: Client,
}

impl DataSet {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(Self::from_client(Client::new(url, token)?))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(settings: &ClientSettings) -> Result<Self> {
        Ok(Self::from_client(Client::from_config(ClientConfig::from_settings(settings)?)))
    }

    /// Data set at `<api_url>/<name>`, read anonymously.
    pub fn from_name(api_url: &str, name: &str, dry_run: bool) -> Result<Self> {
        let client = Client::new(join_url(&[api_url, name]), None)?.with_dry_run(dry_run);
        Ok(Self::from_client(client))
    }

    /// Data set at `<api_url>/<data_group>/<data_type>`.
    pub fn from_group_and_type(
        api_url: &str,
        data_group: &str,
        data_type: &str,
        dry_run: bool,
        token: Option<String>,
    ) -> Result<Self> {
        let client = Client::new(join_url(&[api_url, data_group, data_type]), token)?.with_dry_run(dry_run);
        Ok(Self::from_client(client))
    }

    /// Applies builder methods to the underlying client.
    pub fn configure(mut self, f: impl FnOnce(Client) -> Client) -> Self {
        self.client = f(self.client);
        self
    }

    pub fn set_token(&mut self, token: &str) -> Result<&mut Self> {
        if token.is_empty() {
            return Err(ClientError::Configuration("a token is required to add a token".to_string()));
        }
        self.client.set_token(token);
        Ok(self)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        self.client.config().base_url()
    }

    pub fn token(&self) -> Option<&str> {
        self.client.config().token()
    }

    pub fn dry_run(&self) -> bool {
        self.client.config().dry_run()
    }

    pub fn get(&self, query: &[(String, QueryValue)]) -> Result<Option<Value>> {
        self.client.get("", query)
    }

    pub fn post<'a>(&self, records: impl Into<Payload<'a>>) -> Result<Option<Value>> {
        self.client.post("", records, 0)
    }

    pub fn post_chunked<'a>(&self, records: impl Into<Payload<'a>>, chunk_size: usize) -> Result<()> {
        if chunk_size == 0 {
            return Err(ClientError::Chunking("chunk size must be positive".to_string()));
        }
        self.client.post("", records, chunk_size).map(|_| ())
    }

    /// Replaces the data set's contents with nothing.
    pub fn empty_data_set(&self) -> Result<Option<Value>> {
        self.client.put("", Payload::Sequence(Vec::new()))
    }
}

/// Joins URL segments with `/` and strips trailing slashes.
pub fn join_url(segments: &[&str]) -> String {
    segments.join("/").trim_end_matches('/').to_string()
}
