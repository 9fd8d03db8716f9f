//! Read-only client for the admin API (data-set metadata and users).
//!
//! Admin requests are never compressed, and a 404 on any lookup means "no
//! such thing" rather than an error.

use serde_json::Value;

use crate::client::{absent_on, Client};
use crate::error::Result;
use crate::query::{query, quote_plus};

#[derive(Clone)]
pub struct AdminApi {
    client: Client,
}

impl AdminApi {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(Self::from_client(Client::new(url, token)?))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client: client.with_compression(false),
        }
    }

    pub fn configure(mut self, f: impl FnOnce(Client) -> Client) -> Self {
        self.client = f(self.client).with_compression(false);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The first data set matching `data_group` and `data_type`. A response
    /// that is not a list counts as no match.
    pub fn get_data_set(&self, data_group: &str, data_type: &str) -> Result<Option<Value>> {
        let params = query([("data-group", data_group), ("data-type", data_type)]);
        let found = absent_on(404, || self.client.get("/data-sets", &params))?;
        Ok(found.and_then(|value| match value {
            Value::Array(matches) => matches.into_iter().next(),
            _ => None,
        }))
    }

    pub fn get_data_set_by_name(&self, name: &str) -> Result<Option<Value>> {
        absent_on(404, || self.client.get(&format!("/data-sets/{name}"), &[]))
    }

    pub fn list_data_sets(&self) -> Result<Option<Value>> {
        absent_on(404, || self.client.get("/data-sets", &[]))
    }

    pub fn get_user(&self, email: &str) -> Result<Option<Value>> {
        absent_on(404, || self.client.get(&format!("/users/{}", quote_plus(email)), &[]))
    }
}
