//! Read-only client for the collector API. Requests are never compressed.

use serde_json::Value;

use crate::client::Client;
use crate::error::Result;

#[derive(Clone)]
pub struct CollectorApi {
    client: Client,
}

impl CollectorApi {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(Self::from_client(Client::new(url, token)?))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client: client.with_compression(false),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn get_collector_type(&self, collector_type: &str) -> Result<Option<Value>> {
        self.client.get(&format!("/collector-type/{collector_type}"), &[])
    }

    pub fn list_collector_types(&self) -> Result<Option<Value>> {
        self.client.get("/collector-type", &[])
    }

    pub fn get_collector(&self, collector: &str) -> Result<Option<Value>> {
        self.client.get(&format!("/collector/{collector}"), &[])
    }

    pub fn list_collectors(&self) -> Result<Option<Value>> {
        self.client.get("/collector", &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;

    fn scripted() -> (ScriptedTransport, CollectorApi) {
        let transport = ScriptedTransport::new();
        let api = CollectorApi::from_client(transport.client("http://collector.api", Some("token")));
        (transport, api)
    }

    #[test]
    fn get_collector() {
        let (transport, api) = scripted();
        api.get_collector("foo").unwrap();

        let req = &transport.requests()[0];
        assert_eq!(req.url, "http://collector.api/collector/foo");
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert_eq!(req.header("Authorization"), Some("Bearer token"));
        assert!(req.body.is_none());
    }

    #[test]
    fn list_endpoints() {
        let (transport, api) = scripted();
        api.list_collectors().unwrap();
        api.list_collector_types().unwrap();
        api.get_collector_type("ga").unwrap();

        let urls: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://collector.api/collector",
                "http://collector.api/collector-type",
                "http://collector.api/collector-type/ga",
            ]
        );
    }

    #[test]
    fn not_found_is_an_error() {
        let (transport, api) = scripted();
        transport.respond(404, "missing");
        assert_eq!(api.get_collector("nope").unwrap_err().status(), Some(404));
    }

    #[test]
    fn compression_is_off() {
        let (_, api) = scripted();
        assert!(!api.client().config().compress());
    }
}
