//! Blocking HTTP transport for the Quandl API.
//!
//! One request per call with the platform-default client settings. The API
//! key, when configured, is sent as the `api_key` query parameter.

use reqwest::header::CACHE_CONTROL;

use super::transport::{RawResponse, Transport};
use crate::error::PullError;

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(api_key: Option<String>) -> Result<Self, PullError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| PullError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<RawResponse, PullError> {
        tracing::debug!(url, "requesting dataset");

        let mut request = self.client.get(url).header(CACHE_CONTROL, "no-cache");
        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }

        let resp = request
            .send()
            .map_err(|e| PullError::Transport(format!("GET {url}: {e}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .map_err(|e| PullError::Transport(format!("read body from {url}: {e}")))?;

        tracing::debug!(status, bytes = body.len(), "response received");
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn sends_api_key_and_returns_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/datasets/WIKI/FB/data.json")
                .query_param("api_key", "secret")
                .header("cache-control", "no-cache");
            then.status(200).body(r#"{"dataset_data":{}}"#);
        });

        let transport = HttpTransport::new(Some("secret".into())).unwrap();
        let resp = transport
            .get(&server.url("/api/v3/datasets/WIKI/FB/data.json"))
            .unwrap();

        mock.assert();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, br#"{"dataset_data":{}}"#.to_vec());
    }

    #[test]
    fn error_status_is_returned_not_raised() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/datasets/WIKI/ZZZZ/data.json");
            then.status(404)
                .body(r#"{"quandl_error":{"code":"QECx02","message":"bad code"}}"#);
        });

        let transport = HttpTransport::new(None).unwrap();
        assert!(!transport.has_api_key());
        let resp = transport
            .get(&server.url("/api/v3/datasets/WIKI/ZZZZ/data.json"))
            .unwrap();
        assert_eq!(resp.status, 404);
        assert!(!resp.is_success());
    }

    #[test]
    fn empty_key_is_not_sent() {
        let transport = HttpTransport::new(Some(String::new())).unwrap();
        assert!(!transport.has_api_key());
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let transport = HttpTransport::new(None).unwrap();
        let err = transport
            .get("http://127.0.0.1:1/api/v3/datasets/WIKI/FB/data.json")
            .unwrap_err();
        assert!(matches!(err, PullError::Transport(_)));
    }
}
