//! HTTP request helper for calls to remote providers

use crate::error::Error;
use reqwest::{
    header::{HeaderMap, HeaderValue, RETRY_AFTER},
    Client, Method, RequestBuilder, StatusCode,
};
use serde::Serialize;
use url::Url;

/// Status, selected headers and body text of a finished request
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub retry_after_secs: Option<u64>,
    pub body: String,
}

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl<'a> FetchBuilder<'a> {
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            body: None,
        }
    }

    /// Add a header to the request; values that are not valid header text
    /// are skipped
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)
            .map_err(|e| Error::provider(format!("failed to encode request body: {}", e)))?;
        self.body = Some(json);
        Ok(self)
    }

    fn build(&self) -> Result<RequestBuilder, Error> {
        let url = Url::parse(&self.url)
            .map_err(|e| Error::misconfigured(format!("invalid URL {}: {}", self.url, e)))?;

        let mut req = self.client.request(self.method.clone(), url.as_str());
        req = req.headers(self.headers.clone());

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok(req)
    }

    /// Execute the request and collect the body as text, whatever the status.
    ///
    /// Transport failures (DNS, connect, timeout) become
    /// [`Error::ProviderUnavailable`].
    pub async fn send(&self) -> Result<FetchResponse, Error> {
        let req = self.build()?;
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::provider(format!("request timed out: {}", e))
            } else {
                Error::provider(format!("request failed: {}", e))
            }
        })?;

        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());

        let body = response
            .text()
            .await
            .map_err(|e| Error::provider(format!("failed to read response body: {}", e)))?;

        Ok(FetchResponse {
            status,
            retry_after_secs,
            body,
        })
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }
}
