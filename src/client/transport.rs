//! HTTP transport seam.
//!
//! [`VfdClient`](super::VfdClient) only needs `post(url, headers, body) -> (status, headers, body)`.
//! [`ReqwestTransport`] is the production implementation; tests plug in their own.

use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::core::VfdError;

use super::config::ClientConfig;

/// Outbound POST request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(url: Url, body: Vec<u8>) -> Self {
        Self {
            url,
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Status, headers and raw body of a response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Sends a request and returns whatever the server answered.
///
/// Implementations must be safe for concurrent use and must not retry.
/// A non-2xx status is a successful transport call; only failures to get
/// an answer at all are errors.
pub trait Transport: Send + Sync {
    fn post(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, VfdError>> + Send;
}

/// Pooled `reqwest` client. Clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, VfdError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VfdError::transport(None, format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, VfdError> {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    /// Wrap an existing client, e.g. one with a proxy or custom roots.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, VfdError> {
        let mut builder = self.client.post(request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder.body(request.body).send().await.map_err(map_reqwest)?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = resp.bytes().await.map_err(map_reqwest)?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest(e: reqwest::Error) -> VfdError {
    let status = e.status().map(|s| s.as_u16());
    if e.is_timeout() {
        VfdError::transport(status, "request timed out")
    } else {
        VfdError::transport(status, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let resp = HttpResponse::new(200, "{}").with_header("ackcode", "0");
        assert_eq!(resp.header("ACKCODE"), Some("0"));
        assert_eq!(resp.header("ACKMSG"), None);

        let url = Url::parse("http://localhost/api").unwrap();
        let req = HttpRequest::new(url, Vec::new()).header("Routing-Key", "vfdrct");
        assert_eq!(req.header_value("routing-key"), Some("vfdrct"));
    }
}
