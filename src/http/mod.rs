//! HTTP layer: request/response types, the transport abstraction and the
//! authenticated request pipeline.
//!
//! - [`Transport`] sends one request and reports whatever status came back
//! - [`EndpointRegistry`] says which URLs need a bearer token
//! - [`AuthPipeline`] attaches tokens and recovers from 401/403 once

mod endpoints;
mod pipeline;
mod transport;

pub use endpoints::{ApiEndpoints, EndpointRegistry};
pub use pipeline::{AuthPipeline, PipelineState};
pub use transport::ReqwestTransport;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Result;
use crate::error::Error;

/// Outgoing request descriptor
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Attach a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Set a header, replacing any previous value
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Other(format!("Invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::Other(format!("Invalid value for header {name}: {e}")))?;
        self.headers.insert(header, value);
        Ok(self)
    }

    /// Copy of this request carrying `Authorization: Bearer <token>`
    pub fn with_bearer(&self, token: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::Other(format!("Token is not a valid header value: {e}")))?;
        value.set_sensitive(true);

        let mut request = self.clone();
        request.headers.insert(AUTHORIZATION, value);
        Ok(request)
    }

    /// Value of the Authorization header, if set
    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
    }
}

/// Response as seen by the pipeline, with the body already read
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 401 and 403 are the statuses a token refresh can fix
    #[inline]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, 401 | 403)
    }

    /// Deserialize the body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// `Ok(self)` for 2xx, [`Error::Status`] otherwise
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Status {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Transport trait - sends one request over the network.
///
/// Any HTTP status is returned as `Ok`; only failures to get a response
/// at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Scripted transport for testing.
///
/// Replies are matched by method and URL in the order they were queued,
/// and every request that reaches it is recorded.
#[cfg(test)]
pub struct FakeTransport {
    replies: std::sync::Mutex<Vec<(Method, String, Result<ApiResponse>)>>,
    seen: std::sync::Mutex<Vec<ApiRequest>>,
}

#[cfg(test)]
impl FakeTransport {
    pub fn new() -> Self {
        Self {
            replies: std::sync::Mutex::new(Vec::new()),
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply for the next matching request
    pub fn reply(&self, method: Method, url: &str, status: u16, body: serde_json::Value) -> &Self {
        self.replies.lock().unwrap().push((
            method,
            url.to_string(),
            Ok(ApiResponse::new(status, body.to_string())),
        ));
        self
    }

    /// Queue a transport failure for the next matching request
    pub fn fail(&self, method: Method, url: &str) -> &Self {
        self.replies.lock().unwrap().push((
            method,
            url.to_string(),
            Err(Error::Other("connection refused".to_string())),
        ));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<ApiRequest> {
        self.requests().into_iter().filter(|r| r.url == url).collect()
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        // Behave like a real network call and let other tasks run
        tokio::task::yield_now().await;
        self.seen.lock().unwrap().push(request.clone());

        let mut replies = self.replies.lock().unwrap();
        let position = replies
            .iter()
            .position(|(method, url, _)| *method == request.method && *url == request.url)
            .ok_or_else(|| {
                Error::Other(format!("No scripted reply for {} {}", request.method, request.url))
            })?;
        replies.remove(position).2
    }
}
