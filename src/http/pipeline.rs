//! Authenticated request pipeline
//!
//! Every request goes through [`AuthPipeline::dispatch`]:
//!
//! 1. Requests to non-http(s) URLs, or to endpoints registered as not
//!    needing auth, are sent untouched.
//! 2. Otherwise the stored access token, if any, is attached as a bearer
//!    token.
//! 3. A 401/403 answer triggers one token refresh followed by one retry of
//!    the original request. Whatever the retry returns is final.
//! 4. If the refresh fails for any reason the tokens are cleared, the
//!    session listener is told, and the request fails with
//!    [`Error::SessionExpired`].
//!
//! Concurrent refreshes are coalesced: a request that waited on another
//! request's refresh reuses the token it produced.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::endpoints::is_network_url;
use super::{ApiRequest, ApiResponse, EndpointRegistry, Transport};
use crate::Result;
use crate::auth::{AuthService, TokenStore};
use crate::error::Error;
use crate::session::SessionListener;

/// Where a single dispatch currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Sent without a token
    NotAuthenticated,
    /// Sent with the stored access token
    Authenticated,
    /// Got 401/403, refreshing
    RefreshInFlight,
    /// Sent again with the refreshed token
    Retried,
    /// Refresh failed, session dropped
    Failed,
}

pub struct AuthPipeline {
    transport: Arc<dyn Transport>,
    registry: EndpointRegistry,
    auth: AuthService,
    listener: Arc<dyn SessionListener>,
    refresh_lock: Mutex<()>,
}

impl AuthPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: EndpointRegistry,
        auth: AuthService,
        listener: Arc<dyn SessionListener>,
    ) -> Self {
        Self {
            transport,
            registry,
            auth,
            listener,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        self.auth.tokens()
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Whether `request` gets token handling at all
    pub fn requires_auth(&self, request: &ApiRequest) -> bool {
        is_network_url(&request.url) && self.registry.requires_auth(&request.url)
    }

    /// Send `request`, attaching credentials and recovering from an expired
    /// access token once. Non-2xx outcomes are returned as errors.
    pub async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
        if !self.requires_auth(&request) {
            tracing::debug!("{} {} needs no token", request.method, request.url);
            return self.transport.send(request).await?.error_for_status();
        }

        let sent_token = self.tokens().access_token();
        let state = match sent_token {
            Some(_) => PipelineState::Authenticated,
            None => PipelineState::NotAuthenticated,
        };
        trace_state(&request, state);

        let response = self.attempt(&request, sent_token.as_deref()).await?;
        if response.is_success() {
            return Ok(response);
        }
        if !response.is_auth_failure() {
            return response.error_for_status();
        }

        trace_state(&request, PipelineState::RefreshInFlight);
        let fresh_token = match self.refresh_once(sent_token.as_deref()).await {
            Ok(token) => token,
            Err(e) => {
                trace_state(&request, PipelineState::Failed);
                return Err(e);
            }
        };

        trace_state(&request, PipelineState::Retried);
        self.attempt(&request, Some(&fresh_token))
            .await?
            .error_for_status()
    }

    /// Send a copy of `request` carrying `token`, if there is one
    async fn attempt(&self, request: &ApiRequest, token: Option<&str>) -> Result<ApiResponse> {
        let outgoing = match token {
            Some(token) => request.with_bearer(token)?,
            None => request.clone(),
        };
        self.transport.send(outgoing).await
    }

    /// Get a usable access token after `stale` was rejected.
    ///
    /// Holding the refresh lock, first checks whether another request
    /// already rotated (or dropped) the session while we waited.
    async fn refresh_once(&self, stale: Option<&str>) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        match self.tokens().access_token() {
            Some(current) if Some(current.as_str()) != stale => {
                tracing::debug!("Token was refreshed concurrently, reusing it");
                return Ok(current);
            }
            None if stale.is_some() => {
                tracing::debug!("Session was dropped concurrently");
                return Err(Error::SessionExpired);
            }
            _ => {}
        }

        match self.auth.refresh().await {
            Ok(pair) => Ok(pair.access_token),
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                self.expire_session();
                Err(Error::SessionExpired)
            }
        }
    }

    /// Clear credentials, then tell the listener
    fn expire_session(&self) {
        if let Err(e) = self.auth.logout() {
            tracing::warn!("Failed to clear stored tokens: {}", e);
        }
        self.listener.on_session_expired();
    }
}

fn trace_state(request: &ApiRequest, state: PipelineState) {
    tracing::debug!("{} {} -> {:?}", request.method, request.url, state);
}
