//! AuthService - login, registration, token refresh and logout
//!
//! Talks to the transport directly: none of these endpoints take a
//! bearer token.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::tokens::{TokenPair, TokenStore};
use crate::Result;
use crate::error::Error;
use crate::http::{ApiEndpoints, ApiRequest, Transport};

/// Login request body
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Registration request body
#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    username: &'a str,
}

/// Plain `{ "message": ... }` response used by several endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenericResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Clone)]
pub struct AuthService {
    transport: Arc<dyn Transport>,
    endpoints: ApiEndpoints,
    tokens: TokenStore,
}

impl AuthService {
    pub fn new(transport: Arc<dyn Transport>, endpoints: ApiEndpoints, tokens: TokenStore) -> Self {
        Self {
            transport,
            endpoints,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Log in and store the returned token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        let request = ApiRequest::post(self.endpoints.login())
            .json(&LoginRequest { email, password })?;

        let pair: TokenPair = self.transport.send(request).await?.error_for_status()?.json()?;
        self.tokens.save_pair(&pair)?;

        tracing::info!("Logged in as {}", email);
        Ok(pair)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, email: &str, password: &str, username: &str) -> Result<GenericResponse> {
        let request = ApiRequest::post(self.endpoints.register())
            .json(&RegisterRequest { email, password, username })?;

        let response = self.transport.send(request).await?.error_for_status()?;
        tracing::info!("Registered {}", email);

        // Some servers answer 201 with an empty body
        if response.body.trim().is_empty() {
            return Ok(GenericResponse::default());
        }
        response.json()
    }

    /// Exchange the stored pair for a new one and store it.
    ///
    /// The store is left untouched on failure; clearing it is up to the
    /// caller.
    pub async fn refresh(&self) -> Result<TokenPair> {
        let refresh_token = self.tokens.refresh_token().ok_or(Error::NotAuthenticated)?;
        let current = TokenPair {
            access_token: self.tokens.access_token().unwrap_or_default(),
            refresh_token,
        };

        let request = ApiRequest::post(self.endpoints.refresh()).json(&current)?;
        let pair: TokenPair = self.transport.send(request).await?.error_for_status()?.json()?;
        self.tokens.save_pair(&pair)?;

        tracing::info!("Access token refreshed");
        Ok(pair)
    }

    /// Forget the stored session
    pub fn logout(&self) -> Result<()> {
        self.tokens.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }
}
