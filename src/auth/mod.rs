//! Authentication module
//!
//! This module provides:
//! - Token pair storage on top of the client key/value store
//! - AuthService for login, registration, refresh and logout
//! - Login and sign-up form validation

mod service;
mod tokens;
pub mod validation;

pub use service::{AuthService, GenericResponse};
pub use tokens::{TokenPair, TokenStore};
pub use validation::{validate_login, validate_sign_up, Validation};
