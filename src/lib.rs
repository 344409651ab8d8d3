//! Tudu - command line todo client
//!
//! This library provides the client side of a todo REST API: session
//! tokens with transparent refresh, todo CRUD calls, and user settings.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod settings;
pub mod storage;
pub mod todos;
pub mod ui;

pub use error::{Error, Result};
