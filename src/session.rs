//! Session consumer side: where the client is and what happens when the
//! session can no longer be recovered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::Result;
use crate::auth::TokenStore;
use crate::error::Error;

/// Screens of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Root,
    Login,
    Home,
    Settings,
    Detail,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "",
            Route::Login => "/login",
            Route::Home => "/tabs/home",
            Route::Settings => "/tabs/settings",
            Route::Detail => "/tabs/home/detail",
        }
    }
}

/// Receives the logout-and-redirect signal from the request pipeline.
///
/// Called after the stored tokens have been cleared.
pub trait SessionListener: Send + Sync {
    fn on_session_expired(&self);
}

/// Navigation stack
pub struct Navigator {
    stack: Mutex<Vec<Route>>,
    expired: AtomicBool,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            stack: Mutex::new(vec![start]),
            expired: AtomicBool::new(false),
        }
    }

    /// Whether the pipeline ended the session. Not set by the guard.
    pub fn session_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Route {
        self.stack
            .lock()
            .ok()
            .and_then(|s| s.last().copied())
            .unwrap_or(Route::Root)
    }

    pub fn navigate(&self, route: Route) {
        if let Ok(mut stack) = self.stack.lock() {
            stack.push(route);
        }
    }

    /// Navigate and drop the history, so going back cannot leave `route`
    pub fn navigate_replace(&self, route: Route) {
        if let Ok(mut stack) = self.stack.lock() {
            stack.clear();
            stack.push(route);
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.stack.lock().map(|s| s.len() > 1).unwrap_or(false)
    }

    /// Pop the current route; returns the one now shown
    pub fn back(&self) -> Route {
        if let Ok(mut stack) = self.stack.lock() {
            if stack.len() > 1 {
                stack.pop();
            }
        }
        self.current()
    }
}

impl SessionListener for Navigator {
    fn on_session_expired(&self) {
        tracing::info!("Session expired, redirecting to {}", Route::Login.path());
        self.expired.store(true, Ordering::SeqCst);
        self.navigate_replace(Route::Login);
    }
}

/// Authentication guard for screens that need a logged-in user
pub fn require_session(tokens: &TokenStore, navigator: &Navigator) -> Result<()> {
    if tokens.is_authenticated() {
        Ok(())
    } else {
        navigator.navigate_replace(Route::Login);
        Err(Error::NotAuthenticated)
    }
}
