//! Wiring of the client components.
//!
//! Everything that needs the credential store gets it from here; there is
//! no global state.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::Result;
use crate::auth::{AuthService, TokenStore};
use crate::config::Config;
use crate::http::{ApiEndpoints, AuthPipeline, ReqwestTransport, Transport};
use crate::session::{Navigator, Route};
use crate::settings::Settings;
use crate::storage::{FileStore, KeyValueStore};
use crate::todos::TodosService;

/// All services of one client session
pub struct App {
    pub config: Config,
    pub navigator: Arc<Navigator>,
    pub pipeline: Arc<AuthPipeline>,
    pub todos: TodosService,
    pub settings: Settings,
}

impl App {
    /// Build the client with the file store at `storage_path` and the
    /// reqwest transport
    pub fn new(config: Config, storage_path: &Path) -> Result<Self> {
        let store = Arc::new(FileStore::open(storage_path)?);
        let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(config.timeout_secs))?);
        Self::with_parts(config, store, transport)
    }

    /// Build the client on top of explicit storage and transport
    pub fn with_parts(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let endpoints = ApiEndpoints::new(&config.api_url)?;
        let tokens = TokenStore::new(store.clone());
        let navigator = Arc::new(Navigator::new(Route::Root));

        let auth = AuthService::new(transport.clone(), endpoints.clone(), tokens);
        let pipeline = Arc::new(AuthPipeline::new(
            transport,
            endpoints.registry(),
            auth,
            navigator.clone(),
        ));
        let todos = TodosService::new(pipeline.clone(), endpoints);
        let settings = Settings::new(store, &config);

        Ok(Self {
            config,
            navigator,
            pipeline,
            todos,
            settings,
        })
    }

    pub fn auth(&self) -> &AuthService {
        self.pipeline.auth()
    }

    pub fn tokens(&self) -> &TokenStore {
        self.pipeline.tokens()
    }

    /// Whether a request in this run lost the session for good
    pub fn session_expired(&self) -> bool {
        self.navigator.session_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenPair;
    use crate::http::FakeTransport;
    use crate::session::require_session;
    use crate::storage::InMemoryStore;
    use reqwest::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_expired_session_sends_user_to_login() {
        let transport = Arc::new(FakeTransport::new());
        transport
            .reply(Method::GET, "http://localhost:8000/api/todos/", 401, json!({}))
            .reply(Method::POST, "http://localhost:8000/api/auth/refresh/", 400, json!({}));
        let app = App::with_parts(Config::default(), Arc::new(InMemoryStore::new()), transport).unwrap();
        app.tokens().save_pair(&TokenPair::new("T1", "R1")).unwrap();

        assert!(app.todos.list().await.is_err());

        assert!(app.session_expired());
        assert_eq!(app.navigator.current(), Route::Login);
        assert!(!app.tokens().is_authenticated());
    }

    #[test]
    fn test_guard_on_fresh_install_is_not_an_expiry() {
        let app = App::with_parts(
            Config::default(),
            Arc::new(InMemoryStore::new()),
            Arc::new(FakeTransport::new()),
        )
        .unwrap();

        assert!(require_session(app.tokens(), &app.navigator).is_err());

        assert_eq!(app.navigator.current(), Route::Login);
        assert!(!app.session_expired());
    }

    #[test]
    fn test_new_opens_the_given_storage_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let app = App::new(Config::default(), &path).unwrap();
        app.tokens().save_pair(&TokenPair::new("T1", "R1")).unwrap();

        let reopened = App::new(Config::default(), &path).unwrap();
        assert_eq!(reopened.tokens().access_token().as_deref(), Some("T1"));
    }

    #[test]
    fn test_settings_share_the_store() {
        let store = Arc::new(InMemoryStore::new());
        let app = App::with_parts(Config::default(), store.clone(), Arc::new(FakeTransport::new())).unwrap();

        app.settings.set_dark(true).unwrap();
        app.tokens().save_pair(&TokenPair::new("T1", "R1")).unwrap();

        assert!(!store.is_empty());
        assert!(app.settings.is_dark());
        assert!(!app.session_expired());
    }
}
