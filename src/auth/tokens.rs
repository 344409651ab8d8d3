//! Session token storage
//!
//! Access and refresh tokens are kept in the injected [`KeyValueStore`]
//! under their own keys, together with the time the pair was written.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::storage::{KeyValueStore, StorageKey};

/// Access/refresh token pair as returned by login and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Typed view over the token keys of a [`KeyValueStore`]
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current access token. An empty stored value counts as absent.
    pub fn access_token(&self) -> Option<String> {
        self.non_empty(StorageKey::AccessToken)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.non_empty(StorageKey::RefreshToken)
    }

    /// Both tokens, only when both are present
    pub fn token_pair(&self) -> Option<TokenPair> {
        Some(TokenPair {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
        })
    }

    /// When the current pair was written
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.store
            .retrieve(StorageKey::TokenSavedAt)
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Replace both tokens. If the second write fails the first is rolled
    /// back so a half-written pair is never observed.
    pub fn save_pair(&self, pair: &TokenPair) -> Result<()> {
        let previous_access = self.store.retrieve(StorageKey::AccessToken);

        self.store.save(StorageKey::AccessToken, &pair.access_token)?;
        if let Err(e) = self.store.save(StorageKey::RefreshToken, &pair.refresh_token) {
            let rollback = match previous_access {
                Some(ref token) => self.store.save(StorageKey::AccessToken, token),
                None => self.store.delete(StorageKey::AccessToken),
            };
            if let Err(rollback_err) = rollback {
                tracing::warn!(
                    "Failed to restore the previous access token, stored pair is mismatched: {}",
                    rollback_err
                );
            }
            return Err(e);
        }

        self.store
            .save(StorageKey::TokenSavedAt, &Utc::now().to_rfc3339())?;
        Ok(())
    }

    /// Remove both tokens. Safe to call when nothing is stored.
    pub fn clear(&self) -> Result<()> {
        self.store.delete(StorageKey::AccessToken)?;
        self.store.delete(StorageKey::RefreshToken)?;
        self.store.delete(StorageKey::TokenSavedAt)?;
        Ok(())
    }

    fn non_empty(&self, key: StorageKey) -> Option<String> {
        self.store.retrieve(key).filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn store() -> TokenStore {
        TokenStore::new(Arc::new(InMemoryStore::new()))
    }

    #[test]
    fn test_save_and_read_pair() {
        let tokens = store();
        assert!(!tokens.is_authenticated());

        tokens.save_pair(&TokenPair::new("T1", "R1")).unwrap();

        assert_eq!(tokens.access_token().as_deref(), Some("T1"));
        assert_eq!(tokens.token_pair(), Some(TokenPair::new("T1", "R1")));
        assert!(tokens.saved_at().is_some());
    }

    #[test]
    fn test_overwrite_replaces_both() {
        let tokens = store();
        tokens.save_pair(&TokenPair::new("T1", "R1")).unwrap();
        tokens.save_pair(&TokenPair::new("T2", "R2")).unwrap();
        assert_eq!(tokens.token_pair(), Some(TokenPair::new("T2", "R2")));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let tokens = store();
        tokens.save_pair(&TokenPair::new("T1", "R1")).unwrap();

        tokens.clear().unwrap();
        tokens.clear().unwrap();

        assert!(tokens.access_token().is_none());
        assert!(tokens.refresh_token().is_none());
        assert!(tokens.saved_at().is_none());
    }

    #[test]
    fn test_empty_token_counts_as_absent() {
        let backend = Arc::new(InMemoryStore::new());
        backend.save(StorageKey::AccessToken, "").unwrap();
        let tokens = TokenStore::new(backend);
        assert!(!tokens.is_authenticated());
    }

    /// Rejects refresh-token writes and, optionally, every write after that
    struct FailingStore {
        inner: InMemoryStore,
        broken_after_refresh: bool,
        refresh_failed: std::sync::atomic::AtomicBool,
    }

    impl FailingStore {
        fn new(broken_after_refresh: bool) -> Self {
            Self {
                inner: InMemoryStore::new(),
                broken_after_refresh,
                refresh_failed: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn broken(&self) -> bool {
            self.broken_after_refresh && self.refresh_failed.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    impl KeyValueStore for FailingStore {
        fn save(&self, key: StorageKey, value: &str) -> Result<()> {
            if key == StorageKey::RefreshToken {
                self.refresh_failed.store(true, std::sync::atomic::Ordering::SeqCst);
                return Err(crate::error::Error::Storage("disk full".to_string()));
            }
            if self.broken() {
                return Err(crate::error::Error::Storage("disk gone".to_string()));
            }
            self.inner.save(key, value)
        }

        fn retrieve(&self, key: StorageKey) -> Option<String> {
            self.inner.retrieve(key)
        }

        fn delete(&self, key: StorageKey) -> Result<()> {
            if self.broken() {
                return Err(crate::error::Error::Storage("disk gone".to_string()));
            }
            self.inner.delete(key)
        }
    }

    #[test]
    fn test_failed_refresh_write_restores_access_token() {
        let backend = Arc::new(FailingStore::new(false));
        backend.inner.save(StorageKey::AccessToken, "T1").unwrap();
        let tokens = TokenStore::new(backend.clone());

        let err = tokens.save_pair(&TokenPair::new("T2", "R2")).unwrap_err();

        assert!(err.to_string().contains("disk full"));
        assert_eq!(tokens.access_token().as_deref(), Some("T1"));
    }

    #[test]
    fn test_failed_rollback_reports_the_original_error() {
        let backend = Arc::new(FailingStore::new(true));
        let tokens = TokenStore::new(backend.clone());

        let err = tokens.save_pair(&TokenPair::new("T2", "R2")).unwrap_err();

        assert!(err.to_string().contains("disk full"));
        assert!(tokens.saved_at().is_none());
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = serde_json::to_value(TokenPair::new("T1", "R1")).unwrap();
        assert_eq!(json, serde_json::json!({"accessToken": "T1", "refreshToken": "R1"}));
    }
}
