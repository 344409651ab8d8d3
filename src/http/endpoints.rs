//! API endpoint URLs and the table saying which of them need a token

use std::collections::HashMap;

use url::Url;

use crate::Result;
use crate::error::Error;

/// Flat URL → "requires auth after login" table.
///
/// Lookup is an exact match first, then the longest registered prefix.
/// Anything unregistered requires auth.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    entries: HashMap<String, bool>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `url` (or URL prefix)
    pub fn register(&mut self, url: &str, requires_auth: bool) -> &mut Self {
        self.entries.insert(normalize(url).to_string(), requires_auth);
        self
    }

    pub fn requires_auth(&self, url: &str) -> bool {
        let url = normalize(url);

        if let Some(&flag) = self.entries.get(url) {
            return flag;
        }

        self.entries
            .iter()
            .filter(|(pattern, _)| url.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, &flag)| flag)
            .unwrap_or(true)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drop query string and fragment
fn normalize(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// URLs of the todo API under a configured base
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    base: String,
}

impl ApiEndpoints {
    pub fn new(api_url: &str) -> Result<Self> {
        let parsed = Url::parse(api_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!("Unsupported API scheme: {}", parsed.scheme())));
        }
        Ok(Self {
            base: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn login(&self) -> String {
        format!("{}/auth/login/", self.base)
    }

    pub fn register(&self) -> String {
        format!("{}/auth/register/", self.base)
    }

    pub fn refresh(&self) -> String {
        format!("{}/auth/refresh/", self.base)
    }

    /// Collection URL: list and create
    pub fn todos(&self) -> String {
        format!("{}/todos/", self.base)
    }

    /// Item URL: read, update and delete. `id` is percent-encoded as a
    /// single path segment.
    pub fn todo(&self, id: &str) -> Result<String> {
        let mut url = Url::parse(&self.todos())?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Cannot build item URLs under {}", self.base)))?
            .pop_if_empty()
            .push(id);
        Ok(url.into())
    }

    /// Registry for these endpoints. Built once at startup.
    pub fn registry(&self) -> EndpointRegistry {
        let mut registry = EndpointRegistry::new();
        registry
            .register(&self.login(), false)
            .register(&self.register(), false)
            .register(&self.refresh(), false)
            .register(&self.todos(), true);
        registry
    }
}

/// Only http(s) requests go through token handling
pub fn is_network_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> ApiEndpoints {
        ApiEndpoints::new("http://localhost:8000/api/").unwrap()
    }

    #[test]
    fn test_urls_are_joined_without_double_slash() {
        let e = endpoints();
        assert_eq!(e.login(), "http://localhost:8000/api/auth/login/");
        assert_eq!(e.todo("42").unwrap(), "http://localhost:8000/api/todos/42");
    }

    #[test]
    fn test_default_table() {
        let e = endpoints();
        let registry = e.registry();

        assert!(!registry.requires_auth(&e.login()));
        assert!(!registry.requires_auth(&e.register()));
        assert!(!registry.requires_auth(&e.refresh()));
        assert!(registry.requires_auth(&e.todos()));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_item_urls_match_by_prefix() {
        let e = endpoints();
        assert!(e.registry().requires_auth(&e.todo("abc").unwrap()));
    }

    #[test]
    fn test_item_ids_stay_one_segment() {
        let e = endpoints();
        let registry = e.registry();

        let url = e.todo("a/b?c#d").unwrap();
        assert_eq!(url, "http://localhost:8000/api/todos/a%2Fb%3Fc%23d");
        assert!(registry.requires_auth(&url));

        // Would otherwise resolve to the public login route
        let url = e.todo("../auth/login/").unwrap();
        assert!(url.starts_with(&e.todos()));
        assert!(registry.requires_auth(&url));
    }

    #[test]
    fn test_unknown_urls_fail_closed() {
        let registry = endpoints().registry();
        assert!(registry.requires_auth("http://localhost:8000/api/users/me"));
        assert!(EndpointRegistry::new().requires_auth("http://anything/"));
    }

    #[test]
    fn test_query_string_is_ignored() {
        let e = endpoints();
        let url = format!("{}?next=home#top", e.login());
        assert!(!e.registry().requires_auth(&url));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut registry = EndpointRegistry::new();
        registry
            .register("http://h/api/", true)
            .register("http://h/api/public/", false);
        assert!(!registry.requires_auth("http://h/api/public/docs"));
        assert!(registry.requires_auth("http://h/api/private"));
    }

    #[test]
    fn test_network_url() {
        assert!(is_network_url("https://h/x"));
        assert!(!is_network_url("assets/i18n/en.json"));
        assert!(!is_network_url("file:///tmp/x"));
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(ApiEndpoints::new("ftp://h/api").is_err());
        assert!(ApiEndpoints::new("not a url").is_err());
    }
}
