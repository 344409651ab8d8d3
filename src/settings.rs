//! Theme and language preferences

use std::sync::Arc;

use crate::Result;
use crate::config::Config;
use crate::error::Error;
use crate::storage::{KeyValueStore, StorageKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

pub struct Settings {
    store: Arc<dyn KeyValueStore>,
    default_language: String,
    languages: Vec<String>,
    prefer_dark: bool,
}

impl Settings {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        Self {
            store,
            default_language: config.default_language.clone(),
            languages: config.languages.clone(),
            prefer_dark: config.prefer_dark,
        }
    }

    /// Stored choice, or the configured preference if never toggled
    pub fn theme(&self) -> Theme {
        let dark = match self.store.retrieve(StorageKey::DarkTheme) {
            Some(value) => value == "true",
            None => self.prefer_dark,
        };
        if dark { Theme::Dark } else { Theme::Light }
    }

    pub fn is_dark(&self) -> bool {
        self.theme() == Theme::Dark
    }

    pub fn set_dark(&self, dark: bool) -> Result<()> {
        self.store
            .save(StorageKey::DarkTheme, if dark { "true" } else { "false" })?;
        tracing::debug!("Theme set to {}", if dark { "dark" } else { "light" });
        Ok(())
    }

    /// Selected language, falling back to the configured default
    pub fn language(&self) -> String {
        self.store
            .retrieve(StorageKey::SelectedLanguage)
            .filter(|lang| self.languages.contains(lang))
            .unwrap_or_else(|| self.default_language.clone())
    }

    pub fn set_language(&self, lang: &str) -> Result<()> {
        let lang = lang.trim().to_lowercase();
        if !self.languages.contains(&lang) {
            return Err(Error::Config(format!(
                "Unsupported language '{}', choose one of: {}",
                lang,
                self.languages.join(", ")
            )));
        }
        self.store.save(StorageKey::SelectedLanguage, &lang)?;
        tracing::debug!("Language set to {}", lang);
        Ok(())
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }
}
