//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::Result;
use crate::error::Error;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the todo API, e.g. `http://localhost:8000/api`
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Transport timeout for every HTTP call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Language used when none has been selected yet
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Languages the user may switch to
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Theme used when the user never toggled it explicitly
    #[serde(default)]
    pub prefer_dark: bool,
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_language() -> String {
    "en".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string(), "it".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            default_language: default_language(),
            languages: default_languages(),
            prefer_dark: false,
        }
    }
}

impl Config {
    /// Check the values a user can get wrong by hand-editing the file
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "api_url must be http(s), got {}",
                url.scheme()
            )));
        }
        if !self.languages.contains(&self.default_language) {
            return Err(Error::Config(format!(
                "default_language '{}' is not one of {:?}",
                self.default_language, self.languages
            )));
        }
        Ok(())
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tudu")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from a specific file
pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Config not found at {:?}. Run 'tudu onboard' first.",
            path
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration, falling back to defaults when no file exists
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    if path.exists() {
        load_from(&path)
    } else {
        tracing::debug!("No config at {:?}, using defaults", path);
        Ok(Config::default())
    }
}

/// Save configuration to the default location
pub fn save(config: &Config) -> Result<()> {
    save_to(config, &config_path())
}

/// Save configuration to a specific file
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Interactive first-run setup
pub fn onboard() -> Result<()> {
    use crate::ui;
    use inquire::{Confirm, Select, Text};

    ui::print_header("Setup");
    println!("  Let's point Tudu at your todo server.\n");

    let mut config = Config::default();

    let api_url = Text::new("API base URL:")
        .with_default(&config.api_url)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    config.api_url = api_url.trim_end_matches('/').to_string();

    let languages: Vec<&str> = config.languages.iter().map(String::as_str).collect();
    let language = Select::new("Default language:", languages)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    config.default_language = language.to_string();

    config.prefer_dark = Confirm::new("Use the dark theme by default?")
        .with_default(false)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;

    config.validate()?;

    ui::print_thinking("Saving configuration");
    save(&config)?;

    println!();
    ui::print_success("Setup complete!");
    ui::print_step("Run 'tudu register' or 'tudu login' to get started.");

    Ok(())
}

/// Delete all configuration and stored data
pub fn reset() -> Result<()> {
    use inquire::Confirm;
    use crate::ui;

    ui::print_warning("This will delete the Tudu configuration and stored session.");

    let confirmed = Confirm::new("Are you sure you want to reset Tudu?")
        .with_default(false)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;

    if confirmed {
        let dir = config_dir();
        if dir.exists() {
            ui::print_thinking(&format!("Deleting {:?}", dir));
            std::fs::remove_dir_all(dir)?;
            ui::print_success("Tudu has been reset.");
        } else {
            ui::print_step("No configuration directory found.");
        }
    } else {
        ui::print_step("Reset cancelled.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_language, "en");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"api_url": "https://todo.example.com"}"#).unwrap();
        assert_eq!(config.api_url, "https://todo.example.com");
        assert_eq!(config.languages, vec!["en", "it"]);
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = Config {
            api_url: "ftp://todo.example.com".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_unknown_default_language() {
        let config = Config {
            default_language: "fr".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_from_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            api_url: "https://todo.example.com/api".to_string(),
            prefer_dark: true,
            ..Config::default()
        };
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.api_url, config.api_url);
        assert!(loaded.prefer_dark);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        let config = load_or_default(Some(&path)).unwrap();
        assert_eq!(config.api_url, default_api_url());
    }
}
