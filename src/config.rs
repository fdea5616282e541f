//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.clausewise.toml` files. Values that would live in extension storage
//! (API key, feature flags) are passed in from here, never read ad hoc.

use crate::analysis::AnalysisRoute;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name.
pub const CONFIG_FILE: &str = ".clausewise.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Feature flags.
    #[serde(default)]
    pub features: FeatureFlags,

    /// Local dictionary settings.
    #[serde(default)]
    pub glossary: GlossaryConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Contract service / API gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// API gateway base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            api_key: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Feature toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Consult the local glossary before the remote service.
    #[serde(default = "default_true")]
    pub glossary: bool,

    /// Ask the LLM service about terms the glossary does not know.
    #[serde(default = "default_true")]
    pub remote_fallback: bool,

    /// Show colored risk badges in Markdown output.
    #[serde(default = "default_true")]
    pub risk_tags: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            glossary: true,
            remote_fallback: true,
            risk_tags: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Local dictionary settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlossaryConfig {
    /// Dictionary file path or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Endpoint used for risk analysis.
    #[serde(default)]
    pub route: AnalysisRoute,

    /// Title used when none is given.
    #[serde(default = "default_title")]
    pub default_title: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            route: AnalysisRoute::default(),
            default_title: default_title(),
        }
    }
}

fn default_title() -> String {
    "Quick Analyze".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.service.base_url = url.clone();
        }
        if let Some(ref key) = args.api_key {
            self.service.api_key = Some(key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.service.timeout_seconds = timeout;
        }

        if let Some(ref path) = args.glossary {
            self.glossary.path = Some(path.clone());
        }
        if args.no_glossary {
            self.features.glossary = false;
        }
        if args.no_remote_fallback {
            self.features.remote_fallback = false;
        }

        if let Some(route) = args.route {
            self.analysis.route = route;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
