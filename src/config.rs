// Allow dead code: Infrastructure methods for future use
#![allow(dead_code)]

//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes an optional API base URL override and fallback
//! coordinates for hosts without a location service.
//!
//! Configuration is stored at `~/.config/scriim-cli/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "scriim-cli";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Production API base URL
const PROD_API: &str = "https://scriim-api.vercel.app/api";

/// Development API base URL
const DEV_API: &str = "http://192.168.14.2:5000/api";

/// Environment variable selecting the API environment.
/// Any value other than "development" selects production.
const ENV_VAR: &str = "SCRIIM_ENV";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted contact store
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Resolve the API base URL: explicit override first, then the
    /// environment selector, then production.
    pub fn api_base_url(&self) -> String {
        if let Some(ref url) = self.api_url {
            return url.clone();
        }
        match std::env::var(ENV_VAR) {
            Ok(v) if v == "development" => DEV_API.to_string(),
            _ => PROD_API.to_string(),
        }
    }
}
