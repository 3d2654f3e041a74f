// ASTRA - GPL-3.0-or-later
// This file is part of ASTRA.
//
// Copyright (C) 2025 ASTRA Collaboration
//
// ASTRA is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// ASTRA is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with ASTRA.  If not, see <https://www.gnu.org/licenses/>.

use crate::anomaly::DEFAULT_THRESHOLD;
use crate::crossmatch::gaia::{DEFAULT_RADIUS_ARCSEC, DEFAULT_TAP_URL};
use crate::report::FOLLOW_UP_COUNT;
use crate::source::rochester::DEFAULT_MAX_ENTRIES;
use crate::source::{DEFAULT_FALLBACK_URL, DEFAULT_PRIMARY_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to access config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// User configuration stored in the config directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AstraConfig {
    /// Transient list with positions
    pub primary_url: String,
    /// Table page tried once when the primary list is empty
    pub fallback_url: String,
    pub gaia_tap_url: String,
    pub search_radius_arcsec: f64,
    pub http_timeout_secs: u64,
    /// Minimum score for a candidate to be reported
    pub threshold: f64,
    pub max_entries: usize,
    pub parallel_enrichment: bool,
    pub follow_up_count: usize,
}

impl Default for AstraConfig {
    fn default() -> Self {
        Self {
            primary_url: DEFAULT_PRIMARY_URL.to_string(),
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
            gaia_tap_url: DEFAULT_TAP_URL.to_string(),
            search_radius_arcsec: DEFAULT_RADIUS_ARCSEC,
            http_timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            threshold: DEFAULT_THRESHOLD,
            max_entries: DEFAULT_MAX_ENTRIES,
            parallel_enrichment: false,
            follow_up_count: FOLLOW_UP_COUNT,
        }
    }
}

impl AstraConfig {
    /// Get the path to the user config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("astra").join("config.json"))
    }

    /// Load the user config, returning defaults if it is missing or unreadable
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            tracing::info!("No config found, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Load an explicitly requested config file. Missing or invalid files are errors.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        tracing::info!("Loading config from {path:?}");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to the user config file
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_error)?;

        tracing::info!("Saved config to {path:?}");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if !self.search_radius_arcsec.is_finite() || self.search_radius_arcsec <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "search radius must be positive, got {}",
                self.search_radius_arcsec
            )));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid("HTTP timeout must be at least one second".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
