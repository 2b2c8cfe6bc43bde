// Data Usage - Configuration
// Copyright (C) 2026 Christos Daggas
// SPDX-License-Identifier: MIT

//! Host-mapping settings from a local JSON file.
//!
//! Usage data itself is never persisted. This file only tunes where the
//! counters come from and which action id gates access to them.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::permission::DEFAULT_ACTION_ID;
use crate::usage::DEFAULT_MOBILE_PREFIXES;

/// Tunable host mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Interface-name prefixes counted as mobile.
    #[serde(default = "default_mobile_prefixes")]
    pub mobile_interface_prefixes: Vec<String>,
    /// Polkit action id checked for usage access.
    #[serde(default = "default_action_id")]
    pub polkit_action_id: String,
    /// Override for the sysfs network class root.
    #[serde(default)]
    pub sysfs_root: Option<PathBuf>,
}

fn default_mobile_prefixes() -> Vec<String> {
    DEFAULT_MOBILE_PREFIXES.iter().map(|s| s.to_string()).collect()
}

fn default_action_id() -> String {
    DEFAULT_ACTION_ID.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mobile_interface_prefixes: default_mobile_prefixes(),
            polkit_action_id: default_action_id(),
            sysfs_root: None,
        }
    }
}

impl Settings {
    /// Load settings from the user config dir, falling back to defaults on
    /// any failure.
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    fn load_from(path: &PathBuf) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("Failed to parse settings: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings: {}", e);
                Self::default()
            }
        }
    }

    fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("data-usage")
            .join("settings.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json"));
        assert_eq!(settings.polkit_action_id, DEFAULT_ACTION_ID);
        assert!(settings.mobile_interface_prefixes.contains(&"wwan".to_string()));
        assert!(settings.sysfs_root.is_none());
    }

    #[test]
    fn test_partial_file_keeps_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"mobile_interface_prefixes": ["cell"]}"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.mobile_interface_prefixes, vec!["cell".to_string()]);
        assert_eq!(settings.polkit_action_id, DEFAULT_ACTION_ID);
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.polkit_action_id, DEFAULT_ACTION_ID);
    }
}
