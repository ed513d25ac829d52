use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Stored credentials for one registry host.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AuthEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// `<datum-home>/config.json`: free-form string settings plus per-host
/// auth entries written by `datum login`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub auth: BTreeMap<String, AuthEntry>,
    #[serde(flatten)]
    pub values: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file is corrupted and cannot be parsed: {}", path.display())]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Write(#[from] datum_fs::Error),
}

impl Config {
    /// A missing file is an empty config; an unreadable or unparseable
    /// one is an error the caller surfaces before doing anything else.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Corrupted {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Write(datum_fs::Error::Create {
                    path: parent.to_path_buf(),
                    source: e,
                })
            })?;
        }
        let body = serde_json::to_vec_pretty(self).map_err(|e| ConfigError::Corrupted {
            path: path.to_path_buf(),
            source: e,
        })?;
        datum_fs::atomic_write(path, &body)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }

    pub fn unset(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn token(&self, host: &str) -> Option<String> {
        self.auth.get(host)?.token.clone()
    }

    pub fn username(&self, host: &str) -> Option<String> {
        self.auth.get(host)?.username.clone()
    }

    pub fn set_auth(&mut self, host: &str, token: String, username: Option<String>) {
        let entry = self.auth.entry(host.to_string()).or_default();
        entry.token = Some(token);
        if username.is_some() {
            entry.username = username;
        }
    }

    pub fn clear_auth(&mut self, host: &str) -> bool {
        self.auth.remove(host).is_some()
    }
}
