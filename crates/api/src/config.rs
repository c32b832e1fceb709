// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_FILES_DIR: &str = "data/challenge-files";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Allowed CORS origin, any origin if unset
    pub client_origin: Option<String>,
    pub challenge_files_dir: PathBuf,
    /// Without a database URL the catalog is rebuilt from the filesystem on every read
    pub database_url: Option<String>,
    /// Externally visible host, wins over anything derived from a request
    pub public_host: Option<String>,
    pub server_hostname: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    var: "PORT",
                    value: value.clone(),
                    reason: e.to_string(),
                })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            client_origin: var("CLIENT_ORIGIN"),
            challenge_files_dir: PathBuf::from(
                var("CHALLENGE_FILES_DIR").unwrap_or_else(|| DEFAULT_FILES_DIR.to_string()),
            ),
            database_url: var("DATABASE_URL"),
            public_host: var("PUBLIC_HOST").or_else(|| var("SSH_HOST")),
            server_hostname: var("HOSTNAME"),
        })
    }
}
