//! # Vault Server Configuration
//!
//! Resolves the settings the vault server needs from, in increasing
//! precedence:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, `MDVAULT_CONFIG`, or
//!    `~/.config/mdvault/config.toml` when present)
//! 3. Environment variables (`MARKDOWN_VAULT_PATH`, `DAILY_NOTE_FORMAT`,
//!    `MDVAULT_CLI`)
//! 4. Explicit overrides, usually from command-line flags
//!
//! ```no_run
//! use mdvault_config::{ConfigLayer, ConfigLoader};
//!
//! let config = ConfigLoader::new()
//!     .with_overrides(ConfigLayer {
//!         vault_path: Some("/home/me/notes".into()),
//!         ..Default::default()
//!     })
//!     .load()?;
//! println!("serving {}", config.vault_path.display());
//! # Ok::<(), mdvault_config::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod loader;

pub use loader::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Default daily note location, a `strftime` pattern relative to the vault
pub const DEFAULT_DAILY_NOTE_FORMAT: &str = "daily/%Y-%m-%d.md";

/// Default name of the delegated vault CLI
pub const DEFAULT_CLI_BINARY: &str = "mdv";

/// Errors raised while resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No source provided a vault path.
    #[error("MARKDOWN_VAULT_PATH environment variable is not set")]
    MissingVaultPath,

    /// The configured vault path is not an existing directory.
    #[error("Vault directory not found: {}", path.display())]
    VaultNotFound {
        /// The path that was configured
        path: PathBuf,
    },

    /// A setting has a value that cannot be used.
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Name of the offending setting
        field: String,
        /// The rejected value, or why it was rejected
        value: String,
    },

    /// The configuration file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("Failed to parse config file {}: {message}", path.display())]
    Parse {
        /// Path of the configuration file
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

/// Fully resolved server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultConfig {
    /// Root directory of the vault
    pub vault_path: PathBuf,

    /// `strftime` pattern for the daily note path, relative to the vault
    pub daily_note_format: String,

    /// Name or path of the delegated vault CLI
    pub cli_binary: String,
}

/// A partial configuration from one source.
///
/// Unset fields fall through to lower-precedence sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    /// Root directory of the vault
    pub vault_path: Option<PathBuf>,

    /// `strftime` pattern for the daily note path
    pub daily_note_format: Option<String>,

    /// Name or path of the delegated vault CLI
    pub cli_binary: Option<String>,
}

impl ConfigLayer {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            vault_path: other.vault_path.or(self.vault_path),
            daily_note_format: other.daily_note_format.or(self.daily_note_format),
            cli_binary: other.cli_binary.or(self.cli_binary),
        }
    }

    /// Apply defaults and validate.
    pub fn resolve(self) -> Result<VaultConfig, ConfigError> {
        let vault_path = self.vault_path.ok_or(ConfigError::MissingVaultPath)?;
        if !vault_path.is_dir() {
            return Err(ConfigError::VaultNotFound { path: vault_path });
        }

        let daily_note_format = self
            .daily_note_format
            .unwrap_or_else(|| DEFAULT_DAILY_NOTE_FORMAT.to_string());
        if !daily_note_format.ends_with(".md") {
            return Err(ConfigError::InvalidValue {
                field: "daily_note_format".to_string(),
                value: format!("'{daily_note_format}' must end in .md"),
            });
        }

        let cli_binary = self
            .cli_binary
            .unwrap_or_else(|| DEFAULT_CLI_BINARY.to_string());
        if cli_binary.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "cli_binary".to_string(),
                value: "must not be empty".to_string(),
            });
        }

        Ok(VaultConfig {
            vault_path,
            daily_note_format,
            cli_binary,
        })
    }
}
