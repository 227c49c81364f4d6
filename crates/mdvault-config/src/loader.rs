//! Layered configuration loading

use crate::{ConfigError, ConfigLayer, VaultConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the vault root
pub const ENV_VAULT_PATH: &str = "MARKDOWN_VAULT_PATH";
/// Environment variable for the daily note pattern
pub const ENV_DAILY_NOTE_FORMAT: &str = "DAILY_NOTE_FORMAT";
/// Environment variable for the delegated CLI binary
pub const ENV_CLI_BINARY: &str = "MDVAULT_CLI";
/// Environment variable pointing at a config file
pub const ENV_CONFIG_FILE: &str = "MDVAULT_CONFIG";

/// Builds a [`VaultConfig`] from defaults, file, environment and overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    overrides: ConfigLayer,
}

impl ConfigLoader {
    /// Create a loader with no explicit file and no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this config file instead of searching for one.
    pub fn with_file(mut self, path: Option<PathBuf>) -> Self {
        self.file = path;
        self
    }

    /// Settings that take precedence over every other source.
    pub fn with_overrides(mut self, overrides: ConfigLayer) -> Self {
        self.overrides = overrides;
        self
    }

    /// Resolve against the process environment.
    pub fn load(&self) -> Result<VaultConfig, ConfigError> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Resolve with a custom environment lookup.
    pub fn load_with_env<F>(&self, env: F) -> Result<VaultConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let file_layer = match self.config_file(&env) {
            Some(path) => {
                tracing::debug!("Loading config file {}", path.display());
                load_file(&path)?
            }
            None => ConfigLayer::default(),
        };

        let env_layer = ConfigLayer {
            vault_path: env(ENV_VAULT_PATH).map(PathBuf::from),
            daily_note_format: env(ENV_DAILY_NOTE_FORMAT),
            cli_binary: env(ENV_CLI_BINARY),
        };

        let config = file_layer
            .merge(env_layer)
            .merge(self.overrides.clone())
            .resolve()?;
        tracing::debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    /// The explicit file, then `MDVAULT_CONFIG`, then the per-user default
    /// when it exists.
    fn config_file(&self, env: &impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        if let Some(path) = &self.file {
            return Some(path.clone());
        }
        if let Some(path) = env(ENV_CONFIG_FILE) {
            return Some(PathBuf::from(path));
        }
        default_config_path().filter(|p| p.is_file())
    }
}

/// `<config dir>/mdvault/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mdvault").join("config.toml"))
}

/// Parse one TOML config file into a layer.
pub fn load_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn no_user_file(dir: &TempDir) -> ConfigLoader {
        // Point at an empty file so a real per-user config never leaks in.
        let path = dir.path().join("empty.toml");
        fs::write(&path, "").unwrap();
        ConfigLoader::new().with_file(Some(path))
    }

    #[test]
    fn test_missing_vault_path() {
        let dir = TempDir::new().unwrap();
        let err = no_user_file(&dir).load_with_env(env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVaultPath));
    }

    #[test]
    fn test_env_with_defaults() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().to_string_lossy().to_string();
        let config = no_user_file(&dir)
            .load_with_env(env_of(&[(ENV_VAULT_PATH, &vault)]))
            .unwrap();

        assert_eq!(config.vault_path, dir.path());
        assert_eq!(config.daily_note_format, "daily/%Y-%m-%d.md");
        assert_eq!(config.cli_binary, "mdv");
    }

    #[test]
    fn test_precedence_file_env_overrides() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().to_string_lossy().to_string();
        let file = dir.path().join("config.toml");
        fs::write(
            &file,
            format!(
                "vault_path = {vault:?}\ndaily_note_format = \"journal/%Y/%m-%d.md\"\ncli_binary = \"from-file\"\n"
            ),
        )
        .unwrap();

        let loader = ConfigLoader::new().with_file(Some(file));
        let from_file = loader.load_with_env(env_of(&[])).unwrap();
        assert_eq!(from_file.daily_note_format, "journal/%Y/%m-%d.md");
        assert_eq!(from_file.cli_binary, "from-file");

        let from_env = loader
            .load_with_env(env_of(&[(ENV_CLI_BINARY, "from-env")]))
            .unwrap();
        assert_eq!(from_env.cli_binary, "from-env");
        assert_eq!(from_env.daily_note_format, "journal/%Y/%m-%d.md");

        let overridden = loader
            .with_overrides(ConfigLayer {
                cli_binary: Some("from-flag".into()),
                ..Default::default()
            })
            .load_with_env(env_of(&[(ENV_CLI_BINARY, "from-env")]))
            .unwrap();
        assert_eq!(overridden.cli_binary, "from-flag");
    }

    #[test]
    fn test_config_file_from_env() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("alt.toml");
        fs::write(&file, "cli_binary = \"alt\"\n").unwrap();
        let vault = dir.path().to_string_lossy().to_string();
        let file_str = file.to_string_lossy().to_string();

        let config = ConfigLoader::new()
            .load_with_env(env_of(&[
                (ENV_CONFIG_FILE, &file_str),
                (ENV_VAULT_PATH, &vault),
            ]))
            .unwrap();
        assert_eq!(config.cli_binary, "alt");
    }

    #[test]
    fn test_empty_env_values_are_unset() {
        let dir = TempDir::new().unwrap();
        let err = no_user_file(&dir)
            .load_with_env(env_of(&[(ENV_VAULT_PATH, "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVaultPath));
    }

    #[test]
    fn test_vault_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope").to_string_lossy().to_string();
        let err = no_user_file(&dir)
            .load_with_env(env_of(&[(ENV_VAULT_PATH, &missing)]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::VaultNotFound { .. }));
    }

    #[test]
    fn test_daily_format_must_be_markdown() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().to_string_lossy().to_string();
        let err = no_user_file(&dir)
            .load_with_env(env_of(&[
                (ENV_VAULT_PATH, &vault),
                (ENV_DAILY_NOTE_FORMAT, "daily/%Y-%m-%d.txt"),
            ]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bad.toml");
        fs::write(&file, "vault = \"/tmp\"\n").unwrap();
        let err = load_file(&file).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
