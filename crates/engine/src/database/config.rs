//! Database configuration via `tessera.toml`
//!
//! A database directory carries its settings in a small TOML file. On
//! first open a commented default is written; edit it and reopen to change
//! settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_core::error::{Error, Result};
use tessera_durability::DurabilityMode;

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "tessera.toml";

/// Storage engine selected by a config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// In-memory engine; nothing survives the process
    Memory,
    /// WAL-backed engine in a directory
    Log,
}

impl EngineKind {
    /// Name as written in the config file
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Memory => "memory",
            EngineKind::Log => "log",
        }
    }
}

/// Database configuration loaded from `tessera.toml`.
///
/// # Example
///
/// ```toml
/// # Engine: "memory" or "log"; empty picks "memory" without a path and
/// # "log" with one
/// engine = "log"
/// path = "/var/lib/tessera"
///
/// # Durability mode: "standard" (default) or "always"
/// durability = "standard"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Engine name: `"memory"`, `"log"` or empty.
    #[serde(default)]
    pub engine: String,
    /// Database directory, required by the log engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Durability mode: `"standard"` or `"always"`.
    #[serde(default = "default_durability_str")]
    pub durability: String,
}

fn default_durability_str() -> String {
    "standard".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            engine: String::new(),
            path: None,
            durability: default_durability_str(),
        }
    }
}

impl DatabaseConfig {
    /// In-memory database
    pub fn memory() -> Self {
        Self {
            engine: EngineKind::Memory.as_str().to_string(),
            ..Default::default()
        }
    }

    /// WAL-backed database in `path`
    pub fn log<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            engine: EngineKind::Log.as_str().to_string(),
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Set the durability mode string
    pub fn with_durability(mut self, durability: impl Into<String>) -> Self {
        self.durability = durability.into();
        self
    }

    /// Resolve the engine, applying the empty-name default.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unknown engine name, or for `log`
    /// without a path.
    pub fn engine_kind(&self) -> Result<EngineKind> {
        let kind = match self.named_engine()? {
            Some(kind) => kind,
            None if self.path.is_some() => EngineKind::Log,
            None => EngineKind::Memory,
        };
        if kind == EngineKind::Log && self.path.is_none() {
            return Err(Error::InvalidConfig(
                "engine \"log\" requires a path".to_string(),
            ));
        }
        Ok(kind)
    }

    /// The explicitly named engine, `None` when the name is empty
    fn named_engine(&self) -> Result<Option<EngineKind>> {
        match self.engine.as_str() {
            "" => Ok(None),
            "memory" => Ok(Some(EngineKind::Memory)),
            "log" => Ok(Some(EngineKind::Log)),
            other => Err(Error::InvalidConfig(format!(
                "unknown engine '{}'. Expected \"memory\" or \"log\".",
                other
            ))),
        }
    }

    /// Parse the durability string into a `DurabilityMode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"standard"` or `"always"`.
    pub fn durability_mode(&self) -> Result<DurabilityMode> {
        match self.durability.as_str() {
            "standard" => Ok(DurabilityMode::standard_default()),
            "always" => Ok(DurabilityMode::Always),
            other => Err(Error::InvalidConfig(format!(
                "invalid durability mode '{}'. Expected \"standard\" or \"always\".",
                other
            ))),
        }
    }

    /// Check every setting
    pub fn validate(&self) -> Result<()> {
        self.engine_kind()?;
        self.durability_mode()?;
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Tessera database configuration
#
# Engine: "memory" or "log" (default: "log" when a path is set)
#   "memory" = nothing survives the process
#   "log"    = write-ahead log in the database directory
engine = "log"

# Database directory. Filled in from the directory being opened.
# path = "/var/lib/tessera"

# Durability mode: "standard" (default) or "always"
#   "standard" = periodic fsync (~100ms), may lose last interval on crash
#   "always"   = fsync every commit, zero data loss
durability = "standard"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a
    /// setting is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DatabaseConfig = toml::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.durability_mode()?;
        config.named_engine()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_memory_standard() {
        let config = DatabaseConfig::default();
        assert_eq!(config.engine_kind().unwrap(), EngineKind::Memory);
        assert!(matches!(
            config.durability_mode().unwrap(),
            DurabilityMode::Standard { .. }
        ));
    }

    #[test]
    fn empty_engine_with_path_is_log() {
        let config = DatabaseConfig {
            path: Some("/tmp/x".into()),
            ..Default::default()
        };
        assert_eq!(config.engine_kind().unwrap(), EngineKind::Log);
    }

    #[test]
    fn log_without_path_is_rejected() {
        let config = DatabaseConfig {
            engine: "log".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let config: DatabaseConfig = toml::from_str("engine = \"badger\"").unwrap();
        assert!(matches!(config.engine_kind(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn parse_invalid_mode_returns_error() {
        let config: DatabaseConfig = toml::from_str("durability = \"turbo\"").unwrap();
        assert!(config.durability_mode().is_err());
    }

    #[test]
    fn parse_always() {
        let config = DatabaseConfig::memory().with_durability("always");
        assert_eq!(config.durability_mode().unwrap(), DurabilityMode::Always);
    }

    #[test]
    fn default_toml_parses_correctly() {
        let config: DatabaseConfig = toml::from_str(DatabaseConfig::default_toml()).unwrap();
        assert_eq!(config.engine, "log");
        assert_eq!(config.durability, "standard");
        assert!(config.path.is_none());
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "engine = \"memory\"\n").unwrap();
        DatabaseConfig::write_default_if_missing(&path).unwrap();

        let config = DatabaseConfig::from_file(&path).unwrap();
        assert_eq!(config.engine, "memory");
    }

    #[test]
    fn from_file_with_missing_field_uses_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "").unwrap();

        let config = DatabaseConfig::from_file(&path).unwrap();
        assert_eq!(config, DatabaseConfig::default());
    }

    #[test]
    fn from_file_rejects_bad_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "durability = \"sometimes\"\n").unwrap();
        assert!(matches!(
            DatabaseConfig::from_file(&path),
            Err(Error::InvalidConfig(_))
        ));

        std::fs::write(&path, "engine = 5\n").unwrap();
        assert!(matches!(
            DatabaseConfig::from_file(&path),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let config = DatabaseConfig::log(dir.path().join("data")).with_durability("always");
        config.write_to_file(&path).unwrap();

        let loaded = DatabaseConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.engine_kind().unwrap(), EngineKind::Log);
    }
}
