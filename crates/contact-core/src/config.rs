use std::path::{Path, PathBuf};

use jsonschema::{validator_for, Validator};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8092;
pub const DEFAULT_CONCURRENCY: usize = 256;
pub const DEFAULT_STATE_DIR: &str = "state";

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1` or `0.0.0.0`.
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Maximum in-flight requests.
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub concurrency_limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Option<StorageBackend>,
    /// Directory holding `contacts.sqlite`.
    #[serde(default)]
    pub state_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    pub fn bind(&self) -> &str {
        self.server.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn concurrency_limit(&self) -> usize {
        self.server.concurrency_limit.unwrap_or(DEFAULT_CONCURRENCY)
    }

    pub fn backend(&self) -> StorageBackend {
        self.storage.backend.unwrap_or_default()
    }

    pub fn state_dir(&self) -> PathBuf {
        PathBuf::from(
            self.storage
                .state_dir
                .as_deref()
                .unwrap_or(DEFAULT_STATE_DIR),
        )
    }
}

static CONFIG_SCHEMA: Lazy<Validator> = Lazy::new(|| {
    let schema_value = config_schema_json();
    validator_for(&schema_value).expect("valid schema")
});

/// JSON schema describing the configuration file.
pub fn config_schema_json() -> serde_json::Value {
    let schema = schemars::schema_for!(Config);
    serde_json::to_value(&schema).expect("schema json")
}

/// Parse and schema-check TOML config text.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let raw: toml::Table = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    let json_value = serde_json::to_value(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    let validation_errors: Vec<String> = CONFIG_SCHEMA
        .iter_errors(&json_value)
        .map(|e| e.to_string())
        .collect();
    if !validation_errors.is_empty() {
        return Err(ConfigError::Schema(validation_errors));
    }
    toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&content)
}

/// Locate a config file relative to `CONTACT_CONFIG_DIR`, the executable,
/// the workspace root, or the working directory, in that order.
pub fn resolve_config_path(rel: &str) -> Option<PathBuf> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return rel_path.exists().then(|| rel_path.to_path_buf());
    }

    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Ok(cfg_dir) = std::env::var("CONTACT_CONFIG_DIR") {
        if !cfg_dir.trim().is_empty() {
            candidates.push(PathBuf::from(cfg_dir));
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.to_path_buf());
            if let Some(parent) = exe_dir.parent() {
                candidates.push(parent.to_path_buf());
            }
        }
    }

    candidates.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../"));

    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd);
    }

    candidates
        .into_iter()
        .map(|base| base.join(rel))
        .find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.bind(), DEFAULT_BIND);
        assert_eq!(cfg.port(), DEFAULT_PORT);
        assert_eq!(cfg.concurrency_limit(), DEFAULT_CONCURRENCY);
        assert_eq!(cfg.backend(), StorageBackend::Sqlite);
        assert_eq!(cfg.state_dir(), PathBuf::from(DEFAULT_STATE_DIR));
    }

    #[test]
    fn parses_all_sections() {
        let cfg = parse_config(
            r#"
            [server]
            bind = "0.0.0.0"
            port = 9000
            concurrency_limit = 8

            [storage]
            backend = "memory"
            state_dir = "/var/lib/contacts"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.bind(), "0.0.0.0");
        assert_eq!(cfg.port(), 9000);
        assert_eq!(cfg.concurrency_limit(), 8);
        assert_eq!(cfg.backend(), StorageBackend::Memory);
        assert_eq!(cfg.state_dir(), PathBuf::from("/var/lib/contacts"));
    }

    #[test]
    fn schema_rejects_unknown_backend() {
        let err = parse_config("[storage]\nbackend = \"postgres\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)), "{err}");
    }

    #[test]
    fn schema_rejects_wrong_types() {
        let err = parse_config("[server]\nport = \"eighty\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)), "{err}");
    }

    #[test]
    fn schema_rejects_zero_concurrency_limit() {
        let err = parse_config("[server]\nconcurrency_limit = 0\n").unwrap_err();
        match err {
            ConfigError::Schema(messages) => {
                assert!(messages.iter().any(|m| m.contains('0')), "{messages:?}")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            parse_config("[server]\nconcurrency_limit = 1\n")
                .unwrap()
                .concurrency_limit(),
            1
        );
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse_config("[server\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.toml");
        std::fs::write(&path, "[server]\nport = 8123\n").unwrap();
        assert_eq!(load_config(&path).unwrap().port(), 8123);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            load_config(&missing),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn shipped_default_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs/default.toml");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.port(), DEFAULT_PORT);
        assert_eq!(cfg.backend(), StorageBackend::Sqlite);
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Memory".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert!("redis".parse::<StorageBackend>().is_err());
    }
}
