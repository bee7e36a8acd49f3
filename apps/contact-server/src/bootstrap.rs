use std::path::PathBuf;

use anyhow::{anyhow, Context};
use contact_core::{
    load_config, resolve_config_path, Config, ConfigError, LocalStore, StorageBackend,
};
use contact_kernel::Kernel;
use tracing::{debug, info};

use crate::{access_log, AppState};

const DEFAULT_CONFIG_REL: &str = "configs/default.toml";

/// Read the service config from `CONTACT_CONFIG`, else the first
/// `configs/default.toml` found on the search path, else defaults.
pub(crate) fn load_service_config() -> Result<Config, ConfigError> {
    let explicit = std::env::var("CONTACT_CONFIG")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    match explicit.or_else(|| resolve_config_path(DEFAULT_CONFIG_REL)) {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            load_config(&path)
        }
        None => {
            debug!("no config file found; using defaults");
            Ok(Config::default())
        }
    }
}

pub(crate) fn attach_http_layers(
    router: axum::Router<()>,
    concurrency_limit: usize,
) -> axum::Router<()> {
    use tower::limit::ConcurrencyLimitLayer;
    use tower_http::trace::TraceLayer;

    router
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(concurrency_limit))
}

pub(crate) fn attach_global_layers(router: axum::Router<()>) -> axum::Router<()> {
    router.layer(axum::middleware::from_fn(access_log::access_log_mw))
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum HttpConfigError {
    #[error("invalid CONTACT_HTTP_MAX_CONC: {0}")]
    InvalidConcurrency(String),
    #[error("invalid CONTACT_PORT: {0}")]
    InvalidPort(String),
    #[error("invalid CONTACT_BIND: {0}")]
    InvalidBind(String),
    #[error("server.concurrency_limit must be at least 1")]
    ZeroConcurrencyLimit,
}

#[derive(Debug)]
pub(crate) struct HttpConfig {
    pub addr: std::net::SocketAddr,
    pub concurrency_limit: usize,
}

/// Listener settings from the config file, overridden by `CONTACT_BIND`,
/// `CONTACT_PORT` and `CONTACT_HTTP_MAX_CONC`.
pub(crate) fn http_config(cfg: &Config) -> Result<HttpConfig, HttpConfigError> {
    let concurrency_limit = std::env::var("CONTACT_HTTP_MAX_CONC")
        .ok()
        .map(|raw| match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(HttpConfigError::InvalidConcurrency(raw)),
        })
        .transpose()?
        .unwrap_or_else(|| cfg.concurrency_limit());
    if concurrency_limit == 0 {
        return Err(HttpConfigError::ZeroConcurrencyLimit);
    }

    let bind = std::env::var("CONTACT_BIND").unwrap_or_else(|_| cfg.bind().to_string());
    let port = match std::env::var("CONTACT_PORT") {
        Ok(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|_| HttpConfigError::InvalidPort(raw))?,
        Err(_) => cfg.port(),
    };

    let host = if bind.contains(':') && !bind.starts_with('[') {
        format!("[{bind}]")
    } else {
        bind.clone()
    };
    let addr = format!("{host}:{port}")
        .parse()
        .map_err(|_| HttpConfigError::InvalidBind(bind))?;

    Ok(HttpConfig {
        addr,
        concurrency_limit,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StorageSettings {
    pub backend: StorageBackend,
    pub state_dir: PathBuf,
}

/// Storage settings with `CONTACT_STORAGE` and `CONTACT_STATE_DIR` applied.
pub(crate) fn storage_settings(cfg: &Config) -> anyhow::Result<StorageSettings> {
    let backend = match std::env::var("CONTACT_STORAGE") {
        Ok(raw) => raw
            .parse::<StorageBackend>()
            .map_err(|bad| anyhow!("invalid CONTACT_STORAGE: {bad}"))?,
        Err(_) => cfg.backend(),
    };
    let state_dir = std::env::var("CONTACT_STATE_DIR")
        .ok()
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| cfg.state_dir());
    Ok(StorageSettings { backend, state_dir })
}

pub(crate) fn build_state(settings: &StorageSettings) -> anyhow::Result<AppState> {
    match settings.backend {
        StorageBackend::Sqlite => {
            let kernel = Kernel::open(&settings.state_dir).with_context(|| {
                format!("open contact store in {}", settings.state_dir.display())
            })?;
            info!(path = %kernel.db_path().display(), "sqlite contact store ready");
            Ok(AppState::with_kernel(kernel))
        }
        StorageBackend::Memory => {
            info!("in-memory contact store ready; contacts are lost on exit");
            Ok(AppState::in_memory(LocalStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env as test_env;
    use std::io::Write as _;

    const ENV_KEYS: &[&str] = &[
        "CONTACT_CONFIG",
        "CONTACT_CONFIG_DIR",
        "CONTACT_BIND",
        "CONTACT_PORT",
        "CONTACT_HTTP_MAX_CONC",
        "CONTACT_STORAGE",
        "CONTACT_STATE_DIR",
    ];

    #[test]
    fn http_config_uses_file_values_without_env() {
        let mut guard = test_env::guard();
        guard.clear_all(ENV_KEYS);
        let cfg = contact_core::config::parse_config(
            "[server]\nbind = \"0.0.0.0\"\nport = 9000\nconcurrency_limit = 8\n",
        )
        .expect("parse");
        let http = http_config(&cfg).expect("http config");
        assert_eq!(http.addr.to_string(), "0.0.0.0:9000");
        assert_eq!(http.concurrency_limit, 8);
    }

    #[test]
    fn http_config_env_overrides_file() {
        let mut guard = test_env::guard();
        guard.clear_all(ENV_KEYS);
        guard.set("CONTACT_BIND", "::1");
        guard.set("CONTACT_PORT", "8100");
        guard.set("CONTACT_HTTP_MAX_CONC", "4");
        let http = http_config(&Config::default()).expect("http config");
        assert_eq!(http.addr.to_string(), "[::1]:8100");
        assert_eq!(http.concurrency_limit, 4);
    }

    #[test]
    fn http_config_rejects_bad_values() {
        let mut guard = test_env::guard();
        guard.clear_all(ENV_KEYS);
        guard.set("CONTACT_PORT", "not-a-port");
        assert!(matches!(
            http_config(&Config::default()),
            Err(HttpConfigError::InvalidPort(_))
        ));
        guard.remove("CONTACT_PORT");

        guard.set("CONTACT_HTTP_MAX_CONC", "0");
        assert!(matches!(
            http_config(&Config::default()),
            Err(HttpConfigError::InvalidConcurrency(_))
        ));
        guard.remove("CONTACT_HTTP_MAX_CONC");

        guard.set("CONTACT_BIND", "not an address");
        assert!(matches!(
            http_config(&Config::default()),
            Err(HttpConfigError::InvalidBind(_))
        ));
    }

    #[test]
    fn zero_limit_in_config_is_not_blamed_on_env() {
        let mut guard = test_env::guard();
        guard.clear_all(ENV_KEYS);
        let mut cfg = Config::default();
        cfg.server.concurrency_limit = Some(0);
        let err = http_config(&cfg).unwrap_err();
        assert!(matches!(err, HttpConfigError::ZeroConcurrencyLimit));
        assert!(!err.to_string().contains("CONTACT_HTTP_MAX_CONC"));

        guard.set("CONTACT_HTTP_MAX_CONC", "12");
        assert_eq!(http_config(&cfg).expect("env wins").concurrency_limit, 12);
    }

    #[test]
    fn storage_settings_env_overrides() {
        let mut guard = test_env::guard();
        guard.clear_all(ENV_KEYS);
        let defaults = storage_settings(&Config::default()).expect("defaults");
        assert_eq!(defaults.backend, StorageBackend::Sqlite);
        assert_eq!(defaults.state_dir, PathBuf::from("state"));

        guard.set("CONTACT_STORAGE", "Memory");
        guard.set("CONTACT_STATE_DIR", "/tmp/contacts");
        let overridden = storage_settings(&Config::default()).expect("overrides");
        assert_eq!(overridden.backend, StorageBackend::Memory);
        assert_eq!(overridden.state_dir, PathBuf::from("/tmp/contacts"));

        guard.set("CONTACT_STORAGE", "postgres");
        assert!(storage_settings(&Config::default()).is_err());
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let mut guard = test_env::guard();
        guard.clear_all(ENV_KEYS);
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[storage]\nbackend = \"memory\"").expect("write config");
        guard.set("CONTACT_CONFIG", file.path().display().to_string());
        let cfg = load_service_config().expect("load");
        assert_eq!(cfg.backend(), StorageBackend::Memory);

        guard.set("CONTACT_CONFIG", "/nonexistent/contact.toml");
        assert!(matches!(
            load_service_config(),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn sqlite_state_opens_in_state_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = StorageSettings {
            backend: StorageBackend::Sqlite,
            state_dir: dir.path().join("nested"),
        };
        build_state(&settings).expect("build state");
        assert!(dir.path().join("nested").join("contacts.sqlite").exists());
    }
}
