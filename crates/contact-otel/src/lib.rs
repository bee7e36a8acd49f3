use once_cell::sync::OnceCell;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Target used by the HTTP access log middleware.
pub const ACCESS_TARGET: &str = "http.access";

static ACCESS_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rotation {
    Minutely,
    Hourly,
    Daily,
}

impl Rotation {
    fn from_env_value(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hourly" => Rotation::Hourly,
            "minutely" => Rotation::Minutely,
            _ => Rotation::Daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AccessFileSettings {
    dir: String,
    prefix: String,
    rotation: Rotation,
}

impl AccessFileSettings {
    fn from_env() -> Option<Self> {
        if std::env::var("CONTACT_ACCESS_LOG_ROLL").ok().as_deref() != Some("1") {
            return None;
        }
        let dir = std::env::var("CONTACT_ACCESS_LOG_DIR")
            .ok()
            .or_else(|| std::env::var("CONTACT_LOGS_DIR").ok())
            .unwrap_or_else(|| "logs".to_string());
        let prefix =
            std::env::var("CONTACT_ACCESS_LOG_PREFIX").unwrap_or_else(|_| "http-access".into());
        let rotation = Rotation::from_env_value(
            &std::env::var("CONTACT_ACCESS_LOG_ROTATION").unwrap_or_else(|_| "daily".into()),
        );
        Some(Self {
            dir,
            prefix,
            rotation,
        })
    }
}

/// Install the global subscriber: console output filtered by `RUST_LOG`
/// (default `info`), plus a rolling file for `http.access` events when
/// `CONTACT_ACCESS_LOG_ROLL=1`. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer();
    let registry = tracing_subscriber::registry().with(fmt_layer.with_filter(filter));

    let Some(settings) = AccessFileSettings::from_env() else {
        let _ = registry.try_init();
        return;
    };

    if std::fs::create_dir_all(&settings.dir).is_err() {
        eprintln!("warning: failed to create access log directory {}", settings.dir);
    }
    let writer = match settings.rotation {
        Rotation::Hourly => tracing_appender::rolling::hourly(&settings.dir, &settings.prefix),
        Rotation::Minutely => tracing_appender::rolling::minutely(&settings.dir, &settings.prefix),
        Rotation::Daily => tracing_appender::rolling::daily(&settings.dir, &settings.prefix),
    };
    let (nb, guard) = tracing_appender::non_blocking(writer);
    let _ = ACCESS_GUARD.set(guard);
    let targets = Targets::new().with_target(ACCESS_TARGET, tracing::Level::INFO);
    let access_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(nb)
        .with_filter(targets);
    let _ = registry.with(access_layer).try_init();
    tracing::info!(directory = %settings.dir, "access log file enabled");
}
