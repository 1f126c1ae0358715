use time::UtcOffset;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::TelemetryConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl From<&TelemetryConfig> for (LogLevel, LogFormat) {
    fn from(cfg: &TelemetryConfig) -> Self {
        let level = match cfg.log_level.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        };
        let format = if cfg.log_format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        };
        (level, format)
    }
}

/// 使用提供的配置初始化 tracing（TOML 驱动）
///
/// `RUST_LOG` 存在时优先于配置中的日志级别。
pub fn init_tracing_with(cfg: &TelemetryConfig) {
    let (level, format): (LogLevel, LogFormat) = cfg.into();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let base = fmt::layer().with_target(true).with_ansi(!cfg.log_no_ansi);
    let fmt_layer = match format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Text => base
            .with_timer(fmt::time::OffsetTime::new(
                UtcOffset::UTC,
                time::format_description::well_known::Rfc3339,
            ))
            .boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_and_format_parsing() {
        let cfg = TelemetryConfig {
            log_level: "DEBUG".to_string(),
            log_format: "json".to_string(),
            log_no_ansi: true,
        };
        let (level, format): (LogLevel, LogFormat) = (&cfg).into();
        assert_eq!(level, LogLevel::Debug);
        assert_eq!(format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let cfg = TelemetryConfig {
            log_level: "verbose".to_string(),
            ..Default::default()
        };
        let (level, format): (LogLevel, LogFormat) = (&cfg).into();
        assert_eq!(level, LogLevel::Info);
        assert_eq!(format, LogFormat::Text);
    }
}
