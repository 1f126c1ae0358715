//! The unified configuration module for the Atlas console.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core_types::Role;

/// The unified configuration for the Atlas server.
/// This structure is loaded from the atlas.toml file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AtlasConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            data_dir: default_data_dir(),
            telemetry: TelemetryConfig::default(),
            store: StoreConfig::default(),
            selection: SelectionConfig::default(),
            nats: NatsConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl AtlasConfig {
    /// 从指定路径或当前目录中的 atlas.toml 加载配置；支持以 ATLAS__ 为前缀的环境变量覆盖（Figment）
    pub fn load_config(path: Option<&str>) -> Result<Self, anyhow::Error> {
        use figment::{
            providers::{Env, Format, Serialized, Toml},
            Figment,
        };

        // 基础：默认配置
        let mut figment = Figment::from(Serialized::defaults(AtlasConfig::default()));

        // 文件层：显式路径优先，否则尝试工作目录下 atlas.toml
        let base_dir: PathBuf;
        if let Some(p) = path {
            let p = Path::new(p);
            if !p.exists() {
                return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
            }
            base_dir = p.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            figment = figment.merge(Toml::file(p));
        } else {
            let default_path = Path::new("atlas.toml");
            if default_path.exists() {
                figment = figment.merge(Toml::file(default_path));
            }
            base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        }

        // 环境变量层
        figment = figment.merge(Env::prefixed("ATLAS__").split("__"));

        let mut cfg: AtlasConfig = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load config via Figment: {}", e))?;

        cfg.resolve_relative_paths(&base_dir);
        cfg.validate()?;
        Ok(cfg)
    }

    /// 验证配置参数的有效性
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(anyhow::anyhow!(
                "Invalid listen_addr format: {}",
                self.listen_addr
            ));
        }

        if self.selection.ttl_sec == 0 || self.selection.ttl_sec > 86_400 {
            return Err(anyhow::anyhow!("selection.ttl_sec must be between 1 and 86400"));
        }

        if self.selection.backend == SelectionBackend::Nats && self.nats.url.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "nats.url is required when selection.backend = \"nats\""
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.auth.tokens {
            if entry.token.trim().is_empty() {
                return Err(anyhow::anyhow!("auth token for user {} is empty", entry.user_id));
            }
            if entry.user_id.trim().is_empty() {
                return Err(anyhow::anyhow!("auth token entry has an empty user_id"));
            }
            if !seen.insert(entry.token.as_str()) {
                return Err(anyhow::anyhow!(
                    "duplicate auth token configured for user {}",
                    entry.user_id
                ));
            }
        }

        Ok(())
    }

    /// 实际使用的数据库位置；`:memory:` 表示进程内数据库
    pub fn database_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("atlas.db"))
    }

    pub fn resolve_relative_paths(&mut self, base_dir: &Path) {
        fn make_absolute(path: &mut PathBuf, base: &Path) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }

        make_absolute(&mut self.data_dir, base_dir);
        if let Some(path) = self.store.path.as_mut() {
            if !StoreConfig::is_memory_path(path) {
                make_absolute(path, base_dir);
            }
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default)]
    pub log_no_ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            log_no_ansi: false,
        }
    }
}

/// Relational store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite 文件路径，缺省为 `<data_dir>/atlas.db`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn is_memory_path(path: &Path) -> bool {
        path.as_os_str() == ":memory:"
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionBackend {
    #[default]
    Memory,
    Nats,
}

/// Bulk selection cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SelectionConfig {
    #[serde(default)]
    pub backend: SelectionBackend,
    #[serde(default = "default_selection_ttl")]
    pub ttl_sec: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            backend: SelectionBackend::default(),
            ttl_sec: default_selection_ttl(),
        }
    }
}

/// NATS configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NatsConfig {
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub url: String,
    #[serde(default)]
    pub creds_file: Option<PathBuf>,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: default_nats_url(),
            creds_file: None,
        }
    }
}

/// 静态 API 令牌到调用者身份的映射
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<ApiTokenConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ApiTokenConfig {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

// --- Default value functions ---

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    std::env::temp_dir().join("atlas")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_nats_url() -> String {
    "nats://127.0.0.1:4222".to_string()
}

fn default_selection_ttl() -> u64 {
    crate::constants::DEFAULT_SELECTION_TTL_SEC
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn token(token: &str, user: &str) -> ApiTokenConfig {
        ApiTokenConfig {
            token: token.to_string(),
            user_id: user.to_string(),
            name: user.to_string(),
            role: Role::Admin,
            is_active: true,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AtlasConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.selection.ttl_sec, 300);
        assert_eq!(cfg.selection.backend, SelectionBackend::Memory);
        assert!(cfg.database_path().ends_with("atlas.db"));
    }

    #[test]
    fn test_invalid_listen_addr_rejected() {
        let cfg = AtlasConfig {
            listen_addr: "not-an-addr".to_string(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut cfg = AtlasConfig::default();
        cfg.selection.ttl_sec = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_duplicate_tokens_rejected() {
        let mut cfg = AtlasConfig::default();
        cfg.auth.tokens = vec![token("t1", "alice"), token("t1", "bob")];
        assert!(cfg.validate().is_err());

        cfg.auth.tokens = vec![token("t1", "alice"), token("t2", "bob")];
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
listen_addr = "127.0.0.1:9090"
data_dir = "data"

[store]
path = "inventory.db"

[selection]
backend = "memory"
ttl_sec = 60

[[auth.tokens]]
token = "secret"
user_id = "u-1"
name = "admin"
role = "admin"
"#
        )
        .unwrap();

        let cfg = AtlasConfig::load_config(path.to_str()).unwrap();
        assert_eq!(cfg.listen_addr, "127.0.0.1:9090");
        assert_eq!(cfg.selection.ttl_sec, 60);
        assert_eq!(cfg.data_dir, dir.path().join("data"));
        assert_eq!(cfg.database_path(), dir.path().join("inventory.db"));
        assert_eq!(cfg.auth.tokens.len(), 1);
        assert_eq!(cfg.auth.tokens[0].role, Role::Admin);
        assert!(cfg.auth.tokens[0].is_active);
    }

    #[test]
    fn test_memory_store_path_kept_verbatim() {
        let mut cfg = AtlasConfig::default();
        cfg.store.path = Some(PathBuf::from(":memory:"));
        cfg.resolve_relative_paths(Path::new("/etc/atlas"));
        assert_eq!(cfg.database_path(), PathBuf::from(":memory:"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(AtlasConfig::load_config(Some("/nonexistent/atlas.toml")).is_err());
    }
}
