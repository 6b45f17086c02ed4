//! Application configuration module / 应用配置模块
//!
//! Loaded from config.json in the working directory.
//! Creates default config file on first run / 首次运行时创建默认配置文件

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    pub server: ServerConfig,
    /// Database configuration / 数据库配置
    pub database: DatabaseConfig,
    /// Search configuration / 搜索配置
    pub search: SearchConfig,
}

/// Hard ceiling for `search.max_limit` / 返回条数上限
pub const LIMIT_CEILING: usize = 200;

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Which database engine backs the catalog / 数据库类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Postgres,
}

/// Database configuration / 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: BackendKind,
    /// Data directory path (SQLite) / 数据目录路径
    pub data_dir: String,
    /// Database file name, relative to data_dir (SQLite) / 数据库文件名
    pub db_file: String,
    /// Full connection URL, overrides data_dir/db_file / 完整连接地址
    pub url: Option<String>,
    /// Pool size / 连接池大小
    pub max_connections: u32,
    /// Create the FTS5 table on SQLite / 是否创建 FTS5 表
    pub enable_fts: bool,
    /// JSON file upserted into the catalog at startup / 启动时导入的商品文件
    pub seed_file: Option<String>,
}

/// Per-column bm25 weights for the inverted index / 各字段权重
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankWeights {
    pub id: f64,
    pub item_name: f64,
    pub company: f64,
    pub category: f64,
    pub tags: f64,
}

/// Search configuration / 搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Limit used when the request has none / 默认返回条数
    pub default_limit: usize,
    /// Largest accepted limit / 最大返回条数
    pub max_limit: usize,
    /// Store-side query timeout / 查询超时（毫秒）
    pub query_timeout_ms: u64,
    pub weights: RankWeights,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            data_dir: "data".to_string(),
            db_file: "items.db".to_string(),
            url: None,
            max_connections: 4,
            enable_fts: true,
            seed_file: None,
        }
    }
}

// Name weighs most, id least
impl Default for RankWeights {
    fn default() -> Self {
        Self {
            id: 0.5,
            item_name: 10.0,
            company: 4.0,
            category: 3.0,
            tags: 2.0,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 200,
            query_timeout_ms: 5000,
            weights: RankWeights::default(),
        }
    }
}

impl DatabaseConfig {
    /// SQLite database file / SQLite 数据库文件路径
    pub fn sqlite_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.db_file)
    }

    /// Get the full database URL / 获取完整的数据库URL
    pub fn get_database_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!("sqlite:{}?mode=rwc", self.sqlite_path().to_string_lossy())
    }
}

impl SearchConfig {
    /// `max_limit`, never above `LIMIT_CEILING` / 实际生效的最大条数
    pub fn effective_max_limit(&self) -> usize {
        self.max_limit.min(LIMIT_CEILING)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl AppConfig {
    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    load_config_from(&get_config_path())
}

/// Load configuration from an explicit path / 从指定路径加载配置
pub fn load_config_from(config_path: &Path) -> Result<AppConfig, String> {
    if config_path.exists() {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        let config = AppConfig::default();
        save_config(&config, config_path)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config: &AppConfig, config_path: &Path) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{"database": {"backend": "postgres", "url": "postgres://u:p@localhost/shop"},
                      "search": {"default_limit": 20}}"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.database.backend, BackendKind::Postgres);
        assert_eq!(config.database.get_database_url(), "postgres://u:p@localhost/shop");
        assert_eq!(config.search.default_limit, 20);
        assert_eq!(config.search.max_limit, 200);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.search.weights, RankWeights::default());
    }

    #[test]
    fn test_sqlite_url_from_data_dir() {
        let db = DatabaseConfig::default();
        let expected = format!("sqlite:{}?mode=rwc", Path::new("data").join("items.db").to_string_lossy());
        assert_eq!(db.get_database_url(), expected);
    }

    #[test]
    fn test_default_weights_order() {
        let w = RankWeights::default();
        assert!(w.item_name > w.company && w.company > w.category && w.category > w.tags);
        assert!(w.tags > w.id);
    }

    #[test]
    fn test_load_config_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let created = load_config_from(&path).unwrap();
        assert!(path.exists());
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(created.get_bind_address(), loaded.get_bind_address());
        assert_eq!(loaded.database.backend, BackendKind::Sqlite);
    }

    #[test]
    fn test_max_limit_is_clamped() {
        let search: SearchConfig = serde_json::from_str(r#"{"max_limit": 5000}"#).unwrap();
        assert_eq!(search.effective_max_limit(), LIMIT_CEILING);
        let search: SearchConfig = serde_json::from_str(r#"{"max_limit": 20}"#).unwrap();
        assert_eq!(search.effective_max_limit(), 20);
    }

    #[test]
    fn test_load_config_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_config_from(&path).is_err());
    }
}
