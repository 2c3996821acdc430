use serde::Deserialize;
use std::path::PathBuf;

/// 入库服务配置
///
/// 依次读取可选的 `maruegg.toml` 和 `MARUEGG__*` 环境变量，缺省值见各字段
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IngestConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    #[serde(default = "default_vector_db_root")]
    pub vector_db_root: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("maruegg.db")
}

fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_vector_db_root() -> PathBuf {
    PathBuf::from("vectorDB")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            media_root: default_media_root(),
            vector_db_root: default_vector_db_root(),
            log_level: default_log_level(),
        }
    }
}

impl IngestConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("maruegg").required(false))
            .add_source(config::Environment::with_prefix("MARUEGG").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 日志级别，无法识别时回退到 INFO
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}
