//! 应用配置模块
//!
//! 优先级：命令行参数 > 环境变量 > 配置文件 > 默认值。
//! 命令行与环境变量由 clap 合并，这里负责与配置文件和默认值合并。

use crate::core::auth::Credentials;
use crate::error::ConfigError;
use crate::logging::LogConfig;
use crate::remote::TransportConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_BASE_URL: &str = "http://[::1]:9002/v1";
pub const DEFAULT_USER: &str = "kmfddm";
pub const DEFAULT_KEY: &str = "kmfddm";

/// 服务连接配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub user: String,
    pub key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user: DEFAULT_USER.to_string(),
            key: DEFAULT_KEY.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.user, &self.key)
    }
}

/// 可选的连接配置项，未设置的项由低优先级来源补齐
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ApiOverrides {
    /// self 优先，缺失项取 lower
    pub fn or(self, lower: ApiOverrides) -> ApiOverrides {
        ApiOverrides {
            base_url: self.base_url.or(lower.base_url),
            user: self.user.or(lower.user),
            key: self.key.or(lower.key),
        }
    }

    /// 缺失项使用默认值
    pub fn resolve(self) -> ApiConfig {
        let defaults = ApiConfig::default();
        ApiConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            user: self.user.unwrap_or(defaults.user),
            key: self.key.unwrap_or(defaults.key),
        }
    }
}

/// 配置文件内容（JSON）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiOverrides,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

impl AppConfig {
    /// 从配置文件加载
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 未指定配置文件时使用默认配置
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
