//! 错误类型

use std::path::PathBuf;

/// 远程服务调用错误（传输层）
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("building http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// 内存服务不可用（测试中模拟网络故障）
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// 声明文档格式错误
#[derive(Debug, thiserror::Error)]
pub enum DeclarationError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("declaration is not a JSON object")]
    NotAnObject,

    #[error("missing or empty \"Identifier\" field")]
    MissingIdentifier,
}

/// 配置文件错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 导致整次同步中止的致命错误
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("directory {0:?} does not exist")]
    RootNotFound(PathBuf),

    #[error("{0:?} is not a directory")]
    RootNotDirectory(PathBuf),

    #[error("reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid set file pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("set file pattern {0:?} has no capture group for the set name")]
    PatternGroup(String),

    #[error("scanning directory: {0}")]
    ScanTask(String),
}
