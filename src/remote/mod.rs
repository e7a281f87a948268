pub mod http;
pub mod memory;

use crate::error::RemoteError;
use async_trait::async_trait;

pub use http::{HttpApi, TransportConfig};
pub use memory::{ApiCall, MemoryApi};

/// 服务端响应：状态码 + 已完整读取的响应体
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// 管理服务接口
///
/// 所有写操作都带 `nonotify=1`，通知由同步引擎统一在最后发送。
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// PUT /declarations
    async fn upsert_declaration(&self, document: &[u8]) -> Result<ApiResponse, RemoteError>;

    /// PUT /set-declarations/{set}
    async fn associate(&self, set: &str, declaration: &str) -> Result<ApiResponse, RemoteError>;

    /// DELETE /set-declarations/{set}
    async fn dissociate(&self, set: &str, declaration: &str)
        -> Result<ApiResponse, RemoteError>;

    /// POST /notify
    async fn notify(
        &self,
        declarations: &[String],
        sets: &[String],
    ) -> Result<ApiResponse, RemoteError>;

    /// 服务地址（用于日志）
    fn endpoint(&self) -> &str;
}

/// `nonotify=1` 查询串
pub fn nonotify_query() -> &'static str {
    "nonotify=1"
}

/// 集合关联的查询串
pub fn set_query(declaration: &str) -> String {
    format!(
        "declaration={}&{}",
        urlencoding::encode(declaration),
        nonotify_query()
    )
}

/// 通知的查询串，声明与集合均以重复参数传递
pub fn notify_query(declarations: &[String], sets: &[String]) -> String {
    declarations
        .iter()
        .map(|d| format!("declaration={}", urlencoding::encode(d)))
        .chain(sets.iter().map(|s| format!("set={}", urlencoding::encode(s))))
        .collect::<Vec<_>>()
        .join("&")
}

/// 通知地址
pub fn notify_url(base: &str, declarations: &[String], sets: &[String]) -> String {
    format!("{}/notify?{}", base, notify_query(declarations, sets))
}
