//! 单次写操作的结果判定

use crate::error::RemoteError;
use crate::remote::ApiResponse;
use serde::Deserialize;

/// 服务端约定：已应用变更
pub const STATUS_CHANGED: u16 = 204;
/// 服务端约定：状态已一致，无需变更
pub const STATUS_UNCHANGED: u16 = 304;

/// 一次网络写操作的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 服务端修改了状态
    Changed,
    /// 服务端状态已一致（幂等空操作）
    Unchanged,
    /// 未预期的 2xx 状态，既不算变更也不算未变更
    Inconclusive(u16),
    /// 传输错误或服务端拒绝
    Failed(Failure),
}

/// 失败详情
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// 服务端返回的状态码，传输错误时为 None
    pub status: Option<u16>,
    pub message: String,
    /// 服务端 JSON 错误体中的 `error` 字段
    pub service_error: Option<String>,
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(err) = &self.service_error {
            write!(f, ": {}", err)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// 尽力解析服务端错误体，失败时返回 None
pub fn service_error(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|e| !e.is_empty())
}

impl Outcome {
    /// 将响应映射为结果
    pub fn from_response(response: &ApiResponse) -> Self {
        match response.status {
            STATUS_CHANGED => Outcome::Changed,
            STATUS_UNCHANGED => Outcome::Unchanged,
            s if (200..300).contains(&s) => Outcome::Inconclusive(s),
            s => Outcome::Failed(Failure {
                status: Some(s),
                message: format!("HTTP Error {}: {}", s, reason_phrase(s)),
                service_error: service_error(&response.body),
            }),
        }
    }

    pub fn from_result(result: Result<ApiResponse, RemoteError>) -> Self {
        match result {
            Ok(response) => Self::from_response(&response),
            Err(e) => Outcome::Failed(Failure {
                status: None,
                message: e.to_string(),
                service_error: None,
            }),
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}
