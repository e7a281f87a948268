//! 内存中的管理服务
//!
//! 与真实服务相同的状态码约定：204 已变更，304 未变更，4xx 带 `{"error": ...}`。
//! 按顺序记录每一次调用。

use super::{ApiResponse, ManagementApi};
use crate::error::RemoteError;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

/// 一次服务调用的记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    UpsertDeclaration { identifier: String },
    Associate { set: String, declaration: String },
    Dissociate { set: String, declaration: String },
    Notify { declarations: Vec<String>, sets: Vec<String> },
}

#[derive(Debug, Default)]
struct Inner {
    /// 声明 ID -> 内容令牌
    declarations: HashMap<String, String>,
    sets: HashMap<String, BTreeSet<String>>,
    calls: Vec<ApiCall>,
    /// 对这些声明 ID 的写操作模拟传输失败
    unreachable: BTreeSet<String>,
    notify_status: Option<u16>,
    /// 覆盖所有写操作的状态码
    write_status: Option<u16>,
}

#[derive(Debug, Default)]
pub struct MemoryApi {
    inner: Mutex<Inner>,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// 对指定声明的写操作返回传输错误
    pub fn fail_transport_for(&self, declaration: &str) {
        self.lock().unreachable.insert(declaration.to_string());
    }

    /// 覆盖通知接口返回的状态码
    pub fn set_notify_status(&self, status: u16) {
        self.lock().notify_status = Some(status);
    }

    /// 覆盖声明上传和集合编辑返回的状态码
    pub fn set_write_status(&self, status: u16) {
        self.lock().write_status = Some(status);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn notify_calls(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, ApiCall::Notify { .. }))
            .collect()
    }

    pub fn has_declaration(&self, id: &str) -> bool {
        self.lock().declarations.contains_key(id)
    }

    pub fn set_members(&self, set: &str) -> Vec<String> {
        self.lock()
            .sets
            .get(set)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // 锁中毒时仍可继续使用内部数据
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 内容令牌：规范化 JSON 的 blake3 摘要
fn content_token(value: &serde_json::Value) -> String {
    let canonical = value.to_string();
    blake3::hash(canonical.as_bytes()).to_hex().to_string()
}

fn error_response(status: u16, message: &str) -> ApiResponse {
    ApiResponse {
        status,
        body: serde_json::json!({ "error": message }).to_string().into_bytes(),
    }
}

fn changed(yes: bool) -> ApiResponse {
    ApiResponse::new(if yes { 204 } else { 304 })
}

#[async_trait]
impl ManagementApi for MemoryApi {
    async fn upsert_declaration(&self, document: &[u8]) -> Result<ApiResponse, RemoteError> {
        let value: serde_json::Value = match serde_json::from_slice(document) {
            Ok(v) => v,
            Err(e) => return Ok(error_response(400, &e.to_string())),
        };
        let identifier = match value.get("Identifier").and_then(|v| v.as_str()) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Ok(error_response(400, "invalid declaration")),
        };

        let mut inner = self.lock();
        inner.calls.push(ApiCall::UpsertDeclaration {
            identifier: identifier.clone(),
        });
        if inner.unreachable.contains(&identifier) {
            return Err(RemoteError::Unavailable(format!(
                "connection refused for {}",
                identifier
            )));
        }
        if let Some(status) = inner.write_status {
            return Ok(ApiResponse::new(status));
        }

        let token = content_token(&value);
        let previous = inner.declarations.insert(identifier, token.clone());
        Ok(changed(previous.as_deref() != Some(token.as_str())))
    }

    async fn associate(&self, set: &str, declaration: &str) -> Result<ApiResponse, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Associate {
            set: set.to_string(),
            declaration: declaration.to_string(),
        });
        if inner.unreachable.contains(declaration) {
            return Err(RemoteError::Unavailable(format!(
                "connection refused for {}",
                declaration
            )));
        }
        if let Some(status) = inner.write_status {
            return Ok(ApiResponse::new(status));
        }
        if !inner.declarations.contains_key(declaration) {
            return Ok(error_response(400, "declaration not found"));
        }

        let inserted = inner
            .sets
            .entry(set.to_string())
            .or_default()
            .insert(declaration.to_string());
        Ok(changed(inserted))
    }

    async fn dissociate(
        &self,
        set: &str,
        declaration: &str,
    ) -> Result<ApiResponse, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Dissociate {
            set: set.to_string(),
            declaration: declaration.to_string(),
        });
        if inner.unreachable.contains(declaration) {
            return Err(RemoteError::Unavailable(format!(
                "connection refused for {}",
                declaration
            )));
        }
        if let Some(status) = inner.write_status {
            return Ok(ApiResponse::new(status));
        }

        let removed = inner
            .sets
            .get_mut(set)
            .map(|members| members.remove(declaration))
            .unwrap_or(false);
        Ok(changed(removed))
    }

    async fn notify(
        &self,
        declarations: &[String],
        sets: &[String],
    ) -> Result<ApiResponse, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Notify {
            declarations: declarations.to_vec(),
            sets: sets.to_vec(),
        });
        Ok(ApiResponse::new(inner.notify_status.unwrap_or(204)))
    }

    fn endpoint(&self) -> &str {
        "memory://"
    }
}
