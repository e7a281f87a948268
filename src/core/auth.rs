//! HTTP Basic 认证凭据

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;

/// 用户名 + 密钥
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub key: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            key: key.into(),
        }
    }

    /// `user:key` 的 base64 编码
    pub fn basic_token(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.user, self.key))
    }

    /// 完整的 Authorization 头部值
    pub fn authorization(&self) -> String {
        format!("Basic {}", self.basic_token())
    }
}

// 避免密钥出现在日志中
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("key", &"***")
            .finish()
    }
}
