use super::{nonotify_query, notify_url, set_query, ApiResponse, ManagementApi};
use crate::core::auth::Credentials;
use crate::error::RemoteError;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// 传输层配置，显式注入客户端，不修改任何全局状态
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportConfig {
    /// 请求超时（秒），None 表示使用传输层默认值
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// 跳过 TLS 证书校验
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    concat!("ddmsync/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            accept_invalid_certs: false,
            user_agent: default_user_agent(),
        }
    }
}

/// 基于 reqwest 的管理服务客户端
pub struct HttpApi {
    client: Client,
    base_url: String,
    authorization: String,
}

impl HttpApi {
    pub fn new(
        base_url: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, RemoteError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RemoteError::InvalidBaseUrl {
                url: base_url,
                reason: "expected an http:// or https:// url".to_string(),
            });
        }

        // 3xx 按失败处理，不跟随跳转重发写请求
        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(&transport.user_agent)
            .danger_accept_invalid_certs(transport.accept_invalid_certs);
        if let Some(secs) = transport.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(RemoteError::Client)?;

        Ok(Self {
            client,
            base_url,
            authorization: credentials.authorization(),
        })
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTHORIZATION, &self.authorization)
    }

    /// 发送请求并完整读取响应体，响应在此处释放
    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse, RemoteError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("响应 {} ({} 字节)", status, body.len());
        Ok(ApiResponse { status, body })
    }

    fn set_url(&self, set: &str, declaration: &str) -> String {
        format!(
            "{}/set-declarations/{}?{}",
            self.base_url,
            urlencoding::encode(set),
            set_query(declaration)
        )
    }
}

#[async_trait]
impl ManagementApi for HttpApi {
    async fn upsert_declaration(&self, document: &[u8]) -> Result<ApiResponse, RemoteError> {
        let url = format!("{}/declarations?{}", self.base_url, nonotify_query());
        debug!("PUT {}", url);
        let request = self
            .request(Method::PUT, &url)
            .header(CONTENT_TYPE, "application/json")
            .body(document.to_vec());
        self.send(request).await
    }

    async fn associate(&self, set: &str, declaration: &str) -> Result<ApiResponse, RemoteError> {
        let url = self.set_url(set, declaration);
        debug!("PUT {}", url);
        self.send(self.request(Method::PUT, &url)).await
    }

    async fn dissociate(
        &self,
        set: &str,
        declaration: &str,
    ) -> Result<ApiResponse, RemoteError> {
        let url = self.set_url(set, declaration);
        debug!("DELETE {}", url);
        self.send(self.request(Method::DELETE, &url)).await
    }

    async fn notify(
        &self,
        declarations: &[String],
        sets: &[String],
    ) -> Result<ApiResponse, RemoteError> {
        let url = notify_url(&self.base_url, declarations, sets);
        debug!("POST {}", url);
        self.send(self.request(Method::POST, &url)).await
    }

    fn endpoint(&self) -> &str {
        &self.base_url
    }
}
