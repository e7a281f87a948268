use crate::core::outcome::Outcome;
use crate::core::report::Reporter;
use crate::core::scanner::DeclarationFile;
use crate::core::state::RunState;
use crate::error::DeclarationError;
use crate::remote::ManagementApi;
use tracing::{debug, warn};

/// 从声明文档中取出 Identifier，只做最低限度的校验
pub fn parse_identifier(document: &[u8]) -> Result<String, DeclarationError> {
    let value: serde_json::Value = serde_json::from_slice(document)?;
    let object = value.as_object().ok_or(DeclarationError::NotAnObject)?;
    match object.get("Identifier").and_then(|v| v.as_str()) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(DeclarationError::MissingIdentifier),
    }
}

/// 单个声明文件的处理结果
#[derive(Debug)]
pub enum UploadResult {
    /// 读取文件失败
    Unreadable { file: String, error: std::io::Error },
    /// 文档格式错误，未发送任何请求
    Malformed { file: String, error: DeclarationError },
    /// 已发送上传请求
    Uploaded {
        file: String,
        identifier: String,
        outcome: Outcome,
    },
}

/// 声明上传器
pub struct DeclarationUploader<'a> {
    api: &'a dyn ManagementApi,
}

impl<'a> DeclarationUploader<'a> {
    pub fn new(api: &'a dyn ManagementApi) -> Self {
        Self { api }
    }

    /// 读取、校验并上传一个声明文件
    pub async fn upload(&self, file: &DeclarationFile) -> UploadResult {
        let data = match tokio::fs::read(&file.path).await {
            Ok(d) => d,
            Err(error) => {
                return UploadResult::Unreadable {
                    file: file.relative.clone(),
                    error,
                }
            }
        };

        let identifier = match parse_identifier(&data) {
            Ok(id) => id,
            Err(error) => {
                return UploadResult::Malformed {
                    file: file.relative.clone(),
                    error,
                }
            }
        };

        debug!("上传声明: {} ({})", identifier, file.relative);
        let outcome = Outcome::from_result(self.api.upsert_declaration(&data).await);

        UploadResult::Uploaded {
            file: file.relative.clone(),
            identifier,
            outcome,
        }
    }
}

/// 将上传结果写入运行状态并输出报告行（单写者）
pub fn record_upload(result: UploadResult, state: &mut RunState, reporter: &mut Reporter) {
    match result {
        UploadResult::Unreadable { file, error } => {
            state.record_failure();
            reporter.error(format!("reading {}: {}", file, error));
        }
        UploadResult::Malformed { file, error } => {
            state.record_failure();
            reporter.error(format!("parsing {}: {}", file, error));
        }
        UploadResult::Uploaded {
            file,
            identifier,
            outcome,
        } => match outcome {
            Outcome::Changed => {
                reporter.info(format!("changed declaration {}", identifier));
                state.record_declaration(&identifier, true);
            }
            Outcome::Unchanged => {
                debug!("声明未变化: {}", identifier);
                state.record_declaration(&identifier, false);
            }
            Outcome::Inconclusive(status) => {
                warn!("上传声明返回未知状态码 {}: {}", status, file);
                reporter.warning(format!("unknown status code declaration: {}", status));
            }
            Outcome::Failed(failure) => {
                state.record_failure();
                reporter.error(format!("uploading {}: {}", file, failure));
            }
        },
    }
}
