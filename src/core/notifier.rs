use crate::core::outcome::{service_error, STATUS_CHANGED};
use crate::core::report::Reporter;
use crate::core::state::RunState;
use crate::remote::{notify_url, ManagementApi};
use serde::Serialize;
use tracing::{info, warn};

/// 通知结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "detail")]
pub enum NotifyStatus {
    /// 没有任何变更，未发送通知
    NotNeeded,
    Sent,
    UnexpectedStatus(u16),
    Failed(String),
}

/// 汇总并发送唯一一次通知
pub struct Notifier<'a> {
    api: &'a dyn ManagementApi,
}

impl<'a> Notifier<'a> {
    pub fn new(api: &'a dyn ManagementApi) -> Self {
        Self { api }
    }

    pub async fn finish(&self, state: &RunState, reporter: &mut Reporter) -> NotifyStatus {
        if !state.unchanged_declarations().is_empty() {
            reporter.info(format!(
                "unchanged declarations: {}",
                state.unchanged_declarations().len()
            ));
        }
        if !state.unchanged_sets().is_empty() {
            reporter.info(format!("unchanged sets: {}", state.unchanged_sets().len()));
        }

        if !state.has_changes() {
            reporter.info("no changed declarations or sets");
            return NotifyStatus::NotNeeded;
        }

        let declarations = state.changed_declarations();
        let sets = state.changed_sets();
        if !declarations.is_empty() {
            reporter.info(format!(
                "changed declarations ({}): {}",
                declarations.len(),
                declarations.join(", ")
            ));
        }
        if !sets.is_empty() {
            reporter.info(format!("changed sets ({}): {}", sets.len(), sets.join(", ")));
        }

        info!("发送通知: {} 个声明, {} 个集合", declarations.len(), sets.len());
        match self.api.notify(declarations, sets).await {
            Ok(response) if response.status == STATUS_CHANGED => {
                reporter.info("sent notify");
                NotifyStatus::Sent
            }
            Ok(response) if (200..300).contains(&response.status) => {
                reporter.warning(format!("unknown status code notify: {}", response.status));
                NotifyStatus::UnexpectedStatus(response.status)
            }
            Ok(response) => {
                let mut detail = format!("HTTP Error {}", response.status);
                if let Some(err) = service_error(&response.body) {
                    detail = format!("{}: {}", detail, err);
                }
                reporter.error(format!(
                    "notifying to {}: {}",
                    notify_url(self.api.endpoint(), declarations, sets),
                    detail
                ));
                NotifyStatus::Failed(detail)
            }
            Err(e) => {
                warn!("发送通知失败: {}", e);
                reporter.error(format!(
                    "notifying to {}: {}",
                    notify_url(self.api.endpoint(), declarations, sets),
                    e
                ));
                NotifyStatus::Failed(e.to_string())
            }
        }
    }
}
